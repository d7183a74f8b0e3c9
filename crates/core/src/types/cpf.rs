//! CPF (Cadastro de Pessoas Físicas) tax id.
//!
//! A CPF is an 11-digit Brazilian taxpayer number whose last two digits are
//! check digits computed from the first nine. Users type it with or without
//! punctuation (`171.079.720-73` or `17107972073`); everything in this service
//! stores and looks it up in its normalized, digits-only form.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in a normalized CPF.
pub const CPF_LENGTH: usize = 11;

/// Errors that can occur when parsing a [`Cpf`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CpfError {
    /// The input does not reduce to exactly 11 digits.
    #[error("cpf must have {CPF_LENGTH} digits (found {found})")]
    WrongLength {
        /// Number of digits left after stripping punctuation.
        found: usize,
    },
    /// Every digit is the same (e.g. `000.000.000-00`), which passes the
    /// checksum but is never issued.
    #[error("cpf cannot be a repeated digit sequence")]
    RepeatedDigits,
    /// One of the two check digits does not match.
    #[error("cpf check digits do not match")]
    ChecksumMismatch,
}

/// Strip every non-digit character from `raw`.
///
/// Only ASCII digits are kept, so full-width or other Unicode digits are
/// discarded along with punctuation and whitespace.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Normalize `raw` and check it against the CPF check-digit algorithm.
///
/// Always returns the normalized digits, even when validation fails, so the
/// caller can use them in lookups or error messages.
///
/// # Examples
///
/// ```
/// use customer_identity_core::validate;
///
/// assert_eq!(validate("171.079.720-73"), ("17107972073".to_owned(), true));
/// assert_eq!(validate("172.079.720-73"), ("17207972073".to_owned(), false));
/// ```
#[must_use]
pub fn validate(raw: &str) -> (String, bool) {
    let clean = normalize(raw);
    let ok = check(&clean).is_ok();
    (clean, ok)
}

/// Validate an already-normalized digit string.
fn check(clean: &str) -> Result<(), CpfError> {
    let digits: Vec<u32> = clean.bytes().map(|b| u32::from(b - b'0')).collect();

    if digits.len() != CPF_LENGTH {
        return Err(CpfError::WrongLength {
            found: digits.len(),
        });
    }

    if digits.windows(2).all(|pair| pair.first() == pair.last()) {
        return Err(CpfError::RepeatedDigits);
    }

    let (body, _) = digits.split_at(9);
    let first = check_digit(body);
    let (body, _) = digits.split_at(10);
    let second = check_digit(body);

    if digits.get(9) == Some(&first) && digits.get(10) == Some(&second) {
        Ok(())
    } else {
        Err(CpfError::ChecksumMismatch)
    }
}

/// Weighted mod-11 check digit over `body`.
///
/// Weights run from `body.len() + 1` down to 2; a remainder below 2 yields 0.
fn check_digit(body: &[u32]) -> u32 {
    let top = u32::try_from(body.len()).unwrap_or(0) + 1;
    let sum: u32 = body
        .iter()
        .zip((2..=top).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();

    match sum % 11 {
        0 | 1 => 0,
        remainder => 11 - remainder,
    }
}

/// A validated, normalized CPF.
///
/// ## Constraints
///
/// - Exactly 11 ASCII digits, no punctuation
/// - Not a repeated-digit sequence
/// - Both check digits match
///
/// Serializes as the bare digit string.
///
/// ## Examples
///
/// ```
/// use customer_identity_core::Cpf;
///
/// let cpf = Cpf::parse("171.079.720-73").unwrap();
/// assert_eq!(cpf.as_str(), "17107972073");
/// assert_eq!(cpf.formatted(), "171.079.720-73");
///
/// assert!(Cpf::parse("000.000.000-00").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Cpf(String);

impl Cpf {
    /// Parse a `Cpf` from user input, with or without punctuation.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not reduce to 11 digits, is a
    /// repeated-digit sequence, or fails the check-digit algorithm.
    pub fn parse(raw: &str) -> Result<Self, CpfError> {
        let clean = normalize(raw);
        check(&clean)?;
        Ok(Self(clean))
    }

    /// Returns the normalized digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Cpf` and returns its normalized digits.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the CPF in its conventional `000.000.000-00` presentation.
    #[must_use]
    pub fn formatted(&self) -> String {
        let part = |range: core::ops::Range<usize>| self.0.get(range).unwrap_or_default();
        format!("{}.{}.{}-{}", part(0..3), part(3..6), part(6..9), part(9..11))
    }

    /// Returns a log-safe form with only the last four digits visible.
    #[must_use]
    pub fn masked(&self) -> String {
        let tail = self.0.get(7..11).unwrap_or_default();
        let (middle, check) = tail.split_at(tail.len().min(2));
        format!("***.***.*{middle}-{check}")
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Cpf {
    type Err = CpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cpf {
    type Error = CpfError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cpf> for String {
    fn from(cpf: Cpf) -> Self {
        cpf.0
    }
}

impl AsRef<str> for Cpf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Cpf {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Cpf {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Cpf {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
