//! CPF utilities.

use customer_identity_core::Cpf;

/// Print the normalized digits of `value` and whether it is a valid CPF.
///
/// Fails when the CPF is invalid, so the exit status can be scripted.
pub fn check(value: &str) -> Result<(), customer_identity_core::CpfError> {
    let result = Cpf::parse(value);

    #[allow(clippy::print_stdout)]
    {
        match &result {
            Ok(cpf) => println!("{} valid ({})", cpf.as_str(), cpf.formatted()),
            Err(e) => println!(
                "{} invalid: {e}",
                customer_identity_core::normalize(value)
            ),
        }
    }

    result.map(|_| ())
}
