//! Error taxonomy mapping.
//!
//! Turns identity provider and store failures into [`ClassifiedError`]s.
//! Classification happens once: an error that is already classified passes
//! through [`Classify`] unchanged, so wrapping at an upper layer can only add
//! the component name.

use customer_identity_core::{ClassifiedError, ErrorKind};
use tracing::{error, warn};

use crate::db::RepositoryError;
use crate::identity::IdentityError;

/// Conversion of a layer-specific error into its business category.
pub trait Classify {
    fn classify(self) -> ClassifiedError;
}

impl Classify for ClassifiedError {
    fn classify(self) -> ClassifiedError {
        self
    }
}

impl Classify for RepositoryError {
    fn classify(self) -> ClassifiedError {
        match self {
            Self::NotFound => ClassifiedError::not_found("account not found"),
            Self::Conflict(message) => ClassifiedError::conflict(message),
            Self::Timeout => ClassifiedError::new(ErrorKind::Unavailable, "account store timed out"),
            // Driver and corruption details stay in the message for logs; the
            // HTTP layer hides `Unknown` messages from clients.
            other @ (Self::Database(_) | Self::DataCorruption(_)) => {
                ClassifiedError::unknown(other.to_string())
            }
        }
    }
}

impl Classify for IdentityError {
    fn classify(self) -> ClassifiedError {
        let kind = match &self {
            Self::Transport(_) | Self::Timeout | Self::Throttled { .. } => ErrorKind::Unavailable,
            Self::Rejected { .. } => ErrorKind::Unauthorized,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Invalid { .. } => ErrorKind::Validation,
            Self::Service { .. } | Self::MissingToken => ErrorKind::RemoteFailure,
            Self::Request(_) => ErrorKind::Unknown,
        };
        ClassifiedError::new(kind, self.to_string())
    }
}

/// Classify a store failure.
pub fn classify_store_error(err: RepositoryError) -> ClassifiedError {
    err.classify()
}

/// Classify an identity provider failure.
pub fn classify_remote_error(err: IdentityError) -> ClassifiedError {
    err.classify()
}

/// Classify `err` if it is raw and stamp `component` on it.
///
/// Logs the failure once, at `warn` for client-side kinds and `error` for
/// server-side kinds.
pub fn attribute(err: impl Classify, component: &str) -> ClassifiedError {
    let classified = err.classify().attributed(component);
    let kind = classified.kind();
    let stamped = classified.component().unwrap_or(component);

    if kind.is_server_error() {
        error!(kind = %kind, component = %stamped, status = classified.status_hint(), error = %classified.message(), "Request failed");
    } else {
        warn!(kind = %kind, component = %stamped, status = classified.status_hint(), error = %classified.message(), "Request rejected");
    }

    classified
}
