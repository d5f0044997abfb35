//! Signed SOAP envelopes for EET sales receipt registration (PKP/BKP fiscal
//! codes, WS-Security body signature, verification).
//!
//! # Examples
//! ```rust
//! use eet_core::config::{Config, EnvironmentType};
//!
//! let config = Config::new(EnvironmentType::Playground);
//! # let _ = config;
//! ```
pub mod codec;
pub mod config;
pub mod envelope;
pub mod keychain;
pub mod receipt;
pub mod verify;

use thiserror::Error;

/// Top-level error wrapper for core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Envelope(#[from] envelope::EnvelopeError),
    #[error(transparent)]
    KeyChain(#[from] keychain::KeyChainError),
    #[error(transparent)]
    Receipt(#[from] receipt::ReceiptError),
    #[error(transparent)]
    MissingFields(#[from] receipt::MissingFieldsError),
    #[error(transparent)]
    Verify(#[from] verify::VerifyError),
    #[error(transparent)]
    Environment(#[from] config::EnvironmentParseError),
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::config::EnvironmentParseError;
    use crate::envelope::{EnvelopeError, PlaceholderKind, TemplateError};
    use crate::keychain::KeyChainError;
    use crate::receipt::{MissingFieldsError, ReceiptError};
    use crate::verify::VerifyError;

    #[test]
    fn error_conversions_cover_variants() {
        let err: Error = EnvelopeError::from(TemplateError::MissingPlaceholder {
            kind: PlaceholderKind::Tag,
            name: "pkp".into(),
        })
        .into();
        assert!(matches!(err, Error::Envelope(EnvelopeError::Template(_))));

        let err: Error = KeyChainError::KeyMismatch.into();
        assert!(matches!(err, Error::KeyChain(_)));

        let err: Error = ReceiptError::UnknownAttribute {
            name: "dic_prodejce".into(),
        }
        .into();
        assert!(matches!(err, Error::Receipt(_)));

        let err: Error = MissingFieldsError::from(vec!["dic_popl"]).into();
        assert!(matches!(err, Error::MissingFields(_)));
        assert_eq!(err.to_string(), "missing mandatory receipt fields: dic_popl");

        let err: Error = VerifyError::DigestMismatch.into();
        assert!(matches!(err, Error::Verify(_)));

        let err: Error = EnvironmentParseError::Invalid {
            input: "staging".into(),
        }
        .into();
        assert!(matches!(err, Error::Environment(_)));
    }

    #[test]
    fn envelope_errors_stay_transparent() {
        let err = EnvelopeError::from(MissingFieldsError::from(vec!["id_pokl", "porad_cis"]));
        assert_eq!(
            err.to_string(),
            "missing mandatory receipt fields: id_pokl, porad_cis"
        );
    }
}
