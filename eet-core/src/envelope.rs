//! Signed request envelope construction.
//!
//! A [`Receipt`] is turned into the SOAP envelope in fixed phases:
//! attribute substitution, fiscal codes, the signing certificate, the body
//! digest and finally the `SignedInfo` signature. Each phase consumes the
//! previous draft and returns the next one, so a phase cannot be skipped,
//! repeated or reordered, and nothing is observable until the
//! [`Envelope`] exists.
//!
//! # Examples
//! ```rust,no_run
//! use std::sync::Arc;
//! use eet_core::envelope::Envelope;
//! use eet_core::keychain::KeyChain;
//! use eet_core::receipt::Receipt;
//!
//! let key_chain = Arc::new(KeyChain::from_files("key.pem", "cert.pem")?);
//! let mut receipt = Receipt::builder()
//!     .tax_id("CZ00000019")
//!     .establishment_id("1")
//!     .register_id("1")
//!     .receipt_number("1")
//!     .sale_time(chrono::Local::now().fixed_offset())
//!     .total(100.0)
//!     .build(key_chain);
//!
//! let envelope = Envelope::build(&mut receipt)?;
//! println!("{}", envelope.to_xml_string());
//! assert_eq!(receipt.bkp(), Some(envelope.codes().bkp()));
//! # Ok::<(), eet_core::Error>(())
//! ```
mod canonical;
mod certificate;
mod codes;
mod sign;
mod template;

pub use canonical::canonicalize;
pub use certificate::CertificateError;
pub use codes::{FiscalCodes, SigningError};
pub use template::{
    PlaceholderKind, Substitution, TemplateError, replace_attr_placeholder,
    replace_tag_placeholder,
};

pub(crate) use canonical::collapse_empty_records;
pub(crate) use codes::{format_bkp, plaintext};
pub(crate) use sign::{BODY, SIGNED_INFO};
pub(crate) use template::extract_subtree;

use crate::codec::{Base64Codec, StandardBase64};
use crate::receipt::{MissingFieldsError, Receipt, ReceiptFields};
use rsa::RsaPrivateKey;
use thiserror::Error;
use x509_cert::Certificate;

/// Errors raised by [`Envelope::build`].
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error(transparent)]
    MissingFields(#[from] MissingFieldsError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Certificate(#[from] CertificateError),
}

/// Working document between construction phases.
struct Draft<P> {
    document: String,
    phase: P,
}

struct Created;
struct BodyFilled;
struct CodesGenerated {
    codes: FiscalCodes,
}
struct CertificateEmbedded {
    codes: FiscalCodes,
}
struct Digested {
    codes: FiscalCodes,
}

impl Draft<Created> {
    fn new() -> Self {
        Draft {
            document: template::REQUEST_TEMPLATE.to_string(),
            phase: Created,
        }
    }

    fn fill_body(self, fields: &ReceiptFields) -> Result<Draft<BodyFilled>, TemplateError> {
        let mut document = self.document;
        template::fill_body(&mut document, fields)?;
        Ok(Draft {
            document,
            phase: BodyFilled,
        })
    }
}

impl Draft<BodyFilled> {
    fn embed_codes(
        self,
        fields: &ReceiptFields,
        key: &RsaPrivateKey,
        codec: &dyn Base64Codec,
    ) -> Result<Draft<CodesGenerated>, EnvelopeError> {
        let codes = codes::generate(fields, key, codec)?;
        let mut document = self.document;
        template::resolve_tag(&mut document, "pkp", codes.pkp())?;
        template::resolve_tag(&mut document, "bkp", codes.bkp())?;
        Ok(Draft {
            document,
            phase: CodesGenerated { codes },
        })
    }
}

impl Draft<CodesGenerated> {
    fn embed_certificate(
        self,
        certificate: &Certificate,
        codec: &dyn Base64Codec,
    ) -> Result<Draft<CertificateEmbedded>, EnvelopeError> {
        let token = certificate::security_token(certificate, codec)?;
        let mut document = self.document;
        certificate::embed(&mut document, &token)?;
        Ok(Draft {
            document,
            phase: CertificateEmbedded {
                codes: self.phase.codes,
            },
        })
    }
}

/// A fully signed request envelope.
///
/// Immutable once built. [`Envelope::to_xml_string`] renders the bytes to
/// transmit and can be called any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    document: String,
    codes: FiscalCodes,
}

impl Envelope {
    /// Builds the envelope with the standard base64 alphabet.
    pub fn build(receipt: &mut Receipt) -> Result<Self, EnvelopeError> {
        Self::build_with_codec(receipt, &StandardBase64)
    }

    /// Builds the envelope, encoding binary values with `codec`.
    ///
    /// The receipt is validated before any document exists. On success the
    /// fiscal codes are recorded on the receipt; on failure the receipt is
    /// left untouched.
    pub fn build_with_codec(
        receipt: &mut Receipt,
        codec: &dyn Base64Codec,
    ) -> Result<Self, EnvelopeError> {
        receipt.validate()?;

        let fields = receipt.fields();
        let key_chain = receipt.key_chain();
        let key = key_chain.private_key();

        let draft = Draft::new().fill_body(fields)?;
        tracing::debug!(phase = "body_filled", "receipt attributes substituted");
        let draft = draft.embed_codes(fields, key, codec)?;
        tracing::debug!(
            phase = "codes_generated",
            bkp = %draft.phase.codes.bkp(),
            "fiscal codes embedded"
        );
        let draft = draft.embed_certificate(key_chain.certificate(), codec)?;
        tracing::debug!(phase = "certificate_embedded", "security token embedded");
        let draft = draft.embed_digest(codec)?;
        tracing::debug!(phase = "digested", "body digest embedded");
        let envelope = draft.embed_signature(key, codec)?;

        tracing::info!(
            porad_cis = fields.porad_cis.as_deref().unwrap_or_default(),
            bkp = %envelope.codes.bkp(),
            "envelope signed"
        );
        receipt.record_codes(envelope.codes.clone());
        Ok(envelope)
    }

    /// Final envelope text: empty header/data elements self-closed, then the
    /// whole document canonicalized.
    pub fn to_xml_string(&self) -> String {
        canonicalize(&collapse_empty_records(&self.document))
    }

    pub fn codes(&self) -> &FiscalCodes {
        &self.codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keychain::KeyChain;
    use std::path::Path;
    use std::sync::Arc;

    fn key_chain() -> Arc<KeyChain> {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        Arc::new(
            KeyChain::from_files(fixtures.join("test-key.pem"), fixtures.join("test-cert.pem"))
                .expect("fixture key chain"),
        )
    }

    fn fields() -> ReceiptFields {
        ReceiptFields {
            uuid_zpravy: Some("b3a09b52-7c87-4014-a496-4c7a53cf9120".into()),
            dat_odesl: Some("2019-01-01T10:00:05+01:00".into()),
            prvni_zaslani: Some("true".into()),
            dic_popl: Some("CZ00000019".into()),
            id_provoz: Some("1".into()),
            id_pokl: Some("1".into()),
            porad_cis: Some("1".into()),
            dat_trzby: Some("2019-01-01T10:00:00+01:00".into()),
            celk_trzba: Some("100.00".into()),
            rezim: Some("0".into()),
            ..ReceiptFields::default()
        }
    }

    #[test]
    fn phases_resolve_their_placeholders() {
        let chain = key_chain();
        let fields = fields();
        let draft = Draft::new().fill_body(&fields).expect("body");
        assert!(draft.document.contains(r#"dic_popl="CZ00000019""#));
        assert!(draft.document.contains("<!--pkp-->"));

        let draft = draft
            .embed_codes(&fields, chain.private_key(), &StandardBase64)
            .expect("codes");
        assert!(!draft.document.contains("<!--pkp-->"));
        assert!(!draft.document.contains("<!--bkp-->"));
        assert!(draft.document.contains(draft.phase.codes.bkp()));

        let draft = draft
            .embed_certificate(chain.certificate(), &StandardBase64)
            .expect("certificate");
        assert!(!draft.document.contains("<!--BinarySecurityToken-->"));
        assert!(draft.document.contains("<!--DigestValue-->"));
    }

    #[test]
    fn render_is_repeatable() {
        let mut receipt = Receipt::new(fields(), key_chain());
        let envelope = Envelope::build(&mut receipt).expect("envelope");
        assert_eq!(envelope.to_xml_string(), envelope.to_xml_string());
        assert_eq!(receipt.codes(), Some(envelope.codes()));
    }

    #[test]
    fn rendered_output_self_closes_record_elements() {
        let mut receipt = Receipt::new(fields(), key_chain());
        let xml = Envelope::build(&mut receipt).expect("envelope").to_xml_string();
        assert!(xml.contains(r#"uuid_zpravy="b3a09b52-7c87-4014-a496-4c7a53cf9120"/>"#));
        assert!(xml.contains(r#"rezim="0"/>"#));
        assert!(!xml.contains("</Hlavicka>"));
        assert!(!xml.contains("</Data>"));
    }

    #[test]
    fn value_with_markup_fails_without_recording_codes() {
        let mut fields = fields();
        fields.cest_sluz = Some("1<2".into());
        let mut receipt = Receipt::new(fields, key_chain());
        let err = Envelope::build(&mut receipt).expect_err("invalid value");
        assert!(matches!(
            err,
            EnvelopeError::Template(TemplateError::InvalidValue { .. })
        ));
        assert!(receipt.codes().is_none());
    }
}
