//! Independent check of a rendered envelope.
//!
//! Only the embedded certificate is trusted: the body digest, the
//! `SignedInfo` signature, the PKP and the BKP are all re-derived from the
//! envelope bytes and compared against what it claims.
use crate::envelope::{
    BODY, FiscalCodes, SIGNED_INFO, SigningError, TemplateError, canonicalize, extract_subtree,
    format_bkp, plaintext,
};
use crate::keychain::{KeyChainError, certificate_from_der, certificate_public_key};
use crate::receipt::ReceiptFields;
use base64ct::{Base64, Encoding};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use thiserror::Error;

static SELF_CLOSED_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(Hlavicka|Data)([^>]*)/>").expect("valid self-closed element pattern")
});

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed envelope XML: {message}")]
    Xml { message: String },

    #[error("envelope has no <{element}> content")]
    MissingElement { element: &'static str },

    #[error("<{element}> is not valid base64")]
    Base64 { element: &'static str },

    #[error("embedded certificate is unusable: {0}")]
    Certificate(#[from] KeyChainError),

    #[error(transparent)]
    Structure(#[from] TemplateError),

    #[error(transparent)]
    Codes(#[from] SigningError),

    #[error("body digest does not match DigestValue")]
    DigestMismatch,

    #[error("{what} signature does not verify against the embedded certificate")]
    InvalidSignature { what: &'static str },

    #[error("bkp is not the SHA-1 fingerprint of pkp")]
    BkpMismatch,
}

/// Values pulled out of the envelope before any cryptographic check.
#[derive(Debug, Default)]
struct Embedded {
    security_token: Option<String>,
    digest_value: Option<String>,
    signature_value: Option<String>,
    pkp: Option<String>,
    bkp: Option<String>,
    fields: ReceiptFields,
}

/// Verifies a rendered envelope and returns the fiscal codes it carries.
pub fn verify_envelope(xml: &str) -> Result<FiscalCodes, VerifyError> {
    let embedded = read_embedded(xml)?;

    let token = required(embedded.security_token, "wsse:BinarySecurityToken")?;
    let cert_der = decode(&token, "wsse:BinarySecurityToken")?;
    let public_key = certificate_public_key(&certificate_from_der(&cert_der)?)?;

    let digest_value = required(embedded.digest_value, "ds:DigestValue")?;
    let body = SELF_CLOSED_RECORD.replace_all(extract_subtree(xml, BODY)?, "<${1}${2}></${1}>");
    let body_digest = Sha256::digest(canonicalize(&body).as_bytes());
    if decode(&digest_value, "ds:DigestValue")? != body_digest.as_slice() {
        return Err(VerifyError::DigestMismatch);
    }

    let signature_value = required(embedded.signature_value, "ds:SignatureValue")?;
    let signed_info = canonicalize(extract_subtree(xml, SIGNED_INFO)?);
    verify_signature(
        &public_key,
        signed_info.as_bytes(),
        &decode(&signature_value, "ds:SignatureValue")?,
        "SignedInfo",
    )?;

    let pkp = required(embedded.pkp, "pkp")?;
    let bkp = required(embedded.bkp, "bkp")?;
    let pkp_raw = decode(&pkp, "pkp")?;
    let message = plaintext(&embedded.fields)?;
    verify_signature(&public_key, message.as_bytes(), &pkp_raw, "pkp")?;
    if format_bkp(&Sha1::digest(&pkp_raw)) != bkp {
        return Err(VerifyError::BkpMismatch);
    }

    tracing::debug!(bkp = %bkp, "envelope verified");
    Ok(FiscalCodes::new(pkp, bkp))
}

fn read_embedded(xml: &str) -> Result<Embedded, VerifyError> {
    let mut reader = Reader::from_str(xml);
    let mut embedded = Embedded::default();
    let mut open: Option<Vec<u8>> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) => {
                if element.name().as_ref() == b"Data" {
                    read_attributes(&element, &mut embedded.fields)?;
                }
                open = Some(element.name().as_ref().to_vec());
            }
            Event::Empty(element) => {
                if element.name().as_ref() == b"Data" {
                    read_attributes(&element, &mut embedded.fields)?;
                }
            }
            Event::Text(text) => {
                let Some(name) = open.as_deref() else {
                    continue;
                };
                let slot = match name {
                    b"wsse:BinarySecurityToken" => &mut embedded.security_token,
                    b"ds:DigestValue" => &mut embedded.digest_value,
                    b"ds:SignatureValue" => &mut embedded.signature_value,
                    b"pkp" => &mut embedded.pkp,
                    b"bkp" => &mut embedded.bkp,
                    _ => continue,
                };
                *slot = Some(text.unescape().map_err(xml_error)?.trim().to_string());
            }
            Event::End(_) => open = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(embedded)
}

fn read_attributes(
    element: &BytesStart<'_>,
    fields: &mut ReceiptFields,
) -> Result<(), VerifyError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(xml_error)?;
        let name = std::str::from_utf8(attribute.key.as_ref()).map_err(xml_error)?;
        if let Some(slot) = fields.slot_mut(name) {
            *slot = Some(attribute.unescape_value().map_err(xml_error)?.into_owned());
        }
    }
    Ok(())
}

fn verify_signature(
    public_key: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
    what: &'static str,
) -> Result<(), VerifyError> {
    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    let signature =
        Signature::try_from(signature).map_err(|_| VerifyError::InvalidSignature { what })?;
    verifying_key
        .verify(message, &signature)
        .map_err(|_| VerifyError::InvalidSignature { what })
}

fn required(value: Option<String>, element: &'static str) -> Result<String, VerifyError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(VerifyError::MissingElement { element })
}

fn decode(value: &str, element: &'static str) -> Result<Vec<u8>, VerifyError> {
    Base64::decode_vec(value).map_err(|_| VerifyError::Base64 { element })
}

fn xml_error(err: impl std::fmt::Display) -> VerifyError {
    VerifyError::Xml {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLDEN: &str = include_str!("../tests/fixtures/golden-envelope.xml");

    #[test]
    fn golden_envelope_verifies() {
        let codes = verify_envelope(GOLDEN).expect("golden envelope verifies");
        assert_eq!(
            codes.bkp(),
            include_str!("../tests/fixtures/golden-bkp.txt").trim()
        );
    }

    #[test]
    fn altered_amount_breaks_the_digest() {
        let tampered = GOLDEN.replace(r#"celk_trzba="100.00""#, r#"celk_trzba="900.00""#);
        assert!(matches!(
            verify_envelope(&tampered),
            Err(VerifyError::DigestMismatch)
        ));
    }

    #[test]
    fn missing_signature_value_is_reported() {
        let start = GOLDEN.find("<ds:SignatureValue>").expect("signature start");
        let end = GOLDEN.find("</ds:SignatureValue>").expect("signature end");
        let stripped = format!(
            "{}<ds:SignatureValue>{}",
            &GOLDEN[..start],
            &GOLDEN[end..]
        );
        assert!(matches!(
            verify_envelope(&stripped),
            Err(VerifyError::MissingElement {
                element: "ds:SignatureValue"
            })
        ));
    }

    #[test]
    fn garbage_is_not_an_envelope() {
        assert!(verify_envelope("<a>").is_err());
        assert!(verify_envelope("not xml at all").is_err());
    }
}
