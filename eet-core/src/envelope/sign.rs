//! WS-Security signature over the envelope body.
//!
//! The `SignedInfo` element carries the body digest, so the digest has to be
//! embedded before `SignedInfo` is canonicalized and signed. The draft types
//! only offer the signature step after the digest step.
use super::canonical::canonicalize;
use super::codes::sign_sha256;
use super::template::{TemplateError, extract_subtree, resolve_tag};
use super::{CertificateEmbedded, Digested, Draft, Envelope, EnvelopeError};
use crate::codec::Base64Codec;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

pub(crate) const BODY: &str = "soap:Body";
pub(crate) const SIGNED_INFO: &str = "ds:SignedInfo";

/// SHA-256 of the canonical `soap:Body` subtree.
fn body_digest(document: &str) -> Result<Vec<u8>, TemplateError> {
    let body = canonicalize(extract_subtree(document, BODY)?);
    Ok(Sha256::digest(body.as_bytes()).to_vec())
}

/// RSA-SHA256 signature of the canonical `ds:SignedInfo` subtree.
fn signed_info_signature(
    document: &str,
    key: &RsaPrivateKey,
) -> Result<Vec<u8>, EnvelopeError> {
    let signed_info = canonicalize(extract_subtree(document, SIGNED_INFO)?);
    Ok(sign_sha256(key, signed_info.as_bytes(), "SignedInfo")?)
}

impl Draft<CertificateEmbedded> {
    pub(super) fn embed_digest(
        self,
        codec: &dyn Base64Codec,
    ) -> Result<Draft<Digested>, TemplateError> {
        let mut document = self.document;
        let digest = codec.encode(&body_digest(&document)?);
        resolve_tag(&mut document, "DigestValue", &digest)?;
        Ok(Draft {
            document,
            phase: Digested {
                codes: self.phase.codes,
            },
        })
    }
}

impl Draft<Digested> {
    pub(super) fn embed_signature(
        self,
        key: &RsaPrivateKey,
        codec: &dyn Base64Codec,
    ) -> Result<Envelope, EnvelopeError> {
        let mut document = self.document;
        let signature = codec.encode(&signed_info_signature(&document, key)?);
        resolve_tag(&mut document, "SignatureValue", &signature)?;
        Ok(Envelope {
            document,
            codes: self.phase.codes,
        })
    }
}
