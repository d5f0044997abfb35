use super::template::{TemplateError, resolve_tag};
use crate::codec::Base64Codec;
use thiserror::Error;
use x509_cert::{Certificate, der::Encode};

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("failed to DER-encode the signing certificate: {source}")]
    DerEncode {
        #[source]
        source: x509_cert::der::Error,
    },
}

/// Base64 of the DER certificate, as carried by `wsse:BinarySecurityToken`.
pub(crate) fn security_token(
    certificate: &Certificate,
    codec: &dyn Base64Codec,
) -> Result<String, CertificateError> {
    let der = certificate
        .to_der()
        .map_err(|source| CertificateError::DerEncode { source })?;
    Ok(codec.encode(&der))
}

pub(crate) fn embed(document: &mut String, token: &str) -> Result<(), TemplateError> {
    resolve_tag(document, "BinarySecurityToken", token)
}
