use crate::codec::Base64Codec;
use crate::receipt::{FISCAL_CODE_FIELDS, ReceiptFields};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("failed to sign {what}: {source}")]
    Sign {
        what: &'static str,
        #[source]
        source: rsa::signature::Error,
    },

    #[error("receipt attribute '{name}' is required to compute fiscal codes")]
    MissingInput { name: &'static str },
}

/// Taxpayer signature code (PKP) and its security code (BKP).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalCodes {
    pkp: String,
    bkp: String,
}

impl FiscalCodes {
    pub(crate) fn new(pkp: String, bkp: String) -> Self {
        Self { pkp, bkp }
    }

    /// Base64 PKCS#1 v1.5 SHA-256 signature over the fiscal code plaintext.
    pub fn pkp(&self) -> &str {
        &self.pkp
    }

    /// SHA-1 of the raw signature, as `XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX`.
    pub fn bkp(&self) -> &str {
        &self.bkp
    }
}

/// `dic_popl|id_provoz|id_pokl|porad_cis|dat_trzby|celk_trzba`
pub(crate) fn plaintext(fields: &ReceiptFields) -> Result<String, SigningError> {
    let mut parts = Vec::with_capacity(FISCAL_CODE_FIELDS.len());
    for name in FISCAL_CODE_FIELDS {
        let value = fields
            .get(name)
            .ok_or(SigningError::MissingInput { name })?;
        parts.push(value);
    }
    Ok(parts.join("|"))
}

pub(crate) fn generate(
    fields: &ReceiptFields,
    key: &RsaPrivateKey,
    codec: &dyn Base64Codec,
) -> Result<FiscalCodes, SigningError> {
    let plaintext = plaintext(fields)?;
    let signature = sign_sha256(key, plaintext.as_bytes(), "fiscal code plaintext")?;
    Ok(FiscalCodes::new(
        codec.encode(&signature),
        format_bkp(&Sha1::digest(&signature)),
    ))
}

pub(crate) fn sign_sha256(
    key: &RsaPrivateKey,
    message: &[u8],
    what: &'static str,
) -> Result<Vec<u8>, SigningError> {
    let signing_key = SigningKey::<Sha256>::new(key.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|source| SigningError::Sign { what, source })?;
    Ok(signature.to_vec())
}

/// Uppercase hex with a hyphen after every four bytes.
pub(crate) fn format_bkp(hash: &[u8]) -> String {
    let mut out = String::with_capacity(hash.len() * 2 + hash.len() / 4);
    for (i, byte) in hash.iter().enumerate() {
        if i > 0 && i % 4 == 0 {
            out.push('-');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out
}
