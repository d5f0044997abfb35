use eet_core::keychain::KeyChain;
use eet_core::receipt::{Receipt, ReceiptBuilder};
use std::path::PathBuf;
use std::sync::Arc;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn key_chain() -> Arc<KeyChain> {
    Arc::new(
        KeyChain::from_files(fixture("test-key.pem"), fixture("test-cert.pem"))
            .expect("fixture key chain"),
    )
}

/// Receipt the golden PKP, BKP and envelope were recorded from.
pub fn golden_receipt() -> Receipt {
    ReceiptBuilder::from_properties_file(&fixture("receipt.properties"))
        .expect("receipt properties")
        .build(key_chain())
}

#[allow(dead_code)]
pub fn golden(name: &str) -> String {
    std::fs::read_to_string(fixture(name))
        .expect("golden fixture")
        .trim_end()
        .to_string()
}
