//! Receipt attributes, the mandatory-field check and receipt builders.
use crate::envelope::FiscalCodes;
use crate::keychain::KeyChain;
use chrono::{DateTime, FixedOffset, Local};
use eet_derive::AttributeMap;
use java_properties::read;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use uuid::Uuid;

/// Inputs of the fiscal codes, in the order they are joined for signing.
pub const FISCAL_CODE_FIELDS: [&str; 6] = [
    "dic_popl",
    "id_provoz",
    "id_pokl",
    "porad_cis",
    "dat_trzby",
    "celk_trzba",
];

/// Raised before any document is built when mandatory attributes are absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing mandatory receipt fields: {}", fields.join(", "))]
pub struct MissingFieldsError {
    pub fields: Vec<&'static str>,
}

impl From<Vec<&'static str>> for MissingFieldsError {
    fn from(fields: Vec<&'static str>) -> Self {
        Self { fields }
    }
}

/// Errors raised while assembling receipt attributes from external input.
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("failed to open receipt file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse receipt properties from '{path}': {source}")]
    PropertiesRead {
        path: PathBuf,
        #[source]
        source: java_properties::PropertiesError,
    },

    #[error("unknown receipt attribute '{name}'")]
    UnknownAttribute { name: String },
}

/// Every attribute the envelope template recognises, in template order.
///
/// Field names are the attribute names of the `Hlavicka` and `Data`
/// elements. Blank values count as absent for mandatory fields.
#[derive(AttributeMap, Debug, Clone, Default, PartialEq, Eq)]
#[validate_error(MissingFieldsError)]
pub struct ReceiptFields {
    pub uuid_zpravy: Option<String>,
    pub dat_odesl: Option<String>,
    pub prvni_zaslani: Option<String>,
    pub overeni: Option<String>,
    #[validate(required)]
    pub dic_popl: Option<String>,
    pub dic_poverujiciho: Option<String>,
    #[validate(required)]
    pub id_provoz: Option<String>,
    #[validate(required)]
    pub id_pokl: Option<String>,
    #[validate(required)]
    pub porad_cis: Option<String>,
    #[validate(required)]
    pub dat_trzby: Option<String>,
    #[validate(required)]
    pub celk_trzba: Option<String>,
    pub zakl_nepodl_dph: Option<String>,
    pub zakl_dan1: Option<String>,
    pub dan1: Option<String>,
    pub zakl_dan2: Option<String>,
    pub dan2: Option<String>,
    pub zakl_dan3: Option<String>,
    pub dan3: Option<String>,
    pub cest_sluz: Option<String>,
    pub pouzit_zboz1: Option<String>,
    pub pouzit_zboz2: Option<String>,
    pub pouzit_zboz3: Option<String>,
    pub urceno_cerp_zuct: Option<String>,
    pub cerp_zuct: Option<String>,
    pub rezim: Option<String>,
}

/// A sales receipt bound to the key chain that will sign it.
#[derive(Debug, Clone)]
pub struct Receipt {
    fields: ReceiptFields,
    key_chain: Arc<KeyChain>,
    codes: Option<FiscalCodes>,
}

impl Receipt {
    pub fn new(fields: ReceiptFields, key_chain: Arc<KeyChain>) -> Self {
        Self {
            fields,
            key_chain,
            codes: None,
        }
    }

    pub fn builder() -> ReceiptBuilder {
        ReceiptBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &ReceiptFields {
        &self.fields
    }

    pub fn key_chain(&self) -> &KeyChain {
        &self.key_chain
    }

    /// Lists every absent mandatory attribute.
    pub fn validate(&self) -> Result<(), MissingFieldsError> {
        self.fields.validate()
    }

    /// Codes computed by the last successful envelope construction.
    pub fn codes(&self) -> Option<&FiscalCodes> {
        self.codes.as_ref()
    }

    pub fn pkp(&self) -> Option<&str> {
        self.codes.as_ref().map(FiscalCodes::pkp)
    }

    pub fn bkp(&self) -> Option<&str> {
        self.codes.as_ref().map(FiscalCodes::bkp)
    }

    pub(crate) fn record_codes(&mut self, codes: FiscalCodes) {
        self.codes = Some(codes);
    }
}

/// VAT rate bands carried by the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VatRate {
    Standard,
    FirstReduced,
    SecondReduced,
}

/// Typed construction of [`ReceiptFields`].
///
/// Header attributes default to a fresh message UUID, the current local time
/// as send time, first submission and the standard regime. Mandatory
/// attributes are not checked here; envelope construction validates them.
///
/// # Examples
/// ```rust
/// use chrono::DateTime;
/// use eet_core::receipt::ReceiptBuilder;
///
/// let sold_at = DateTime::parse_from_rfc3339("2019-01-01T10:00:00+01:00").unwrap();
/// let fields = ReceiptBuilder::new()
///     .tax_id("CZ00000019")
///     .establishment_id("1")
///     .register_id("1")
///     .receipt_number("1")
///     .sale_time(sold_at)
///     .total(100.0)
///     .into_fields();
/// assert_eq!(fields.celk_trzba.as_deref(), Some("100.00"));
/// assert_eq!(fields.dat_trzby.as_deref(), Some("2019-01-01T10:00:00+01:00"));
/// assert!(fields.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ReceiptBuilder {
    fields: ReceiptFields,
}

impl Default for ReceiptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptBuilder {
    pub fn new() -> Self {
        Self {
            fields: ReceiptFields {
                prvni_zaslani: Some("true".into()),
                rezim: Some("0".into()),
                ..ReceiptFields::default()
            },
        }
    }

    /// Reads `attribute=value` pairs from a Java properties file.
    pub fn from_properties_file(path: &Path) -> Result<Self, ReceiptError> {
        let file = File::open(path).map_err(|source| ReceiptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let props = read(BufReader::new(file)).map_err(|source| ReceiptError::PropertiesRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mut builder = Self::new();
        let mut entries: Vec<_> = props.into_iter().collect();
        entries.sort();
        for (name, value) in entries {
            builder = builder.set(&name, value)?;
        }
        Ok(builder)
    }

    /// Sets an attribute by its template name.
    pub fn set(mut self, name: &str, value: impl Into<String>) -> Result<Self, ReceiptError> {
        let slot = self
            .fields
            .slot_mut(name)
            .ok_or_else(|| ReceiptError::UnknownAttribute {
                name: name.to_string(),
            })?;
        *slot = Some(value.into());
        Ok(self)
    }

    pub fn tax_id(mut self, dic: impl Into<String>) -> Self {
        self.fields.dic_popl = Some(dic.into());
        self
    }

    pub fn delegating_tax_id(mut self, dic: impl Into<String>) -> Self {
        self.fields.dic_poverujiciho = Some(dic.into());
        self
    }

    pub fn establishment_id(mut self, id: impl Into<String>) -> Self {
        self.fields.id_provoz = Some(id.into());
        self
    }

    pub fn register_id(mut self, id: impl Into<String>) -> Self {
        self.fields.id_pokl = Some(id.into());
        self
    }

    pub fn receipt_number(mut self, number: impl Into<String>) -> Self {
        self.fields.porad_cis = Some(number.into());
        self
    }

    pub fn sale_time(mut self, at: DateTime<FixedOffset>) -> Self {
        self.fields.dat_trzby = Some(format_time(&at));
        self
    }

    pub fn total(mut self, amount: f64) -> Self {
        self.fields.celk_trzba = Some(format_amount(amount));
        self
    }

    pub fn vat(mut self, rate: VatRate, base: f64, tax: f64) -> Self {
        let fields = &mut self.fields;
        let (base_slot, tax_slot) = match rate {
            VatRate::Standard => (&mut fields.zakl_dan1, &mut fields.dan1),
            VatRate::FirstReduced => (&mut fields.zakl_dan2, &mut fields.dan2),
            VatRate::SecondReduced => (&mut fields.zakl_dan3, &mut fields.dan3),
        };
        *base_slot = Some(format_amount(base));
        *tax_slot = Some(format_amount(tax));
        self
    }

    pub fn message_uuid(mut self, uuid: Uuid) -> Self {
        self.fields.uuid_zpravy = Some(uuid.to_string());
        self
    }

    pub fn sent_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.fields.dat_odesl = Some(format_time(&at));
        self
    }

    pub fn first_submission(mut self, first: bool) -> Self {
        self.fields.prvni_zaslani = Some(first.to_string());
        self
    }

    /// Verification mode: the authority checks the message without registering it.
    pub fn verification(mut self, verify_only: bool) -> Self {
        self.fields.overeni = Some(verify_only.to_string());
        self
    }

    pub fn simplified_regime(mut self, simplified: bool) -> Self {
        self.fields.rezim = Some(if simplified { "1" } else { "0" }.into());
        self
    }

    /// Fields with header defaults applied.
    pub fn into_fields(mut self) -> ReceiptFields {
        if self.fields.uuid_zpravy.is_none() {
            self.fields.uuid_zpravy = Some(Uuid::new_v4().to_string());
        }
        if self.fields.dat_odesl.is_none() {
            self.fields.dat_odesl = Some(format_time(&Local::now().fixed_offset()));
        }
        self.fields
    }

    pub fn build(self, key_chain: Arc<KeyChain>) -> Receipt {
        Receipt::new(self.into_fields(), key_chain)
    }
}

fn format_time(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Two decimal places; amounts that round to zero never carry a sign.
fn format_amount(amount: f64) -> String {
    let text = format!("{amount:.2}");
    match text.strip_prefix('-') {
        Some(unsigned) if unsigned == "0.00" => unsigned.to_string(),
        _ => text,
    }
}
