use eet_derive::AttributeMap;

#[derive(AttributeMap, Default)]
pub struct Header {
    #[validate(required)]
    pub uuid_zpravy: Option<String>,
    pub overeni: Option<String>,
}

fn main() {
    assert_eq!(Header::ATTR_NAMES, &["uuid_zpravy", "overeni"]);

    let mut h = Header::default();
    assert_eq!(h.validate(), Err(vec!["uuid_zpravy"]));

    *h.slot_mut("uuid_zpravy").unwrap() = Some("abc".into());
    assert_eq!(h.get("uuid_zpravy"), Some("abc"));
    assert_eq!(h.get("overeni"), None);
    assert!(h.slot_mut("unknown").is_none());
    assert!(h.validate().is_ok());
}
