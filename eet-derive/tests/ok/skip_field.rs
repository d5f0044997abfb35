use eet_derive::AttributeMap;

#[derive(AttributeMap)]
#[validate(required)]
pub struct Sample {
    pub dic_popl: Option<String>,

    #[validate(skip)]
    pub internal: i32,
}

fn main() {
    let s = Sample {
        dic_popl: Some("CZ00000019".into()),
        internal: 10,
    };
    assert_eq!(Sample::ATTR_NAMES, &["dic_popl"]);
    assert!(s.validate().is_ok());
    assert_eq!(s.internal, 10);
}
