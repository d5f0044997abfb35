use eet_derive::AttributeMap;

#[derive(AttributeMap)]
#[validate(required)]
pub struct Codes {
    pub pkp: Option<String>,
    pub bkp: Option<String>,
}

fn main() {
    let c = Codes {
        pkp: Some("  ".into()),
        bkp: None,
    };

    assert_eq!(c.validate(), Err(vec!["pkp", "bkp"]));
}
