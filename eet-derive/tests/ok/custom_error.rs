use eet_derive::AttributeMap;

#[derive(Debug, PartialEq)]
pub struct Missing(Vec<&'static str>);

impl From<Vec<&'static str>> for Missing {
    fn from(fields: Vec<&'static str>) -> Self {
        Missing(fields)
    }
}

#[derive(AttributeMap, Default)]
#[validate_error(Missing)]
pub struct Data {
    #[validate(required)]
    pub id_provoz: Option<String>,
    #[validate(required)]
    pub id_pokl: Option<String>,
}

fn main() {
    let d = Data::default();
    assert_eq!(d.validate(), Err(Missing(vec!["id_provoz", "id_pokl"])));
}
