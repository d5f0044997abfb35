#![allow(dead_code)]

use eet_derive::AttributeMap;

#[derive(AttributeMap)]
pub struct Header {
    #[validate(non_empty)]
    pub dic_popl: Option<String>,
}

fn main() {}
