#![allow(dead_code)]

use eet_derive::AttributeMap;

#[derive(AttributeMap)]
pub struct Record {
    pub celk_trzba: f64,
}

fn main() {}
