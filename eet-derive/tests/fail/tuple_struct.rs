#![allow(dead_code)]

use eet_derive::AttributeMap;

#[derive(AttributeMap)]
pub struct Codes(Option<String>);

fn main() {}
