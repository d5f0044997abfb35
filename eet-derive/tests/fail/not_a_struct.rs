#![allow(dead_code)]

use eet_derive::AttributeMap;

#[derive(AttributeMap)]
pub enum Regime {
    Standard,
    Simplified,
}

fn main() {}
