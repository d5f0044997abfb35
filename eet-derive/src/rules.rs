//! Builtin validation rules.
//!
//! A rule expands to a statement that pushes the field name onto
//! `missing` when the slot fails the rule.

use proc_macro2::{Ident, TokenStream};
use quote::quote;

pub(crate) fn dispatch(rule: &str, field: &Ident) -> Option<TokenStream> {
    let name = field.to_string();
    match rule {
        // Absent or blank.
        "required" => Some(quote! {
            if self.#field.as_deref().map_or(true, |v| v.trim().is_empty()) {
                missing.push(#name);
            }
        }),
        _ => None,
    }
}
