use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, quote};
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, PathArguments, Type, parse_macro_input,
};

mod rules;

fn extract_error_type(attrs: &[Attribute]) -> syn::Result<TokenStream2> {
    for attr in attrs.iter().filter(|a| a.path().is_ident("validate_error")) {
        let mut ty = None;
        attr.parse_nested_meta(|meta| {
            ty = Some(meta.path.to_token_stream());
            Ok(())
        })?;
        if let Some(t) = ty {
            return Ok(t);
        }
    }
    Ok(quote! { ::std::vec::Vec<&'static str> })
}

fn extract_rules(attrs: &[Attribute]) -> syn::Result<Vec<String>> {
    let mut out = vec![];
    for attr in attrs.iter().filter(|a| a.path().is_ident("validate")) {
        attr.parse_nested_meta(|meta| {
            if let Some(id) = meta.path.get_ident() {
                out.push(id.to_string());
            }
            Ok(())
        })?;
    }
    Ok(out)
}

/// Attribute slots must be `Option<String>`.
fn is_optional_string(ty: &Type) -> bool {
    let Type::Path(p) = ty else {
        return false;
    };
    let Some(last) = p.path.segments.last() else {
        return false;
    };
    if last.ident != "Option" {
        return false;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return false;
    };
    matches!(
        args.args.first(),
        Some(GenericArgument::Type(Type::Path(inner)))
            if inner.path.segments.last().map(|s| s.ident == "String").unwrap_or(false)
    )
}

/// Derives an ordered attribute map over a struct of `Option<String>` slots.
///
/// Generates `ATTR_NAMES` (field declaration order), `get`, `slot_mut` and a
/// `validate` method that collects every field failing one of its
/// `#[validate(...)]` rules. The error type defaults to `Vec<&'static str>`
/// and can be replaced with `#[validate_error(Type)]` where
/// `Type: From<Vec<&'static str>>`.
#[proc_macro_derive(AttributeMap, attributes(validate, validate_error))]
pub fn derive_attribute_map(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    match expand(ast) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(ast: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = ast.ident;
    let error_type = extract_error_type(&ast.attrs)?;
    let struct_rules = extract_rules(&ast.attrs)?;

    let fields = match ast.data {
        Data::Struct(s) => match s.fields {
            Fields::Named(n) => n.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &struct_name,
                    "AttributeMap supports named structs only",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &struct_name,
                "AttributeMap can only be used on structs",
            ));
        }
    };

    let mut names = vec![];
    let mut get_arms = vec![];
    let mut slot_arms = vec![];
    let mut validations = vec![];

    for field in fields {
        let Some(ident) = field.ident else {
            continue;
        };
        let mut field_rules = extract_rules(&field.attrs)?;
        if field_rules.iter().any(|r| r == "skip") {
            continue;
        }
        if !is_optional_string(&field.ty) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                format!("attribute `{ident}` must be Option<String>"),
            ));
        }

        let name = ident.to_string();
        get_arms.push(quote! { #name => self.#ident.as_deref() });
        slot_arms.push(quote! { #name => ::std::option::Option::Some(&mut self.#ident) });
        names.push(name);

        if field_rules.is_empty() {
            field_rules = struct_rules.clone();
        }
        for rule in field_rules {
            let ts = rules::dispatch(&rule, &ident).ok_or_else(|| {
                syn::Error::new_spanned(&ident, format!("Unknown rule `{rule}`"))
            })?;
            validations.push(ts);
        }
    }

    Ok(quote! {
        impl #struct_name {
            /// Attribute names in declaration order.
            pub const ATTR_NAMES: &'static [&'static str] = &[#(#names),*];

            pub fn get(&self, name: &str) -> ::std::option::Option<&str> {
                match name {
                    #(#get_arms,)*
                    _ => ::std::option::Option::None,
                }
            }

            pub fn slot_mut(
                &mut self,
                name: &str,
            ) -> ::std::option::Option<&mut ::std::option::Option<::std::string::String>> {
                match name {
                    #(#slot_arms,)*
                    _ => ::std::option::Option::None,
                }
            }

            pub fn validate(&self) -> ::std::result::Result<(), #error_type> {
                let mut missing: ::std::vec::Vec<&'static str> = ::std::vec::Vec::new();
                #(#validations)*
                if missing.is_empty() {
                    ::std::result::Result::Ok(())
                } else {
                    ::std::result::Result::Err(<#error_type>::from(missing))
                }
            }
        }
    })
}
