//! Placeholder substitution over the request template.
//!
//! Two placeholder kinds exist:
//! - attribute placeholders, the quoted value `"→name←"` of an attribute;
//! - tag placeholders, the comment `<!--name-->` standing in for element text.
//!
//! Every name occurs at most once in the template and is resolved at most once.
use crate::receipt::ReceiptFields;
use thiserror::Error;

pub(crate) const REQUEST_TEMPLATE: &str = include_str!("../../assets/templates/request.xml");

/// Errors raised when the template and the inserted values disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template has no {kind} placeholder '{name}'")]
    MissingPlaceholder {
        kind: PlaceholderKind,
        name: String,
    },

    #[error("value for '{name}' cannot be inserted verbatim: contains {found:?}")]
    InvalidValue { name: String, found: char },

    #[error("expected exactly one <{element}> subtree, found {count}")]
    Subtree { element: &'static str, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Attribute,
    Tag,
}

impl std::fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceholderKind::Attribute => f.write_str("attribute"),
            PlaceholderKind::Tag => f.write_str("tag"),
        }
    }
}

/// Outcome of a single first-occurrence substitution.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution {
    Replaced,
    NotFound,
}

/// Characters that would change the document structure, span lines, be
/// normalised by an XML parser, or read back as a placeholder.
const FORBIDDEN: [char; 9] = ['\n', '\r', '\t', '"', '<', '>', '&', '→', '←'];

/// Replaces the first `"→name←"` with `"value"`. Leaves the text untouched
/// when the token is absent.
pub fn replace_attr_placeholder(document: &mut String, name: &str, value: &str) -> Substitution {
    let token = format!("\"→{name}←\"");
    replace_first(document, &token, &format!("\"{value}\""))
}

/// Replaces the first `<!--name-->` with `value`. Leaves the text untouched
/// when the token is absent.
pub fn replace_tag_placeholder(document: &mut String, name: &str, value: &str) -> Substitution {
    let token = format!("<!--{name}-->");
    replace_first(document, &token, value)
}

fn replace_first(document: &mut String, token: &str, replacement: &str) -> Substitution {
    match document.find(token) {
        Some(start) => {
            document.replace_range(start..start + token.len(), replacement);
            Substitution::Replaced
        }
        None => Substitution::NotFound,
    }
}

pub(crate) fn check_value(name: &str, value: &str) -> Result<(), TemplateError> {
    match value.chars().find(|c| FORBIDDEN.contains(c)) {
        Some(found) => Err(TemplateError::InvalidValue {
            name: name.to_string(),
            found,
        }),
        None => Ok(()),
    }
}

/// Resolves a tag placeholder that the template must contain.
pub(crate) fn resolve_tag(
    document: &mut String,
    name: &str,
    value: &str,
) -> Result<(), TemplateError> {
    check_value(name, value)?;
    match replace_tag_placeholder(document, name, value) {
        Substitution::Replaced => Ok(()),
        Substitution::NotFound => Err(TemplateError::MissingPlaceholder {
            kind: PlaceholderKind::Tag,
            name: name.to_string(),
        }),
    }
}

/// Substitutes every present receipt attribute, in attribute order.
///
/// Absent values leave their placeholder in place; the canonicalizer strips
/// it from signed material and from the rendered envelope. A present value
/// without a placeholder is an error.
pub(crate) fn fill_body(document: &mut String, fields: &ReceiptFields) -> Result<(), TemplateError> {
    for &name in ReceiptFields::ATTR_NAMES {
        let Some(value) = fields.get(name) else {
            continue;
        };
        check_value(name, value)?;
        if replace_attr_placeholder(document, name, value) == Substitution::NotFound {
            return Err(TemplateError::MissingPlaceholder {
                kind: PlaceholderKind::Attribute,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Slice from the single `<element` opening to the last `</element>`.
///
/// The template guarantees one occurrence and no nested element of the same
/// name; anything else is reported instead of guessed at.
pub(crate) fn extract_subtree<'a>(
    document: &'a str,
    element: &'static str,
) -> Result<&'a str, TemplateError> {
    let open = format!("<{element}");
    let close = format!("</{element}>");
    let count = document.matches(open.as_str()).count();
    let subtree_err = TemplateError::Subtree { element, count };
    if count != 1 {
        return Err(subtree_err);
    }
    let start = document.find(open.as_str()).ok_or(subtree_err.clone())?;
    let end = document
        .rfind(close.as_str())
        .map(|i| i + close.len())
        .filter(|&end| end > start)
        .ok_or(subtree_err)?;
    Ok(&document[start..end])
}
