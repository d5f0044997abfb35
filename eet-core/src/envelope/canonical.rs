//! Whitespace and comment normalisation of envelope fragments.
//!
//! This is not XML C14N. The passes are tuned to the formatting of the
//! request template, and their byte output is what gets hashed and signed,
//! so the order and the exact patterns must not change.
use regex::Regex;
use std::sync::LazyLock;

/// Comments and attributes still holding an unresolved `"→name←"` value.
static COMMENTS_AND_PLACEHOLDERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!--[^>]*-->|[[:space:]]+[[:word:]]+="→[[:word:]]+←""#)
        .expect("valid comment/placeholder pattern")
});

static LEADING_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\n)[[:space:]]+").expect("valid leading whitespace pattern")
});

/// An empty `Hlavicka`/`Data` element written as a start/end pair.
static EMPTY_RECORD_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r">[[:space:]]*</(?:Hlavicka|Data)>").expect("valid empty element pattern")
});

/// Normalises `fragment` for hashing, signing and transmission.
///
/// Pure and total. The passes are re-applied until the text stops changing,
/// so `canonicalize(&canonicalize(x)) == canonicalize(x)` for any input; for
/// template-shaped input one round already is the fixed point.
pub fn canonicalize(fragment: &str) -> String {
    let mut current = apply_passes(fragment);
    loop {
        let next = apply_passes(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn apply_passes(fragment: &str) -> String {
    let text = COMMENTS_AND_PLACEHOLDERS.replace_all(fragment, "");
    let text = LEADING_WHITESPACE.replace_all(&text, "$1");
    text.replace("\n<", "<")
        .replace(">\n", ">")
        .replace('\n', " ")
}

/// Rewrites empty header/data elements as self-closing tags.
///
/// Applied to the whole document before rendering; the signed body keeps the
/// start/end pair, which is what a C14N verifier reconstructs.
pub(crate) fn collapse_empty_records(document: &str) -> String {
    EMPTY_RECORD_ELEMENT.replace_all(document, "/>").into_owned()
}
