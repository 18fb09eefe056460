//! Label normalization
//!
//! Schema labels are free text ("Amount Due", "Vendor & Co"); output element
//! names must be well-formed XML names. [`normalize_label`] maps any label to
//! a safe name, totally and idempotently, and is applied at every level of
//! the output tree. A label that normalizes to the empty string gets its `_`
//! fallback at the naming site in the transform engine.

use regex::Regex;
use std::sync::OnceLock;

static NAME_SAFE_REGEX: OnceLock<Regex> = OnceLock::new();

fn name_safe_regex() -> &'static Regex {
    NAME_SAFE_REGEX
        .get_or_init(|| Regex::new(r"[^0-9A-Za-z_.-]").expect("Valid regex pattern"))
}

/// Turn a schema label into a well-formed XML element name.
///
/// Words are joined with their whitespace removed and the first ASCII letter
/// of each word uppercased; the rest of each word is kept as-is, so an
/// already-normalized name passes through unchanged. Characters that may not
/// appear in an XML name are replaced with `_`, and a leading `_` is added
/// when the first character may not open a name. The empty label normalizes
/// to the empty string.
pub fn normalize_label(label: &str) -> String {
    let mut joined = String::with_capacity(label.len());
    for word in label.split_whitespace() {
        let mut capitalized = false;
        for ch in word.chars() {
            if !capitalized && ch.is_ascii_alphabetic() {
                joined.push(ch.to_ascii_uppercase());
                capitalized = true;
            } else {
                joined.push(ch);
            }
        }
    }

    let mut name = name_safe_regex().replace_all(&joined, "_").into_owned();

    if let Some(first) = name.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            name.insert(0, '_');
        }
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_spaces_removed_and_words_capitalized() {
        assert_eq!(normalize_label("Amount Due"), "AmountDue");
        assert_eq!(normalize_label("Invoice   Number"), "InvoiceNumber");
        assert_eq!(normalize_label("line item total"), "LineItemTotal");
    }

    #[test]
    fn test_interior_capitals_preserved() {
        assert_eq!(normalize_label("ABC corp"), "ABCCorp");
        assert_eq!(normalize_label("amountDue"), "AmountDue");
    }

    #[test]
    fn test_empty_and_whitespace_labels() {
        assert_eq!(normalize_label(""), "");
        assert_eq!(normalize_label("   "), "");
    }

    #[test]
    fn test_special_characters_replaced() {
        assert_eq!(normalize_label("Vendor & Co"), "Vendor_Co");
        assert_eq!(normalize_label("it's here"), "It_sHere");
        assert_eq!(normalize_label("&"), "_");
    }

    #[test]
    fn test_leading_character_guarded() {
        assert_eq!(normalize_label("2023 totals"), "_2023Totals");
        assert_eq!(normalize_label("-foo"), "_-Foo");
    }

    #[test]
    fn test_already_normalized_unchanged() {
        assert_eq!(normalize_label("AmountDue"), "AmountDue");
        assert_eq!(normalize_label("_2023Totals"), "_2023Totals");
        assert_eq!(normalize_label("Foo.bar-baz_9"), "Foo.bar-baz_9");
    }

    proptest! {
        #[test]
        fn normalize_is_total_and_idempotent(label in ".*") {
            let once = normalize_label(&label);
            prop_assert_eq!(normalize_label(&once), once);
        }

        #[test]
        fn normalized_names_are_tag_safe(label in ".*") {
            let name = normalize_label(&label);
            prop_assert!(name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'));
            if let Some(first) = name.chars().next() {
                prop_assert!(first.is_ascii_alphabetic() || first == '_');
            }
        }
    }
}
