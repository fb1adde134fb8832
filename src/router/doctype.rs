//! Document-type inference from filename and text.

use crate::config::RoutingConfig;

/// Extensions that get the built-in keyword fallback.
const DOC_EXTENSIONS: [&str; 4] = [".pdf", ".doc", ".docx", ".txt"];

/// Built-in fallback types checked when nothing is configured, in order.
const FALLBACK_TYPES: [&str; 4] = ["invoice", "bill", "receipt", "contract"];

/// Infer a document type, or None.
///
/// Configured `doc_type_to_function` keys are checked first, in
/// configuration order, as case-insensitive substrings of the filename or
/// the text — first hit wins, no ranking. For document-like extensions a
/// small built-in vocabulary acts as a fallback.
pub fn guess_doc_type(filename: &str, text: &str, config: &RoutingConfig) -> Option<String> {
    let name = filename.to_lowercase();
    let text = text.to_lowercase();

    for doc_type in config.doc_type_to_function.keys() {
        let needle = doc_type.to_lowercase();
        if !needle.is_empty() && (name.contains(&needle) || text.contains(&needle)) {
            return Some(doc_type.clone());
        }
    }

    if DOC_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        for kind in FALLBACK_TYPES {
            if text.contains(kind) || name.contains(kind) {
                return Some(kind.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_types(types: &[(&str, &str)]) -> RoutingConfig {
        let mut config = RoutingConfig::default();
        for (doc_type, function) in types {
            config
                .doc_type_to_function
                .insert(doc_type.to_string(), function.to_string());
        }
        config
    }

    #[test]
    fn configured_type_from_filename() {
        let config = config_with_types(&[("statement", "Finance")]);
        assert_eq!(
            guess_doc_type("march-statement.pdf", "", &config),
            Some("statement".into())
        );
    }

    #[test]
    fn configured_type_from_text() {
        let config = config_with_types(&[("purchase order", "Finance")]);
        assert_eq!(
            guess_doc_type("scan001.pdf", "PURCHASE ORDER #449", &config),
            Some("purchase order".into())
        );
    }

    #[test]
    fn first_configured_key_wins() {
        let config = config_with_types(&[("invoice", "Finance"), ("contract", "Legal")]);
        assert_eq!(
            guess_doc_type("invoice-and-contract.pdf", "", &config),
            Some("invoice".into())
        );
    }

    #[test]
    fn fallback_needs_document_extension() {
        let config = RoutingConfig::default();
        assert_eq!(
            guess_doc_type("bill.pdf", "", &config),
            Some("bill".into())
        );
        assert_eq!(
            guess_doc_type("contract.docx", "", &config),
            Some("contract".into())
        );
        // Image files never hit the fallback vocabulary.
        assert_eq!(guess_doc_type("invoice.png", "", &config), None);
    }

    #[test]
    fn fallback_checks_text_too() {
        let config = RoutingConfig::default();
        assert_eq!(
            guess_doc_type("scan.pdf", "RECEIPT for your records", &config),
            Some("receipt".into())
        );
    }

    #[test]
    fn nothing_matches_is_none() {
        let config = config_with_types(&[("statement", "Finance")]);
        assert_eq!(guess_doc_type("holiday-photo.txt", "beach pics", &config), None);
    }
}
