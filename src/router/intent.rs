//! Intent ("business function") resolution from keyword signals.

use crate::config::RoutingConfig;

use super::normalize_text;

/// Result of keyword-based intent resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionMatch {
    pub function: Option<String>,
    pub reason: String,
}

/// Map text to a business function.
///
/// New-style `intent_definitions` are preferred; the legacy
/// `keywords_to_function` map is a backward-compatible second tier. Both
/// use case-insensitive substring tests with first-hit semantics in
/// configuration order.
pub fn detect_function(text: &str, config: &RoutingConfig) -> FunctionMatch {
    let text = normalize_text(text);

    for (intent_name, definition) in &config.intent_definitions {
        for keyword in &definition.keywords {
            if !keyword.is_empty() && text.contains(&keyword.to_lowercase()) {
                return FunctionMatch {
                    function: Some(intent_name.clone()),
                    reason: format!("Intent keyword: {keyword}"),
                };
            }
        }
    }

    for (function, keywords) in &config.keywords_to_function {
        for keyword in keywords {
            if !keyword.is_empty() && text.contains(&keyword.to_lowercase()) {
                return FunctionMatch {
                    function: Some(function.clone()),
                    reason: format!("Keyword: {keyword}"),
                };
            }
        }
    }

    FunctionMatch {
        function: None,
        reason: "No function keywords matched".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntentDefinition;

    fn config() -> RoutingConfig {
        let mut config = RoutingConfig::default();
        config.intent_definitions.insert(
            "Finance".into(),
            IntentDefinition {
                office: Some("CFO".into()),
                keywords: vec!["invoice".into(), "payment due".into()],
            },
        );
        config.intent_definitions.insert(
            "Legal".into(),
            IntentDefinition {
                office: Some("COUNSEL".into()),
                keywords: vec!["agreement".into()],
            },
        );
        config
            .keywords_to_function
            .insert("HR".into(), vec!["payroll".into()]);
        config
    }

    #[test]
    fn intent_definitions_first_hit() {
        let m = detect_function("Enclosed INVOICE for services", &config());
        assert_eq!(m.function.as_deref(), Some("Finance"));
        assert_eq!(m.reason, "Intent keyword: invoice");
    }

    #[test]
    fn configuration_order_decides_between_intents() {
        // Text matches both Finance and Legal keywords; Finance enumerates first.
        let m = detect_function("invoice attached to the agreement", &config());
        assert_eq!(m.function.as_deref(), Some("Finance"));
    }

    #[test]
    fn legacy_map_is_second_tier() {
        let m = detect_function("payroll adjustment for march", &config());
        assert_eq!(m.function.as_deref(), Some("HR"));
        assert_eq!(m.reason, "Keyword: payroll");
    }

    #[test]
    fn new_style_beats_legacy() {
        let mut config = config();
        config
            .keywords_to_function
            .insert("Shadow".into(), vec!["invoice".into()]);
        let m = detect_function("invoice enclosed", &config);
        assert_eq!(m.function.as_deref(), Some("Finance"));
    }

    #[test]
    fn no_match_reports_reason() {
        let m = detect_function("holiday schedule update", &config());
        assert!(m.function.is_none());
        assert_eq!(m.reason, "No function keywords matched");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let m = detect_function("PAYMENT   DUE immediately", &config());
        assert_eq!(m.function.as_deref(), Some("Finance"));
    }
}
