//! The routing decision: intent, entity, confidence gate, route token.
//!
//! `decide_route` is a pure, total function: every well-formed item yields
//! a decision, and the same inputs always yield the same decision. The only
//! signal trusted to build entity-scoped routes is an exact textual entity
//! match — upstream detector candidates are reported for audit and feed the
//! confidence gate, but never redirect a file on their own.

use crate::config::RoutingConfig;
use crate::types::{Decision, Item, RoutingMeta};

use super::{detect_function, guess_doc_type, match_entity};

/// Fixed fallback destination when routing cannot be confidently resolved.
pub const SAFETY_OFFICE: &str = "EXEC";

/// Rule id for the standard intent-driven path.
pub const RULE_ROUTING_V2: &str = "ROUTING_V2";

/// Rule id for the insurance filename override.
pub const RULE_INSURANCE_FILENAME: &str = "INSURANCE_FILENAME_HEURISTIC_V1";

/// Filename signals that identify insurance mail even without usable text.
const INSURANCE_FILENAME_KEYWORDS: [&str; 7] = [
    "insurance",
    "policy",
    "premium",
    "progressive",
    "statefarm",
    "geico",
    "allstate",
];

/// Extracted text shorter than this (trimmed) counts as empty.
const MIN_USABLE_TEXT_CHARS: usize = 10;

/// Decide where a file should go.
pub fn decide_route(item: &Item, config: &RoutingConfig) -> Decision {
    let text = item.extracted_text.as_str();

    // Intent: document type first, then keyword signals on the raw text.
    let mut intent: Option<String> = None;
    if let Some(doc_type) = guess_doc_type(&item.filename, text, config) {
        intent = config
            .doc_type_to_function
            .get(&doc_type)
            .cloned()
            .or_else(|| fallback_doc_intent(&doc_type));
    }
    if intent.is_none() {
        intent = detect_function(text, config).function;
    }

    // Top detector candidate, metadata only.
    let mut detected = item.detected_entities.clone();
    detected.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let top = detected.first();
    let top_conf = top.map(|t| t.confidence).unwrap_or(0.0);
    let detected_entity = top.map(|t| t.entity.clone());
    let confidence_pct = (top_conf * 100.0).round() as u32;

    // Textual entity: the only signal allowed to build entity-scoped routes.
    let text_entity = match_entity(text, config);

    let threshold = config.threshold();

    // Insurance filename override: when the text is unusable or the
    // detector is unsure, narrow vendor signals in the filename still route
    // straight to the CFO.
    let text_empty = text.trim().chars().count() < MIN_USABLE_TEXT_CHARS;
    let low_confidence = top.is_none() || top_conf * 100.0 < threshold;
    let filename_lower = item.filename.to_lowercase();
    if (text_empty || low_confidence)
        && INSURANCE_FILENAME_KEYWORDS
            .iter()
            .any(|k| filename_lower.contains(k))
    {
        return Decision {
            entity: detected_entity,
            entity_confidence: confidence_pct,
            function: Some("Finance".into()),
            route: "CFO".into(),
            confidence: confidence_pct,
            auto_route: true,
            reasons: vec!["heuristic_filename_insurance".into()],
            routing: RoutingMeta {
                rule_id: RULE_INSURANCE_FILENAME.into(),
                rule_reason: "filename_insurance_heuristic".into(),
                ..Default::default()
            },
        };
    }

    let resolved = resolve_destination(intent.as_deref(), top_conf, config);

    // Entity-scoped route only when both entity and intent exist; a lone
    // entity still escalates through the office token.
    let route = match (&text_entity, &intent) {
        (Some(entity), Some(intent)) => format!("{entity}.{intent}"),
        _ => resolved.destination.clone(),
    };

    Decision {
        entity: text_entity.or(detected_entity),
        entity_confidence: confidence_pct,
        function: intent,
        route,
        confidence: confidence_pct,
        auto_route: resolved.auto_routed,
        reasons: vec![resolved.reason.clone()],
        routing: RoutingMeta {
            rule_id: RULE_ROUTING_V2.into(),
            rule_reason: resolved.reason,
            ..Default::default()
        },
    }
}

struct ResolvedDestination {
    destination: String,
    auto_routed: bool,
    reason: String,
}

/// Confidence gate: at-threshold auto-routes (`>=`, not `>`); below it, or
/// with no intent at all, the file escalates to the safety office.
fn resolve_destination(
    intent: Option<&str>,
    confidence: f64,
    config: &RoutingConfig,
) -> ResolvedDestination {
    let threshold = config.threshold();
    let intent = match intent {
        Some(intent) if confidence * 100.0 >= threshold => intent,
        _ => {
            return ResolvedDestination {
                destination: SAFETY_OFFICE.into(),
                auto_routed: false,
                reason: "low_confidence_or_unknown_intent".into(),
            }
        }
    };

    let destination = config
        .intent_definitions
        .get(intent)
        .and_then(|d| d.office.clone())
        .unwrap_or_else(|| SAFETY_OFFICE.into());
    ResolvedDestination {
        destination,
        auto_routed: true,
        reason: "intent_match".into(),
    }
}

/// Built-in document-type intents used when `doc_type_to_function` has no
/// mapping for a guessed type.
fn fallback_doc_intent(doc_type: &str) -> Option<String> {
    match doc_type {
        "invoice" | "bill" | "receipt" => Some("Finance".into()),
        "contract" => Some("Legal".into()),
        _ => None,
    }
}
