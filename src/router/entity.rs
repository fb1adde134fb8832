//! Entity matching against configured textual signals.
//!
//! Tiers run in strict priority order; the first tier that produces any
//! match decides. Name/keyword hits are ranked by the length of the matched
//! literal (a longer match is more specific), with ties going to the entity
//! enumerated first in the configuration. Address hits are less specific,
//! so the first hit wins without ranking.

use crate::config::RoutingConfig;

use super::normalize_text;

/// Find the best-matching entity id for a text, or None.
pub fn match_entity(text: &str, config: &RoutingConfig) -> Option<String> {
    let text = normalize_text(text);

    // Tier 1: name/keyword substring, longest literal wins.
    let mut best: Option<(&String, usize)> = None;
    for (id, signals) in &config.entity_signals {
        let candidates = signals
            .name
            .iter()
            .chain(signals.names.iter())
            .chain(signals.keywords.iter());
        for candidate in candidates {
            if candidate.is_empty() || !text.contains(&candidate.to_lowercase()) {
                continue;
            }
            // Strict > keeps the first-enumerated entity on ties.
            if best.map_or(true, |(_, len)| candidate.len() > len) {
                best = Some((id, candidate.len()));
            }
        }
    }
    if let Some((id, _)) = best {
        return Some(id.clone());
    }

    // Tier 2: address substring, first hit.
    for (id, signals) in &config.entity_signals {
        for address in &signals.addresses {
            if !address.is_empty() && text.contains(&address.to_lowercase()) {
                return Some(id.clone());
            }
        }
    }

    // Tier 3: exact-token alias match over names, addresses, and generic
    // signal strings.
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .collect();
    for (id, signals) in &config.entity_signals {
        let aliases = signals
            .names
            .iter()
            .chain(signals.addresses.iter())
            .chain(signals.signals.iter());
        for alias in aliases {
            if alias.is_empty() {
                continue;
            }
            let alias = alias.to_lowercase();
            if tokens.iter().any(|t| *t == alias) {
                return Some(id.clone());
            }
        }
    }

    // Tier 4: legacy nested-signal shape, same name-then-address priority.
    let mut best: Option<(&String, usize)> = None;
    for (id, entity) in &config.entities {
        for name in &entity.signals.names {
            if name.is_empty() || !text.contains(&name.to_lowercase()) {
                continue;
            }
            if best.map_or(true, |(_, len)| name.len() > len) {
                best = Some((id, name.len()));
            }
        }
    }
    if let Some((id, _)) = best {
        return Some(id.clone());
    }
    for (id, entity) in &config.entities {
        for address in &entity.signals.addresses {
            if !address.is_empty() && text.contains(&address.to_lowercase()) {
                return Some(id.clone());
            }
        }
    }

    None
}
