//! The routing decision engine.
//!
//! Turns raw text + filename + pre-extracted entity candidates into a
//! single [`Decision`](crate::types::Decision): entity matching, document
//! type and intent resolution, the confidence gate, and route-token to
//! filesystem-path resolution. Everything here is pure — no I/O, no clock,
//! no globals — so the same inputs always produce the same decision.

pub mod decide;
pub mod doctype;
pub mod entity;
pub mod intent;
pub mod paths;

pub use decide::{decide_route, SAFETY_OFFICE};
pub use doctype::guess_doc_type;
pub use entity::match_entity;
pub use intent::{detect_function, FunctionMatch};
pub use paths::{paths_for_route, RoutePaths};

/// Canonical text normalization applied before any matching: whitespace
/// runs collapsed to single spaces, trimmed, lowercased.
pub(crate) fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
