//! Core data shapes shared across the pipeline.
//!
//! Field names follow the on-disk wire format of sidecars and meta files,
//! which mixes camelCase (`autoRoute`, `entityConfidence`,
//! `detectedEntities`) with snake_case (`rule_id`, `duplicate_of`), so the
//! serde renames here are deliberate and must not be "cleaned up".

use serde::{Deserialize, Serialize};

/// An entity candidate produced by the upstream detector.
///
/// These are probabilistic metadata: they are reported in sidecars and fed
/// into confidence checks, but never used to build entity-scoped routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEntity {
    pub entity: String,
    #[serde(default)]
    pub confidence: f64,
}

/// One unit of work: a file's name, its sampled text, and any pre-extracted
/// entity candidates. Constructed per file, never persisted directly.
#[derive(Debug, Clone, Default)]
pub struct Item {
    pub filename: String,
    pub extracted_text: String,
    pub detected_entities: Vec<DetectedEntity>,
}

/// The routing decision for a single file. Immutable once produced; the
/// sole input to the applier and the payload persisted in the sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Textual entity when matched, else the top detected entity, else None.
    pub entity: Option<String>,
    #[serde(rename = "entityConfidence")]
    pub entity_confidence: u32,
    /// Resolved business function ("intent"), e.g. "Finance".
    pub function: Option<String>,
    /// Route token: entity-scoped ("LHI.Finance") or an office ("CFO", "EXEC").
    pub route: String,
    /// Top detected-entity confidence as a 0-100 percentage.
    pub confidence: u32,
    #[serde(rename = "autoRoute")]
    pub auto_route: bool,
    pub reasons: Vec<String>,
    pub routing: RoutingMeta,
}

/// Audit metadata attached to every decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingMeta {
    pub rule_id: String,
    pub rule_reason: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<DuplicateRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    /// Explicit agent destination override, set by external callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routed_to: Option<String>,
    /// Snapshot/batch id used to key the duplicate quarantine folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

/// Pointer to the first sighting of duplicated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateRef {
    pub hash: String,
    pub first_seen: String,
    pub seen_path: String,
}

/// One line of the append-only seen-file registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenFileEntry {
    /// SHA-256 content hash, lowercase hex.
    pub hash: String,
    /// Path relative to the mail-room root at first sighting.
    pub path: String,
    pub filename: String,
    /// RFC 3339 timestamp of the first sighting.
    pub first_seen: String,
}

fn is_false(b: &bool) -> bool {
    !*b
}
