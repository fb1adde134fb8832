//! Sidecar files: companion metadata traveling with a routed document.
//!
//! A sidecar (`<file>.navi.json`) snapshots the sampled text, the detected
//! entity candidates, and the full routing decision. It always lives beside
//! the file itself, so downstream consumers can discover it without an
//! index; the applier moves it along with the file.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::MailroomError;
use crate::types::{Decision, DetectedEntity, Item};
use crate::util::with_suffix;

/// Canonical sidecar suffix.
pub const SIDECAR_SUFFIX: &str = ".navi.json";

/// Canonical audit-record suffix written by the applier.
pub const META_SUFFIX: &str = ".meta.json";

/// Sidecars keep at most this many characters of extracted text.
pub const SNIPPET_MAX_CHARS: usize = 16_000;

/// Sidecar path for a document: the document path plus [`SIDECAR_SUFFIX`].
pub fn sidecar_path(file: &Path) -> PathBuf {
    with_suffix(file, SIDECAR_SUFFIX)
}

/// Full sidecar payload: item snapshot plus the decision, flattened to one
/// JSON object.
#[derive(Debug, Clone, Serialize)]
pub struct Sidecar {
    pub generated_at: String,
    pub filename: String,
    pub extracted_text_snippet: String,
    #[serde(rename = "detectedEntities")]
    pub detected_entities: Vec<DetectedEntity>,
    #[serde(flatten)]
    pub decision: Decision,
}

impl Sidecar {
    pub fn new(item: &Item, decision: &Decision) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            filename: item.filename.clone(),
            extracted_text_snippet: item
                .extracted_text
                .chars()
                .take(SNIPPET_MAX_CHARS)
                .collect(),
            detected_entities: item.detected_entities.clone(),
            decision: decision.clone(),
        }
    }
}

/// Write a sidecar beside `file`, returning the sidecar path.
pub fn write_sidecar(file: &Path, sidecar: &Sidecar) -> Result<PathBuf, MailroomError> {
    let path = sidecar_path(file);
    let payload = serde_json::to_string_pretty(sidecar)?;
    std::fs::write(&path, payload)?;
    Ok(path)
}

/// The subset of a previously written sidecar the batch loop reuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SidecarSnapshot {
    #[serde(default)]
    pub extracted_text_snippet: Option<String>,
    #[serde(default, rename = "detectedEntities")]
    pub detected_entities: Vec<DetectedEntity>,
}

/// Read a prior sidecar tolerantly: a missing or malformed file is treated
/// as absent (the caller resamples from the raw file), and an empty snippet
/// is treated as no snippet.
pub fn read_snapshot(path: &Path) -> Option<SidecarSnapshot> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<SidecarSnapshot>(&content) {
        Ok(mut snapshot) => {
            snapshot.extracted_text_snippet =
                snapshot.extracted_text_snippet.filter(|s| !s.is_empty());
            Some(snapshot)
        }
        Err(e) => {
            log::warn!("Malformed sidecar {} ({}); resampling", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoutingMeta;

    fn decision() -> Decision {
        Decision {
            entity: Some("LHI".into()),
            entity_confidence: 92,
            function: Some("Finance".into()),
            route: "LHI.Finance".into(),
            confidence: 92,
            auto_route: true,
            reasons: vec!["intent_match".into()],
            routing: RoutingMeta {
                rule_id: "ROUTING_V2".into(),
                rule_reason: "intent_match".into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn sidecar_path_appends_suffix() {
        assert_eq!(
            sidecar_path(Path::new("/in/bill.pdf")),
            Path::new("/in/bill.pdf.navi.json")
        );
    }

    #[test]
    fn roundtrip_flattens_decision() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bill.pdf");
        let item = Item {
            filename: "bill.pdf".into(),
            extracted_text: "invoice payment due".into(),
            detected_entities: vec![DetectedEntity {
                entity: "DDM".into(),
                confidence: 0.92,
            }],
        };
        let path = write_sidecar(&file, &Sidecar::new(&item, &decision())).unwrap();
        assert_eq!(path, sidecar_path(&file));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        // Decision fields are flattened to the top level, wire names intact.
        assert_eq!(raw["route"], "LHI.Finance");
        assert_eq!(raw["autoRoute"], true);
        assert_eq!(raw["entityConfidence"], 92);
        assert_eq!(raw["detectedEntities"][0]["entity"], "DDM");
        assert_eq!(raw["extracted_text_snippet"], "invoice payment due");
    }

    #[test]
    fn snippet_is_clamped() {
        let item = Item {
            filename: "big.txt".into(),
            extracted_text: "y".repeat(SNIPPET_MAX_CHARS + 500),
            detected_entities: vec![],
        };
        let sidecar = Sidecar::new(&item, &decision());
        assert_eq!(sidecar.extracted_text_snippet.chars().count(), SNIPPET_MAX_CHARS);
    }

    #[test]
    fn snapshot_prefers_prior_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf.navi.json");
        std::fs::write(
            &path,
            r#"{"extracted_text_snippet": "prior text", "detectedEntities": [{"entity": "LHI", "confidence": 0.8}]}"#,
        )
        .unwrap();
        let snapshot = read_snapshot(&path).unwrap();
        assert_eq!(snapshot.extracted_text_snippet.as_deref(), Some("prior text"));
        assert_eq!(snapshot.detected_entities[0].entity, "LHI");
    }

    #[test]
    fn malformed_snapshot_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf.navi.json");
        std::fs::write(&path, "{ truncated").unwrap();
        assert!(read_snapshot(&path).is_none());
    }

    #[test]
    fn empty_snippet_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf.navi.json");
        std::fs::write(&path, r#"{"extracted_text_snippet": ""}"#).unwrap();
        let snapshot = read_snapshot(&path).unwrap();
        assert!(snapshot.extracted_text_snippet.is_none());
    }
}
