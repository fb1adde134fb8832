//! Routing configuration.
//!
//! The configuration is an immutable value constructed once by the caller
//! and passed into every resolver and the applier — nothing in the core
//! reads it from a global. Every field is optional on disk and has an
//! explicit default here, so a missing or malformed config file degrades to
//! built-in behavior (safety office, default threshold) instead of failing.
//!
//! Maps that the decision rules enumerate (`intent_definitions`,
//! `doc_type_to_function`, `entity_signals`) preserve configuration order;
//! "first configured wins" is part of the routing contract.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::MailroomError;

/// Default auto-route threshold (percent) when the config does not set one.
pub const DEFAULT_AUTO_ROUTE_THRESHOLD: f64 = 70.0;

/// Top-level routing configuration, read-only for the duration of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Intent name -> destination office + trigger keywords.
    pub intent_definitions: IndexMap<String, IntentDefinition>,
    /// Legacy function -> keyword list, consulted after `intent_definitions`.
    pub keywords_to_function: IndexMap<String, Vec<String>>,
    /// Document type (e.g. "invoice") -> business function.
    pub doc_type_to_function: IndexMap<String, String>,
    /// Entity id -> textual signals used by the entity matcher.
    pub entity_signals: IndexMap<String, EntitySignals>,
    /// Legacy nested-signal shape, checked when `entity_signals` yields nothing.
    pub entities: IndexMap<String, LegacyEntity>,
    pub confidence: ConfidenceConfig,
    /// Route token -> archival storage path relative to the root.
    pub route_paths: IndexMap<String, String>,
    /// Function or office alias -> office directory name.
    pub function_to_office: IndexMap<String, String>,
    pub dedupe: DedupeConfig,
    /// Mail-room root directory; callers may use this to resolve the root.
    pub navi_root: Option<PathBuf>,
    /// When true, batches apply moves by default instead of dry-running.
    pub enable_mailroom_routing: bool,
    /// External entity-detector command (program + args), fed text on stdin.
    pub detector_command: Vec<String>,
}

/// One intent: where it routes and which keywords imply it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentDefinition {
    pub office: Option<String>,
    pub keywords: Vec<String>,
}

/// Textual signals for one entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitySignals {
    pub name: Option<String>,
    pub names: Vec<String>,
    pub addresses: Vec<String>,
    pub keywords: Vec<String>,
    /// Generic alias strings, only consulted by the tokenized match tier.
    pub signals: Vec<String>,
}

/// Legacy `entities[id].signals.{names,addresses}` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyEntity {
    pub signals: LegacySignals,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacySignals {
    pub names: Vec<String>,
    pub addresses: Vec<String>,
}

/// Confidence gate for automatic delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Minimum percentage confidence for auto-routing; at-threshold routes.
    pub auto_route_threshold: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            auto_route_threshold: DEFAULT_AUTO_ROUTE_THRESHOLD,
        }
    }
}

/// Dedupe guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    pub enabled: bool,
    pub policy: DedupePolicy,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: DedupePolicy::Flag,
        }
    }
}

/// What to do with a file whose content has been seen before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupePolicy {
    /// Route normally, annotated as a duplicate.
    #[default]
    Flag,
    /// Like `Flag`, plus a `DUPLICATE_DETECTED` reason code.
    Tag,
    /// Re-route to the duplicate pseudo-route and never apply.
    Skip,
}

impl RoutingConfig {
    /// Load a routing config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, MailroomError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a routing config, falling back to defaults on any failure.
    ///
    /// A missing or malformed config is never fatal: every resolver works
    /// against the built-in defaults and the safety office.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Routing config unavailable at {} ({}); using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// The configured auto-route threshold (percent).
    pub fn threshold(&self) -> f64 {
        self.confidence.auto_route_threshold
    }
}
