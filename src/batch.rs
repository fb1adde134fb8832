//! The batch pipeline: sample, detect, dedupe, decide, persist, deliver.
//!
//! Files are processed strictly one at a time in sorted order. That
//! ordering is part of the dedupe contract: within a batch, the second of
//! two identical files is always the one flagged as the duplicate.

use std::path::{Path, PathBuf};

use chrono::Utc;
use indexmap::IndexMap;
use rand::RngExt;
use serde::Serialize;

use crate::apply::{apply_route, Applied, ApplyRequest};
use crate::config::{DedupePolicy, RoutingConfig};
use crate::dedupe::{DedupeCheck, DedupeGuard};
use crate::detect::EntityDetector;
use crate::error::MailroomError;
use crate::router::decide_route;
use crate::sample::sample_text;
use crate::sidecar::{read_snapshot, sidecar_path, write_sidecar, Sidecar, META_SUFFIX, SIDECAR_SUFFIX};
use crate::types::{Decision, DuplicateRef, Item};
use crate::util::relative_to;

/// Rule id stamped on skip-policy duplicates.
pub const RULE_DUPLICATE_SKIPPED: &str = "DUPLICATE_SKIPPED_V1";

/// Pseudo-route for skip-policy duplicates; the applier quarantines it.
pub const DUPLICATE_ROUTE: &str = "mail_room.duplicate_skipped";

/// Text shorter than this (trimmed) is not worth sending to the detector.
const MIN_DETECTOR_TEXT_CHARS: usize = 10;

/// Per-run options.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Decide and write sidecars, but move nothing.
    pub dry_run: bool,
    /// Process at most this many files.
    pub limit: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            limit: None,
        }
    }
}

/// One file's outcome within a batch report.
#[derive(Debug, Serialize)]
pub struct RoutedFile {
    pub src: String,
    pub route: String,
    #[serde(rename = "autoRoute")]
    pub auto_route: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<Applied>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one batch run, serialized as the tool's report output.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub status: String,
    pub batch_id: String,
    pub routed_files: Vec<RoutedFile>,
    /// Route token -> file count, duplicates included.
    pub routed_to: IndexMap<String, u32>,
    /// Non-duplicate files decided this run.
    pub files_routed: u32,
    /// Non-duplicate files that cleared the confidence gate.
    pub auto_routed: u32,
    pub timestamp: String,
}

/// The mail room: a root directory, a routing configuration, and an
/// optional entity detector.
pub struct Mailroom {
    root: PathBuf,
    config: RoutingConfig,
    detector: Option<Box<dyn EntityDetector>>,
}

impl Mailroom {
    pub fn new(root: impl Into<PathBuf>, config: RoutingConfig) -> Self {
        Self {
            root: root.into(),
            config,
            detector: None,
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn EntityDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join("inbox")
    }

    /// Run a batch over the shared inbox: plain files in sorted name order,
    /// companion metadata files excluded.
    pub fn run(&self, options: BatchOptions) -> Result<BatchReport, MailroomError> {
        let inbox = self.inbox_dir();
        let mut files: Vec<PathBuf> = Vec::new();
        if inbox.is_dir() {
            for entry in std::fs::read_dir(&inbox)? {
                let path = entry?.path();
                if !path.is_file() {
                    continue;
                }
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if name.ends_with(SIDECAR_SUFFIX) || name.ends_with(META_SUFFIX) {
                    continue;
                }
                files.push(path);
            }
            files.sort();
        } else {
            log::warn!("Inbox directory {} does not exist", inbox.display());
        }
        self.process_files(&files, options)
    }

    /// Process an explicit list of files, in the order given.
    pub fn process_files(
        &self,
        files: &[PathBuf],
        options: BatchOptions,
    ) -> Result<BatchReport, MailroomError> {
        let guard = DedupeGuard::new(&self.root, self.config.dedupe.clone());

        let mut report = BatchReport {
            status: "ok".into(),
            batch_id: format!("BATCH-{}", rand::rng().random_range(1000..10000)),
            routed_files: Vec::new(),
            routed_to: IndexMap::new(),
            files_routed: 0,
            auto_routed: 0,
            timestamp: Utc::now().to_rfc3339(),
        };
        log::info!(
            "Starting batch {} ({} files, dry_run={})",
            report.batch_id,
            files.len(),
            options.dry_run
        );

        let take = options.limit.unwrap_or(files.len());
        for path in files.iter().take(take) {
            let entry = self.process_one(path, &guard, options.dry_run);
            *report.routed_to.entry(entry.route.clone()).or_insert(0) += 1;
            if !entry.duplicate {
                report.files_routed += 1;
                if entry.auto_route {
                    report.auto_routed += 1;
                }
            }
            report.routed_files.push(entry);
        }

        log::info!(
            "Batch {} done: {} routed, {} auto",
            report.batch_id,
            report.files_routed,
            report.auto_routed
        );
        Ok(report)
    }

    fn process_one(&self, path: &Path, guard: &DedupeGuard, dry_run: bool) -> RoutedFile {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let src = relative_to(&self.root, path);

        // Prefer the snapshot from a prior run's sidecar over resampling.
        let snapshot = read_snapshot(&sidecar_path(path));
        let extracted_text = snapshot
            .as_ref()
            .and_then(|s| s.extracted_text_snippet.clone())
            .unwrap_or_else(|| sample_text(path));
        let mut detected_entities = snapshot
            .map(|s| s.detected_entities)
            .unwrap_or_default();
        if detected_entities.is_empty()
            && extracted_text.trim().chars().count() > MIN_DETECTOR_TEXT_CHARS
        {
            if let Some(detector) = &self.detector {
                detected_entities = detector.detect(&extracted_text);
            }
        }

        // A failed dedupe check degrades to routing without dedupe.
        let check = match guard.check_and_record(path) {
            Ok(check) => check,
            Err(e) => {
                log::warn!("Dedupe check failed for {} ({}); continuing", src, e);
                DedupeCheck::Disabled
            }
        };

        let item = Item {
            filename,
            extracted_text,
            detected_entities,
        };
        let mut decision = decide_route(&item, &self.config);
        let duplicate = self.annotate_duplicate(&mut decision, &check);

        let mut entry = RoutedFile {
            src,
            route: decision.route.clone(),
            auto_route: decision.auto_route,
            sidecar: None,
            applied: None,
            error: None,
            duplicate,
        };

        let sidecar = Sidecar::new(&item, &decision);
        let sidecar_file = match write_sidecar(path, &sidecar) {
            Ok(sidecar_file) => {
                entry.sidecar = Some(relative_to(&self.root, &sidecar_file));
                sidecar_file
            }
            Err(e) => {
                log::warn!("Sidecar write failed for {} ({})", entry.src, e);
                entry.error = Some(e.to_string());
                return entry;
            }
        };

        let skip_move = duplicate && self.config.dedupe.policy == DedupePolicy::Skip;
        if !dry_run && !skip_move {
            let request = ApplyRequest {
                src_path: path,
                sidecar_path: Some(&sidecar_file),
                route: &decision.route,
                routing: &decision.routing,
                config: &self.config,
                navi_root: &self.root,
            };
            match apply_route(request) {
                Ok(applied) => entry.applied = Some(applied),
                Err(e) => {
                    log::warn!("Apply failed for {} ({})", entry.src, e);
                    entry.error = Some(e.to_string());
                }
            }
        }

        entry
    }

    /// Fold a dedupe outcome into the decision. Returns whether the file is
    /// a duplicate.
    fn annotate_duplicate(&self, decision: &mut Decision, check: &DedupeCheck) -> bool {
        let (hash, entry) = match check {
            DedupeCheck::Duplicate { hash, entry } => (hash, entry),
            _ => return false,
        };

        decision.routing.duplicate = true;
        decision.routing.duplicate_of = Some(DuplicateRef {
            hash: hash.clone(),
            first_seen: entry.first_seen.clone(),
            seen_path: entry.path.clone(),
        });
        match self.config.dedupe.policy {
            DedupePolicy::Flag => {}
            DedupePolicy::Tag => {
                decision.routing.reason_code = Some("DUPLICATE_DETECTED".into());
            }
            DedupePolicy::Skip => {
                decision.route = DUPLICATE_ROUTE.into();
                decision.auto_route = false;
                decision.routing.rule_id = RULE_DUPLICATE_SKIPPED.into();
                decision.routing.rule_reason = "Duplicate detected, policy=skip".into();
            }
        }
        true
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}
