//! Content-hash dedupe guard.
//!
//! Every routed file's SHA-256 is recorded in an append-only NDJSON
//! registry (`<root>/metadata/seen_files.jsonl`). A hash seen before marks
//! the file as a duplicate of its first sighting; the configured policy
//! decides whether it is flagged, tagged, or skipped entirely.
//!
//! Appends are flushed before the guard returns, so within one sequential
//! batch the second of two identical files always sees the first's entry.
//! The registry assumes a single writer: running multiple mail-room
//! processes against the same root concurrently is not supported.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::config::DedupeConfig;
use crate::error::MailroomError;
use crate::types::SeenFileEntry;
use crate::util::relative_to;

/// Registry filename under `<root>/metadata/`.
const SEEN_FILES_NAME: &str = "seen_files.jsonl";

/// Streamed SHA-256 of a file's content, as lowercase hex.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Append-only registry of content hashes ever observed.
///
/// Lookups scan the whole file; fine for modest registries, and the
/// `get`/`append` surface lets an indexed store replace this without
/// touching callers.
pub struct SeenFileRegistry {
    path: PathBuf,
}

impl SeenFileRegistry {
    pub fn new(navi_root: &Path) -> Self {
        Self {
            path: navi_root.join("metadata").join(SEEN_FILES_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find the entry for a content hash, if one was ever recorded.
    pub fn get(&self, hash: &str) -> Result<Option<SeenFileEntry>, MailroomError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: SeenFileEntry = serde_json::from_str(line)?;
            if entry.hash == hash {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Append an entry and flush it before returning. Entries are never
    /// mutated or deleted.
    pub fn append(&self, entry: &SeenFileEntry) -> Result<(), MailroomError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        // The next lookup in this batch must see this entry.
        file.flush()?;
        Ok(())
    }
}

/// Outcome of a dedupe check for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupeCheck {
    /// Dedupe is disabled by configuration; no hashing was attempted.
    Disabled,
    /// First sighting of this content; an entry was recorded.
    FirstSeen { hash: String },
    /// Content seen before; the original sighting is attached.
    Duplicate {
        hash: String,
        entry: SeenFileEntry,
    },
}

/// Hash-and-lookup guard in front of the registry.
///
/// Errors (unreadable file, corrupt registry) are returned to the caller,
/// which degrades to routing without dedupe for that file.
pub struct DedupeGuard {
    registry: SeenFileRegistry,
    navi_root: PathBuf,
    config: DedupeConfig,
}

impl DedupeGuard {
    pub fn new(navi_root: &Path, config: DedupeConfig) -> Self {
        Self {
            registry: SeenFileRegistry::new(navi_root),
            navi_root: navi_root.to_path_buf(),
            config,
        }
    }

    pub fn registry(&self) -> &SeenFileRegistry {
        &self.registry
    }

    /// Check a file's content against the registry, recording first
    /// sightings before returning.
    pub fn check_and_record(&self, path: &Path) -> Result<DedupeCheck, MailroomError> {
        if !self.config.enabled {
            return Ok(DedupeCheck::Disabled);
        }

        let hash = hash_file(path)?;
        if let Some(entry) = self.registry.get(&hash)? {
            return Ok(DedupeCheck::Duplicate { hash, entry });
        }

        let entry = SeenFileEntry {
            hash: hash.clone(),
            path: relative_to(&self.navi_root, path),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            first_seen: Utc::now().to_rfc3339(),
        };
        self.registry.append(&entry)?;
        Ok(DedupeCheck::FirstSeen { hash })
    }
}
