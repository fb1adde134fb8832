//! Error types for the mail-room pipeline.
//!
//! Most subsystem failures are recoverable by design: configuration falls
//! back to defaults, the dedupe guard degrades to disabled, the entity
//! detector degrades to no candidates. The variants here cover failures a
//! caller must see and decide about — chiefly filesystem application, which
//! fails per file and never aborts the rest of a batch.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the mail-room core.
#[derive(Debug, Error)]
pub enum MailroomError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("source path has no filename: {0}")]
    InvalidSource(PathBuf),
}
