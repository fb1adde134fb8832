//! Unattended mail room for a shared filesystem inbox.
//!
//! Files dropped into `<root>/inbox` are sampled for text, matched against
//! configured entity and intent signals, checked for duplicate content, and
//! delivered to office mailboxes under `<root>/offices/<office>/inbox` — or
//! escalated to the EXEC safety office when confidence is low. Every
//! decision is persisted beside the file as a `.navi.json` sidecar, and
//! every delivery leaves a `.meta.json` audit record at the destination.
//!
//! The crate is organized as a pipeline of small, separately testable
//! stages:
//!
//! - [`sample`]: bounded text sampling from arbitrary files
//! - [`detect`]: optional external entity-detector subprocess
//! - [`router`]: the pure decision engine (entity, intent, confidence gate)
//! - [`dedupe`]: content-hash guard over an append-only registry
//! - [`sidecar`]: decision persistence beside the file
//! - [`apply`]: atomic delivery with audit metadata
//! - [`batch`]: the orchestrating batch loop and its report

pub mod apply;
pub mod batch;
pub mod config;
pub mod dedupe;
pub mod detect;
pub mod error;
pub mod router;
pub mod sample;
pub mod sidecar;
pub mod types;
mod util;

pub use apply::{apply_route, Applied, ApplyRequest};
pub use batch::{BatchOptions, BatchReport, Mailroom, RoutedFile};
pub use config::{DedupePolicy, RoutingConfig};
pub use detect::{CommandDetector, EntityDetector};
pub use error::MailroomError;
pub use router::{decide_route, SAFETY_OFFICE};
pub use types::{Decision, DetectedEntity, Item};
