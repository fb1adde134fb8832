//! The applier: atomically relocate a routed file with its sidecar and
//! write the audit meta record.
//!
//! Moves are rename-only. If the destination is on another filesystem the
//! rename fails and the file stays in the inbox untouched; the mail-room
//! tree is expected to live on one volume.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use crate::config::RoutingConfig;
use crate::error::MailroomError;
use crate::router::paths_for_route;
use crate::sidecar::{META_SUFFIX, SIDECAR_SUFFIX};
use crate::types::RoutingMeta;
use crate::util::{relative_to, with_suffix};

/// Everything the applier needs to deliver one file.
#[derive(Debug, Clone, Copy)]
pub struct ApplyRequest<'a> {
    pub src_path: &'a Path,
    /// Existing sidecar to move along with the file, when present.
    pub sidecar_path: Option<&'a Path>,
    pub route: &'a str,
    pub routing: &'a RoutingMeta,
    pub config: &'a RoutingConfig,
    pub navi_root: &'a Path,
}

/// Result of a delivery: where the file and its companions ended up.
#[derive(Debug, Clone, Serialize)]
pub struct Applied {
    pub applied: bool,
    pub dest_path: PathBuf,
    pub meta_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<PathBuf>,
}

/// Audit record written beside the delivered file.
#[derive(Debug, Serialize)]
struct MetaRecord<'a> {
    filename: String,
    routed_from: String,
    routed_to: String,
    applied_at: String,
    route: &'a str,
    #[serde(rename = "routingMeta")]
    routing_meta: &'a RoutingMeta,
}

fn agent_route_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(agent\d+)").expect("agent route regex should compile"))
}

/// Resolve the destination directory for a route, in precedence order:
/// explicit agent override, agent-shaped route token, duplicate quarantine,
/// entity-scoped office, plain office, safety office.
fn destination_dir(route: &str, routing: &RoutingMeta, config: &RoutingConfig, root: &Path) -> PathBuf {
    if let Some(agent) = &routing.routed_to {
        return root.join("agents").join(agent).join("inbox");
    }
    if let Some(caps) = agent_route_re().captures(route) {
        return root.join("agents").join(&caps[1]).join("inbox");
    }
    if route.contains("duplicate") {
        let snapshot = routing.snapshot_id.as_deref().unwrap_or("unknown");
        return root.join("HOLDING").join("duplicates").join(snapshot);
    }
    if route.contains('.') {
        if let Some(inbox) = paths_for_route(route, config, root).office_inbox {
            return inbox;
        }
    } else if !route.is_empty() {
        return root.join("offices").join(route).join("inbox");
    }
    root.join("offices").join("EXEC").join("inbox")
}

/// Deliver one file: move it (and its sidecar) to the resolved destination
/// and write the `.meta.json` audit record.
///
/// The meta record is written to a temp name and renamed into place, so a
/// half-written record is never observable under its final name.
pub fn apply_route(req: ApplyRequest<'_>) -> Result<Applied, MailroomError> {
    let dest_dir = destination_dir(req.route, req.routing, req.config, req.navi_root);
    std::fs::create_dir_all(&dest_dir)?;

    let filename = req
        .src_path
        .file_name()
        .ok_or_else(|| MailroomError::InvalidSource(req.src_path.to_path_buf()))?;
    let dest_path = dest_dir.join(filename);

    std::fs::rename(req.src_path, &dest_path)?;
    log::info!(
        "Routed {} -> {}",
        req.src_path.display(),
        dest_path.display()
    );

    let sidecar = match req.sidecar_path {
        Some(path) if path.exists() => {
            let dest_sidecar = with_suffix(&dest_path, SIDECAR_SUFFIX);
            std::fs::rename(path, &dest_sidecar)?;
            Some(dest_sidecar)
        }
        _ => None,
    };

    let record = MetaRecord {
        filename: filename.to_string_lossy().into_owned(),
        routed_from: relative_to(
            req.navi_root,
            req.src_path.parent().unwrap_or(Path::new("")),
        ),
        routed_to: relative_to(req.navi_root, &dest_dir),
        applied_at: Utc::now().to_rfc3339(),
        route: req.route,
        routing_meta: req.routing,
    };
    let meta_path = with_suffix(&dest_path, META_SUFFIX);
    let tmp_path = with_suffix(&meta_path, ".tmp");
    std::fs::write(&tmp_path, serde_json::to_string_pretty(&record)?)?;
    std::fs::rename(&tmp_path, &meta_path)?;

    Ok(Applied {
        applied: true,
        dest_path,
        meta_path,
        sidecar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sidecar::sidecar_path;

    fn request<'a>(
        src: &'a Path,
        sidecar: Option<&'a Path>,
        route: &'a str,
        routing: &'a RoutingMeta,
        config: &'a RoutingConfig,
        root: &'a Path,
    ) -> ApplyRequest<'a> {
        ApplyRequest {
            src_path: src,
            sidecar_path: sidecar,
            route,
            routing,
            config,
            navi_root: root,
        }
    }

    #[test]
    fn moves_file_and_writes_meta() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let inbox = root.join("inbox");
        std::fs::create_dir_all(&inbox).unwrap();
        let src = inbox.join("bill.pdf");
        std::fs::write(&src, "content").unwrap();

        let routing = RoutingMeta {
            rule_id: "ROUTING_V2".into(),
            rule_reason: "intent_match".into(),
            ..Default::default()
        };
        let config = RoutingConfig::default();
        let applied =
            apply_route(request(&src, None, "CFO", &routing, &config, root)).unwrap();

        assert!(!src.exists());
        let dest = root.join("offices/CFO/inbox/bill.pdf");
        assert_eq!(applied.dest_path, dest);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "content");

        let meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&applied.meta_path).unwrap())
                .unwrap();
        assert_eq!(meta["filename"], "bill.pdf");
        assert_eq!(meta["route"], "CFO");
        assert_eq!(meta["routed_from"], "inbox");
        assert_eq!(meta["routed_to"], "offices/CFO/inbox");
        assert_eq!(meta["routingMeta"]["rule_id"], "ROUTING_V2");
    }

    #[test]
    fn sidecar_travels_with_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let inbox = root.join("inbox");
        std::fs::create_dir_all(&inbox).unwrap();
        let src = inbox.join("doc.pdf");
        std::fs::write(&src, "x").unwrap();
        let side = sidecar_path(&src);
        std::fs::write(&side, "{}").unwrap();

        let routing = RoutingMeta::default();
        let config = RoutingConfig::default();
        let applied =
            apply_route(request(&src, Some(&side), "EXEC", &routing, &config, root)).unwrap();

        assert!(!side.exists());
        let moved = applied.sidecar.unwrap();
        assert_eq!(
            moved,
            root.join("offices/EXEC/inbox/doc.pdf.navi.json")
        );
        assert!(moved.exists());
    }

    #[test]
    fn dotted_route_uses_function_office() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let inbox = root.join("inbox");
        std::fs::create_dir_all(&inbox).unwrap();
        let src = inbox.join("inv.pdf");
        std::fs::write(&src, "x").unwrap();

        let mut config = RoutingConfig::default();
        config
            .function_to_office
            .insert("Finance".into(), "CFO".into());
        let routing = RoutingMeta::default();
        let applied =
            apply_route(request(&src, None, "LHI.Finance", &routing, &config, root)).unwrap();
        assert_eq!(applied.dest_path, root.join("offices/CFO/inbox/inv.pdf"));
    }

    #[test]
    fn unmapped_dotted_route_falls_back_to_safety_office() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("inbox")).unwrap();
        let src = root.join("inbox/odd.pdf");
        std::fs::write(&src, "x").unwrap();

        let config = RoutingConfig::default();
        let routing = RoutingMeta::default();
        let applied =
            apply_route(request(&src, None, "GHOST.Unknown", &routing, &config, root)).unwrap();
        assert_eq!(applied.dest_path, root.join("offices/EXEC/inbox/odd.pdf"));
    }

    #[test]
    fn explicit_agent_override_beats_route() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("inbox")).unwrap();
        let src = root.join("inbox/task.txt");
        std::fs::write(&src, "x").unwrap();

        let routing = RoutingMeta {
            routed_to: Some("agent7".into()),
            ..Default::default()
        };
        let config = RoutingConfig::default();
        let applied =
            apply_route(request(&src, None, "CFO", &routing, &config, root)).unwrap();
        assert_eq!(applied.dest_path, root.join("agents/agent7/inbox/task.txt"));
    }

    #[test]
    fn agent_shaped_route_goes_to_agent_inbox() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("inbox")).unwrap();
        let src = root.join("inbox/task.txt");
        std::fs::write(&src, "x").unwrap();

        let routing = RoutingMeta::default();
        let config = RoutingConfig::default();
        let applied =
            apply_route(request(&src, None, "agent12.tasks", &routing, &config, root)).unwrap();
        assert_eq!(
            applied.dest_path,
            root.join("agents/agent12/inbox/task.txt")
        );
    }

    #[test]
    fn duplicate_route_quarantines_by_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("inbox")).unwrap();
        let src = root.join("inbox/copy.pdf");
        std::fs::write(&src, "x").unwrap();

        let routing = RoutingMeta {
            snapshot_id: Some("SNAP-42".into()),
            ..Default::default()
        };
        let config = RoutingConfig::default();
        let applied = apply_route(request(
            &src,
            None,
            "mail_room.duplicate_skipped",
            &routing,
            &config,
            root,
        ))
        .unwrap();
        assert_eq!(
            applied.dest_path,
            root.join("HOLDING/duplicates/SNAP-42/copy.pdf")
        );

        // Without a snapshot id the quarantine bucket is "unknown".
        let src2 = root.join("inbox/copy2.pdf");
        std::fs::write(&src2, "y").unwrap();
        let applied2 = apply_route(request(
            &src2,
            None,
            "mail_room.duplicate_skipped",
            &RoutingMeta::default(),
            &config,
            root,
        ))
        .unwrap();
        assert_eq!(
            applied2.dest_path,
            root.join("HOLDING/duplicates/unknown/copy2.pdf")
        );
    }

    #[test]
    fn missing_source_is_an_error_and_nothing_moves() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let src = root.join("inbox/ghost.pdf");

        let routing = RoutingMeta::default();
        let config = RoutingConfig::default();
        assert!(apply_route(request(&src, None, "CFO", &routing, &config, root)).is_err());
        assert!(!root.join("offices/CFO/inbox/ghost.pdf").exists());
    }

    #[test]
    fn no_stray_tmp_meta_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("inbox")).unwrap();
        let src = root.join("inbox/a.pdf");
        std::fs::write(&src, "x").unwrap();

        let routing = RoutingMeta::default();
        let config = RoutingConfig::default();
        let applied =
            apply_route(request(&src, None, "EXEC", &routing, &config, root)).unwrap();
        assert!(applied.meta_path.exists());
        assert!(!with_suffix(&applied.meta_path, ".tmp").exists());
    }
}
