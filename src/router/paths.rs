//! Route token to filesystem path resolution.

use std::path::PathBuf;

use crate::config::RoutingConfig;

/// Filesystem destinations resolved for a route token. Any field may be
/// absent when the configuration has no mapping for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutePaths {
    pub route: String,
    /// Archival storage directory under the root, when configured.
    pub storage: Option<PathBuf>,
    /// The configured storage path as written, relative to the root.
    pub storage_rel: Option<String>,
    /// Office directory name the route delivers to.
    pub office_name: Option<String>,
    /// Absolute inbox directory of that office.
    pub office_inbox: Option<PathBuf>,
}

/// Resolve the filesystem destinations for a route token.
///
/// Dotted tokens ("LHI.Finance") deliver by their function part; plain
/// tokens are looked up directly as an office alias. Resolution is lookup
/// only, nothing is created on disk.
pub fn paths_for_route(
    route: &str,
    config: &RoutingConfig,
    navi_root: &std::path::Path,
) -> RoutePaths {
    let storage_rel = config.route_paths.get(route).cloned();
    let storage = storage_rel.as_ref().map(|rel| navi_root.join(rel));

    // The function name is the second dot-separated segment; anything
    // after a second dot is ignored.
    let alias = match route.split('.').nth(1) {
        Some(function) => function,
        None => route,
    };
    let office_name = config.function_to_office.get(alias).cloned();
    let office_inbox = office_name
        .as_ref()
        .map(|name| navi_root.join("offices").join(name).join("inbox"));

    RoutePaths {
        route: route.to_string(),
        storage,
        storage_rel,
        office_name,
        office_inbox,
    }
}
