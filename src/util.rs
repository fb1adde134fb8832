//! Small path helpers shared across the pipeline.

use std::path::{Path, PathBuf};

/// Append a literal suffix to a path's final component, keeping the
/// original extension: `inbox/bill.pdf` + `.meta.json` ->
/// `inbox/bill.pdf.meta.json`.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Render `path` relative to `root` for audit records. Paths outside the
/// root are rendered as-is.
pub(crate) fn relative_to(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_keeps_extension() {
        let p = with_suffix(Path::new("/a/bill.pdf"), ".navi.json");
        assert_eq!(p, Path::new("/a/bill.pdf.navi.json"));
    }

    #[test]
    fn relative_inside_root() {
        let s = relative_to(Path::new("/root/NAVI"), Path::new("/root/NAVI/inbox/x.txt"));
        assert_eq!(s, "inbox/x.txt");
    }

    #[test]
    fn relative_outside_root_is_verbatim() {
        let s = relative_to(Path::new("/root/NAVI"), Path::new("/elsewhere/x.txt"));
        assert_eq!(s, "/elsewhere/x.txt");
    }
}
