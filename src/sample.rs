//! Bounded text sampling from inbox files.
//!
//! Text formats are read directly; everything else gets a best-effort
//! byte-to-text coercion so the classifier always has *something* to match
//! against. The result is a bounded snippet, possibly empty, and sampling
//! itself never fails — an unreadable file degrades to its own filename.

use std::path::Path;

/// Snippet cap for native text formats.
const TEXT_SNIPPET_CHARS: usize = 4096;

/// How many leading bytes of a binary file are scanned for text.
const RAW_SCAN_BYTES: usize = 16_000;

/// Snippet cap after coercing binary content to text.
const RAW_SNIPPET_CHARS: usize = 8192;

/// Produce a bounded text snippet for classification.
pub fn sample_text(path: &Path) -> String {
    match read_snippet(path) {
        Ok(snippet) => snippet,
        Err(e) => {
            log::debug!("Sampling {} failed ({}); using filename", path.display(), e);
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        }
    }
}

fn read_snippet(path: &Path) -> std::io::Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ext == "txt" || ext == "md" {
        // Lossy decode so stray non-UTF-8 bytes don't discard the file.
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        return Ok(content.chars().take(TEXT_SNIPPET_CHARS).collect());
    }

    // Binary or unknown format: coerce the leading bytes to text.
    let bytes = std::fs::read(path)?;
    let scan = &bytes[..bytes.len().min(RAW_SCAN_BYTES)];
    let text = String::from_utf8_lossy(scan).replace('\0', " ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(collapsed.chars().take(RAW_SNIPPET_CHARS).collect())
}
