// ============================================================================
// src/util/audit.rs – Minimal append-only audit trail
// ============================================================================

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static AUDIT_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Choose where events go. `None` disables the trail. First call wins.
pub fn init(path: Option<PathBuf>) {
    let _ = AUDIT_PATH.set(path);
}

/// Append a timestamped event to the configured log (0600 permissions).
/// Silent failure if log is unwritable – avoids blocking main logic.
pub fn audit_log(event: &str, detail: &str) {
    tracing::info!(event, detail, "audit");
    if let Some(Some(path)) = AUDIT_PATH.get() {
        append(path, event, detail);
    }
}

fn append(path: &Path, event: &str, detail: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)
    {
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "[{ts}] {event}: {detail}");
    }
}
