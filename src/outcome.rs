// ============================================================================
// src/outcome.rs – Per-call-site result classification (ok / warn / fatal)
// ============================================================================

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cmd::OutputData;
use crate::ui::UX;

/// Fatal conditions. Each of these ends the whole session.
#[derive(Debug, Error)]
pub enum DiskError {
    #[error("block device not found: {0}")]
    DeviceNotFound(PathBuf),

    #[error("{0} is not a block device")]
    NotBlockDevice(PathBuf),

    #[error("image {path} is missing or unreadable: {source}")]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported image type: {0} (expected .img, .iso, .raw or .xz)")]
    UnsupportedImageType(PathBuf),

    #[error("{target} is mounted ({source_entry} on {mount_point}); unmount it first")]
    TargetMounted {
        target: PathBuf,
        source_entry: String,
        mount_point: String,
    },

    #[error("no decompressor available for {0} (install xz-utils or p7zip)")]
    NoDecompressorAvailable(PathBuf),

    #[error("formatting {partition} failed: {detail}")]
    FormatFailed { partition: PathBuf, detail: String },

    #[error("mount point {0} does not exist")]
    MountPointMissing(PathBuf),

    #[error("required tool `{0}` not found in the allowlisted directories")]
    ToolMissing(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What a single step produced, and how the caller must treat it.
#[derive(Debug)]
#[must_use]
pub enum Outcome {
    Ok,
    Warn(String),
    Fatal(DiskError),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    /// Non-zero exit or spawn failure of a best-effort step becomes `Warn`.
    pub fn warn_on_failure(what: &str, result: anyhow::Result<OutputData>) -> Outcome {
        match result {
            Ok(out) if out.success() => Outcome::Ok,
            Ok(out) => Outcome::Warn(format!("{what} failed ({})", out.reason())),
            Err(err) => Outcome::Warn(format!("{what} failed ({err:#})")),
        }
    }

    /// Surface warnings on the console and turn `Fatal` into an error.
    pub fn escalate(self, ui: &UX) -> Result<(), DiskError> {
        match self {
            Outcome::Ok => Ok(()),
            Outcome::Warn(reason) => {
                tracing::warn!(%reason, "continuing after non-fatal failure");
                ui.warn(&reason);
                Ok(())
            }
            Outcome::Fatal(err) => {
                tracing::error!(error = %err, "fatal");
                Err(err)
            }
        }
    }
}

impl From<DiskError> for Outcome {
    fn from(err: DiskError) -> Self {
        Outcome::Fatal(err)
    }
}
