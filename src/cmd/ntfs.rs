// ============================================================================
// src/cmd/ntfs.rs – Menu 4: shrink/grow an NTFS filesystem, set its label
// ============================================================================

use anyhow::Result;
use std::path::Path;

use crate::cmd::tool::Tool;
use crate::cmd::Session;
use crate::device;
use crate::flash::ensure_not_mounted;
use crate::outcome::Outcome;
use crate::util::audit::audit_log;

/// `ntfsresize -s` accepts a byte count with an optional k/M/G suffix.
pub fn is_valid_size(size: &str) -> bool {
    let digits = size.trim_end_matches(['k', 'K', 'M', 'G']);
    let suffix_len = size.len() - digits.len();
    suffix_len <= 1 && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn run_ntfs_resize(s: &Session<'_>) -> Result<()> {
    s.ui.phase("NTFS // resize and relabel");
    s.show_devices();

    let Some(answer) = s.ask_optional("NTFS partition (e.g. sda3, /dev/nvme0n1p4)")? else {
        s.cancelled();
        return Ok(());
    };
    let part = device::resolve(s.sys, &answer)?;
    s.describe(&part);

    if let Err(err) = ensure_not_mounted(s.sys, &part) {
        s.ui.warn(&err.to_string());
        return Ok(());
    }

    resize(s, &part)?;
    relabel(s, &part)?;
    Ok(())
}

fn attached(s: &Session<'_>, what: &str, args: &[&str]) -> Outcome {
    match s.sys.run_attached(Tool::Ntfsresize, args) {
        Ok(0) => Outcome::Ok,
        Ok(status) => Outcome::Warn(format!("{what} exited with status {status}")),
        Err(err) => Outcome::Warn(format!("{what} failed ({err:#})")),
    }
}

fn resize(s: &Session<'_>, part: &Path) -> Result<()> {
    let part_str = part.display().to_string();
    attached(s, "ntfsresize --info", &["--info", "--force", &part_str]).escalate(s.ui)?;

    let Some(size) = s.ask_optional("New filesystem size (e.g. 60G; blank keeps the size)")?
    else {
        return Ok(());
    };
    if !is_valid_size(&size) {
        s.ui.warn(&format!("'{size}' is not a size ntfsresize understands."));
        return Ok(());
    }

    let preview = attached(
        s,
        "ntfsresize dry run",
        &["--no-action", "--force", "--size", &size, &part_str],
    );
    if !preview.is_ok() {
        preview.escalate(s.ui)?;
        s.ui.warn("Dry run failed; not resizing.");
        return Ok(());
    }
    if !s
        .op
        .confirm(&format!("Resize the filesystem on {part_str} to {size}?"))?
    {
        s.cancelled();
        return Ok(());
    }

    let done = attached(s, "ntfsresize", &["--force", "--size", &size, &part_str]);
    audit_log(
        "NTFS_RESIZE",
        &format!("partition={part_str} size={size} ok={}", done.is_ok()),
    );
    if done.is_ok() {
        s.ui.success(&format!("Filesystem on {part_str} resized to {size}."));
        s.ui.note("The partition itself is unchanged; shrink it with a partition editor.");
    }
    done.escalate(s.ui)?;
    Ok(())
}

fn relabel(s: &Session<'_>, part: &Path) -> Result<()> {
    let Some(label) = s.ask_optional("New volume label (blank keeps the current one)")? else {
        return Ok(());
    };
    let part_str = part.display().to_string();
    let outcome = Outcome::warn_on_failure(
        &format!("ntfslabel {part_str}"),
        s.sys.run(Tool::Ntfslabel, &[&part_str, &label]),
    );
    audit_log(
        "NTFS_LABEL",
        &format!("partition={part_str} label={label} ok={}", outcome.is_ok()),
    );
    if outcome.is_ok() {
        s.ui.success(&format!("{part_str} is now labelled '{label}'."));
    }
    outcome.escalate(s.ui)?;
    Ok(())
}
