// ============================================================================
// src/flash.rs – Stream a raw or xz-compressed image onto a block device
// ============================================================================
//! Preconditions are checked before anything touches the target:
//! image type, image readability, target is a block device, target is not
//! mounted, and (for `.xz`) a decompressor exists. Transfer is always
//! `dd bs=4M status=progress conv=fsync`, followed by one more `sync`.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::cmd::tool::Tool;
use crate::mtab;
use crate::outcome::{DiskError, Outcome};
use crate::system::System;
use crate::ui::UX;
use crate::util::audit::audit_log;

pub const BLOCK_SIZE: &str = "4M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// `.img`, `.iso`, `.raw`: copied as-is.
    Raw,
    /// `.xz`: streamed through a decompressor.
    Xz,
}

impl ImageKind {
    pub fn classify(image: &Path) -> Result<Self, DiskError> {
        match image.extension().and_then(|e| e.to_str()) {
            Some("img" | "iso" | "raw") => Ok(ImageKind::Raw),
            Some("xz") => Ok(ImageKind::Xz),
            _ => Err(DiskError::UnsupportedImageType(image.to_path_buf())),
        }
    }
}

/// `xzcat`, else `7z x -so`, else nothing.
pub fn pick_decompressor(sys: &dyn System, image: &Path) -> Result<Tool, DiskError> {
    [Tool::Xzcat, Tool::SevenZip]
        .into_iter()
        .find(|t| sys.has_tool(*t))
        .ok_or_else(|| DiskError::NoDecompressorAvailable(image.to_path_buf()))
}

/// Refuse targets with any mounted source starting with the target path.
pub fn ensure_not_mounted(sys: &dyn System, target: &Path) -> Result<(), DiskError> {
    let table = sys.mount_table()?;
    let target_str = target.to_string_lossy();
    match mtab::find_by_source_prefix(&table, &target_str) {
        Some(hit) => Err(DiskError::TargetMounted {
            target: target.to_path_buf(),
            source_entry: hit.source.to_string(),
            mount_point: mtab::unescape(hit.mountpoint),
        }),
        None => Ok(()),
    }
}

/// `dd` operands for writing to `target`; `input` is `None` when reading stdin.
pub fn dd_args(input: Option<&Path>, target: &Path) -> Vec<String> {
    let mut args = Vec::with_capacity(6);
    match input {
        Some(image) => args.push(format!("if={}", image.display())),
        None => args.push("iflag=fullblock".to_string()),
    }
    args.push(format!("of={}", target.display()));
    args.push(format!("bs={BLOCK_SIZE}"));
    args.push("status=progress".to_string());
    args.push("conv=fsync".to_string());
    args
}

fn decompressor_args(tool: Tool, image: &Path) -> Vec<String> {
    let image = image.display().to_string();
    match tool {
        Tool::SevenZip => vec!["x".to_string(), "-so".to_string(), image],
        _ => vec![image],
    }
}

/// The image must be a regular file we can open for reading.
fn open_image(image: &Path) -> io::Result<File> {
    let file = File::open(image)?;
    if !file.metadata()?.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    Ok(file)
}

/// Validate everything, then write `image` onto `target`.
pub fn flash(sys: &dyn System, ui: &UX, image: &Path, target: &Path) -> Outcome {
    let kind = match ImageKind::classify(image) {
        Ok(kind) => kind,
        Err(err) => return err.into(),
    };
    if let Err(source) = open_image(image) {
        return DiskError::ImageUnreadable {
            path: image.to_path_buf(),
            source,
        }
        .into();
    }
    if !sys.is_block_device(target) {
        return DiskError::NotBlockDevice(target.to_path_buf()).into();
    }
    if let Err(err) = ensure_not_mounted(sys, target) {
        return err.into();
    }
    let decompressor = match kind {
        ImageKind::Raw => None,
        ImageKind::Xz => match pick_decompressor(sys, image) {
            Ok(tool) => Some(tool),
            Err(err) => return err.into(),
        },
    };
    if !sys.has_tool(Tool::Dd) {
        return DiskError::ToolMissing(Tool::Dd.binary()).into();
    }

    ui.info(&format!(
        "Writing {} to {} ({} blocks)...",
        image.display(),
        target.display(),
        BLOCK_SIZE
    ));
    audit_log(
        "FLASH_START",
        &format!("image={} target={}", image.display(), target.display()),
    );

    let transfer = match decompressor {
        None => {
            let args = dd_args(Some(image), target);
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            sys.run_attached(Tool::Dd, &args)
        }
        Some(tool) => {
            ui.note(&format!("Decompressing through {tool}."));
            let src = decompressor_args(tool, image);
            let src: Vec<&str> = src.iter().map(String::as_str).collect();
            let sink = dd_args(None, target);
            let sink: Vec<&str> = sink.iter().map(String::as_str).collect();
            sys.pipe(tool, &src, Tool::Dd, &sink)
        }
    };

    match transfer {
        Ok(0) => {}
        Ok(status) => {
            audit_log(
                "FLASH_FAIL",
                &format!("target={} status={}", target.display(), status),
            );
            return Outcome::Warn(format!(
                "Copy onto {} exited with status {}; the target may be partially written.",
                target.display(),
                status
            ));
        }
        Err(err) => {
            audit_log("FLASH_FAIL", &format!("target={} err={err:#}", target.display()));
            return Outcome::Warn(format!("Copy onto {} failed: {err:#}", target.display()));
        }
    }

    if let Outcome::Warn(reason) = sync_all(sys) {
        ui.warn(&reason);
    }
    audit_log("FLASH_DONE", &format!("target={}", target.display()));
    ui.success(&format!("{} written to {}.", image.display(), target.display()));
    Outcome::Ok
}

/// Flush every filesystem buffer. Failure is only a warning.
pub fn sync_all(sys: &dyn System) -> Outcome {
    Outcome::warn_on_failure("sync", sys.run(Tool::Sync, &[]))
}
