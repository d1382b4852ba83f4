// ============================================================================
// src/partition.rs – Fixed GPT layout: BIOS-boot + ESP + root, then mkfs
// ============================================================================
//! The layout is not configurable and the sequence is not transactional:
//! a failure part-way leaves the disk as far as it got. Only the ext4
//! format of the root partition stops the run. Everything else is reported
//! and skipped past.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cmd::tool::Tool;
use crate::config::Layout;
use crate::device;
use crate::operator::Operator;
use crate::outcome::{DiskError, Outcome};
use crate::system::System;
use crate::ui::UX;
use crate::util::audit::audit_log;
use crate::waiter;

/// Grace period before `udevadm settle` after a partition-table reread.
pub const SETTLE_GRACE: Duration = Duration::from_secs(1);

pub const EFI_INDEX: u32 = 2;
pub const ROOT_INDEX: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSpec {
    pub index: u32,
    pub name: &'static str,
    pub fs_type: Option<&'static str>,
    pub start: &'static str,
    pub end: &'static str,
    pub flags: &'static [&'static str],
}

pub const LAYOUT: [PartitionSpec; 3] = [
    // Holds GRUB's core image for legacy BIOS boot from a GPT disk.
    PartitionSpec {
        index: 1,
        name: "bios_grub",
        fs_type: None,
        start: "2MiB",
        end: "5MiB",
        flags: &["bios_grub"],
    },
    PartitionSpec {
        index: EFI_INDEX,
        name: "EFI",
        fs_type: Some("fat32"),
        start: "5MiB",
        end: "45MiB",
        flags: &["boot", "esp"],
    },
    PartitionSpec {
        index: ROOT_INDEX,
        name: "root",
        fs_type: Some("ext4"),
        start: "45MiB",
        end: "100%",
        flags: &[],
    },
];

/// One `parted -s <disk> ...` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartedOp {
    MkLabel {
        label: String,
    },
    MkPart {
        name: String,
        fs_type: Option<String>,
        start: String,
        end: String,
    },
    SetFlag {
        part_num: u32,
        flag: String,
    },
    Print,
}

impl PartedOp {
    pub fn args(&self, disk: &Path) -> Vec<String> {
        let mut args = vec!["-s".to_string(), disk.display().to_string()];
        match self {
            PartedOp::MkLabel { label } => {
                args.extend(["mklabel".to_string(), label.clone()]);
            }
            PartedOp::MkPart {
                name,
                fs_type,
                start,
                end,
            } => {
                args.extend(["mkpart".to_string(), name.clone()]);
                args.extend(fs_type.clone());
                args.extend([start.clone(), end.clone()]);
            }
            PartedOp::SetFlag { part_num, flag } => {
                args.extend([
                    "set".to_string(),
                    part_num.to_string(),
                    flag.clone(),
                    "on".to_string(),
                ]);
            }
            PartedOp::Print => args.push("print".to_string()),
        }
        args
    }
}

/// The `parted` operations that realise [`LAYOUT`], label first.
pub fn layout_ops() -> Vec<PartedOp> {
    let mut ops = vec![PartedOp::MkLabel {
        label: "gpt".to_string(),
    }];
    for spec in LAYOUT {
        ops.push(PartedOp::MkPart {
            name: spec.name.to_string(),
            fs_type: spec.fs_type.map(str::to_string),
            start: spec.start.to_string(),
            end: spec.end.to_string(),
        });
        for flag in spec.flags {
            ops.push(PartedOp::SetFlag {
                part_num: spec.index,
                flag: flag.to_string(),
            });
        }
    }
    ops
}

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub efi_label: String,
    pub root_label: String,
    pub node_timeout: Duration,
}

impl PlanOptions {
    pub fn from_layout(layout: &Layout) -> Self {
        Self {
            efi_label: layout.efi_label.clone(),
            root_label: layout.root_label.clone(),
            node_timeout: waiter::DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPartitions {
    pub efi: PathBuf,
    pub root: PathBuf,
}

fn run_parted(sys: &dyn System, disk: &Path, op: &PartedOp) -> anyhow::Result<crate::cmd::OutputData> {
    let args = op.args(disk);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    sys.run(Tool::Parted, &args)
}

/// Flush, reread the partition table, give udev a moment, settle.
pub fn rescan(sys: &dyn System, ui: &UX, disk: &Path) -> Result<(), DiskError> {
    let disk_str = disk.display().to_string();
    Outcome::warn_on_failure("sync", sys.run(Tool::Sync, &[])).escalate(ui)?;
    Outcome::warn_on_failure(
        &format!("partprobe {disk_str}"),
        sys.run(Tool::Partprobe, &[&disk_str]),
    )
    .escalate(ui)?;
    sys.sleep(SETTLE_GRACE);
    Outcome::warn_on_failure("udevadm settle", sys.run(Tool::Udevadm, &["settle"])).escalate(ui)
}

/// Best-effort unmount; a partition that is not mounted is the normal case.
fn release(sys: &dyn System, partition: &Path) {
    let part = partition.display().to_string();
    match sys.run(Tool::Umount, &[&part]) {
        Ok(out) if out.success() => tracing::info!(partition = %part, "unmounted"),
        Ok(out) => tracing::debug!(partition = %part, reason = %out.reason(), "umount skipped"),
        Err(err) => tracing::debug!(partition = %part, "umount skipped: {err:#}"),
    }
}

/// Hand the disk to the operator's partition editor (gparted) first.
fn manual_edit(sys: &dyn System, op: &dyn Operator, ui: &UX, disk: &Path) -> Outcome {
    let Some(editor) = sys.locate(Tool::Gparted) else {
        return Outcome::Warn(format!(
            "{} not installed; skipping the manual cleanup step.",
            Tool::Gparted
        ));
    };
    ui.info(&format!(
        "Opening {} on {}. Remove anything you want gone, apply, then close it.",
        Tool::Gparted,
        disk.display()
    ));
    let disk_str = disk.display().to_string();
    match op.launch_and_wait(&editor, &[&disk_str]) {
        Ok(()) => Outcome::Ok,
        Err(err) => Outcome::Warn(format!("{} did not run cleanly: {err}", Tool::Gparted)),
    }
}

/// Lay down the fixed GPT layout on `disk` and format partitions 2 and 3.
pub fn create_partitions(
    sys: &dyn System,
    op: &dyn Operator,
    ui: &UX,
    disk: &Path,
    opts: &PlanOptions,
) -> Result<PlannedPartitions, DiskError> {
    ui.phase(&format!("Partitioning {}", disk.display()));
    manual_edit(sys, op, ui, disk).escalate(ui)?;

    for part_op in layout_ops() {
        let what = format!("parted {}", part_op.args(disk).join(" "));
        Outcome::warn_on_failure(&what, run_parted(sys, disk, &part_op)).escalate(ui)?;
    }
    audit_log(
        "PARTITION_LAYOUT",
        &format!(
            "disk={} label=gpt bios_grub=2-5MiB esp=5-45MiB root=45MiB-100%",
            disk.display()
        ),
    );
    ui.success("GPT layout written: bios_grub, EFI, root.");

    rescan(sys, ui, disk)?;

    let efi = device::partition_path(disk, EFI_INDEX);
    let root = device::partition_path(disk, ROOT_INDEX);
    for node in [&efi, &root] {
        if !waiter::wait_for_node(sys, node, opts.node_timeout) {
            ui.warn(&format!(
                "{} did not appear within {:?}; continuing anyway.",
                node.display(),
                opts.node_timeout
            ));
        }
    }

    release(sys, &efi);
    let efi_str = efi.display().to_string();
    Outcome::warn_on_failure(
        &format!("mkfs.fat on {efi_str}"),
        sys.run(Tool::MkfsFat, &["-F", "32", "-n", &opts.efi_label, &efi_str]),
    )
    .escalate(ui)?;
    audit_log("FORMAT_FAT32", &format!("partition={efi_str}"));

    rescan(sys, ui, disk)?;

    release(sys, &root);
    let root_str = root.display().to_string();
    let ext4 = sys.run(Tool::MkfsExt4, &["-F", "-L", &opts.root_label, &root_str]);
    match ext4 {
        Ok(out) if out.success() => {}
        Ok(out) => {
            return Err(DiskError::FormatFailed {
                partition: root.clone(),
                detail: out.reason(),
            })
        }
        Err(err) => {
            return Err(DiskError::FormatFailed {
                partition: root.clone(),
                detail: format!("{err:#}"),
            })
        }
    }
    audit_log("FORMAT_EXT4", &format!("partition={root_str}"));
    ui.success(&format!("{efi_str} is FAT32, {root_str} is ext4."));

    rescan(sys, ui, disk)?;

    let print = PartedOp::Print.args(disk);
    let print: Vec<&str> = print.iter().map(String::as_str).collect();
    match sys.run_attached(Tool::Parted, &print) {
        Ok(0) => {}
        Ok(status) => ui.warn(&format!("parted print exited with status {status}")),
        Err(err) => ui.warn(&format!("parted print failed: {err:#}")),
    }

    Ok(PlannedPartitions { efi, root })
}
