// ============================================================================
// src/device.rs – Device name resolution, partition naming, lsblk/udevadm
// ============================================================================

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cmd::tool::Tool;
use crate::outcome::DiskError;
use crate::system::System;

pub const DEV_DIR: &str = "/dev/";

/// Partition node naming convention of a disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionNaming {
    /// `/dev/sdb` + 2 -> `/dev/sdb2`
    DirectSuffix,
    /// `/dev/nvme0n1` + 2 -> `/dev/nvme0n1p2`
    PInfix,
}

impl PartitionNaming {
    /// NVMe (`nvme<N>...`) and MMC (`mmcblk<N>`) disks take a `p` infix.
    pub fn of(disk: &Path) -> Self {
        let base = disk
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if family_match(base, "nvme") || family_match(base, "mmcblk") {
            PartitionNaming::PInfix
        } else {
            PartitionNaming::DirectSuffix
        }
    }
}

fn family_match(base: &str, stem: &str) -> bool {
    base.strip_prefix(stem)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// Prefix `/dev/` unless the input already carries it.
pub fn normalize(input: &str) -> PathBuf {
    let input = input.trim();
    if input.starts_with(DEV_DIR) {
        PathBuf::from(input)
    } else {
        PathBuf::from(format!("{DEV_DIR}{input}"))
    }
}

/// Normalize and require a block device.
pub fn resolve(sys: &dyn System, input: &str) -> Result<PathBuf, DiskError> {
    let path = normalize(input);
    if !sys.is_block_device(&path) {
        return Err(DiskError::DeviceNotFound(path));
    }
    Ok(path)
}

/// Path of partition `index` on `disk`.
pub fn partition_path(disk: &Path, index: u32) -> PathBuf {
    let naming = PartitionNaming::of(disk);
    let disk = disk.to_string_lossy();
    match naming {
        PartitionNaming::DirectSuffix => PathBuf::from(format!("{disk}{index}")),
        PartitionNaming::PInfix => PathBuf::from(format!("{disk}p{index}")),
    }
}

// ----------------------------------------------------------------------------
// lsblk listing
// ----------------------------------------------------------------------------

/// One row of `lsblk -J`.
#[derive(Debug, Deserialize, Clone)]
pub struct BlockDevice {
    pub name: String,

    #[serde(default)]
    pub size: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub tran: Option<String>,

    #[serde(default)]
    pub mountpoint: Option<String>,

    #[serde(default)]
    pub children: Option<Vec<BlockDevice>>,
}

#[derive(Debug, Deserialize)]
struct LsblkReport {
    blockdevices: Vec<BlockDevice>,
}

pub const LSBLK_ARGS: &[&str] = &["-J", "-o", "NAME,SIZE,TYPE,MODEL,TRAN,MOUNTPOINT"];

pub fn parse_lsblk(json: &str) -> Result<Vec<BlockDevice>> {
    let report: LsblkReport = serde_json::from_str(json).context("failed to parse lsblk JSON")?;
    Ok(report.blockdevices)
}

/// Flatten devices recursively (disks first, then their partitions).
pub fn flatten(devs: &[BlockDevice], list: &mut Vec<(usize, BlockDevice)>, depth: usize) {
    for d in devs {
        list.push((depth, d.clone()));
        if let Some(ch) = &d.children {
            flatten(ch, list, depth + 1);
        }
    }
}

pub fn list_block_devices(sys: &dyn System) -> Result<Vec<BlockDevice>> {
    let out = sys.run(Tool::Lsblk, LSBLK_ARGS)?;
    if !out.success() {
        return Err(anyhow!("lsblk failed: {}", out.reason()));
    }
    parse_lsblk(&out.stdout)
}

/// Render the device tree as aligned text rows.
pub fn render_table(devs: &[BlockDevice]) -> Vec<String> {
    let mut flat = Vec::new();
    flatten(devs, &mut flat, 0);
    flat.into_iter()
        .filter(|(_, d)| !d.name.starts_with("loop") && !d.name.starts_with("zram"))
        .map(|(depth, d)| {
            let name = format!("{}{}{}", "  ".repeat(depth), DEV_DIR, d.name);
            format!(
                "{:<22} {:>8}  {:<5} {:<5} {:<24} {}",
                name,
                d.size.unwrap_or_else(|| "?".to_string()),
                d.kind.unwrap_or_default(),
                d.tran.unwrap_or_default(),
                d.model.unwrap_or_default().trim(),
                d.mountpoint.unwrap_or_default()
            )
        })
        .collect()
}

// ----------------------------------------------------------------------------
// udevadm attributes
// ----------------------------------------------------------------------------

/// Keys shown to the operator before a destructive confirmation.
pub const ATTRIBUTE_KEYS: &[&str] = &[
    "ID_MODEL",
    "ID_SERIAL_SHORT",
    "ID_BUS",
    "ID_PART_TABLE_TYPE",
    "ID_FS_TYPE",
    "ID_FS_LABEL",
];

/// Parse `udevadm info --query=property` output into the interesting keys.
pub fn parse_properties(text: &str) -> Vec<(&'static str, String)> {
    ATTRIBUTE_KEYS
        .iter()
        .filter_map(|key| {
            text.lines()
                .filter_map(|l| l.split_once('='))
                .find(|(k, _)| *k == *key)
                .map(|(_, v)| (*key, v.trim().to_string()))
        })
        .collect()
}

pub fn query_attributes(sys: &dyn System, device: &Path) -> Result<Vec<(&'static str, String)>> {
    let name = format!("--name={}", device.display());
    let out = sys.run(Tool::Udevadm, &["info", "--query=property", &name])?;
    if !out.success() {
        return Err(anyhow!("udevadm info failed: {}", out.reason()));
    }
    Ok(parse_properties(&out.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::fake::FakeSystem;

    #[test]
    fn nvme_and_mmc_take_p_infix() {
        for disk in ["/dev/nvme0n1", "/dev/nvme1n2", "/dev/mmcblk0", "/dev/mmcblk12"] {
            assert_eq!(PartitionNaming::of(Path::new(disk)), PartitionNaming::PInfix);
            assert_eq!(
                partition_path(Path::new(disk), 3),
                PathBuf::from(format!("{disk}p3"))
            );
        }
    }

    #[test]
    fn other_disks_take_direct_suffix() {
        for disk in ["/dev/sda", "/dev/sdb", "/dev/vda", "/dev/hdc", "/dev/nvme", "/dev/mmcblkX"] {
            assert_eq!(
                PartitionNaming::of(Path::new(disk)),
                PartitionNaming::DirectSuffix
            );
            assert_eq!(
                partition_path(Path::new(disk), 1),
                PathBuf::from(format!("{disk}1"))
            );
        }
    }

    #[test]
    fn second_partition_scenarios() {
        assert_eq!(
            partition_path(Path::new("/dev/sdb"), 2),
            PathBuf::from("/dev/sdb2")
        );
        assert_eq!(
            partition_path(Path::new("/dev/nvme0n1"), 2),
            PathBuf::from("/dev/nvme0n1p2")
        );
    }

    #[test]
    fn normalize_prefixes_exactly_once() {
        assert_eq!(normalize("sdb"), PathBuf::from("/dev/sdb"));
        assert_eq!(normalize("/dev/sdb"), PathBuf::from("/dev/sdb"));
        assert_eq!(normalize(" nvme0n1 \n"), PathBuf::from("/dev/nvme0n1"));
        assert_eq!(normalize("/dev/mapper/x"), PathBuf::from("/dev/mapper/x"));
    }

    #[test]
    fn resolve_requires_block_device() {
        let sys = FakeSystem::with_block_devices(&["/dev/sdb"]);
        assert_eq!(resolve(&sys, "sdb").unwrap(), PathBuf::from("/dev/sdb"));
        assert_eq!(resolve(&sys, "/dev/sdb").unwrap(), PathBuf::from("/dev/sdb"));
        match resolve(&sys, "sdc") {
            Err(DiskError::DeviceNotFound(path)) => assert_eq!(path, PathBuf::from("/dev/sdc")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lsblk_tree_is_flattened_and_rendered() {
        let json = r#"{"blockdevices":[
            {"name":"sda","size":"931.5G","type":"disk","model":"Samsung SSD","tran":"sata","mountpoint":null,
             "children":[{"name":"sda1","size":"512M","type":"part","model":null,"tran":null,"mountpoint":"/boot/efi"}]},
            {"name":"loop0","size":"4K","type":"loop","model":null,"tran":null,"mountpoint":"/snap/x"}
        ]}"#;
        let devs = parse_lsblk(json).unwrap();
        let rows = render_table(&devs);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("/dev/sda "));
        assert!(rows[0].contains("Samsung SSD"));
        assert!(rows[1].starts_with("  /dev/sda1"));
        assert!(rows[1].ends_with("/boot/efi"));
    }

    #[test]
    fn udev_properties_pick_known_keys_in_order() {
        let text = "DEVNAME=/dev/sdb\nID_BUS=usb\nID_MODEL=Flash_Disk\nID_SERIAL_SHORT=0123\n";
        assert_eq!(
            parse_properties(text),
            vec![
                ("ID_MODEL", "Flash_Disk".to_string()),
                ("ID_SERIAL_SHORT", "0123".to_string()),
                ("ID_BUS", "usb".to_string()),
            ]
        );
    }

    #[test]
    fn listing_and_attributes_go_through_the_host() {
        let sys = FakeSystem::with_block_devices(&["/dev/sdb"]);
        sys.answer(
            "lsblk -J",
            r#"{"blockdevices":[{"name":"sdb","size":"29.3G","type":"disk","model":"Ultra","tran":"usb","mountpoint":null}]}"#,
        );
        sys.answer(
            "udevadm info --query=property --name=/dev/sdb",
            "ID_BUS=usb\nID_MODEL=Ultra\nID_PART_TABLE_TYPE=gpt\n",
        );

        let devs = list_block_devices(&sys).unwrap();
        assert_eq!(devs.len(), 1);
        assert_eq!(devs[0].tran.as_deref(), Some("usb"));

        assert_eq!(
            query_attributes(&sys, Path::new("/dev/sdb")).unwrap(),
            vec![
                ("ID_MODEL", "Ultra".to_string()),
                ("ID_BUS", "usb".to_string()),
                ("ID_PART_TABLE_TYPE", "gpt".to_string()),
            ]
        );
    }

    #[test]
    fn failing_lister_is_an_error() {
        let sys = FakeSystem::new();
        sys.fail("lsblk", 1);
        assert!(list_block_devices(&sys).is_err());
    }
}
