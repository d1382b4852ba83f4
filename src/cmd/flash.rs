// ============================================================================
// src/cmd/flash.rs – Menu 1/2: flash an image onto a disk or one partition
// ============================================================================

use anyhow::Result;
use std::path::Path;

use crate::cmd::Session;
use crate::device;
use crate::flash;
use crate::outcome::DiskError;

pub fn run_flash_disk(s: &Session<'_>) -> Result<()> {
    s.ui.phase("Flash image // whole disk");
    s.show_devices();

    let Some(image) = s.ask_optional("Image path (.img / .iso / .raw / .xz)")? else {
        s.cancelled();
        return Ok(());
    };
    let Some(disk) = s.ask_optional("Target disk (e.g. sdb or /dev/sdb)")? else {
        s.cancelled();
        return Ok(());
    };
    let disk = device::resolve(s.sys, &disk)?;

    flash_to(s, Path::new(&image), &disk)
}

pub fn run_flash_partition(s: &Session<'_>) -> Result<()> {
    s.ui.phase("Flash image // single partition");
    s.show_devices();

    let Some(image) = s.ask_optional("Image path (.img / .iso / .raw / .xz)")? else {
        s.cancelled();
        return Ok(());
    };
    let Some(disk) = s.ask_optional("Disk holding the partition (e.g. sdb, nvme0n1)")? else {
        s.cancelled();
        return Ok(());
    };
    let disk = device::resolve(s.sys, &disk)?;

    let index = s.op.ask("Partition number")?;
    let index = match index.trim().parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            s.ui.warn(&format!("'{}' is not a partition number.", index.trim()));
            return Ok(());
        }
    };
    let partition = device::partition_path(&disk, index);
    if !s.sys.is_block_device(&partition) {
        return Err(DiskError::DeviceNotFound(partition).into());
    }

    flash_to(s, Path::new(&image), &partition)
}

fn flash_to(s: &Session<'_>, image: &Path, target: &Path) -> Result<()> {
    s.describe(target);
    s.ui.warn(&format!(
        "Everything on {} will be overwritten.",
        target.display()
    ));
    if !s.op.confirm(&format!(
        "Write {} to {}?",
        image.display(),
        target.display()
    ))? {
        s.cancelled();
        return Ok(());
    }

    flash::flash(s.sys, s.ui, image, target).escalate(s.ui)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::Rig;
    use crate::system::fake::FakeSystem;
    use std::fs;

    #[test]
    fn flashes_named_partition_of_an_mmc_card() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("boot.img");
        fs::write(&img, b"boot").unwrap();
        let img_str = img.display().to_string();

        let sys = FakeSystem::with_block_devices(&["/dev/mmcblk0", "/dev/mmcblk0p1"]);
        sys.answer(
            "lsblk -J",
            r#"{"blockdevices":[{"name":"mmcblk0","size":"14.8G","type":"disk","model":null,"tran":null,"mountpoint":null,
                "children":[{"name":"mmcblk0p1","size":"256M","type":"part","model":null,"tran":null,"mountpoint":null}]}]}"#,
        );
        sys.answer(
            "udevadm info --query=property --name=/dev/mmcblk0p1",
            "ID_PART_ENTRY_NUMBER=1\nID_FS_TYPE=vfat\nID_FS_LABEL=BOOT\n",
        );
        let rig = Rig::new(sys, &[&img_str, "mmcblk0", "1", "y"]);
        run_flash_partition(&rig.session()).unwrap();

        assert!(rig
            .sys
            .calls()
            .contains(&format!("dd if={img_str} of=/dev/mmcblk0p1 bs=4M status=progress conv=fsync")));
        let calls = rig.sys.calls();
        assert_eq!(calls[0], format!("lsblk {}", device::LSBLK_ARGS.join(" ")));
        assert!(calls.contains(&"udevadm info --query=property --name=/dev/mmcblk0p1".to_string()));
    }

    #[test]
    fn unknown_disk_is_fatal() {
        let rig = Rig::new(FakeSystem::new(), &["a.img", "sdq"]);
        let err = run_flash_disk(&rig.session()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DiskError>(),
            Some(DiskError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn declining_writes_nothing() {
        let sys = FakeSystem::with_block_devices(&["/dev/sdb"]);
        let rig = Rig::new(sys, &["disk.img", "sdb", "n"]);
        run_flash_disk(&rig.session()).unwrap();
        assert!(!rig.sys.calls().iter().any(|c| c.starts_with("dd")));
    }

    #[test]
    fn bad_partition_number_returns_to_menu() {
        let sys = FakeSystem::with_block_devices(&["/dev/sdb"]);
        let rig = Rig::new(sys, &["disk.img", "sdb", "two"]);
        assert!(run_flash_partition(&rig.session()).is_ok());
    }
}
