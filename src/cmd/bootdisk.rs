// ============================================================================
// src/cmd/bootdisk.rs – Menu 3: GPT layout, ESP mount, GRUB (UEFI + BIOS)
// ============================================================================

use anyhow::{Context, Result};

use crate::boot;
use crate::cmd::tool::Tool;
use crate::cmd::Session;
use crate::device;
use crate::operator::typed_yes;
use crate::outcome::Outcome;
use crate::partition::{self, PlanOptions};
use crate::util::audit::audit_log;

pub fn run_build_boot_disk(s: &Session<'_>) -> Result<()> {
    s.ui.phase("Boot disk // GPT + GRUB");
    s.show_devices();

    let Some(answer) = s.ask_optional("Disk to partition (e.g. sdb, nvme0n1)")? else {
        s.cancelled();
        return Ok(());
    };
    let disk = device::resolve(s.sys, &answer)?;
    s.describe(&disk);

    s.ui.data_panel(
        "Planned layout",
        &partition::LAYOUT
            .iter()
            .map(|p| {
                (
                    p.name,
                    format!(
                        "{}  {} → {}  {}",
                        device::partition_path(&disk, p.index).display(),
                        p.start,
                        p.end,
                        p.fs_type.unwrap_or("(raw)")
                    ),
                )
            })
            .collect::<Vec<_>>(),
    );
    s.ui.warn(&format!(
        "ALL data on {} will be destroyed.",
        disk.display()
    ));
    if !s.op.confirm(&format!("Partition {}?", disk.display()))? {
        s.cancelled();
        return Ok(());
    }
    if !typed_yes(s.op, &format!("Last chance: wipe {}?", disk.display()))? {
        s.cancelled();
        return Ok(());
    }

    audit_log("BOOTDISK_START", &format!("disk={}", disk.display()));
    let planned = partition::create_partitions(
        s.sys,
        s.op,
        s.ui,
        &disk,
        &PlanOptions::from_layout(&s.cfg.layout),
    )?;

    let mount_point = &s.cfg.boot.efi_mount_point;
    s.sys
        .create_dir_all(mount_point)
        .with_context(|| format!("create {}", mount_point.display()))?;
    let efi = planned.efi.display().to_string();
    let mp = mount_point.display().to_string();
    let mounted = Outcome::warn_on_failure(
        &format!("mount {efi} {mp}"),
        s.sys.run(Tool::Mount, &[&efi, &mp]),
    );
    if !mounted.is_ok() {
        mounted.escalate(s.ui)?;
        s.ui.warn("EFI partition is not mounted; skipping GRUB installation.");
        return Ok(());
    }

    boot::install_boot(s.sys, s.ui, &disk, mount_point)?;

    audit_log("BOOTDISK_DONE", &format!("disk={} efi={}", disk.display(), efi));
    s.ui.success(&format!("{} is ready.", disk.display()));
    s.ui.note(&format!("{efi} is still mounted at {mp}."));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::Rig;
    use crate::outcome::DiskError;
    use crate::system::fake::FakeSystem;

    fn rig(answers: &[&str]) -> Rig {
        let sys = FakeSystem::with_block_devices(&["/dev/sdb", "/dev/sdb2", "/dev/sdb3"]);
        Rig::new(sys, answers)
    }

    #[test]
    fn full_run_partitions_mounts_and_installs() {
        let rig = rig(&["sdb", "y", "y"]);
        run_build_boot_disk(&rig.session()).unwrap();

        let calls = rig.sys.calls();
        let mount = calls
            .iter()
            .position(|c| c == "mount /dev/sdb2 /mnt/efi")
            .expect("EFI partition mounted");
        let ext4 = calls
            .iter()
            .position(|c| c.starts_with("mkfs.ext4"))
            .unwrap();
        assert!(ext4 < mount);
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("grub-install")).count(),
            2
        );
        assert!(calls.iter().all(|c| !c.starts_with("umount /mnt/efi")));
    }

    #[test]
    fn only_a_literal_y_passes_the_last_gate() {
        let rig = rig(&["sdb", "y", "yes"]);
        run_build_boot_disk(&rig.session()).unwrap();
        assert!(!rig.sys.calls().iter().any(|c| c.starts_with("parted")));
    }

    #[test]
    fn declining_first_confirmation_touches_nothing() {
        let rig = rig(&["/dev/sdb", "n"]);
        run_build_boot_disk(&rig.session()).unwrap();
        assert!(!rig.sys.calls().iter().any(|c| c.starts_with("parted")));
    }

    #[test]
    fn failed_mount_skips_grub() {
        let rig = rig(&["sdb", "y", "y"]);
        rig.sys.fail("mount ", 32);
        run_build_boot_disk(&rig.session()).unwrap();
        assert!(!rig.sys.calls().iter().any(|c| c.starts_with("grub-install")));
    }

    #[test]
    fn ext4_failure_ends_the_session() {
        let rig = rig(&["sdb", "y", "y"]);
        rig.sys.fail("mkfs.ext4", 1);
        let err = run_build_boot_disk(&rig.session()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DiskError>(),
            Some(DiskError::FormatFailed { .. })
        ));
    }
}
