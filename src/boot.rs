// ============================================================================
// src/boot.rs – GRUB install, UEFI (removable path) and legacy BIOS
// ============================================================================

use std::path::Path;

use crate::cmd::tool::Tool;
use crate::outcome::{DiskError, Outcome};
use crate::system::System;
use crate::ui::UX;
use crate::util::audit::audit_log;

/// Arguments for the UEFI install into the fallback `EFI/BOOT` path.
pub fn uefi_args(efi_mount: &Path) -> Vec<String> {
    vec![
        "--target=x86_64-efi".to_string(),
        format!("--efi-directory={}", efi_mount.display()),
        format!("--boot-directory={}", efi_mount.join("efi").display()),
        "--removable".to_string(),
    ]
}

/// Arguments for the i386-pc install into the disk's BIOS-boot partition.
pub fn bios_args(disk: &Path, efi_mount: &Path) -> Vec<String> {
    vec![
        "--target=i386-pc".to_string(),
        format!("--boot-directory={}", efi_mount.join("efi").display()),
        "--removable".to_string(),
        "--recheck".to_string(),
        "--force".to_string(),
        disk.display().to_string(),
    ]
}

fn grub_install(sys: &dyn System, what: &str, args: &[String]) -> Outcome {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    Outcome::warn_on_failure(what, sys.run(Tool::GrubInstall, &args))
}

/// Install GRUB twice. The EFI partition must already be mounted at
/// `efi_mount`; only the directory's existence is checked. Install
/// failures are warnings: the operator inspects the output.
pub fn install_boot(
    sys: &dyn System,
    ui: &UX,
    disk: &Path,
    efi_mount: &Path,
) -> Result<(), DiskError> {
    if !sys.is_dir(efi_mount) {
        return Err(DiskError::MountPointMissing(efi_mount.to_path_buf()));
    }

    ui.phase("Installing GRUB");
    let uefi = grub_install(sys, "grub-install (x86_64-efi)", &uefi_args(efi_mount));
    if uefi.is_ok() {
        ui.success("UEFI bootloader installed to the removable media path.");
    }
    audit_log(
        "GRUB_UEFI",
        &format!("efi={} ok={}", efi_mount.display(), uefi.is_ok()),
    );
    uefi.escalate(ui)?;

    let bios = grub_install(sys, "grub-install (i386-pc)", &bios_args(disk, efi_mount));
    if bios.is_ok() {
        ui.success(&format!("Legacy BIOS bootloader installed on {}.", disk.display()));
    }
    audit_log(
        "GRUB_BIOS",
        &format!("disk={} ok={}", disk.display(), bios.is_ok()),
    );
    bios.escalate(ui)
}
