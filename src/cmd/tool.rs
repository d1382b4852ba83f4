// ============================================================================
// src/cmd/tool.rs – The closed set of external programs flashforge drives
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};

/// Directories searched for tools when no config overrides them.
pub const DEFAULT_SEARCH_DIRS: &[&str] = &[
    "/usr/local/sbin",
    "/usr/local/bin",
    "/usr/sbin",
    "/usr/bin",
    "/sbin",
    "/bin",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Lsblk,
    Parted,
    Gparted,
    GnomeDisks,
    Xzcat,
    SevenZip,
    Dd,
    Partprobe,
    Udevadm,
    MkfsFat,
    MkfsExt4,
    GrubInstall,
    Ntfsresize,
    Ntfslabel,
    Mount,
    Umount,
    Sync,
}

impl Tool {
    pub const ALL: [Tool; 17] = [
        Tool::Lsblk,
        Tool::Parted,
        Tool::Gparted,
        Tool::GnomeDisks,
        Tool::Xzcat,
        Tool::SevenZip,
        Tool::Dd,
        Tool::Partprobe,
        Tool::Udevadm,
        Tool::MkfsFat,
        Tool::MkfsExt4,
        Tool::GrubInstall,
        Tool::Ntfsresize,
        Tool::Ntfslabel,
        Tool::Mount,
        Tool::Umount,
        Tool::Sync,
    ];

    /// Executable file name.
    pub fn binary(self) -> &'static str {
        match self {
            Tool::Lsblk => "lsblk",
            Tool::Parted => "parted",
            Tool::Gparted => "gparted",
            Tool::GnomeDisks => "gnome-disks",
            Tool::Xzcat => "xzcat",
            Tool::SevenZip => "7z",
            Tool::Dd => "dd",
            Tool::Partprobe => "partprobe",
            Tool::Udevadm => "udevadm",
            Tool::MkfsFat => "mkfs.fat",
            Tool::MkfsExt4 => "mkfs.ext4",
            Tool::GrubInstall => "grub-install",
            Tool::Ntfsresize => "ntfsresize",
            Tool::Ntfslabel => "ntfslabel",
            Tool::Mount => "mount",
            Tool::Umount => "umount",
            Tool::Sync => "sync",
        }
    }

    pub fn from_binary(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|t| t.binary() == name)
    }

    /// First regular file named after this tool in `dirs`.
    pub fn locate<P: AsRef<Path>>(self, dirs: &[P]) -> Option<PathBuf> {
        dirs.iter()
            .map(|d| d.as_ref().join(self.binary()))
            .find(|candidate| candidate.is_file())
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}
