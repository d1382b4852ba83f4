// ============================================================================
// src/mtab.rs – Live mount table (`/proc/self/mounts`) parsing
// ============================================================================

/// One mount table row; fstab's dump/pass columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount<'a> {
    pub source: &'a str,
    pub mountpoint: &'a str,
    pub filesystem: &'a str,
    pub opts: &'a str,
}

pub fn entries(table: &str) -> impl Iterator<Item = Mount<'_>> {
    table.lines().filter_map(|line| {
        let mut fields = line.split_ascii_whitespace();
        Some(Mount {
            source: fields.next()?,
            mountpoint: fields.next()?,
            filesystem: fields.next()?,
            opts: fields.next().unwrap_or_default(),
        })
    })
}

/// First entry whose source *starts with* `target`.
///
/// This is a literal string prefix test: `/dev/sdb` matches `/dev/sdb1`,
/// and `/dev/sdb1` would also match `/dev/sdb10`.
pub fn find_by_source_prefix<'a>(table: &'a str, target: &str) -> Option<Mount<'a>> {
    entries(table).find(|m| m.source.starts_with(target))
}

/// Undo the octal escaping the kernel applies to whitespace in paths.
pub fn unescape(field: &str) -> String {
    field
        .replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
/dev/nvme0n1p2 / ext4 rw,relatime 0 0
/dev/sdb1 /media/usb\\040stick vfat rw,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev 0 0
";

    #[test]
    fn parses_four_columns() {
        let all: Vec<_> = entries(TABLE).collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all[1].source, "/dev/nvme0n1p2");
        assert_eq!(all[1].mountpoint, "/");
        assert_eq!(all[1].filesystem, "ext4");
    }

    #[test]
    fn whole_disk_matches_its_mounted_partition() {
        let hit = find_by_source_prefix(TABLE, "/dev/sdb").unwrap();
        assert_eq!(hit.source, "/dev/sdb1");
        assert_eq!(unescape(hit.mountpoint), "/media/usb stick");
        assert!(find_by_source_prefix(TABLE, "/dev/sdc").is_none());
    }

    #[test]
    fn prefix_match_is_literal() {
        let table = "/dev/sdb10 /mnt/data ext4 rw 0 0\n";
        assert!(find_by_source_prefix(table, "/dev/sdb1").is_some());
    }

    #[test]
    fn short_lines_are_skipped() {
        assert_eq!(entries("garbage\n\n/dev/sda1 /boot\n").count(), 0);
    }
}
