// ============================================================================
// src/config.rs – optional config loader (tool dirs, timeouts, labels, paths)
// ============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cmd::tool::DEFAULT_SEARCH_DIRS;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/flashforge.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tools {
    /// Directories searched (in order) for external tools.
    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<String>,
}

fn default_search_dirs() -> Vec<String> {
    DEFAULT_SEARCH_DIRS.iter().map(|d| d.to_string()).collect()
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_command_secs")]
    pub command_secs: u64,
    /// mkfs, ntfsresize and grub-install can take minutes on slow media.
    #[serde(default = "default_format_secs")]
    pub format_secs: u64,
}

fn default_command_secs() -> u64 {
    30
}

fn default_format_secs() -> u64 {
    600
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_secs: default_command_secs(),
            format_secs: default_format_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default = "default_efi_label")]
    pub efi_label: String,
    #[serde(default = "default_root_label")]
    pub root_label: String,
}

fn default_efi_label() -> String {
    "EFI".to_string()
}

fn default_root_label() -> String {
    "rootfs".to_string()
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            efi_label: default_efi_label(),
            root_label: default_root_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boot {
    #[serde(default = "default_efi_mount_point")]
    pub efi_mount_point: PathBuf,
}

fn default_efi_mount_point() -> PathBuf {
    PathBuf::from("/mnt/efi")
}

impl Default for Boot {
    fn default() -> Self {
        Self {
            efi_mount_point: default_efi_mount_point(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audit {
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    #[serde(default = "default_audit_path")]
    pub log_path: PathBuf,
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("/var/log/flashforge.log")
}

impl Default for Audit {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: default_audit_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub tools: Tools,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub boot: Boot,
    #[serde(default)]
    pub audit: Audit,
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl ConfigFile {
    pub fn load<P: AsRef<Path>>(p: P) -> Result<Self> {
        let s = fs::read_to_string(&p)
            .with_context(|| format!("read config: {}", p.as_ref().display()))?;
        let mut cfg: Self = if p.as_ref().extension().and_then(|e| e.to_str()) == Some("toml") {
            toml::from_str(&s).context("toml parse")?
        } else {
            serde_yaml::from_str(&s).context("yaml parse")?
        };
        cfg.path = Some(p.as_ref().to_path_buf());
        Ok(cfg)
    }

    /// Explicit path wins; otherwise the system file if present; otherwise defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashforge.toml");
        fs::write(
            &path,
            "[layout]\nroot_label = \"arch\"\n\n[timeouts]\nformat_secs = 900\n",
        )
        .unwrap();

        let cfg = ConfigFile::load(&path).unwrap();
        assert_eq!(cfg.layout.root_label, "arch");
        assert_eq!(cfg.layout.efi_label, "EFI");
        assert_eq!(cfg.timeouts.format_secs, 900);
        assert_eq!(cfg.timeouts.command_secs, 30);
        assert_eq!(cfg.boot.efi_mount_point, PathBuf::from("/mnt/efi"));
        assert_eq!(cfg.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn yaml_is_accepted_for_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashforge.yaml");
        fs::write(
            &path,
            "tools:\n  search_dirs: [\"/opt/tools/bin\"]\naudit:\n  enabled: false\n",
        )
        .unwrap();

        let cfg = ConfigFile::load(&path).unwrap();
        assert_eq!(cfg.tools.search_dirs, vec!["/opt/tools/bin".to_string()]);
        assert!(!cfg.audit.enabled);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigFile::discover(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
