// ============================================================================
// src/cmd/mod.rs – command subsystem root (runner + one workflow per menu entry)
// ============================================================================
pub mod base; // core process execution utilities (Cmd, OutputData)
pub mod bootdisk; // 3: partition + GRUB
pub mod disk_utility; // 5: GUI tool
pub mod flash; // 1 and 2: image flashing
pub mod ntfs; // 4: ntfsresize / ntfslabel
pub mod tool;

// Re-export common types for convenience:
pub use base::{Cmd, OutputData};

use std::path::Path;

use crate::config::ConfigFile;
use crate::device;
use crate::operator::Operator;
use crate::system::System;
use crate::ui::UX;

/// Everything a menu workflow needs.
pub struct Session<'a> {
    pub ui: &'a UX,
    pub sys: &'a dyn System,
    pub op: &'a dyn Operator,
    pub cfg: &'a ConfigFile,
}

impl Session<'_> {
    /// Print the block-device tree; a failing lister is only a warning.
    pub fn show_devices(&self) {
        match device::list_block_devices(self.sys) {
            Ok(devs) => {
                self.ui.raw(&format!(
                    "{:<22} {:>8}  {:<5} {:<5} {:<24} {}",
                    "DEVICE", "SIZE", "TYPE", "TRAN", "MODEL", "MOUNTPOINT"
                ));
                for row in device::render_table(&devs) {
                    self.ui.raw(&row);
                }
            }
            Err(err) => self.ui.warn(&format!("Cannot list block devices: {err:#}")),
        }
    }

    /// Show udev attributes of `dev` so the operator can double-check it.
    pub fn describe(&self, dev: &Path) {
        match device::query_attributes(self.sys, dev) {
            Ok(attrs) if !attrs.is_empty() => {
                let rows: Vec<(&str, String)> = attrs.into_iter().collect();
                self.ui.data_panel(&dev.display().to_string(), &rows);
            }
            Ok(_) => self.ui.note(&format!("udev reports no details for {}.", dev.display())),
            Err(err) => self.ui.warn(&format!("{err:#}")),
        }
    }

    /// Ask a question; `None` when the operator left it blank.
    pub fn ask_optional(&self, prompt: &str) -> std::io::Result<Option<String>> {
        let answer = self.op.ask(prompt)?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }

    pub fn cancelled(&self) {
        self.ui.note("Nothing changed. Back to the menu.");
    }
}
