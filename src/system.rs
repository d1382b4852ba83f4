// ============================================================================
// src/system.rs – Host seam: block-device checks, mount table, tool execution
// ============================================================================
//! Everything that touches the live machine goes through [`System`], so the
//! workflows can be driven against a recording double in tests.

use anyhow::Result;
use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::cmd::tool::Tool;
use crate::cmd::{Cmd, OutputData};
use crate::config::ConfigFile;
use crate::outcome::DiskError;

pub const LIVE_MOUNT_TABLE: &str = "/proc/self/mounts";

pub trait System {
    /// True when `path` currently exists as a block-special file.
    fn is_block_device(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Raw text of the live mount table.
    fn mount_table(&self) -> io::Result<String>;

    /// Allowlisted path of `tool`, if installed.
    fn locate(&self, tool: Tool) -> Option<PathBuf>;

    fn has_tool(&self, tool: Tool) -> bool {
        self.locate(tool).is_some()
    }

    /// Run with captured output and a bounded runtime.
    fn run(&self, tool: Tool, args: &[&str]) -> Result<OutputData>;

    /// Run with the terminal attached; returns the exit status.
    fn run_attached(&self, tool: Tool, args: &[&str]) -> Result<i32>;

    /// `source | sink`, sink attached to the terminal.
    fn pipe(
        &self,
        source: Tool,
        source_args: &[&str],
        sink: Tool,
        sink_args: &[&str],
    ) -> Result<i32>;

    fn sleep(&self, duration: Duration);
}

/// The real machine.
#[derive(Debug, Clone)]
pub struct LinuxSystem {
    search_dirs: Vec<PathBuf>,
    command_timeout: Duration,
    format_timeout: Duration,
    mount_table_path: PathBuf,
}

impl LinuxSystem {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            search_dirs: cfg.tools.search_dirs.iter().map(PathBuf::from).collect(),
            command_timeout: Duration::from_secs(cfg.timeouts.command_secs.max(1)),
            format_timeout: Duration::from_secs(cfg.timeouts.format_secs.max(1)),
            mount_table_path: PathBuf::from(LIVE_MOUNT_TABLE),
        }
    }

    fn cmd(&self, tool: Tool) -> Result<Cmd> {
        let path = tool
            .locate(&self.search_dirs)
            .ok_or(DiskError::ToolMissing(tool.binary()))?;
        let timeout = match tool {
            Tool::MkfsFat | Tool::MkfsExt4 | Tool::Ntfsresize | Tool::GrubInstall => {
                self.format_timeout
            }
            _ => self.command_timeout,
        };
        Cmd::new_allowlisted(path, timeout, &self.search_dirs)
    }
}

impl System for LinuxSystem {
    fn is_block_device(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|meta| meta.file_type().is_block_device())
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn mount_table(&self) -> io::Result<String> {
        fs::read_to_string(&self.mount_table_path)
    }

    fn locate(&self, tool: Tool) -> Option<PathBuf> {
        tool.locate(&self.search_dirs)
    }

    fn run(&self, tool: Tool, args: &[&str]) -> Result<OutputData> {
        let out = self.cmd(tool)?.run(args, None)?;
        tracing::debug!(%tool, status = out.status, "finished");
        Ok(out)
    }

    fn run_attached(&self, tool: Tool, args: &[&str]) -> Result<i32> {
        let status = self.cmd(tool)?.run_attached(args)?;
        tracing::debug!(%tool, status, "finished (attached)");
        Ok(status)
    }

    fn pipe(
        &self,
        source: Tool,
        source_args: &[&str],
        sink: Tool,
        sink_args: &[&str],
    ) -> Result<i32> {
        let source_cmd = self.cmd(source)?;
        let sink_cmd = self.cmd(sink)?;
        let status = source_cmd.pipe_into(source_args, &sink_cmd, sink_args)?;
        tracing::debug!(%source, %sink, status, "finished (pipeline)");
        Ok(status)
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
