// ============================================================================
// src/cmd/base.rs – Allowlisted external command runner (for system utilities)
// ============================================================================

use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::cmd::tool::Tool;

/// Safe wrapper for external process execution.
/// Only binaries named after a known [`Tool`] and living in a trusted
/// directory may be wrapped; nothing goes through a shell.
#[derive(Clone, Debug)]
pub struct Cmd {
    pub path: PathBuf,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct OutputData {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl OutputData {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Short human-readable failure reason.
    pub fn reason(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("exit status {}", self.status)
        } else {
            format!("exit status {}: {}", self.status, stderr)
        }
    }
}

impl Cmd {
    /// Create a new allowlisted command runner.
    pub fn new_allowlisted<P: AsRef<Path>, D: AsRef<Path>>(
        path: P,
        timeout: Duration,
        trusted_dirs: &[D],
    ) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid binary path {}", path.display()))?;
        if Tool::from_binary(name).is_none() {
            return Err(anyhow!("Command '{}' not in allowlist", path.display()));
        }
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("binary path {} has no directory", path.display()))?;
        if !trusted_dirs.iter().any(|d| d.as_ref() == parent) {
            return Err(anyhow!(
                "Command '{}' lives outside the trusted directories",
                path.display()
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            timeout,
        })
    }

    /// Run command with arguments, returning `OutputData`
    pub fn run(&self, args: &[&str], input: Option<&[u8]>) -> Result<OutputData> {
        tracing::debug!(cmd = %self.path.display(), ?args, "run (captured)");
        let mut cmd = Command::new(&self.path);
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawn {}", self.path.display()))?;

        if let Some(input_bytes) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input_bytes).context("writing stdin")?;
            }
        }

        self.wait_with_timeout(child)
    }

    /// Run with the terminal attached (progress output, interactive tools).
    /// No timeout: the operator watches and can interrupt.
    pub fn run_attached(&self, args: &[&str]) -> Result<i32> {
        tracing::debug!(cmd = %self.path.display(), ?args, "run (attached)");
        let status = Command::new(&self.path)
            .args(args)
            .status()
            .with_context(|| format!("spawn {}", self.path.display()))?;
        Ok(status.code().unwrap_or(-1))
    }

    /// `self args | sink sink_args` with the sink attached to the terminal.
    /// Returns the first non-zero status of the two, or 0.
    pub fn pipe_into(&self, args: &[&str], sink: &Cmd, sink_args: &[&str]) -> Result<i32> {
        tracing::debug!(
            source = %self.path.display(),
            ?args,
            sink = %sink.path.display(),
            ?sink_args,
            "run (pipeline)"
        );
        let mut source = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn {}", self.path.display()))?;
        let source_out = source
            .stdout
            .take()
            .ok_or_else(|| anyhow!("{} produced no stdout handle", self.path.display()))?;

        let sink_status = Command::new(&sink.path)
            .args(sink_args)
            .stdin(Stdio::from(source_out))
            .status();
        let sink_status = match sink_status {
            Ok(status) => status,
            Err(err) => {
                let _ = source.kill();
                let _ = source.wait();
                return Err(err).with_context(|| format!("spawn {}", sink.path.display()));
            }
        };
        let source_status = source
            .wait()
            .with_context(|| format!("wait {}", self.path.display()))?;

        let source_code = source_status.code().unwrap_or(-1);
        if source_code != 0 {
            return Ok(source_code);
        }
        Ok(sink_status.code().unwrap_or(-1))
    }

    fn wait_with_timeout(&self, mut child: Child) -> Result<OutputData> {
        let start = Instant::now();

        loop {
            match child.try_wait()? {
                Some(status) => {
                    let output = child.wait_with_output()?;
                    return Ok(OutputData {
                        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                        status: status.code().unwrap_or(-1),
                    });
                }
                None => {
                    if start.elapsed() > self.timeout {
                        // Best effort terminate, then kill.
                        {
                            use nix::sys::signal::{kill, Signal::SIGTERM};
                            use nix::unistd::Pid;
                            let _ = kill(Pid::from_raw(child.id() as i32), SIGTERM);
                        }
                        thread::sleep(Duration::from_millis(200));
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(anyhow!(
                            "{} timed out after {:?}",
                            self.path.display(),
                            self.timeout
                        ));
                    }
                    thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }
}
