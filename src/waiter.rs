// ============================================================================
// src/waiter.rs – Bounded polling for partition nodes published by udev
// ============================================================================

use std::path::Path;
use std::time::Duration;

use crate::system::System;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll until `path` is a block device. Returns false once `timeout` worth
/// of polling has passed without it appearing; callers treat that as a warning.
pub fn wait_for_node(sys: &dyn System, path: &Path, timeout: Duration) -> bool {
    let mut waited = Duration::ZERO;
    loop {
        if sys.is_block_device(path) {
            tracing::debug!(node = %path.display(), ?waited, "node present");
            return true;
        }
        if waited >= timeout {
            tracing::warn!(node = %path.display(), ?timeout, "node did not appear");
            return false;
        }
        sys.sleep(POLL_INTERVAL);
        waited += POLL_INTERVAL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::fake::FakeSystem;
    use std::cell::Cell;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn present_node_returns_immediately() {
        let sys = FakeSystem::with_block_devices(&["/dev/sdb2"]);
        assert!(wait_for_node(&sys, Path::new("/dev/sdb2"), DEFAULT_TIMEOUT));
        assert_eq!(sys.slept.get(), Duration::ZERO);
    }

    #[test]
    fn missing_node_times_out_within_one_interval() {
        let sys = FakeSystem::new();
        let timeout = Duration::from_millis(1200);
        assert!(!wait_for_node(&sys, Path::new("/dev/sdz9"), timeout));
        let waited = sys.slept.get();
        assert!(waited >= timeout, "returned early after {waited:?}");
        assert!(waited < timeout + POLL_INTERVAL);
    }

    /// Node appears on the third probe.
    struct LateNode {
        probes: Cell<u32>,
        inner: FakeSystem,
    }

    impl System for LateNode {
        fn is_block_device(&self, _path: &Path) -> bool {
            self.probes.set(self.probes.get() + 1);
            self.probes.get() >= 3
        }
        fn is_dir(&self, path: &Path) -> bool {
            self.inner.is_dir(path)
        }
        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            self.inner.create_dir_all(path)
        }
        fn mount_table(&self) -> io::Result<String> {
            self.inner.mount_table()
        }
        fn locate(&self, tool: crate::cmd::tool::Tool) -> Option<PathBuf> {
            self.inner.locate(tool)
        }
        fn run(
            &self,
            tool: crate::cmd::tool::Tool,
            args: &[&str],
        ) -> anyhow::Result<crate::cmd::OutputData> {
            self.inner.run(tool, args)
        }
        fn run_attached(&self, tool: crate::cmd::tool::Tool, args: &[&str]) -> anyhow::Result<i32> {
            self.inner.run_attached(tool, args)
        }
        fn pipe(
            &self,
            source: crate::cmd::tool::Tool,
            source_args: &[&str],
            sink: crate::cmd::tool::Tool,
            sink_args: &[&str],
        ) -> anyhow::Result<i32> {
            self.inner.pipe(source, source_args, sink, sink_args)
        }
        fn sleep(&self, duration: Duration) {
            self.inner.sleep(duration)
        }
    }

    #[test]
    fn default_timeout_polls_twenty_times() {
        let sys = FakeSystem::new();
        assert!(!wait_for_node(&sys, Path::new("/dev/sdz9"), DEFAULT_TIMEOUT));
        assert_eq!(sys.slept.get(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn late_node_is_picked_up_on_a_later_poll() {
        let sys = LateNode {
            probes: Cell::new(0),
            inner: FakeSystem::new(),
        };
        assert!(wait_for_node(&sys, &PathBuf::from("/dev/nvme0n1p3"), DEFAULT_TIMEOUT));
        assert_eq!(sys.probes.get(), 3);
        assert_eq!(sys.inner.slept.get(), POLL_INTERVAL * 2);
    }
}
