// ============================================================================
// src/cmd/disk_utility.rs – Menu 5: hand the operator a graphical disk tool
// ============================================================================

use anyhow::Result;

use crate::cmd::tool::Tool;
use crate::cmd::Session;

/// Preferred first.
const CANDIDATES: [Tool; 2] = [Tool::GnomeDisks, Tool::Gparted];

pub fn run_disk_utility(s: &Session<'_>) -> Result<()> {
    s.ui.phase("Disk utility");

    let Some((tool, path)) = CANDIDATES
        .iter()
        .find_map(|tool| s.sys.locate(*tool).map(|path| (*tool, path)))
    else {
        s.ui.warn("Neither gnome-disks nor gparted is installed.");
        return Ok(());
    };

    tracing::debug!(%tool, "opening disk utility");
    if let Err(err) = s.op.launch_and_wait(&path, &[]) {
        s.ui.warn(&format!("{tool} could not be started ({err})"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::Rig;
    use crate::system::fake::FakeSystem;

    #[test]
    fn prefers_gnome_disks() {
        let rig = Rig::new(FakeSystem::new(), &[]);
        run_disk_utility(&rig.session()).unwrap();
        assert_eq!(*rig.op.launched.borrow(), vec!["/usr/bin/gnome-disks ".to_string()]);
    }

    #[test]
    fn falls_back_to_gparted() {
        let sys = FakeSystem::new();
        sys.remove_tool(Tool::GnomeDisks);
        let rig = Rig::new(sys, &[]);
        run_disk_utility(&rig.session()).unwrap();
        assert_eq!(*rig.op.launched.borrow(), vec!["/usr/bin/gparted ".to_string()]);
    }

    #[test]
    fn nothing_installed_is_only_a_warning() {
        let sys = FakeSystem::new();
        sys.remove_tool(Tool::GnomeDisks);
        sys.remove_tool(Tool::Gparted);
        let rig = Rig::new(sys, &[]);
        assert!(run_disk_utility(&rig.session()).is_ok());
        assert!(rig.op.launched.borrow().is_empty());
    }
}
