mod boot;
mod cmd;
mod config;
mod device;
mod flash;
mod menu;
mod mtab;
mod operator;
mod outcome;
mod partition;
mod system;
mod ui;
mod util;
mod waiter;

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::cmd::Session;
use crate::config::ConfigFile;
use crate::menu::MenuChoice;
use crate::operator::ConsoleOperator;
use crate::system::LinuxSystem;
use crate::ui::UX;
use crate::util::audit;

#[derive(Parser, Debug)]
#[command(name = "flashforge", version, about = "Flash disk images and build GPT/GRUB boot disks")]
struct Cli {
    /// Config file (TOML, or YAML for any other extension)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-level diagnostics on stderr
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let format = tracing_subscriber::fmt::format()
        .without_time()
        .with_target(false)
        .compact();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .event_format(format)
        .init();
}

fn run(ui: &UX, cli: &Cli) -> Result<()> {
    let cfg = ConfigFile::discover(cli.config.as_deref())?;
    audit::init(cfg.audit.enabled.then(|| cfg.audit.log_path.clone()));
    tracing::debug!(config = ?cfg.path, "configuration loaded");

    if !nix::unistd::geteuid().is_root() {
        ui.warn("Not running as root: most operations will fail.");
    }

    let sys = LinuxSystem::from_config(&cfg);
    let op = ConsoleOperator;
    let session = Session {
        ui,
        sys: &sys,
        op: &op,
        cfg: &cfg,
    };

    ui.banner();
    audit::audit_log("SESSION_START", &format!("config={:?}", cfg.path));
    serve(&session, || menu::show_main_menu(ui, &mut io::stdin().lock()))?;
    audit::audit_log("SESSION_END", "quit");
    ui.info("Bye.");
    Ok(())
}

/// Dispatch menu choices until quit. Stdin is only locked while a choice
/// is being read, so the workflows' own prompts get the terminal.
fn serve(session: &Session<'_>, mut next_choice: impl FnMut() -> MenuChoice) -> Result<()> {
    loop {
        match next_choice() {
            MenuChoice::FlashDisk => cmd::flash::run_flash_disk(session)?,
            MenuChoice::FlashPartition => cmd::flash::run_flash_partition(session)?,
            MenuChoice::BuildBootDisk => cmd::bootdisk::run_build_boot_disk(session)?,
            MenuChoice::NtfsResize => cmd::ntfs::run_ntfs_resize(session)?,
            MenuChoice::DiskUtility => cmd::disk_utility::run_disk_utility(session)?,
            MenuChoice::Quit => return Ok(()),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ui = UX::new();

    if let Err(err) = run(&ui, &cli) {
        audit::audit_log("FATAL", &format!("{err:#}"));
        ui.error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::Rig;
    use crate::outcome::DiskError;
    use crate::system::fake::FakeSystem;
    use std::io::Cursor;

    #[test]
    fn menu_loop_runs_workflows_until_quit() {
        let rig = Rig::new(FakeSystem::new(), &[]);
        let session = rig.session();
        let mut input = Cursor::new("9\n5\nq\n");
        serve(&session, || menu::show_main_menu(&rig.ui, &mut input)).unwrap();
        assert_eq!(rig.op.launched.borrow().len(), 1);
    }

    #[test]
    fn fatal_error_leaves_the_menu_loop() {
        let rig = Rig::new(FakeSystem::new(), &["disk.img", "sdq"]);
        let session = rig.session();
        let mut input = Cursor::new("1\n5\nq\n");
        let err = serve(&session, || menu::show_main_menu(&rig.ui, &mut input)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DiskError>(),
            Some(DiskError::DeviceNotFound(_))
        ));
        assert!(rig.op.launched.borrow().is_empty());
    }
}
