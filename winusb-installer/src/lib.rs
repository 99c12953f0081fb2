use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use winusb_core::cli::{Cli, Command, WriteArgs};
use winusb_core::config::Config;
use winusb_core::preflight::{self, PreflightConfig, WIMINFO};
use winusb_core::writer::{self, WriterConfig};
use winusb_hal::LinuxHal;

pub mod ui;

use ui::style::{self, emoji};

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    winusb_core::logging::init_with(cli.log_file.clone());

    let config = Config::load(cli.config.as_deref())?.with_iso_dir(cli.iso_dir.clone());
    let hal = LinuxHal::new();

    match &cli.command {
        // No subcommand = interactive write (default)
        None => write(&cli, &cli.write, config, &hal),
        Some(Command::Write(args)) => write(&cli, args, config, &hal),
        Some(Command::Preflight) => {
            log::info!("{}", style::with(emoji::SEARCH, "Running preflight checks..."));
            preflight::run_with(&PreflightConfig::for_config(&config, cli.dry_run), &hal)?;
            log::info!("{}", style::with(emoji::SUCCESS, "Preflight passed"));
            Ok(())
        }
        Some(Command::Detect { iso_root }) => {
            let path_env = std::env::var("PATH").unwrap_or_default();
            let wiminfo = preflight::find_executable_in_path(WIMINFO, &path_env).is_some();
            let version = writer::detect_only(iso_root, &hal, wiminfo)?;
            println!("{}", version);
            Ok(())
        }
    }
}

fn write(cli: &Cli, args: &WriteArgs, config: Config, hal: &LinuxHal) -> anyhow::Result<()> {
    if let Some(iso) = args.iso.as_deref() {
        ui::validation::validate_iso_path(iso).map_err(anyhow::Error::msg)?;
    }
    if let Some(device) = args.device.as_deref() {
        ui::validation::validate_device_name(device).map_err(anyhow::Error::msg)?;
    }

    let preflight_cfg = PreflightConfig::for_config(&config, cli.dry_run);
    preflight::run_with(&preflight_cfg, hal)?;

    let mut cfg = WriterConfig::from_args(config, args, cli.dry_run);
    cfg.wiminfo_available =
        preflight::find_executable_in_path(WIMINFO, &preflight_cfg.path_env).is_some();
    if ui::needs_prompts(&cfg) {
        ui::ensure_interactive_terminal()?;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    writer::set_cancel_flag(cancel.clone());
    ui::cancel::install_ctrlc_handler(move || {
        if cancel.swap(true, Ordering::SeqCst) {
            eprintln!("{}", style::with(emoji::CANCEL, "Aborting immediately"));
            std::process::exit(130);
        }
        log::warn!(
            "{}",
            style::with(
                emoji::CANCEL,
                "Stopping after the current step (Ctrl+C again to quit now)"
            )
        );
    })?;

    log::info!("{}", style::with(emoji::DISK, "Starting writer..."));
    let result = writer::run(&cfg, hal, &ui::prompt::TerminalPrompter);
    writer::clear_cancel_flag();
    result
}
