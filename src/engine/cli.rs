//! CLI command handlers: `run` starts the pipeline, `makedirs` creates the I/O directories.
//! Both only log their effective options unless --execute is given.

use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;

use crate::Settings;
use crate::engine::arg_parser::{Cli, Commands, MakedirsArgs, RunArgs};
use crate::events::LogSink;
use crate::pipeline::{create_shared_state, install_interrupt_handler, start_pipeline};
use crate::transforms::TransformRegistry;
use crate::utils::config::WorkerThreadLimits;
use crate::utils::{Layout, apply_file_to_settings, load_lightbox_toml, setup_logging};

/// Defaults, then `.lightbox.toml` in the base directory, then command line.
pub fn setup_settings(args: &RunArgs, verbose: bool) -> Result<Settings> {
    let mut settings = Settings::default();
    if let Some(file) = load_lightbox_toml(&args.dir) {
        apply_file_to_settings(&file, &mut settings);
    }
    if let Some(v) = args.check_interval_secs {
        settings.check_interval_secs = v;
    }
    if let Some(v) = args.cpu_factor {
        settings.cpu_factor = v;
    }
    if let Some(v) = args.worker_count {
        settings.worker_count = v;
    }
    if let Some(v) = args.timeout {
        settings.timeout_secs = v;
    }
    settings.verbose |= verbose;
    settings.execute = args.execute;
    settings.validate()?;
    Ok(settings)
}

/// Dispatch a parsed command line. Returns the process exit status.
/// For `run`, logging starts after the settings are merged so the file's `verbose` applies.
pub fn handle_cli(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Run(args) => {
            let settings = setup_settings(args, cli.verbose)?;
            setup_logging(settings.verbose);
            handle_run(args, &settings)
        }
        Commands::Makedirs(args) => {
            setup_logging(cli.verbose);
            handle_makedirs(args)
        }
    }
}

/// Start the pipeline and block until the fail-fast latch is set.
pub fn handle_run(args: &RunArgs, settings: &Settings) -> Result<i32> {
    let limits = WorkerThreadLimits::current();
    info!(
        "Effective options (command line overrides {}):\
         \n  check_interval_secs: {}\
         \n  cpu_factor: {}\
         \n  worker_count: {}\
         \n  timeout: {}\
         \n  valid_extensions: {:?}\
         \n  preserve_originals: {}\
         \n  execute: {}",
        crate::utils::PackagePaths::get().config_filename(),
        settings.check_interval_secs,
        settings.cpu_factor,
        settings.resolved_worker_count(limits),
        settings.timeout_secs,
        settings.valid_extensions,
        settings.preserve_originals,
        settings.execute
    );

    if !settings.execute {
        info!("run: Not executed");
        return Ok(0);
    }

    let config = settings.to_pipeline_config(Layout::under(&args.dir), limits);
    debug!("{:#?}", config);
    let shared = create_shared_state(config, Arc::new(LogSink));
    // Hooked before any component thread exists, so Ctrl+C always lands in the latch.
    install_interrupt_handler(Arc::clone(&shared.failfast))?;
    let handles = start_pipeline(shared, TransformRegistry::builtin())?;
    let termination = handles.coordinator.run();
    Ok(termination.exit_code())
}

pub fn handle_makedirs(args: &MakedirsArgs) -> Result<i32> {
    info!("Options:\n  dir: {}\n  execute: {}", args.dir.display(), args.execute);
    if args.execute {
        Layout::under(&args.dir).create_all()?;
    } else {
        info!("makedirs: Not executed");
    }
    Ok(0)
}
