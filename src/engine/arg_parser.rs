use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::config::Ranges;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Watch a directory, transform incoming images on a worker pool, fail fast on any stall.
#[derive(Clone, Debug, Parser)]
#[command(name = "lightbox")]
#[command(about = "Transform incoming images; nothing runs without --execute.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output.
    #[arg(long, short = 'v', global = true, env = "LIGHTBOX_VERBOSE")]
    pub verbose: bool,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Start the pipeline (incoming → workers → results).
    Run(RunArgs),
    /// Create the application I/O directories.
    Makedirs(MakedirsArgs),
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Base directory holding incoming/, modified/, original/ and rejected/. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR, env = "LIGHTBOX_DIR")]
    pub dir: PathBuf,

    /// Interval in seconds between checks for new files (default 5, range 3-300).
    #[arg(
        long,
        env = "LIGHTBOX_CHECK_INTERVAL_SECS",
        value_parser = RangedU64ValueParser::<u64>::new()
            .range(*Ranges::CHECK_INTERVAL_SECS.start()..=*Ranges::CHECK_INTERVAL_SECS.end())
    )]
    pub check_interval_secs: Option<u64>,

    /// Set worker-count = cpu-count * cpu-factor + 1 (default 2, range 0-15; overridden by an explicit worker-count).
    #[arg(
        long,
        short = 'c',
        env = "LIGHTBOX_CPU_FACTOR",
        value_parser = RangedU64ValueParser::<u32>::new()
            .range(*Ranges::CPU_FACTOR.start() as u64..=*Ranges::CPU_FACTOR.end() as u64)
    )]
    pub cpu_factor: Option<u32>,

    /// Number of workers; non-zero overrides cpu-factor (default 0, range 0-127).
    #[arg(
        long,
        short = 'w',
        env = "LIGHTBOX_WORKER_COUNT",
        value_parser = RangedU64ValueParser::<usize>::new()
            .range(*Ranges::WORKER_COUNT.start() as u64..=*Ranges::WORKER_COUNT.end() as u64)
    )]
    pub worker_count: Option<usize>,

    /// Worker timeout in seconds (default 60, range 10-600).
    #[arg(
        long,
        short = 't',
        env = "LIGHTBOX_TIMEOUT",
        value_parser = RangedU64ValueParser::<u64>::new()
            .range(*Ranges::TIMEOUT_SECS.start()..=*Ranges::TIMEOUT_SECS.end())
    )]
    pub timeout: Option<u64>,

    /// Execute the commands (default false: print effective options and stop).
    #[arg(long, short = 'e', env = "LIGHTBOX_EXECUTE")]
    pub execute: bool,
}

#[derive(Clone, Debug, Args)]
pub struct MakedirsArgs {
    /// Base directory to create incoming/, modified/, original/ and rejected/ under.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR, env = "LIGHTBOX_DIR")]
    pub dir: PathBuf,

    /// Execute the commands (default false).
    #[arg(long, short = 'e', env = "LIGHTBOX_EXECUTE")]
    pub execute: bool,
}
