//! Engine module: command line and the file/time helpers the pipeline is built on

pub mod arg_parser;
pub mod cli;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::{Cli, Commands, MakedirsArgs, RunArgs};
pub use cli::{handle_cli, handle_makedirs, handle_run, setup_settings};
pub use tools::{
    copy_into, effective_worker_count, has_valid_extension, invalid_reasons, move_into,
    status_change_time,
};
