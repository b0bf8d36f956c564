//! Lightbox CLI: `makedirs` to create the I/O directories, `run` to start the pipeline.
//! Nothing happens without --execute.

use anyhow::Result;
use clap::Parser;
use lightbox::engine::arg_parser::Cli;
use lightbox::engine::handle_cli;

fn main() -> Result<()> {
    // .env feeds LIGHTBOX_* variables into clap.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let code = handle_cli(&cli)?;
    std::process::exit(code);
}
