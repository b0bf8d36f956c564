//! Lightbox: fail-fast concurrent file pipeline

pub mod engine;
pub mod events;
pub mod pipeline;
pub mod transforms;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use events::{ChannelSink, Event, EventKind, EventSink, EventType, LogSink};
pub use pipeline::{PipelineHandles, Termination, Trip, launch};
pub use transforms::{Transform, TransformRegistry};
pub use utils::Layout;

use log::debug;
use std::sync::Arc;

/// Result alias used by public lightbox API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: start the pipeline described by `config` and block the calling thread until
/// the fail-fast latch is set.
///
/// - **`sink: None`** → events go to the `log` facade as JSON lines ([`LogSink`]).
/// - **`sink: Some(s)`** → events go to `s` (e.g. a [`ChannelSink`]). Called from component threads; keep it fast.
///
/// The four directories in `config.layout` must already exist. Ctrl+C is not hooked here; call
/// [`pipeline::install_interrupt_handler`] with [`PipelineHandles::failfast`] if you use [`launch`] directly.
pub fn run(
    config: PipelineConfig,
    registry: TransformRegistry,
    sink: Option<Arc<dyn EventSink>>,
) -> Result<Termination> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        config
    );
    let sink = sink.unwrap_or_else(|| Arc::new(LogSink));
    pipeline::run_pipeline(config, registry, sink)
}
