//! Pipeline components: shared state, startup rendezvous, fail-fast latch, and the
//! watcher → workers → results threads.

pub mod barrier;
pub mod context;
pub mod failfast;
pub mod killswitch;
pub mod orchestrator;
pub mod results;
pub mod supervisor;
pub mod timer;
pub mod watcher;
pub mod worker;

pub use barrier::{BarrierError, StartupBarrier};
pub use context::{InFlight, SharedState, create_shared_state};
pub use failfast::{FailFast, FailFastCoordinator, Termination, Trip, install_interrupt_handler};
pub use killswitch::KillSwitch;
pub use orchestrator::{
    PipelineHandles, launch, run_pipeline, start_pipeline, start_results, start_timer,
    start_watcher, start_workers,
};
pub use results::{ResultsCollector, check_integrity};
pub use supervisor::{spawn_component, supervise};
pub use timer::HealthTimer;
pub use watcher::{IngestionWatcher, new_work_item};
pub use worker::Worker;
