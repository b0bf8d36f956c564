//! Starts every component thread and hands back the coordinator for the caller's thread.

use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::PipelineConfig;
use crate::events::EventSink;
use crate::transforms::TransformRegistry;

use super::context::{SharedState, create_shared_state};
use super::failfast::{FailFast, FailFastCoordinator, Termination, Trip};
use super::results::ResultsCollector;
use super::supervisor::spawn_component;
use super::timer::HealthTimer;
use super::watcher::IngestionWatcher;
use super::worker::Worker;

/// Returned by [`launch`]: run `coordinator` on the calling thread. Component threads are detached
/// in spirit; the handles are only for callers that want to join after a trip.
pub struct PipelineHandles {
    pub coordinator: FailFastCoordinator,
    pub failfast: Arc<FailFast>,
    pub component_handles: Vec<JoinHandle<()>>,
}

/// Worker threads; each blocks on the work queue.
pub fn start_workers(
    shared: &SharedState,
    registry: &Arc<TransformRegistry>,
) -> Result<Vec<JoinHandle<()>>> {
    (0..shared.config.worker_count)
        .map(|index| {
            let worker = Worker::new(index, shared, Arc::clone(registry));
            spawn_component(
                format!("worker-{index}"),
                shared,
                move |message| Trip::WorkerFailed {
                    worker: index,
                    message,
                },
                move || worker.run(),
            )
        })
        .collect()
}

/// Periodic scan thread; sleeps between polls.
pub fn start_watcher(shared: &SharedState) -> Result<JoinHandle<()>> {
    let watcher = IngestionWatcher::new(shared);
    spawn_component(
        "watcher".to_string(),
        shared,
        Trip::WatcherFailed,
        move || watcher.run(),
    )
}

pub fn start_timer(shared: &SharedState) -> Result<JoinHandle<()>> {
    let timer = HealthTimer::new(shared);
    spawn_component("health".to_string(), shared, Trip::TimerFailed, move || {
        timer.run()
    })
}

/// Blocks on the result queue.
pub fn start_results(shared: &SharedState) -> Result<JoinHandle<()>> {
    let results = ResultsCollector::new(shared);
    spawn_component(
        "results".to_string(),
        shared,
        Trip::ResultsFailed,
        move || results.run(),
    )
}

/// Build shared state, then [`start_pipeline`].
pub fn launch(
    config: PipelineConfig,
    registry: TransformRegistry,
    sink: Arc<dyn EventSink>,
) -> Result<PipelineHandles> {
    start_pipeline(create_shared_state(config, sink), registry)
}

/// Check the directories and start workers, watcher, timer and results on prepared shared state.
/// Use this instead of [`launch`] to hook the latch (e.g. Ctrl+C) before any thread starts.
/// Nothing proceeds past the rendezvous until the returned coordinator runs.
pub fn start_pipeline(shared: SharedState, registry: TransformRegistry) -> Result<PipelineHandles> {
    shared.config.layout.ensure_exists()?;
    info!(
        "starting {} worker(s); transforms: [{}]",
        shared.config.worker_count,
        registry.names().join(", ")
    );
    debug!("startup rendezvous expects {} participants", shared.barrier.expected());

    let registry = Arc::new(registry);
    let mut component_handles = start_workers(&shared, &registry)?;
    component_handles.push(start_watcher(&shared)?);
    component_handles.push(start_timer(&shared)?);
    component_handles.push(start_results(&shared)?);

    Ok(PipelineHandles {
        coordinator: FailFastCoordinator::new(&shared),
        failfast: Arc::clone(&shared.failfast),
        component_handles,
    })
}

/// [`launch`], then block the calling thread in the coordinator until the latch is set.
pub fn run_pipeline(
    config: PipelineConfig,
    registry: TransformRegistry,
    sink: Arc<dyn EventSink>,
) -> Result<Termination> {
    let handles = launch(config, registry, sink)?;
    Ok(handles.coordinator.run())
}
