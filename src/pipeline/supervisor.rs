//! Runs a component body on its own thread behind the startup rendezvous and turns any error or
//! panic into a fail-fast trip. Component threads never exit the process themselves.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::barrier::StartupBarrier;
use super::context::SharedState;
use super::failfast::{FailFast, Trip};

/// Wait at the rendezvous, run `body`, and trip `failfast` if it fails.
/// `on_error` maps the rendered error chain to this component's [`Trip`].
pub fn supervise<F, E>(
    name: &str,
    barrier: &StartupBarrier,
    failfast: &FailFast,
    on_error: E,
    body: F,
) where
    F: FnOnce() -> Result<()>,
    E: FnOnce(String) -> Trip,
{
    if let Err(e) = barrier.wait() {
        error!("{}: {}", name, e);
        failfast.trip(Trip::StartupTimeout(e.to_string()));
        return;
    }
    info!("{} running", name);

    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => debug!("{} stopped", name),
        Ok(Err(e)) => {
            let message = format!("{e:#}");
            error!("{} failed: {}", name, message);
            failfast.trip(on_error(message));
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("{} panicked: {}", name, message);
            failfast.trip(Trip::Panicked {
                component: name.to_string(),
                message,
            });
        }
    }
}

/// Spawn a named, detached-by-default component thread running [`supervise`].
pub fn spawn_component<F, E>(
    name: String,
    shared: &SharedState,
    on_error: E,
    body: F,
) -> Result<JoinHandle<()>>
where
    F: FnOnce() -> Result<()> + Send + 'static,
    E: FnOnce(String) -> Trip + Send + 'static,
{
    let barrier = Arc::clone(&shared.barrier);
    let failfast = Arc::clone(&shared.failfast);
    let thread_name = name.clone();
    thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || supervise(&name, &barrier, &failfast, on_error, body))
        .with_context(|| format!("spawn {} thread", thread_name))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
