use lightbox::pipeline::{BarrierError, FailFast, KillSwitch, StartupBarrier, Termination, Trip};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// --- startup barrier ---

#[test]
fn test_barrier_releases_all_participants() {
    let barrier = Arc::new(StartupBarrier::new(4, Duration::from_secs(5)));
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || barrier.wait())
        })
        .collect();
    barrier.wait().unwrap();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(barrier.arrived(), 4);
    assert!(!barrier.is_broken());
}

#[test]
fn test_barrier_late_arrival_passes_through() {
    let barrier = StartupBarrier::new(1, Duration::from_millis(10));
    barrier.wait().unwrap();
    barrier.wait().unwrap();
}

#[test]
fn test_barrier_times_out_and_breaks() {
    let barrier = Arc::new(StartupBarrier::new(3, Duration::from_millis(100)));
    let other = {
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || barrier.wait())
    };
    let began = Instant::now();
    let first = barrier.wait();
    let second = other.join().unwrap();
    assert!(began.elapsed() >= Duration::from_millis(90));

    // One waiter times out; the other either times out too or sees the broken barrier.
    let outcomes = [first, second];
    assert!(outcomes.iter().all(Result::is_err));
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(BarrierError::TimedOut { expected: 3, .. })))
    );
    assert!(barrier.is_broken());

    // Later arrivals fail immediately.
    assert!(matches!(barrier.wait(), Err(BarrierError::Broken { .. })));
}

// --- fail-fast latch ---

#[test]
fn test_first_trip_wins() {
    let failfast = FailFast::new();
    assert!(!failfast.is_set());
    assert!(failfast.trip(Trip::WatcherFailed("disk".to_string())));
    assert!(!failfast.trip(Trip::Interrupted));
    assert_eq!(failfast.reason(), Some(Trip::WatcherFailed("disk".to_string())));
    assert_eq!(failfast.wait(), Trip::WatcherFailed("disk".to_string()));
}

#[test]
fn test_wait_timeout_unset_returns_none() {
    let failfast = FailFast::new();
    let began = Instant::now();
    assert_eq!(failfast.wait_timeout(Duration::from_millis(50)), None);
    assert!(began.elapsed() >= Duration::from_millis(45));
}

#[test]
fn test_wait_wakes_on_trip_from_other_thread() {
    let failfast = Arc::new(FailFast::new());
    let tripper = {
        let failfast = Arc::clone(&failfast);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            failfast.trip(Trip::Interrupted)
        })
    };
    assert_eq!(
        failfast.wait_timeout(Duration::from_secs(5)),
        Some(Trip::Interrupted)
    );
    assert!(tripper.join().unwrap());
}

#[test]
fn test_termination_exit_codes() {
    assert_eq!(Termination::Interrupted.exit_code(), 0);
    assert_eq!(
        Termination::Failed(Trip::Integrity("bad".to_string())).exit_code(),
        1
    );
}

// --- kill switch ---

#[test]
fn test_kill_switch_fires_after_timeout() -> anyhow::Result<()> {
    let failfast = Arc::new(FailFast::new());
    let switch = KillSwitch::arm(Duration::from_millis(30), Arc::clone(&failfast), || {
        Trip::WatcherTimeout {
            timeout: Duration::from_millis(30),
        }
    })?;
    let trip = failfast.wait_timeout(Duration::from_secs(5));
    assert!(matches!(trip, Some(Trip::WatcherTimeout { .. })));
    assert!(switch.has_fired());
    assert!(!switch.disarm());
    Ok(())
}

#[test]
fn test_kill_switch_disarmed_in_time() -> anyhow::Result<()> {
    let failfast = Arc::new(FailFast::new());
    let switch = KillSwitch::arm(Duration::from_millis(100), Arc::clone(&failfast), || {
        Trip::Interrupted
    })?;
    assert!(switch.disarm());
    assert_eq!(failfast.wait_timeout(Duration::from_millis(250)), None);
    Ok(())
}

#[test]
fn test_kill_switch_drop_disarms() -> anyhow::Result<()> {
    let failfast = Arc::new(FailFast::new());
    {
        let _switch = KillSwitch::arm(Duration::from_millis(50), Arc::clone(&failfast), || {
            Trip::Interrupted
        })?;
    }
    assert_eq!(failfast.wait_timeout(Duration::from_millis(200)), None);
    Ok(())
}

// --- supervised component threads ---

#[test]
fn test_component_error_trips_latch() -> anyhow::Result<()> {
    use lightbox::pipeline::{create_shared_state, spawn_component};
    use lightbox::{Layout, LogSink, PipelineConfig};

    // No workers: the component plus three local arrivals fill the rendezvous.
    let config = PipelineConfig {
        worker_count: 0,
        startup_timeout: Duration::from_secs(5),
        ..PipelineConfig::new(Layout::under(std::path::Path::new("/srv/box")))
    };
    let shared = create_shared_state(config, Arc::new(LogSink));
    let handle = spawn_component("collector".to_string(), &shared, Trip::ResultsFailed, || {
        assert_eq!(thread::current().name(), Some("collector"));
        anyhow::bail!("queue gone")
    })?;
    let arrivals: Vec<_> = (0..3)
        .map(|_| {
            let barrier = Arc::clone(&shared.barrier);
            thread::spawn(move || barrier.wait())
        })
        .collect();
    for arrival in arrivals {
        arrival.join().unwrap().unwrap();
    }
    handle.join().unwrap();

    match shared.failfast.reason() {
        Some(Trip::ResultsFailed(message)) => assert!(message.contains("queue gone"), "{message}"),
        other => panic!("unexpected trip: {other:?}"),
    }
    Ok(())
}
