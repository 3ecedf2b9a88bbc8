//! Integration tests for the sampling engine, driven by a scripted mock
//! collector so they are deterministic and independent of the host OS.
//!
//! Timing assertions use the tolerant bounds from the engine's contract
//! to stay robust against scheduler jitter.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use resmon::collectors::Collector;
use resmon::error::{CollectorError, ConfigError};
use resmon::model::{CpuStats, MemoryStats, Snapshot};
use resmon::sampler::Sampler;

/// Collector returning fixed, valid snapshots. Counts its calls and can be
/// scripted to fail on one specific call.
struct MockCollector {
    calls: Arc<AtomicUsize>,
    fail_on_call: Option<usize>,
}

impl MockCollector {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            fail_on_call: None,
        }
    }

    fn failing_on(calls: Arc<AtomicUsize>, call: usize) -> Self {
        Self {
            calls,
            fail_on_call: Some(call),
        }
    }
}

impl Collector for MockCollector {
    fn capture(&mut self) -> Result<Snapshot, CollectorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(CollectorError::Unavailable("scripted failure".into()));
        }
        Ok(Snapshot {
            cpu: CpuStats {
                name: "mock cpu".into(),
                cores: 4,
                threads: 8,
                usage_percent: 12.5,
            },
            memory: MemoryStats {
                total_bytes: 1_000_000,
                used_bytes: 400_000,
                available_bytes: 600_000,
                usage_percent: 40.0,
            },
            load_avg: 0.5,
            uptime: Duration::from_secs(3600),
            ..Snapshot::default()
        })
    }
}

fn mock_sampler() -> (Sampler, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let sampler = Sampler::new(Box::new(MockCollector::new(Arc::clone(&calls))));
    (sampler, calls)
}

#[test]
fn fresh_sampler_is_stopped_with_empty_snapshot() {
    let (sampler, _) = mock_sampler();
    assert!(!sampler.is_running());
    let snap = sampler.current_snapshot();
    assert_eq!(snap.cpu.name, "");
    assert_eq!(snap.memory.total_bytes, 0);
    assert!(snap.disks.is_empty());
}

#[test]
fn start_and_stop_transition_running_state() {
    let (sampler, _) = mock_sampler();
    sampler.set_interval(50).unwrap();
    sampler.start();
    assert!(sampler.is_running());
    sampler.stop();
    assert!(!sampler.is_running());
}

#[test]
fn no_observer_calls_after_stop_returns() {
    let (sampler, _) = mock_sampler();
    sampler.set_interval(50).unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_by_observer = Arc::clone(&seen);
    sampler.set_observer(move |_| {
        seen_by_observer.fetch_add(1, Ordering::SeqCst);
    });

    sampler.start();
    std::thread::sleep(Duration::from_millis(180));
    sampler.stop();

    let at_stop = seen.load(Ordering::SeqCst);
    assert!(at_stop >= 1, "observer never fired");

    // Stable for well over 2x the interval after stop() returned.
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(seen.load(Ordering::SeqCst), at_stop);
}

#[test]
fn double_start_spawns_one_loop() {
    let (sampler, calls) = mock_sampler();
    sampler.set_interval(100).unwrap();
    sampler.start();
    sampler.start();
    std::thread::sleep(Duration::from_millis(550));
    sampler.stop();

    // One loop at 100ms over 550ms makes at most ~7 captures even with
    // jitter; a duplicated loop would roughly double that.
    let n = calls.load(Ordering::SeqCst);
    assert!((1..=8).contains(&n), "unexpected capture count {n}");
}

#[test]
fn observer_fires_once_per_interval() {
    let (sampler, _) = mock_sampler();
    sampler.set_interval(100).unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_by_observer = Arc::clone(&seen);
    sampler.set_observer(move |_| {
        seen_by_observer.fetch_add(1, Ordering::SeqCst);
    });

    sampler.start();
    std::thread::sleep(Duration::from_millis(550));
    sampler.stop();

    let n = seen.load(Ordering::SeqCst);
    assert!((4..=6).contains(&n), "expected 4..=6 observer calls, got {n}");
}

#[test]
fn zero_interval_is_rejected() {
    let (sampler, _) = mock_sampler();
    sampler.set_interval(200).unwrap();
    assert_eq!(sampler.set_interval(0), Err(ConfigError::ZeroInterval));
    assert_eq!(sampler.interval(), Duration::from_millis(200));
}

#[test]
fn stop_when_not_running_is_a_prompt_noop() {
    let (sampler, _) = mock_sampler();
    let before = Instant::now();
    sampler.stop();
    sampler.stop();
    assert!(before.elapsed() < Duration::from_millis(50));
    assert!(!sampler.is_running());
}

#[test]
fn recorded_snapshots_are_valid() {
    let (sampler, _) = mock_sampler();
    sampler.set_interval(200).unwrap();

    let recorded: Arc<Mutex<Vec<Snapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&recorded);
    sampler.set_observer(move |snap| {
        sink.lock().push(snap.clone());
    });

    sampler.start();
    std::thread::sleep(Duration::from_millis(650));
    sampler.stop();

    let snaps = recorded.lock();
    assert!(
        (2..=4).contains(&snaps.len()),
        "expected 2..=4 snapshots, got {}",
        snaps.len()
    );
    for snap in snaps.iter() {
        assert!(snap.cpu.usage_percent >= 0.0 && snap.cpu.usage_percent <= 100.0);
        let sum = snap.memory.used_bytes + snap.memory.available_bytes;
        let total = snap.memory.total_bytes;
        assert!(sum.abs_diff(total) <= total / 100, "memory does not add up");
    }
}

#[test]
fn one_failing_capture_does_not_stop_sampling() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sampler = Sampler::new(Box::new(MockCollector::failing_on(Arc::clone(&calls), 2)));
    sampler.set_interval(50).unwrap();
    sampler.start();

    // Wait until the collector has been called at least three times, so
    // the scripted failure on call 2 is behind us.
    let deadline = Instant::now() + Duration::from_secs(2);
    while calls.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    sampler.stop();

    assert!(calls.load(Ordering::SeqCst) >= 3, "loop died after the fault");
    // Captures after the fault repopulated the latest snapshot.
    assert_eq!(sampler.current_snapshot().cpu.name, "mock cpu");
}

#[test]
fn observer_panic_does_not_kill_the_loop() {
    let (sampler, _) = mock_sampler();
    sampler.set_interval(50).unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_by_observer = Arc::clone(&seen);
    sampler.set_observer(move |_| {
        let n = seen_by_observer.fetch_add(1, Ordering::SeqCst) + 1;
        if n == 1 {
            panic!("observer blew up");
        }
    });

    sampler.start();
    let deadline = Instant::now() + Duration::from_secs(2);
    while seen.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    sampler.stop();

    assert!(
        seen.load(Ordering::SeqCst) >= 3,
        "loop did not survive the observer panic"
    );
}

#[test]
fn replacing_the_observer_takes_effect() {
    let (sampler, _) = mock_sampler();
    sampler.set_interval(50).unwrap();

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let sink = Arc::clone(&first);
    sampler.set_observer(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    let sink = Arc::clone(&second);
    sampler.set_observer(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    sampler.start();
    std::thread::sleep(Duration::from_millis(180));
    sampler.stop();

    // Last write wins: only the second observer ever fires.
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert!(second.load(Ordering::SeqCst) >= 1);
}

#[test]
fn clear_observer_silences_notifications() {
    let (sampler, calls) = mock_sampler();
    sampler.set_interval(50).unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&seen);
    sampler.set_observer(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    sampler.clear_observer();

    sampler.start();
    std::thread::sleep(Duration::from_millis(180));
    sampler.stop();

    // Sampling continued, but nobody was notified.
    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}

#[test]
fn restart_keeps_sampling_and_latest_snapshot() {
    let (sampler, calls) = mock_sampler();
    sampler.set_interval(50).unwrap();

    sampler.start();
    std::thread::sleep(Duration::from_millis(120));
    sampler.stop();
    let after_first_run = calls.load(Ordering::SeqCst);
    assert!(after_first_run >= 1);
    assert_eq!(sampler.current_snapshot().cpu.name, "mock cpu");

    sampler.start();
    assert!(sampler.is_running());
    std::thread::sleep(Duration::from_millis(120));
    sampler.stop();
    assert!(calls.load(Ordering::SeqCst) > after_first_run);
}

#[test]
fn drop_joins_the_sampling_thread() {
    let seen = Arc::new(AtomicUsize::new(0));
    {
        let (sampler, _) = mock_sampler();
        sampler.set_interval(50).unwrap();
        let sink = Arc::clone(&seen);
        sampler.set_observer(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        sampler.start();
        std::thread::sleep(Duration::from_millis(120));
    }
    // Sampler dropped: the loop is joined, so the count is frozen.
    let at_drop = seen.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(seen.load(Ordering::SeqCst), at_drop);
}
