use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::collectors::Collector;
use crate::error::ConfigError;
use crate::model::Snapshot;

/// Callback invoked once per completed sample, on the sampling thread.
pub type Observer = Box<dyn FnMut(&Snapshot) + Send>;

/// Interval applied to a freshly constructed [`Sampler`].
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Upper bound on one sleep slice inside the sampling loop. The loop
/// re-checks the running flag between slices, so `stop()` latency is
/// bounded by this value regardless of the configured interval.
const STOP_POLL_SLICE: Duration = Duration::from_millis(100);

/// Periodic sampling engine.
///
/// Owns one background thread that repeatedly asks its [`Collector`] for a
/// [`Snapshot`], stores the latest one for synchronous retrieval, and hands
/// it to an optional observer callback. All methods are safe to call from
/// any thread, concurrently with the sampling loop.
///
/// The observer runs inline on the sampling thread: a slow observer delays
/// the next sample and shutdown responsiveness, so keep it fast and
/// non-blocking. Calling [`Sampler::stop`] (or any other sampler method
/// besides [`Sampler::current_snapshot`] and [`Sampler::is_running`]) from
/// inside the observer deadlocks and is forbidden.
pub struct Sampler {
    shared: Arc<Shared>,
    /// Join handle of the loop thread. Also serializes start/stop.
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    running: AtomicBool,
    interval_ms: AtomicU64,
    latest: Mutex<Option<Snapshot>>,
    observer: Mutex<Option<Observer>>,
    collector: Mutex<Box<dyn Collector>>,
}

impl Sampler {
    /// Creates a stopped sampler around the given collector, with the
    /// default 1000 ms interval. The collector lives as long as the
    /// sampler, so its internal rate baselines survive stop/start cycles.
    pub fn new(collector: Box<dyn Collector>) -> Self {
        Self {
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                interval_ms: AtomicU64::new(DEFAULT_INTERVAL_MS),
                latest: Mutex::new(None),
                observer: Mutex::new(None),
                collector: Mutex::new(collector),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Launches the sampling loop on a background thread. No-op if the
    /// sampler is already running.
    pub fn start(&self) {
        let mut handle = self.handle.lock();
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("resmon-sampler".into())
            .spawn(move || shared.run());
        match spawned {
            Ok(h) => *handle = Some(h),
            Err(err) => {
                self.shared.running.store(false, Ordering::SeqCst);
                warn!(error = %err, "failed to spawn sampling thread");
            }
        }
    }

    /// Signals the sampling loop to exit and blocks until it has. After
    /// this returns no sample is in flight and the observer will not fire
    /// again. No-op if the sampler is not running. Idempotent.
    ///
    /// Must not be called from inside the observer callback (the loop
    /// would be joining itself).
    pub fn stop(&self) {
        let mut handle = self.handle.lock();
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(h) = handle.take() {
            if h.join().is_err() {
                warn!("sampling thread terminated by panic");
            }
        }
    }

    /// Whether the sampling loop is currently active.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Currently configured sampling period.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.shared.interval_ms.load(Ordering::SeqCst))
    }

    /// Sets the sampling period in milliseconds. Takes effect on the next
    /// loop iteration, not on a sleep already in progress.
    ///
    /// A zero interval is rejected with [`ConfigError::ZeroInterval`] and
    /// the previous value stays in effect.
    pub fn set_interval(&self, ms: u64) -> Result<(), ConfigError> {
        if ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        self.shared.interval_ms.store(ms, Ordering::SeqCst);
        Ok(())
    }

    /// Registers the observer called once per completed sample. Single
    /// slot: a later call replaces the earlier observer. Takes effect on
    /// the next completed sample.
    pub fn set_observer(&self, observer: impl FnMut(&Snapshot) + Send + 'static) {
        *self.shared.observer.lock() = Some(Box::new(observer));
    }

    /// Removes the registered observer, if any.
    pub fn clear_observer(&self) {
        *self.shared.observer.lock() = None;
    }

    /// Returns the most recently completed snapshot, or
    /// [`Snapshot::default`] if no sample has finished yet. Cheap, never
    /// fails, never triggers a collection.
    pub fn current_snapshot(&self) -> Snapshot {
        self.shared.latest.lock().clone().unwrap_or_default()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    /// The sampling loop: capture, store, notify, then sleep out the rest
    /// of the interval in short slices so a stop request is honored
    /// promptly.
    fn run(&self) {
        debug!("sampling loop started");
        while self.running.load(Ordering::SeqCst) {
            let started = Instant::now();
            let captured = self.collector.lock().capture();
            match captured {
                Ok(snapshot) => {
                    *self.latest.lock() = Some(snapshot.clone());
                    self.notify(&snapshot);
                }
                Err(err) => {
                    // Transient capture failures must not kill ongoing
                    // monitoring; the previous snapshot stays in place.
                    warn!(error = %err, "metrics capture failed, retrying next tick");
                }
            }
            self.wait_for_next_tick(started.elapsed());
        }
        debug!("sampling loop exited");
    }

    fn notify(&self, snapshot: &Snapshot) {
        let mut slot = self.observer.lock();
        if let Some(observer) = slot.as_mut() {
            if catch_unwind(AssertUnwindSafe(|| observer(snapshot))).is_err() {
                warn!("observer panicked, sampling continues");
            }
        }
    }

    fn wait_for_next_tick(&self, elapsed: Duration) {
        let interval = Duration::from_millis(self.interval_ms.load(Ordering::SeqCst));
        // If capture plus observer already overran the interval, iterate
        // immediately. There is no catch-up burst.
        let mut remaining = interval.saturating_sub(elapsed);
        while !remaining.is_zero() {
            if !self.running.load(Ordering::SeqCst) {
                return;
            }
            let slice = remaining.min(STOP_POLL_SLICE);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
    }
}
