//! # Session Lifecycle Controller
//!
//! This module owns the state, timing, and concurrency of a monitoring
//! session. [`ResourceMonitor::start`] spawns exactly one background task
//! that samples resources at a fixed cadence and folds each reading into the
//! session's [`PerformanceResult`]; the returned [`MonitorSession`] is the
//! owned handle for observing and terminating that task.
//!
//! ## Concurrency model
//!
//! Exactly two logical threads of control interact: the caller and the
//! sampling task. The task is the sole writer of the record; the caller may
//! take [`snapshot`](MonitorSession::snapshot)s concurrently through the
//! shared lock, and [`stop`](MonitorSession::stop) joins the task before
//! returning, so no mutation happens after it resolves. Cancellation is
//! cooperative: a shared flag polled at the top of each iteration, which a
//! running tick can take up to one full interval to notice.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use metrics::gauge;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::errors::{error_logging, MonitorError, MonitorResult};
use crate::result::PerformanceResult;
use crate::sampler::{ResourceSampler, SystemSampler};

const STATE_RUNNING: u8 = 0;
const STATE_STOPPED: u8 = 1;
const STATE_TIMED_OUT: u8 = 2;

/// Terminal and non-terminal states of a monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The background task is sampling
    Running,
    /// Terminated by an explicit stop request
    Stopped,
    /// Self-terminated when the wall-clock bound elapsed
    TimedOut,
}

impl SessionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            STATE_STOPPED => SessionState::Stopped,
            STATE_TIMED_OUT => SessionState::TimedOut,
            _ => SessionState::Running,
        }
    }
}

/// State shared between the session handle and its background task
struct SessionShared {
    record: RwLock<PerformanceResult>,
    stop_requested: AtomicBool,
    state: AtomicU8,
}

/// Lifecycle controller for monitoring sessions
///
/// Enforces the one-active-session rule: a second [`start`](Self::start)
/// while a session from this monitor is still running fails with
/// [`MonitorError::SessionAlreadyActive`]. Session state itself lives in the
/// [`MonitorSession`] returned by `start`, not in the monitor.
pub struct ResourceMonitor {
    active: Arc<AtomicBool>,
}

impl ResourceMonitor {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Begin a new monitoring session for the current process
    ///
    /// Validates `config`, captures the logical core count, and spawns the
    /// background sampling task. Does not block the caller.
    pub fn start(&self, config: &MonitorConfig) -> MonitorResult<MonitorSession> {
        let sampler = SystemSampler::new()?;
        self.start_with_sampler(config, sampler)
    }

    /// Begin a session with a caller-supplied sampler
    ///
    /// The seam used by tests to run the loop against scripted readings.
    pub fn start_with_sampler<S>(
        &self,
        config: &MonitorConfig,
        sampler: S,
    ) -> MonitorResult<MonitorSession>
    where
        S: ResourceSampler + 'static,
    {
        config.validate()?;

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MonitorError::SessionAlreadyActive);
        }

        let shared = Arc::new(SessionShared {
            record: RwLock::new(PerformanceResult::new(sampler.total_cpus())),
            stop_requested: AtomicBool::new(false),
            state: AtomicU8::new(STATE_RUNNING),
        });

        info!(
            max_duration_secs = config.max_duration_secs,
            interval_secs = config.interval_secs,
            total_cpus = sampler.total_cpus(),
            "Monitoring session started"
        );

        let handle = tokio::spawn(sampling_loop(
            Arc::clone(&shared),
            Arc::clone(&self.active),
            config.max_duration(),
            config.interval(),
            sampler,
        ));

        Ok(MonitorSession {
            shared,
            handle: Some(handle),
        })
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned handle to one monitoring session
///
/// Created by [`ResourceMonitor::start`]. Dropping the handle does not stop
/// the task; the session then runs to its wall-clock bound on its own.
pub struct MonitorSession {
    shared: Arc<SessionShared>,
    handle: Option<JoinHandle<()>>,
}

impl MonitorSession {
    /// Current state of the session
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Clone the record as it stands right now
    ///
    /// Safe to call while the session runs; the snapshot is internally
    /// consistent but may lag the tick in progress.
    pub fn snapshot(&self) -> PerformanceResult {
        self.shared.record.read().clone()
    }

    /// Request cooperative termination and wait for the task to exit
    ///
    /// When this resolves, the background task has fully terminated and the
    /// record will not be mutated again. Calling it on an already-terminated
    /// session just returns the final record. A task that died to a fault
    /// still yields the data collected up to that point.
    pub async fn stop(&mut self) -> MonitorResult<PerformanceResult> {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
        self.join().await
    }

    /// Wait for the session to terminate on its own (wall-clock bound)
    pub async fn wait(&mut self) -> MonitorResult<PerformanceResult> {
        self.join().await
    }

    async fn join(&mut self) -> MonitorResult<PerformanceResult> {
        if let Some(handle) = self.handle.take() {
            // A join error means the task aborted; the finalizer has already
            // marked the session terminated, so keep the partial record
            // instead of discarding it.
            if let Err(e) = handle.await {
                error_logging::log_monitor_fault(&e, "sampling task join");
            }
        }
        Ok(self.shared.record.read().clone())
    }
}

/// Ensures the session is observably terminated on every exit path of the
/// sampling loop. If the loop unwinds without reaching `finish`, the drop
/// handler stores a terminal state and clears the active-session guard, so
/// the session never reports `Running` forever and the monitor can start
/// again.
struct SessionFinalizer {
    shared: Arc<SessionShared>,
    active: Arc<AtomicBool>,
    started: Instant,
    completed: bool,
}

impl SessionFinalizer {
    fn finish(mut self, terminal_state: u8) {
        self.apply(terminal_state);
        self.completed = true;
    }

    fn apply(&self, terminal_state: u8) {
        {
            let mut record = self.shared.record.write();
            record.total_time = self.started.elapsed().as_secs_f64();
        }
        self.shared.state.store(terminal_state, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for SessionFinalizer {
    fn drop(&mut self) {
        if !self.completed {
            self.apply(STATE_STOPPED);
            error_logging::log_monitor_fault(
                &"sampling loop unwound",
                "session terminated with partial data",
            );
        }
    }
}

/// Render a panic payload for logging
fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The background sampling loop
///
/// Per tick: check the termination conditions, read the sensors, fold the
/// reading into the record, emit the progress side-channel, sleep. A failed
/// read skips the tick without touching the peaks; a panicking sampler is
/// caught and treated as session termination with the data collected so far
/// preserved. Termination on any path freezes `total_time` and clears the
/// monitor's active-session guard.
async fn sampling_loop<S: ResourceSampler>(
    shared: Arc<SessionShared>,
    active: Arc<AtomicBool>,
    max_duration: Duration,
    interval: Duration,
    mut sampler: S,
) {
    let started = Instant::now();
    let mut ticks: u64 = 0;
    let mut skipped: u64 = 0;
    let finalizer = SessionFinalizer {
        shared: Arc::clone(&shared),
        active,
        started,
        completed: false,
    };

    let terminal_state = loop {
        if shared.stop_requested.load(Ordering::SeqCst) {
            break STATE_STOPPED;
        }
        if started.elapsed() >= max_duration {
            break STATE_TIMED_OUT;
        }

        match panic::catch_unwind(AssertUnwindSafe(|| sampler.sample())) {
            Ok(Ok(reading)) => {
                let timestamp = Local::now();
                let mut record = shared.record.write();
                let sample = record.record_sample(timestamp, &reading);
                record.total_time = started.elapsed().as_secs_f64();
                let peak_memory = record.peak_memory_global;
                let peak_cpu = record.peak_cpu_global;
                // Guard released before the sleep so readers see this tick
                drop(record);

                ticks += 1;
                gauge!("tracking_memory_mib").set(sample.current_memory);
                gauge!("tracking_cpu_cores").set(sample.current_cpu_usage);
                debug!(
                    memory_mib = sample.current_memory,
                    cpu_cores = sample.current_cpu_usage,
                    peak_memory_mib = peak_memory,
                    peak_cpu_cores = peak_cpu,
                    tick = ticks,
                    "Resource sample recorded"
                );
            }
            Ok(Err(e)) => {
                skipped += 1;
                error_logging::log_sample_error(&e, ticks);
            }
            Err(payload) => {
                error_logging::log_monitor_fault(
                    &panic_detail(payload.as_ref()),
                    "sampler panicked",
                );
                break STATE_STOPPED;
            }
        }

        tokio::time::sleep(interval).await;
    };

    finalizer.finish(terminal_state);

    let record = shared.record.read();
    info!(
        total_time_secs = record.total_time,
        peak_memory_mib = record.peak_memory_global,
        peak_cpu_cores = record.peak_cpu_global,
        total_cpus = record.total_cpus,
        samples = ticks,
        skipped_samples = skipped,
        timed_out = (terminal_state == STATE_TIMED_OUT),
        "Monitoring session finished"
    );
}
