//! Periodic task scheduler: one background thread, one cadence per task.
//!
//! Replaces ad-hoc countdown/reschedule callbacks with a single timer loop,
//! decoupled from whatever redraw cycle an adapter runs. The thread ticks at
//! a fixed resolution and fires each task whose cadence has elapsed. A task
//! never runs on more than one thread; an in-flight job is not cancellable,
//! only future ticks are.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

/// A named job fired at a fixed cadence.
pub struct Task {
    name: &'static str,
    cadence: Duration,
    last_run: Option<Instant>,
    job: Box<dyn FnMut() + Send>,
}

impl Task {
    pub fn new(name: &'static str, cadence: Duration, job: impl FnMut() + Send + 'static) -> Self {
        Self {
            name,
            cadence,
            last_run: None,
            job: Box::new(job),
        }
    }

    fn due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.duration_since(last) >= self.cadence,
        }
    }
}

/// Owns the background timer thread. Stops (and joins) on [`stop`](Self::stop)
/// or drop.
pub struct Scheduler {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Start the timer thread with the default 1-second tick resolution.
    pub fn start(tasks: Vec<Task>) -> Self {
        Self::start_with_tick(tasks, Duration::from_secs(1))
    }

    /// Start with a custom tick resolution (tests use a short one).
    pub fn start_with_tick(mut tasks: Vec<Task>, tick: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("bitforcast-scheduler".into())
            .spawn(move || {
                while !stop_flag.load(Ordering::Acquire) {
                    let now = Instant::now();
                    for task in &mut tasks {
                        if task.due(now) {
                            debug!(task = task.name, "firing scheduled task");
                            task.last_run = Some(now);
                            (task.job)();
                        }
                    }
                    thread::sleep(tick);
                }
            })
            .expect("failed to spawn scheduler thread");

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Signal the timer loop to exit and wait for it.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
