use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::sampler::{MetricsSampler, Sample};

struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives the [`MetricsSampler`] at a fixed cadence and delivers each
/// `Sample` to the tick callback.
///
/// Two states only: stopped and running. Ticks are sequential on one
/// worker — at most one sample computation is in flight, and a tick that
/// overruns the interval delays the next tick rather than overlapping it.
/// The sampler's probe handles are created on `start` and released when
/// the worker exits.
pub struct SamplingScheduler {
    worker: Option<Worker>,
}

impl SamplingScheduler {
    pub fn new() -> Self {
        Self { worker: None }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Begin periodic ticking. The first sample is taken immediately; its
    /// CPU reading is the documented warm-up artifact. Calling `start`
    /// while already running is a logged no-op.
    pub fn start<F>(&mut self, interval: Duration, mut on_tick: F)
    where
        F: FnMut(Sample) + Send + 'static,
    {
        if self.worker.is_some() {
            log::warn!("sampling scheduler already running, ignoring start");
            return;
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = std::thread::spawn(move || {
            let mut sampler = MetricsSampler::new();
            loop {
                let tick_started = Instant::now();
                let sample = sampler.sample();
                if catch_unwind(AssertUnwindSafe(|| on_tick(sample))).is_err() {
                    log::error!("tick handler panicked, sampling continues");
                }
                // Wait out the remainder of the interval, waking early only
                // for stop. An overrun leaves no remainder and the next
                // tick runs immediately.
                let wait = interval.saturating_sub(tick_started.elapsed());
                match stop_rx.recv_timeout(wait) {
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }
            // Sampler drops here: probe handles released.
        });

        self.worker = Some(Worker { stop_tx, handle });
    }

    /// Stop ticking. Idempotent. Joins the worker, so once this returns no
    /// further tick callback will run.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                log::error!("sampling worker panicked");
            }
        }
    }
}

impl Default for SamplingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SamplingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_delivers_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let mut scheduler = SamplingScheduler::new();
        scheduler.start(Duration::from_millis(10), move |sample| {
            assert!(sample.timestamp > 0.0);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // The first tick fires immediately; wait for at least one more.
        let deadline = Instant::now() + Duration::from_secs(5);
        while ticks.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        scheduler.stop();
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_no_ticks_after_stop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let mut scheduler = SamplingScheduler::new();
        scheduler.start(Duration::from_millis(5), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        while ticks.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        scheduler.stop();
        assert!(!scheduler.is_running());

        let after_stop = ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut scheduler = SamplingScheduler::new();
        scheduler.start(Duration::from_millis(10), |_| {});
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());

        // Stopping a scheduler that never ran is fine too.
        let mut never_started = SamplingScheduler::new();
        never_started.stop();
    }

    #[test]
    fn test_panicking_tick_handler_does_not_kill_worker() {
        let _ = env_logger::builder().is_test(true).try_init();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let mut scheduler = SamplingScheduler::new();
        scheduler.start(Duration::from_millis(5), move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                panic!("first tick handler failure");
            }
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while ticks.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        scheduler.stop();
        assert!(ticks.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let mut scheduler = SamplingScheduler::new();
        scheduler.start(Duration::from_millis(10), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        // Second start must not replace the running worker.
        scheduler.start(Duration::from_millis(10), |_| {
            panic!("replacement callback must never run");
        });
        assert!(scheduler.is_running());
        scheduler.stop();
    }
}
