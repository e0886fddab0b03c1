//! Debounce control
//!
//! Coalesces rapid input changes into settled values. Split in two:
//! - [`Debouncer`]: a synchronous timer state machine (pending value, burst start,
//!   last input). Callers feed it values and clock readings.
//! - [`DebounceController`]: a tokio task that drives a `Debouncer` from a channel
//!   and sleeps until the next deadline.
//!
//! # Semantics
//! - A new value restarts the quiet-period timer.
//! - `trailing`: emit the latest value once input has been quiet for `wait`.
//! - `leading`: emit the first value of a burst immediately.
//! - `max_wait`: a burst never defers emission longer than this; when exceeded the
//!   pending value is emitted and a new max-wait window starts.
//! - A value equal to the last emitted one (per the equality function) is dropped.

use crate::options::DebounceBehavior;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Equality used to suppress unchanged emissions
pub type EqualityFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Debounce timer state machine
pub struct Debouncer<T> {
    wait: Duration,
    behavior: DebounceBehavior,
    equality: EqualityFn<T>,
    last_emitted: Option<T>,
    pending: Option<T>,
    /// Start of the current burst (and of the current max-wait window)
    burst_started: Option<Instant>,
    last_input: Option<Instant>,
}

impl<T: Clone + PartialEq + 'static> Debouncer<T> {
    /// Debouncer using `PartialEq` to detect unchanged values
    pub fn new(wait: Duration, behavior: DebounceBehavior) -> Self {
        Self::with_equality(wait, behavior, Arc::new(|a: &T, b: &T| a == b))
    }
}

impl<T: Clone> Debouncer<T> {
    /// Debouncer with a custom equality function
    pub fn with_equality(wait: Duration, behavior: DebounceBehavior, equality: EqualityFn<T>) -> Self {
        Self {
            wait,
            behavior,
            equality,
            last_emitted: None,
            pending: None,
            burst_started: None,
            last_input: None,
        }
    }

    /// Treat `value` as already emitted, so pushing it again emits nothing
    pub fn seeded(mut self, value: T) -> Self {
        self.last_emitted = Some(value);
        self
    }

    pub fn last_emitted(&self) -> Option<&T> {
        self.last_emitted.as_ref()
    }

    /// True while a value is waiting for the quiet period to elapse
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed a new input value
    ///
    /// Returns a value to emit immediately (leading edge or max-wait overflow).
    pub fn push(&mut self, value: T, now: Instant) -> Option<T> {
        self.last_input = Some(now);

        let Some(started) = self.burst_started else {
            self.burst_started = Some(now);
            if self.behavior.leading {
                self.pending = None;
                return self.emit(value);
            }
            self.pending = Some(value);
            return None;
        };

        self.pending = Some(value);
        if self.max_wait_exceeded(started, now) {
            self.burst_started = Some(now);
            return self.flush();
        }
        None
    }

    /// Advance the clock
    ///
    /// Returns a value to emit if a deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let (started, last_input) = match (self.burst_started, self.last_input) {
            (Some(started), Some(last_input)) => (started, last_input),
            _ => return None,
        };

        if now >= last_input + self.wait {
            self.burst_started = None;
            self.last_input = None;
            let pending = self.pending.take();
            if !self.behavior.trailing {
                return None;
            }
            return pending.and_then(|value| self.emit(value));
        }

        if self.pending.is_some() && self.max_wait_exceeded(started, now) {
            self.burst_started = Some(now);
            return self.flush();
        }
        None
    }

    /// Next instant at which `poll` may emit
    pub fn deadline(&self) -> Option<Instant> {
        let started = self.burst_started?;
        let quiet = self.last_input? + self.wait;
        match (self.behavior.max_wait, &self.pending) {
            (Some(max_wait), Some(_)) => Some(quiet.min(started + max_wait)),
            _ => Some(quiet),
        }
    }

    fn max_wait_exceeded(&self, started: Instant, now: Instant) -> bool {
        self.behavior
            .max_wait
            .is_some_and(|max_wait| now.duration_since(started) >= max_wait)
    }

    fn flush(&mut self) -> Option<T> {
        self.pending.take().and_then(|value| self.emit(value))
    }

    fn emit(&mut self, value: T) -> Option<T> {
        if let Some(last) = &self.last_emitted {
            if (self.equality)(last, &value) {
                return None;
            }
        }
        self.last_emitted = Some(value.clone());
        Some(value)
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("wait", &self.wait)
            .field("behavior", &self.behavior)
            .field("pending", &self.pending.is_some())
            .field("burst_started", &self.burst_started)
            .finish()
    }
}

/// Async driver for a [`Debouncer`]
///
/// Values pushed in are debounced; settled values are sent to the output channel.
/// Dropping or stopping the controller ends the task without flushing.
pub struct DebounceController<T> {
    input_tx: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Clone + Send + 'static> DebounceController<T> {
    /// Spawn the driver task on the current tokio runtime
    pub fn spawn(debouncer: Debouncer<T>, settled_tx: mpsc::UnboundedSender<T>) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_debouncer(debouncer, input_rx, settled_tx));
        Self { input_tx, task }
    }

    /// Feed a value; returns false if the driver has stopped
    pub fn push(&self, value: T) -> bool {
        self.input_tx.send(value).is_ok()
    }

    /// Stop the driver; pending values are discarded
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished() || self.input_tx.is_closed()
    }
}

impl<T> Drop for DebounceController<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_debouncer<T: Clone>(
    mut debouncer: Debouncer<T>,
    mut input_rx: mpsc::UnboundedReceiver<T>,
    settled_tx: mpsc::UnboundedSender<T>,
) {
    loop {
        let deadline = debouncer.deadline();

        let settled = tokio::select! {
            value = input_rx.recv() => match value {
                Some(value) => debouncer.push(value, Instant::now()),
                None => break,
            },
            _ = sleep_until_deadline(deadline) => debouncer.poll(Instant::now()),
        };

        if let Some(value) = settled {
            trace!("Debounced value settled");
            if settled_tx.send(value).is_err() {
                break;
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
