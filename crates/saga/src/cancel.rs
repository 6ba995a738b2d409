//! Caller-side cancellation and deadlines.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::ExecutionErrorKind;

/// Creates a linked cancel handle and signal.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// The caller's side: flips the signal once.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancels every signal cloned from this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns a signal observing this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// The workflow's side: observed at every step boundary.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Returns true once the handle has cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Pends forever if the handle is dropped first.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Per-call execution controls.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    cancel: Option<CancelSignal>,
    deadline: Option<Instant>,
}

impl ExecutionOptions {
    /// Creates options with no cancel signal and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a cancel signal.
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Applies `timeout` only when no deadline was set explicitly.
    pub fn or_timeout(self, timeout: Option<Duration>) -> Self {
        match (self.deadline, timeout) {
            (None, Some(timeout)) => self.with_timeout(timeout),
            _ => self,
        }
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the run should stop now, if it should.
    pub fn interruption(&self) -> Option<ExecutionErrorKind> {
        if self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            return Some(ExecutionErrorKind::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ExecutionErrorKind::TimedOut),
            _ => None,
        }
    }

    /// Resolves when the run is cancelled or its deadline passes.
    pub async fn interrupted(&self) -> ExecutionErrorKind {
        let cancelled = async {
            match &self.cancel {
                Some(signal) => signal.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            () = cancelled => ExecutionErrorKind::Cancelled,
            () = expired => ExecutionErrorKind::TimedOut,
        }
    }

    /// Races `fut` against interruption.
    ///
    /// Only use this for futures without side effects: a lost race drops
    /// `fut` wherever it was.
    pub async fn guard<T>(&self, fut: impl Future<Output = T>) -> Result<T, ExecutionErrorKind> {
        tokio::select! {
            biased;
            kind = self.interrupted() => Err(kind),
            value = fut => Ok(value),
        }
    }
}
