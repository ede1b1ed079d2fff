//! Cancellable debounce and request sequencing.
//!
//! [`Debouncer`] keeps exactly one scheduled task. Scheduling again aborts the
//! previous task, whether it is still waiting out the quiet period or already
//! running its work, and spawns a fresh one. Every schedule is stamped with a
//! [`RequestTicket`] from a [`RequestSequencer`] so that a response which
//! still slips through can be recognised as stale and dropped.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Monotonically increasing id attached to each scheduled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues tickets and decides whether a ticket is still the latest one.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    /// Retire every ticket issued so far without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }
}

/// Cancel-previous, schedule-new timer for a single kind of request.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    sequencer: RequestSequencer,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            sequencer: RequestSequencer::new(),
        }
    }

    /// Abort whatever is scheduled and run `task` after the quiet period.
    ///
    /// `task` receives the ticket of this schedule so it can tag its result.
    pub fn schedule<F, Fut>(&mut self, task: F) -> RequestTicket
    where
        F: FnOnce(RequestTicket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.abort_pending();
        let ticket = self.sequencer.issue();
        let delay = self.delay;
        trace!(ticket = ticket.value(), ?delay, "debounce scheduled");

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task(ticket).await;
        }));
        ticket
    }

    /// Abort the scheduled task and retire its ticket.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.sequencer.invalidate();
    }

    /// A task is scheduled and has not finished yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.sequencer.is_current(ticket)
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                trace!("debounce: aborting previous task");
                handle.abort();
            }
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
