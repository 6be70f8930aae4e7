//! Single-flight bookkeeping for token refresh.
//!
//! One request at a time holds the refresh lease; every other request that
//! observes an expired credential meanwhile parks a waiter in a FIFO queue.
//! The lock is never held across an `.await`.

use log::debug;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;

use crate::error::RequestError;

type Waiter = oneshot::Sender<Result<(), RequestError>>;

#[derive(Default)]
struct RefreshState {
    is_refreshing: bool,
    queue: VecDeque<Waiter>,
}

/// What a request should do after observing an expired credential.
pub(crate) enum Ticket<'a> {
    /// This request runs the refresh and must settle the lease.
    Leader(RefreshLease<'a>),
    /// A refresh is in flight; await its outcome.
    Follower(oneshot::Receiver<Result<(), RequestError>>),
    /// The credential already changed since the request was sent.
    Stale,
}

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decides the caller's role. `is_stale` runs under the lock, so a
    /// refresh cannot complete between the check and the role assignment.
    pub(crate) fn begin(&self, is_stale: impl FnOnce() -> bool) -> Ticket<'_> {
        let mut state = self.lock();

        if state.is_refreshing {
            let (tx, rx) = oneshot::channel();
            state.queue.push_back(tx);
            debug!("Refresh in flight, queued request (position {})", state.queue.len());
            return Ticket::Follower(rx);
        }

        if is_stale() {
            return Ticket::Stale;
        }

        state.is_refreshing = true;
        Ticket::Leader(RefreshLease {
            coordinator: self,
            settled: false,
        })
    }

    /// Resets the flag and releases every queued waiter in arrival order.
    fn settle(&self, outcome: Result<(), RequestError>) {
        let waiters = {
            let mut state = self.lock();
            state.is_refreshing = false;
            std::mem::take(&mut state.queue)
        };

        debug!("Releasing {} queued request(s)", waiters.len());
        for waiter in waiters {
            // A dropped receiver means the caller went away; nothing to deliver.
            let _ = waiter.send(outcome.clone());
        }
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.lock().is_refreshing
    }

    pub(crate) fn queued(&self) -> usize {
        self.lock().queue.len()
    }
}

/// Held by the request running the refresh. Dropping it unsettled (the
/// leader was cancelled) rejects the queue instead of stranding it.
pub(crate) struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    pub(crate) fn settle(mut self, outcome: Result<(), RequestError>) {
        self.settled = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.settle(Err(RequestError::Refresh(
                "refresh was cancelled".to_string(),
            )));
        }
    }
}
