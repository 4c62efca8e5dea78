use std::{future::Future, time::Duration};

use futures::future::{AbortHandle, AbortRegistration, Abortable, Aborted};
use parking_lot::{Mutex, MutexGuard};

use crate::api;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] api::Error),

    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),

    #[error("request timed out")]
    TimedOut,

    #[error("request cancelled")]
    Cancelled,

    #[error("local storage error: {0:#}")]
    Storage(anyhow::Error),
}

/// Mutation state of a controller. At most one mutating request is in flight
/// per controller, and it can always be aborted through its handle.
#[derive(Debug, Default)]
pub(crate) enum Phase {
    #[default]
    Idle,
    Pending(AbortHandle),
}

impl Phase {
    pub(crate) fn is_pending(&self) -> bool {
        matches!(self, Phase::Pending(_))
    }

    /// Moves to `Pending`, returning the registration the request must be
    /// wrapped with for `cancel` to reach it
    pub(crate) fn begin(&mut self) -> AbortRegistration {
        let (handle, registration) = AbortHandle::new_pair();
        *self = Phase::Pending(handle);
        registration
    }

    pub(crate) fn cancel(&self) -> bool {
        match self {
            Phase::Idle => false,
            Phase::Pending(handle) => {
                handle.abort();
                true
            }
        }
    }
}

/// Runs `abandon` on the controller state if dropped before `land`, so that
/// a caller dropping the in-flight future cannot leave the controller stuck
/// in `Pending`.
pub(crate) struct Flight<'a, T, F: FnOnce(&mut T)> {
    state: &'a Mutex<T>,
    abandon: Option<F>,
}

impl<'a, T, F: FnOnce(&mut T)> Flight<'a, T, F> {
    pub(crate) fn new(state: &'a Mutex<T>, abandon: F) -> Self {
        Flight {
            state,
            abandon: Some(abandon),
        }
    }

    /// The request resolved: disarm and hand back the locked state for reconciliation
    pub(crate) fn land(mut self) -> MutexGuard<'a, T> {
        let state = self.state;
        self.abandon = None;
        state.lock()
    }
}

impl<'a, T, F: FnOnce(&mut T)> Drop for Flight<'a, T, F> {
    fn drop(&mut self) {
        if let Some(abandon) = self.abandon.take() {
            tracing::debug!("in-flight request dropped before completion");
            abandon(&mut *self.state.lock());
        }
    }
}

/// Registration for a request nobody can abort, only time out
pub(crate) fn detached() -> AbortRegistration {
    AbortHandle::new_pair().1
}

/// Drives one backend request to completion, folding timeouts and
/// cancellations into `Error`
pub(crate) async fn submit<T, Fut>(
    req: Fut,
    timeout: Option<Duration>,
    registration: AbortRegistration,
) -> Result<T, Error>
where
    Fut: Future<Output = Result<T, Error>>,
{
    let req = Abortable::new(req, registration);
    let res = match timeout {
        Some(t) => tokio::time::timeout(t, req)
            .await
            .map_err(|_| Error::TimedOut)?,
        None => req.await,
    };
    res.map_err(|Aborted| Error::Cancelled)?
}
