use std::{fmt, sync::Arc, time::Duration};

use crate::{
    api::{Comment, ExpenseId, UserId},
    Backend, CommentController, LogNotifier, Notifier, VoteController, VoteState,
    DEFAULT_REQUEST_TIMEOUT,
};

/// Everything the controllers of one page share: the backend, the current
/// actor and where alerts go
#[derive(Clone)]
pub struct Session {
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) actor: Option<UserId>,
    pub(crate) request_timeout: Option<Duration>,
}

impl Session {
    /// `actor` is `None` for visitors that are not signed in, in which case
    /// every mutating operation is a no-op
    pub fn new(backend: Arc<dyn Backend>, actor: Option<UserId>) -> Session {
        Session {
            backend,
            notifier: Arc::new(LogNotifier),
            actor,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Session {
        self.notifier = notifier;
        self
    }

    /// `None` disables the timeout; requests can then only end through
    /// the backend or an explicit `cancel`
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Session {
        self.request_timeout = timeout;
        self
    }

    pub fn actor(&self) -> Option<UserId> {
        self.actor
    }

    pub fn vote_controller(&self, expense: ExpenseId, initial: VoteState) -> VoteController {
        VoteController::new(self.clone(), expense, initial)
    }

    pub fn comment_controller(&self, expense: ExpenseId, items: Vec<Comment>) -> CommentController {
        CommentController::new(self.clone(), expense, items)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("actor", &self.actor)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}
