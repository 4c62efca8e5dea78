use parking_lot::Mutex;

use crate::{
    api::{ExpenseId, Vote, VoteRequest, VoteResponse},
    request::{self, Flight, Phase},
    Error, Session,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VoteState {
    pub score: i64,
    pub own_vote: Option<Vote>,
}

impl VoteState {
    /// What the actor expects to see right after clicking `value`: clicking
    /// the current vote again retracts it, clicking the other one flips it
    pub fn after_click(self, value: Vote) -> VoteState {
        match self.own_vote {
            Some(v) if v == value => VoteState {
                score: self.score.saturating_sub(value.delta()),
                own_vote: None,
            },
            Some(previous) => VoteState {
                score: self
                    .score
                    .saturating_sub(previous.delta())
                    .saturating_add(value.delta()),
                own_vote: Some(value),
            },
            None => VoteState {
                score: self.score.saturating_add(value.delta()),
                own_vote: Some(value),
            },
        }
    }
}

impl From<VoteResponse> for VoteState {
    fn from(r: VoteResponse) -> VoteState {
        VoteState {
            score: r.vote_score,
            own_vote: r.user_vote,
        }
    }
}

#[derive(Debug)]
pub enum VoteOutcome {
    /// No actor, or another vote was still in flight: nothing happened
    Ignored,

    /// The server accepted the vote, and this is its view of the result
    Confirmed(VoteState),

    /// The request failed and the state from before the click was restored
    RolledBack(Error),
}

#[derive(Debug)]
struct Inner {
    state: VoteState,
    phase: Phase,
}

/// Score and own vote of a single expense, updated optimistically
#[derive(Debug)]
pub struct VoteController {
    session: Session,
    expense: ExpenseId,
    inner: Mutex<Inner>,
}

impl VoteController {
    pub(crate) fn new(session: Session, expense: ExpenseId, initial: VoteState) -> VoteController {
        VoteController {
            session,
            expense,
            inner: Mutex::new(Inner {
                state: initial,
                phase: Phase::Idle,
            }),
        }
    }

    pub fn expense(&self) -> ExpenseId {
        self.expense
    }

    /// Current state, speculative while `is_pending`
    pub fn state(&self) -> VoteState {
        self.inner.lock().state
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock().phase.is_pending()
    }

    /// Aborts the in-flight vote, if any. The pending `cast_vote` then
    /// rolls back as for any other failure.
    pub fn cancel(&self) -> bool {
        self.inner.lock().phase.cancel()
    }

    pub async fn cast_vote(&self, value: Vote) -> VoteOutcome {
        if self.session.actor.is_none() {
            tracing::debug!(expense = ?self.expense, "ignoring vote from signed-out visitor");
            return VoteOutcome::Ignored;
        }

        let (before, registration) = {
            let mut inner = self.inner.lock();
            if inner.phase.is_pending() {
                tracing::debug!(
                    expense = ?self.expense,
                    "ignoring vote while another one is in flight"
                );
                return VoteOutcome::Ignored;
            }
            let before = inner.state;
            inner.state = before.after_click(value);
            (before, inner.phase.begin())
        };
        let flight = Flight::new(&self.inner, move |inner: &mut Inner| {
            inner.state = before;
            inner.phase = Phase::Idle;
        });

        let req = VoteRequest {
            entity_id: self.expense,
            value,
        };
        let res = request::submit(
            self.session.backend.cast_vote(req),
            self.session.request_timeout,
            registration,
        )
        .await;

        let mut inner = flight.land();
        inner.phase = Phase::Idle;
        match res {
            Ok(resp) => {
                inner.state = VoteState::from(resp);
                tracing::debug!(expense = ?self.expense, state = ?inner.state, "vote confirmed");
                VoteOutcome::Confirmed(inner.state)
            }
            Err(err) => {
                inner.state = before;
                drop(inner);
                tracing::warn!(expense = ?self.expense, ?err, "vote failed, rolled back");
                self.session
                    .notifier
                    .alert("Your vote could not be recorded, please try again.");
                VoteOutcome::RolledBack(err)
            }
        }
    }
}
