use std::collections::HashSet;

use anyhow::anyhow;
use parking_lot::Mutex;

use crate::{
    api::{Comment, CommentId, ExpenseId, NewComment},
    request::{self, Flight, Phase},
    Error, Session,
};

#[derive(Debug)]
pub enum CommentOutcome {
    /// Empty draft, no actor, or a submission already in flight
    Ignored,

    /// The comment as stored by the server, now appended to the list
    Posted(Comment),

    /// Nothing was appended and the draft was kept for a retry
    Failed(Error),
}

#[derive(Debug)]
pub enum DeleteOutcome {
    /// No actor, or no such comment in the list
    Ignored,
    Deleted,

    /// The comment stays removed locally even though the server may still have it
    Failed(Error),
}

#[derive(Debug)]
struct Inner {
    // insertion order, never re-sorted
    items: Vec<Comment>,
    draft: String,
    phase: Phase,
}

/// Comment thread of a single expense.
///
/// New comments only show up once the server confirmed them, while deletions
/// are applied immediately and never rolled back.
#[derive(Debug)]
pub struct CommentController {
    session: Session,
    expense: ExpenseId,
    inner: Mutex<Inner>,
}

impl CommentController {
    pub(crate) fn new(
        session: Session,
        expense: ExpenseId,
        mut items: Vec<Comment>,
    ) -> CommentController {
        let mut seen = HashSet::new();
        items.retain(|c| {
            if c.parent_id != expense {
                tracing::warn!(
                    comment = ?c.id,
                    parent = ?c.parent_id,
                    ?expense,
                    "dropping comment attached to another expense"
                );
                return false;
            }
            if !seen.insert(c.id) {
                tracing::warn!(comment = ?c.id, "dropping duplicate comment");
                return false;
            }
            true
        });
        CommentController {
            session,
            expense,
            inner: Mutex::new(Inner {
                items,
                draft: String::new(),
                phase: Phase::Idle,
            }),
        }
    }

    pub fn expense(&self) -> ExpenseId {
        self.expense
    }

    pub fn items(&self) -> Vec<Comment> {
        self.inner.lock().items.clone()
    }

    pub fn draft(&self) -> String {
        self.inner.lock().draft.clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.inner.lock().draft = text.into();
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.lock().phase.is_pending()
    }

    /// Aborts the in-flight submission, if any
    pub fn cancel(&self) -> bool {
        self.inner.lock().phase.cancel()
    }

    pub async fn submit_comment(&self) -> CommentOutcome {
        if self.session.actor.is_none() {
            tracing::debug!(expense = ?self.expense, "ignoring comment from signed-out visitor");
            return CommentOutcome::Ignored;
        }

        let (content, registration) = {
            let mut inner = self.inner.lock();
            if inner.phase.is_pending() {
                tracing::debug!(
                    expense = ?self.expense,
                    "ignoring comment while another one is being submitted"
                );
                return CommentOutcome::Ignored;
            }
            let content = inner.draft.trim();
            if content.is_empty() {
                return CommentOutcome::Ignored;
            }
            let content = String::from(content);
            (content, inner.phase.begin())
        };
        let flight = Flight::new(&self.inner, |inner: &mut Inner| inner.phase = Phase::Idle);

        let req = NewComment {
            entity_id: self.expense,
            content,
        };
        let res = request::submit(
            self.session.backend.create_comment(req),
            self.session.request_timeout,
            registration,
        )
        .await
        .and_then(|c| match c.parent_id == self.expense {
            true => Ok(c),
            false => Err(Error::Transport(anyhow!(
                "server attached new comment {:?} to {:?} instead of {:?}",
                c.id,
                c.parent_id,
                self.expense,
            ))),
        });

        let mut inner = flight.land();
        inner.phase = Phase::Idle;
        match res {
            Ok(comment) => {
                if inner.items.iter().any(|c| c.id == comment.id) {
                    tracing::warn!(comment = ?comment.id, "server returned a known comment");
                } else {
                    inner.items.push(comment.clone());
                }
                inner.draft.clear();
                CommentOutcome::Posted(comment)
            }
            Err(err) => {
                drop(inner);
                tracing::warn!(expense = ?self.expense, ?err, "failed posting comment");
                self.session
                    .notifier
                    .alert("Your comment could not be posted, please try again.");
                CommentOutcome::Failed(err)
            }
        }
    }

    pub async fn delete_comment(&self, id: CommentId) -> DeleteOutcome {
        if self.session.actor.is_none() {
            tracing::debug!(comment = ?id, "ignoring deletion from signed-out visitor");
            return DeleteOutcome::Ignored;
        }

        {
            let mut inner = self.inner.lock();
            match inner.items.iter().position(|c| c.id == id) {
                Some(pos) => inner.items.remove(pos),
                None => {
                    tracing::debug!(comment = ?id, "ignoring deletion of unknown comment");
                    return DeleteOutcome::Ignored;
                }
            };
        }

        let res = request::submit(
            self.session.backend.delete_comment(id),
            self.session.request_timeout,
            request::detached(),
        )
        .await;
        match res {
            Ok(()) => {
                tracing::debug!(comment = ?id, "comment deleted");
                DeleteOutcome::Deleted
            }
            Err(err) => {
                // TODO: decide with product whether failed deletions should be restored like votes
                tracing::error!(
                    comment = ?id,
                    ?err,
                    "failed deleting comment, local list may be out of sync"
                );
                DeleteOutcome::Failed(err)
            }
        }
    }
}
