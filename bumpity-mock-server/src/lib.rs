use std::collections::{BTreeMap, HashMap, VecDeque};

use bumpity_api::{
    AuthToken, Comment, CommentId, EntryId, Error, ExpenseId, GuestbookEntry,
    GuestbookEntryCreated, NewComment, NewGuestbookEntry, OwnerToken, UserId, Uuid, Vote,
    VoteRequest, VoteResponse,
};
use chrono::Utc;

mod router;
pub use router::{router, SharedServer};

/// In-memory stand-in for the Bumpity Road server, authoritative for votes,
/// comments and guestbook entries
#[derive(Debug, Default)]
pub struct MockServer {
    users: BTreeMap<UserId, String>,
    sessions: HashMap<AuthToken, UserId>,
    votes: HashMap<ExpenseId, HashMap<UserId, Vote>>,
    comments: Vec<Comment>,
    guestbook: Vec<(GuestbookEntry, OwnerToken)>,
    failures: VecDeque<Error>,
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::default()
    }

    pub fn create_user(&mut self, name: String) -> UserId {
        let id = UserId(Uuid::new_v4());
        self.users.insert(id, name);
        id
    }

    /// Creates a user and opens a session for them, as the authentication
    /// provider would after a successful signup
    pub fn sign_in(&mut self, name: String) -> (UserId, AuthToken) {
        let id = self.create_user(name);
        let tok = AuthToken(Uuid::new_v4());
        self.sessions.insert(tok, id);
        (id, tok)
    }

    pub fn unauth(&mut self, tok: AuthToken) -> Result<(), Error> {
        self.sessions
            .remove(&tok)
            .map(|_| ())
            .ok_or(Error::PermissionDenied)
    }

    pub fn whoami(&self, tok: AuthToken) -> Result<UserId, Error> {
        self.sessions
            .get(&tok)
            .copied()
            .ok_or(Error::PermissionDenied)
    }

    /// Makes the next mutating request fail with `err`, after authentication
    pub fn fail_next(&mut self, err: Error) {
        self.failures.push_back(err);
    }

    fn injected_failure(&mut self) -> Result<(), Error> {
        match self.failures.pop_front() {
            Some(err) => {
                tracing::debug!(?err, "failing request on purpose");
                Err(err)
            }
            None => Ok(()),
        }
    }

    pub fn seed_vote(&mut self, expense: ExpenseId, user: UserId, vote: Vote) {
        self.votes.entry(expense).or_default().insert(user, vote);
    }

    pub fn score(&self, expense: ExpenseId) -> i64 {
        self.votes
            .get(&expense)
            .map(|votes| votes.values().map(|v| v.delta()).sum())
            .unwrap_or(0)
    }

    pub fn vote_of(&self, expense: ExpenseId, user: UserId) -> Option<Vote> {
        self.votes
            .get(&expense)
            .and_then(|votes| votes.get(&user))
            .copied()
    }

    pub fn vote(&mut self, tok: AuthToken, req: VoteRequest) -> Result<VoteResponse, Error> {
        let user = self.whoami(tok)?;
        self.injected_failure()?;
        let votes = self.votes.entry(req.entity_id).or_default();
        match votes.get(&user) {
            Some(v) if *v == req.value => {
                votes.remove(&user);
            }
            _ => {
                votes.insert(user, req.value);
            }
        }
        Ok(VoteResponse {
            vote_score: self.score(req.entity_id),
            user_vote: self.vote_of(req.entity_id, user),
        })
    }

    /// Comments of `expense`, in creation order
    pub fn comments_for(&self, expense: ExpenseId) -> Vec<Comment> {
        self.comments
            .iter()
            .filter(|c| c.parent_id == expense)
            .cloned()
            .collect()
    }

    pub fn create_comment(&mut self, tok: AuthToken, req: NewComment) -> Result<Comment, Error> {
        let user = self.whoami(tok)?;
        req.validate()?;
        self.injected_failure()?;
        let comment = Comment {
            id: CommentId(Uuid::new_v4()),
            content: String::from(req.content.trim()),
            author_id: user,
            parent_id: req.entity_id,
            created_at: Utc::now(),
        };
        self.comments.push(comment.clone());
        Ok(comment)
    }

    pub fn delete_comment(&mut self, tok: AuthToken, id: CommentId) -> Result<(), Error> {
        let user = self.whoami(tok)?;
        self.injected_failure()?;
        let pos = self
            .comments
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::NotFound(id.0))?;
        if self.comments[pos].author_id != user {
            return Err(Error::PermissionDenied);
        }
        self.comments.remove(pos);
        Ok(())
    }

    pub fn guestbook(&self) -> Vec<GuestbookEntry> {
        self.guestbook.iter().map(|(e, _)| e.clone()).collect()
    }

    pub fn sign_guestbook(&mut self, e: NewGuestbookEntry) -> Result<GuestbookEntryCreated, Error> {
        e.validate()?;
        self.injected_failure()?;
        let entry = GuestbookEntry {
            id: EntryId(Uuid::new_v4()),
            name: e.name,
            message: e.message,
            created_at: Utc::now(),
        };
        let owner_token = OwnerToken(Uuid::new_v4());
        self.guestbook.push((entry.clone(), owner_token));
        Ok(GuestbookEntryCreated { entry, owner_token })
    }

    pub fn delete_guestbook_entry(&mut self, id: EntryId, token: OwnerToken) -> Result<(), Error> {
        self.injected_failure()?;
        let pos = self
            .guestbook
            .iter()
            .position(|(e, _)| e.id == id)
            .ok_or(Error::NotFound(id.0))?;
        if self.guestbook[pos].1 != token {
            return Err(Error::PermissionDenied);
        }
        self.guestbook.remove(pos);
        Ok(())
    }
}
