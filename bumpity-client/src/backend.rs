use async_trait::async_trait;

use crate::{
    api::{
        Comment, CommentId, EntryId, GuestbookEntryCreated, NewComment, NewGuestbookEntry,
        OwnerToken, VoteRequest, VoteResponse,
    },
    Error,
};

/// The expense endpoints the controllers talk to. Implementations carry the
/// actor's credentials themselves.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn cast_vote(&self, req: VoteRequest) -> Result<VoteResponse, Error>;
    async fn create_comment(&self, req: NewComment) -> Result<Comment, Error>;
    async fn delete_comment(&self, id: CommentId) -> Result<(), Error>;
}

#[async_trait]
pub trait GuestbookBackend: Send + Sync {
    async fn sign_guestbook(
        &self,
        entry: NewGuestbookEntry,
    ) -> Result<GuestbookEntryCreated, Error>;
    async fn delete_guestbook_entry(&self, id: EntryId, token: OwnerToken) -> Result<(), Error>;
}
