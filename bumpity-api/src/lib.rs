use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod comment;
pub use comment::{Comment, CommentCreated, CommentId, NewComment};

mod error;
pub use error::Error;

mod guestbook;
pub use guestbook::{
    EntryId, GuestbookEntry, GuestbookEntryCreated, NewGuestbookEntry, OwnerToken,
};

mod user;
pub use user::{AuthToken, UserId};

mod vote;
pub use vote::{ExpenseId, Vote, VoteRequest, VoteResponse};

// the server stores text in postgres, which rejects null bytes
pub(crate) fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}
