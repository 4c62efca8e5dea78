mod backend;
pub use backend::{Backend, GuestbookBackend};

mod comment;
pub use comment::{CommentController, CommentOutcome, DeleteOutcome};

mod config;
pub use config::{ClientConfig, DEFAULT_HOST, DEFAULT_REQUEST_TIMEOUT};

mod http;
pub use http::HttpBackend;

mod notify;
pub use notify::{LogNotifier, Notifier};

mod ownership;
pub use ownership::{FileStore, GuestbookOwnership, KeyValueStore, MemoryStore};

mod request;
pub use request::Error;

mod session;
pub use session::Session;

mod vote;
pub use vote::{VoteController, VoteOutcome, VoteState};

#[cfg(test)]
mod test_util;

pub mod api {
    pub use bumpity_api::*;
}
