use std::{collections::VecDeque, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::{
    api::{
        Comment, CommentId, ExpenseId, NewComment, UserId, Uuid, VoteRequest, VoteResponse,
    },
    Backend, Error, Notifier, Session,
};

macro_rules! do_tokio_test {
    ( $name:ident, $typ:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = std::panic::AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$typ>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}
pub(crate) use do_tokio_test;

pub(crate) type Reply<T> = oneshot::Sender<Result<T, Error>>;
type Replies<T> = Mutex<VecDeque<oneshot::Receiver<Result<T, Error>>>>;

/// Backend whose answers are handed out by the test, one `expect_*` per
/// request. Requests with no queued answer never complete.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    pub votes: Mutex<Vec<VoteRequest>>,
    pub new_comments: Mutex<Vec<NewComment>>,
    pub deletions: Mutex<Vec<CommentId>>,
    vote_replies: Replies<VoteResponse>,
    comment_replies: Replies<Comment>,
    delete_replies: Replies<()>,
}

fn expect<T>(replies: &Replies<T>) -> Reply<T> {
    let (sender, receiver) = oneshot::channel();
    replies.lock().push_back(receiver);
    sender
}

async fn answer<T>(replies: &Replies<T>) -> Result<T, Error> {
    let reply = replies.lock().pop_front();
    match reply {
        None => futures::future::pending().await,
        Some(reply) => reply
            .await
            .unwrap_or_else(|_| Err(Error::Transport(anyhow!("test dropped the reply")))),
    }
}

impl ScriptedBackend {
    pub(crate) fn expect_vote(&self) -> Reply<VoteResponse> {
        expect(&self.vote_replies)
    }

    pub(crate) fn expect_comment(&self) -> Reply<Comment> {
        expect(&self.comment_replies)
    }

    pub(crate) fn expect_delete(&self) -> Reply<()> {
        expect(&self.delete_replies)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn cast_vote(&self, req: VoteRequest) -> Result<VoteResponse, Error> {
        self.votes.lock().push(req);
        answer(&self.vote_replies).await
    }

    async fn create_comment(&self, req: NewComment) -> Result<Comment, Error> {
        self.new_comments.lock().push(req);
        answer(&self.comment_replies).await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        self.deletions.lock().push(id);
        answer(&self.delete_replies).await
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier(Mutex<Vec<String>>);

impl RecordingNotifier {
    pub(crate) fn alerts(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.0.lock().push(String::from(message));
    }
}

/// Signed-in session without request timeout
pub(crate) fn fixture() -> (Arc<ScriptedBackend>, Arc<RecordingNotifier>, Session) {
    let backend = Arc::new(ScriptedBackend::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let session = Session::new(backend.clone(), Some(UserId::stub()))
        .with_notifier(notifier.clone())
        .with_request_timeout(None);
    (backend, notifier, session)
}

pub(crate) fn comment(expense: ExpenseId, content: &str) -> Comment {
    Comment {
        id: CommentId(Uuid::new_v4()),
        content: String::from(content),
        author_id: UserId::stub(),
        parent_id: expense,
        created_at: chrono::Utc::now(),
    }
}
