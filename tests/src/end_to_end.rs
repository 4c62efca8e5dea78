use std::task::Poll;

use bumpity_api::{self as api, ExpenseId, NewComment, NewGuestbookEntry, Vote, VoteRequest};
use bumpity_client::{
    CommentOutcome, DeleteOutcome, Error, FileStore, GuestbookOwnership, MemoryStore,
    VoteOutcome, VoteState,
};
use futures::{pin_mut, poll};

use crate::Harness;

#[tokio::test]
async fn whoami_resolves_the_session() {
    let h = Harness::start().await.unwrap();
    assert_eq!(h.backend.whoami().await.unwrap(), h.user);
    assert_eq!(h.session.actor(), Some(h.user));

    let anonymous = h.backend_for(None);
    assert!(matches!(
        anonymous.whoami().await,
        Err(Error::Api(api::Error::PermissionDenied))
    ));
}

#[tokio::test]
async fn vote_flip_settles_on_server_score() {
    let h = Harness::start().await.unwrap();
    let expense = ExpenseId::stub();
    let mut upvoters = Vec::new();
    for name in ["bob", "carol", "dave", "erin"] {
        let (user, tok) = h.other_user(name);
        h.server.lock().seed_vote(expense, user, Vote::Up);
        upvoters.push(tok);
    }
    h.server.lock().seed_vote(expense, h.user, Vote::Down);
    let ctl = h.session.vote_controller(
        expense,
        VoteState {
            score: 3,
            own_vote: Some(Vote::Down),
        },
    );

    // bob retracts an upvote after the page was rendered
    h.server
        .lock()
        .vote(
            upvoters[0],
            VoteRequest {
                entity_id: expense,
                value: Vote::Up,
            },
        )
        .unwrap();

    let fut = ctl.cast_vote(Vote::Up);
    pin_mut!(fut);
    assert!(matches!(poll!(fut.as_mut()), Poll::Pending));
    assert_eq!(
        ctl.state(),
        VoteState {
            score: 5,
            own_vote: Some(Vote::Up),
        }
    );
    assert!(ctl.is_pending());

    let settled = VoteState {
        score: 4,
        own_vote: Some(Vote::Up),
    };
    match fut.await {
        VoteOutcome::Confirmed(state) => assert_eq!(state, settled),
        res => panic!("unexpected outcome {res:?}"),
    }
    assert_eq!(ctl.state(), settled);
    assert!(!ctl.is_pending());
    assert_eq!(h.server.lock().score(expense), 4);
    assert!(h.notifier.alerts().is_empty());
}

#[tokio::test]
async fn server_error_rolls_vote_back() {
    let h = Harness::start().await.unwrap();
    let expense = ExpenseId::stub();
    let before = VoteState {
        score: 0,
        own_vote: None,
    };
    let ctl = h.session.vote_controller(expense, before);

    h.server
        .lock()
        .fail_next(api::Error::Unknown(String::from("database on fire")));
    match ctl.cast_vote(Vote::Down).await {
        VoteOutcome::RolledBack(Error::Api(api::Error::Unknown(msg))) => {
            assert_eq!(msg, "database on fire")
        }
        res => panic!("unexpected outcome {res:?}"),
    }
    assert_eq!(ctl.state(), before);
    assert!(!ctl.is_pending());
    assert_eq!(h.notifier.alerts().len(), 1);
    assert_eq!(h.server.lock().vote_of(expense, h.user), None);

    // the controller is usable again afterwards
    assert!(matches!(
        ctl.cast_vote(Vote::Down).await,
        VoteOutcome::Confirmed(VoteState {
            score: -1,
            own_vote: Some(Vote::Down),
        })
    ));
}

#[tokio::test]
async fn expired_session_rolls_vote_back() {
    let h = Harness::start().await.unwrap();
    h.server.lock().unauth(h.token).unwrap();
    let before = VoteState {
        score: 7,
        own_vote: Some(Vote::Up),
    };
    let ctl = h.session.vote_controller(ExpenseId::stub(), before);
    assert!(matches!(
        ctl.cast_vote(Vote::Up).await,
        VoteOutcome::RolledBack(Error::Api(api::Error::PermissionDenied))
    ));
    assert_eq!(ctl.state(), before);
}

#[tokio::test]
async fn failed_comment_keeps_draft() {
    let h = Harness::start().await.unwrap();
    let ctl = h.session.comment_controller(ExpenseId::stub(), Vec::new());
    ctl.set_draft("hello");

    h.server
        .lock()
        .fail_next(api::Error::Unknown(String::from("try later")));
    assert!(matches!(
        ctl.submit_comment().await,
        CommentOutcome::Failed(Error::Api(_))
    ));
    assert!(ctl.items().is_empty());
    assert_eq!(ctl.draft(), "hello");
    assert!(!ctl.is_submitting());
    assert_eq!(h.notifier.alerts().len(), 1);
    assert!(h.server.lock().comments_for(ExpenseId::stub()).is_empty());
}

#[tokio::test]
async fn comment_is_posted_then_deleted() {
    let h = Harness::start().await.unwrap();
    let expense = ExpenseId::stub();
    let ctl = h.session.comment_controller(expense, Vec::new());
    ctl.set_draft("  nice cabin  ");

    let posted = match ctl.submit_comment().await {
        CommentOutcome::Posted(c) => c,
        res => panic!("unexpected outcome {res:?}"),
    };
    assert_eq!(posted.content, "nice cabin");
    assert_eq!(posted.author_id, h.user);
    assert_eq!(ctl.items(), vec![posted.clone()]);
    assert_eq!(ctl.draft(), "");
    assert_eq!(h.server.lock().comments_for(expense), vec![posted.clone()]);

    assert!(matches!(
        ctl.delete_comment(posted.id).await,
        DeleteOutcome::Deleted
    ));
    assert!(ctl.items().is_empty());
    assert!(h.server.lock().comments_for(expense).is_empty());
}

#[tokio::test]
async fn refused_delete_is_not_restored() {
    let h = Harness::start().await.unwrap();
    let expense = ExpenseId::stub();
    let (_, bob) = h.other_user("bob");
    let theirs = h
        .server
        .lock()
        .create_comment(
            bob,
            NewComment {
                entity_id: expense,
                content: String::from("mine, not yours"),
            },
        )
        .unwrap();

    let ctl = h.session.comment_controller(expense, vec![theirs.clone()]);
    assert!(matches!(
        ctl.delete_comment(theirs.id).await,
        DeleteOutcome::Failed(Error::Api(api::Error::PermissionDenied))
    ));
    assert!(ctl.items().is_empty());
    assert!(h.notifier.alerts().is_empty());
    assert_eq!(h.server.lock().comments_for(expense), vec![theirs]);
}

#[tokio::test]
async fn guestbook_entries_can_only_be_deleted_by_their_signer() {
    let h = Harness::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("owned.json");
    let anonymous = h.backend_for(None);

    let mut ownership = GuestbookOwnership::new(FileStore::open(&path).unwrap());
    let entry = ownership
        .sign(
            &anonymous,
            NewGuestbookEntry {
                name: String::from("Visitor"),
                message: String::from("Lovely stay"),
            },
        )
        .await
        .unwrap();
    assert_eq!(h.server.lock().guestbook(), vec![entry.clone()]);

    // another device does not hold the owner token
    let mut stranger = GuestbookOwnership::new(MemoryStore::default());
    assert!(!stranger.delete_entry(&anonymous, entry.id).await.unwrap());
    assert_eq!(h.server.lock().guestbook().len(), 1);

    // ownership survives reopening the store
    let mut ownership = GuestbookOwnership::new(FileStore::open(&path).unwrap());
    assert!(ownership.owns(entry.id).unwrap());
    assert!(ownership.delete_entry(&anonymous, entry.id).await.unwrap());
    assert!(!ownership.owns(entry.id).unwrap());
    assert!(h.server.lock().guestbook().is_empty());
}
