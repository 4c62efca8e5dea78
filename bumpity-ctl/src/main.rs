use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context};
use bumpity_client::{
    api::{CommentId, EntryId, ExpenseId, NewGuestbookEntry, Uuid, Vote},
    Backend, ClientConfig, CommentOutcome, FileStore, GuestbookOwnership, HttpBackend, Session,
    VoteOutcome, VoteState,
};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Server to talk to, overrides BUMPITY_HOST
    #[structopt(short, long)]
    host: Option<String>,

    /// Where to remember the guestbook entries signed from this machine
    #[structopt(long, default_value = "bumpity-guestbook.json")]
    ownership_file: PathBuf,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print the user the configured token belongs to
    Whoami,

    /// Vote on an expense, voting the same way twice retracts the vote
    Vote {
        expense: Uuid,

        /// up or down
        vote: Vote,
    },

    /// Comment on an expense
    Comment {
        expense: Uuid,

        text: Vec<String>,
    },

    /// Delete one of your comments
    DeleteComment { comment: Uuid },

    /// Sign the guestbook, no account needed
    Sign { name: String, message: Vec<String> },

    /// Delete a guestbook entry signed from this machine
    Unsign { entry: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let mut config = ClientConfig::from_env()?;
    if let Some(host) = opt.host {
        config.host = host;
    }
    tracing::debug!(
        host = %config.host,
        authenticated = config.token.is_some(),
        timeout = ?config.request_timeout,
        "resolved client config"
    );
    let backend = Arc::new(HttpBackend::from_config(&config));

    match opt.cmd {
        Command::Whoami => {
            let user = backend.whoami().await.context("resolving session")?;
            println!("{}", user.0);
        }
        Command::Vote { expense, vote } => {
            let actor = backend.whoami().await.context("resolving session")?;
            let session = Session::new(backend.clone(), Some(actor))
                .with_request_timeout(config.request_timeout);
            // the server answers with the authoritative score anyway
            let ctl = session.vote_controller(
                ExpenseId(expense),
                VoteState {
                    score: 0,
                    own_vote: None,
                },
            );
            match ctl.cast_vote(vote).await {
                VoteOutcome::Confirmed(state) => match state.own_vote {
                    Some(v) => println!("score is now {}, your vote is {v}", state.score),
                    None => println!("score is now {}, you have no vote", state.score),
                },
                VoteOutcome::RolledBack(err) => return Err(anyhow!(err).context("voting")),
                VoteOutcome::Ignored => return Err(anyhow!("vote was not sent")),
            }
        }
        Command::Comment { expense, text } => {
            let actor = backend.whoami().await.context("resolving session")?;
            let session = Session::new(backend.clone(), Some(actor))
                .with_request_timeout(config.request_timeout);
            let ctl = session.comment_controller(ExpenseId(expense), Vec::new());
            ctl.set_draft(text.join(" "));
            match ctl.submit_comment().await {
                CommentOutcome::Posted(c) => println!("{}", c.id.0),
                CommentOutcome::Failed(err) => return Err(anyhow!(err).context("commenting")),
                CommentOutcome::Ignored => return Err(anyhow!("refusing to post an empty comment")),
            }
        }
        Command::DeleteComment { comment } => {
            backend
                .delete_comment(CommentId(comment))
                .await
                .context("deleting comment")?;
        }
        Command::Sign { name, message } => {
            let mut ownership = GuestbookOwnership::new(FileStore::open(&opt.ownership_file)?);
            let entry = ownership
                .sign(
                    &*backend,
                    NewGuestbookEntry {
                        name,
                        message: message.join(" "),
                    },
                )
                .await
                .context("signing guestbook")?;
            println!("{}", entry.id.0);
        }
        Command::Unsign { entry } => {
            let mut ownership = GuestbookOwnership::new(FileStore::open(&opt.ownership_file)?);
            let deleted = ownership
                .delete_entry(&*backend, EntryId(entry))
                .await
                .context("deleting guestbook entry")?;
            if !deleted {
                return Err(anyhow!(
                    "guestbook entry {entry} was not signed from this machine"
                ));
            }
        }
    }

    Ok(())
}
