use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};

use crate::{
    api::{
        self, AuthToken, Comment, CommentCreated, CommentId, EntryId, GuestbookEntryCreated,
        NewComment, NewGuestbookEntry, OwnerToken, UserId, VoteRequest, VoteResponse,
    },
    Backend, ClientConfig, Error, GuestbookBackend,
};

/// Backend talking JSON to a Bumpity Road server
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    host: String,
    token: Option<AuthToken>,
}

impl HttpBackend {
    pub fn new(host: impl Into<String>, token: Option<AuthToken>) -> HttpBackend {
        let host: String = host.into();
        HttpBackend {
            client: reqwest::Client::new(),
            host: String::from(host.trim_end_matches('/')),
            token,
        }
    }

    pub fn from_config(config: &ClientConfig) -> HttpBackend {
        HttpBackend::new(config.host.clone(), config.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.host, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(token) => req.bearer_auth(token.0),
            None => req,
        }
    }

    pub async fn whoami(&self) -> Result<UserId, Error> {
        let resp = send(self.authed(self.client.get(self.url("whoami")))).await?;
        json(resp).await
    }
}

async fn send(req: RequestBuilder) -> Result<Response, Error> {
    let resp = req
        .send()
        .await
        .map_err(|e| Error::Transport(anyhow::Error::from(e).context("sending request")))?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .bytes()
        .await
        .map_err(|e| Error::Transport(anyhow::Error::from(e).context("reading error body")))?;
    match api::Error::parse(&body) {
        Ok(err) => Err(Error::Api(err)),
        Err(e) => Err(Error::Transport(anyhow!("server answered {status}: {e:#}"))),
    }
}

async fn json<R>(resp: Response) -> Result<R, Error>
where
    R: for<'de> serde::Deserialize<'de>,
{
    resp.json()
        .await
        .map_err(|e| Error::Transport(anyhow::Error::from(e).context("parsing server response")))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn cast_vote(&self, req: VoteRequest) -> Result<VoteResponse, Error> {
        let resp = send(
            self.authed(self.client.post(self.url("expenses/vote")))
                .json(&req),
        )
        .await?;
        json(resp).await
    }

    async fn create_comment(&self, req: NewComment) -> Result<Comment, Error> {
        let resp = send(
            self.authed(self.client.post(self.url("expenses/comments")))
                .json(&req),
        )
        .await?;
        let created: CommentCreated = json(resp).await?;
        Ok(created.comment)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        send(self.authed(
            self.client
                .delete(self.url(&format!("expenses/comments/{}", id.0))),
        ))
        .await?;
        Ok(())
    }
}

#[async_trait]
impl GuestbookBackend for HttpBackend {
    async fn sign_guestbook(
        &self,
        entry: NewGuestbookEntry,
    ) -> Result<GuestbookEntryCreated, Error> {
        let resp = send(self.client.post(self.url("guestbook")).json(&entry)).await?;
        json(resp).await
    }

    async fn delete_guestbook_entry(&self, id: EntryId, token: OwnerToken) -> Result<(), Error> {
        send(
            self.client
                .delete(self.url(&format!("guestbook/{}", id.0)))
                .bearer_auth(token.0),
        )
        .await?;
        Ok(())
    }
}
