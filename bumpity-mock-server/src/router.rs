use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{self, request},
    routing::{delete, get, post},
    Json, Router,
};
use bumpity_api::{
    AuthToken, CommentCreated, CommentId, EntryId, Error as ApiError, GuestbookEntryCreated,
    NewComment, NewGuestbookEntry, OwnerToken, UserId, Uuid, VoteRequest, VoteResponse,
};
use parking_lot::{Mutex, MutexGuard};
use tower_http::trace::TraceLayer;

use crate::MockServer;

#[derive(Clone, Debug, Default)]
pub struct SharedServer(Arc<Mutex<MockServer>>);

impl SharedServer {
    pub fn new(server: MockServer) -> SharedServer {
        SharedServer(Arc::new(Mutex::new(server)))
    }

    pub fn lock(&self) -> MutexGuard<'_, MockServer> {
        self.0.lock()
    }
}

#[derive(Debug)]
pub struct Error(pub ApiError);

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Error {
        Error(e)
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        tracing::info!("returning error to client: {}", self.0);
        (self.0.status_code(), self.0.contents()).into_response()
    }
}

/// `Authorization: Bearer <uuid>`, either a session or a guestbook owner token
pub struct Bearer(pub Uuid);

#[async_trait]
impl<S: Sync> FromRequestParts<S> for Bearer {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, _state: &S) -> Result<Bearer, Error> {
        let denied = || Error(ApiError::PermissionDenied);
        let auth = req
            .headers
            .get(http::header::AUTHORIZATION)
            .ok_or_else(denied)?
            .to_str()
            .map_err(|_| denied())?;
        let mut auth = auth.split(' ');
        if !auth
            .next()
            .ok_or_else(denied)?
            .eq_ignore_ascii_case("bearer")
        {
            return Err(denied());
        }
        let token = auth.next().ok_or_else(denied)?;
        if auth.next().is_some() {
            return Err(denied());
        }
        let token = Uuid::try_from(token).map_err(|_| denied())?;
        Ok(Bearer(token))
    }
}

pub fn router(server: SharedServer) -> Router {
    Router::new()
        .route("/api/whoami", get(whoami))
        .route("/api/unauth", post(unauth))
        .route("/api/expenses/vote", post(vote))
        .route("/api/expenses/comments", post(create_comment))
        .route("/api/expenses/comments/:id", delete(delete_comment))
        .route("/api/guestbook", post(sign_guestbook))
        .route("/api/guestbook/:id", delete(delete_guestbook_entry))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

async fn whoami(
    State(server): State<SharedServer>,
    Bearer(tok): Bearer,
) -> Result<Json<UserId>, Error> {
    Ok(Json(server.lock().whoami(AuthToken(tok))?))
}

async fn unauth(State(server): State<SharedServer>, Bearer(tok): Bearer) -> Result<(), Error> {
    Ok(server.lock().unauth(AuthToken(tok))?)
}

async fn vote(
    State(server): State<SharedServer>,
    Bearer(tok): Bearer,
    Json(req): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, Error> {
    Ok(Json(server.lock().vote(AuthToken(tok), req)?))
}

async fn create_comment(
    State(server): State<SharedServer>,
    Bearer(tok): Bearer,
    Json(req): Json<NewComment>,
) -> Result<Json<CommentCreated>, Error> {
    let comment = server.lock().create_comment(AuthToken(tok), req)?;
    Ok(Json(CommentCreated { comment }))
}

async fn delete_comment(
    State(server): State<SharedServer>,
    Bearer(tok): Bearer,
    Path(id): Path<Uuid>,
) -> Result<(), Error> {
    Ok(server.lock().delete_comment(AuthToken(tok), CommentId(id))?)
}

async fn sign_guestbook(
    State(server): State<SharedServer>,
    Json(entry): Json<NewGuestbookEntry>,
) -> Result<Json<GuestbookEntryCreated>, Error> {
    Ok(Json(server.lock().sign_guestbook(entry)?))
}

async fn delete_guestbook_entry(
    State(server): State<SharedServer>,
    Bearer(tok): Bearer,
    Path(id): Path<Uuid>,
) -> Result<(), Error> {
    Ok(server
        .lock()
        .delete_guestbook_entry(EntryId(id), OwnerToken(tok))?)
}
