use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use bumpity_api::{AuthToken, UserId};
use bumpity_client::{HttpBackend, Notifier, Session};
use bumpity_mock_server::{router, SharedServer};
use parking_lot::Mutex;

#[cfg(test)]
mod end_to_end;

/// Serves `server` on an ephemeral local port until the runtime shuts down
pub async fn spawn_server(server: SharedServer) -> anyhow::Result<SocketAddr> {
    let listen = SocketAddr::from(([127, 0, 0, 1], 0));
    let http = axum::Server::try_bind(&listen)
        .context("binding mock server")?
        .serve(router(server).into_make_service());
    let addr = http.local_addr();
    tokio::spawn(async move {
        if let Err(err) = http.await {
            tracing::error!(?err, "mock server stopped");
        }
    });
    Ok(addr)
}

/// Keeps every alert raised through it. The client crate has its own copy
/// for unit tests, which is not exported.
#[derive(Debug, Default)]
pub struct RecordingNotifier(Mutex<Vec<String>>);

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.0.lock().push(String::from(message));
    }
}

/// A running mock server with one signed-in user, and a client session for them
pub struct Harness {
    pub server: SharedServer,
    pub addr: SocketAddr,
    pub user: UserId,
    pub token: AuthToken,
    pub backend: Arc<HttpBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub session: Session,
}

impl Harness {
    pub async fn start() -> anyhow::Result<Harness> {
        let server = SharedServer::default();
        let (user, token) = server.lock().sign_in(String::from("alice"));
        let addr = spawn_server(server.clone()).await?;
        let backend = Arc::new(HttpBackend::new(format!("http://{addr}"), Some(token)));
        let notifier = Arc::new(RecordingNotifier::default());
        let session = Session::new(backend.clone(), Some(user)).with_notifier(notifier.clone());
        Ok(Harness {
            server,
            addr,
            user,
            token,
            backend,
            notifier,
            session,
        })
    }

    /// Signs in another user on the same server
    pub fn other_user(&self, name: &str) -> (UserId, AuthToken) {
        self.server.lock().sign_in(String::from(name))
    }

    pub fn backend_for(&self, token: Option<AuthToken>) -> HttpBackend {
        HttpBackend::new(format!("http://{}", self.addr), token)
    }
}
