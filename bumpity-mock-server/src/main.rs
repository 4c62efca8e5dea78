use std::net::SocketAddr;

use anyhow::Context;
use bumpity_mock_server::{router, MockServer, SharedServer};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Address to listen on
    #[structopt(short, long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Users to create at startup, their session tokens are logged
    #[structopt(short, long)]
    user: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let mut server = MockServer::new();
    for name in opt.user {
        let (id, tok) = server.sign_in(name.clone());
        tracing::info!(%name, user = %id.0, token = %tok.0, "created user");
    }

    let app = router(SharedServer::new(server));
    tracing::info!("listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
