use std::time::Duration;

use anyhow::Context;

use crate::api::{AuthToken, Uuid};

pub const DEFAULT_HOST: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    pub host: String,

    /// Session token of the signed-in actor, if any
    pub token: Option<AuthToken>,

    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Reads `BUMPITY_HOST`, `BUMPITY_TOKEN` and `BUMPITY_TIMEOUT_SECS`
    /// (`0` disables the timeout)
    pub fn from_env() -> anyhow::Result<ClientConfig> {
        ClientConfig::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<ClientConfig> {
        let host = var("BUMPITY_HOST").unwrap_or_else(|| String::from(DEFAULT_HOST));
        let token = var("BUMPITY_TOKEN")
            .map(|tok| {
                Uuid::try_parse(&tok)
                    .context("parsing BUMPITY_TOKEN as an auth token")
                    .map(AuthToken)
            })
            .transpose()?;
        let request_timeout = match var("BUMPITY_TIMEOUT_SECS") {
            None => Some(DEFAULT_REQUEST_TIMEOUT),
            Some(secs) => {
                let secs: u64 = secs
                    .parse()
                    .with_context(|| format!("parsing BUMPITY_TIMEOUT_SECS {secs:?}"))?;
                (secs != 0).then(|| Duration::from_secs(secs))
            }
        };
        Ok(ClientConfig {
            host,
            token,
            request_timeout,
        })
    }
}
