//! Hub connection configuration.
//!
//! All credential and session state lives here explicitly and is passed
//! to constructors — there are no process-wide singletons.

use secrecy::SecretString;
use url::Url;

use iolite_api::Error;
use iolite_api::transport::TransportConfig;

/// The public IOLITE remote gateway.
pub const DEFAULT_HOST: &str = "remote.iolite.de";

/// Everything a [`HubClient`](crate::HubClient) needs to talk to one
/// gateway on behalf of one session.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Gateway host (authority only, no scheme).
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// Session id from the OAuth exchange.
    pub sid: String,
    /// Keep discovered state across discovery runs instead of
    /// rebuilding per session.
    pub retain_between_sessions: bool,
    pub transport: TransportConfig,
}

impl HubConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        sid: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
            sid: sid.into(),
            retain_between_sessions: false,
            transport: TransportConfig::default(),
        }
    }

    pub fn retain_between_sessions(mut self, retain: bool) -> Self {
        self.retain_between_sessions = retain;
        self
    }

    /// Base URL for the gateway's REST surfaces.
    pub fn rest_base(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("https://{}", self.host))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_base_uses_https_on_the_host() {
        let config = HubConfig::new(DEFAULT_HOST, "user", SecretString::from("pass"), "sid-1");
        assert_eq!(config.rest_base().unwrap().as_str(), "https://remote.iolite.de/");
        assert!(!config.retain_between_sessions);
    }
}
