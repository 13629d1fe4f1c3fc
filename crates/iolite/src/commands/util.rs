//! Shared session bootstrap for gateway-bound commands.

use url::Url;

use iolite_api::oauth::{OAuthClient, SidProvider, TokenCache};
use iolite_api::transport::TransportConfig;
use iolite_config::{self as config, Profile};
use iolite_core::{DEFAULT_HOST, HubClient};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the active profile, with the `--host` flag folded in.
pub fn load_profile(global: &GlobalOpts) -> Result<(String, Profile), CliError> {
    let cfg = config::load_config_or_default(global.config.as_deref());
    let (name, profile) = cfg.profile(global.profile.as_deref())?;

    let mut profile = profile.clone();
    if global.host.is_some() {
        profile.host.clone_from(&global.host);
    }
    Ok((name.to_owned(), profile))
}

/// The profile name commands write to when none is selected.
pub fn target_profile_name(global: &GlobalOpts) -> String {
    let cfg = config::load_config_or_default(global.config.as_deref());
    global
        .profile
        .clone()
        .or(cfg.default_profile)
        .unwrap_or_else(|| "default".into())
}

/// Run the OAuth bootstrap for a profile and return a SID.
pub async fn obtain_sid(name: &str, profile: &Profile) -> Result<String, CliError> {
    let (username, password) = config::resolve_credentials(profile, name)?;
    let code = config::resolve_code(profile, name)?;

    let host = profile.host.as_deref().unwrap_or(DEFAULT_HOST);
    let base = Url::parse(&format!("https://{host}")).map_err(iolite_api::Error::from)?;

    let oauth = OAuthClient::new(base, username, password, &TransportConfig::default())?;
    let cache = TokenCache::new(
        profile
            .token_cache
            .clone()
            .unwrap_or_else(config::token_cache_dir),
    );
    let device_name = profile.device_name.as_deref().unwrap_or("iolite-cli");

    let sid = SidProvider::new(oauth, cache)
        .obtain_sid(&code, device_name)
        .await?;
    tracing::debug!("obtained SID");
    Ok(sid)
}

/// Build a connected-session client, bootstrapping a SID unless the
/// caller supplies one.
pub async fn hub_client(
    global: &GlobalOpts,
    sid_override: Option<String>,
) -> Result<HubClient, CliError> {
    let (name, profile) = load_profile(global)?;

    let sid = match sid_override {
        Some(sid) => sid,
        None => obtain_sid(&name, &profile).await?,
    };

    let hub_config = config::profile_to_hub_config(&profile, &name, sid)?;
    Ok(HubClient::new(hub_config))
}
