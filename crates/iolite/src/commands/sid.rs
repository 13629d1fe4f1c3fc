//! `iolite sid` — run the OAuth bootstrap and print the session id.

use iolite_core::DEFAULT_HOST;

use crate::cli::GlobalOpts;
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (name, profile) = util::load_profile(global)?;
    let sid = util::obtain_sid(&name, &profile).await?;

    let host = profile.host.as_deref().unwrap_or(DEFAULT_HOST);
    let rendered = format!("SID={sid}\nUI=https://{host}/ui/?SID={sid}");
    output::print_output(&rendered, global.quiet);
    Ok(())
}
