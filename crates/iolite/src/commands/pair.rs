//! `iolite pair` — decode a pairing QR payload.

use iolite_api::pairing;
use iolite_config::{self as config, Profile};

use crate::cli::{GlobalOpts, PairArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

/// Decode the QR payload and print the recovered credentials in
/// `KEY=value` form for shell consumption. With `--save`, persist them
/// into the active profile instead of relying on env vars.
pub fn handle(args: PairArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let creds = pairing::decode(&args.qr)?;

    let rendered = format!(
        "CODE={}\nHTTP_USERNAME={}\nHTTP_PASSWORD={}",
        creds.code, creds.username, creds.password
    );
    output::print_output(&rendered, global.quiet);

    if args.save {
        let name = util::target_profile_name(global);
        let mut cfg = config::load_config_or_default(global.config.as_deref());

        let profile = cfg.profiles.entry(name.clone()).or_insert_with(Profile::default);
        profile.code = Some(creds.code);
        profile.username = Some(creds.username);
        profile.password = Some(creds.password);

        config::save_config(&cfg, global.config.as_deref())?;
        tracing::info!(profile = %name, "saved pairing credentials");
    }

    Ok(())
}
