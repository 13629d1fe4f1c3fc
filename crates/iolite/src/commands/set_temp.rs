//! `iolite set-temp` — set a device's heating temperature.

use crate::cli::{GlobalOpts, SetTempArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: SetTempArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = util::hub_client(global, None).await?;
    client
        .set_temperature(&args.device_id, args.temperature)
        .await?;

    output::print_output(
        &format!("{} -> {:.1}°C", args.device_id, args.temperature),
        global.quiet,
    );
    Ok(())
}
