//! `iolite monitor` — hold the device channel open until Ctrl-C.

use crate::cli::GlobalOpts;
use crate::commands::util;
use crate::error::CliError;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let client = util::hub_client(global, None).await?;
    tracing::info!("monitoring devices, Ctrl-C to stop");

    tokio::select! {
        result = client.monitor_devices() => result?,
        _ = tokio::signal::ctrl_c() => {
            client.cancel();
            tracing::info!("stopped");
        }
    }
    Ok(())
}
