//! `iolite discover` — run a full discovery session.

use crate::cli::{DiscoverArgs, GlobalOpts, OutputFormat};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: DiscoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = util::hub_client(global, args.sid).await?;
    let mut rooms = client.discover().await?;
    rooms.sort_by(|a, b| a.name.cmp(&b.name));

    let rendered = output::render_rooms(&global.output, &rooms);
    output::print_output(&rendered, global.quiet);

    // The table hides per-device detail; append it for interactive use.
    if matches!(global.output, OutputFormat::Table) {
        let color = output::should_color(&global.color);
        for room in &rooms {
            if !room.devices.is_empty() {
                output::print_output(&output::render_room_detail(room, color), global.quiet);
            }
        }
    }
    Ok(())
}
