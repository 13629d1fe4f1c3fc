//! `iolite schedule` — heating schedule CRUD for one room.

use iolite_core::{HubClient, Room};

use crate::cli::{GlobalOpts, ScheduleArgs, ScheduleCommand};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ScheduleArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let client = util::hub_client(global, None).await?;

    match args.command {
        ScheduleCommand::Comfort { room, temperature } => {
            let room = resolve_room(&client, &room).await?;
            let scheduler = client.heating_scheduler(&room.identifier)?;
            scheduler.set_comfort_temperature(temperature).await?;
            output::print_output(
                &format!("{} comfort -> {temperature:.1}°C", room.name),
                global.quiet,
            );
        }

        ScheduleCommand::Add {
            room,
            day,
            hour,
            minute,
            duration,
        } => {
            if hour > 23 || minute > 59 {
                return Err(CliError::Validation {
                    field: "start time".into(),
                    reason: format!("{hour:02}:{minute:02} is not a time of day"),
                });
            }

            let room = resolve_room(&client, &room).await?;
            let scheduler = client.heating_scheduler(&room.identifier)?;
            let created = scheduler.add_interval(day.into(), hour, minute, duration).await?;

            output::print_output(&output::render_json_pretty(&created), global.quiet);
        }

        ScheduleCommand::Remove { room, interval_id } => {
            let room = resolve_room(&client, &room).await?;
            let scheduler = client.heating_scheduler(&room.identifier)?;
            scheduler.delete_interval(&interval_id).await?;
            output::print_output(&format!("removed interval {interval_id}"), global.quiet);
        }
    }
    Ok(())
}

/// Resolve a room argument: display name first, raw identifier as
/// fallback. Requires a discovery pass, since the schedule API is
/// keyed by room identifier.
async fn resolve_room(client: &HubClient, room: &str) -> Result<Room, CliError> {
    client.discover().await?;

    client
        .store()
        .find_room_by_name(room)
        .or_else(|| client.store().find_room_by_identifier(room))
        .ok_or_else(|| CliError::NotFound {
            resource_type: "room".into(),
            identifier: room.into(),
        })
}
