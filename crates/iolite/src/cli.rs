//! Clap derive structures for the `iolite` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use iolite_api::heating::Day;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// iolite -- CLI for IOLITE smart-home gateways
#[derive(Debug, Parser)]
#[command(
    name = "iolite",
    version,
    about = "Manage IOLITE smart-home gateways from the command line",
    long_about = "A CLI for IOLITE smart-home gateways.\n\n\
        Pairs via the mobile-app QR payload, bootstraps an OAuth session,\n\
        and discovers rooms, devices, and heating over the gateway's\n\
        WebSocket channels.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "IOLITE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Gateway host (overrides profile)
    #[arg(long, env = "IOLITE_HOST", global = true)]
    pub host: Option<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "IOLITE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a pairing QR payload into gateway credentials
    Pair(PairArgs),

    /// Bootstrap an OAuth session and print the SID
    Sid,

    /// Discover rooms, devices, and heating
    #[command(alias = "disc", alias = "d")]
    Discover(DiscoverArgs),

    /// Set a device's heating temperature
    SetTemp(SetTempArgs),

    /// Manage a room's heating schedule
    #[command(alias = "sched")]
    Schedule(ScheduleArgs),

    /// Hold the device channel open and log its frames
    Monitor,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Per-command args ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PairArgs {
    /// The JSON payload from the pairing QR code
    pub qr: String,

    /// Save the decoded credentials into the active profile
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Reuse an existing SID instead of running the OAuth bootstrap
    #[arg(long, env = "IOLITE_SID")]
    pub sid: Option<String>,
}

#[derive(Debug, Args)]
pub struct SetTempArgs {
    /// Device identifier (see `iolite discover`)
    pub device_id: String,

    /// Target temperature in °C
    pub temperature: f64,
}

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// Set the comfort temperature for all of a room's intervals
    Comfort {
        /// Room name (see `iolite discover`)
        room: String,

        /// Comfort temperature in °C (14-30)
        temperature: f64,
    },

    /// Add a heating interval
    Add {
        /// Room name
        room: String,

        /// Day of week
        #[arg(value_enum)]
        day: DayArg,

        /// Start hour (0-23)
        hour: u32,

        /// Start minute (0-59)
        minute: u32,

        /// Duration in minutes
        duration: u32,
    },

    /// Remove a heating interval
    Remove {
        /// Room name
        room: String,

        /// Interval identifier
        interval_id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DayArg {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<DayArg> for Day {
    fn from(day: DayArg) -> Self {
        match day {
            DayArg::Monday => Self::Monday,
            DayArg::Tuesday => Self::Tuesday,
            DayArg::Wednesday => Self::Wednesday,
            DayArg::Thursday => Self::Thursday,
            DayArg::Friday => Self::Friday,
            DayArg::Saturday => Self::Saturday,
            DayArg::Sunday => Self::Sunday,
        }
    }
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
