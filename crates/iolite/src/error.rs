//! CLI error types with miette diagnostics.
//!
//! Maps API and core errors into user-facing errors with actionable
//! help text.

use miette::Diagnostic;
use thiserror::Error;

use iolite_core::CoreError;

/// Exit codes per the CLI contract.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the gateway")]
    #[diagnostic(
        code(iolite::connection_failed),
        help(
            "Check that the gateway is reachable and the host is correct.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed")]
    #[diagnostic(
        code(iolite::auth_failed),
        help(
            "The gateway rejected the pairing credentials.\n\
             Re-pair with: iolite pair '<qr-json>' --save"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(iolite::no_credentials),
        help(
            "Decode a pairing QR with: iolite pair '<qr-json>' --save\n\
             Or set IOLITE_USERNAME / IOLITE_PASSWORD / IOLITE_CODE."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(iolite::not_found),
        help("Run: iolite discover to see the known topology")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Gateway API error (HTTP {status})")]
    #[diagnostic(code(iolite::api_error))]
    ApiError { status: u16, body: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(iolite::validation))]
    Validation { field: String, reason: String },

    #[error("Temperature {value}°C is outside the allowed range")]
    #[diagnostic(
        code(iolite::temperature_range),
        help("Comfort temperatures must be between {min}°C and {max}°C.")
    )]
    TemperatureOutOfRange { value: f64, min: f64, max: f64 },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration error")]
    #[diagnostic(code(iolite::config))]
    Config(#[source] iolite_config::ConfigError),

    // ── Protocol / internal ──────────────────────────────────────────

    #[error("Gateway protocol error: {message}")]
    #[diagnostic(code(iolite::protocol))]
    Protocol { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::TemperatureOutOfRange { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Error mappings ───────────────────────────────────────────────────

impl From<iolite_api::Error> for CliError {
    fn from(err: iolite_api::Error) -> Self {
        use iolite_api::Error;
        match err {
            Error::Authentication { message } => Self::AuthFailed { message },
            Error::Api { status: 401 | 403, body } => Self::AuthFailed { message: body },
            Error::Api { status, body } => Self::ApiError { status, body },
            Error::TemperatureOutOfRange { value, min, max } => {
                Self::TemperatureOutOfRange { value, min, max }
            }
            Error::WebSocketConnect(reason) => Self::ConnectionFailed { reason },
            Error::Transport(e) => Self::ConnectionFailed {
                reason: e.to_string(),
            },
            Error::Pairing { message } => Self::Validation {
                field: "qr".into(),
                reason: message,
            },
            Error::InvalidUrl(e) => Self::Validation {
                field: "host".into(),
                reason: e.to_string(),
            },
            other => Self::Protocol {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(e) => e.into(),
            CoreError::Session { message } => Self::Protocol { message },
        }
    }
}

impl From<iolite_config::ConfigError> for CliError {
    fn from(err: iolite_config::ConfigError) -> Self {
        match err {
            iolite_config::ConfigError::NoCredentials { profile }
            | iolite_config::ConfigError::UnknownProfile { profile } => {
                Self::NoCredentials { profile }
            }
            iolite_config::ConfigError::Validation { field, reason } => {
                Self::Validation { field, reason }
            }
            other => Self::Config(other),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_rejections_map_to_auth_exit_code() {
        let err = CliError::from(iolite_api::Error::Api {
            status: 401,
            body: "nope".into(),
        });
        assert!(matches!(err, CliError::AuthFailed { .. }));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn out_of_range_temperature_is_a_usage_error() {
        let err = CliError::from(iolite_api::Error::TemperatureOutOfRange {
            value: 35.0,
            min: 14.0,
            max: 30.0,
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn missing_profile_maps_to_no_credentials() {
        let err = CliError::from(iolite_config::ConfigError::UnknownProfile {
            profile: "office".into(),
        });
        assert!(matches!(err, CliError::NoCredentials { profile } if profile == "office"));
    }
}
