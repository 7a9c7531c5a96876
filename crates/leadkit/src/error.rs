//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use leadkit_config::ConfigError;
use leadkit_core::{CoreError, WorkflowError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the backend")]
    #[diagnostic(
        code(leadkit::connection_failed),
        help(
            "{reason}\n\
             Check that the backend is running, or point at another one with --api-url."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(leadkit::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Not logged in (profile '{profile}')")]
    #[diagnostic(
        code(leadkit::not_logged_in),
        help("Run: leadkit auth login\nOr create an account with: leadkit auth signup")
    )]
    NotLoggedIn { profile: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(leadkit::auth_failed),
        help("Your session may have expired. Run: leadkit auth login")
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(leadkit::not_found),
        help("Run: leadkit {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(code(leadkit::not_found))]
    Missing { message: String },

    #[error("{message}")]
    #[diagnostic(code(leadkit::conflict))]
    Conflict { message: String },

    // ── Backend ──────────────────────────────────────────────────────

    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(leadkit::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response from backend: {message}")]
    #[diagnostic(
        code(leadkit::decode),
        help("The backend may be a different version. Run with -vv to see the requests.")
    )]
    Decode { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(leadkit::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(leadkit::workflow))]
    Workflow(WorkflowError),

    // ── Session / configuration ──────────────────────────────────────

    #[error("Session storage failed: {message}")]
    #[diagnostic(
        code(leadkit::session),
        help("Switch the profile to file sessions with: leadkit config set session file")
    )]
    Session { message: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(leadkit::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: leadkit config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{0}")]
    #[diagnostic(code(leadkit::config), help("Inspect the file with: leadkit config show"))]
    Config(String),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(leadkit::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(leadkit::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotLoggedIn { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::Missing { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { message } if message.contains("timed out") => Self::Timeout,
            CoreError::Transport { message } => Self::ConnectionFailed { reason: message },

            CoreError::Api { status, message } => match status {
                401 | 403 => Self::AuthFailed { message },
                404 => Self::Missing { message },
                409 => Self::Conflict { message },
                400 | 422 => Self::Validation {
                    field: "request".into(),
                    reason: message,
                },
                _ => Self::ApiError { status, message },
            },

            CoreError::Decode { message } => Self::Decode { message },
            CoreError::Workflow(e) => Self::Workflow(e),
            CoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Session { message } => Self::Session { message },
            CoreError::Config { message } => Self::Config(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}
