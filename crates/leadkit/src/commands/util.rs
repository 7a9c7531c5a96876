//! Shared helpers for command handlers.

use std::io::IsTerminal;

use chrono::NaiveDate;
use dialoguer::{Confirm, Input};
use leadkit_core::{Dashboard, EntityId, User, Website};
use secrecy::SecretString;

use crate::config::Resolved;
use crate::error::CliError;

/// Password source for non-interactive logins.
pub const PASSWORD_ENV: &str = "LEADKIT_PASSWORD";

/// Fail with the auth exit code unless a session is stored.
pub fn require_session(dashboard: &Dashboard, resolved: &Resolved) -> Result<User, CliError> {
    dashboard
        .require_session()
        .map_err(|_| CliError::NotLoggedIn {
            profile: resolved.profile_name.clone(),
        })
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// The given email, or one typed at a prompt.
pub fn email_or_prompt(email: Option<String>) -> Result<String, CliError> {
    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err)?,
    };
    if email.trim().is_empty() {
        return Err(CliError::Validation {
            field: "email".into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(email)
}

/// `LEADKIT_PASSWORD` when set, otherwise a hidden prompt.
pub fn password_from_env_or_prompt() -> Result<SecretString, CliError> {
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(pw) => pw,
        Err(_) => rpassword::prompt_password("Password: ").map_err(prompt_err)?,
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

/// Parse a `YYYY-MM-DD` flag value.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("expected YYYY-MM-DD, got '{value}' ({e})"),
    })
}

/// Look a website up in the cached list.
pub async fn resolve_website(dashboard: &Dashboard, id: &str) -> Result<Website, CliError> {
    dashboard
        .website(&EntityId::from(id))
        .await?
        .ok_or_else(|| CliError::NotFound {
            resource_type: "website".into(),
            identifier: id.into(),
            list_command: "websites list".into(),
        })
}

/// Shorten `text` to at most `max` characters for table cells.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
