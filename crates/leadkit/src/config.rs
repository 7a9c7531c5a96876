//! CLI configuration: thin wrapper around `leadkit_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (--profile,
//! --api-url, --timeout) and builds the `Dashboard` every command uses.

use std::sync::Arc;
use std::time::Duration;

use leadkit_core::{Dashboard, DashboardConfig, SessionStore};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use leadkit_config::{Config, Defaults, Profile, SessionBackend, config_path, save_config};

/// The loaded config plus the profile chosen for this invocation.
#[derive(Debug)]
pub struct Resolved {
    pub config: Config,
    pub profile_name: String,
    pub profile: Profile,
}

/// Load config.toml (or defaults) and pick the active profile.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let config = leadkit_config::load_config()?;
    let profile_name = config.profile_name(global.profile.as_deref());
    let profile = config.profile(&profile_name).map_err(|_| {
        let mut available: Vec<_> = config.profiles.keys().cloned().collect();
        available.sort();
        CliError::ProfileNotFound {
            name: profile_name.clone(),
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        }
    })?;

    Ok(Resolved {
        config,
        profile_name,
        profile,
    })
}

/// Translate the profile into a `DashboardConfig`; flags win over the
/// profile.
pub fn dashboard_config(resolved: &Resolved, global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let mut profile = resolved.profile.clone();
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }

    let mut config = leadkit_config::profile_to_dashboard_config(&profile, &resolved.config.defaults)?;
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

/// Build the dashboard with the profile's persisted session loaded.
pub fn build_dashboard(resolved: &Resolved, global: &GlobalOpts) -> Result<Dashboard, CliError> {
    let config = dashboard_config(resolved, global)?;
    let storage = leadkit_config::session_storage(&resolved.profile_name, &resolved.profile);
    let session = Arc::new(SessionStore::new(storage));

    tracing::debug!(
        profile = %resolved.profile_name,
        api_url = %config.api_url,
        "building dashboard"
    );
    Ok(Dashboard::new(config, session)?)
}
