//! Config subcommand handlers.

use std::fmt::Write;

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, SessionBackend};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

fn backend_name(backend: SessionBackend) -> &'static str {
    match backend {
        SessionBackend::File => "file",
        SessionBackend::Keyring => "keyring",
    }
}

/// Config as TOML-like text, profiles sorted by name.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = write!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out, "\n");
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        let _ = write!(out, "session = \"{}\"", backend_name(p.session));
        if let Some(ref ca) = p.ca_cert {
            let _ = write!(out, "\nca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = write!(out, "\ninsecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = write!(out, "\ntimeout = {timeout}");
        }
        if let Some(retries) = p.read_retries {
            let _ = write!(out, "\nread_retries = {retries}");
        }
        if let Some(max_age) = p.max_age {
            let _ = write!(out, "\nmax_age = {max_age}");
        }
    }

    out
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("expected a non-negative number, got '{value}'"),
    })
}

/// Apply `key = value` to `profile`.
fn set_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => {
            let mut candidate = profile.clone();
            candidate.api_url = value.to_owned();
            leadkit_config::profile_to_dashboard_config(&candidate, &config::Defaults::default())?;
            profile.api_url = value.to_owned();
        }
        "session" => {
            profile.session = match value {
                "file" => SessionBackend::File,
                "keyring" => SessionBackend::Keyring,
                _ => {
                    return Err(CliError::Validation {
                        field: "session".into(),
                        reason: "must be 'file' or 'keyring'".into(),
                    });
                }
            };
        }
        "timeout" => profile.timeout = Some(parse_number("timeout", value)?),
        "read_retries" | "read-retries" => {
            profile.read_retries = Some(parse_number("read_retries", value)?);
        }
        "max_age" | "max-age" => profile.max_age = Some(parse_number("max_age", value)?),
        "insecure" => {
            profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                field: "insecure".into(),
                reason: "must be 'true' or 'false'".into(),
            })?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api_url, session, timeout, \
                     read_retries, max_age, insecure, ca_cert"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("leadkit configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(leadkit_config::DEFAULT_PROFILE.into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("Backend URL")
                .default(leadkit_core::DEFAULT_API_URL.into())
                .interact_text()
                .map_err(prompt_err)?;

            let session_choices = &[
                "Session file in the data directory",
                "System keyring",
            ];
            let session = match Select::new()
                .with_prompt("Where should the login be kept?")
                .items(session_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => SessionBackend::File,
                _ => SessionBackend::Keyring,
            };

            let mut profile = Profile {
                session,
                ..Profile::default()
            };
            set_key(&mut profile, "api_url", &api_url)?;

            let mut cfg = leadkit_config::load_config()?;
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            let path = config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Next: leadkit auth login");
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = leadkit_config::load_config()?;
            let out = output::render_single(global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = leadkit_config::load_config()?;
            let profile_name = cfg.profile_name(global.profile.as_deref());
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, &value)?;

            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = leadkit_config::load_config()?;
            let default = cfg.profile_name(None);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: leadkit config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if *name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }
    }
}
