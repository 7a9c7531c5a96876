//! Clap derive structures for the `leadkit` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// leadkit -- lead-capture dashboard for the terminal
#[derive(Debug, Parser)]
#[command(
    name = "leadkit",
    version,
    about = "Manage websites, forms and leads from the command line",
    long_about = "A command-line dashboard for a leadkit lead-capture backend.\n\n\
        Register websites, detect their forms, save the ones you want to\n\
        track, then browse captured leads and per-form analytics.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "LEADKIT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend root URL (overrides profile)
    #[arg(long, env = "LEADKIT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LEADKIT_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LEADKIT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Sign up, log in and out
    Auth(AuthArgs),

    /// Manage tracked websites
    #[command(alias = "sites", alias = "w")]
    Websites(WebsitesArgs),

    /// Detect, save and inspect forms
    #[command(alias = "f")]
    Forms(FormsArgs),

    /// Browse captured leads
    #[command(alias = "l")]
    Leads(LeadsArgs),

    /// Lead counts per form and per day
    #[command(alias = "stats")]
    Analytics(AnalyticsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Create an account and log in
    Signup {
        /// Account email (prompted when omitted)
        #[arg(long, short = 'e')]
        email: Option<String>,

        /// Display name
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Log in; the password is read from LEADKIT_PASSWORD or prompted
    Login {
        /// Account email (prompted when omitted)
        #[arg(long, short = 'e')]
        email: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in account
    Whoami,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WEBSITES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WebsitesArgs {
    #[command(subcommand)]
    pub command: WebsitesCommand,
}

#[derive(Debug, Subcommand)]
pub enum WebsitesCommand {
    /// List websites with their form and lead counts
    #[command(alias = "ls")]
    List,

    /// Show one website and its forms
    Get {
        /// Website ID
        website: String,
    },

    /// Register a website
    Add {
        /// Absolute http(s) URL
        url: String,

        /// Display name
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Change a website's URL or name
    Update {
        /// Website ID
        website: String,

        #[arg(long)]
        url: Option<String>,

        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Delete a website with its forms and leads
    #[command(alias = "rm")]
    Delete {
        /// Website ID
        website: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FORMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FormsArgs {
    #[command(subcommand)]
    pub command: FormsCommand,
}

#[derive(Debug, Subcommand)]
pub enum FormsCommand {
    /// List the saved forms of a website
    #[command(alias = "ls")]
    List {
        /// Website ID
        website: String,
    },

    /// Scan a page for forms and review the candidates
    Detect {
        /// Website ID the forms belong to
        website: String,

        /// Page to scan
        url: String,

        /// Save every candidate without prompting
        #[arg(long)]
        save_all: bool,
    },

    /// Print the embeddable tracking snippet of a form
    Snippet {
        /// Form ID
        form: String,
    },

    /// Delete a form and its leads
    #[command(alias = "rm")]
    Delete {
        /// Form ID
        form: String,

        /// Website the form belongs to (narrows the refresh)
        #[arg(long, short = 'w')]
        website: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LEADS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LeadsArgs {
    #[command(subcommand)]
    pub command: LeadsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LeadsCommand {
    /// List captured leads
    #[command(alias = "ls")]
    List {
        /// Only leads captured by this form
        #[arg(long, short = 'f')]
        form: Option<String>,

        /// Earliest capture date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Latest capture date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ANALYTICS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    /// Days of history for the daily series
    #[arg(long, short = 'd', default_value = "30", value_parser = clap::value_parser!(u32).range(1..=365))]
    pub days: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key: api_url, session, timeout, read_retries, max_age,
        /// insecure, ca_cert
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
