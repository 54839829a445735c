//! CLI argument parsing and command definitions.
//!
//! Entity commands map one-to-one onto the hospital routes: `list` and
//! `search` open the list route, `view`, `new`, `edit` and `delete` open
//! the matching detail, edit and popup routes.

use clap::{Parser, Subcommand};
use hospital_core::Direction;

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "hospital", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "HOSPITAL_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<BaseCommand>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum BaseCommand {
    /// List hospitals, one page at a time.
    List {
        /// Zero-based page index.
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        /// Page size.
        #[arg(short, long, default_value_t = 20)]
        size: u32,

        /// Sort as `field` or `field,asc|desc`.
        #[arg(long, value_parser = parse_sort)]
        sort: Option<(String, Direction)>,
    },

    /// Search hospitals.
    Search {
        /// Search query.
        query: String,

        /// Zero-based page index.
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        /// Page size.
        #[arg(short, long, default_value_t = 20)]
        size: u32,
    },

    /// Show one hospital.
    View {
        /// Hospital identifier.
        id: String,
    },

    /// Create a hospital.
    New {
        /// Display name.
        #[arg(long)]
        name: String,

        /// Postal address.
        #[arg(long)]
        address: Option<String>,

        /// Switchboard phone number.
        #[arg(long)]
        phone: Option<String>,
    },

    /// Edit an existing hospital. Only the given fields change.
    Edit {
        /// Hospital identifier.
        id: String,

        /// New display name.
        #[arg(long)]
        name: Option<String>,

        /// New postal address.
        #[arg(long)]
        address: Option<String>,

        /// New phone number.
        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete a hospital.
    Delete {
        /// Hospital identifier.
        id: String,

        /// Confirm the deletion. Without it the dialog is cancelled.
        #[arg(long)]
        yes: bool,
    },

    /// Print the route table.
    Routes,

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "api.base_url").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "api.base_url").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

/// Parse `field` or `field,asc|desc` into a sort specification.
pub fn parse_sort(s: &str) -> Result<(String, Direction), String> {
    let (field, direction) = match s.split_once(',') {
        Some((field, dir)) => (field, dir),
        None => (s, "asc"),
    };
    if field.trim().is_empty() {
        return Err("sort field must not be empty".to_string());
    }
    let direction = match direction.trim().to_ascii_lowercase().as_str() {
        "asc" => Direction::Asc,
        "desc" => Direction::Desc,
        other => return Err(format!("unknown sort direction '{other}'")),
    };
    Ok((field.trim().to_string(), direction))
}

// ============================================================================
// Tests
// ============================================================================
