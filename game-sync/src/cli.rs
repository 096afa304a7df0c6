use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use game_sync::config::{AppConfig, ExclusionKind};
use game_sync::config::app::{DEFAULT_DIAGNOSTIC_EVERY, DEFAULT_TICK_INTERVAL};

#[derive(Parser, Debug)]
#[command(name = "game-sync")]
#[command(about = "Keeps the Twitch title and category in sync with the game you are playing")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding config.json, excluded_processes.json and credentials.toml
    #[arg(long, global = true, env = "GAME_SYNC_CONFIG_DIR", default_value = ".")]
    pub config_dir: PathBuf,

    /// Directory for rolling log files
    #[arg(long, global = true, env = "GAME_SYNC_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor running processes and update the channel until Ctrl-C
    Run {
        /// Seconds between two scans
        #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL.as_secs())]
        interval: u64,

        /// Log a full process diagnostic every N scans (0 disables)
        #[arg(long, default_value_t = DEFAULT_DIAGNOSTIC_EVERY)]
        diagnostic_every: u64,

        /// Helix API base URL
        #[arg(long, env = "GAME_SYNC_HELIX_URL")]
        helix_url: Option<String>,
    },

    /// Print a one-off diagnostic scan and the detected game
    Scan,

    /// List running, non-excluded process names
    Processes,

    /// Inspect or edit the game mapping
    Mapping {
        #[command(subcommand)]
        action: MappingAction,
    },

    /// Inspect or edit the excluded processes
    Exclusions {
        #[command(subcommand)]
        action: ExclusionAction,
    },

    /// Create missing configuration files
    Init {
        /// URL of the default mapping to download
        #[arg(long, env = "GAME_SYNC_MAPPING_URL")]
        mapping_url: Option<String>,

        /// Write an empty mapping instead of downloading one
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum MappingAction {
    /// Show the title template and every mapped game
    List,

    /// Add or update a game
    Add {
        /// Game label, used in the title
        game: String,

        /// Process name to look for
        process: String,

        /// Twitch category to switch to
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Remove a game
    Remove { game: String },
}

#[derive(Subcommand, Debug)]
pub enum ExclusionAction {
    /// Show excluded process names and prefixes
    List,

    /// Exclude a process name, or every name starting with a prefix
    Add {
        value: String,

        /// Treat the value as a name prefix
        #[arg(short, long)]
        prefix: bool,
    },

    /// Stop excluding a process name or prefix
    Remove {
        value: String,

        /// Treat the value as a name prefix
        #[arg(short, long)]
        prefix: bool,
    },
}

impl ExclusionAction {
    pub fn kind(prefix: bool) -> ExclusionKind {
        if prefix {
            ExclusionKind::Prefix
        } else {
            ExclusionKind::Name
        }
    }
}

impl Args {
    /// Runtime settings from the global flags and the command's own flags.
    pub fn app_config(&self) -> AppConfig {
        let mut config = AppConfig::default()
            .with_config_dir(&self.config_dir)
            .with_log_dir(&self.log_dir);

        match &self.command {
            Commands::Run {
                interval,
                diagnostic_every,
                helix_url,
            } => {
                config = config
                    .with_tick_interval(Duration::from_secs(*interval))
                    .with_diagnostic_every(*diagnostic_every);
                if let Some(url) = helix_url {
                    config = config.with_helix_base_url(url);
                }
            }
            Commands::Init {
                mapping_url: Some(url),
                ..
            } => config = config.with_mapping_url(url),
            _ => {}
        }
        config
    }
}
