//! # Pathyvo CLI Module
//!
//! ## Available Commands
//!
//! - `login` / `logout` / `whoami` - Manage the stored session
//! - `dashboard` - Roadmap list and headline numbers (default)
//! - `roadmap` - Create or show a roadmap and run its actions
//! - `achievements` - Achievement board
//! - `analytics` - Progress analytics and weekly chart
//! - `activity` - Recent milestones and achievements
//! - `chat` - Talk to the mentor about a roadmap

mod commands;

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{AppError, SessionError};
use crate::session::SessionStore;
use clap::{Parser, Subcommand};
use pathyvo_core::primitives::ACTIVITY_LOG_LIMIT;
use pathyvo_core::{MilestoneId, RoadmapId};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Pathyvo - career roadmaps in your terminal
///
/// Track milestone progress, review achievements and talk to your mentor.
#[derive(Parser, Debug)]
#[command(name = "pathyvo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner and informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend base URL (overrides config and PATHYVO_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "PATHYVO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "PATHYVO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show roadmaps and headline numbers
    Dashboard,

    /// Roadmap details and actions
    Roadmap {
        #[command(subcommand)]
        action: RoadmapCommand,
    },

    /// Show the achievement board
    Achievements,

    /// Show progress analytics
    Analytics,

    /// Show recent milestones and achievements
    Activity {
        /// Maximum number of entries
        #[arg(short, long, default_value_t = ACTIVITY_LOG_LIMIT)]
        limit: usize,
    },

    /// Talk to the roadmap's mentor (reads stdin when no message is given)
    Chat {
        /// Roadmap the conversation is about
        roadmap_id: u64,

        /// Message to send
        message: Option<String>,
    },
}

/// Roadmap subcommands.
#[derive(Subcommand, Debug)]
pub enum RoadmapCommand {
    /// Start a new roadmap in a field and open its mentor conversation
    Create {
        /// Field of interest, e.g. "Data Science"
        #[arg(short, long)]
        field: String,

        /// What you hope to achieve
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show milestones with their status
    Show { id: u64 },

    /// Complete the current milestone
    Complete { roadmap_id: u64, milestone_id: u64 },

    /// Mark every milestone complete
    CompleteAll {
        id: u64,

        /// Confirm the action
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a roadmap
    Rename { id: u64, title: String },

    /// Delete a roadmap
    Delete {
        id: u64,

        /// Confirm the action
        #[arg(short, long)]
        yes: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Build the client from config and the stored session.
pub fn connect(cli: &Cli) -> Result<ApiClient, AppError> {
    let config = Config::load(cli.config.as_deref(), cli.api_url.as_deref())?;
    let session_path = config.session_file.clone().ok_or(SessionError::NoLocation)?;
    let session = SessionStore::open(session_path)?;
    Ok(ApiClient::new(&config, session)?)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let client = connect(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Login { email, password }) => {
            cmd_login(&client, json_mode, &email, &password).await
        }
        Some(Commands::Logout) => cmd_logout(&client, json_mode),
        Some(Commands::Whoami) => cmd_whoami(&client, json_mode).await,
        Some(Commands::Roadmap { action }) => match action {
            RoadmapCommand::Create { field, description } => {
                cmd_roadmap_create(&client, json_mode, &field, description.as_deref()).await
            }
            RoadmapCommand::Show { id } => cmd_roadmap_show(&client, json_mode, RoadmapId(id)).await,
            RoadmapCommand::Complete {
                roadmap_id,
                milestone_id,
            } => {
                cmd_roadmap_complete(
                    &client,
                    json_mode,
                    RoadmapId(roadmap_id),
                    MilestoneId(milestone_id),
                )
                .await
            }
            RoadmapCommand::CompleteAll { id, yes } => {
                cmd_roadmap_complete_all(&client, json_mode, RoadmapId(id), yes).await
            }
            RoadmapCommand::Rename { id, title } => {
                cmd_roadmap_rename(&client, json_mode, RoadmapId(id), &title).await
            }
            RoadmapCommand::Delete { id, yes } => {
                cmd_roadmap_delete(&client, json_mode, RoadmapId(id), yes).await
            }
        },
        Some(Commands::Achievements) => cmd_achievements(&client, json_mode).await,
        Some(Commands::Analytics) => cmd_analytics(&client, json_mode).await,
        Some(Commands::Activity { limit }) => cmd_activity(&client, json_mode, limit).await,
        Some(Commands::Chat {
            roadmap_id,
            message,
        }) => cmd_chat(&client, json_mode, RoadmapId(roadmap_id), message).await,
        Some(Commands::Dashboard) | None => cmd_dashboard(&client, json_mode).await,
    }
}

#[allow(clippy::unwrap_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_roadmap_complete() {
        let cli = Cli::try_parse_from(["pathyvo", "roadmap", "complete", "4", "17"]).unwrap();
        match cli.command {
            Some(Commands::Roadmap {
                action:
                    RoadmapCommand::Complete {
                        roadmap_id,
                        milestone_id,
                    },
            }) => {
                assert_eq!(roadmap_id, 4);
                assert_eq!(milestone_id, 17);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_command_means_dashboard() {
        let cli = Cli::try_parse_from(["pathyvo", "--json-mode"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.json_mode);
    }

    #[test]
    fn parses_roadmap_create() {
        let cli = Cli::try_parse_from([
            "pathyvo",
            "roadmap",
            "create",
            "--field",
            "Data Science",
            "-d",
            "Switch careers",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Roadmap {
                action: RoadmapCommand::Create { field, description },
            }) => {
                assert_eq!(field, "Data Science");
                assert_eq!(description.as_deref(), Some("Switch careers"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn activity_limit_defaults() {
        let cli = Cli::try_parse_from(["pathyvo", "activity"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Activity { limit: ACTIVITY_LOG_LIMIT })
        ));
    }
}
