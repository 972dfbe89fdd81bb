//! CLI command definitions and dispatch for the `haven` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! resource (`haven user create`, `haven session accept <id>`).

pub mod ask;
pub mod session;
pub mod status;
pub mod user;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

use haven_types::identity::Principal;

use crate::state::AppState;

/// Mental health support with an AI assistant and human counsellors.
#[derive(Parser)]
#[command(name = "haven", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "HAVEN_LOG_JSON")]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "HAVEN_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage profiles and API tokens.
    User {
        #[command(subcommand)]
        action: user::UserCommand,
    },

    /// Work with expert chat sessions.
    Session {
        #[command(subcommand)]
        action: session::SessionCommand,
    },

    /// Chat with the AI assistant and escalate to a human expert.
    Ask {
        /// Profile id to chat as.
        #[arg(long = "as", value_name = "PROFILE_ID")]
        as_profile: Uuid,

        /// Re-attach to an open expert session.
        #[arg(long, value_name = "SESSION_ID")]
        resume: Option<Uuid>,
    },

    /// System status dashboard.
    Status,

    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `[server].port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `[server].host`).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Resolve `--as <profile-id>` to the principal the command acts as.
pub async fn resolve_principal(state: &AppState, profile_id: &Uuid) -> anyhow::Result<Principal> {
    let profile = state
        .identity_service
        .get(profile_id)
        .await
        .with_context(|| format!("no profile with id {profile_id}"))?;
    Ok(Principal::from(&profile))
}
