//! Profile and token commands.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Input;
use uuid::Uuid;

use haven_types::identity::UserRole;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a profile and print its first API token.
    Create {
        /// First name (prompted if omitted).
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Role claim: `user` or `admin`.
        #[arg(long, default_value = "user")]
        role: UserRole,
    },

    /// List all profiles.
    #[command(alias = "ls")]
    List,

    /// Issue an additional API token for a profile.
    Token {
        /// Profile id.
        profile_id: Uuid,
    },
}

pub async fn run(state: &AppState, action: UserCommand, json: bool) -> Result<()> {
    match action {
        UserCommand::Create {
            first_name,
            last_name,
            role,
        } => create_user(state, first_name, last_name, role, json).await,
        UserCommand::List => list_users(state, json).await,
        UserCommand::Token { profile_id } => issue_token(state, &profile_id, json).await,
    }
}

async fn create_user(
    state: &AppState,
    first_name: Option<String>,
    last_name: Option<String>,
    role: UserRole,
    json: bool,
) -> Result<()> {
    let first_name = match first_name {
        Some(name) => Some(name),
        None if !json => {
            let entered: String = Input::new()
                .with_prompt("First name (optional)")
                .allow_empty(true)
                .interact_text()?;
            Some(entered)
        }
        None => None,
    };

    let profile = state
        .identity_service
        .register(first_name, last_name, role)
        .await?;
    let token = state.identity_service.issue_token(&profile.id).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "profile": profile,
                "token": token,
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} Created {} {} ({})",
        style("✓").green().bold(),
        profile.role,
        style(profile.display_name()).cyan().bold(),
        style(profile.id).dim()
    );
    println!();
    println!(
        "  {} API token (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(&token).yellow().bold());
    println!();
    Ok(())
}

async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let profiles = state.identity_service.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!();
        println!(
            "  {} No profiles yet. Create one with: {}",
            style("i").blue().bold(),
            style("haven user create").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for profile in &profiles {
        let role_cell = match profile.role {
            UserRole::Admin => Cell::new("admin").fg(Color::Magenta),
            UserRole::User => Cell::new("user").fg(Color::Cyan),
        };
        table.add_row(vec![
            Cell::new(profile.display_name()),
            role_cell,
            Cell::new(profile.id).fg(Color::DarkGrey),
            Cell::new(profile.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
    Ok(())
}

async fn issue_token(state: &AppState, profile_id: &Uuid, json: bool) -> Result<()> {
    let token = state.identity_service.issue_token(profile_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "profile_id": profile_id, "token": token })
        );
    } else {
        println!();
        println!("  {}", style(&token).yellow().bold());
        println!();
    }
    Ok(())
}
