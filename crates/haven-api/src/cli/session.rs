//! Expert session commands, mostly for admins working the queue.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use haven_core::expert::access::AccessPolicy;
use haven_types::expert::{ExpertChatSession, ExpertSessionFilter, ExpertSessionStatus, Urgency};
use haven_types::message::SenderRole;

use crate::cli::resolve_principal;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum SessionCommand {
    /// List sessions visible to the acting profile.
    #[command(alias = "ls")]
    List {
        #[arg(long = "as", value_name = "PROFILE_ID")]
        as_profile: Uuid,

        /// Only sessions with this status.
        #[arg(long)]
        status: Option<ExpertSessionStatus>,
    },

    /// Show a session and its messages.
    Show {
        id: Uuid,

        #[arg(long = "as", value_name = "PROFILE_ID")]
        as_profile: Uuid,
    },

    /// Take a pending session (admins only).
    Accept {
        id: Uuid,

        #[arg(long = "as", value_name = "PROFILE_ID")]
        as_profile: Uuid,
    },

    /// Close an active session (admins only).
    Complete {
        id: Uuid,

        #[arg(long = "as", value_name = "PROFILE_ID")]
        as_profile: Uuid,
    },

    /// Post a message to a session.
    Reply {
        id: Uuid,

        /// Message text.
        text: String,

        #[arg(long = "as", value_name = "PROFILE_ID")]
        as_profile: Uuid,
    },

    /// Delete a session.
    #[command(alias = "rm")]
    Delete {
        id: Uuid,

        #[arg(long = "as", value_name = "PROFILE_ID")]
        as_profile: Uuid,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(state: &AppState, action: SessionCommand, json: bool) -> Result<()> {
    match action {
        SessionCommand::List { as_profile, status } => {
            let principal = resolve_principal(state, &as_profile).await?;
            let filter = ExpertSessionFilter {
                status,
                ..Default::default()
            };
            let sessions = state.expert_service.list_sessions(&principal, filter).await?;
            print_list(&sessions, json)
        }
        SessionCommand::Show { id, as_profile } => {
            let principal = resolve_principal(state, &as_profile).await?;
            let session = state.expert_service.get_session(&principal, &id).await?;
            print_session(&session, json)
        }
        SessionCommand::Accept { id, as_profile } => {
            let principal = resolve_principal(state, &as_profile).await?;
            let session = state.expert_service.accept(&principal, &id).await?;
            print_outcome(&session, "Accepted", json)
        }
        SessionCommand::Complete { id, as_profile } => {
            let principal = resolve_principal(state, &as_profile).await?;
            let session = state.expert_service.complete(&principal, &id).await?;
            print_outcome(&session, "Completed", json)
        }
        SessionCommand::Reply {
            id,
            text,
            as_profile,
        } => {
            let principal = resolve_principal(state, &as_profile).await?;
            let sender = AccessPolicy::sender_for(&principal);
            let session = state
                .expert_service
                .append_message(&principal, &id, &text, sender)
                .await?;
            print_outcome(&session, "Sent to", json)
        }
        SessionCommand::Delete {
            id,
            as_profile,
            force,
        } => {
            let principal = resolve_principal(state, &as_profile).await?;
            if !force && !json {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Permanently delete expert session {}?",
                        style(id).red().bold()
                    ))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("  Cancelled.");
                    return Ok(());
                }
            }
            state.expert_service.delete_session(&principal, &id).await?;
            if json {
                println!("{}", serde_json::json!({ "deleted": true, "id": id }));
            } else {
                println!("  {} Deleted session {}", style("✓").green().bold(), id);
            }
            Ok(())
        }
    }
}

fn status_cell(status: ExpertSessionStatus) -> Cell {
    match status {
        ExpertSessionStatus::Pending => Cell::new("○ pending").fg(Color::Yellow),
        ExpertSessionStatus::Active => Cell::new("● active").fg(Color::Green),
        ExpertSessionStatus::Completed => Cell::new("◌ completed").fg(Color::DarkGrey),
    }
}

fn urgency_cell(urgency: Urgency) -> Cell {
    let color = match urgency {
        Urgency::Low => Color::DarkGrey,
        Urgency::Normal => Color::White,
        Urgency::High => Color::Yellow,
        Urgency::Urgent => Color::Red,
    };
    Cell::new(urgency).fg(color)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max - 3).collect();
        format!("{cut}...")
    }
}

fn print_list(sessions: &[ExpertChatSession], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!("  {} No expert sessions found.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Urgency").fg(Color::White),
        Cell::new("Reason").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for session in sessions {
        let reason = session.user_request_reason.as_deref().unwrap_or("-");
        table.add_row(vec![
            Cell::new(session.id).fg(Color::DarkGrey),
            status_cell(session.status),
            urgency_cell(session.urgency),
            Cell::new(truncate(reason, 40)),
            Cell::new(session.messages.len()),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn sender_label(sender: SenderRole) -> console::StyledObject<&'static str> {
    match sender {
        SenderRole::User => style("user  ").cyan(),
        SenderRole::Ai => style("system").dim(),
        SenderRole::Doctor => style("expert").magenta(),
    }
}

fn print_session(session: &ExpertChatSession, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} [{}] urgency {}",
        style("Session").bold(),
        style(session.id).cyan(),
        session.status,
        session.urgency
    );
    if let Some(reason) = &session.user_request_reason {
        println!("  Reason:   {reason}");
    }
    if let Some(root) = &session.mental_issue_root {
        println!("  Concern:  {root}");
    }
    println!("  Semester: {}", session.semester);
    match session.admin_id {
        Some(admin) => println!("  Expert:   {}", style(admin).dim()),
        None => println!("  Expert:   {}", style("waiting for an expert").yellow()),
    }
    println!();
    for message in &session.messages {
        println!(
            "  {} {} {}",
            style(message.timestamp.format("%H:%M")).dim(),
            sender_label(message.sender),
            message.content
        );
    }
    println!();
    Ok(())
}

fn print_outcome(session: &ExpertChatSession, verb: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
    } else {
        println!(
            "  {} {} session {} (now {})",
            style("✓").green().bold(),
            verb,
            style(session.id).cyan(),
            session.status
        );
    }
    Ok(())
}
