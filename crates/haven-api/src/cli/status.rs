//! System status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display session counts, assistant backend, and storage location.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let stats = state.dashboard_stats().await?;
    let provider = state.assistant_service.provider_name();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "assistant_provider": provider,
            "assistant_model": state.config.assistant.model,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Haven v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Expert sessions ──").dim());
    println!(
        "  Pending:   {}",
        if stats.pending_expert_sessions > 0 {
            style(stats.pending_expert_sessions).yellow().bold()
        } else {
            style(stats.pending_expert_sessions).dim()
        }
    );
    println!("  Active:    {}", style(stats.active_expert_sessions).green());
    println!("  Completed: {}", stats.completed_expert_sessions);
    println!();

    println!("  {}", style("── Usage ──").dim());
    println!("  Profiles:               {}", style(stats.total_users).bold());
    println!(
        "  AI conversations (24h): {}",
        stats.recent_ai_conversations
    );
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Assistant: {} ({})", provider, style(&state.config.assistant.model).dim());
    println!("  Data dir:  {}", style(state.data_dir.display()).dim());
    println!("  Database:  {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}
