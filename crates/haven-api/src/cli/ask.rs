//! Interactive chat: AI assistant first, human expert on request.
//!
//! Lines typed at the prompt go to the AI assistant until the user runs
//! `/expert`. From then on they go to the expert session, and pushed
//! changes (expert joined, new replies, session closed) are printed as they
//! arrive. When the expert completes the session the chat falls back to
//! the assistant.

use std::io::Write;

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use haven_core::expert::manager::{ChatMode, ExpertChatManager, ManagerNotice};
use haven_infra::sqlite::expert::SqliteExpertSessionRepository;
use haven_types::expert::Urgency;
use haven_types::identity::Principal;
use haven_types::message::SenderRole;

use crate::cli::resolve_principal;
use crate::state::AppState;

type Manager = ExpertChatManager<SqliteExpertSessionRepository>;

/// What the user typed, once slash commands are recognized.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Quit,
    Expert(Option<&'a str>),
    Leave,
    Help,
    Text(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/leave" => Input::Leave,
        "/help" => Input::Help,
        _ => match line.strip_prefix("/expert") {
            Some(rest) if rest.is_empty() || rest.starts_with(' ') => {
                let reason = rest.trim();
                Input::Expert((!reason.is_empty()).then_some(reason))
            }
            _ => Input::Text(line),
        },
    }
}

struct ChatLoop<'a> {
    state: &'a AppState,
    principal: Principal,
    manager: Manager,
    conversation_id: Option<Uuid>,
    /// Last message the user sent to the assistant, reused as the default reason.
    last_ai_message: Option<String>,
    suggested_urgency: Option<Urgency>,
    /// Messages of the expert session already on screen.
    printed: usize,
}

pub async fn run(state: &AppState, as_profile: &Uuid, resume: Option<Uuid>) -> Result<()> {
    let principal = resolve_principal(state, as_profile).await?;
    let mut chat = ChatLoop {
        state,
        principal,
        manager: ExpertChatManager::new(state.expert_service.clone(), principal),
        conversation_id: None,
        last_ai_message: None,
        suggested_urgency: None,
        printed: 0,
    };

    println!();
    println!(
        "  {} Chatting with the {} assistant. Type {} for commands.",
        style("💬").bold(),
        state.assistant_service.provider_name(),
        style("/help").yellow()
    );
    println!();

    if let Some(session_id) = resume {
        match chat.manager.resume(&session_id).await {
            Ok(_) => {
                println!("  {}", style("Reconnected to your expert session.").green());
                chat.print_new_messages(true);
            }
            Err(e) => println!("  {} {e}", style("!").red().bold()),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(chat.manager.mode())?;

        let expert_mode = chat.manager.mode() == ChatMode::Expert;
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !chat.handle_line(&line).await {
                    break;
                }
            }
            notice = chat.manager.next_notice(), if expert_mode => {
                println!();
                match notice {
                    Some(notice) => chat.show_notice(&notice),
                    None => {
                        chat.manager.leave();
                        println!("  {}", style("Lost connection to the expert session.").red());
                    }
                }
            }
        }
    }

    chat.manager.leave();
    println!("  Goodbye.");
    Ok(())
}

fn prompt(mode: ChatMode) -> Result<()> {
    let label = match mode {
        ChatMode::Ai => style("you → ai").cyan(),
        ChatMode::Expert => style("you → expert").magenta(),
    };
    print!("{label} > ");
    std::io::stdout().flush()?;
    Ok(())
}

impl ChatLoop<'_> {
    /// Returns `false` when the user wants to quit.
    async fn handle_line(&mut self, line: &str) -> bool {
        match parse_input(line) {
            Input::Empty => {}
            Input::Quit => return false,
            Input::Help => print_help(),
            Input::Leave => {
                if self.manager.mode() == ChatMode::Expert {
                    self.manager.leave();
                    println!(
                        "  {}",
                        style("Left the expert session. It stays open; resume with --resume.").dim()
                    );
                }
            }
            Input::Expert(reason) => self.request_expert(reason).await,
            Input::Text(text) => match self.manager.mode() {
                ChatMode::Ai => self.ask_assistant(text).await,
                ChatMode::Expert => {
                    if let Err(e) = self.manager.send(text).await {
                        println!("  {} Message not delivered: {e}", style("!").red().bold());
                    }
                    self.printed = self.session_len();
                }
            },
        }
        true
    }

    async fn ask_assistant(&mut self, text: &str) {
        match self
            .state
            .assistant_service
            .reply(&self.principal, self.conversation_id, text)
            .await
        {
            Ok(reply) => {
                self.conversation_id = Some(reply.conversation_id);
                self.last_ai_message = Some(text.to_string());
                println!("  {} {}", style("ai").green().bold(), reply.reply.content);
                if let Some(urgency) = reply.suggested_urgency {
                    self.suggested_urgency = Some(urgency);
                    println!(
                        "  {} Type {} to speak with a human expert.",
                        style("→").yellow(),
                        style("/expert").yellow().bold()
                    );
                }
            }
            Err(e) => println!("  {} The assistant is unavailable: {e}", style("!").red().bold()),
        }
    }

    async fn request_expert(&mut self, reason: Option<&str>) {
        if self.manager.mode() == ChatMode::Expert {
            println!("  {}", style("You are already talking with an expert.").dim());
            return;
        }
        let Some(reason) = reason
            .map(str::to_string)
            .or_else(|| self.last_ai_message.clone())
        else {
            println!("  Usage: {}", style("/expert <what you'd like help with>").yellow());
            return;
        };
        let urgency = self.suggested_urgency.unwrap_or_default();

        match self.manager.request_expert(&reason, urgency).await {
            Ok(session) => {
                println!(
                    "  {} Request sent (urgency {}).",
                    style("✓").green().bold(),
                    session.urgency
                );
                self.printed = 0;
                self.print_new_messages(true);
            }
            Err(e) => println!("  {} Could not reach an expert: {e}", style("!").red().bold()),
        }
    }

    fn show_notice(&mut self, notice: &ManagerNotice) {
        match notice {
            ManagerNotice::Updated => {}
            ManagerNotice::ExpertJoined { .. } => {
                println!("  {}", style(notice.message()).green().bold());
            }
            ManagerNotice::Completed | ManagerNotice::Deleted => {
                println!("  {}", style(notice.message()).yellow());
                self.printed = 0;
                self.suggested_urgency = None;
                return;
            }
        }
        self.print_new_messages(false);
    }

    /// Print messages not yet shown. The user's own lines are skipped unless
    /// `include_own` (they were typed at this prompt).
    fn print_new_messages(&mut self, include_own: bool) {
        let Some(session) = self.manager.session() else {
            return;
        };
        for message in session.messages.iter().skip(self.printed) {
            let label = match message.sender {
                SenderRole::User if !include_own => continue,
                SenderRole::User => style("you").cyan(),
                SenderRole::Ai => style("system").dim(),
                SenderRole::Doctor => style("expert").magenta().bold(),
            };
            println!("  {label} {}", message.content);
        }
        self.printed = session.messages.len();
    }

    fn session_len(&self) -> usize {
        self.manager.session().map_or(0, |s| s.messages.len())
    }
}

fn print_help() {
    println!("  {}          request a human expert", style("/expert [reason]").yellow());
    println!("  {}                    stop watching the expert session", style("/leave").yellow());
    println!("  {}                     exit", style("/quit").yellow());
}
