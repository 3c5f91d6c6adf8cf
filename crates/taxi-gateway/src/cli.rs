//! CLI (Command Line Interface) mode
//!
//! Interactive REPL that sends every line through the support agent, as
//! if it came from a single customer.

use std::borrow::Cow;
use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, Emacs, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch, Reedline, ReedlineEvent,
    ReedlineMenu, Signal, Span, Suggestion,
};
use taxi_support::{AnswerSource, SupportAgent};
use tracing::info;

/// Conversation key used for CLI and one-shot questions
pub const CLI_USER: &str = "cli";

/// Available commands for autocomplete display
const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/history", "Show the conversation history"),
    ("/clear", "Clear the conversation history"),
    ("/exit", "Exit the program"),
    ("/quit", "Exit the program"),
];

/// Command completer for reedline
#[derive(Clone)]
pub struct CommandCompleter {
    commands: Vec<(&'static str, &'static str)>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.to_vec(),
        }
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        if !line.starts_with('/') {
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(line))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                span: Span::new(0, pos),
                append_whitespace: true,
                ..Default::default()
            })
            .collect()
    }
}

/// Custom prompt with colored styling
struct ColoredPrompt {
    style: Style,
}

impl ColoredPrompt {
    fn new() -> Self {
        Self {
            style: Color::Cyan.bold(),
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(self.style.paint("🚕 > ").to_string())
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        Cow::Borrowed("")
    }
}

/// What the REPL should do after a line
#[derive(Debug, PartialEq, Eq)]
enum CommandOutcome {
    /// Not a command; send it to the agent
    Message,
    Handled,
    Exit,
}

/// Run CLI interactive mode
pub async fn run_cli(agent: Arc<SupportAgent>) -> anyhow::Result<()> {
    let responder = agent.responder();
    info!(
        "Starting CLI mode with {} FAQ entries (generation {})",
        responder.matcher().knowledge().len(),
        if responder.generation_enabled() { "on" } else { "off" }
    );

    print_welcome();

    let mut keybindings = default_keybindings();

    // Trigger completion on '/' key
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Char('/'),
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );

    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(40))
            .with_only_buffer_difference(false),
    );

    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    let mut line_editor = Reedline::create()
        .with_completer(Box::new(CommandCompleter::new()))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = ColoredPrompt::new();

    loop {
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                match handle_command(input, &agent) {
                    CommandOutcome::Exit => break,
                    CommandOutcome::Handled => continue,
                    CommandOutcome::Message => {}
                }

                let reply = agent.handle(CLI_USER, input).await;
                println!("\n{}", reply.text);
                println!("{}\n", source_label(reply.source, reply.confidence));
            }
            Ok(Signal::CtrlC) => {
                println!("^C");
                continue;
            }
            Ok(Signal::CtrlD) => break,
            Err(err) => {
                eprintln!("\n❌ Error: {}\n", err);
                break;
            }
        }
    }

    println!("\n👋 Goodbye!\n");
    Ok(())
}

/// Default keybindings for reedline
fn default_keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('c'), ReedlineEvent::CtrlC);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::CtrlD);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings
}

/// Handle special commands (/help, /history, /clear, /exit)
fn handle_command(input: &str, agent: &SupportAgent) -> CommandOutcome {
    let lower = input.to_lowercase();

    match lower.as_str() {
        "/exit" | "/quit" | "/q" => CommandOutcome::Exit,
        "/clear" => {
            match agent.clear_history(CLI_USER) {
                Ok(removed) => println!("\n✅ Cleared {} message(s).\n", removed),
                Err(e) => eprintln!("\n❌ Could not clear history: {}\n", e),
            }
            CommandOutcome::Handled
        }
        "/help" | "/?" => {
            print_help();
            CommandOutcome::Handled
        }
        "/history" => {
            print_history(agent);
            CommandOutcome::Handled
        }
        _ if lower.starts_with('/') => {
            eprintln!("\n❓ Unknown command: {}. Use /help for the command list.\n", input);
            CommandOutcome::Handled
        }
        _ => CommandOutcome::Message,
    }
}

fn source_label(source: AnswerSource, confidence: f64) -> String {
    Style::new()
        .dimmed()
        .paint(format!("[{} · confidence {:.2}]", source, confidence))
        .to_string()
}

fn print_welcome() {
    println!();
    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║          🚕 taxi-gateway CLI - customer support            ║");
    println!("╠════════════════════════════════════════════════════════════╣");
    println!("║  Type a question in English or Arabic and press Enter      ║");
    println!("║  Commands: /help, /history, /clear, /exit                  ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();
}

fn print_help() {
    println!();
    println!("📖 Available commands:");
    for (cmd, desc) in COMMANDS {
        println!("  {} - {}", cmd, desc);
    }
    println!();
}

fn print_history(agent: &SupportAgent) {
    let entries = match agent.history(CLI_USER) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("\n❌ Could not load history: {}\n", e);
            return;
        }
    };

    println!();
    if let Ok(Some(summary)) = agent.conversation(CLI_USER) {
        println!(
            "📊 {} message(s) in total, last at {} ({})",
            summary.message_count,
            summary.last_interaction.format("%Y-%m-%d %H:%M"),
            summary.language
        );
    }
    println!("📜 Conversation history ({} messages):", entries.len());
    println!("{}", "─".repeat(50));

    for (i, entry) in entries.iter().enumerate() {
        let line = entry.to_string().replace('\n', " ");
        let preview: String = line.chars().take(100).collect();
        let ellipsis = if line.chars().count() > 100 { "..." } else { "" };
        println!("{}. {}{}", i + 1, preview, ellipsis);
    }

    println!("{}", "─".repeat(50));
    println!();
}
