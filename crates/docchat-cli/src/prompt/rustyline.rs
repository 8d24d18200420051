use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use docchat::models::message::{ChatMessage, MessagePart};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{Input, InputType, Prompt, Theme};

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m(docs)> \x1b[0m";
const BUSY_MESSAGE: &str = "Searching the docs";

pub struct RustylinePrompt {
    spinner: cliclack::ProgressBar,
    theme: Theme,
    editor: DefaultEditor,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        Ok(RustylinePrompt {
            spinner: spinner(),
            theme: Theme::Dark,
            editor: DefaultEditor::new()?,
        })
    }

    fn theme_name(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

fn print_markdown(content: &str, theme: &str) {
    if let Err(e) = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
    {
        tracing::warn!("Falling back to plain output: {}", e);
        println!("{}", content);
    }
}

fn print_source(title: Option<&str>, url: &str, snippet: Option<&str>, theme: &str) {
    println!();
    println!(
        "─── {} ──────────────────────────",
        style(title.unwrap_or(url)).bold()
    );
    println!("🔗 {}", style(url).cyan().underlined());
    if let Some(snippet) = snippet.filter(|s| !s.is_empty()) {
        print!("📝 ");
        print_markdown(snippet, theme);
    }
}

fn print_help() {
    println!("Commands:");
    println!("/exit | /quit - Exit the session");
    println!("/clear - Start a new conversation");
    println!("/retry - Ask again for the last answer");
    println!("/t - Toggle Light/Dark theme");
    println!("/? | /help - Display this help message");
    println!("Ctrl+C - Interrupt a search (puts the question back into the input)");
}

// Slash commands are case-insensitive; anything else is a message
fn parse_command(text: &str) -> Option<InputType> {
    let command = text.to_ascii_lowercase();
    match command.as_str() {
        "/exit" | "/quit" => Some(InputType::Exit),
        "/clear" => Some(InputType::Clear),
        "/retry" => Some(InputType::Retry),
        _ => None,
    }
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, message: &ChatMessage) {
        let theme = self.theme_name();

        for part in &message.parts {
            match part {
                MessagePart::Text { text, .. } => print_markdown(text, theme),
                MessagePart::Reasoning { text, .. } => println!("{}", style(text).dim()),
                MessagePart::SourceUrl { url, title, .. } => {
                    print_source(title.as_deref(), url, part.snippet(), theme)
                }
                MessagePart::File { media_type, .. } => {
                    println!("{}", style(format!("[file: {}]", media_type)).dim())
                }
                MessagePart::Unsupported => {}
            }
        }

        println!();
        let _ = io::stdout().flush();
    }

    fn render_error(&mut self, error: &str) {
        println!("{} {}", style("error:").red().bold(), error);
    }

    fn render_notice(&mut self, notice: &str) {
        println!("{}", style(notice).dim());
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start(format!("{}...", BUSY_MESSAGE));
    }

    fn hide_busy(&self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self, initial: Option<&str>) -> Result<Input> {
        let input = match initial {
            Some(initial) => self.editor.readline_with_initial(PROMPT, (initial, "")),
            None => self.editor.readline(PROMPT),
        };
        let message_text = match input {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                match e {
                    ReadlineError::Interrupted | ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {}", e),
                }
                return Ok(Input::of(InputType::Exit));
            }
        };

        if message_text.is_empty() {
            return Ok(Input::of(InputType::AskAgain));
        }
        let _ = self.editor.add_history_entry(message_text.as_str());

        if let Some(input_type) = parse_command(&message_text) {
            return Ok(Input::of(input_type));
        }

        if message_text.eq_ignore_ascii_case("/t") {
            self.theme = match self.theme {
                Theme::Light => {
                    println!("Switching to Dark theme");
                    Theme::Dark
                }
                Theme::Dark => {
                    println!("Switching to Light theme");
                    Theme::Light
                }
            };
            Ok(Input::of(InputType::AskAgain))
        } else if message_text.eq_ignore_ascii_case("/?")
            || message_text.eq_ignore_ascii_case("/help")
        {
            print_help();
            Ok(Input::of(InputType::AskAgain))
        } else {
            Ok(Input::message(message_text))
        }
    }

    fn close(&self) {
        // No cleanup required
    }
}
