use anyhow::Result;
use docchat::models::message::ChatMessage;

pub mod rustyline;

#[cfg(test)]
pub mod mock;

pub trait Prompt {
    fn render(&mut self, message: &ChatMessage);
    fn render_error(&mut self, error: &str);
    fn render_notice(&mut self, notice: &str);
    /// Read the next input, pre-filled with `initial` when a failed turn was restored.
    fn get_input(&mut self, initial: Option<&str>) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&self);
    fn close(&self);
    fn ready(&self, title: &str, empty_state: &EmptyState) {
        println!("\n{}\n", title);
        println!("{}", empty_state.title);
        println!("{}\n", empty_state.description);
    }
}

/// Shown before the first message of a conversation
#[derive(Debug, Clone)]
pub struct EmptyState {
    pub title: String,
    pub description: String,
}

impl Default for EmptyState {
    fn default() -> Self {
        Self {
            title: "Ask about the documentation".to_string(),
            description: "Type a question and press enter. /help lists the commands.".to_string(),
        }
    }
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Only set for messages
}

impl Input {
    pub fn of(input_type: InputType) -> Self {
        Self {
            input_type,
            content: None,
        }
    }

    pub fn message<S: Into<String>>(text: S) -> Self {
        Self {
            input_type: InputType::Message,
            content: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    Retry,    // Regenerate the last answer
    Clear,    // Drop the transcript
    Exit,     // User wants to exit the session
}

pub enum Theme {
    Light,
    Dark,
}
