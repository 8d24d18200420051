use std::collections::VecDeque;

use anyhow::Result;
use docchat::models::message::ChatMessage;

use super::{Input, InputType, Prompt};

/// Scripted prompt that records everything the session shows
#[derive(Default)]
pub struct MockPrompt {
    pub inputs: VecDeque<Input>,
    pub rendered: Vec<ChatMessage>,
    pub errors: Vec<String>,
    pub notices: Vec<String>,
    /// Initial text offered with each input request, in order
    pub initials: Vec<Option<String>>,
}

impl MockPrompt {
    pub fn new(inputs: Vec<Input>) -> Self {
        Self {
            inputs: inputs.into(),
            ..Default::default()
        }
    }
}

impl Prompt for &mut MockPrompt {
    fn render(&mut self, message: &ChatMessage) {
        self.rendered.push(message.clone());
    }

    fn render_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn render_notice(&mut self, notice: &str) {
        self.notices.push(notice.to_string());
    }

    fn get_input(&mut self, initial: Option<&str>) -> Result<Input> {
        self.initials.push(initial.map(str::to_string));
        Ok(self
            .inputs
            .pop_front()
            .unwrap_or_else(|| Input::of(InputType::Exit)))
    }

    fn show_busy(&mut self) {}

    fn hide_busy(&self) {}

    fn close(&self) {}

    fn ready(&self, _title: &str, _empty_state: &super::EmptyState) {}
}
