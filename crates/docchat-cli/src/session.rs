use std::sync::Arc;

use anyhow::Result;
use docchat::conversation::Conversation;
use docchat::ids::NanoIdGenerator;
use docchat::models::request::SendMessageRequest;
use docchat::DocSearch;

use crate::prompt::{EmptyState, InputType, Prompt};

const INTERRUPTED: &str = "Interrupted. Your question is back in the input.";

pub struct Session<'a> {
    doc_search: DocSearch,
    conversation: Conversation,
    prompt: Box<dyn Prompt + 'a>,
    title: String,
    empty_state: EmptyState,
    // Text of a failed question, offered again on the next read
    pending_input: Option<String>,
}

impl<'a> Session<'a> {
    pub fn new(doc_search: DocSearch, prompt: Box<dyn Prompt + 'a>, title: String) -> Self {
        Session {
            doc_search,
            conversation: Conversation::new(Arc::new(NanoIdGenerator)),
            prompt,
            title,
            empty_state: EmptyState::default(),
            pending_input: None,
        }
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.ready(&self.title, &self.empty_state);

        loop {
            let initial = self.pending_input.take();
            let input = self.prompt.get_input(initial.as_deref())?;
            let request = match input.input_type {
                InputType::Message => match input.content {
                    Some(content) => self.conversation.submit(&content),
                    None => continue,
                },
                InputType::Retry => self.conversation.regenerate(),
                InputType::Clear => {
                    self.conversation.clear();
                    self.prompt.render_notice("Started a new conversation.");
                    continue;
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            };

            match request {
                Ok(request) => self.process(request).await?,
                Err(e) => self.prompt.render_error(&e.to_string()),
            }
        }

        self.prompt.close();
        Ok(())
    }

    /// Ask a single question and render the answer without reading input.
    pub async fn headless_start(&mut self, question: &str) -> Result<()> {
        let request = self.conversation.submit(question)?;
        self.process(request).await?;
        self.prompt.close();

        match self.conversation.error() {
            Some(error) => Err(anyhow::anyhow!(error.to_string())),
            None => Ok(()),
        }
    }

    async fn process(&mut self, request: SendMessageRequest) -> Result<()> {
        self.prompt.show_busy();
        let response = tokio::select! {
            response = self.doc_search.respond(&request) => response,
            _ = tokio::signal::ctrl_c() => {
                self.prompt.hide_busy();
                self.pending_input = self.conversation.fail(INTERRUPTED);
                self.prompt.render_notice(INTERRUPTED);
                return Ok(());
            }
        };
        self.prompt.hide_busy();

        let restored = self.conversation.receive(&response)?;
        match self.conversation.error() {
            None => {
                if let Some(answer) = self.conversation.messages().last() {
                    self.prompt.render(answer);
                }
            }
            Some(error) => {
                tracing::debug!(status = response.status(), "search request failed");
                self.prompt.render_error(error);
                self.pending_input = restored;
            }
        }
        Ok(())
    }
}
