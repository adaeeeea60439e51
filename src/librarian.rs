use async_trait::async_trait;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::models::{ChatMessage, Content, GenerateContentRequest, Role};
use crate::transport::Transport;

pub const PERSONA: &str = "You are the knowledgeable, warm, and slightly witty head librarian of 'Whose Books', an independent bookstore. You love helping people find their next great read. Keep answers concise (under 100 words) unless asked for a deep dive.";

pub const GREETING: &str =
    "Hello! I'm the shop's AI Librarian. Looking for a specific genre, or maybe a gift for someone picky?";

/// Sent when the service answers without any text
pub const NO_TEXT_FALLBACK: &str =
    "I'm having a little trouble finding that in the stacks right now.";

/// Sent when the call itself fails
pub const ERROR_FALLBACK: &str =
    "I'm sorry, I seem to have lost my train of thought. Could you ask that again?";

/// One chat turn against the librarian persona. Never fails: errors become a fallback line.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Librarian: Send + Sync {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> String;
}

pub struct GeminiLibrarian {
    tx: Arc<dyn Transport>,
    model: String,
}

impl GeminiLibrarian {
    pub fn new(tx: Arc<dyn Transport>, model: String) -> Self {
        Self { tx, model }
    }
}

/// Prior transcript in the service's turn format, then the new user turn
pub fn build_request(history: &[ChatMessage], message: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|m| Content::turn(m.role, m.text.clone()))
        .collect();
    contents.push(Content::turn(Role::User, message));

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content::instruction(PERSONA)),
        generation_config: None,
    }
}

#[async_trait]
impl Librarian for GeminiLibrarian {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> String {
        tracing::info!(
            "Sending chat turn to Gemini ({} prior messages)",
            history.len()
        );

        let request = build_request(history, message);
        match self.tx.generate(&self.model, &request).await {
            Ok(response) => response.text().unwrap_or_else(|| {
                tracing::warn!("Gemini chat returned no text");
                NO_TEXT_FALLBACK.to_string()
            }),
            Err(e) => {
                tracing::error!("Chat error: {}", e);
                ERROR_FALLBACK.to_string()
            }
        }
    }
}
