use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::extract::{RawBook, RecommendationReply, decode_reply};
use crate::models::{Book, Content, GenerateContentRequest, GenerationConfig, Role};
use crate::transport::Transport;

/// Prefix that marks ids minted for generated entries
pub const AI_ID_PREFIX: &str = "ai-";

/// Turns a free-text request into book suggestions. Never fails: errors become an empty list.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(&self, query: &str) -> Vec<Book>;
}

pub struct GeminiRecommender {
    tx: Arc<dyn Transport>,
    model: String,
}

impl GeminiRecommender {
    pub fn new(tx: Arc<dyn Transport>, model: String) -> Self {
        Self { tx, model }
    }
}

fn recommendation_prompt(query: &str) -> String {
    format!(
        "Recommend 4 distinct books based on this request: \"{query}\".\n\
         If the request is vague, provide a diverse mix of high-quality literature.\n\
         Return valid JSON only."
    )
}

fn book_list_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "author": { "type": "STRING" },
                "description": { "type": "STRING" },
                "price": { "type": "NUMBER" },
                "genre": { "type": "STRING" }
            },
            "required": ["title", "author", "description", "price", "genre"]
        }
    })
}

pub fn build_request(query: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::turn(Role::User, recommendation_prompt(query))],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(book_list_schema()),
        }),
    }
}

/// Give each suggestion a shop id, a cover seed and the AI flag
pub fn normalize<R: Rng + ?Sized>(raw: Vec<RawBook>, now_millis: i64, rng: &mut R) -> Vec<Book> {
    raw.into_iter()
        .enumerate()
        .map(|(index, item)| Book {
            id: format!("{AI_ID_PREFIX}{now_millis}-{index}"),
            title: item.title,
            author: item.author,
            description: item.description,
            price: item.price,
            genre: item.genre,
            cover_seed: rng.gen_range(0..1000) + index as u32,
            is_ai_recommended: true,
        })
        .collect()
}

#[async_trait]
impl Recommender for GeminiRecommender {
    async fn recommend(&self, query: &str) -> Vec<Book> {
        tracing::info!("Requesting recommendations from Gemini for query: {}", query);

        let request = build_request(query);
        let response = match self.tx.generate(&self.model, &request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Gemini recommendation error: {}", e);
                return Vec::new();
            }
        };

        let raw_text = response.text().unwrap_or_else(|| "[]".to_string());
        match decode_reply(&raw_text) {
            RecommendationReply::Books(raw) => {
                let books = normalize(raw, Utc::now().timestamp_millis(), &mut rand::thread_rng());
                tracing::info!("Gemini suggested {} books", books.len());
                books
            }
            RecommendationReply::Malformed(reason) => {
                tracing::error!("{}. Raw: {}", reason, raw_text);
                Vec::new()
            }
        }
    }
}
