use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Flexible price deserializer to handle numbers or numeric strings from the model
pub(crate) fn deserialize_flexible_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexiblePrice {
        Float(f64),
        String(String),
    }

    let value = FlexiblePrice::deserialize(deserializer)?;
    match value {
        FlexiblePrice::Float(f) => Ok(f),
        FlexiblePrice::String(s) => s
            .trim()
            .trim_start_matches('$')
            .parse::<f64>()
            .map_err(serde::de::Error::custom),
    }
}

/// A book available for browsing or purchase
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub price: f64,
    pub genre: String,
    /// Seed for the placeholder cover image
    pub cover_seed: u32,
    /// Set when the entry came from the generation service rather than the shelf
    #[serde(default, rename = "isAIRecommended")]
    pub is_ai_recommended: bool,
}

/// A cart line: the book plus how many copies are in the bag
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CartItem {
    #[serde(flatten)]
    pub book: Book,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(book: Book) -> Self {
        Self { book, quantity: 1 }
    }

    pub fn subtotal(&self) -> f64 {
        self.book.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Assistant,
}

impl Role {
    /// Role name in the generation service's turn format
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Home,
    Shop,
    Cart,
}

// Gemini generateContent request format
#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn turn(role: Role, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.as_wire().to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

// Gemini generateContent response format
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Build a response carrying a single text part
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![CandidatePart {
                        text: Some(text.into()),
                    }],
                }),
            }]),
        }
    }

    /// Concatenated text parts of the first candidate, if it produced any text
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.as_ref()?.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_first_candidate_parts() {
        let raw = r#"{"candidates":[
            {"content":{"parts":[{"text":"Hello, "},{"text":"reader."}]}},
            {"content":{"parts":[{"text":"ignored"}]}}
        ]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.text().as_deref(), Some("Hello, reader."));
    }

    #[test]
    fn test_response_without_text_is_none() {
        let resp: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.text().is_none());

        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(resp.text().is_none());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let req = GenerateContentRequest {
            contents: vec![Content::turn(Role::Assistant, "hi")],
            system_instruction: Some(Content::instruction("be kind")),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: None,
            }),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["contents"][0]["role"], "model");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be kind");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(value["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_cart_item_subtotal() {
        let mut item = CartItem::new(Book {
            id: "1".to_string(),
            title: "T".to_string(),
            author: "A".to_string(),
            description: "D".to_string(),
            price: 2.5,
            genre: "G".to_string(),
            cover_seed: 1,
            is_ai_recommended: false,
        });
        item.quantity = 3;
        assert!((item.subtotal() - 7.5).abs() < 1e-9);
    }
}
