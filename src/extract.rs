//! Recovering a book list from a generation reply.
//!
//! The response schema is advisory, so the reply may still arrive wrapped in
//! prose. Decoding runs in two stages:
//!
//! 1. [`parse_strict`]: the whole (trimmed) reply must be a JSON array.
//! 2. [`locate_array`]: anchor on the first `[` followed by `{` and cut to the
//!    last `]`, so stray brackets in filler text ("a list [of books]") are skipped.
//!
//! Items are then validated one by one; incomplete objects are dropped.

use serde::Deserialize;
use serde_json::Value;

use crate::models::deserialize_flexible_price;

/// A recommended book as described by the model, before normalization
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RawBook {
    pub title: String,
    pub author: String,
    pub description: String,
    #[serde(deserialize_with = "deserialize_flexible_price")]
    pub price: f64,
    pub genre: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationReply {
    /// Well-formed array; holds only the items that passed validation
    Books(Vec<RawBook>),
    /// Anything else, with the reason it was rejected
    Malformed(String),
}

/// Stage 1: the entire reply is a JSON array
pub fn parse_strict(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Stage 2: slice out the embedded array, or `"[]"` when there is none
pub fn locate_array(text: &str) -> &str {
    if let Some(start) = find_object_array_start(text) {
        return match text.rfind(']') {
            Some(end) if end > start => &text[start..=end],
            _ => "[]",
        };
    }

    if text.trim_start().starts_with('[') {
        if let Some(end) = text.rfind(']') {
            return &text[..=end];
        }
    }

    "[]"
}

/// Byte offset of the first `[` whose next non-whitespace char is `{`
fn find_object_array_start(text: &str) -> Option<usize> {
    text.char_indices()
        .filter(|&(_, c)| c == '[')
        .find(|&(i, _)| {
            text[i + 1..]
                .chars()
                .find(|c| !c.is_whitespace())
                .is_some_and(|c| c == '{')
        })
        .map(|(i, _)| i)
}

/// Run both stages and validate each item
pub fn decode_reply(text: &str) -> RecommendationReply {
    let items = match parse_strict(text) {
        Some(items) => items,
        None => {
            let candidate = locate_array(text);
            match serde_json::from_str::<Value>(candidate) {
                Ok(Value::Array(items)) => items,
                Ok(_) => return RecommendationReply::Malformed("reply is not an array".to_string()),
                Err(e) => return RecommendationReply::Malformed(format!("JSON parse failed: {e}")),
            }
        }
    };

    let total = items.len();
    let books: Vec<RawBook> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match validate_item(item) {
            Ok(book) => Some(book),
            Err(reason) => {
                tracing::warn!("Skipping recommendation #{}: {}", index, reason);
                None
            }
        })
        .collect();

    if books.len() < total {
        tracing::debug!("Kept {} of {} recommended items", books.len(), total);
    }
    RecommendationReply::Books(books)
}

fn validate_item(item: Value) -> Result<RawBook, String> {
    let book: RawBook = serde_json::from_value(item).map_err(|e| e.to_string())?;
    if !book.price.is_finite() || book.price < 0.0 {
        return Err(format!("invalid price {}", book.price));
    }
    if book.title.trim().is_empty() {
        return Err("empty title".to_string());
    }
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_BOOK: &str =
        r#"[{"title":"A","author":"B","description":"C","price":9.99,"genre":"D"}]"#;

    #[test]
    fn test_strict_accepts_bare_array() {
        assert_eq!(parse_strict(&format!("  {ONE_BOOK}\n")).map(|v| v.len()), Some(1));
        assert_eq!(parse_strict("[]").map(|v| v.len()), Some(0));
    }

    #[test]
    fn test_strict_rejects_prose_and_objects() {
        assert!(parse_strict(&format!("Here you go: {ONE_BOOK}")).is_none());
        assert!(parse_strict(r#"{"books":[]}"#).is_none());
    }

    #[test]
    fn test_locate_skips_bracketed_filler() {
        let text = format!("Here is a list [of books]: {ONE_BOOK} Enjoy [really]!");
        // cut runs to the last ']' in the text
        let cut = locate_array(&text);
        assert!(cut.starts_with(ONE_BOOK));
        assert!(cut.ends_with("[really]"));
        let text = format!("Here is a list [of books]: {ONE_BOOK} Enjoy!");
        assert_eq!(locate_array(&text), ONE_BOOK);
    }

    #[test]
    fn test_locate_allows_whitespace_between_anchors() {
        let text = "Sure!\n[\n  {\"title\":\"x\"}\n]\nbye";
        assert_eq!(locate_array(text), "[\n  {\"title\":\"x\"}\n]");
    }

    #[test]
    fn test_locate_falls_back_for_leading_array() {
        assert_eq!(locate_array("  [] trailing"), "  []");
        assert_eq!(locate_array("no brackets at all"), "[]");
        assert_eq!(locate_array("[ unterminated"), "[]");
    }

    #[test]
    fn test_decode_prose_wrapped_reply() {
        let reply = decode_reply(&format!("Here you go: {ONE_BOOK} Hope that helps!"));
        match reply {
            RecommendationReply::Books(books) => {
                assert_eq!(books.len(), 1);
                assert_eq!(books[0].title, "A");
                assert!((books[0].price - 9.99).abs() < 1e-9);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_decode_refusal_is_empty() {
        assert_eq!(
            decode_reply("I'm sorry, I can't help with that."),
            RecommendationReply::Books(vec![])
        );
        assert_eq!(decode_reply("[]"), RecommendationReply::Books(vec![]));
    }

    #[test]
    fn test_decode_broken_json_is_malformed() {
        let reply = decode_reply(r#"Try: [{"title": "A", "author": ] done"#);
        assert!(matches!(reply, RecommendationReply::Malformed(_)));
    }

    #[test]
    fn test_decode_drops_incomplete_items() {
        let text = r#"[
            {"title":"Keep","author":"B","description":"C","price":"12.50","genre":"D"},
            {"title":"No price","author":"B","description":"C","genre":"D"},
            {"title":"Negative","author":"B","description":"C","price":-1,"genre":"D"},
            {"title":"Wrong type","author":7,"description":"C","price":1,"genre":"D"}
        ]"#;
        match decode_reply(text) {
            RecommendationReply::Books(books) => {
                assert_eq!(books.len(), 1);
                assert_eq!(books[0].title, "Keep");
                assert!((books[0].price - 12.5).abs() < 1e-9);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
