use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::librarian::{GeminiLibrarian, Librarian};
use crate::models::{Book, ChatMessage};
use crate::recommend::{GeminiRecommender, Recommender};
use crate::state::{AppState, ChatTicket, SearchTicket};
use crate::transport::{GeminiTransport, Transport};

/// A search that has been issued but not yet run. The shell awaits searches
/// inline through [`Storefront::search`]; this split is for callers that keep
/// several searches in flight, where only the newest may publish.
pub struct PendingSearch {
    ticket: SearchTicket,
    query: String,
    recommender: Arc<dyn Recommender>,
}

pub struct SearchCompletion {
    ticket: SearchTicket,
    results: Vec<Book>,
}

impl PendingSearch {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub async fn run(self) -> SearchCompletion {
        let results = self.recommender.recommend(&self.query).await;
        SearchCompletion {
            ticket: self.ticket,
            results,
        }
    }
}

/// A chat turn that has been appended to the transcript but not yet answered
pub struct PendingChat {
    ticket: ChatTicket,
    history: Vec<ChatMessage>,
    message: String,
    librarian: Arc<dyn Librarian>,
}

pub struct ChatCompletion {
    ticket: ChatTicket,
    reply: String,
}

impl PendingChat {
    pub async fn run(self) -> ChatCompletion {
        let reply = self.librarian.reply(&self.history, &self.message).await;
        ChatCompletion {
            ticket: self.ticket,
            reply,
        }
    }
}

/// Owns the view state and the two service clients; the only writer of state
pub struct Storefront {
    state: AppState,
    recommender: Arc<dyn Recommender>,
    librarian: Arc<dyn Librarian>,
}

impl Storefront {
    pub fn new(recommender: Arc<dyn Recommender>, librarian: Arc<dyn Librarian>) -> Self {
        Self {
            state: AppState::default(),
            recommender,
            librarian,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let transport = Arc::new(GeminiTransport::new(&cfg.gemini)?);

        let recommender = GeminiRecommender::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            cfg.gemini.model.clone(),
        );
        let librarian = GeminiLibrarian::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            cfg.gemini.model.clone(),
        );

        Ok(Self::new(Arc::new(recommender), Arc::new(librarian)))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Issue a search; None for a blank query
    pub fn start_search(&mut self, query: &str) -> Option<PendingSearch> {
        let ticket = self.state.begin_search(query)?;
        Some(PendingSearch {
            ticket,
            query: self.state.search.query.clone(),
            recommender: Arc::clone(&self.recommender),
        })
    }

    /// Returns false if a newer search superseded this one
    pub fn finish_search(&mut self, done: SearchCompletion) -> bool {
        self.state.complete_search(done.ticket, done.results)
    }

    /// Run a search to completion. Returns the number of results shown,
    /// or None when the query was blank.
    pub async fn search(&mut self, query: &str) -> Option<usize> {
        let pending = self.start_search(query)?;
        let done = pending.run().await;
        self.finish_search(done);
        Some(self.state.search.results.len())
    }

    pub fn start_chat(&mut self, text: &str) -> Option<PendingChat> {
        let (ticket, history) = self.state.begin_chat_turn(text)?;
        Some(PendingChat {
            ticket,
            history,
            message: text.to_string(),
            librarian: Arc::clone(&self.librarian),
        })
    }

    pub fn finish_chat(&mut self, done: ChatCompletion) -> bool {
        self.state.complete_chat_turn(done.ticket, done.reply)
    }

    /// Send one chat turn and return the librarian's reply
    pub async fn send_chat(&mut self, text: &str) -> Option<String> {
        let pending = self.start_chat(text)?;
        let done = pending.run().await;
        let reply = done.reply.clone();
        self.finish_chat(done).then_some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::librarian::{GREETING, MockLibrarian};
    use crate::models::Role;
    use crate::recommend::MockRecommender;

    fn ai_book(id: &str) -> Book {
        Book {
            id: id.to_string(),
            title: format!("Suggested {id}"),
            author: "Model".to_string(),
            description: String::new(),
            price: 12.0,
            genre: "Any".to_string(),
            cover_seed: 7,
            is_ai_recommended: true,
        }
    }

    fn idle_librarian() -> Arc<dyn Librarian> {
        let mut librarian = MockLibrarian::new();
        librarian.expect_reply().never();
        Arc::new(librarian)
    }

    fn idle_recommender() -> Arc<dyn Recommender> {
        let mut recommender = MockRecommender::new();
        recommender.expect_recommend().never();
        Arc::new(recommender)
    }

    #[tokio::test]
    async fn test_search_publishes_results() {
        let mut recommender = MockRecommender::new();
        recommender
            .expect_recommend()
            .withf(|q: &str| q == "gothic romance")
            .times(1)
            .returning(|_| vec![ai_book("ai-1-0"), ai_book("ai-1-1")]);

        let mut shop = Storefront::new(Arc::new(recommender), idle_librarian());
        assert_eq!(shop.search("  gothic romance ").await, Some(2));
        assert!(!shop.state().is_searching());
        assert_eq!(shop.state().search.results.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_search_never_calls_service() {
        let mut shop = Storefront::new(idle_recommender(), idle_librarian());
        assert_eq!(shop.search(" \t ").await, None);
    }

    #[tokio::test]
    async fn test_late_result_of_older_search_is_dropped() {
        let mut recommender = MockRecommender::new();
        recommender
            .expect_recommend()
            .returning(|q: &str| vec![ai_book(&format!("ai-{q}"))]);
        let mut shop = Storefront::new(Arc::new(recommender), idle_librarian());

        let first = shop.start_search("first").unwrap();
        let second = shop.start_search("second").unwrap();
        assert_eq!(second.query(), "second");

        // the newer search resolves first, the older one resolves last
        let second_done = second.run().await;
        assert!(shop.finish_search(second_done));
        let first_done = first.run().await;
        assert!(!shop.finish_search(first_done));

        let ids: Vec<_> = shop
            .state()
            .search
            .results
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["ai-second"]);
    }

    #[tokio::test]
    async fn test_search_and_chat_in_flight_together() {
        let mut recommender = MockRecommender::new();
        recommender
            .expect_recommend()
            .returning(|_| vec![ai_book("ai-5-0")]);
        let mut librarian = MockLibrarian::new();
        librarian
            .expect_reply()
            .returning(|_, _| "Happy reading!".to_string());
        let mut shop = Storefront::new(Arc::new(recommender), Arc::new(librarian));
        shop.state_mut().open_chat();

        let search = shop.start_search("poetry").unwrap();
        let chat = shop.start_chat("hi").unwrap();
        let (search_done, chat_done) = futures::join!(search.run(), chat.run());

        assert!(shop.finish_chat(chat_done));
        assert!(shop.finish_search(search_done));
        assert_eq!(shop.state().search.results.len(), 1);
        assert_eq!(shop.state().chat.transcript.len(), 3);
    }

    #[tokio::test]
    async fn test_chat_sends_prior_transcript() {
        let mut librarian = MockLibrarian::new();
        librarian
            .expect_reply()
            .withf(|history: &[ChatMessage], message: &str| {
                history.len() == 1 && history[0].text == GREETING && message == "Poetry?"
            })
            .times(1)
            .returning(|_, _| "Mary Oliver, always.".to_string());

        let mut shop = Storefront::new(idle_recommender(), Arc::new(librarian));
        shop.state_mut().open_chat();
        let reply = shop.send_chat("Poetry?").await;
        assert_eq!(reply.as_deref(), Some("Mary Oliver, always."));

        let last = shop.state().chat.transcript.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text, "Mary Oliver, always.");
    }

    #[tokio::test]
    async fn test_reply_after_close_is_discarded() {
        let mut librarian = MockLibrarian::new();
        librarian
            .expect_reply()
            .returning(|_, _| "too late".to_string());
        let mut shop = Storefront::new(idle_recommender(), Arc::new(librarian));
        shop.state_mut().open_chat();

        let pending = shop.start_chat("hello").unwrap();
        shop.state_mut().close_chat();
        let done = pending.run().await;
        assert!(!shop.finish_chat(done));
        assert!(shop.state().chat.transcript.is_empty());
    }

    #[test]
    fn test_from_config_builds_without_key() {
        let shop = Storefront::from_config(&Config::default()).unwrap();
        assert_eq!(shop.state().catalog.len(), 6);
    }
}
