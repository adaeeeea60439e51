//! Application view state. Single writer; every change goes through a reducer here.

use crate::catalog::staff_picks;
use crate::librarian::GREETING;
use crate::models::{Book, CartItem, ChatMessage, ViewState};

/// Handle for one issued search. Only the newest ticket may publish results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Handle for one chat turn, bound to the widget session it was sent in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTicket {
    session: u64,
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Book>,
    issued: u64,
    pending: Option<SearchTicket>,
}

#[derive(Debug, Default)]
pub struct ChatState {
    pub open: bool,
    pub transcript: Vec<ChatMessage>,
    pending: bool,
    session: u64,
}

#[derive(Debug)]
pub struct AppState {
    pub view: ViewState,
    pub catalog: Vec<Book>,
    pub search: SearchState,
    pub cart: Vec<CartItem>,
    /// Detail overlay; stacks above whatever view is active
    pub selected: Option<Book>,
    pub chat: ChatState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(staff_picks())
    }
}

impl AppState {
    pub fn new(catalog: Vec<Book>) -> Self {
        Self {
            view: ViewState::Home,
            catalog,
            search: SearchState::default(),
            cart: Vec::new(),
            selected: None,
            chat: ChatState::default(),
        }
    }

    pub fn show(&mut self, view: ViewState) {
        self.view = view;
    }

    // ---- cart ----

    pub fn add_to_cart(&mut self, book: &Book) {
        match self.cart.iter_mut().find(|line| line.book.id == book.id) {
            Some(line) => line.quantity += 1,
            None => self.cart.push(CartItem::new(book.clone())),
        }
    }

    /// Returns false when no line matched; that is not an error
    pub fn remove_from_cart(&mut self, book_id: &str) -> bool {
        let before = self.cart.len();
        self.cart.retain(|line| line.book.id != book_id);
        self.cart.len() != before
    }

    pub fn cart_total(&self) -> f64 {
        self.cart.iter().map(CartItem::subtotal).sum()
    }

    /// Number of copies, not lines
    pub fn cart_count(&self) -> u32 {
        self.cart.iter().map(|line| line.quantity).sum()
    }

    // ---- browsing ----

    /// Shop listing: the shelf followed by the latest suggestions
    pub fn shop_books(&self) -> impl Iterator<Item = &Book> {
        self.catalog.iter().chain(self.search.results.iter())
    }

    /// Look a book up among the shelf, the suggestions and the cart
    pub fn find_book(&self, book_id: &str) -> Option<&Book> {
        self.shop_books()
            .chain(self.cart.iter().map(|line| &line.book))
            .find(|b| b.id == book_id)
    }

    pub fn select(&mut self, book: Book) {
        self.selected = Some(book);
    }

    pub fn close_details(&mut self) {
        self.selected = None;
    }

    /// Add the book under the detail overlay and dismiss it
    pub fn add_selected_to_cart(&mut self) -> bool {
        match self.selected.take() {
            Some(book) => {
                self.add_to_cart(&book);
                true
            }
            None => false,
        }
    }

    // ---- search ----

    /// Blank queries are rejected before any call is made
    pub fn begin_search(&mut self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.search.issued += 1;
        let ticket = SearchTicket(self.search.issued);
        self.search.query = query.to_string();
        self.search.results.clear();
        self.search.pending = Some(ticket);
        Some(ticket)
    }

    /// Publish results for `ticket`. Superseded tickets are dropped and return false.
    pub fn complete_search(&mut self, ticket: SearchTicket, results: Vec<Book>) -> bool {
        if self.search.pending != Some(ticket) {
            tracing::debug!("Dropping results for superseded search {:?}", ticket);
            return false;
        }
        self.search.pending = None;
        self.search.results = results;
        true
    }

    pub fn is_searching(&self) -> bool {
        self.search.pending.is_some()
    }

    pub fn clear_results(&mut self) {
        self.search.results.clear();
    }

    // ---- chat ----

    /// Open the widget, greeting first if the transcript is fresh
    pub fn open_chat(&mut self) {
        if self.chat.transcript.is_empty() {
            self.chat.transcript.push(ChatMessage::assistant(GREETING));
        }
        self.chat.open = true;
    }

    /// Close the widget and discard the conversation
    pub fn close_chat(&mut self) {
        self.chat.open = false;
        self.chat.transcript.clear();
        self.chat.pending = false;
        self.chat.session += 1;
    }

    /// Append the user's turn. Returns the ticket and the history that preceded it,
    /// or None when the text is blank or a turn is already in flight.
    pub fn begin_chat_turn(&mut self, text: &str) -> Option<(ChatTicket, Vec<ChatMessage>)> {
        if text.trim().is_empty() || self.chat.pending {
            return None;
        }
        let history = self.chat.transcript.clone();
        self.chat.transcript.push(ChatMessage::user(text));
        self.chat.pending = true;
        Some((
            ChatTicket {
                session: self.chat.session,
            },
            history,
        ))
    }

    /// Append the assistant reply unless the widget was reset since the turn began
    pub fn complete_chat_turn(&mut self, ticket: ChatTicket, reply: String) -> bool {
        if ticket.session != self.chat.session {
            tracing::debug!("Dropping chat reply for a closed session");
            return false;
        }
        self.chat.pending = false;
        self.chat.transcript.push(ChatMessage::assistant(reply));
        true
    }

    pub fn is_chat_pending(&self) -> bool {
        self.chat.pending
    }
}
