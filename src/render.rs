//! Terminal rendering for the storefront screens. Everything returns a String;
//! printing is left to the shell.

use colored::Colorize;
use std::fmt::Write;

use crate::catalog::{CARD_COVER, CART_COVER, DETAIL_COVER, cover_url};
use crate::config::StoreConfig;
use crate::models::{Book, ChatMessage, Role, ViewState};
use crate::state::AppState;

/// Two-decimal currency string
pub fn format_price(amount: f64) -> String {
    format!("${amount:.2}")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

pub struct Renderer {
    store_name: String,
    image_base: String,
}

impl Renderer {
    pub fn new(cfg: &StoreConfig) -> Self {
        Self {
            store_name: cfg.name.clone(),
            image_base: cfg.image_base_url.clone(),
        }
    }

    pub fn nav_bar(&self, state: &AppState) -> String {
        let tab = |label: &str, view: ViewState| {
            if state.view == view {
                label.bold().underline().to_string()
            } else {
                label.normal().to_string()
            }
        };
        format!(
            "{}   {}  {}  {}",
            self.store_name.bold(),
            tab("Home", ViewState::Home),
            tab("Shop", ViewState::Shop),
            tab(&format!("Cart ({})", state.cart_count()), ViewState::Cart),
        )
    }

    pub fn book_card(&self, book: &Book) -> String {
        let mut out = String::new();
        if book.is_ai_recommended {
            let _ = writeln!(out, "{}", "★ Librarian Pick".bright_magenta());
        }
        let _ = writeln!(
            out,
            "[{}] {} {}",
            book.id.dimmed(),
            book.title.bold(),
            format_price(book.price).green()
        );
        let _ = writeln!(out, "    {} · {}", book.author.italic(), book.genre);
        let _ = writeln!(out, "    {}", truncate(&book.description, 80));
        let _ = writeln!(
            out,
            "    {}",
            cover_url(&self.image_base, book.cover_seed, CARD_COVER).dimmed()
        );
        out
    }

    fn grid<'a>(&self, books: impl Iterator<Item = &'a Book>) -> String {
        books.map(|b| self.book_card(b)).collect::<Vec<_>>().join("\n")
    }

    pub fn home(&self, state: &AppState) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "Find the story that belongs to you.".bold());
        let _ = writeln!(
            out,
            "Tell our AI Librarian what you're feeling: search <what you want to read>\n"
        );

        if state.is_searching() {
            let _ = writeln!(out, "{}", "Consulting the archives...".yellow());
            let _ = writeln!(out);
        } else if !state.search.results.is_empty() {
            let _ = writeln!(
                out,
                "{}",
                format!("Curated for \"{}\"", state.search.query).bright_magenta().bold()
            );
            let _ = writeln!(out, "{}", self.grid(state.search.results.iter()));
        }

        let _ = writeln!(out, "{}", "Staff Picks".bold());
        let _ = writeln!(out, "{}", "Hand-selected favorites for this month.".dimmed());
        out.push_str(&self.grid(state.catalog.iter()));
        out
    }

    pub fn shop(&self, state: &AppState) -> String {
        format!("{}\n{}", "All Books".bold(), self.grid(state.shop_books()))
    }

    pub fn cart(&self, state: &AppState) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "Your Cart".bold());
        if state.cart.is_empty() {
            let _ = writeln!(out, "Your bag is empty. Type 'shop' to start browsing.");
            return out;
        }
        for line in &state.cart {
            let _ = writeln!(
                out,
                "[{}] {} by {}  {}  x{}",
                line.book.id.dimmed(),
                line.book.title.bold(),
                line.book.author,
                format_price(line.book.price),
                line.quantity
            );
            let _ = writeln!(
                out,
                "    {}",
                cover_url(&self.image_base, line.book.cover_seed, CART_COVER).dimmed()
            );
        }
        let _ = writeln!(
            out,
            "Total ({} items): {}",
            state.cart_count(),
            format_price(state.cart_total()).green().bold()
        );
        out
    }

    pub fn details(&self, book: &Book) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", book.genre.to_uppercase().blue());
        let _ = writeln!(out, "{}", book.title.bold());
        let _ = writeln!(out, "{}", book.author.italic());
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", book.description);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}    cover: {}",
            format_price(book.price).green().bold(),
            cover_url(&self.image_base, book.cover_seed, DETAIL_COVER)
        );
        let _ = writeln!(out, "{}", "add: put it in your bag · close: dismiss".dimmed());
        out
    }

    pub fn chat_message(&self, message: &ChatMessage) -> String {
        match message.role {
            Role::User => format!("{} {}", "you ›".bold(), message.text),
            Role::Assistant => format!("{} {}", "librarian ›".bright_magenta().bold(), message.text),
        }
    }

    pub fn chat(&self, state: &AppState) -> String {
        let mut lines: Vec<String> = state
            .chat
            .transcript
            .iter()
            .map(|m| self.chat_message(m))
            .collect();
        if state.is_chat_pending() {
            lines.push("librarian is typing...".dimmed().to_string());
        }
        lines.join("\n")
    }

    pub fn help(&self) -> String {
        [
            ("home | shop | cart", "switch screens"),
            ("search <request>", "ask the librarian for picks"),
            ("clear", "clear search results"),
            ("show <id>", "open a book's details"),
            ("add [id]", "add a book (or the open one) to the cart"),
            ("remove <id>", "remove a line from the cart"),
            ("close", "close the details overlay"),
            ("chat", "open the librarian chat"),
            ("say <text>", "talk to the librarian (plain text works while chat is open)"),
            ("bye", "close the chat and forget it"),
            ("quit", "leave the shop"),
        ]
        .iter()
        .map(|(cmd, what)| format!("  {:<20} {}", cmd.cyan(), what))
        .collect::<Vec<_>>()
        .join("\n")
    }
}
