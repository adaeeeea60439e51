use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use whose_books::command::{COMMAND_WORDS, Command};
use whose_books::models::ViewState;
use whose_books::render::Renderer;
use whose_books::{Config, Storefront};

/// Completion, highlighting and hints for the shop's command words
struct ShopHelper;

impl Helper for ShopHelper {}

impl Completer for ShopHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMAND_WORDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ShopHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let word = line.split(' ').next().unwrap_or("");
        if COMMAND_WORDS.contains(&word) {
            Owned(format!("{}{}", word.bright_cyan(), &line[word.len()..]))
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ShopHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() || line.contains(' ') {
            return None;
        }
        COMMAND_WORDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ShopHelper {}

fn prompt(shop: &Storefront) -> String {
    let state = shop.state();
    let place = if state.chat.open {
        "librarian"
    } else {
        match state.view {
            ViewState::Home => "home",
            ViewState::Shop => "shop",
            ViewState::Cart => "cart",
        }
    };
    format!("{place} [bag {}] › ", state.cart_count())
}

fn render_view(shop: &Storefront, renderer: &Renderer) {
    let state = shop.state();
    println!("{}\n", renderer.nav_bar(state));
    let screen = match state.view {
        ViewState::Home => renderer.home(state),
        ViewState::Shop => renderer.shop(state),
        ViewState::Cart => renderer.cart(state),
    };
    println!("{screen}");
}

/// Apply one command. Returns false when the user asked to leave.
async fn dispatch(shop: &mut Storefront, renderer: &Renderer, command: Command) -> bool {
    match command {
        Command::Home => {
            shop.state_mut().show(ViewState::Home);
            render_view(shop, renderer);
        }
        Command::Shop => {
            shop.state_mut().show(ViewState::Shop);
            render_view(shop, renderer);
        }
        Command::Cart => {
            shop.state_mut().show(ViewState::Cart);
            render_view(shop, renderer);
        }
        Command::Search(query) => {
            println!("{}", "Consulting the archives...".yellow());
            match shop.search(&query).await {
                Some(0) => println!("The librarian came back empty-handed. Try rephrasing?"),
                Some(_) => {
                    shop.state_mut().show(ViewState::Home);
                    render_view(shop, renderer);
                }
                None => {}
            }
        }
        Command::ClearResults => {
            shop.state_mut().clear_results();
            println!("Results cleared.");
        }
        Command::Show(id) => match shop.state().find_book(&id).cloned() {
            Some(book) => {
                println!("{}", renderer.details(&book));
                shop.state_mut().select(book);
            }
            None => println!("No book with id '{id}'."),
        },
        Command::Add(None) => {
            if shop.state_mut().add_selected_to_cart() {
                println!("Added. Bag now holds {}.", shop.state().cart_count());
            } else {
                println!("Open a book with 'show <id>' or give an id: add <id>");
            }
        }
        Command::Add(Some(id)) => match shop.state().find_book(&id).cloned() {
            Some(book) => {
                shop.state_mut().add_to_cart(&book);
                println!(
                    "Added '{}'. Bag now holds {}.",
                    book.title,
                    shop.state().cart_count()
                );
            }
            None => println!("No book with id '{id}'."),
        },
        Command::Remove(id) => {
            shop.state_mut().remove_from_cart(&id);
            if shop.state().view == ViewState::Cart {
                render_view(shop, renderer);
            }
        }
        Command::Close => shop.state_mut().close_details(),
        Command::OpenChat => {
            shop.state_mut().open_chat();
            println!("{}", renderer.chat(shop.state()));
        }
        Command::Say(text) => {
            if !shop.state().chat.open {
                shop.state_mut().open_chat();
            }
            if shop.send_chat(&text).await.is_some() {
                if let Some(last) = shop.state().chat.transcript.last() {
                    println!("{}", renderer.chat_message(last));
                }
            }
        }
        Command::CloseChat => {
            shop.state_mut().close_chat();
            println!("Chat closed.");
        }
        Command::Help => println!("{}", renderer.help()),
        Command::Quit => return false,
        Command::Empty => {}
        Command::Unknown(line) => println!("Unknown command '{line}'. Type 'help'."),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the shop screens on stdout stay readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();
    let renderer = Renderer::new(&config.store);
    let mut shop = Storefront::from_config(&config)?;

    let mut rl: Editor<ShopHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ShopHelper));

    render_view(&shop, &renderer);
    println!("\nType 'help' for commands.");

    loop {
        match rl.readline(&prompt(&shop)) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                let command = Command::parse(&line, shop.state().chat.open);
                if !dispatch(&mut shop, &renderer, command).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Readline error: {}", e);
                break;
            }
        }
    }

    println!("Thanks for visiting {}.", config.store.name);
    Ok(())
}
