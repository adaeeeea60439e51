/// One line of shell input, parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Home,
    Shop,
    Cart,
    Search(String),
    ClearResults,
    Show(String),
    /// `None` adds the book under the detail overlay
    Add(Option<String>),
    Remove(String),
    Close,
    OpenChat,
    Say(String),
    CloseChat,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const COMMAND_WORDS: &[&str] = &[
    "home", "shop", "cart", "search", "clear", "show", "add", "remove", "close", "chat", "say",
    "bye", "help", "quit",
];

impl Command {
    /// Parse a line. While the chat is open, anything that isn't a command goes to the librarian.
    pub fn parse(line: &str, chat_open: bool) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());

        match (word.to_lowercase().as_str(), arg) {
            ("home", None) => Command::Home,
            ("shop", None) => Command::Shop,
            ("cart", None) => Command::Cart,
            ("search", Some(q)) => Command::Search(q),
            ("clear", None) => Command::ClearResults,
            ("show", Some(id)) => Command::Show(id),
            ("add", id) => Command::Add(id),
            ("remove", Some(id)) => Command::Remove(id),
            ("close", None) => Command::Close,
            ("chat", None) => Command::OpenChat,
            ("say", Some(text)) => Command::Say(text),
            ("bye", None) => Command::CloseChat,
            ("help", None) | ("?", None) => Command::Help,
            ("quit", None) | ("exit", None) => Command::Quit,
            _ if chat_open => Command::Say(line.to_string()),
            _ => Command::Unknown(line.to_string()),
        }
    }
}
