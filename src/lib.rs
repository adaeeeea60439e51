pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod extract;
pub mod librarian;
pub mod models;
pub mod recommend;
pub mod render;
pub mod state;
pub mod storefront;
pub mod transport;

pub use crate::config::Config;
pub use crate::error::{Result, StorefrontError};
pub use crate::storefront::Storefront;
