// src/lib.rs

pub mod config;
pub mod crawler;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod persist;
pub mod server;
pub mod store;

pub use crawler::{Crawler, RefreshSummary};
pub use error::{ConfigError, CrawlError, DecodeError, FetchError, ParseError, PersistError};
