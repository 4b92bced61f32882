// src/store/mod.rs

//! Durable home of issuers and their tickers.
//!
//! Both insert paths ignore rows whose unique key already exists and never
//! update existing rows, so a refresh can be re-run safely at any time.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::PersistError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A stored issuer. `sector_id` is curated by hand and never written here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuer {
    pub id: Uuid,
    pub name: String,
    pub natural_key: String,
    pub sector_id: Option<i32>,
}

/// An issuer about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssuer {
    pub id: Uuid,
    pub name: String,
    pub natural_key: String,
}

impl NewIssuer {
    pub fn new(natural_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            natural_key: natural_key.into(),
        }
    }
}

/// A ticker symbol, unique per `(symbol, issuer_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker {
    pub symbol: String,
    pub issuer_id: Uuid,
    pub display_name: String,
}

#[async_trait]
pub trait IssuerStore: Send + Sync {
    /// Insert issuers whose natural key is not stored yet. Returns how many
    /// rows were actually inserted.
    async fn insert_issuers(&self, issuers: &[NewIssuer]) -> Result<u64, PersistError>;

    /// Natural key → id for every stored issuer.
    async fn issuer_keys(&self) -> Result<HashMap<String, Uuid>, PersistError>;

    /// Insert tickers not stored yet. Returns how many rows were inserted.
    async fn insert_tickers(&self, tickers: &[Ticker]) -> Result<u64, PersistError>;
}
