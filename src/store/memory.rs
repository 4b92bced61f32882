// src/store/memory.rs

use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};
use uuid::Uuid;

use super::{Issuer, IssuerStore, NewIssuer, Ticker};
use crate::error::PersistError;

#[derive(Debug, Default)]
struct Inner {
    issuers: Vec<Issuer>,
    tickers: Vec<Ticker>,
    healthy_ops: usize,
    failures: usize,
    writes: usize,
}

impl Inner {
    fn check(&mut self) -> Result<(), PersistError> {
        if self.healthy_ops > 0 {
            self.healthy_ops -= 1;
            return Ok(());
        }
        if self.failures > 0 {
            self.failures -= 1;
            return Err(PersistError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

/// In-process store with the same conflict-ignore semantics as [`super::PgStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` operations fail with [`PersistError::Unavailable`].
    pub fn fail_next(&self, n: usize) {
        self.fail_after(0, n);
    }

    /// Let `ok` operations through, then fail the following `n`.
    pub fn fail_after(&self, ok: usize, n: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.healthy_ops = ok;
        inner.failures = n;
    }

    /// Add an issuer directly, e.g. one curated with a sector.
    pub fn seed_issuer(&self, issuer: Issuer) {
        self.inner.lock().unwrap().issuers.push(issuer);
    }

    pub fn issuers(&self) -> Vec<Issuer> {
        self.inner.lock().unwrap().issuers.clone()
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.inner.lock().unwrap().tickers.clone()
    }

    pub fn issuer_by_key(&self, natural_key: &str) -> Option<Issuer> {
        self.inner
            .lock()
            .unwrap()
            .issuers
            .iter()
            .find(|i| i.natural_key == natural_key)
            .cloned()
    }

    /// Number of insert calls that reached the store.
    pub fn writes(&self) -> usize {
        self.inner.lock().unwrap().writes
    }
}

#[async_trait]
impl IssuerStore for MemoryStore {
    async fn insert_issuers(&self, issuers: &[NewIssuer]) -> Result<u64, PersistError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check()?;
        inner.writes += 1;

        let mut known: HashSet<String> =
            inner.issuers.iter().map(|i| i.natural_key.clone()).collect();
        let mut inserted = 0;
        for new in issuers {
            if !known.insert(new.natural_key.clone()) {
                continue;
            }
            inner.issuers.push(Issuer {
                id: new.id,
                name: new.name.clone(),
                natural_key: new.natural_key.clone(),
                sector_id: None,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn issuer_keys(&self) -> Result<HashMap<String, Uuid>, PersistError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check()?;
        Ok(inner
            .issuers
            .iter()
            .map(|i| (i.natural_key.clone(), i.id))
            .collect())
    }

    async fn insert_tickers(&self, tickers: &[Ticker]) -> Result<u64, PersistError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check()?;
        inner.writes += 1;

        let mut known: HashSet<(String, Uuid)> = inner
            .tickers
            .iter()
            .map(|t| (t.symbol.clone(), t.issuer_id))
            .collect();
        let mut inserted = 0;
        for ticker in tickers {
            if known.insert((ticker.symbol.clone(), ticker.issuer_id)) {
                inner.tickers.push(ticker.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issuer_conflicts_are_ignored() {
        let store = MemoryStore::new();
        let first = NewIssuer::new("GAZP", "Газпром");
        assert_eq!(store.insert_issuers(&[first.clone()]).await.unwrap(), 1);

        let renamed = NewIssuer::new("GAZP", "Gazprom PJSC");
        assert_eq!(store.insert_issuers(&[renamed]).await.unwrap(), 0);

        let stored = store.issuer_by_key("GAZP").unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.name, "Газпром");
    }

    #[tokio::test]
    async fn test_ticker_conflicts_are_ignored() {
        let store = MemoryStore::new();
        let issuer_id = Uuid::new_v4();
        let t = Ticker {
            symbol: "SBER".to_string(),
            issuer_id,
            display_name: "Сбербанк".to_string(),
        };
        assert_eq!(store.insert_tickers(&[t.clone(), t.clone()]).await.unwrap(), 1);
        assert_eq!(store.insert_tickers(&[t]).await.unwrap(), 0);
        assert_eq!(store.tickers().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        store.fail_next(1);
        assert!(store.issuer_keys().await.is_err());
        assert!(store.issuer_keys().await.unwrap().is_empty());
        assert_eq!(store.writes(), 0);

        store.fail_after(1, 1);
        assert!(store.issuer_keys().await.is_ok());
        assert!(store.insert_tickers(&[]).await.is_err());
        assert_eq!(store.insert_tickers(&[]).await.unwrap(), 0);
    }
}
