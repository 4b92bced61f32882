// src/persist.rs

//! Two-phase, conflict-ignoring persistence of a parsed listing.
//!
//! Issuers go in first; the full key → id map is then reloaded and tickers
//! are inserted against it. The phases are separate statements, not one
//! transaction: if the ticker phase fails, the next run fills the gap.

use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use crate::error::PersistError;
use crate::parse::Record;
use crate::store::{IssuerStore, NewIssuer, Ticker};

/// Natural key → display name for every record carrying a key. For a key
/// seen twice the later row wins.
pub fn issuer_entries(records: &[Record]) -> BTreeMap<String, String> {
    records
        .iter()
        .filter(|r| !r.natural_key.is_empty())
        .map(|r| (r.natural_key.clone(), r.display_name.clone()))
        .collect()
}

/// Insert issuers not yet stored. Existing issuers are left untouched, so a
/// renamed source entry never overwrites a stored name or sector.
#[instrument(level = "info", skip_all, fields(entries = entries.len()))]
pub async fn upsert_issuers(
    store: &dyn IssuerStore,
    entries: &BTreeMap<String, String>,
) -> Result<u64, PersistError> {
    if entries.is_empty() {
        debug!("no issuers to write");
        return Ok(0);
    }
    let issuers: Vec<NewIssuer> = entries
        .iter()
        .map(|(key, name)| NewIssuer::new(key.as_str(), name.as_str()))
        .collect();
    let inserted = store.insert_issuers(&issuers).await?;
    info!(inserted, "issuers upserted");
    Ok(inserted)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickerOutcome {
    pub inserted: u64,
    /// Records whose natural key is empty or matches no stored issuer.
    pub dropped: usize,
}

/// Insert tickers for every record whose issuer is stored. Records that do
/// not resolve are dropped without failing the batch.
#[instrument(level = "info", skip_all, fields(records = records.len()))]
pub async fn upsert_tickers(
    store: &dyn IssuerStore,
    records: &[Record],
) -> Result<TickerOutcome, PersistError> {
    let keys = store.issuer_keys().await?;

    let mut dropped = 0;
    let mut tickers = Vec::with_capacity(records.len());
    for record in records {
        match keys.get(&record.natural_key) {
            Some(issuer_id) if !record.natural_key.is_empty() => tickers.push(Ticker {
                symbol: record.ticker_symbol.clone(),
                issuer_id: *issuer_id,
                display_name: record.display_name.clone(),
            }),
            _ => {
                debug!(key = %record.natural_key, ticker = %record.ticker_symbol, "no issuer; dropped");
                dropped += 1;
            }
        }
    }

    let inserted = if tickers.is_empty() {
        0
    } else {
        store.insert_tickers(&tickers).await?
    };
    info!(inserted, dropped, "tickers upserted");
    Ok(TickerOutcome { inserted, dropped })
}
