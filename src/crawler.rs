// src/crawler.rs

use reqwest::Client;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::CrawlError;
use crate::fetch::fetch_listing;
use crate::parse::parse_issuer_table;
use crate::persist::{issuer_entries, upsert_issuers, upsert_tickers};
use crate::store::IssuerStore;

/// What one refresh did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub records: usize,
    pub issuers_inserted: u64,
    pub tickers_inserted: u64,
    pub tickers_dropped: usize,
}

/// Fetches the share listing and reflects it into the store.
///
/// Overlapping refreshes are not serialised; both persistence phases ignore
/// conflicts, so concurrent runs cannot create duplicates.
#[derive(Clone)]
pub struct Crawler {
    client: Client,
    source_base_url: String,
    store: Arc<dyn IssuerStore>,
}

impl Crawler {
    pub fn new(
        client: Client,
        source_base_url: impl Into<String>,
        store: Arc<dyn IssuerStore>,
    ) -> Self {
        Self {
            client,
            source_base_url: source_base_url.into(),
            store,
        }
    }

    /// fetch → parse → issuers → tickers. Nothing is written unless the
    /// fetch and the parse both succeed.
    #[instrument(level = "info", skip(self), fields(source = %self.source_base_url))]
    pub async fn refresh_issuer_list(&self) -> Result<RefreshSummary, CrawlError> {
        let body = fetch_listing(&self.client, &self.source_base_url).await?;
        let records = parse_issuer_table(&body)?;
        info!(records = records.len(), "issuer table parsed");

        let issuers_inserted =
            upsert_issuers(self.store.as_ref(), &issuer_entries(&records)).await?;
        let tickers = upsert_tickers(self.store.as_ref(), &records).await?;

        Ok(RefreshSummary {
            records: records.len(),
            issuers_inserted,
            tickers_inserted: tickers.inserted,
            tickers_dropped: tickers.dropped,
        })
    }
}
