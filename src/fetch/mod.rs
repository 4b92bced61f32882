// src/fetch/mod.rs

use reqwest::Client;
use tracing::{error, info, instrument};

use crate::error::FetchError;

/// Path of the share listing, relative to the exchange's base URL.
pub const SHARES_PATH: &str = "/q/shares/";

pub fn shares_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), SHARES_PATH)
}

/// GET the share listing page once and return its body.
///
/// Any non-2xx status is an error. There is no retry and no timeout here;
/// callers wanting one configure it on the `Client`.
#[instrument(level = "info", skip(client))]
pub async fn fetch_listing(client: &Client, base_url: &str) -> Result<String, FetchError> {
    let url = shares_url(base_url);
    info!(%url, "fetching share listing");

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        error!(%url, %status, "request failed");
        return Err(FetchError::Status { url, status });
    }

    resp.text()
        .await
        .map_err(|source| FetchError::Transport { url, source })
}
