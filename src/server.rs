// src/server.rs

use std::{convert::Infallible, sync::Arc};
use tracing::{error, info};
use warp::{http::StatusCode, reply::Reply, Filter, Rejection};

use crate::crawler::Crawler;

pub const HEALTHZ: &str = "healthz";

/// `GET /healthz` and `GET /job/update-issuer-list`, with request logging
/// for everything but health checks.
pub fn routes(
    crawler: Arc<Crawler>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path(HEALTHZ)
        .and(warp::path::end())
        .and(warp::get())
        .map(|| StatusCode::OK);

    let refresh = warp::path!("job" / "update-issuer-list")
        .and(warp::get())
        .and(warp::any().map(move || crawler.clone()))
        .and_then(refresh_issuer_list);

    let log = warp::log::custom(|info| {
        if info.path().trim_matches('/') != HEALTHZ {
            info!(
                method = %info.method(),
                uri = %info.path(),
                status = info.status().as_u16(),
                elapsed = ?info.elapsed(),
                "request"
            );
        }
    });

    health.or(refresh).with(log)
}

/// Empty 200 on success; empty 500 on any failure. The cause is only logged.
async fn refresh_issuer_list(crawler: Arc<Crawler>) -> Result<impl Reply, Infallible> {
    match crawler.refresh_issuer_list().await {
        Ok(summary) => {
            info!(?summary, "issuer list refreshed");
            Ok(StatusCode::OK)
        }
        Err(e) => {
            error!(error = %e, "issuer list refresh failed");
            Ok(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
