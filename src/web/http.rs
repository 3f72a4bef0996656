use gloo::net::http::Request;
use tracing::debug;
use web_sys::RequestMode;

use crate::error::{GameError, GameResult};
use crate::remote::{RankingEndpoint, RemoteRankingEntry};

/// The ranking sheet's web endpoint.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    url: String,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl RankingEndpoint for HttpEndpoint {
    async fn fetch(&self) -> GameResult<Vec<RemoteRankingEntry>> {
        let response = Request::get(&self.url)
            .send()
            .await
            .map_err(|e| GameError::RemoteFetchFailed(e.to_string()))?;
        if !response.ok() {
            return Err(GameError::RemoteFetchFailed(format!("status {}", response.status())));
        }
        response
            .json::<Vec<RemoteRankingEntry>>()
            .await
            .map_err(|e| GameError::RemoteFetchFailed(e.to_string()))
    }

    async fn push(&self, entry: &RemoteRankingEntry) -> GameResult<()> {
        let body = serde_json::to_string(entry).map_err(|e| GameError::RemotePushFailed(e.to_string()))?;
        // The sheet answers cross-origin posts opaquely; only transport errors count.
        Request::post(&self.url)
            .mode(RequestMode::NoCors)
            .header("Content-Type", "text/plain;charset=utf-8")
            .body(body)
            .map_err(|e| GameError::RemotePushFailed(e.to_string()))?
            .send()
            .await
            .map_err(|e| GameError::RemotePushFailed(e.to_string()))?;
        debug!(name = %entry.name, time = %entry.time, "score posted");
        Ok(())
    }
}
