//! Session metadata retrieval
//!
//! Bootstrap layer for one test run: extracts the batch and session
//! identifiers from the results-handle URL, then fetches the session metadata
//! document with a single one-shot GET. Nothing here is retried; a transport
//! failure on the bootstrap call surfaces directly.

use regex::Regex;
use reqwest::Client;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{ResultsHandle, SessionDocument};

/// Batch and session identifiers of one test run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionIds {
    /// Identifier of the batch the run belongs to
    pub batch_id: String,
    /// Identifier of the run within the batch
    pub session_id: String,
}

impl SessionIds {
    /// Extract the identifiers from a results-handle URL
    ///
    /// The handle URL embeds both ids as `.../batches/{batchId}/{sessionId}/...`
    /// with purely numeric ids. A handle that does not match this shape fails
    /// with [`Error::Protocol`].
    pub fn from_handle(handle: &ResultsHandle) -> Result<Self> {
        let pattern = Regex::new(r"batches/(\d+)/(\d+)")
            .map_err(|e| Error::Protocol(format!("invalid id pattern: {}", e)))?;

        let captures = pattern.captures(handle.url()).ok_or_else(|| {
            Error::Protocol(format!(
                "no batch/session ids in results URL: {}",
                handle.url()
            ))
        })?;

        Ok(Self {
            batch_id: captures[1].to_string(),
            session_id: captures[2].to_string(),
        })
    }
}

/// Derive the service base URL from a results-handle URL
///
/// The handle points into the service's web app; everything before the
/// `/app/` segment is the API host.
pub fn server_url(handle: &ResultsHandle) -> Result<String> {
    handle
        .url()
        .split_once("/app/")
        .map(|(base, _)| base.to_string())
        .ok_or_else(|| {
            Error::Protocol(format!(
                "no /app/ segment in results URL: {}",
                handle.url()
            ))
        })
}

/// Client for the one-shot session metadata fetch
#[derive(Clone, Debug)]
pub struct SessionDataClient {
    http: Client,
    api_key: String,
}

impl SessionDataClient {
    /// Create a client using the view-scoped API key
    pub fn new(api_key: impl Into<String>, config: &Config) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }

    /// Fetch and parse the session metadata document for a run
    ///
    /// Issues a single GET against the metadata endpoint. A non-success
    /// status is [`Error::Protocol`]; network failures are
    /// [`Error::Transport`] and are not retried at this layer.
    pub async fn fetch(&self, handle: &ResultsHandle) -> Result<SessionDocument> {
        let ids = SessionIds::from_handle(handle)?;
        let server = server_url(handle)?;
        let url = format!(
            "{}/api/sessions/batches/{}/{}/?ApiKey={}&format=json",
            server, ids.batch_id, ids.session_id, self.api_key
        );

        tracing::debug!(
            batch_id = %ids.batch_id,
            session_id = %ids.session_id,
            "Fetching session metadata"
        );

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Protocol(format!(
                "session metadata fetch returned status {}",
                status.as_u16()
            )));
        }

        let body = response.text().await?;
        let document: SessionDocument = serde_json::from_str(&body)?;
        Ok(document)
    }
}
