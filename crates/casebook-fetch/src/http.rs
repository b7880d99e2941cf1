//! HTTP fetcher — `GET {base_url}/{cb_no}` returning a JSON detail object.
//!
//! Status handling:
//! - 2xx: body must be a non-empty JSON object of labels
//! - 404: [`FetchError::NotFound`]
//! - anything else: [`FetchError::Navigation`]
//!
//! The whole exchange (connect, headers, body) is bounded by one timeout.
//! Plain `http://` only; there is no TLS connector.

use std::time::Duration;

use casebook_core::config::FetchConfig;
use casebook_core::{FetchError, FetchedFields, Fetcher};
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{header, Request, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::fields_from_json;

/// Fetches detail records from an HTTP endpoint. One shared connection pool;
/// no per-request session state.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client<HttpConnector, Empty<Bytes>>,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = FetchConfig::default();
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: defaults.timeout(),
            user_agent: defaults.user_agent,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.base_url.clone())
            .with_timeout(config.timeout())
            .with_user_agent(config.user_agent.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Detail URL for one identifier. The identifier is percent-encoded so it
    /// always stays a single path segment.
    pub fn url_for(&self, cb_no: &str) -> Result<Uri, FetchError> {
        let url = format!("{}/{}", self.base_url, encode_segment(cb_no));
        url.parse::<Uri>()
            .map_err(|e| FetchError::Navigation(format!("bad detail url {url:?}: {e}")))
    }

    async fn get(&self, uri: Uri) -> Result<(StatusCode, Bytes), FetchError> {
        let req = Request::get(uri)
            .header(header::USER_AGENT, self.user_agent.as_str())
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| FetchError::Navigation(e.to_string()))?;

        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
            .to_bytes();
        Ok((status, body))
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, cb_no: &str) -> Result<FetchedFields, FetchError> {
        let uri = self.url_for(cb_no)?;
        tracing::trace!(%uri, "GET detail");

        let (status, body) = tokio::time::timeout(self.timeout, self.get(uri))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(cb_no.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Navigation(format!(
                "detail page for {cb_no} answered {status}"
            )));
        }

        let doc: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| FetchError::MissingMarkup(format!("detail body is not JSON: {e}")))?;
        fields_from_json(&doc)
    }
}

fn encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
