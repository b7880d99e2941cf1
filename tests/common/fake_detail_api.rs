//! Fake case detail API for HTTP fetcher tests.
//!
//! Spins up a minimal `axum` server on a random port bound to 127.0.0.1.
//! Serves `GET /cases/{cb_no}` from a table of canned responses; anything
//! not registered is a 404.
//!
//! ```rust,no_run
//! let api = FakeDetailApi::start().await.unwrap();
//! api.json("JH100001", serde_json::json!({"NAME": "DOE, JOHN"})).await;
//! let fetcher = HttpFetcher::new(api.base_url());
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Clone)]
enum Canned {
    Json(serde_json::Value),
    Raw(StatusCode, String),
    Slow(Duration, serde_json::Value),
}

#[derive(Default)]
struct ApiState {
    pages: HashMap<String, Canned>,
    hits: Vec<String>,
}

/// Handle to the running fake detail API.
pub struct FakeDetailApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeDetailApi {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route("/cases/{cb_no}", get(detail_page))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Base URL for the fetcher (e.g. `http://127.0.0.1:PORT/cases`).
    pub fn base_url(&self) -> String {
        format!("http://{}/cases", self.addr)
    }

    /// Serve `doc` as the detail page for `cb_no`.
    pub async fn json(&self, cb_no: &str, doc: serde_json::Value) {
        self.put(cb_no, Canned::Json(doc)).await;
    }

    /// Serve an arbitrary status and body.
    pub async fn raw(&self, cb_no: &str, status: StatusCode, body: &str) {
        self.put(cb_no, Canned::Raw(status, body.to_string())).await;
    }

    /// Serve `doc` only after `delay`.
    pub async fn slow(&self, cb_no: &str, delay: Duration, doc: serde_json::Value) {
        self.put(cb_no, Canned::Slow(delay, doc)).await;
    }

    /// Identifiers requested so far, in arrival order.
    pub async fn hits(&self) -> Vec<String> {
        self.state.lock().await.hits.clone()
    }

    async fn put(&self, cb_no: &str, canned: Canned) {
        self.state.lock().await.pages.insert(cb_no.to_string(), canned);
    }
}

async fn detail_page(
    Path(cb_no): Path<String>,
    State(state): State<Arc<Mutex<ApiState>>>,
) -> Response {
    let canned = {
        let mut state = state.lock().await;
        state.hits.push(cb_no.clone());
        state.pages.get(&cb_no).cloned()
    };

    match canned {
        Some(Canned::Json(doc)) => axum::Json(doc).into_response(),
        Some(Canned::Raw(status, body)) => (status, body).into_response(),
        Some(Canned::Slow(delay, doc)) => {
            tokio::time::sleep(delay).await;
            axum::Json(doc).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
