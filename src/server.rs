//! Inbound HTTP endpoints.
//!
//! Serves the dashboard page at `/` and the chart/stats payload at
//! `/api/data`. Each `/api/data` request runs the full pipeline
//! (fetch → normalize → aggregate) independently; no state is shared
//! between requests.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono_tz::Tz;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, warn};

use crate::fetch::FeedSource;
use crate::normalize;
use crate::stats;

static DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

/// Shared per-server state: the feed source plus pipeline parameters.
pub struct AppState {
    pub source: Arc<dyn FeedSource>,
    pub results: u32,
    pub timezone: Tz,
}

/// Run the HTTP server until the process exits.
pub async fn run_server(
    listen_addr: String,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = listen_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let state = state.clone();
                async move { handle_request(req, state.as_ref()).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                warn!(error = %e, "connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path();

    let response = match path {
        "/" => html_response(DASHBOARD_HTML),
        "/api/data" => {
            let (status, payload) = api_payload(state).await;
            json_response(status, &payload)
        }
        "/health" | "/healthz" => text_response(StatusCode::OK, "OK"),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    Ok(response)
}

/// Build the `/api/data` payload.
///
/// Kept free of hyper request/response types so the full pipeline can be
/// exercised in tests against a stub [`FeedSource`].
pub async fn api_payload(state: &AppState) -> (StatusCode, serde_json::Value) {
    let feed = match state.source.fetch(state.results).await {
        Ok(feed) => feed,
        Err(e) => {
            error!(source = state.source.description(), error = %e, "feed fetch failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "could not fetch data from ThingSpeak"}),
            );
        }
    };

    let records = normalize::normalize(&feed, state.timezone);
    if records.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            json!({"error": "no valid records found"}),
        );
    }

    let (chart_data, summary) = stats::aggregate(&records);
    (
        StatusCode::OK,
        json!({"chart_data": chart_data, "stats": summary}),
    )
}

fn json_response(status: StatusCode, payload: &serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(payload.to_string())))
        .unwrap()
}

fn html_response(body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
