use std::time::Instant;

use hyper::header::CONTENT_TYPE;
use hyper::{Body as HyperBody, Client, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;

pub type HttpsClient = Client<HttpsConnector<hyper::client::HttpConnector>>;

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn build_client() -> HttpsClient {
    let https = HttpsConnector::new();
    Client::builder().build::<_, HyperBody>(https)
}

/// Outcome of one benchmark request, with the timing split the report's
/// timing-breakdown chart consumes: `waiting_ms` is time to response
/// headers (TTFB), `receiving_ms` is the body read.
#[derive(Debug)]
pub struct ResponseInfo {
    pub status: StatusCode,
    pub body: hyper::body::Bytes,
    pub waiting_ms: f64,
    pub receiving_ms: f64,
}

/// POST a JSON body to the target endpoint. Returns the response with
/// phase timings, or a short error description for the status breakdown.
pub async fn send_request(
    client: &HttpsClient,
    uri: &Uri,
    api_key: &str,
    body: String,
) -> Result<ResponseInfo, String> {
    let request = Request::builder()
        .method(hyper::Method::POST)
        .uri(uri.clone())
        .header(CONTENT_TYPE, "application/json")
        .header(API_KEY_HEADER, api_key)
        .body(HyperBody::from(body))
        .map_err(|e| e.to_string())?;

    let start = Instant::now();
    let response = client.request(request).await.map_err(describe_error)?;
    let waiting_ms = start.elapsed().as_secs_f64() * 1000.0;

    let status = response.status();
    let body_start = Instant::now();
    let body = hyper::body::to_bytes(response.into_body())
        .await
        .map_err(describe_error)?;
    let receiving_ms = body_start.elapsed().as_secs_f64() * 1000.0;

    Ok(ResponseInfo {
        status,
        body,
        waiting_ms,
        receiving_ms,
    })
}

fn describe_error(e: hyper::Error) -> String {
    if e.is_connect() {
        "Connection refused or host unreachable".to_string()
    } else if e.is_timeout() {
        "Timeout".to_string()
    } else if e.is_closed() {
        "Connection closed unexpectedly".to_string()
    } else {
        "Unknown network error".to_string()
    }
}
