use crate::config::Config;
use crate::db::DbActorHandle;
use crate::error::PorticoError;
use crate::server::dispatch::dispatch;
use crate::server::site::Site;

use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
};
use axum_extra::extract::cookie::Key;
use base64::Engine as _;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

#[derive(Clone)]
pub struct PorticoState {
    pub db: DbActorHandle,
    pub site: Arc<Site>,
    pub cookie_key: Key,
    pub max_body_bytes: usize,
}

impl PorticoState {
    pub fn new(db: DbActorHandle, cfg: &Config) -> Result<Self, PorticoError> {
        cfg.validate().map_err(PorticoError::Config)?;

        let cookie_key = if cfg.basic.cookie_secret.is_empty() {
            warn!("basic.cookie_secret is empty; sessions will not survive a restart");
            Key::generate()
        } else {
            Key::derive_from(cfg.basic.cookie_secret.as_bytes())
        };

        Ok(Self {
            db,
            site: Arc::new(Site::from_config(&cfg.site)?),
            cookie_key,
            max_body_bytes: cfg.basic.max_body_bytes,
        })
    }
}

impl FromRef<PorticoState> for Key {
    fn from_ref(state: &PorticoState) -> Self {
        state.cookie_key.clone()
    }
}

async fn access_log(req: Request, next: Next) -> Response {
    // Capture request metadata before moving `req` into the handler stack.
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(generate_request_id, str::to_string);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis();
    let path = uri.path();
    let protocol = format_http_version(version);

    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
            status.as_u16(),
            request_id,
            method.as_str(),
            protocol,
            path,
            latency_ms,
            user_agent
        );
    }

    resp
}

/// Every method and path goes to the front controller.
pub fn portico_router(state: PorticoState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::from_fn(access_log))
}
