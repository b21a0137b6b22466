//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Routes have fixed precedence:
//! the relay endpoint (exact method + path), then static assets, then the
//! SPA entry document for any other GET, then 404.

use crate::config::AppState;
use crate::handler::{relay, static_files};
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// The one API route this gateway exposes
pub const RELAY_PATH: &str = "/api/generate";

/// Request context encapsulating information needed for asset serving
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// Generic over the body type so tests can drive the router with
/// pre-built bodies.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let http_version = version_str(req.version()).to_string();
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let access_log = state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed);

    let mut response = dispatch(req, &state).await;

    if state.config.http.enable_cors {
        http::response::apply_cors(&mut response);
    }

    if access_log {
        let mut entry = logger::AccessLogEntry::new(peer_addr.ip().to_string(), method, path);
        entry.query = query;
        entry.http_version = http_version;
        entry.status = response.status().as_u16();
        entry.body_bytes = body_len(&response);
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route the request with fixed precedence
async fn dispatch<B>(req: Request<B>, state: &Arc<AppState>) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    // Reject oversized bodies before reading anything
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    // 1. Relay endpoint: exact method + path match only. A GET here falls
    //    through to the catch-all like any other unmatched path.
    if req.method() == Method::POST && req.uri().path() == RELAY_PATH {
        return relay::handle_generate(req, state).await;
    }

    // 2. Preflight
    if req.method() == Method::OPTIONS {
        return http::build_options_response(state.config.http.enable_cors);
    }

    // 3. Static assets, then the entry-document catch-all
    let is_head = req.method() == Method::HEAD;
    if req.method() == Method::GET || is_head {
        let ctx = RequestContext {
            path: req.uri().path(),
            is_head,
            if_none_match: req
                .headers()
                .get("if-none-match")
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
        };

        let root = &state.config.static_files.root;
        if let Some(resp) = static_files::try_serve_asset(&ctx, root).await {
            return resp;
        }
        return static_files::serve_entry_document(
            &ctx,
            root,
            &state.config.static_files.entry_document,
        )
        .await;
    }

    // 4. Unmatched non-GET request
    logger::log_warning(&format!(
        "No route for {} {}",
        req.method(),
        req.uri().path()
    ));
    http::build_404_response()
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Exact body length of an outgoing response
fn body_len(response: &Response<Full<Bytes>>) -> usize {
    use hyper::body::Body as _;
    usize::try_from(response.body().size_hint().exact().unwrap_or(0)).unwrap_or(0)
}

#[allow(clippy::missing_const_for_fn)]
fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}
