//! Static asset serving module
//!
//! Resolves frontend assets under the configured root, with MIME type
//! detection and conditional-request support. Also serves the SPA entry
//! document for the router's catch-all.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Try to serve a static asset for the request path
///
/// Returns `None` when no asset exists at the resolved location so the
/// router can fall through to the entry document.
pub async fn try_serve_asset(
    ctx: &RequestContext<'_>,
    root: &str,
) -> Option<Response<Full<Bytes>>> {
    let (content, content_type) = load_asset(root, ctx.path).await?;
    Some(build_conditional_asset_response(
        &content,
        content_type,
        ctx.if_none_match.as_deref(),
        ctx.is_head,
    ))
}

/// Serve the SPA entry document
///
/// A missing entry document is an operator misconfiguration: the request
/// gets a diagnostic 404 and the process keeps running.
pub async fn serve_entry_document(
    ctx: &RequestContext<'_>,
    root: &str,
    entry_document: &str,
) -> Response<Full<Bytes>> {
    let path = Path::new(root).join(entry_document);
    match fs::read(&path).await {
        Ok(content) => http::response::build_entry_document_response(content, ctx.is_head),
        Err(e) => {
            logger::log_error(&format!(
                "Entry document '{}' is missing or unreadable: {e}",
                path.display()
            ));
            http::build_404_response_with_detail("entry document is not available")
        }
    }
}

/// Load an asset under the root directory
///
/// Rejects directory-traversal attempts by canonicalizing both the root
/// and the candidate path and checking the prefix.
async fn load_asset(root: &str, path: &str) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slashes and prevent directory traversal
    let clean_path = path.trim_start_matches('/').replace("..", "");
    let clean_path = clean_path.trim_start_matches('/');
    if clean_path.is_empty() {
        return None;
    }

    let file_path = Path::new(root).join(clean_path);

    let root_canonical = match Path::new(root).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static asset root not found or inaccessible '{root}': {e}"
            ));
            return None;
        }
    };

    // Asset not found is common (falls through to the entry document)
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }
    if !file_path_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read asset '{}': {e}",
                file_path_canonical.display()
            ));
            return None;
        }
    };

    // Determine content type from extension
    let content_type =
        mime::get_content_type(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

/// Build asset response with `ETag` revalidation
fn build_conditional_asset_response(
    data: &[u8],
    content_type: &str,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);

    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    http::response::build_asset_response(
        Bytes::from(data.to_owned()),
        content_type,
        &etag,
        is_head,
    )
}
