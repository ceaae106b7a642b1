use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::http::{Method, Uri, header::CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::context::AppContext;
use crate::server::response::ApiError;

const INDEX_FILE: &str = "index.html";

/// Catch-all for the UI bundle: a matching file, else `index.html`.
pub async fn serve_ui(State(ctx): State<AppContext>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return ApiError::not_found("Not found").into_response();
    }

    let root = &ctx.config.static_dir;
    let Some(requested) = resolve(root, uri.path()) else {
        return ApiError::not_found("Not found").into_response();
    };

    for candidate in [requested, root.join(INDEX_FILE)] {
        if let Ok(bytes) = tokio::fs::read(&candidate).await {
            debug!(path = %candidate.display(), "serving UI asset");
            return ([(CONTENT_TYPE, content_type(&candidate))], bytes).into_response();
        }
    }

    ApiError::not_found("UI bundle not found").into_response()
}

fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    let mut pushed = false;
    for segment in request_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            _ if segment.contains('\\') => return None,
            _ => {
                resolved.push(segment);
                pushed = true;
            }
        }
    }
    if !pushed {
        resolved.push(INDEX_FILE);
    }
    Some(resolved)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
