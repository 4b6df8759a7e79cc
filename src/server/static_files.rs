//! Static file serving for local add-in development

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Page served for `/`
pub const INDEX_FILE: &str = "taskpane.html";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("js", "text/javascript"),
    ("css", "text/css"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("xml", "application/xml"),
];

/// Content type for a file path, by lowercase extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
        .unwrap_or("application/octet-stream")
}

/// Router answering every path from `root`
pub fn router(root: PathBuf) -> Router {
    Router::new()
        .fallback(serve_file)
        .with_state(Arc::new(root))
}

async fn serve_file(State(root): State<Arc<PathBuf>>, method: Method, uri: Uri) -> Response {
    let path = uri.path();
    info!("{} {}", method, path);

    if path == "/favicon.ico" {
        return StatusCode::NO_CONTENT.into_response();
    }

    // Icons referenced by the manifest; an empty image is enough locally
    if path.starts_with("/assets/") {
        return (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], Body::empty()).into_response();
    }

    let relative = match path {
        "/" => INDEX_FILE,
        other => other.trim_start_matches('/'),
    };

    if relative.split('/').any(|segment| segment == "..") {
        return not_found(relative);
    }

    let file_path = root.join(relative);
    let content_type = content_type_for(&file_path);

    match tokio::fs::read(&file_path).await {
        Ok(content) => {
            debug!("Serving {} ({} bytes)", file_path.display(), content.len());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                ],
                content,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => not_found(relative),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Server error: {}", e.kind()),
        )
            .into_response(),
    }
}

fn not_found(relative: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        format!("File not found: ./{}", relative),
    )
        .into_response()
}
