//! View lookup and rendering.
//!
//! A view for path `p` is the file `<views_dir>/p.<ext>`, the extension
//! following the resolved content kind, or one of the built-in API views.
//! HTML is wrapped in `includes/header.html` and `includes/footer.html`.

use crate::db::DbActorHandle;
use crate::error::PorticoError;
use crate::server::api::ApiView;
use crate::server::site::SiteSettings;
use crate::utils::paths::{is_file, sanitize_join};
use axum::{
    body::Body,
    http::{HeaderValue, header::CONTENT_TYPE},
    response::Response,
};
use portico_rules::ContentKind;
use std::path::{Path, PathBuf};

const HEADER_VIEW: &str = "includes/header.html";
const FOOTER_VIEW: &str = "includes/footer.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    File(PathBuf),
    Api(ApiView),
}

impl View {
    /// Files take precedence over built-in API views.
    pub async fn find(settings: &SiteSettings, path: &str, kind: &ContentKind) -> Option<Self> {
        let file = sanitize_join(
            &settings.views_dir,
            &format!("{path}.{}", kind.view_extension()),
        );
        if is_file(&file).await {
            return Some(View::File(file));
        }
        ApiView::lookup(path).map(View::Api)
    }

    /// The view body, or `None` when the view has nothing to show.
    pub async fn body(
        &self,
        db: &DbActorHandle,
        query: Option<&str>,
    ) -> Result<Option<Vec<u8>>, PorticoError> {
        match self {
            View::File(file) => Ok(Some(tokio::fs::read(file).await?)),
            View::Api(api) => api.render(db, query).await,
        }
    }
}

/// Shapes a view body according to its content kind.
pub async fn render(
    settings: &SiteSettings,
    kind: &ContentKind,
    body: Vec<u8>,
) -> Result<Response, PorticoError> {
    let resp = match kind {
        ContentKind::Html => {
            let mut page = read_partial(&settings.views_dir, HEADER_VIEW).await?;
            page.extend_from_slice(&body);
            page.extend(read_partial(&settings.views_dir, FOOTER_VIEW).await?);
            with_content_type(page, "text/html; charset=utf-8")
        }
        ContentKind::Json => with_content_type(body, "application/json"),
        ContentKind::Passthrough(_) => Response::new(Body::from(body)),
    };
    Ok(resp)
}

fn with_content_type(body: Vec<u8>, content_type: &'static str) -> Response {
    let mut resp = Response::new(Body::from(body));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

/// A missing header or footer renders as nothing.
async fn read_partial(views_dir: &Path, name: &str) -> Result<Vec<u8>, PorticoError> {
    let file = views_dir.join(name);
    match tokio::fs::read(&file).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}
