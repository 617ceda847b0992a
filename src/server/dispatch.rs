use crate::error::PorticoError;
use crate::server::router::PorticoState;
use crate::server::rules::{RuleContext, RuleOutcome};
use crate::server::views::{self, View};
use crate::session::Session;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use portico_rules::normalize_path;
use tracing::debug;

/// Front controller: every request path lands here.
///
/// Order matters: blocked prefixes, then the first matching rule, then the
/// last matching content type, then the view.
pub async fn dispatch(
    State(state): State<PorticoState>,
    jar: PrivateCookieJar,
    uri: Uri,
) -> Result<Response, PorticoError> {
    let site = state.site.as_ref();
    // One canonical key for blocking, rules, types and file lookup.
    let path = normalize_path(uri.path(), &site.settings.base_path);

    if let Some(prefix) = site.blocked.blocks(&path) {
        debug!(path = %path, prefix, "blocked prefix");
        return Ok((StatusCode::FORBIDDEN, Html("<h1>403 Forbidden</h1>")).into_response());
    }

    if let Some((pattern, rule)) = site.rules.first_match(&path) {
        let session = Session::read(&jar);
        let ctx = RuleContext {
            path: &path,
            session: &session,
            settings: &site.settings,
        };
        match rule.apply(&ctx).await {
            RuleOutcome::Respond(resp) => {
                debug!(
                    path = %path,
                    pattern = %pattern,
                    rule = rule.name(),
                    status = %resp.status(),
                    "rule answered"
                );
                return Ok(resp);
            }
            RuleOutcome::Continue => {
                debug!(path = %path, pattern = %pattern, rule = rule.name(), "rule passed");
            }
        }
    }

    let kind = site.types.resolve(&path);
    let Some(view) = View::find(&site.settings, &path, &kind).await else {
        return Err(PorticoError::NotFound);
    };
    let Some(body) = view.body(&state.db, uri.query()).await? else {
        return Err(PorticoError::NotFound);
    };

    views::render(&site.settings, &kind, body).await
}
