//! Path rules: handlers attached to patterns in the site table.
//!
//! Only the first rule whose pattern matches runs. A rule either answers the
//! request itself or lets dispatch continue to type resolution and the view.

use crate::config::RuleAction;
use crate::error::PorticoError;
use crate::redirect;
use crate::server::site::SiteSettings;
use crate::session::Session;
use crate::utils::paths::{is_file, sanitize_join};
use async_trait::async_trait;
use axum::{
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{Html, IntoResponse, Response},
};
use tracing::debug;

pub struct RuleContext<'a> {
    /// Normalized request path.
    pub path: &'a str,
    pub session: &'a Session,
    pub settings: &'a SiteSettings,
}

pub enum RuleOutcome {
    Continue,
    Respond(Response),
}

#[async_trait]
pub trait PathRule: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, ctx: &RuleContext<'_>) -> RuleOutcome;
}

/// Builds the handler for a declared action.
pub fn build_rule(action: &RuleAction) -> Result<Box<dyn PathRule>, PorticoError> {
    let rule: Box<dyn PathRule> = match action {
        RuleAction::Asset { content_type } => {
            let content_type = HeaderValue::from_str(content_type).map_err(|_| {
                PorticoError::Config(format!("invalid asset content type {content_type:?}"))
            })?;
            Box::new(ServeAsset { content_type })
        }
        RuleAction::Forbid { message } => Box::new(Forbid {
            message: message.clone(),
        }),
        RuleAction::RequireUser => Box::new(RequireUser),
        RuleAction::RequireRole { role, message } => Box::new(RequireRole {
            role: role.clone(),
            message: message.clone(),
        }),
    };
    Ok(rule)
}

/// Serves `<public_dir>/<path>` verbatim. Always answers.
pub struct ServeAsset {
    content_type: HeaderValue,
}

#[async_trait]
impl PathRule for ServeAsset {
    fn name(&self) -> &'static str {
        "asset"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let file = sanitize_join(&ctx.settings.public_dir, ctx.path);
        if !is_file(&file).await {
            debug!(path = ctx.path, file = %file.display(), "asset missing");
            return RuleOutcome::Respond((StatusCode::NOT_FOUND, "File not found.").into_response());
        }

        let resp = match tokio::fs::read(&file).await {
            Ok(bytes) => ([(CONTENT_TYPE, self.content_type.clone())], bytes).into_response(),
            Err(e) => PorticoError::from(e).into_response(),
        };
        RuleOutcome::Respond(resp)
    }
}

/// Unconditional 403 with a fixed message.
pub struct Forbid {
    message: String,
}

#[async_trait]
impl PathRule for Forbid {
    fn name(&self) -> &'static str {
        "forbid"
    }

    async fn apply(&self, _ctx: &RuleContext<'_>) -> RuleOutcome {
        RuleOutcome::Respond((StatusCode::FORBIDDEN, Html(self.message.clone())).into_response())
    }
}

/// Sends visitors without a session user to the base URL.
pub struct RequireUser;

#[async_trait]
impl PathRule for RequireUser {
    fn name(&self) -> &'static str {
        "require_user"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        if ctx.session.is_logged_in() {
            RuleOutcome::Continue
        } else {
            RuleOutcome::Respond(redirect::to(&ctx.settings.base_url).into_response())
        }
    }
}

pub struct RequireRole {
    role: String,
    message: String,
}

#[async_trait]
impl PathRule for RequireRole {
    fn name(&self) -> &'static str {
        "require_role"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        if ctx.session.has_role(&self.role) {
            RuleOutcome::Continue
        } else {
            RuleOutcome::Respond((StatusCode::FORBIDDEN, self.message.clone()).into_response())
        }
    }
}
