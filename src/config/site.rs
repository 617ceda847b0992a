use portico_rules::{ContentKind, PathPattern, TypeMapping};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a matched rule does. Built into a `PathRule` handler at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleAction {
    /// Stream `<public_dir>/<path>` with a fixed content type, or 404.
    Asset { content_type: String },
    /// Unconditional 403.
    Forbid { message: String },
    /// Redirect to `site.base_url` without a session user.
    RequireUser,
    /// 403 unless the session has a user with this role.
    RequireRole { role: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: PathPattern,
    pub action: RuleAction,
}

/// Routing table and filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Prefix removed from request paths before lookup.
    /// TOML: `site.base_path`. Default: `/`.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Redirect target for the login gate and `redirect::back`.
    /// TOML: `site.base_url`. Default: `/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// TOML: `site.views_dir`. Default: `views`.
    #[serde(default = "default_views_dir")]
    pub views_dir: PathBuf,

    /// Root that asset rule paths are resolved against.
    /// TOML: `site.public_dir`. Default: `.`.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Path prefixes answered with 403 before any rule runs.
    #[serde(default)]
    pub blocked: Vec<String>,

    /// `(pattern, kind)` pairs; the last match decides.
    #[serde(default)]
    pub types: Vec<TypeMapping>,

    /// `(pattern, action)` pairs; the first match runs.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            base_url: default_base_url(),
            views_dir: default_views_dir(),
            public_dir: default_public_dir(),
            blocked: vec!["includes".to_string()],
            types: vec![TypeMapping {
                pattern: pattern("api/*"),
                kind: ContentKind::Json,
            }],
            rules: default_rules(),
        }
    }
}

fn default_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec {
            pattern: pattern("assets/js/*.js"),
            action: RuleAction::Asset {
                content_type: "application/javascript".to_string(),
            },
        },
        RuleSpec {
            pattern: pattern("assets/css/*.css"),
            action: RuleAction::Asset {
                content_type: "text/css".to_string(),
            },
        },
        // Reached only when neither rule above matched.
        RuleSpec {
            pattern: pattern("assets/*"),
            action: RuleAction::Forbid {
                message: "<h1>403 Forbidden - Only .js and .css files are allowed in assets.</h1>"
                    .to_string(),
            },
        },
        RuleSpec {
            pattern: pattern("dashboard/*"),
            action: RuleAction::RequireUser,
        },
        RuleSpec {
            pattern: pattern("dashboard/admin/*"),
            action: RuleAction::RequireRole {
                role: "admin".to_string(),
                message: "403 - Admins only".to_string(),
            },
        },
    ]
}

fn pattern(source: &str) -> PathPattern {
    PathPattern::parse(source).expect("built-in pattern is valid")
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_base_url() -> String {
    "/".to_string()
}

fn default_views_dir() -> PathBuf {
    PathBuf::from("views")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from(".")
}
