mod basic;
mod site;

pub use basic::BasicConfig;
pub use site::{RuleAction, RuleSpec, SiteConfig};

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Minimum length of `basic.cookie_secret` when one is configured.
pub const MIN_COOKIE_SECRET_LEN: usize = 32;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Routing table and view locations (see `site` table in config.toml).
    #[serde(default)]
    pub site: SiteConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Checks values serde cannot express.
    ///
    /// Patterns are already validated while deserializing.
    pub fn validate(&self) -> Result<(), String> {
        let secret = self.basic.cookie_secret.as_str();
        if !secret.is_empty() && secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(format!(
                "basic.cookie_secret must be at least {MIN_COOKIE_SECRET_LEN} bytes (got {})",
                secret.len()
            ));
        }
        if !self.site.base_path.starts_with('/') {
            return Err(format!(
                "site.base_path must start with '/' (got {:?})",
                self.site.base_path
            ));
        }
        Ok(())
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn short_cookie_secret_is_rejected() {
        let mut cfg = Config::default();
        cfg.basic.cookie_secret = "too-short".to_string();
        assert!(cfg.validate().is_err());

        cfg.basic.cookie_secret = "x".repeat(MIN_COOKIE_SECRET_LEN);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn site_table_merges_from_toml() {
        let toml = r#"
            [site]
            blocked = ["includes", "private"]

            [[site.types]]
            pattern = "feeds/*"
            kind = "xml"

            [[site.rules]]
            pattern = "members/*"
            action = { kind = "require_user" }
        "#;

        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
            .extract()
            .expect("config from toml");

        assert_eq!(cfg.site.blocked, vec!["includes", "private"]);
        assert_eq!(cfg.site.types.len(), 1);
        assert_eq!(cfg.site.types[0].kind.label(), "xml");
        assert_eq!(cfg.site.rules.len(), 1);
        assert_eq!(cfg.site.rules[0].action, RuleAction::RequireUser);
    }
}
