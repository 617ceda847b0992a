use crate::config::{RuleSpec, SiteConfig};
use crate::error::PorticoError;
use crate::server::rules::{PathRule, build_rule};
use crate::utils::logging::debug_pretty_json;
use portico_rules::{BlockList, RuleTable, TypeTable};
use std::path::PathBuf;
use tracing::info;

/// Values rules and views read at request time.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub base_path: String,
    pub base_url: String,
    pub views_dir: PathBuf,
    pub public_dir: PathBuf,
}

/// The compiled routing table. Built once at startup and shared read-only.
pub struct Site {
    pub settings: SiteSettings,
    pub blocked: BlockList,
    pub types: TypeTable,
    pub rules: RuleTable<Box<dyn PathRule>>,
}

impl Site {
    pub fn from_config(cfg: &SiteConfig) -> Result<Self, PorticoError> {
        let rules = cfg
            .rules
            .iter()
            .map(|RuleSpec { pattern, action }| -> Result<_, PorticoError> {
                Ok((pattern.clone(), build_rule(action)?))
            })
            .collect::<Result<RuleTable<_>, _>>()?;

        debug_pretty_json("site rules", &cfg.rules);
        info!(
            base_path = %cfg.base_path,
            views_dir = %cfg.views_dir.display(),
            public_dir = %cfg.public_dir.display(),
            blocked = ?cfg.blocked,
            types = cfg.types.len(),
            rules = rules.len(),
            "Site table compiled"
        );

        Ok(Self {
            settings: SiteSettings {
                base_path: cfg.base_path.clone(),
                base_url: cfg.base_url.clone(),
                views_dir: cfg.views_dir.clone(),
                public_dir: cfg.public_dir.clone(),
            },
            blocked: BlockList::new(cfg.blocked.clone()),
            types: TypeTable::new(cfg.types.clone()),
            rules,
        })
    }
}
