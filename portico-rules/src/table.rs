//! Ordered lookup tables built once at startup.
//!
//! Rules are first-match-wins. Type mappings are scanned in full and the last
//! match wins. Blocked prefixes are plain string prefixes.

use crate::pattern::PathPattern;
use serde::{Deserialize, Serialize};

/// How a resolved view is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    /// Wrapped in the shared header and footer.
    #[default]
    Html,
    /// Raw body with `application/json`.
    Json,
    /// Raw body, no content type. Keeps the label it was declared with.
    Passthrough(String),
}

impl ContentKind {
    pub fn label(&self) -> &str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Json => "json",
            ContentKind::Passthrough(label) => label,
        }
    }

    /// File extension of a view of this kind.
    pub fn view_extension(&self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Json => "json",
            ContentKind::Passthrough(_) => "txt",
        }
    }
}

impl From<String> for ContentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "html" => ContentKind::Html,
            "json" => ContentKind::Json,
            _ => ContentKind::Passthrough(value),
        }
    }
}

impl From<ContentKind> for String {
    fn from(value: ContentKind) -> Self {
        value.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    pub pattern: PathPattern,
    pub kind: ContentKind,
}

#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: Vec<TypeMapping>,
}

impl TypeTable {
    pub fn new(entries: Vec<TypeMapping>) -> Self {
        Self { entries }
    }

    /// Every entry is tested; the last one that matches decides.
    pub fn resolve(&self, path: &str) -> ContentKind {
        self.entries
            .iter()
            .filter(|entry| entry.pattern.matches(path))
            .last()
            .map(|entry| entry.kind.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered `(pattern, handler)` pairs.
#[derive(Debug, Clone)]
pub struct RuleTable<R> {
    entries: Vec<(PathPattern, R)>,
}

impl<R> Default for RuleTable<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R> RuleTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pattern: PathPattern, rule: R) {
        self.entries.push((pattern, rule));
    }

    /// The first declared entry whose pattern matches `path`.
    pub fn first_match(&self, path: &str) -> Option<(&PathPattern, &R)> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(pattern, rule)| (pattern, rule))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathPattern, &R)> {
        self.entries.iter().map(|(pattern, rule)| (pattern, rule))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R> FromIterator<(PathPattern, R)> for RuleTable<R> {
    fn from_iter<I: IntoIterator<Item = (PathPattern, R)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockList {
    prefixes: Vec<String>,
}

impl BlockList {
    pub fn new(prefixes: Vec<String>) -> Self {
        // An empty prefix would block everything.
        let prefixes = prefixes.into_iter().filter(|p| !p.is_empty()).collect();
        Self { prefixes }
    }

    /// Returns the first prefix `path` starts with.
    pub fn blocks(&self, path: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(s: &str) -> PathPattern {
        PathPattern::parse(s).expect("valid pattern")
    }

    #[test]
    fn first_declared_rule_wins() {
        let table: RuleTable<&str> = [
            (pat("dashboard/*"), "gate"),
            (pat("dashboard/admin/*"), "admin"),
        ]
        .into_iter()
        .collect();

        let (pattern, rule) = table.first_match("dashboard/admin/users").expect("match");
        assert_eq!(pattern.as_str(), "dashboard/*");
        assert_eq!(*rule, "gate");
        assert!(table.first_match("home").is_none());
    }

    #[test]
    fn specific_rule_declared_first_shadows_catch_all() {
        let table: RuleTable<u8> = [
            (pat("assets/js/*.js"), 1),
            (pat("assets/css/*.css"), 2),
            (pat("assets/*"), 3),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.first_match("assets/js/app.js").map(|(_, r)| *r), Some(1));
        assert_eq!(table.first_match("assets/css/a.css").map(|(_, r)| *r), Some(2));
        assert_eq!(table.first_match("assets/img/a.png").map(|(_, r)| *r), Some(3));
    }

    #[test]
    fn last_type_mapping_wins() {
        let table = TypeTable::new(vec![
            TypeMapping {
                pattern: pat("api/*"),
                kind: ContentKind::Json,
            },
            TypeMapping {
                pattern: pat("api/export/*"),
                kind: ContentKind::Passthrough("csv".to_string()),
            },
        ]);

        assert_eq!(
            table.resolve("api/export/users"),
            ContentKind::Passthrough("csv".to_string())
        );
        assert_eq!(table.resolve("api/users"), ContentKind::Json);
        assert_eq!(table.resolve("about"), ContentKind::Html);
    }

    #[test]
    fn content_kind_labels() {
        assert_eq!(ContentKind::from("json".to_string()), ContentKind::Json);
        assert_eq!(ContentKind::from("html".to_string()), ContentKind::Html);
        assert_eq!(ContentKind::from("csv".to_string()).label(), "csv");
        assert_eq!(ContentKind::Json.view_extension(), "json");
    }

    #[test]
    fn block_list_is_plain_prefix() {
        let blocked = BlockList::new(vec!["includes".to_string(), String::new()]);
        assert_eq!(blocked.blocks("includes/header"), Some("includes"));
        assert_eq!(blocked.blocks("includes-old"), Some("includes"));
        assert_eq!(blocked.blocks("home"), None);
    }
}
