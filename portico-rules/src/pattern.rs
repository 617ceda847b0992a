//! Glob-like path patterns.
//!
//! A pattern is split on `*` into literal and wildcard tokens, then classified
//! as an exact, prefix or general wildcard match. `*` matches any run of
//! characters, `/` included, and every match is anchored at both ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("path pattern must not be empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// No wildcard at all.
    Exact(String),
    /// A single trailing wildcard, e.g. `dashboard/*`.
    Prefix(String),
    /// Anything else, e.g. `assets/js/*.js`.
    Wildcard(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern {
    source: String,
    kind: MatchKind,
}

impl PathPattern {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        if source.is_empty() {
            return Err(PatternError::Empty);
        }

        let tokens = tokenize(source);
        let kind = match tokens.as_slice() {
            [Token::Literal(lit)] => MatchKind::Exact(lit.clone()),
            [Token::Wildcard] => MatchKind::Prefix(String::new()),
            [Token::Literal(lit), Token::Wildcard] => MatchKind::Prefix(lit.clone()),
            _ => MatchKind::Wildcard(tokens),
        };

        Ok(Self {
            source: source.to_string(),
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> &MatchKind {
        &self.kind
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.kind {
            MatchKind::Exact(lit) => path == lit,
            MatchKind::Prefix(lit) => path.starts_with(lit.as_str()),
            MatchKind::Wildcard(tokens) => wildcard_match(tokens, path),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for PathPattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PathPattern> for String {
    fn from(value: PathPattern) -> Self {
        value.source
    }
}

/// Splits on `*`; runs of stars collapse into one wildcard.
fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();

    for ch in source.chars() {
        if ch == '*' {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            if tokens.last() != Some(&Token::Wildcard) {
                tokens.push(Token::Wildcard);
            }
        } else {
            literal.push(ch);
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

fn wildcard_match(tokens: &[Token], path: &str) -> bool {
    let last = tokens.len().saturating_sub(1);
    let mut rest = path;

    for (i, token) in tokens.iter().enumerate() {
        let Token::Literal(lit) = token else {
            continue;
        };

        if i == 0 {
            match rest.strip_prefix(lit.as_str()) {
                Some(tail) => rest = tail,
                None => return false,
            }
        } else if i == last {
            return rest.ends_with(lit.as_str());
        } else {
            // Leftmost occurrence leaves the most room for later tokens.
            match rest.find(lit.as_str()) {
                Some(pos) => rest = &rest[pos + lit.len()..],
                None => return false,
            }
        }
    }

    // Pattern ends with a wildcard, which swallows whatever is left.
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(s: &str) -> PathPattern {
        PathPattern::parse(s).expect("valid pattern")
    }

    #[test]
    fn classifies_match_kinds() {
        assert_eq!(pat("home").kind(), &MatchKind::Exact("home".to_string()));
        assert_eq!(
            pat("dashboard/*").kind(),
            &MatchKind::Prefix("dashboard/".to_string())
        );
        assert_eq!(pat("*").kind(), &MatchKind::Prefix(String::new()));
        assert!(matches!(pat("assets/js/*.js").kind(), MatchKind::Wildcard(_)));
        assert!(matches!(pat("*.css").kind(), MatchKind::Wildcard(_)));
    }

    #[test]
    fn consecutive_stars_collapse() {
        assert_eq!(
            pat("api/**").kind(),
            &MatchKind::Prefix("api/".to_string())
        );
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert_eq!(PathPattern::parse(""), Err(PatternError::Empty));
    }

    #[test]
    fn wildcard_crosses_segments() {
        assert!(pat("assets/*").matches("assets/img/deep/logo.png"));
        assert!(pat("assets/js/*.js").matches("assets/js/vendor/lib.js"));
        assert!(pat("dash*").matches("dashboard-fake"));
    }

    #[test]
    fn matching_is_anchored() {
        assert!(!pat("assets/js/*.js").matches("assets/js/app.js.map"));
        assert!(!pat("assets/js/*.js").matches("public/assets/js/app.js"));
        assert!(!pat("home").matches("home/extra"));
        assert!(!pat("dashboard/*").matches("dashboard"));
        assert!(!pat("dashboard/*").matches("dashboard-fake"));
    }

    #[test]
    fn dot_is_literal() {
        assert!(!pat("assets/css/*.css").matches("assets/css/siteXcss"));
        assert!(pat("assets/css/*.css").matches("assets/css/site.css"));
    }

    #[test]
    fn star_matches_empty_run() {
        assert!(pat("a*b").matches("ab"));
        assert!(!pat("a*a").matches("a"));
        assert!(pat("a*b*c").matches("abc"));
        assert!(pat("a*b*c").matches("axxbyyc"));
        assert!(!pat("a*b*c").matches("axxcyyb"));
    }

    #[test]
    fn deserializes_from_string() {
        let parsed: PathPattern = serde_json::from_str(r#""api/*""#).expect("pattern json");
        assert_eq!(parsed.as_str(), "api/*");
        assert!(serde_json::from_str::<PathPattern>(r#""""#).is_err());
    }
}
