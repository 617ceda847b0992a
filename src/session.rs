//! Session values read by the path rules.
//!
//! The store itself is an encrypted private cookie; populating it (login) is
//! left to whoever owns authentication.

use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::debug;

pub const SESSION_COOKIE: &str = "portico_session";
const SESSION_MAX_AGE: Duration = Duration::hours(12);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Session {
    pub fn for_user(user: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            role: Some(role.into()),
        }
    }

    /// An unreadable or tampered cookie reads as an empty session.
    pub fn read(jar: &PrivateCookieJar) -> Self {
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Self::default();
        };
        serde_json::from_str(cookie.value()).unwrap_or_else(|e| {
            debug!(error = %e, "discarding malformed session cookie");
            Self::default()
        })
    }

    pub fn write(&self, jar: PrivateCookieJar) -> Result<PrivateCookieJar, serde_json::Error> {
        let value = serde_json::to_string(self)?;
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(SESSION_MAX_AGE)
            .build();
        Ok(jar.add(cookie))
    }

    pub fn clear(jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.is_logged_in() && self.role.as_deref() == Some(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    #[test]
    fn round_trips_through_private_jar() {
        let jar = PrivateCookieJar::new(Key::generate());
        let session = Session::for_user("alice", "admin");

        let jar = session.write(jar).expect("write session");
        assert_eq!(Session::read(&jar), session);

        let jar = Session::clear(jar);
        assert_eq!(Session::read(&jar), Session::default());
    }

    #[test]
    fn role_requires_user() {
        let session = Session {
            user: None,
            role: Some("admin".to_string()),
        };
        assert!(!session.has_role("admin"));
        assert!(Session::for_user("bob", "admin").has_role("admin"));
        assert!(!Session::for_user("bob", "user").has_role("admin"));
    }
}
