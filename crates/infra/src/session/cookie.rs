//! Session cookie encoding.

use super::{SESSION_TTL_SECS, SessionArtifact};

pub const SESSION_COOKIE_NAME: &str = "session";

/// How the session cookie is rendered.
///
/// `secure` is on in production; local development runs over plain HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
    pub max_age_secs: i64,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            secure: true,
            max_age_secs: SESSION_TTL_SECS,
        }
    }
}

impl CookiePolicy {
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }

    /// `Set-Cookie` value carrying the artifact.
    pub fn set_cookie(&self, artifact: &SessionArtifact) -> String {
        self.render(artifact.expose(), self.max_age_secs)
    }

    /// `Set-Cookie` value that deletes the session cookie.
    pub fn clear_cookie(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Extract the session cookie value from a `Cookie` request header.
pub fn find_session_cookie(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}
