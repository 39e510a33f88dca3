//! Credential checks for the source endpoint.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use contentsync_sync::source::{AUTH_HEADER, QUERY_PASS, QUERY_USER};

/// A username and application password allowed to read from the source.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    password: String,
}

impl Account {
    /// Creates an account. Whitespace in the password is ignored, so
    /// application passwords can be given in their grouped display form.
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            password: strip_spaces(password),
        }
    }

    fn accepts(&self, username: &str, password: &str) -> bool {
        !self.password.is_empty()
            && self.username == username.trim()
            && self.password == strip_spaces(password)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl FromStr for Account {
    type Err = String;

    /// Parses `user:password`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((user, pass)) if !user.trim().is_empty() && !pass.trim().is_empty() => {
                Ok(Self::new(user, pass))
            }
            _ => Err(format!("expected user:password, got {s:?}")),
        }
    }
}

fn strip_spaces(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Decodes a `Basic` credential into username and password.
fn decode_basic(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Checks the request's credentials against `accounts`.
///
/// Sources are tried in order: the `Authorization` header, its duplicate
/// header, then (only when `allow_query`) the query parameters.
pub(crate) fn authenticate(
    accounts: &[Account],
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    allow_query: bool,
) -> Option<String> {
    let check = |user: &str, pass: &str| {
        accounts
            .iter()
            .find(|a| a.accepts(user, pass))
            .map(|a| a.username.clone())
    };

    for name in [AUTHORIZATION.as_str(), AUTH_HEADER] {
        let credential = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(decode_basic);
        if let Some(user) = credential.and_then(|(u, p)| check(&u, &p)) {
            return Some(user);
        }
    }

    if allow_query {
        if let (Some(user), Some(pass)) = (query.get(QUERY_USER), query.get(QUERY_PASS)) {
            return check(user, pass);
        }
    }
    None
}
