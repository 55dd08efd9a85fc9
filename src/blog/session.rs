//! Login sessions and per-request authentication state.
//!
//! Sessions live in memory and are keyed by an opaque random token carried
//! in the `sessionid` cookie. Each one expires a fixed TTL after login.
//! Accounts come from configuration with argon2 PHC password hashes. A
//! restart logs everyone out.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::config::Account;
use crate::error::Error;
use crate::request::Request;

pub const SESSION_COOKIE: &str = "sessionid";

/// Two weeks.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

const MAX_SESSIONS: usize = 10_000;

/// Who is making the current request. Resolved once per request from its
/// cookie and handed to views explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Auth {
    username: Option<String>,
    is_authenticated: bool,
}

impl Auth {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(username: impl Into<String>) -> Self {
        Self { username: Some(username.into()), is_authenticated: true }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

#[derive(Debug)]
struct Session {
    username: String,
    expires_at: Instant,
}

/// Active sessions: token → username and expiry.
#[derive(Debug)]
pub struct Sessions {
    ttl: Duration,
    active: RwLock<HashMap<String, Session>>,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, active: RwLock::default() }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Opens a session for `username` and returns its token. Expired
    /// sessions are dropped first; past `MAX_SESSIONS` the ones closest to
    /// expiry go too.
    pub fn start(&self, username: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);

        active.retain(|_, session| session.expires_at > now);
        while active.len() >= MAX_SESSIONS {
            let oldest = active.iter()
                .min_by_key(|(_, session)| session.expires_at)
                .map(|(token, _)| token.clone());
            match oldest {
                Some(oldest) => { active.remove(&oldest); }
                None => break,
            }
        }

        active.insert(token.clone(), Session {
            username: username.to_owned(),
            expires_at: now + self.ttl,
        });
        token
    }

    pub fn end(&self, token: &str) -> bool {
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    /// Username for a live session. Expired tokens resolve to nothing.
    pub fn resolve(&self, token: &str) -> Option<String> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .filter(|session| session.expires_at > Instant::now())
            .map(|session| session.username.clone())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.active.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Auth state for the request's session cookie.
    pub fn auth(&self, req: &Request) -> Auth {
        req.cookie(SESSION_COOKIE)
            .and_then(|token| self.resolve(token))
            .map(Auth::user)
            .unwrap_or_default()
    }
}

/// `Set-Cookie` value opening a session that lives for `ttl`.
pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        ttl.as_secs()
    )
}

/// `Set-Cookie` value clearing the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Configured accounts: username → argon2 PHC hash.
#[derive(Debug, Default)]
pub struct Accounts(HashMap<String, String>);

impl Accounts {
    pub fn new(accounts: &[Account]) -> Self {
        Self(
            accounts.iter()
                .map(|a| (a.username.clone(), a.password_hash.clone()))
                .collect(),
        )
    }

    /// Checks `password` against the stored hash. Unknown users and
    /// malformed hashes fail.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.0.get(username) else {
            return false;
        };
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!(username, error = %e, "stored password hash is malformed");
                false
            }
        }
    }
}

/// Argon2id PHC hash of `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Password(e.to_string()))
}

/// Redirect target after login: local absolute paths only.
pub fn safe_next(next: &str) -> &str {
    let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
    if local { next } else { "/" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    #[test]
    fn session_cookie_resolves_to_user_until_ended() {
        let sessions = Sessions::new(DEFAULT_SESSION_TTL);
        let token = sessions.start("admin");
        let req = Request::builder(Method::Get, "/").cookie(SESSION_COOKIE, &token).build();
        assert_eq!(sessions.auth(&req), Auth::user("admin"));

        assert!(sessions.end(&token));
        assert_eq!(sessions.auth(&req), Auth::anonymous());
        assert!(!sessions.end(&token));
    }

    #[test]
    fn expired_session_is_anonymous_and_pruned_on_next_login() {
        let sessions = Sessions::new(Duration::ZERO);
        let token = sessions.start("admin");
        let req = Request::builder(Method::Get, "/").cookie(SESSION_COOKIE, &token).build();
        assert_eq!(sessions.resolve(&token), None);
        assert_eq!(sessions.auth(&req), Auth::anonymous());

        sessions.start("admin");
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn cookie_max_age_follows_the_ttl() {
        let cookie = session_cookie("abc", Duration::from_secs(60));
        assert!(cookie.starts_with("sessionid=abc;"));
        assert!(cookie.contains("Max-Age=60"));
    }

    #[test]
    fn unknown_token_is_anonymous() {
        let sessions = Sessions::new(DEFAULT_SESSION_TTL);
        let req = Request::builder(Method::Get, "/").cookie(SESSION_COOKIE, "forged").build();
        assert!(!sessions.auth(&req).is_authenticated());
    }

    #[test]
    fn hashed_password_verifies_only_with_the_right_secret() {
        let hash = hash_password("hunter2").unwrap();
        let accounts = Accounts::new(&[Account { username: "admin".into(), password_hash: hash }]);
        assert!(accounts.verify("admin", "hunter2"));
        assert!(!accounts.verify("admin", "hunter3"));
        assert!(!accounts.verify("root", "hunter2"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let accounts = Accounts::new(&[Account { username: "a".into(), password_hash: "plain".into() }]);
        assert!(!accounts.verify("a", "plain"));
    }

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next("/post/create/"), "/post/create/");
        assert_eq!(safe_next("//evil.example"), "/");
        assert_eq!(safe_next("https://evil.example"), "/");
        assert_eq!(safe_next(""), "/");
    }
}
