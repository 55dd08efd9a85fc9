//! Runtime configuration.
//!
//! Read from an optional TOML file, then overridden by `QUIRE_BIND` and
//! `QUIRE_DATABASE`. Every field has a default, so an empty file (or none at
//! all) yields a working local setup.
//!
//! ```toml
//! bind = "0.0.0.0:8000"
//! database = "/var/lib/quire/blog.sqlite3"
//! log_level = "quire=debug,info"
//! session_ttl_secs = 86400
//!
//! [[users]]
//! username = "admin"
//! password_hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::blog::session::DEFAULT_SESSION_TTL;
use crate::error::Error;

pub const ENV_BIND: &str = "QUIRE_BIND";
pub const ENV_DATABASE: &str = "QUIRE_DATABASE";

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `host:port` to listen on.
    pub bind: String,
    /// SQLite file path, or `:memory:`.
    pub database: String,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// How long a login lasts, in seconds.
    pub session_ttl_secs: u64,
    /// Accounts allowed to write.
    pub users: Vec<Account>,
}

/// A login account. `password_hash` is an argon2 PHC string as printed by
/// `quire hash-password`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_owned(),
            database: "quire.sqlite3".to_owned(),
            log_level: "info".to_owned(),
            session_ttl_secs: DEFAULT_SESSION_TTL.as_secs(),
            users: Vec::new(),
        }
    }
}

impl Config {
    /// Loads `path` when given, else defaults, then applies the process
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn from_toml(source: &str) -> Result<Self, Error> {
        Ok(toml::from_str(source)?)
    }

    /// Applies `QUIRE_*` overrides looked up through `lookup`. Empty values
    /// are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind = bind;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database = database;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.bind, "127.0.0.1:8000");
        assert_eq!(config.database, "quire.sqlite3");
        assert!(config.users.is_empty());
        assert_eq!(config.session_ttl(), DEFAULT_SESSION_TTL);
    }

    #[test]
    fn session_ttl_is_read_in_seconds() {
        let config = Config::from_toml("session_ttl_secs = 3600").unwrap();
        assert_eq!(config.session_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn parses_accounts() {
        let config = Config::from_toml(
            r#"
            bind = "0.0.0.0:9000"

            [[users]]
            username = "admin"
            password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].username, "admin");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::from_toml("port = 80"), Err(Error::Config(_))));
    }

    #[test]
    fn overrides_win_over_file_values_but_blank_ones_do_not() {
        let mut config = Config::from_toml(r#"database = "file.db""#).unwrap();
        config.apply_overrides(|key| match key {
            ENV_BIND => Some("0.0.0.0:1234".to_owned()),
            ENV_DATABASE => Some("  ".to_owned()),
            _ => None,
        });
        assert_eq!(config.bind, "0.0.0.0:1234");
        assert_eq!(config.database, "file.db");
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.log_level, "debug");
    }
}
