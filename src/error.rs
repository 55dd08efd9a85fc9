//! Unified error type.

use crate::blog::store::StoreError;

/// The error type returned by quire's fallible start-up and infrastructure
/// operations.
///
/// Request outcomes (404, 403, an invalid form) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// failures underneath them: binding a port, reading config, the store or
/// the template engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    Addr(String),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("password hash: {0}")]
    Password(String),
}
