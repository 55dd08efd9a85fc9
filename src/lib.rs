//! # quire
//!
//! A small blog served over HTTP: posts and tags with detail pages, a
//! searchable and paginated post list, and create/update/delete pages behind
//! a login gate. Data lives in SQLite; pages are minijinja templates.
//!
//! The crate is two layers:
//!
//! - A thin HTTP layer on hyper: radix-tree routing via [`matchit`], handlers
//!   as plain async functions, state injected with [`with_state`], request
//!   gates in [`middleware`] and graceful shutdown on SIGTERM / Ctrl-C.
//! - The [`blog`] application built on it.
//!
//! TLS, rate limiting and body-size limits belong to the reverse proxy in
//! front.
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quire::blog::session::DEFAULT_SESSION_TTL;
//! use quire::blog::{self, Blog, store::Store};
//! use quire::{Method, Request, Status};
//!
//! # async fn demo() -> Result<(), quire::Error> {
//! let app = Arc::new(Blog::new(Store::open_in_memory()?, &[], DEFAULT_SESSION_TTL)?);
//! let router = blog::routes(app);
//!
//! let res = router.dispatch(Request::builder(Method::Get, "/").build()).await;
//! assert_eq!(res.status_code(), Status::Ok);
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod blog;
pub mod config;
pub mod health;
pub mod middleware;

use std::sync::Arc;

use tracing::{info, warn};

pub use config::Config;
pub use error::Error;
pub use handler::{Handler, with_state};
pub use method::Method;
pub use request::{FormData, Request, RequestBuilder};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;

/// Opens the store named by `config`, builds the blog and serves it until a
/// shutdown signal arrives.
pub async fn run(config: Config) -> Result<(), Error> {
    let store = blog::store::Store::open(&config.database)?;
    if config.users.is_empty() {
        warn!("no [[users]] configured; nobody can log in to write");
    }
    let app = Arc::new(blog::Blog::new(store, &config.users, config.session_ttl())?);
    info!(database = %config.database, users = config.users.len(), "blog ready");

    Server::bind(&config.bind)?.serve(blog::routes(app)).await
}
