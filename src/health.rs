//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can it serve traffic right now? |
//!
//! Readiness is generic over any state implementing [`Readiness`], so the
//! probe reflects the real dependency (for the blog, the SQLite store).

use std::sync::Arc;

use crate::{Request, Response, Status};

/// State that can report whether its dependencies are usable.
pub trait Readiness: Send + Sync + 'static {
    fn is_ready(&self) -> bool;
}

/// Liveness probe. Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe. `200 ready` while `state` is ready, `503` otherwise.
pub async fn readiness<S: Readiness>(state: Arc<S>, _req: Request) -> Response {
    if state.is_ready() {
        Response::text("ready")
    } else {
        Response::status(Status::ServiceUnavailable)
    }
}
