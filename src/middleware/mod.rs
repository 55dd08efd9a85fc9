//! Middleware layer.
//!
//! A [`Gate`] inspects a request before its handler runs and either lets it
//! through or answers on the handler's behalf. [`guard`] wraps any handler
//! with a gate, so the wrapped handler never executes for a refused request.

use std::sync::Arc;

use crate::handler::Handler;
use crate::request::Request;
use crate::response::Response;

/// Admission check run ahead of a guarded handler.
pub trait Gate: Send + Sync + 'static {
    /// `Ok(())` lets the request through; `Err(response)` is sent instead.
    fn admit(&self, req: &Request) -> Result<(), Response>;
}

/// Wraps `handler` so that `gate` is consulted first.
pub fn guard<G: Gate>(gate: Arc<G>, handler: impl Handler) -> impl Handler {
    let inner = handler.into_boxed_handler();
    move |req: Request| {
        let verdict = gate.admit(&req);
        let inner = Arc::clone(&inner);
        async move {
            match verdict {
                Ok(()) => inner.call(req).await,
                Err(refusal) => refusal,
            }
        }
    }
}
