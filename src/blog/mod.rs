//! The blog application: posts, tags, search and the login gate.
//!
//! [`Blog`] is the shared state every handler receives; [`routes`] wires the
//! views into a [`Router`].

pub mod forms;
pub mod models;
pub mod paginate;
pub mod session;
pub mod slug;
pub mod store;
pub mod templates;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use self::models::{Post, Tag};
use self::session::{Accounts, Auth, Sessions};
use self::store::Store;
use self::templates::{Context, Templates};
use self::views::{ViewError, ViewResult};
use crate::config::Account;
use crate::error::Error;
use crate::handler::{Handler, with_state};
use crate::health::{self, Readiness};
use crate::middleware::{Gate, guard};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;
use crate::status::Status;

/// Shared application state.
pub struct Blog {
    store: Store,
    sessions: Sessions,
    accounts: Accounts,
    templates: Templates,
}

impl Blog {
    /// Logins made through this blog expire `session_ttl` after they start.
    pub fn new(store: Store, accounts: &[Account], session_ttl: Duration) -> Result<Self, Error> {
        Ok(Self {
            store,
            sessions: Sessions::new(session_ttl),
            accounts: Accounts::new(accounts),
            templates: Templates::new()?,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn auth(&self, req: &Request) -> Auth {
        self.sessions.auth(req)
    }

    /// Renders `template` as an HTML page with `status`.
    pub fn page(&self, status: Status, template: &str, ctx: &Context) -> ViewResult {
        let html = self.templates.render(template, ctx)?;
        Ok(Response::builder().status(status).html(html))
    }

    /// Renders the error page for `err`. Internal errors are logged here and
    /// shown to the visitor without detail.
    pub fn error_page(&self, auth: &Auth, err: ViewError) -> Response {
        if let ViewError::Internal(e) = &err {
            error!(error = %e, "request failed");
        }
        let status = err.status();
        let ctx = Context::new(auth)
            .with("status", status.code())
            .with("reason", status.reason())
            .with("message", err.message());
        match self.page(status, "error.html", &ctx) {
            Ok(page) => page,
            Err(render) => {
                if let ViewError::Internal(e) = &render {
                    error!(error = %e, "error page failed to render");
                }
                err.into_response()
            }
        }
    }

    fn respond(&self, auth: &Auth, result: ViewResult) -> Response {
        result.unwrap_or_else(|err| self.error_page(auth, err))
    }
}

/// Writes need a logged-in session.
impl Gate for Blog {
    fn admit(&self, req: &Request) -> Result<(), Response> {
        if self.auth(req).is_authenticated() {
            Ok(())
        } else {
            Err(self.error_page(&Auth::anonymous(), ViewError::Forbidden))
        }
    }
}

impl Readiness for Blog {
    fn is_ready(&self) -> bool {
        self.store.ping()
    }
}

type View = fn(&Blog, &Auth, &Request) -> ViewResult;

/// Adapts a view into a handler: resolves the request's [`Auth`], runs the
/// view and renders its error, if any.
fn view_handler(app: Arc<Blog>, view: View) -> impl Handler {
    with_state(app, move |app: Arc<Blog>, req: Request| async move {
        let auth = app.auth(&req);
        let result = view(&app, &auth, &req);
        app.respond(&auth, result)
    })
}

/// Every route of the blog plus the health probes. Writes sit behind the
/// login gate.
pub fn routes(app: Arc<Blog>) -> Router {
    let open = |view: View| view_handler(Arc::clone(&app), view);
    let gated = |view: View| guard(Arc::clone(&app), view_handler(Arc::clone(&app), view));

    Router::new()
        .get("/", open(views::posts_list))
        .get("/post/create/", gated(views::create_form::<Post>))
        .post("/post/create/", gated(views::create::<Post>))
        .get("/post/{slug}/", open(views::detail::<Post>))
        .get("/post/{slug}/update/", gated(views::update_form::<Post>))
        .post("/post/{slug}/update/", gated(views::update::<Post>))
        .get("/post/{slug}/delete/", gated(views::delete_confirm::<Post>))
        .post("/post/{slug}/delete/", gated(views::delete::<Post>))
        .get("/tags/", open(views::tags_list))
        .get("/tag/create/", gated(views::create_form::<Tag>))
        .post("/tag/create/", gated(views::create::<Tag>))
        .get("/tag/{slug}/", open(views::detail::<Tag>))
        .get("/tag/{slug}/update/", gated(views::update_form::<Tag>))
        .post("/tag/{slug}/update/", gated(views::update::<Tag>))
        .get("/tag/{slug}/delete/", gated(views::delete_confirm::<Tag>))
        .post("/tag/{slug}/delete/", gated(views::delete::<Tag>))
        .get("/login/", open(views::login_form))
        .post("/login/", open(views::login))
        .post("/logout/", open(views::logout))
        .get("/healthz", health::liveness)
        .get("/readyz", with_state(Arc::clone(&app), health::readiness::<Blog>))
        .fallback(open(views::not_found))
}
