//! Page views.
//!
//! Every view is a synchronous function of the shared [`Blog`], the
//! request's [`Auth`] and the request itself. The store is a blocking SQLite
//! connection, so there is nothing to await; [`super::routes`] adapts each
//! view into an async handler and turns a [`ViewError`] into an error page.
//!
//! The CRUD views are generic over [`Model`]: one implementation serves both
//! posts and tags.

use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use super::Blog;
use super::forms::{FieldErrors, Form, FormError};
use super::models::Model;
use super::paginate::{PAGE_SIZE, Paginator};
use super::session::{self, Auth, SESSION_COOKIE};
use super::store::{StoreError, StoreResult, posts, tags};
use super::templates::Context;
use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

const LOGIN_FAILED: &str = "Please enter a correct username and password.";

/// Why a view produced no page of its own.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("request body is not a valid form")]
    BadRequest,

    #[error("not found")]
    NotFound,

    #[error("login required")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] Error),
}

impl ViewError {
    pub fn status(&self) -> Status {
        match self {
            Self::BadRequest => Status::BadRequest,
            Self::NotFound => Status::NotFound,
            Self::Forbidden => Status::Forbidden,
            Self::Internal(_) => Status::InternalServerError,
        }
    }

    /// Message shown to the visitor. Internal details never leave the log.
    pub fn message(&self) -> &'static str {
        match self {
            Self::BadRequest => "The submitted form could not be read.",
            Self::NotFound => "The page you asked for does not exist.",
            Self::Forbidden => "You need to log in to do that.",
            Self::Internal(_) => "Something went wrong on our side.",
        }
    }
}

impl From<StoreError> for ViewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound,
            other => Self::Internal(other.into()),
        }
    }
}

impl From<minijinja::Error> for ViewError {
    fn from(err: minijinja::Error) -> Self {
        Self::Internal(err.into())
    }
}

/// Bare HTML error page, used when the templated one cannot be rendered.
impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let status = self.status();
        Response::builder().status(status).html(format!(
            "<!doctype html><title>{code} {reason}</title><h1>{code} {reason}</h1><p>{message}</p>",
            code = status.code(),
            reason = status.reason(),
            message = self.message(),
        ))
    }
}

pub type ViewResult = Result<Response, ViewError>;

fn slug_param(req: &Request) -> Result<&str, ViewError> {
    req.param("slug").ok_or(ViewError::NotFound)
}

fn lookup<M: Model>(conn: &Connection, slug: &str) -> Result<M, ViewError> {
    M::find(conn, slug)?.ok_or(ViewError::NotFound)
}

/// Context shared by create and update pages. `all_tags` feeds the post
/// form's tag choices.
fn form_context<F: Form>(
    conn: &Connection,
    auth: &Auth,
    form: &F,
    errors: &FieldErrors,
) -> StoreResult<Context> {
    Ok(Context::new(auth)
        .with("form", form)
        .with("errors", errors)
        .with("all_tags", tags::all(conn)?))
}

// ── Generic CRUD ──────────────────────────────────────────────────────────────

pub fn detail<M: Model>(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    let slug = slug_param(req)?;
    let ctx = app.store().read(|conn| {
        let object = lookup::<M>(conn, slug)?;
        let mut ctx = Context::new(auth);
        ctx.insert("admin_kind", M::KIND)
            .insert("admin_object", &object)
            .insert("detail", true);
        object.extend_detail(conn, &mut ctx)?;
        ctx.insert(M::KIND, &object);
        Ok::<_, ViewError>(ctx)
    })?;
    app.page(Status::Ok, M::PAGES.detail, &ctx)
}

pub fn create_form<M: Model>(app: &Blog, auth: &Auth, _req: &Request) -> ViewResult {
    let form = M::Form::default();
    let ctx = app
        .store()
        .read(|conn| form_context(conn, auth, &form, &FieldErrors::default()))?;
    app.page(Status::Ok, M::PAGES.create, &ctx)
}

pub fn create<M: Model>(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    let data = req.form().map_err(|_| ViewError::BadRequest)?;
    let form = M::Form::bind(&data);
    let outcome = app.store().write(|conn| -> Result<Result<M, Context>, ViewError> {
        match form.clean(conn, None) {
            Ok(clean) => Ok(Ok(M::insert(conn, &clean)?)),
            Err(FormError::Invalid(errors)) => Ok(Err(form_context(conn, auth, &form, &errors)?)),
            Err(FormError::Store(e)) => Err(e.into()),
        }
    })?;
    match outcome {
        Ok(created) => Ok(Response::redirect(&created.url())),
        Err(ctx) => app.page(Status::UnprocessableContent, M::PAGES.create, &ctx),
    }
}

pub fn update_form<M: Model>(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    let slug = slug_param(req)?;
    let ctx = app.store().read(|conn| {
        let instance = lookup::<M>(conn, slug)?;
        let form = M::Form::initial(&instance);
        let ctx = form_context(conn, auth, &form, &FieldErrors::default())?;
        Ok::<_, ViewError>(ctx.with(M::KIND, &instance))
    })?;
    app.page(Status::Ok, M::PAGES.update, &ctx)
}

pub fn update<M: Model>(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    let slug = slug_param(req)?;
    let data = req.form().map_err(|_| ViewError::BadRequest)?;
    let form = M::Form::bind(&data);
    let outcome = app.store().write(|conn| -> Result<Result<M, Context>, ViewError> {
        let instance = lookup::<M>(conn, slug)?;
        match form.clean(conn, Some(&instance)) {
            Ok(clean) => Ok(Ok(M::update(conn, instance.id(), &clean)?)),
            Err(FormError::Invalid(errors)) => {
                let ctx = form_context(conn, auth, &form, &errors)?;
                Ok(Err(ctx.with(M::KIND, &instance)))
            }
            Err(FormError::Store(e)) => Err(e.into()),
        }
    })?;
    match outcome {
        Ok(updated) => Ok(Response::redirect(&updated.url())),
        Err(ctx) => app.page(Status::UnprocessableContent, M::PAGES.update, &ctx),
    }
}

pub fn delete_confirm<M: Model>(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    let slug = slug_param(req)?;
    let object = app.store().read(|conn| lookup::<M>(conn, slug))?;
    app.page(Status::Ok, M::PAGES.delete, &Context::new(auth).with(M::KIND, &object))
}

pub fn delete<M: Model>(app: &Blog, _auth: &Auth, req: &Request) -> ViewResult {
    let slug = slug_param(req)?;
    app.store().write(|conn| {
        let object = lookup::<M>(conn, slug)?;
        M::delete(conn, object.id())?;
        Ok::<_, ViewError>(())
    })?;
    Ok(Response::redirect(M::LIST_URL))
}

// ── Lists ─────────────────────────────────────────────────────────────────────

/// `/`: every post, or those matching `?search=`, ten to a page.
pub fn posts_list(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    let query = req.query();
    let search = query.get("search").map(str::trim).filter(|s| !s.is_empty());

    let page = app.store().read(|conn| {
        let paginator = Paginator::new(posts::count(conn, search)?, PAGE_SIZE);
        let number = paginator.page_number(query.get("page"));
        let found = posts::list(conn, search, paginator.per_page(), paginator.offset(number))?;
        Ok::<_, StoreError>(paginator.page(number, found))
    })?;

    let ctx = Context::new(auth)
        .with("is_paginated", page.has_other_pages())
        .with("prev_url", page.prev_url(search))
        .with("next_url", page.next_url(search))
        .with("search_query", search.unwrap_or_default())
        .with("page_object", &page);
    app.page(Status::Ok, "blog/index.html", &ctx)
}

pub fn tags_list(app: &Blog, auth: &Auth, _req: &Request) -> ViewResult {
    let all = app.store().read(tags::all)?;
    app.page(Status::Ok, "blog/tags_list.html", &Context::new(auth).with("tags", all))
}

// ── Login ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    next: &'a str,
}

pub fn login_form(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    let query = req.query();
    let form = LoginForm { username: "", next: query.text("next") };
    let ctx = Context::new(auth).with("form", form).with("error", "");
    app.page(Status::Ok, "login.html", &ctx)
}

pub fn login(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    let data = req.form().map_err(|_| ViewError::BadRequest)?;
    let username = data.text("username").trim();
    let next = data.text("next");

    if app.accounts().verify(username, data.text("password")) {
        let token = app.sessions().start(username);
        info!(username, "login");
        return Ok(Response::redirect(session::safe_next(next))
            .with_header("set-cookie", &session::session_cookie(&token, app.sessions().ttl())));
    }

    warn!(username, "login rejected");
    let ctx = Context::new(auth)
        .with("form", LoginForm { username, next })
        .with("error", LOGIN_FAILED);
    app.page(Status::UnprocessableContent, "login.html", &ctx)
}

pub fn logout(app: &Blog, auth: &Auth, req: &Request) -> ViewResult {
    if let Some(token) = req.cookie(SESSION_COOKIE) {
        app.sessions().end(token);
    }
    if let Some(username) = auth.username() {
        info!(username, "logout");
    }
    Ok(Response::redirect("/").with_header("set-cookie", &session::expired_session_cookie()))
}

/// Fallback for unrouted paths.
pub fn not_found(_app: &Blog, _auth: &Auth, _req: &Request) -> ViewResult {
    Err(ViewError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_is_a_404_and_other_store_errors_are_internal() {
        let missing = ViewError::from(StoreError::NotFound { kind: "post", id: 7 });
        assert_eq!(missing.status(), Status::NotFound);

        let conflict = ViewError::from(StoreError::Conflict { kind: "tag", slug: "rust".into() });
        assert_eq!(conflict.status(), Status::InternalServerError);
    }

    #[test]
    fn bare_error_page_hides_internal_details() {
        let err = ViewError::Internal(Error::Password("secret detail".into()));
        let response = err.into_response();
        assert_eq!(response.status_code(), Status::InternalServerError);
        assert!(!response.body_text().contains("secret detail"));
        assert!(response.body_text().contains("500 Internal Server Error"));
    }
}
