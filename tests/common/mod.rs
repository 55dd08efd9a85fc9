//! Shared harness: an in-memory blog driven through its router.

#![allow(dead_code)]

use std::sync::Arc;

use quire::blog::models::{Model, Post, Tag};
use quire::blog::session::{DEFAULT_SESSION_TTL, SESSION_COOKIE};
use quire::blog::store::{Store, posts, tags};
use quire::blog::{self, Blog};
use quire::config::Account;
use quire::{Method, Request, Response, Router};

pub struct TestApp {
    pub app: Arc<Blog>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_accounts(&[])
    }

    pub fn with_accounts(accounts: &[Account]) -> Self {
        let store = Store::open_in_memory().expect("in-memory store");
        let app = Arc::new(Blog::new(store, accounts, DEFAULT_SESSION_TTL).expect("blog"));
        let router = blog::routes(Arc::clone(&app));
        Self { app, router }
    }

    /// A session token for `admin`, as a login would create.
    pub fn session(&self) -> String {
        self.app.sessions().start("admin")
    }

    pub async fn get(&self, target: &str) -> Response {
        self.router.dispatch(Request::builder(Method::Get, target).build()).await
    }

    pub async fn get_as(&self, token: &str, target: &str) -> Response {
        let req = Request::builder(Method::Get, target).cookie(SESSION_COOKIE, token).build();
        self.router.dispatch(req).await
    }

    pub async fn post(&self, target: &str, form: &[(&str, &str)]) -> Response {
        self.router.dispatch(Request::builder(Method::Post, target).form(form).build()).await
    }

    pub async fn post_as(&self, token: &str, target: &str, form: &[(&str, &str)]) -> Response {
        let req = Request::builder(Method::Post, target)
            .cookie(SESSION_COOKIE, token)
            .form(form)
            .build();
        self.router.dispatch(req).await
    }

    pub fn post_count(&self) -> u64 {
        self.app.store().read(Post::count).expect("count posts")
    }

    pub fn tag_count(&self) -> u64 {
        self.app.store().read(Tag::count).expect("count tags")
    }

    pub fn insert_post(&self, title: &str, slug: &str, body: &str) -> Post {
        let fields = posts::PostFields {
            title: title.to_owned(),
            slug: slug.to_owned(),
            body: body.to_owned(),
            tag_ids: Vec::new(),
        };
        self.app.store().write(|conn| posts::insert(conn, &fields)).expect("insert post")
    }

    pub fn insert_tag(&self, title: &str, slug: &str) -> Tag {
        let fields = tags::TagFields { title: title.to_owned(), slug: slug.to_owned() };
        self.app.store().write(|conn| tags::insert(conn, &fields)).expect("insert tag")
    }
}
