//! Entity kinds and the [`Model`] contract the generic CRUD views run on.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use super::forms::{Form, PostForm, TagForm};
use super::store::{StoreResult, posts, tags};
use super::templates::Context;

/// A blog post. `tags` is loaded alongside the row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub date_pub: DateTime<Utc>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// Template names for the four CRUD pages of one entity kind.
pub struct Pages {
    pub detail: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
}

/// One entity kind: its store queries, its form and its pages.
///
/// The generic views in [`views`](super::views) take a `Model` type parameter
/// instead of per-kind handler code.
pub trait Model: Serialize + Send + Sync + Sized + 'static {
    /// Lowercase kind name: the template context key and the URL segment.
    const KIND: &'static str;
    /// Where a deleted entity redirects to.
    const LIST_URL: &'static str;
    const PAGES: Pages;

    type Form: Form<Model = Self>;

    fn id(&self) -> i64;
    fn slug(&self) -> &str;

    /// Detail page path, with the slug percent-encoded so it can go in a
    /// `Location` header.
    fn url(&self) -> String {
        format!("/{}/{}/", Self::KIND, urlencoding::encode(self.slug()))
    }

    fn find(conn: &Connection, slug: &str) -> StoreResult<Option<Self>>;
    fn count(conn: &Connection) -> StoreResult<u64>;
    fn insert(conn: &mut Connection, fields: &<Self::Form as Form>::Clean) -> StoreResult<Self>;
    fn update(
        conn: &mut Connection,
        id: i64,
        fields: &<Self::Form as Form>::Clean,
    ) -> StoreResult<Self>;
    fn delete(conn: &mut Connection, id: i64) -> StoreResult<()>;

    /// Adds kind-specific data to the detail page context.
    fn extend_detail(&self, _conn: &Connection, _ctx: &mut Context) -> StoreResult<()> {
        Ok(())
    }
}

impl Model for Post {
    const KIND: &'static str = "post";
    const LIST_URL: &'static str = "/";
    const PAGES: Pages = Pages {
        detail: "blog/post_detail.html",
        create: "blog/post_create_form.html",
        update: "blog/post_update_form.html",
        delete: "blog/post_delete_form.html",
    };

    type Form = PostForm;

    fn id(&self) -> i64 { self.id }
    fn slug(&self) -> &str { &self.slug }

    fn find(conn: &Connection, slug: &str) -> StoreResult<Option<Self>> {
        posts::find_by_slug(conn, slug)
    }

    fn count(conn: &Connection) -> StoreResult<u64> {
        posts::count(conn, None)
    }

    fn insert(conn: &mut Connection, fields: &posts::PostFields) -> StoreResult<Self> {
        posts::insert(conn, fields)
    }

    fn update(conn: &mut Connection, id: i64, fields: &posts::PostFields) -> StoreResult<Self> {
        posts::update(conn, id, fields)
    }

    fn delete(conn: &mut Connection, id: i64) -> StoreResult<()> {
        posts::delete(conn, id)
    }
}

impl Model for Tag {
    const KIND: &'static str = "tag";
    const LIST_URL: &'static str = "/tags/";
    const PAGES: Pages = Pages {
        detail: "blog/tag_detail.html",
        create: "blog/tag_create.html",
        update: "blog/tag_update_form.html",
        delete: "blog/tag_delete_form.html",
    };

    type Form = TagForm;

    fn id(&self) -> i64 { self.id }
    fn slug(&self) -> &str { &self.slug }

    fn find(conn: &Connection, slug: &str) -> StoreResult<Option<Self>> {
        tags::find_by_slug(conn, slug)
    }

    fn count(conn: &Connection) -> StoreResult<u64> {
        tags::count(conn)
    }

    fn insert(conn: &mut Connection, fields: &tags::TagFields) -> StoreResult<Self> {
        tags::insert(conn, fields)
    }

    fn update(conn: &mut Connection, id: i64, fields: &tags::TagFields) -> StoreResult<Self> {
        tags::update(conn, id, fields)
    }

    fn delete(conn: &mut Connection, id: i64) -> StoreResult<()> {
        tags::delete(conn, id)
    }

    fn extend_detail(&self, conn: &Connection, ctx: &mut Context) -> StoreResult<()> {
        ctx.insert("posts", posts::for_tag(conn, self.id)?);
        Ok(())
    }
}
