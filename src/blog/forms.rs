//! Form binding and validation.
//!
//! A form is bound from submitted [`FormData`] (or pre-filled from an
//! existing entity), then cleaned against the store into the `Clean` fields
//! its model persists. Failures come back as [`FieldErrors`] and the bound
//! form keeps every submitted value, so a re-rendered page loses nothing.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use super::models::{Post, Tag};
use super::slug;
use super::store::{StoreError, posts, tags};
use crate::request::FormData;

pub const POST_TITLE_MAX: usize = 150;
pub const POST_SLUG_MAX: usize = 150;
pub const TAG_TITLE_MAX: usize = 50;
pub const TAG_SLUG_MAX: usize = 50;

const REQUIRED: &str = "This field is required.";

/// Per-field validation messages, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    fn finish<T>(self, clean: impl FnOnce() -> T) -> Result<T, FormError> {
        if self.is_empty() { Ok(clean()) } else { Err(FormError::Invalid(self)) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("submitted form is invalid")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The input side of one entity kind.
pub trait Form: Serialize + Default + Send + Sized {
    type Model;
    type Clean;

    /// Binds raw submitted values.
    fn bind(data: &FormData) -> Self;

    /// Pre-fills from an existing entity.
    fn initial(instance: &Self::Model) -> Self;

    /// Validates against the store. `instance` is the entity being updated,
    /// if any.
    fn clean(
        &self,
        conn: &Connection,
        instance: Option<&Self::Model>,
    ) -> Result<Self::Clean, FormError>;
}

/// Required text, trimmed, at most `max` characters.
fn required_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    max: usize,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if value.chars().count() > max {
        errors.add(field, format!("Ensure this value has at most {max} characters."));
    }
    value.to_owned()
}

/// Validates a submitted slug and checks it is free.
fn submitted_slug(
    errors: &mut FieldErrors,
    slug: &str,
    max: usize,
    taken: impl FnOnce(&str) -> Result<bool, StoreError>,
) -> Result<String, StoreError> {
    let slug = slug::normalize(slug);
    if let Err(message) = slug::check(&slug, max) {
        errors.add("slug", message);
    } else if taken(&slug)? {
        errors.add("slug", "An entry with this slug already exists.");
    }
    Ok(slug)
}

// ── Post ──────────────────────────────────────────────────────────────────────

/// Post form. A blank slug is derived from the title on create and kept as
/// is on update. `tags` holds tag slugs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PostForm {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub tags: Vec<String>,
}

impl Form for PostForm {
    type Model = Post;
    type Clean = posts::PostFields;

    fn bind(data: &FormData) -> Self {
        Self {
            title: data.text("title").to_owned(),
            slug: data.text("slug").to_owned(),
            body: data.text("body").to_owned(),
            tags: data.get_all("tags").into_iter().map(str::to_owned).collect(),
        }
    }

    fn initial(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            body: post.body.clone(),
            tags: post.tags.iter().map(|t| t.slug.clone()).collect(),
        }
    }

    fn clean(&self, conn: &Connection, instance: Option<&Post>) -> Result<posts::PostFields, FormError> {
        let mut errors = FieldErrors::default();
        let except = instance.map(|p| p.id);

        let title = required_text(&mut errors, "title", &self.title, POST_TITLE_MAX);
        let body = self.body.trim().to_owned();
        if body.is_empty() {
            errors.add("body", REQUIRED);
        }

        let slug = match (self.slug.trim().is_empty(), instance) {
            (true, Some(post)) => post.slug.clone(),
            (true, None) if title.is_empty() => String::new(),
            (true, None) => {
                let base = slug::slugify(&title, POST_SLUG_MAX);
                slug::unique(&base, POST_SLUG_MAX, |s| posts::slug_taken(conn, s, except))?
            }
            (false, _) => submitted_slug(&mut errors, &self.slug, POST_SLUG_MAX, |s| {
                posts::slug_taken(conn, s, except)
            })?,
        };

        let mut tag_ids = Vec::with_capacity(self.tags.len());
        for tag_slug in &self.tags {
            match tags::find_by_slug(conn, tag_slug)? {
                Some(tag) if !tag_ids.contains(&tag.id) => tag_ids.push(tag.id),
                Some(_) => {}
                None => errors.add(
                    "tags",
                    format!("Select a valid choice. {tag_slug} is not one of the available choices."),
                ),
            }
        }

        errors.finish(|| posts::PostFields { title, slug, body, tag_ids })
    }
}

// ── Tag ───────────────────────────────────────────────────────────────────────

/// Tag form. Both fields are required on create; a blank slug on update
/// keeps the current one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TagForm {
    pub title: String,
    pub slug: String,
}

impl Form for TagForm {
    type Model = Tag;
    type Clean = tags::TagFields;

    fn bind(data: &FormData) -> Self {
        Self {
            title: data.text("title").to_owned(),
            slug: data.text("slug").to_owned(),
        }
    }

    fn initial(tag: &Tag) -> Self {
        Self { title: tag.title.clone(), slug: tag.slug.clone() }
    }

    fn clean(&self, conn: &Connection, instance: Option<&Tag>) -> Result<tags::TagFields, FormError> {
        let mut errors = FieldErrors::default();
        let except = instance.map(|t| t.id);

        let title = required_text(&mut errors, "title", &self.title, TAG_TITLE_MAX);
        let slug = match instance {
            Some(tag) if self.slug.trim().is_empty() => tag.slug.clone(),
            _ => submitted_slug(&mut errors, &self.slug, TAG_SLUG_MAX, |s| {
                tags::slug_taken(conn, s, except)
            })?,
        };

        errors.finish(|| tags::TagFields { title, slug })
    }
}
