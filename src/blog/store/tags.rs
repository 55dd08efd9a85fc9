//! Tag queries.

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use super::{StoreError, StoreResult, conflict_on_slug};
use crate::blog::models::Tag;

const KIND: &str = "tag";

/// Validated tag fields, ready to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagFields {
    pub title: String,
    pub slug: String,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
    })
}

/// Case-insensitive slug lookup.
pub fn find_by_slug(conn: &Connection, slug: &str) -> StoreResult<Option<Tag>> {
    let tag = conn
        .query_row(
            "SELECT id, title, slug FROM tags WHERE slug = ?1",
            [slug.to_lowercase()],
            from_row,
        )
        .optional()?;
    Ok(tag)
}

pub fn get(conn: &Connection, id: i64) -> StoreResult<Tag> {
    conn.query_row("SELECT id, title, slug FROM tags WHERE id = ?1", [id], from_row)
        .optional()?
        .ok_or(StoreError::NotFound { kind: KIND, id })
}

/// Every tag, alphabetically by title.
pub fn all(conn: &Connection) -> StoreResult<Vec<Tag>> {
    let mut stmt =
        conn.prepare("SELECT id, title, slug FROM tags ORDER BY title COLLATE NOCASE, id")?;
    let tags = stmt.query_map([], from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

/// Tags attached to one post, alphabetically by title.
pub fn for_post(conn: &Connection, post_id: i64) -> StoreResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.title, t.slug
         FROM tags t
         INNER JOIN post_tags pt ON pt.tag_id = t.id
         WHERE pt.post_id = ?1
         ORDER BY t.title COLLATE NOCASE, t.id",
    )?;
    let tags = stmt.query_map([post_id], from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

pub fn count(conn: &Connection) -> StoreResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

/// Whether another tag (not `except`) already uses `slug`.
pub fn slug_taken(conn: &Connection, slug: &str, except: Option<i64>) -> StoreResult<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tags WHERE slug = ?1 AND (?2 IS NULL OR id <> ?2))",
        params![slug.to_lowercase(), except],
        |row| row.get(0),
    )?;
    Ok(taken)
}

pub fn insert(conn: &mut Connection, fields: &TagFields) -> StoreResult<Tag> {
    conn.execute(
        "INSERT INTO tags (title, slug) VALUES (?1, ?2)",
        params![fields.title, fields.slug.to_lowercase()],
    )
    .map_err(conflict_on_slug(KIND, &fields.slug))?;
    let tag = get(conn, conn.last_insert_rowid())?;
    info!(kind = KIND, id = tag.id, slug = %tag.slug, "created");
    Ok(tag)
}

pub fn update(conn: &mut Connection, id: i64, fields: &TagFields) -> StoreResult<Tag> {
    let changed = conn
        .execute(
            "UPDATE tags SET title = ?2, slug = ?3 WHERE id = ?1",
            params![id, fields.title, fields.slug.to_lowercase()],
        )
        .map_err(conflict_on_slug(KIND, &fields.slug))?;
    if changed == 0 {
        return Err(StoreError::NotFound { kind: KIND, id });
    }
    let tag = get(conn, id)?;
    info!(kind = KIND, id, slug = %tag.slug, "updated");
    Ok(tag)
}

/// Removes the tag and its post links. Posts that carried it stay.
pub fn delete(conn: &mut Connection, id: i64) -> StoreResult<()> {
    let removed = conn.execute("DELETE FROM tags WHERE id = ?1", [id])?;
    if removed == 0 {
        return Err(StoreError::NotFound { kind: KIND, id });
    }
    info!(kind = KIND, id, "deleted");
    Ok(())
}
