//! Post queries.
//!
//! Listing order is newest first: `date_pub DESC`, then `id DESC` so posts
//! published in the same instant still have a stable order. Search matches
//! the lowered term as a substring of the lowered title or body.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use super::{StoreError, StoreResult, conflict_on_slug, tags};
use crate::blog::models::Post;

const KIND: &str = "post";

const POST_COLUMNS: &str = "id, title, slug, body, date_pub";

/// `?1` is the lowered search term, or NULL for no filter.
const SEARCH_FILTER: &str = "?1 IS NULL
    OR instr(unicode_lower(title), ?1) > 0
    OR instr(unicode_lower(body), ?1) > 0";

/// Validated post fields, ready to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostFields {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub tag_ids: Vec<i64>,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get("id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        body: row.get("body")?,
        date_pub: row.get("date_pub")?,
        tags: Vec::new(),
    })
}

fn with_tags(conn: &Connection, mut post: Post) -> StoreResult<Post> {
    post.tags = tags::for_post(conn, post.id)?;
    Ok(post)
}

fn search_term(search: Option<&str>) -> Option<String> {
    search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase)
}

/// Case-insensitive slug lookup.
pub fn find_by_slug(conn: &Connection, slug: &str) -> StoreResult<Option<Post>> {
    let post = conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = ?1"),
            [slug.to_lowercase()],
            from_row,
        )
        .optional()?;
    post.map(|post| with_tags(conn, post)).transpose()
}

pub fn get(conn: &Connection, id: i64) -> StoreResult<Post> {
    let post = conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
            [id],
            from_row,
        )
        .optional()?
        .ok_or(StoreError::NotFound { kind: KIND, id })?;
    with_tags(conn, post)
}

/// Number of posts matching `search` (all posts when `None` or blank).
pub fn count(conn: &Connection, search: Option<&str>) -> StoreResult<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM posts WHERE {SEARCH_FILTER}"),
        [search_term(search)],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

/// One window of posts matching `search`, newest first.
pub fn list(
    conn: &Connection,
    search: Option<&str>,
    limit: u64,
    offset: u64,
) -> StoreResult<Vec<Post>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM posts
         WHERE {SEARCH_FILTER}
         ORDER BY date_pub DESC, id DESC
         LIMIT ?2 OFFSET ?3"
    ))?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(params![search_term(search), limit, offset], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(|post| with_tags(conn, post)).collect()
}

/// Posts carrying the tag, newest first.
pub fn for_tag(conn: &Connection, tag_id: i64) -> StoreResult<Vec<Post>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM posts
         WHERE id IN (SELECT post_id FROM post_tags WHERE tag_id = ?1)
         ORDER BY date_pub DESC, id DESC"
    ))?;
    let rows = stmt
        .query_map([tag_id], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(|post| with_tags(conn, post)).collect()
}

/// Whether another post (not `except`) already uses `slug`.
pub fn slug_taken(conn: &Connection, slug: &str, except: Option<i64>) -> StoreResult<bool> {
    let taken = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = ?1 AND (?2 IS NULL OR id <> ?2))",
        params![slug.to_lowercase(), except],
        |row| row.get(0),
    )?;
    Ok(taken)
}

pub fn insert(conn: &mut Connection, fields: &PostFields) -> StoreResult<Post> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO posts (title, slug, body, date_pub) VALUES (?1, ?2, ?3, ?4)",
        params![fields.title, fields.slug.to_lowercase(), fields.body, Utc::now()],
    )
    .map_err(conflict_on_slug(KIND, &fields.slug))?;
    let id = tx.last_insert_rowid();
    replace_tags(&tx, id, &fields.tag_ids)?;
    let post = get(&tx, id)?;
    tx.commit()?;
    info!(kind = KIND, id, slug = %post.slug, "created");
    Ok(post)
}

/// Overwrites title, slug, body and tags. `date_pub` never changes.
pub fn update(conn: &mut Connection, id: i64, fields: &PostFields) -> StoreResult<Post> {
    let tx = conn.transaction()?;
    let changed = tx
        .execute(
            "UPDATE posts SET title = ?2, slug = ?3, body = ?4 WHERE id = ?1",
            params![id, fields.title, fields.slug.to_lowercase(), fields.body],
        )
        .map_err(conflict_on_slug(KIND, &fields.slug))?;
    if changed == 0 {
        return Err(StoreError::NotFound { kind: KIND, id });
    }
    replace_tags(&tx, id, &fields.tag_ids)?;
    let post = get(&tx, id)?;
    tx.commit()?;
    info!(kind = KIND, id, slug = %post.slug, "updated");
    Ok(post)
}

pub fn delete(conn: &mut Connection, id: i64) -> StoreResult<()> {
    let removed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
    if removed == 0 {
        return Err(StoreError::NotFound { kind: KIND, id });
    }
    info!(kind = KIND, id, "deleted");
    Ok(())
}

fn replace_tags(conn: &Connection, post_id: i64, tag_ids: &[i64]) -> StoreResult<()> {
    conn.execute("DELETE FROM post_tags WHERE post_id = ?1", [post_id])?;
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)")?;
    for tag_id in tag_ids {
        stmt.execute([post_id, *tag_id])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::store::Store;
    use crate::blog::store::tags::TagFields;

    fn fields(title: &str, slug: &str, body: &str) -> PostFields {
        PostFields {
            title: title.to_owned(),
            slug: slug.to_owned(),
            body: body.to_owned(),
            tag_ids: Vec::new(),
        }
    }

    #[test]
    fn slug_lookup_ignores_case() {
        let store = Store::open_in_memory().unwrap();
        let created = store.write(|conn| insert(conn, &fields("Hello", "hello", "b"))).unwrap();
        let found = store.read(|conn| find_by_slug(conn, "HeLLo")).unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(store.read(|conn| find_by_slug(conn, "bye")).unwrap(), None);
    }

    #[test]
    fn duplicate_slug_is_a_conflict() {
        let store = Store::open_in_memory().unwrap();
        store.write(|conn| insert(conn, &fields("A", "same", "b"))).unwrap();
        let err = store.write(|conn| insert(conn, &fields("B", "SAME", "b"))).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { kind: "post", .. }));
        assert_eq!(store.read(|conn| count(conn, None)).unwrap(), 1);
    }

    #[test]
    fn search_matches_title_or_body_case_insensitively() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|conn| {
                insert(conn, &fields("Rust tips", "a", "borrowing"))?;
                insert(conn, &fields("Gardening", "b", "Tomatoes love RUST-free tools"))?;
                insert(conn, &fields("Cooking", "c", "nothing here"))?;
                insert(conn, &fields("Ёлка", "d", "праздник"))
            })
            .unwrap();

        let hits = store.read(|conn| list(conn, Some("rust"), 10, 0)).unwrap();
        let mut slugs: Vec<_> = hits.iter().map(|p| p.slug.as_str()).collect();
        slugs.sort_unstable();
        assert_eq!(slugs, ["a", "b"]);
        assert_eq!(store.read(|conn| count(conn, Some("  RUST "))).unwrap(), 2);
        assert_eq!(store.read(|conn| count(conn, Some("ёЛКА"))).unwrap(), 1);
        assert_eq!(store.read(|conn| count(conn, Some("%"))).unwrap(), 0);
        assert_eq!(store.read(|conn| count(conn, Some(""))).unwrap(), 4);
    }

    #[test]
    fn list_is_newest_first_with_id_tiebreak() {
        let store = Store::open_in_memory().unwrap();
        store
            .write(|conn| {
                for n in 0..3 {
                    insert(conn, &fields("t", &format!("p{n}"), "b"))?;
                }
                conn.execute("UPDATE posts SET date_pub = '2020-01-01 00:00:00+00:00'", [])?;
                Ok::<_, StoreError>(())
            })
            .unwrap();
        let posts = store.read(|conn| list(conn, None, 2, 1)).unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["p1", "p0"]);
    }

    #[test]
    fn update_keeps_identity_and_date_and_replaces_tags() {
        let store = Store::open_in_memory().unwrap();
        let (rust, web) = store
            .write(|conn| {
                let rust = tags::insert(conn, &TagFields { title: "Rust".into(), slug: "rust".into() })?;
                let web = tags::insert(conn, &TagFields { title: "Web".into(), slug: "web".into() })?;
                Ok::<_, StoreError>((rust, web))
            })
            .unwrap();
        let mut initial = fields("Old", "old", "old body");
        initial.tag_ids = vec![rust.id];
        let created = store.write(|conn| insert(conn, &initial)).unwrap();

        let mut changed = fields("New", "new", "new body");
        changed.tag_ids = vec![web.id, web.id];
        let updated = store.write(|conn| update(conn, created.id, &changed)).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.date_pub, created.date_pub);
        assert_eq!(updated.title, "New");
        assert_eq!(updated.tags, vec![web]);
        assert_eq!(store.read(|conn| count(conn, None)).unwrap(), 1);
    }

    #[test]
    fn delete_missing_post_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.write(|conn| delete(conn, 42)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "post", id: 42 }));
    }
}
