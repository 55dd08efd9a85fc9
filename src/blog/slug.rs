//! Slug derivation and validation.
//!
//! A slug is lowercase letters (any script), digits, `-` and `_`, with no
//! leading, trailing or doubled hyphen. Slugs are the only external lookup
//! key, and they are stored lowercase so a case-insensitive match is plain
//! equality on the lowered input.

/// Slugs that collide with fixed route segments.
pub const RESERVED: &[&str] = &["create"];

/// Fallback when a title has no sluggable characters at all.
const EMPTY_FALLBACK: &str = "untitled";

/// Derives a slug from free text: lowercases, keeps alphanumerics and `_`,
/// turns runs of whitespace/hyphens into one hyphen and drops the rest.
/// The result is cut to `max_len` characters.
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
    }

    let mut slug: String = slug.chars().take(max_len).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str(EMPTY_FALLBACK);
    }
    slug
}

/// Normalizes user input for storage and lookup.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Checks the shape of an already normalized slug.
pub fn check(slug: &str, max_len: usize) -> Result<(), String> {
    if slug.is_empty() {
        return Err("This field is required.".to_owned());
    }
    if slug.chars().count() > max_len {
        return Err(format!("Ensure this value has at most {max_len} characters."));
    }
    let well_formed = !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(|c| {
            (c.is_alphanumeric() && !c.is_uppercase()) || c == '-' || c == '_'
        });
    if !well_formed {
        return Err(
            "Enter a valid slug: lowercase letters, numbers, underscores or hyphens.".to_owned(),
        );
    }
    if RESERVED.contains(&slug) {
        return Err(format!("Slug may not be \"{slug}\"."));
    }
    Ok(())
}

/// `base`, or the first of `base-2`, `base-3`, … that `taken` rejects,
/// trimmed so the suffixed slug still fits `max_len`.
pub fn unique<E>(
    base: &str,
    max_len: usize,
    mut taken: impl FnMut(&str) -> Result<bool, E>,
) -> Result<String, E> {
    let candidate = if RESERVED.contains(&base) { format!("{base}-2") } else { base.to_owned() };
    if !taken(&candidate)? {
        return Ok(candidate);
    }
    for n in 2u32.. {
        let suffix = format!("-{n}");
        let room = max_len.saturating_sub(suffix.chars().count());
        let stem: String = base.chars().take(room).collect();
        let candidate = format!("{}{suffix}", stem.trim_end_matches('-'));
        if !taken(&candidate)? {
            return Ok(candidate);
        }
    }
    unreachable!("u32 suffixes exhausted")
}
