//! Slug normalization and uniqueness probing.
//!
//! A slug is the URL-safe identifier derived from a title. Uniqueness is
//! enforced by read-then-retry probing against a conflict scope (same
//! creation date for blog posts, same sibling set for pages, global for
//! taxonomies), not by database constraints.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Maximum slug length after normalization.
pub const SLUG_MAX_LEN: usize = 250;

/// Normalize a candidate string (title or user-supplied slug) to a
/// URL-safe lowercase token.
///
/// Non-alphanumeric runs collapse to a single `-`; leading/trailing `-`
/// are trimmed; the result is truncated to [`SLUG_MAX_LEN`]. If nothing
/// survives normalization (e.g. a fully non-Latin title), a random
/// 6–8 character token is returned instead so every post gets a usable URL.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_dash = false;

    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.len() > SLUG_MAX_LEN {
        slug.truncate(SLUG_MAX_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        random_slug()
    } else {
        slug
    }
}

/// Generate a random lowercase alphanumeric slug of 6–8 characters.
pub fn random_slug() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(6..=8usize);
    (&mut rng)
        .sample_iter(Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// Append a numeric probe suffix: `"my-post"` + 2 -> `"my-post-2"`.
///
/// Keeps the result within [`SLUG_MAX_LEN`] by trimming the base first.
pub fn with_suffix(slug: &str, n: u32) -> String {
    let suffix = format!("-{n}");
    let max_base = SLUG_MAX_LEN.saturating_sub(suffix.len());
    let base = if slug.len() > max_base {
        &slug[..max_base]
    } else {
        slug
    };
    format!("{base}{suffix}")
}

/// Resolve a unique slug against a synchronous conflict check.
///
/// Probes `candidate`, then `candidate-2`, `candidate-3`, … until `taken`
/// reports no conflict. Async callers (repositories) inline the same loop.
pub fn unique_slug(candidate: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(candidate) {
        return candidate.to_string();
    }
    let mut n = 2;
    loop {
        let probe = with_suffix(candidate, n);
        if !taken(&probe) {
            return probe;
        }
        n += 1;
    }
}
