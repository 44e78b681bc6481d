//! Rooted path joining.
//!
//! # Design
//! - Every produced path starts with `/`; the empty path normalises to `/`.
//! - Empty and `.` segments are dropped so `//a/./b/` becomes `/a/b`.
//! - `..` is kept as an ordinary segment. Traversal checks belong to callers.

const SEPARATOR: char = '/';

/// Normalise `path` into its `/`-rooted form.
///
/// `..` is not resolved lexically: `/a/../b` stays `/a/../b` instead of collapsing to `/b`.
#[must_use]
pub fn normalize_rooted(path: &str) -> String {
    join_rooted([path])
}

/// Join `parts` with `/`, collapsing redundant separators.
#[must_use]
pub fn join_rooted<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut joined = String::new();
    for segment in parts
        .into_iter()
        .flat_map(|part| part.split(SEPARATOR))
        .filter(|segment| !segment.is_empty() && *segment != ".")
    {
        joined.push(SEPARATOR);
        joined.push_str(segment);
    }
    if joined.is_empty() {
        joined.push(SEPARATOR);
    }
    joined
}
