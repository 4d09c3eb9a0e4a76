//! Robots.txt path pattern matching
//!
//! Patterns are globs anchored at the start of the path:
//!
//! - `*` matches any sequence of characters, including none
//! - every other character is literal (`$` has no special meaning)
//! - a pattern matches when it matches a *prefix* of the path, so
//!   `/private/` matches `/private/a/b`
//!
//! An empty pattern matches nothing. Robots.txt uses `Disallow:` with an empty
//! value to mean "nothing is disallowed", and the parser drops such lines.

/// Checks whether a robots.txt pattern matches the given path
///
/// # Examples
///
/// ```
/// use portal_scout::robots::pattern_matches;
///
/// assert!(pattern_matches("/private/", "/private/a"));
/// assert!(pattern_matches("/*.hwp", "/files/report.hwp"));
/// assert!(pattern_matches("/board/*/edit", "/board/12/edit?mode=1"));
/// assert!(!pattern_matches("/private/", "/public/private/"));
/// ```
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }

    let mut parts = pattern.split('*');

    // The text before the first '*' is anchored at the start of the path
    let head = parts.next().unwrap_or_default();
    let Some(mut rest) = path.strip_prefix(head) else {
        return false;
    };

    // Each remaining literal must appear after the previous one. Taking the
    // leftmost occurrence is enough because anything may follow the match.
    for literal in parts {
        if literal.is_empty() {
            continue;
        }
        match rest.find(literal) {
            Some(pos) => rest = &rest[pos + literal.len()..],
            None => return false,
        }
    }

    true
}
