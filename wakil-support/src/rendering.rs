//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format delegation chains, point at the failing
//! segment of a dotted key, and suggest close matches.

/// Renders a delegation chain as a readable string.
///
/// # Examples
/// ```
/// use wakil_support::rendering::render_chain;
///
/// let chain = vec!["acl.adapter", "acl.default", "acl.adapter"];
/// assert_eq!(render_chain(&chain), "acl.adapter → acl.default → acl.adapter");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Renders a dotted key with a caret line under one of its segments.
///
/// ```text
/// one.two.zzz
///         ^^^
/// ```
///
/// An out-of-range `index` renders the key without a marker line.
///
/// # Examples
/// ```
/// use wakil_support::rendering::underline_segment;
///
/// let rendered = underline_segment("one.two.zzz", 2);
/// assert_eq!(rendered, "one.two.zzz\n        ^^^");
/// ```
pub fn underline_segment(key: &str, index: usize) -> String {
    let mut offset = 0;

    for (i, segment) in key.split('.').enumerate() {
        if i == index {
            // An empty segment still gets a single caret so the position is visible.
            let width = segment.chars().count().max(1);
            return format!("{key}\n{}{}", " ".repeat(offset), "^".repeat(width));
        }
        offset += segment.chars().count() + 1;
    }

    key.to_string()
}

/// Generates "did you mean?" suggestions for a name that was not found.
///
/// Compares the requested name against the available ones and returns
/// at most `max_suggestions` close matches, best first.
///
/// # Examples
/// ```
/// use wakil_support::rendering::suggest_similar;
///
/// let found = suggest_similar("adaptr", &["adapter", "manager"], 3);
/// assert_eq!(found, vec!["adapter".to_string()]);
/// ```
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    if requested_lower.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            if name_lower == requested_lower {
                return None;
            }

            // Substring match (highest priority)
            if name_lower.contains(&requested_lower)
                || requested_lower.contains(&name_lower)
            {
                return Some((name, 100));
            }

            let common_prefix = name_lower
                .chars()
                .zip(requested_lower.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common_prefix >= 3 {
                return Some((name, common_prefix * 10));
            }

            if positional_overlap(&requested_lower, &name_lower) >= 60 {
                return Some((name, 50));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Percentage of characters that match position by position.
///
/// Not an edit distance, just a cheap heuristic that catches typos
/// which keep the length roughly the same.
fn positional_overlap(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len.abs_diff(b_len) > 3 {
        return 0;
    }

    let max_len = a_len.max(b_len);
    if max_len == 0 {
        return 100;
    }

    let common = a.chars().zip(b.chars()).filter(|(ca, cb)| ca == cb).count();
    common * 100 / max_len
}
