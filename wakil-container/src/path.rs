//! Dotted-key traversal of the configuration tree.
//!
//! [`resolve`] is a pure function: it borrows the configuration and
//! returns a borrow of the located entry. It never logs and never
//! mutates anything.

use crate::config::ConfigValue;
use crate::error::PathNotFoundError;
use crate::key::DottedKey;

/// Resolves a dotted key against `root`.
///
/// Each segment must name a non-null child of a mapping. Traversal stops
/// at the first segment that does not, and the error names that segment.
///
/// # Errors
/// Returns [`PathNotFoundError`] if `key` is empty or whitespace-only,
/// or if any segment does not exist.
///
/// # Examples
/// ```
/// use wakil_container::path::resolve;
///
/// let root = serde_json::from_str(r#"{"one": {"two": {"three": "X"}}}"#).unwrap();
///
/// let value = resolve(&root, "one.two.three").unwrap();
/// assert_eq!(value.as_str(), Some("X"));
///
/// let err = resolve(&root, "one.two.zzz").unwrap_err();
/// assert_eq!(err.segment, "zzz");
/// ```
pub fn resolve<'a>(root: &'a ConfigValue, key: &str) -> Result<&'a ConfigValue, PathNotFoundError> {
    let key = DottedKey::parse(key)?;
    resolve_key(root, &key)
}

/// Resolves an already-parsed [`DottedKey`] against `root`.
pub fn resolve_key<'a>(
    root: &'a ConfigValue,
    key: &DottedKey,
) -> Result<&'a ConfigValue, PathNotFoundError> {
    let mut cursor = root;

    for (position, segment) in key.segments().enumerate() {
        cursor = cursor.get(segment).ok_or_else(|| PathNotFoundError {
            key: key.to_string(),
            segment: segment.to_string(),
            position,
            available: available_keys(cursor),
        })?;
    }

    Ok(cursor)
}

/// Non-null keys present at this node, empty for non-mappings.
fn available_keys(node: &ConfigValue) -> Vec<String> {
    node.as_map()
        .map(|map| {
            map.iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, _)| key.clone())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ConfigValue {
        serde_json::from_value(value).unwrap()
    }

    fn nested() -> ConfigValue {
        config(json!({"one": {"two": {"three": "X"}}}))
    }

    #[test]
    fn empty_key_rejected_for_any_root() {
        for root in [
            ConfigValue::Null,
            ConfigValue::from("x"),
            config(json!({})),
            config(json!({"": "blank"})),
            nested(),
        ] {
            let err = resolve(&root, "").unwrap_err();
            assert!(err.is_empty_key());
        }
    }

    #[test]
    fn whitespace_key_rejected() {
        let err = resolve(&nested(), "   ").unwrap_err();
        assert!(err.is_empty_key());
    }

    #[test]
    fn exact_traversal() {
        let root = nested();
        assert_eq!(resolve(&root, "one.two.three").unwrap().as_str(), Some("X"));
    }

    #[test]
    fn intermediate_node_returned() {
        let root = nested();
        let two = resolve(&root, "one.two").unwrap();
        assert!(two.as_map().unwrap().contains_key("three"));
    }

    #[test]
    fn missing_segment_named() {
        let root = nested();
        let err = resolve(&root, "one.two.zzz").unwrap_err();
        assert_eq!(err.segment, "zzz");
        assert_eq!(err.position, 2);
        assert_eq!(err.key, "one.two.zzz");
        assert_eq!(err.available, vec!["three".to_string()]);
    }

    #[test]
    fn stops_at_first_missing_segment() {
        let root = nested();
        let err = resolve(&root, "one.nope.three").unwrap_err();
        assert_eq!(err.segment, "nope");
        assert_eq!(err.position, 1);
    }

    #[test]
    fn cannot_descend_into_scalar() {
        let root = nested();
        let err = resolve(&root, "one.two.three.four").unwrap_err();
        assert_eq!(err.segment, "four");
        assert!(err.available.is_empty());
    }

    #[test]
    fn cannot_descend_into_list() {
        let root = config(json!({"keys": ["a", "b"]}));
        let err = resolve(&root, "keys.0").unwrap_err();
        assert_eq!(err.segment, "0");
    }

    #[test]
    fn null_entry_is_missing() {
        let root = config(json!({"abc": null, "def": true}));
        let err = resolve(&root, "abc").unwrap_err();
        assert_eq!(err.segment, "abc");
        assert_eq!(err.available, vec!["def".to_string()]);
    }

    #[test]
    fn unknown_top_level_key() {
        let root = config(json!({"abc": true}));
        assert!(resolve(&root, "hi").is_err());
    }

    #[test]
    fn resolve_key_matches_resolve() {
        let root = nested();
        let key = DottedKey::parse("one.two").unwrap();
        assert_eq!(resolve_key(&root, &key).unwrap(), resolve(&root, "one.two").unwrap());
    }
}
