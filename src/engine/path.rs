//! Accessor paths over arbitrary JSON payloads
//!
//! A path is a dot-separated list of property names where a segment may carry
//! an integer index suffix: `data.sheets[0].title`. Resolution is a pure walk
//! over `serde_json::Value`; any missing step yields `None`.

use serde_json::Value;
use std::fmt;

/// Segment of an accessor path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property access: .fieldName
    Property(String),
    /// Array index access: [0], [1], etc.
    Index(usize),
}

/// Parsed accessor path (e.g., "data.headers" or "items[0].name")
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get segments iterator
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Parse a path string.
    ///
    /// Each dot-separated segment is either `name`, `name[n]` or `[n]`. A
    /// bracket suffix that is not a non-negative integer keeps the whole
    /// segment as a literal property name.
    pub fn parse(s: &str) -> Self {
        let mut segments = Vec::new();

        for raw in s.split('.') {
            if raw.is_empty() {
                continue;
            }
            match split_index(raw) {
                Some((name, idx)) => {
                    if !name.is_empty() {
                        segments.push(PathSegment::Property(name.to_string()));
                    }
                    segments.push(PathSegment::Index(idx));
                }
                None => segments.push(PathSegment::Property(raw.to_string())),
            }
        }

        Self { segments }
    }

    /// Walk `root` along this path
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Property(name), Value::Object(map)) => map.get(name)?,
                (PathSegment::Index(idx), Value::Array(items)) => items.get(*idx)?,
                _ => return None,
            };
        }
        match current {
            Value::Null if !self.is_root() => None,
            other => Some(other),
        }
    }
}

/// Split `name[n]` into `("name", n)`
fn split_index(segment: &str) -> Option<(&str, usize)> {
    let body = segment.strip_suffix(']')?;
    let open = body.rfind('[')?;
    let idx = body[open + 1..].parse::<usize>().ok()?;
    Some((&body[..open], idx))
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Property(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Property(name) => write!(f, ".{}", name)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Resolve a path string against `root`.
///
/// Returns `None` when any step is missing or null; never panics.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    PropertyPath::parse(path).resolve(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_path_parse() {
        let path = PropertyPath::parse("data.sheets[0].title");
        assert_eq!(path.segments().count(), 4);
        assert_eq!(path.to_string(), "data.sheets[0].title");
        assert!(PropertyPath::parse("").is_root());

        let bare_index = PropertyPath::parse("[2].name");
        assert_eq!(
            bare_index.segments().cloned().collect::<Vec<_>>(),
            vec![PathSegment::Index(2), PathSegment::Property("name".into())]
        );
    }

    #[test]
    fn test_non_numeric_bracket_is_literal_name() {
        let path = PropertyPath::parse("rows[x]");
        assert_eq!(
            path.segments().cloned().collect::<Vec<_>>(),
            vec![PathSegment::Property("rows[x]".into())]
        );
    }

    #[test]
    fn test_resolve_nested() {
        let root = json!({ "a": { "b": [ { "c": "x" } ] } });
        assert_eq!(resolve(&root, "a.b[0].c"), Some(&json!("x")));
    }

    #[test]
    fn test_resolve_missing_prefix_is_absent() {
        let root = json!({ "a": null, "list": [1, 2], "n": 3 });
        assert_eq!(resolve(&root, "a.b.c"), None);
        assert_eq!(resolve(&root, "missing.deeper[3].x"), None);
        assert_eq!(resolve(&root, "list[5]"), None);
        assert_eq!(resolve(&root, "n.inner"), None);
        assert_eq!(resolve(&root, "list.length"), None);
        assert_eq!(resolve(&root, "a"), None);
    }

    #[test]
    fn test_resolve_falsy_leaves() {
        let root = json!({ "zero": 0, "no": false, "empty": "" });
        assert_eq!(resolve(&root, "zero"), Some(&json!(0)));
        assert_eq!(resolve(&root, "no"), Some(&json!(false)));
        assert_eq!(resolve(&root, "empty"), Some(&json!("")));
    }

    #[test]
    fn test_empty_path_is_root() {
        let root = json!([1, 2, 3]);
        assert_eq!(resolve(&root, ""), Some(&root));
    }
}
