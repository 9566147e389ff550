//! Canonical path mapping.
//!
//! Every primitive reachable from a document root gets exactly one path:
//! map keys are joined with `.`, array indices are rendered as `[i]`.
//!
//! ```text
//! {"a": {"b": [10, {"c": true}]}}
//!   a.b[0]   -> 10
//!   a.b[1].c -> true
//! ```
//!
//! A key containing `.` would make two different trees render the same path,
//! so the mapper rejects it instead of mis-splitting.
//!
//! `Undefined` slots are enumerated like any other primitive; skipping them is
//! the digest engine's decision, not the mapper's.

use std::fmt;

use crate::config::LimitsConfig;
use crate::errors::{AttestError, AttestResult};
use crate::value::Value;

/// Separator between map keys in a rendered path.
pub const SEPARATOR: char = '.';

/// One step from a container to a child.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A structured path from the document root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, seg: Segment) {
        self.segments.push(seg);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    /// Split into the parent path and the final segment.
    pub fn split_last(&self) -> Option<(&[Segment], &Segment)> {
        self.segments.split_last().map(|(last, parent)| (parent, last))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Key(k) if i == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, "{SEPARATOR}{k}")?,
                Segment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

/// A primitive leaf and where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf<'a> {
    pub path: Path,
    pub value: &'a Value,
}

impl Leaf<'_> {
    pub fn path_string(&self) -> String {
        self.path.to_string()
    }
}

/// Enumerate all primitive leaves with default limits.
pub fn enumerate(value: &Value) -> AttestResult<Vec<Leaf<'_>>> {
    enumerate_with_limits(value, &LimitsConfig::default())
}

/// Enumerate all primitive leaves, failing fast on oversized input.
///
/// Map children are visited in key order and array children in index order,
/// so the output order is stable, but nothing downstream depends on it.
pub fn enumerate_with_limits<'a>(
    value: &'a Value,
    limits: &LimitsConfig,
) -> AttestResult<Vec<Leaf<'a>>> {
    let mut out = Vec::new();
    let mut path = Path::root();
    walk(value, &mut path, 0, limits, &mut out)?;
    Ok(out)
}

/// Enumerate as `(rendered path, value)` pairs.
pub fn flatten(value: &Value) -> AttestResult<Vec<(String, Value)>> {
    Ok(enumerate(value)?
        .into_iter()
        .map(|leaf| (leaf.path_string(), leaf.value.clone()))
        .collect())
}

fn walk<'a>(
    value: &'a Value,
    path: &mut Path,
    depth: usize,
    limits: &LimitsConfig,
    out: &mut Vec<Leaf<'a>>,
) -> AttestResult<()> {
    if depth > limits.max_depth {
        return Err(AttestError::structure(format!(
            "document nesting exceeds max depth {} at {path}",
            limits.max_depth
        )));
    }

    match value {
        Value::Map(m) => {
            for (k, v) in m {
                check_key(k)?;
                path.push(Segment::Key(k.clone()));
                walk(v, path, depth + 1, limits, out)?;
                path.pop();
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                path.push(Segment::Index(i));
                walk(v, path, depth + 1, limits, out)?;
                path.pop();
            }
        }
        prim => {
            if out.len() >= limits.max_leaves {
                return Err(AttestError::structure(format!(
                    "document exceeds max leaf count {}",
                    limits.max_leaves
                )));
            }
            out.push(Leaf {
                path: path.clone(),
                value: prim,
            });
        }
    }

    Ok(())
}

/// Reject keys that would make rendered paths ambiguous: the separator and
/// the index brackets are reserved.
pub fn check_key(key: &str) -> AttestResult<()> {
    if key.contains([SEPARATOR, '[', ']']) {
        return Err(AttestError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Rebuild a tree with every primitive replaced by `f(primitive)`.
///
/// Containers keep their shape; `Undefined` slots are passed to `f` like any
/// other primitive.
pub fn try_map_leaves<F>(value: &Value, limits: &LimitsConfig, f: &mut F) -> AttestResult<Value>
where
    F: FnMut(&Value) -> AttestResult<Value>,
{
    map_inner(value, 0, limits, f)
}

fn map_inner<F>(value: &Value, depth: usize, limits: &LimitsConfig, f: &mut F) -> AttestResult<Value>
where
    F: FnMut(&Value) -> AttestResult<Value>,
{
    if depth > limits.max_depth {
        return Err(AttestError::structure(format!(
            "document nesting exceeds max depth {}",
            limits.max_depth
        )));
    }

    match value {
        Value::Map(m) => {
            let mut out = crate::value::Map::new();
            for (k, v) in m {
                check_key(k)?;
                out.insert(k.clone(), map_inner(v, depth + 1, limits, f)?);
            }
            Ok(Value::Map(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| map_inner(v, depth + 1, limits, f))
            .collect::<AttestResult<Vec<_>>>()
            .map(Value::Array),
        prim => f(prim),
    }
}

/// True when `path` is `prefix` itself or lies underneath it.
///
/// `a` covers `a`, `a.b` and `a[0]`, but not `ab`. The empty prefix only
/// covers the root primitive.
pub fn covers(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() {
        return path.is_empty();
    }
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATOR) || rest.starts_with('['),
        None => false,
    }
}

/// Resolve a structured path against a tree.
pub fn lookup<'a>(root: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |node, seg| match (node, seg) {
        (Value::Map(m), Segment::Key(k)) => m.get(k),
        (Value::Array(a), Segment::Index(i)) => a.get(*i),
        _ => None,
    })
}

/// Resolve a rendered path (`a.b[0]`) against a tree, containers included.
///
/// Descends only into children whose rendered path is a prefix of `target`,
/// so no string parsing is needed.
pub fn lookup_rendered<'a>(root: &'a Value, target: &str) -> Option<&'a Value> {
    let mut here = Path::root();
    find_rendered(root, &mut here, target)
}

fn find_rendered<'a>(node: &'a Value, here: &mut Path, target: &str) -> Option<&'a Value> {
    let rendered = here.to_string();
    if rendered == target {
        return Some(node);
    }
    if !here.is_root() && !covers(&rendered, target) {
        return None;
    }

    let children: Box<dyn Iterator<Item = (Segment, &'a Value)> + 'a> = match node {
        Value::Map(m) => Box::new(m.iter().map(|(k, v)| (Segment::Key(k.clone()), v))),
        Value::Array(a) => Box::new(a.iter().enumerate().map(|(i, v)| (Segment::Index(i), v))),
        _ => return None,
    };
    for (seg, child) in children {
        here.push(seg);
        let found = find_rendered(child, here, target);
        here.pop();
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Rendered path of the container holding `path`; the root's parent is `None`.
pub fn parent_of(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    let cut = if path.ends_with(']') {
        path.rfind('[')
    } else {
        path.rfind(SEPARATOR)
    };
    Some(cut.map_or("", |i| &path[..i]))
}

fn lookup_mut<'a>(root: &'a mut Value, segments: &[Segment]) -> Option<&'a mut Value> {
    let mut node = root;
    for seg in segments {
        node = match (node, seg) {
            (Value::Map(m), Segment::Key(k)) => m.get_mut(k)?,
            (Value::Array(a), Segment::Index(i)) => a.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Remove the value at `path`.
///
/// Map entries are deleted. Array elements become `Undefined` so the indices,
/// and therefore the paths, of their siblings do not move. Returns false when
/// nothing was there.
pub fn remove(root: &mut Value, path: &Path) -> bool {
    let Some((parent, last)) = path.split_last() else {
        if root.is_undefined() {
            return false;
        }
        *root = Value::Undefined;
        return true;
    };

    match (lookup_mut(root, parent), last) {
        (Some(Value::Map(m)), Segment::Key(k)) => m.remove(k).is_some(),
        (Some(Value::Array(a)), Segment::Index(i)) => match a.get_mut(*i) {
            Some(slot) if !slot.is_undefined() => {
                *slot = Value::Undefined;
                true
            }
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn paths(v: &Value) -> Vec<String> {
        enumerate(v)
            .unwrap()
            .into_iter()
            .map(|l| l.path_string())
            .collect()
    }

    #[test]
    fn nested_paths() {
        let v = Value::from(json!({"a": {"b": [10, {"c": true}]}, "d": null}));
        assert_eq!(paths(&v), vec!["a.b[0]", "a.b[1].c", "d"]);
    }

    #[test]
    fn root_array_and_primitive() {
        assert_eq!(paths(&Value::from(json!(["x", ["y"]]))), vec!["[0]", "[1][0]"]);
        assert_eq!(paths(&Value::from("solo")), vec![""]);
    }

    #[test]
    fn empty_containers_have_no_leaves() {
        assert!(paths(&Value::from(json!({"a": {}, "b": []}))).is_empty());
    }

    #[test]
    fn undefined_slots_get_paths() {
        let v = Value::Array(vec![Value::Undefined, Value::from(1u64)]);
        let leaves = enumerate(&v).unwrap();
        assert_eq!(leaves[0].path_string(), "[0]");
        assert!(leaves[0].value.is_undefined());
    }

    #[test]
    fn dotted_key_rejected() {
        let v = Value::from(json!({"a": {"b.c": 1}}));
        assert_matches!(enumerate(&v), Err(AttestError::InvalidKey { key }) if key == "b.c");
    }

    #[test]
    fn bracketed_keys_rejected() {
        // "a[0]" would render the same path as the first element of "a"
        let v = Value::from(json!({"a[0]": 1, "a": [2]}));
        assert_matches!(enumerate(&v), Err(AttestError::InvalidKey { key }) if key == "a[0]");
        assert_matches!(check_key("x]"), Err(AttestError::InvalidKey { .. }));
        assert!(check_key("plain_key-1").is_ok());
    }

    #[test]
    fn depth_limit_enforced() {
        let mut v = Value::from(1u64);
        for _ in 0..10 {
            v = Value::Array(vec![v]);
        }
        let limits = LimitsConfig {
            max_depth: 5,
            ..LimitsConfig::default()
        };
        assert_matches!(enumerate_with_limits(&v, &limits), Err(AttestError::Structure(_)));
    }

    #[test]
    fn prefix_cover() {
        assert!(covers("a", "a"));
        assert!(covers("a", "a.b"));
        assert!(covers("a", "a[3].c"));
        assert!(!covers("a", "ab"));
        assert!(!covers("", "a"));
    }

    #[test]
    fn remove_keeps_array_indices() {
        let mut v = Value::from(json!({"list": ["a", "b", "c"], "k": 1}));
        let leaves = enumerate(&v).unwrap();
        let target = leaves[2].path.clone();
        assert_eq!(target.to_string(), "list[1]");

        assert!(remove(&mut v, &target));
        assert!(!remove(&mut v, &target));
        assert_eq!(paths(&v), vec!["k", "list[0]", "list[1]", "list[2]"]);
        assert_eq!(v.to_json(), json!({"list": ["a", null, "c"], "k": 1}));
    }

    #[test]
    fn rendered_lookup_and_parents() {
        let v = Value::from(json!({"a": {"b": [1, {"c": "x"}]}, "ab": 2}));
        assert_eq!(lookup_rendered(&v, "a.b[1].c"), Some(&Value::from("x")));
        assert_eq!(lookup_rendered(&v, "ab"), Some(&Value::from(2u64)));
        assert!(lookup_rendered(&v, "a.b").and_then(Value::as_array).is_some());
        assert_eq!(lookup_rendered(&v, "a.z"), None);
        assert_eq!(lookup_rendered(&v, ""), Some(&v));

        assert_eq!(parent_of("a.b[1].c"), Some("a.b[1]"));
        assert_eq!(parent_of("a.b[1]"), Some("a.b"));
        assert_eq!(parent_of("a"), Some(""));
        assert_eq!(parent_of(""), None);
    }

    #[test]
    fn lookup_follows_segments() {
        let v = Value::from(json!({"a": [{"b": 2}]}));
        let segs = [Segment::Key("a".into()), Segment::Index(0), Segment::Key("b".into())];
        assert_eq!(lookup(&v, &segs), Some(&Value::from(2u64)));
        assert_eq!(lookup(&v, &segs[..1]).map(Value::is_primitive), Some(false));
    }
}
