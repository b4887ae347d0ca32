//! Flattening and rebuilding of dictionary trees
//!
//! A dictionary is a `serde_json::Value` whose composites are objects and
//! arrays and whose translatable leaves are strings. [`walk`] turns it into
//! an ordered list of [`LeafEntry`] values and [`set_at_path`] writes a value
//! back at one of those paths.

use serde_json::{Map, Value};

/// One step from a composite node to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Member of an object
    Key(String),
    /// Position in an array
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A string leaf together with the path leading to it from the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    pub path: Vec<PathSegment>,
    pub value: String,
}

impl LeafEntry {
    /// Dotted rendering of the path, e.g. `nav.items[2].label`
    pub fn display_path(&self) -> String {
        format_path(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Cannot set a value at an empty path")]
    EmptyPath,
    #[error("Path '{path}' does not lead through a matching container")]
    NotAContainer { path: String },
}

/// Render a path as `a.b[0].c`
pub fn format_path(path: &[PathSegment]) -> String {
    let mut rendered = String::new();
    for segment in path {
        if let PathSegment::Key(_) = segment {
            if !rendered.is_empty() {
                rendered.push('.');
            }
        }
        rendered.push_str(&segment.to_string());
    }
    rendered
}

/// Flatten a tree into its string leaves, depth-first and pre-order
///
/// Children are visited in the tree's own order (object insertion order,
/// then array positions). Numbers, booleans and nulls carry nothing to
/// translate and are skipped. A root that is not a composite yields no
/// entries.
pub fn walk(tree: &Value) -> Vec<LeafEntry> {
    let mut entries = Vec::new();
    let mut path = Vec::new();
    descend(tree, &mut path, &mut entries);
    entries
}

fn descend(node: &Value, path: &mut Vec<PathSegment>, entries: &mut Vec<LeafEntry>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(PathSegment::Key(key.clone()));
                visit(child, path, entries);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                visit(child, path, entries);
                path.pop();
            }
        }
        _ => {}
    }
}

fn visit(node: &Value, path: &mut Vec<PathSegment>, entries: &mut Vec<LeafEntry>) {
    match node {
        Value::String(text) => entries.push(LeafEntry {
            path: path.clone(),
            value: text.clone(),
        }),
        Value::Object(_) | Value::Array(_) => descend(node, path, entries),
        _ => {}
    }
}

/// Write `value` at `path`, creating missing intermediate containers
///
/// A missing (or null) intermediate node becomes an empty array when the
/// segment that follows is an index, and an empty object otherwise. The
/// final segment is overwritten. Setting an array index past the end pads
/// with nulls.
pub fn set_at_path(tree: &mut Value, path: &[PathSegment], value: Value) -> Result<(), TreeError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(TreeError::EmptyPath);
    };

    let mut current = tree;
    for (depth, segment) in parents.iter().enumerate() {
        current = child_or_insert(current, segment, &path[depth + 1], &path[..=depth])?;
    }

    if current.is_null() {
        *current = empty_container_for(last);
    }
    match (current, last) {
        (Value::Object(map), PathSegment::Key(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Value::Array(items), PathSegment::Index(index)) => {
            let index = *index;
            if index < items.len() {
                items[index] = value;
            } else {
                items.resize(index, Value::Null);
                items.push(value);
            }
            Ok(())
        }
        _ => Err(TreeError::NotAContainer {
            path: format_path(path),
        }),
    }
}

/// Rebuild a tree from scratch out of flattened entries
pub fn rebuild(entries: &[LeafEntry]) -> Result<Value, TreeError> {
    let mut tree = Value::Null;
    for entry in entries {
        set_at_path(&mut tree, &entry.path, Value::String(entry.value.clone()))?;
    }
    if tree.is_null() {
        tree = Value::Object(Map::new());
    }
    Ok(tree)
}

fn empty_container_for(segment: &PathSegment) -> Value {
    match segment {
        PathSegment::Key(_) => Value::Object(Map::new()),
        PathSegment::Index(_) => Value::Array(Vec::new()),
    }
}

fn child_or_insert<'a>(
    node: &'a mut Value,
    segment: &PathSegment,
    next: &PathSegment,
    at: &[PathSegment],
) -> Result<&'a mut Value, TreeError> {
    if node.is_null() {
        *node = empty_container_for(segment);
    }

    let child = match (node, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map
            .entry(key.clone())
            .or_insert_with(|| empty_container_for(next)),
        (Value::Array(items), PathSegment::Index(index)) => {
            if *index >= items.len() {
                items.resize(*index + 1, Value::Null);
            }
            &mut items[*index]
        }
        _ => {
            return Err(TreeError::NotAContainer {
                path: format_path(at),
            });
        }
    };

    if child.is_null() {
        *child = empty_container_for(next);
    }
    Ok(child)
}
