// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Nested config tree access.
//!
//! Observers never mutate their input; they clone the tree and edit only the
//! path they own, so callers can compare old and new trees.

use crate::error::{OperatorError, Result};
use serde_json::{Map, Value};

/// Operand-facing configuration, an arbitrarily nested JSON object.
pub type ConfigTree = Map<String, Value>;

fn invalid_path(path: &[&str], reason: impl Into<String>) -> OperatorError {
    OperatorError::InvalidConfigPath {
        path: path.join("."),
        reason: reason.into(),
    }
}

/// Value at `path`, `None` if any segment is missing or not an object.
pub fn nested_field<'a>(tree: &'a ConfigTree, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = tree;
    for segment in parents {
        current = current.get(*segment)?.as_object()?;
    }
    current.get(*last)
}

/// String at `path`; errors when something other than a string sits there.
pub fn nested_string(tree: &ConfigTree, path: &[&str]) -> Result<Option<String>> {
    match nested_field(tree, path) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid_path(
            path,
            format!("expected string, found {}", type_name(other)),
        )),
    }
}

/// Sets `value` at `path`, creating intermediate objects as needed.
pub fn set_nested_field(tree: &mut ConfigTree, value: Value, path: &[&str]) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Err(invalid_path(path, "empty path"));
    };

    let mut current = tree;
    for (depth, segment) in parents.iter().enumerate() {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(map) => map,
            other => {
                return Err(invalid_path(
                    &path[..=depth],
                    format!("expected object, found {}", type_name(other)),
                ))
            }
        };
    }

    current.insert(last.to_string(), value);
    Ok(())
}

/// Removes the value at `path`. Missing paths are left alone.
pub fn remove_nested_field(tree: &mut ConfigTree, path: &[&str]) -> Option<Value> {
    let (last, parents) = path.split_last()?;
    let mut current = tree;
    for segment in parents {
        current = current.get_mut(*segment)?.as_object_mut()?;
    }
    current.remove(*last)
}

/// Dotted paths of leaves that were added, removed or modified between two trees.
pub fn changed_paths(old: &ConfigTree, new: &ConfigTree) -> Vec<String> {
    let mut changed = Vec::new();
    diff_objects(old, new, "", &mut changed);
    changed.sort();
    changed
}

fn diff_objects(old: &ConfigTree, new: &ConfigTree, prefix: &str, out: &mut Vec<String>) {
    for (key, old_value) in old {
        let path = join(prefix, key);
        match new.get(key) {
            Some(new_value) => diff_values(old_value, new_value, &path, out),
            None => leaf_paths(old_value, &path, out),
        }
    }
    for (key, new_value) in new.iter().filter(|(k, _)| !old.contains_key(*k)) {
        leaf_paths(new_value, &join(prefix, key), out);
    }
}

fn diff_values(old: &Value, new: &Value, path: &str, out: &mut Vec<String>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => diff_objects(a, b, path, out),
        (a, b) if a != b => out.push(path.to_string()),
        _ => {}
    }
}

/// Every leaf below `value`; an empty object counts as a leaf.
fn leaf_paths(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                leaf_paths(child, &join(path, key), out);
            }
        }
        _ => out.push(path.to_string()),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
