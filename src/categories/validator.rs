//! Structural checks for category trees arriving from untrusted input.
//!
//! A tree is an object whose values are either nested objects or arrays of
//! strings. Depth and total key count are capped so hostile input cannot
//! exhaust the stack or memory while being converted.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{CategoryNode, CategoryTree};

pub const MAX_TREE_DEPTH: usize = 32;
pub const MAX_TREE_NODES: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("category tree root must be an object")]
    RootNotObject,
    #[error("category `{path}` must be an object or an array of strings")]
    InvalidNode { path: String },
    #[error("category `{path}` has a non-string item at index {index}")]
    NonStringItem { path: String, index: usize },
    #[error("category tree is nested deeper than {MAX_TREE_DEPTH} levels")]
    TooDeep,
    #[error("category tree has more than {MAX_TREE_NODES} categories")]
    TooManyNodes,
}

/// Returns whether `candidate` is a well-formed category tree. Never panics.
pub fn validate(candidate: &Value) -> bool {
    CategoryTree::try_from(candidate).is_ok()
}

impl TryFrom<&Value> for CategoryTree {
    type Error = TreeError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(TreeError::RootNotObject);
        };
        let mut seen = 0usize;
        let root = convert_branch(map, "", 1, &mut seen)?;
        Ok(CategoryTree::from_root(root))
    }
}

impl TryFrom<Value> for CategoryTree {
    type Error = TreeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        CategoryTree::try_from(&value)
    }
}

fn convert_branch(
    map: &Map<String, Value>,
    parent: &str,
    depth: usize,
    seen: &mut usize,
) -> Result<IndexMap<String, CategoryNode>, TreeError> {
    if depth > MAX_TREE_DEPTH {
        return Err(TreeError::TooDeep);
    }

    let mut children = IndexMap::with_capacity(map.len());
    for (key, value) in map {
        *seen += 1;
        if *seen > MAX_TREE_NODES {
            return Err(TreeError::TooManyNodes);
        }

        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}/{key}")
        };

        let node = match value {
            Value::Object(nested) => {
                CategoryNode::Branch(convert_branch(nested, &path, depth + 1, seen)?)
            }
            Value::Array(items) => CategoryNode::Leaf(convert_items(items, &path)?),
            _ => return Err(TreeError::InvalidNode { path }),
        };
        children.insert(key.clone(), node);
    }
    Ok(children)
}

fn convert_items(items: &[Value], path: &str) -> Result<Vec<String>, TreeError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(label) => Ok(label.clone()),
            _ => Err(TreeError::NonStringItem {
                path: path.to_string(),
                index,
            }),
        })
        .collect()
}
