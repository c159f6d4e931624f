use indexmap::IndexMap;

use crate::domain::{CategoryNode, CategoryTree};

use super::format::format_key;

/// Top-level keys ending with this suffix are legacy root wrappers and never
/// show up in candidate paths.
pub const RESERVED_ROOT_SUFFIX: &str = "_Bookmarks";

/// Flattens a tree into `/`-joined candidate paths, parents before children,
/// following the tree's own key order.
pub fn flatten(tree: &CategoryTree) -> Vec<String> {
    let mut paths = Vec::new();
    for (key, node) in tree.iter() {
        if key.ends_with(RESERVED_ROOT_SUFFIX) {
            if let CategoryNode::Branch(children) = node {
                collect(children, "", &mut paths);
            }
            continue;
        }
        emit(key, node, "", &mut paths);
    }
    paths
}

fn collect(children: &IndexMap<String, CategoryNode>, prefix: &str, paths: &mut Vec<String>) {
    for (key, node) in children {
        emit(key, node, prefix, paths);
    }
}

fn emit(key: &str, node: &CategoryNode, prefix: &str, paths: &mut Vec<String>) {
    let segment = format_key(key);
    let path = if prefix.is_empty() {
        segment
    } else {
        format!("{prefix}/{segment}")
    };

    match node {
        CategoryNode::Branch(children) => {
            paths.push(path.clone());
            collect(children, &path, paths);
        }
        CategoryNode::Leaf(_) => paths.push(path),
    }
}
