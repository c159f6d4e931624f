use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single entry in a category tree: either a named group of further
/// categories, or a leaf holding item labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CategoryNode {
    Branch(IndexMap<String, CategoryNode>),
    Leaf(Vec<String>),
}

impl CategoryNode {
    pub fn leaf() -> Self {
        Self::Leaf(Vec::new())
    }
}

/// A user's category taxonomy. Key order is the order the user wrote it in.
///
/// Deserialization goes through [`serde_json::Value`] and the structural
/// checks in `categories::validator`, so a `CategoryTree` is always well formed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    #[serde(deserialize_with = "deserialize_root")]
    root: IndexMap<String, CategoryNode>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_root(root: IndexMap<String, CategoryNode>) -> Self {
        Self { root }
    }

    pub fn with(mut self, key: impl Into<String>, node: CategoryNode) -> Self {
        self.root.insert(key.into(), node);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryNode)> {
        self.root.iter()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn deserialize_root<'de, D>(deserializer: D) -> Result<IndexMap<String, CategoryNode>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    CategoryTree::try_from(&value)
        .map(|tree| tree.root)
        .map_err(serde::de::Error::custom)
}

/// Builds a branch node from `(label, node)` pairs.
pub fn branch<I, K>(children: I) -> CategoryNode
where
    I: IntoIterator<Item = (K, CategoryNode)>,
    K: Into<String>,
{
    CategoryNode::Branch(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

/// The persisted category record, one per user.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub tree: CategoryTree,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
