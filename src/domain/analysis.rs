use serde::{Deserialize, Serialize};

/// Fallback matched category for pages that fit nothing in the user's tree.
pub const OTHER_CATEGORY: &str = "Other";

#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub candidates: Vec<String>,
}

impl ClassificationRequest {
    /// URLs that already look like articles skip the mandatory category match.
    pub fn requires_category_match(&self) -> bool {
        !["article", "blog", "post"]
            .iter()
            .any(|needle| self.url.contains(needle))
    }
}

/// Engine output. Field decoding is forgiving about scalar types so that any
/// syntactically valid object the engine returns still yields a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_article: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub content_type: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::tags")]
    pub categories: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub matched_category: Option<String>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// `true`, `"true"` (any case) and non-zero numbers; everything else is false.
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            _ => false,
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(scalar(Value::deserialize(deserializer)?))
    }

    /// A list of tags, or a single comma-separated string of them.
    pub fn tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw: Vec<String> = match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().filter_map(scalar).collect(),
            Value::String(s) => s.split(',').map(str::to_string).collect(),
            other => scalar(other).into_iter().collect(),
        };
        Ok(raw
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstapaperOutcome {
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstapaperOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            saved: false,
            bookmark_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoistOutcome {
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TodoistOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            created: false,
            task_id: None,
            error: Some(error.into()),
        }
    }
}
