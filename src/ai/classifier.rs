use thiserror::Error;

use crate::{
    categories::flatten,
    domain::{CategoryTree, ClassificationRequest, ClassificationResult, OTHER_CATEGORY},
    web_content::{truncate_content, ContentSource},
};

use super::{
    decoder::{decode_result, DecodeError},
    engine::ReasoningEngine,
    prompt::build_prompt,
};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Failed to extract categories: {0}")]
    Setup(String),
    #[error("Failed to call reasoning engine: {0:#}")]
    Engine(anyhow::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Runs one bookmark through content fetch, prompt construction, the
/// reasoning engine and result normalization. Holds no per-request state.
pub struct Classifier<E, C> {
    engine: E,
    content: C,
    content_max_length: usize,
}

impl<E, C> Classifier<E, C>
where
    E: ReasoningEngine,
    C: ContentSource,
{
    pub fn new(engine: E, content: C, content_max_length: usize) -> Self {
        Self {
            engine,
            content,
            content_max_length,
        }
    }

    pub async fn classify(
        &self,
        url: &str,
        title: Option<&str>,
        tree: &CategoryTree,
    ) -> Result<ClassificationResult, ClassifyError> {
        let request = self.prepare(url, title, tree).await;
        tracing::info!(
            target: "classifier",
            url = %request.url,
            candidates = request.candidates.len(),
            has_content = request.content.is_some(),
            category_match = request.requires_category_match(),
            "classifying bookmark"
        );

        let prompt = build_prompt(&request);
        let response = self
            .engine
            .complete(&prompt)
            .await
            .map_err(ClassifyError::Engine)?;

        let mut result = decode_result(&response)?;
        normalize_matched_category(&mut result, &request.candidates);
        Ok(result)
    }

    pub async fn prepare(
        &self,
        url: &str,
        title: Option<&str>,
        tree: &CategoryTree,
    ) -> ClassificationRequest {
        // Only an empty title counts as missing; whitespace is passed through.
        let title = title.filter(|t| !t.is_empty()).map(str::to_string);

        let content = match title {
            Some(_) => None,
            None => self
                .content
                .fetch(url)
                .await
                .map(|body| truncate_content(body, self.content_max_length)),
        };

        ClassificationRequest {
            url: url.to_string(),
            title,
            content,
            candidates: flatten(tree),
        }
    }
}

/// Non-article results always leave with a matched category, and any matched
/// category is either one of `candidates` or [`OTHER_CATEGORY`].
pub fn normalize_matched_category(result: &mut ClassificationResult, candidates: &[String]) {
    let matched = result
        .matched_category
        .take()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    result.matched_category = match matched {
        Some(m) if m == OTHER_CATEGORY || candidates.contains(&m) => Some(m),
        Some(m) => {
            tracing::warn!(
                target: "classifier",
                matched = %m,
                "engine returned a category outside the candidate list; using Other"
            );
            Some(OTHER_CATEGORY.to_string())
        }
        None if !result.is_article => Some(OTHER_CATEGORY.to_string()),
        None => None,
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::ai::engine::EngineResponse;

    #[derive(Clone, Default)]
    struct FakeEngine {
        reply: Option<String>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl FakeEngine {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                prompts: Arc::default(),
            }
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().last().cloned().unwrap_or_default()
        }
    }

    impl ReasoningEngine for FakeEngine {
        async fn complete(&self, prompt: &str) -> Result<EngineResponse> {
            self.prompts.lock().push(prompt.to_string());
            match &self.reply {
                Some(text) => Ok(EngineResponse::text(text.clone())),
                None => Err(anyhow!("rate limited")),
            }
        }
    }

    #[derive(Clone, Default)]
    struct FakeContent {
        body: Option<String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ContentSource for FakeContent {
        async fn fetch(&self, url: &str) -> Option<String> {
            self.calls.lock().push(url.to_string());
            self.body.clone()
        }
    }

    fn work_tree() -> CategoryTree {
        CategoryTree::try_from(&json!({ "Work": { "Docs": [] }, "Archive": [] })).unwrap()
    }

    fn classifier(engine: FakeEngine, content: FakeContent) -> Classifier<FakeEngine, FakeContent> {
        Classifier::new(engine, content, 8_000)
    }

    #[tokio::test]
    async fn tool_url_prompt_offers_every_candidate() {
        let engine = FakeEngine::replying(
            r#"{"isArticle": false, "contentType": "tool", "title": "T", "summary": "S",
                "categories": ["a"], "matchedCategory": "Work/Docs"}"#,
        );
        let classifier = classifier(engine.clone(), FakeContent::default());

        let result = classifier
            .classify("https://example.com/tool", Some("T"), &work_tree())
            .await
            .unwrap();

        let prompt = engine.last_prompt();
        for path in ["Work", "Work/Docs", "Archive"] {
            assert!(prompt.contains(&format!("\n{path}\n")), "missing {path}");
        }
        assert!(prompt.contains("exactly ONE category"));
        assert!(prompt.contains("\"Other\""));
        assert_eq!(result.matched_category.as_deref(), Some("Work/Docs"));
    }

    #[tokio::test]
    async fn non_article_without_match_gets_other() {
        let engine =
            FakeEngine::replying(r#"{"isArticle": false, "contentType": "tool", "title": "T"}"#);
        let result = classifier(engine, FakeContent::default())
            .classify("https://example.com/tool", Some("T"), &work_tree())
            .await
            .unwrap();
        assert_eq!(result.matched_category.as_deref(), Some(OTHER_CATEGORY));

        let engine = FakeEngine::replying(r#"{"isArticle": false, "matchedCategory": ""}"#);
        let result = classifier(engine, FakeContent::default())
            .classify("https://example.com/tool", Some("T"), &work_tree())
            .await
            .unwrap();
        assert_eq!(result.matched_category.as_deref(), Some(OTHER_CATEGORY));
    }

    #[tokio::test]
    async fn articles_may_omit_matched_category() {
        let engine = FakeEngine::replying(r#"{"isArticle": true, "contentType": "article"}"#);
        let result = classifier(engine, FakeContent::default())
            .classify("https://example.com/blog/x", Some("T"), &work_tree())
            .await
            .unwrap();
        assert!(result.is_article);
        assert_eq!(result.matched_category, None);
    }

    #[tokio::test]
    async fn content_is_fetched_only_without_a_title() {
        let content = FakeContent {
            body: Some("<title>Page</title>".to_string()),
            calls: Arc::default(),
        };
        let engine = FakeEngine::replying(r#"{"isArticle": true}"#);
        let classifier = classifier(engine.clone(), content.clone());

        classifier
            .classify("https://example.com/a", Some("Given"), &work_tree())
            .await
            .unwrap();
        assert!(content.calls.lock().is_empty());
        assert!(!engine.last_prompt().contains("HTML Content"));

        classifier
            .classify("https://example.com/a", None, &work_tree())
            .await
            .unwrap();
        assert_eq!(content.calls.lock().as_slice(), ["https://example.com/a"]);
        assert!(engine.last_prompt().contains("<title>Page</title>"));
    }

    #[tokio::test]
    async fn empty_title_counts_as_absent() {
        let content = FakeContent::default();
        let request = classifier(FakeEngine::default(), content.clone())
            .prepare("https://example.com/a", Some(""), &work_tree())
            .await;
        assert_eq!(request.title, None);
        assert_eq!(content.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn whitespace_title_still_skips_the_fetch() {
        let content = FakeContent::default();
        let request = classifier(FakeEngine::default(), content.clone())
            .prepare("https://example.com/a", Some("   "), &work_tree())
            .await;
        assert_eq!(request.title.as_deref(), Some("   "));
        assert!(content.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn oversized_content_is_truncated_before_prompting() {
        let content = FakeContent {
            body: Some("y".repeat(9_000)),
            calls: Arc::default(),
        };
        let request = classifier(FakeEngine::default(), content)
            .prepare("https://example.com/a", None, &work_tree())
            .await;
        let body = request.content.unwrap();
        assert!(body.starts_with(&"y".repeat(8_000)));
        assert!(body.ends_with("[content truncated]"));
        assert_eq!(body.chars().filter(|c| *c == 'y').count(), 8_000);
    }

    #[tokio::test]
    async fn engine_failures_propagate() {
        let err = classifier(FakeEngine::default(), FakeContent::default())
            .classify("https://example.com/tool", Some("T"), &work_tree())
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::Engine(_)));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn response_without_json_is_malformed() {
        let engine = FakeEngine::replying("Sorry, I can't help with that.");
        let err = classifier(engine, FakeContent::default())
            .classify("https://example.com/tool", Some("T"), &work_tree())
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(DecodeError::NoJson)));
    }

    #[test]
    fn unknown_matches_fall_back_to_other() {
        let candidates = vec!["Work".to_string(), "Work/Docs".to_string()];
        let mut result = ClassificationResult {
            is_article: false,
            content_type: "tool".into(),
            title: String::new(),
            summary: String::new(),
            categories: vec![],
            matched_category: Some("Work/Hallucinated".into()),
        };
        normalize_matched_category(&mut result, &candidates);
        assert_eq!(result.matched_category.as_deref(), Some(OTHER_CATEGORY));

        result.matched_category = Some("  Work/Docs ".into());
        normalize_matched_category(&mut result, &candidates);
        assert_eq!(result.matched_category.as_deref(), Some("Work/Docs"));

        result.matched_category = Some("Other".into());
        normalize_matched_category(&mut result, &candidates);
        assert_eq!(result.matched_category.as_deref(), Some("Other"));
    }
}
