use std::sync::Arc;

use reqwest::Client;
use sqlx::SqlitePool;

use crate::{
    ai::{AnthropicClient, Classifier},
    config::AppConfig,
    db::{api_keys::ApiKeyRepository, categories::CategoryRepository, users::UserRepository},
    infrastructure::{cipher::CredentialCipher, rate_limit::RateLimiter},
    integrations::Integrations,
    web_content::WebContentFetcher,
};

pub type BookmarkClassifier = Classifier<AnthropicClient, WebContentFetcher>;

/// Shared handler context. Cloning is cheap; everything inside is a pool
/// handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserRepository,
    pub api_keys: ApiKeyRepository,
    pub categories: CategoryRepository,
    pub classifier: Arc<BookmarkClassifier>,
    pub integrations: Integrations,
    pub rate_limiter: Arc<RateLimiter>,
    pub cipher: Arc<dyn CredentialCipher>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        pool: SqlitePool,
        http: Client,
        rate_limiter: Arc<RateLimiter>,
        cipher: Arc<dyn CredentialCipher>,
    ) -> Self {
        let classifier = Classifier::new(
            AnthropicClient::new(http.clone(), config.anthropic.clone()),
            WebContentFetcher::new(http.clone(), config.web.clone()),
            config.web.content_max_length,
        );

        Self {
            users: UserRepository::new(pool.clone()),
            api_keys: ApiKeyRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool),
            classifier: Arc::new(classifier),
            integrations: Integrations::new(http, config.integrations.clone()),
            rate_limiter,
            cipher,
            config,
        }
    }
}
