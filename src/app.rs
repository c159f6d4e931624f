use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::Client;
use sqlx::SqlitePool;
use tokio::{net::TcpListener, time::timeout};
use tokio_cron_scheduler::JobScheduler;

use crate::{
    api::{self, AppState},
    config::AppConfig,
    db,
    infrastructure::{
        cipher::AesGcmCipher, directories::ResolvedPaths, rate_limit::RateLimiter,
        shutdown::Shutdown,
    },
    tasks::scheduler::configure_sweep_job,
};

pub struct BookmarkApp {
    listener: TcpListener,
    state: AppState,
    pool: SqlitePool,
    scheduler: JobScheduler,
    shutdown: Shutdown,
}

impl BookmarkApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let pool = db::init_pool(&paths.db_path).await?;
        tracing::info!(target: "db", path = %paths.db_path.display(), "database ready");

        if config.anthropic.api_key.is_none() {
            tracing::warn!(
                target: "ai",
                "ANTHROPIC_API_KEY is not set; bookmark analysis requests will fail"
            );
        }

        if config.security.encryption_key.is_none() {
            tracing::warn!(
                target: "api",
                "ENCRYPTION_KEY is not set; saving or using integration credentials will fail"
            );
        }
        let cipher = Arc::new(AesGcmCipher::new(config.security.encryption_key.as_deref())?);

        let http = Client::builder()
            .user_agent(format!("bookmark-ai-rust/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let rate_limiter = Arc::new(RateLimiter::new());
        let scheduler =
            configure_sweep_job(&config.scheduler.rate_limit_sweep_cron, rate_limiter.clone())
                .await?;

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.bind_addr))?;

        let state = AppState::new(config, pool.clone(), http, rate_limiter, cipher);

        Ok(Self {
            listener,
            state,
            pool,
            scheduler,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let BookmarkApp {
            listener,
            state,
            pool,
            mut scheduler,
            shutdown,
        } = self;

        tracing::info!("bookmark analysis service starting");

        let router = api::build_router(state);
        let served = api::serve(listener, router, shutdown.subscribe()).await;
        if let Err(err) = &served {
            tracing::error!(?err, "HTTP server stopped unexpectedly");
        }
        shutdown.trigger();

        let shutdown_timeout = Duration::from_secs(5);
        match timeout(shutdown_timeout, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(?err, "scheduler shutdown failed");
            }
            Err(_) => {
                tracing::warn!(
                    target: "scheduler",
                    "scheduler did not stop within {:?}",
                    shutdown_timeout
                );
            }
        }

        if timeout(shutdown_timeout, pool.close()).await.is_err() {
            tracing::warn!(
                target: "db",
                "database pool did not close within {:?}",
                shutdown_timeout
            );
        }

        tracing::info!("bookmark analysis service stopped");
        served
    }
}
