use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::infrastructure::rate_limit::RateLimiter;

pub async fn configure_sweep_job(cron_spec: &str, limiter: Arc<RateLimiter>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(cron_spec, move |_id, _l| {
        let limiter = limiter.clone();
        Box::pin(async move {
            let evicted = limiter.sweep();
            if evicted > 0 {
                tracing::debug!(
                    target: "scheduler",
                    evicted,
                    remaining = limiter.tracked(),
                    "rate limit windows swept"
                );
            }
        })
    })?;
    scheduler.add(job).await?;
    tracing::info!(target: "scheduler", cron = %cron_spec, "rate limit sweep job registered");
    scheduler.start().await?;
    Ok(scheduler)
}
