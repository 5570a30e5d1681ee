//! Calls the fetch endpoint of a running API once at startup and then every
//! 30 minutes. Useful when the in-process scheduler is disabled.

use creative_opportunities::{config::get_env, utils::time};
use reqwest::Client;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const TRIGGER_PERIOD: Duration = Duration::from_secs(30 * 60);

async fn trigger_fetch(client: &Client, api_url: &str) -> bool {
    info!(at = %time::to_rfc3339(time::now()), url = api_url, "starting scheduled opportunity fetch");
    match client.post(api_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body = resp.text().await.unwrap_or_default();
            info!(response = %body, "fetch triggered successfully");
            true
        }
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(%status, response = %body, "fetch trigger was rejected");
            false
        }
        Err(e) => {
            error!(error = %e, "could not reach the API");
            false
        }
    }
}

/// A job that fires `period` after the scheduler starts and every `period`
/// after that, independent of wall-clock minute boundaries.
fn trigger_job(
    client: Client,
    api_url: String,
    period: Duration,
) -> Result<Job, JobSchedulerError> {
    Job::new_repeated_async(period, move |_id, _lock| {
        let client = client.clone();
        let url = api_url.clone();
        Box::pin(async move {
            trigger_fetch(&client, &url).await;
        })
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let api_url = get_env("API_URL")?;
    // Discovery can take several minutes on the server side.
    let client = Client::builder().timeout(Duration::from_secs(900)).build()?;

    trigger_fetch(&client, &api_url).await;

    let sched = JobScheduler::new().await?;
    sched.add(trigger_job(client, api_url, TRIGGER_PERIOD)?).await?;
    sched.start().await?;
    info!(period_secs = TRIGGER_PERIOD.as_secs(), "cron trigger started");

    tokio::signal::ctrl_c().await?;
    info!("shutting down cron trigger");
    Ok(())
}
