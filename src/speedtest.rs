use anyhow::{Context, Result};
use log::{debug, error};
use reqwest::{Client, StatusCode};

use crate::config::SpeedtestConfig;
use crate::retry::RetryPolicy;

/// Fetches the raw ranked IP list. Transport errors and non-200 responses are
/// retried; once the attempts are spent the failure collapses to `None`.
pub async fn fetch_candidate_ips(client: &Client, config: &SpeedtestConfig) -> Option<String> {
    let policy = RetryPolicy::new(config.max_retries, config.retry_delay());

    match policy
        .run("fetch_candidate_ips", || fetch_once(client, config))
        .await
    {
        Ok(body) => Some(body),
        Err(e) => {
            error!("Giving up on {} after {} attempt(s): {:#}", config.url, config.max_retries, e);
            None
        }
    }
}

async fn fetch_once(client: &Client, config: &SpeedtestConfig) -> Result<String> {
    let response = client
        .get(&config.url)
        .timeout(config.timeout())
        .send()
        .await
        .context("Failed to send request to speed test site")?;

    let status = response.status();
    if status != StatusCode::OK {
        anyhow::bail!("Speed test site returned {}", status);
    }

    let body = response
        .text()
        .await
        .context("Failed to read speed test response")?;
    debug!("Speed test response: {}", body);

    Ok(body)
}

/// Splits a comma separated list, trimming entries and dropping blanks.
/// Entries are not validated as addresses.
pub fn parse_candidate_ips(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect()
}
