use crate::client::ApiClient;
use crate::collection::Collection;
use crate::error::{ApiError, Result};
use futures::future::join_all;
use std::str::FromStr;
use tracing::warn;

/// What a batch of concurrent fetches does when some of them fail.
///
/// Every request in the batch always runs to completion; the policy only
/// decides what the caller gets back afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanoutPolicy {
    /// Surface the first failure (in batch order); the caller must not render.
    #[default]
    Abort,
    /// Log failures, keep whatever loaded, report what is missing.
    BestEffort,
}

impl FromStr for FanoutPolicy {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(FanoutPolicy::Abort),
            "best-effort" | "best_effort" | "besteffort" => Ok(FanoutPolicy::BestEffort),
            other => Err(ApiError::Configuration(format!(
                "unknown fan-out policy '{}'",
                other
            ))),
        }
    }
}

/// Outcome of a best-effort batch.
#[derive(Debug, Default)]
pub struct FanoutReport {
    /// `(api_tag, error)` for every collection that failed to load.
    pub failures: Vec<(String, ApiError)>,
}

impl FanoutReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetch all `collections` concurrently and wait for every one of them.
pub async fn fetch_all(
    client: &ApiClient,
    collections: &mut [&mut Collection],
    policy: FanoutPolicy,
) -> Result<FanoutReport> {
    let tags: Vec<String> = collections
        .iter()
        .map(|c| c.descriptor().api_tag.clone())
        .collect();

    let results = join_all(collections.iter_mut().map(|c| c.fetch(client, &[]))).await;

    let mut report = FanoutReport::default();
    for (tag, result) in tags.into_iter().zip(results) {
        if let Err(err) = result {
            report.failures.push((tag, err));
        }
    }

    match policy {
        FanoutPolicy::Abort => match report.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(FanoutReport::default()),
        },
        FanoutPolicy::BestEffort => {
            for (tag, err) in &report.failures {
                warn!(api_tag = %tag, error = %err, "fetch failed, continuing with partial data");
            }
            Ok(report)
        }
    }
}
