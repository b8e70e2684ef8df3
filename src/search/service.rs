//! Simulated search service

use std::time::Duration;

use chrono::Local;
use rand::Rng;
use tracing::{debug, info};

use crate::config::Config;

use super::classifier::synthesize;
use super::record::{ResultKind, ResultRecord};

/// Answers queries after an artificial, uniformly random delay
#[derive(Debug, Clone)]
pub struct SearchService {
    latency_min: Duration,
    latency_max: Duration,
}

impl SearchService {
    pub fn new(latency_min: Duration, latency_max: Duration) -> Self {
        Self {
            latency_min,
            latency_max,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.latency_min, config.latency_max)
    }

    /// Pick a delay in `[latency_min, latency_max)`
    fn sample_latency(&self) -> Duration {
        if self.latency_max <= self.latency_min {
            return self.latency_min;
        }
        let min = self.latency_min.as_millis() as u64;
        let max = self.latency_max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..max))
    }

    /// Run a query. Suspends for the simulated latency, then answers.
    pub async fn search(&self, query: &str) -> Vec<ResultRecord> {
        let latency = self.sample_latency();
        info!(query, latency_ms = latency.as_millis() as u64, "searching");

        tokio::time::sleep(latency).await;

        let records = synthesize(query, Local::now());
        debug!(count = records.len(), "search complete");
        records
    }
}

/// Substitute result shown when a query could not be processed
pub fn error_result() -> Vec<ResultRecord> {
    vec![ResultRecord::new(
        ResultKind::Text,
        "Error",
        "Sorry, there was an error processing your request. Please try again.",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_within_window() {
        let service = SearchService::new(Duration::from_millis(1000), Duration::from_millis(2000));
        for _ in 0..100 {
            let latency = service.sample_latency();
            assert!(latency >= Duration::from_millis(1000));
            assert!(latency < Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_empty_window_uses_lower_bound() {
        let service = SearchService::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(service.sample_latency(), Duration::ZERO);
    }

    #[test]
    fn test_search_answers_after_delay() {
        let service = SearchService::new(Duration::from_millis(5), Duration::from_millis(10));
        let started = std::time::Instant::now();

        let records = tokio_test::block_on(service.search("forecast"));

        assert!(started.elapsed() >= Duration::from_millis(5));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_error_result_is_single_text_record() {
        let records = error_result();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ResultKind::Text);
        assert_eq!(records[0].title, "Error");
    }
}
