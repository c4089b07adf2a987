//! Liveness filtering
//!
//! Probes every rendition concurrently and keeps the reachable ones in
//! their input order. Individual probe failures are logged and dropped;
//! they never surface as errors.

use crate::config::ResolverSettings;
use crate::media::Rendition;
use crate::probe::ReachabilityProber;
use crate::utils::short_url;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Concurrent reachability filter over a rendition list
#[derive(Clone)]
pub struct LivenessFilter {
    prober: Arc<dyn ReachabilityProber>,
    concurrency: usize,
}

impl LivenessFilter {
    /// Create a filter running at most `concurrency` probes at once (minimum 1)
    #[must_use]
    pub fn new(prober: Arc<dyn ReachabilityProber>, concurrency: usize) -> Self {
        Self {
            prober,
            concurrency: concurrency.max(1),
        }
    }

    /// Create a filter using the probe concurrency from `settings`
    #[must_use]
    pub fn from_settings(prober: Arc<dyn ReachabilityProber>, settings: &ResolverSettings) -> Self {
        Self::new(prober, settings.probe_concurrency)
    }

    /// Keep only renditions whose link answers, preserving input order.
    ///
    /// Returns an empty list when the input is empty or nothing survives.
    pub async fn filter_reachable(&self, renditions: Vec<Rendition>) -> Vec<Rendition> {
        if renditions.is_empty() {
            return renditions;
        }

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut probes = JoinSet::new();
        for (index, rendition) in renditions.iter().enumerate() {
            let prober = Arc::clone(&self.prober);
            let permits = Arc::clone(&permits);
            let url = rendition.url.clone();
            probes.spawn(async move {
                // A closed semaphore only means "no limit"
                let _permit = permits.acquire_owned().await.ok();
                (index, prober.probe(&url).await)
            });
        }

        let mut alive = vec![false; renditions.len()];
        while let Some(joined) = probes.join_next().await {
            let (index, status) = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Liveness probe task failed: {e}");
                    continue;
                }
            };
            let Some(rendition) = renditions.get(index) else {
                continue;
            };
            if status.reachable {
                if let Some(slot) = alive.get_mut(index) {
                    *slot = true;
                }
            } else {
                warn!(
                    format_id = %rendition.id,
                    status = ?status.status,
                    url = %short_url(&rendition.url),
                    "Format is unavailable"
                );
            }
        }

        let total = renditions.len();
        let survivors: Vec<Rendition> = renditions
            .into_iter()
            .zip(alive)
            .filter_map(|(rendition, reachable)| reachable.then_some(rendition))
            .collect();
        debug!(total, reachable = survivors.len(), "Liveness filtering finished");
        survivors
    }

    /// Probe a single rendition right before handing out its link
    pub async fn is_reachable(&self, rendition: &Rendition) -> bool {
        let status = self.prober.probe(&rendition.url).await;
        if !status.reachable {
            warn!(
                format_id = %rendition.id,
                status = ?status.status,
                "Selected format is no longer reachable"
            );
        }
        status.reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{MockReachabilityProber, ProbeStatus};
    use crate::testing::{mock_prober_all_reachable, mock_prober_dead_urls, rendition};
    use async_trait::async_trait;
    use std::time::Duration;

    fn ids(renditions: &[Rendition]) -> Vec<&str> {
        renditions.iter().map(|r| r.id.as_str()).collect()
    }

    /// Answers later for earlier links, so completions arrive in reverse
    struct ReverseDelayProber {
        count: u64,
        dead: Vec<u64>,
    }

    #[async_trait]
    impl ReachabilityProber for ReverseDelayProber {
        async fn probe(&self, url: &str) -> ProbeStatus {
            let index: u64 = url
                .rsplit('/')
                .next()
                .and_then(|tail| tail.parse().ok())
                .unwrap_or_default();
            let delay = self.count.saturating_sub(index) * 10;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if self.dead.contains(&index) {
                ProbeStatus::from_status(404)
            } else {
                ProbeStatus::from_status(200)
            }
        }
    }

    #[tokio::test]
    async fn test_survivors_keep_input_order_when_late_links_answer_first() {
        let count = 6;
        let prober = ReverseDelayProber {
            count,
            dead: vec![1, 4],
        };
        let filter = LivenessFilter::new(Arc::new(prober), 6);
        let input: Vec<Rendition> = (0..count)
            .map(|index| rendition(&index.to_string(), 100 - index))
            .collect();

        let survivors = filter.filter_reachable(input).await;
        assert_eq!(ids(&survivors), vec!["0", "2", "3", "5"]);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_probes() {
        let mut prober = MockReachabilityProber::new();
        prober.expect_probe().never();
        let filter = LivenessFilter::new(Arc::new(prober), 4);

        assert!(filter.filter_reachable(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_dead_links_are_dropped_in_order() {
        let prober = mock_prober_dead_urls(&["https://cdn.example/b", "https://cdn.example/d"]);
        let filter = LivenessFilter::new(Arc::new(prober), 2);
        let input = vec![
            rendition("a", 50),
            rendition("b", 40),
            rendition("c", 30),
            rendition("d", 20),
            rendition("e", 10),
        ];

        let survivors = filter.filter_reachable(input).await;
        assert_eq!(ids(&survivors), vec!["a", "c", "e"]);
    }

    #[tokio::test]
    async fn test_everything_dead_yields_empty() {
        let mut prober = MockReachabilityProber::new();
        prober
            .expect_probe()
            .times(3)
            .returning(|_| ProbeStatus::unreachable());
        let filter = LivenessFilter::new(Arc::new(prober), 8);

        let survivors = filter
            .filter_reachable(vec![rendition("a", 3), rendition("b", 2), rendition("c", 1)])
            .await;
        assert!(survivors.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_probes() {
        let filter = LivenessFilter::new(Arc::new(mock_prober_all_reachable()), 0);
        let survivors = filter.filter_reachable(vec![rendition("a", 1)]).await;
        assert_eq!(ids(&survivors), vec!["a"]);
    }

    #[tokio::test]
    async fn test_single_recheck() {
        let filter = LivenessFilter::new(
            Arc::new(mock_prober_dead_urls(&["https://cdn.example/gone"])),
            1,
        );
        assert!(filter.is_reachable(&rendition("here", 1)).await);
        assert!(!filter.is_reachable(&rendition("gone", 1)).await);
    }
}
