//! Format resolution: URL in, ranked renditions out.

use crate::config::ResolverSettings;
use crate::media::ResolvedMedia;
use crate::provider::{ExtractionProvider, ProviderError};
use crate::retry::{Exhausted, RetryPolicy, Sleeper, TokioSleeper};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Resolution failed after every attempt
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The provider kept failing for non-network reasons
    #[error("Extraction failed after {attempts} attempt(s): {cause}")]
    Extraction {
        /// Attempts made
        attempts: u32,
        /// Last attempt's failure
        cause: ProviderError,
    },
    /// The last attempt failed at the network layer
    #[error("Network unavailable after {attempts} attempt(s): {cause}")]
    NetworkUnavailable {
        /// Attempts made
        attempts: u32,
        /// Last attempt's failure
        cause: ProviderError,
    },
}

impl From<Exhausted<ProviderError>> for ResolveError {
    fn from(exhausted: Exhausted<ProviderError>) -> Self {
        let Exhausted {
            attempts,
            last_error: cause,
        } = exhausted;
        if cause.is_network() {
            Self::NetworkUnavailable { attempts, cause }
        } else {
            Self::Extraction { attempts, cause }
        }
    }
}

/// Queries the extraction provider with bounded retries.
///
/// No caching: every call is a fresh provider query.
#[derive(Clone)]
pub struct FormatResolver {
    provider: Arc<dyn ExtractionProvider>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl FormatResolver {
    /// Create a resolver that waits on the tokio timer between attempts
    #[must_use]
    pub fn new(provider: Arc<dyn ExtractionProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Create a resolver using the retry settings from `settings`
    #[must_use]
    pub fn from_settings(provider: Arc<dyn ExtractionProvider>, settings: &ResolverSettings) -> Self {
        Self::new(
            provider,
            RetryPolicy::new(settings.max_attempts, settings.retry_delay()),
        )
    }

    /// Replace the sleeper used between attempts
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Resolve `url` into its title and size-ranked renditions.
    ///
    /// Formats without a known size are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] once every attempt has failed; the variant
    /// follows the last attempt's failure.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedMedia, ResolveError> {
        let raw = self
            .policy
            .run(self.sleeper.as_ref(), |_attempt| self.provider.query(url))
            .await
            .map_err(|exhausted| {
                error!(
                    attempts = exhausted.attempts,
                    "Format resolution failed: {}", exhausted.last_error
                );
                ResolveError::from(exhausted)
            })?;

        let media = ResolvedMedia::from_raw(&raw);
        info!(
            title = %media.title(),
            offered = raw.formats.len(),
            sized = media.renditions().len(),
            "Resolved formats"
        );
        Ok(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockExtractionProvider;
    use crate::testing::{raw_format, raw_media, RecordingSleeper};
    use std::time::Duration;

    fn resolver(provider: MockExtractionProvider, sleeper: Arc<RecordingSleeper>) -> FormatResolver {
        FormatResolver::new(Arc::new(provider), RetryPolicy::new(3, Duration::from_secs(2)))
            .with_sleeper(sleeper)
    }

    #[tokio::test]
    async fn test_resolve_ranks_and_filters() -> Result<(), ResolveError> {
        let mut provider = MockExtractionProvider::new();
        provider.expect_query().times(1).returning(|_| {
            Ok(raw_media(
                "Talk",
                vec![
                    raw_format("a", Some(10)),
                    raw_format("b", None),
                    raw_format("c", Some(30)),
                ],
            ))
        });
        let sleeper = Arc::new(RecordingSleeper::default());

        let media = resolver(provider, sleeper.clone()).resolve("https://v/1").await?;

        assert_eq!(media.title(), "Talk");
        let ids: Vec<&str> = media.renditions().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert!(sleeper.recorded().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_last_network_failure_maps_to_network_unavailable() {
        let mut provider = MockExtractionProvider::new();
        provider
            .expect_query()
            .times(3)
            .returning(|_| Err(ProviderError::Network("Connection reset".to_string())));
        let sleeper = Arc::new(RecordingSleeper::default());

        let result = resolver(provider, sleeper.clone()).resolve("https://v/1").await;

        assert!(matches!(
            result,
            Err(ResolveError::NetworkUnavailable { attempts: 3, .. })
        ));
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(2); 2]);
    }

    #[tokio::test]
    async fn test_last_provider_failure_maps_to_extraction() {
        let mut provider = MockExtractionProvider::new();
        provider
            .expect_query()
            .times(3)
            .returning(|_| Err(ProviderError::Provider("Unsupported URL".to_string())));

        let result = resolver(provider, Arc::new(RecordingSleeper::default()))
            .resolve("https://v/1")
            .await;

        assert_eq!(
            result,
            Err(ResolveError::Extraction {
                attempts: 3,
                cause: ProviderError::Provider("Unsupported URL".to_string()),
            })
        );
    }
}
