//! Extraction providers
//!
//! A provider turns a page URL into raw format metadata. The core treats it
//! as opaque: it only looks at the fields of [`RawMedia`].

/// yt-dlp subprocess provider
pub mod ytdlp;

pub use ytdlp::YtdlpProvider;

use crate::media::RawMedia;
use async_trait::async_trait;
use thiserror::Error;

/// Errors an extraction query can fail with
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network-layer failure while the provider talked to the media site
    #[error("Network error: {0}")]
    Network(String),
    /// The query did not finish in time
    #[error("Extraction timed out after {0}s")]
    Timeout(u64),
    /// The provider's output could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
    /// The provider reported a failure of its own (unsupported URL, private video, ...)
    #[error("Provider error: {0}")]
    Provider(String),
    /// The provider process could not be started or read
    #[error("IO error: {0}")]
    Io(String),
}

impl ProviderError {
    /// Whether the failure is attributable to the network layer
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Source of raw media metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Query metadata for `url` without downloading any media.
    async fn query(&self, url: &str) -> Result<RawMedia, ProviderError>;
}
