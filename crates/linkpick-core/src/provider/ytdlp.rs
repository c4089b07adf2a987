//! YT-DLP Provider - media metadata via the yt-dlp command line
//!
//! Runs `yt-dlp --dump-single-json` as a child process and maps its JSON
//! output onto [`RawMedia`]. Nothing is downloaded.

use super::{ExtractionProvider, ProviderError};
use crate::config::ResolverSettings;
use crate::media::{RawFormat, RawMedia};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Lowercase stderr fragments that identify a network-layer failure
const NETWORK_ERROR_PATTERNS: &[&str] = &[
    "connection reset",
    "connection refused",
    "timed out",
    "unable to download webpage",
    "unable to download api page",
    "network is unreachable",
    "network unreachable",
    "temporary failure in name resolution",
    "name or service not known",
    "getaddrinfo failed",
    "http error 503",
];

/// Upper bound on how much stderr is kept in an error message
const MAX_STDERR_LENGTH: usize = 500;

/// Check if yt-dlp stderr describes a network failure
fn is_network_error(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    NETWORK_ERROR_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Provider backed by a local yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtdlpProvider {
    binary: String,
    timeout: Duration,
}

impl YtdlpProvider {
    /// Create a provider for the given binary and per-query timeout
    #[must_use]
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Create a provider from resolver settings
    #[must_use]
    pub fn from_settings(settings: &ResolverSettings) -> Self {
        Self::new(settings.ytdlp_path.clone(), settings.extraction_timeout())
    }

    /// Report the installed yt-dlp version.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary is missing, hangs or exits non-zero.
    pub async fn version(&self) -> Result<String, ProviderError> {
        let stdout = self.run(&["--version"]).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    fn metadata_args(url: &str) -> [&str; 7] {
        [
            "--dump-single-json",
            "--no-playlist",
            "--no-warnings",
            "--no-check-certificates",
            "-f",
            "best",
            url,
        ]
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, ProviderError> {
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProviderError::Io(format!("Failed to start {}: {e}", self.binary)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| ProviderError::Io(format!("Failed to read {} output: {e}", self.binary)))?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = crate::utils::truncate_str(stderr.trim(), MAX_STDERR_LENGTH);
        if is_network_error(&stderr) {
            Err(ProviderError::Network(message))
        } else {
            Err(ProviderError::Provider(message))
        }
    }
}

#[async_trait]
impl ExtractionProvider for YtdlpProvider {
    async fn query(&self, url: &str) -> Result<RawMedia, ProviderError> {
        debug!(url = %url, "Querying yt-dlp for format metadata");
        let stdout = self.run(&Self::metadata_args(url)).await.inspect_err(|e| {
            warn!(url = %url, error = %e, "yt-dlp query failed");
        })?;
        parse_metadata(&stdout)
    }
}

/// Parse `--dump-single-json` output.
///
/// Entries without a direct `url` are skipped. When the document has no
/// `formats` array, the top-level object is taken as the only format.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] if the output is not a JSON object.
pub fn parse_metadata(stdout: &[u8]) -> Result<RawMedia, ProviderError> {
    let json: Value = serde_json::from_slice(stdout)
        .map_err(|e| ProviderError::Parse(format!("Invalid yt-dlp JSON: {e}")))?;
    if !json.is_object() {
        return Err(ProviderError::Parse("yt-dlp output is not an object".to_string()));
    }

    let title = json["title"].as_str().unwrap_or_default().to_string();
    let formats = match json["formats"].as_array() {
        Some(entries) => entries.iter().filter_map(parse_format).collect(),
        None => parse_format(&json).into_iter().collect(),
    };

    Ok(RawMedia { title, formats })
}

fn parse_format(entry: &Value) -> Option<RawFormat> {
    let url = entry["url"].as_str()?.to_string();
    Some(RawFormat {
        format_id: entry["format_id"].as_str().unwrap_or_default().to_string(),
        container: entry["ext"].as_str().unwrap_or("unknown").to_string(),
        note: entry["format_note"].as_str().map(str::to_string),
        size_bytes: entry["filesize"].as_u64(),
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_maps_fields() -> Result<(), ProviderError> {
        let stdout = br#"{
            "title": "Talk",
            "formats": [
                {"format_id": "18", "ext": "mp4", "format_note": "360p", "filesize": 1048576, "url": "https://cdn/18"},
                {"format_id": "140", "ext": "m4a", "filesize": null, "url": "https://cdn/140"},
                {"format_id": "sb0", "ext": "mhtml", "format_note": "storyboard"}
            ]
        }"#;

        let media = parse_metadata(stdout)?;
        assert_eq!(media.title, "Talk");
        assert_eq!(media.formats.len(), 2);
        assert_eq!(media.formats[0].note.as_deref(), Some("360p"));
        assert_eq!(media.formats[0].size_bytes, Some(1_048_576));
        assert_eq!(media.formats[1].size_bytes, None);
        assert_eq!(media.formats[1].note, None);
        Ok(())
    }

    #[test]
    fn test_parse_metadata_single_format_document() -> Result<(), ProviderError> {
        let stdout = br#"{"title": "Clip", "format_id": "0", "ext": "mp4", "filesize": 42, "url": "https://cdn/clip.mp4"}"#;
        let media = parse_metadata(stdout)?;
        assert_eq!(media.formats.len(), 1);
        assert_eq!(media.formats[0].url, "https://cdn/clip.mp4");
        Ok(())
    }

    #[test]
    fn test_parse_metadata_rejects_garbage() {
        assert!(matches!(parse_metadata(b"not json"), Err(ProviderError::Parse(_))));
        assert!(matches!(parse_metadata(b"[1, 2]"), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_network_error_classification() {
        assert!(is_network_error(
            "ERROR: [generic] Unable to download webpage: <urlopen error [Errno -3] Temporary failure in name resolution>"
        ));
        assert!(!is_network_error("ERROR: Unsupported URL: https://example.com"));
    }

    #[test]
    fn test_network_error_classification_ignores_case() {
        assert!(is_network_error(
            "ERROR: [youtube] abc: <urlopen error [Errno 101] Network is unreachable>"
        ));
        assert!(is_network_error(
            "ERROR: [youtube] abc: Unable to download API page: The read operation timed out"
        ));
        assert!(is_network_error("ERROR: HTTP Error 503: Service Unavailable"));
        assert!(!is_network_error(
            "ERROR: [youtube] abc: Video unavailable. This video is private"
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let provider = YtdlpProvider::new("/nonexistent/yt-dlp-binary", Duration::from_secs(1));
        let result = provider.query("https://example.com/watch").await;
        assert!(matches!(result, Err(ProviderError::Io(_))));
    }
}
