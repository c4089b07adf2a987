//! Testing helpers and mock utilities.
//!
//! Provides builders for raw metadata and renditions, a recording sleeper
//! and convenient constructors for mocked probers.

use crate::media::{RawFormat, RawMedia, Rendition};
use crate::probe::{MockReachabilityProber, ProbeStatus};
use crate::retry::Sleeper;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Raw format `id` with an mp4 container, a note and a CDN link.
#[must_use]
pub fn raw_format(id: &str, size_bytes: Option<u64>) -> RawFormat {
    RawFormat {
        format_id: id.to_string(),
        container: "mp4".to_string(),
        note: Some(format!("q{id}")),
        size_bytes,
        url: format!("https://cdn.example/{id}"),
    }
}

/// Raw media with the given title and formats.
#[must_use]
pub fn raw_media(title: &str, formats: Vec<RawFormat>) -> RawMedia {
    RawMedia {
        title: title.to_string(),
        formats,
    }
}

/// Rendition `id` of `size_bytes` bytes.
#[must_use]
pub fn rendition(id: &str, size_bytes: u64) -> Rendition {
    Rendition {
        id: id.to_string(),
        label: format!("mp4 - q{id}"),
        size_bytes,
        url: format!("https://cdn.example/{id}"),
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Delays requested so far
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}

/// Create a mock prober that reports every URL as reachable (200).
#[must_use]
pub fn mock_prober_all_reachable() -> MockReachabilityProber {
    let mut mock = MockReachabilityProber::new();
    mock.expect_probe()
        .returning(|_| ProbeStatus::from_status(200));
    mock
}

/// Create a mock prober where the listed URLs answer 404 and the rest 200.
#[must_use]
pub fn mock_prober_dead_urls(dead: &[&str]) -> MockReachabilityProber {
    let dead: HashSet<String> = dead.iter().map(|url| (*url).to_string()).collect();
    let mut mock = MockReachabilityProber::new();
    mock.expect_probe().returning(move |url| {
        if dead.contains(url) {
            ProbeStatus::from_status(404)
        } else {
            ProbeStatus::from_status(200)
        }
    });
    mock
}
