//! Media data model
//!
//! Raw provider metadata on the way in, ranked renditions on the way out.

/// Title used when the provider does not report one
pub const FALLBACK_TITLE: &str = "Video";

/// Bytes in one displayed megabyte
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Size in mebibytes, for display
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn size_in_mb(size_bytes: u64) -> f64 {
    size_bytes as f64 / BYTES_PER_MB
}

/// One format entry exactly as the extraction provider reported it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawFormat {
    /// Provider-specific format identifier (e.g. "137")
    pub format_id: String,
    /// Container extension (mp4, webm, m4a)
    pub container: String,
    /// Quality note (e.g. "720p"), if any
    pub note: Option<String>,
    /// Exact size in bytes, if known
    pub size_bytes: Option<u64>,
    /// Direct media link
    pub url: String,
}

/// Metadata returned by one extraction query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawMedia {
    /// Media title
    pub title: String,
    /// All formats in provider order
    pub formats: Vec<RawFormat>,
}

/// One downloadable variant with a known size and a direct link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    /// Provider format identifier
    pub id: String,
    /// Human-readable label: `"<container> - <note>"`
    pub label: String,
    /// Size in bytes, always > 0
    pub size_bytes: u64,
    /// Direct media link
    pub url: String,
}

impl Rendition {
    /// Convert a raw format, dropping it when its size is unknown or zero.
    #[must_use]
    pub fn from_raw(raw: &RawFormat) -> Option<Self> {
        let size_bytes = raw.size_bytes.filter(|size| *size > 0)?;
        Some(Self {
            id: raw.format_id.clone(),
            label: build_label(&raw.container, raw.note.as_deref(), &raw.format_id),
            size_bytes,
            url: raw.url.clone(),
        })
    }
}

/// Build a rendition label.
///
/// A missing or blank note falls back to the format id, so the label stays
/// stable across queries for the same media.
///
/// # Examples
///
/// ```
/// use linkpick_core::media::build_label;
/// assert_eq!(build_label("mp4", Some("720p"), "22"), "mp4 - 720p");
/// assert_eq!(build_label("webm", None, "248"), "webm - 248");
/// ```
#[must_use]
pub fn build_label(container: &str, note: Option<&str>, format_id: &str) -> String {
    let note = note
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .unwrap_or(format_id);
    format!("{container} - {note}")
}

/// Title plus renditions ranked by size, largest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    title: String,
    renditions: Vec<Rendition>,
}

impl ResolvedMedia {
    /// Rank renditions descending by size; equal sizes keep their input order.
    #[must_use]
    pub fn new(title: impl Into<String>, mut renditions: Vec<Rendition>) -> Self {
        // sort_by is stable
        renditions.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
        Self {
            title: title.into(),
            renditions,
        }
    }

    /// Build from raw provider metadata, discarding formats without a size.
    #[must_use]
    pub fn from_raw(raw: &RawMedia) -> Self {
        let title = if raw.title.trim().is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            raw.title.clone()
        };
        Self::new(title, raw.formats.iter().filter_map(Rendition::from_raw).collect())
    }

    /// Media title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Renditions, largest first
    #[must_use]
    pub fn renditions(&self) -> &[Rendition] {
        &self.renditions
    }

    /// Split into title and ranked renditions
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Rendition>) {
        (self.title, self.renditions)
    }
}
