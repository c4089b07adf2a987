//! Per-conversation selection session.

use crate::config::PAGE_SIZE;
use crate::media::Rendition;
use thiserror::Error;

/// A pick could not be honoured
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// The index points past the visible page
    #[error("Format index {index} is out of range (page has {len} entries)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Entries on the page
        len: usize,
    },
}

/// Title plus the reachable renditions offered to one conversation.
///
/// The full list is stored; only the first [`PAGE_SIZE`] entries are ever
/// shown. Selecting does not mutate the session, so the same page can be
/// reopened with Back until a new URL replaces the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSession {
    title: String,
    reachable: Vec<Rendition>,
}

impl SelectionSession {
    /// Create a session over an ordered reachable list
    #[must_use]
    pub fn new(title: impl Into<String>, reachable: Vec<Rendition>) -> Self {
        Self {
            title: title.into(),
            reachable,
        }
    }

    /// Media title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Every reachable rendition, in ranking order
    #[must_use]
    pub fn reachable(&self) -> &[Rendition] {
        &self.reachable
    }

    /// The visible page: always the first `PAGE_SIZE` reachable renditions
    #[must_use]
    pub fn page(&self) -> &[Rendition] {
        let end = self.reachable.len().min(PAGE_SIZE);
        &self.reachable[..end]
    }

    /// Pick the rendition at `index` on the visible page.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`] if `index >= page().len()`.
    pub fn select(&self, index: usize) -> Result<&Rendition, SelectionError> {
        let page = self.page();
        page.get(index).ok_or(SelectionError::IndexOutOfRange {
            index,
            len: page.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rendition;

    fn session(count: u64) -> SelectionSession {
        let reachable = (0..count)
            .map(|i| rendition(&format!("r{i}"), 100 - i))
            .collect();
        SelectionSession::new("Talk", reachable)
    }

    #[test]
    fn test_page_is_capped_and_storage_is_not() {
        let session = session(8);
        assert_eq!(session.reachable().len(), 8);
        assert_eq!(session.page().len(), PAGE_SIZE);
        assert_eq!(session.page()[0].id, "r0");
        assert_eq!(session.page()[4].id, "r4");
    }

    #[test]
    fn test_page_is_idempotent() {
        let session = session(7);
        assert_eq!(session.page(), session.page());
    }

    #[test]
    fn test_short_list_page() {
        assert_eq!(session(2).page().len(), 2);
        assert!(session(0).page().is_empty());
    }

    #[test]
    fn test_select_in_and_out_of_range() {
        let session = session(7);
        assert_eq!(session.select(2).map(|r| r.id.as_str()), Ok("r2"));
        // r5 exists in storage but is not on the page
        assert_eq!(
            session.select(5),
            Err(SelectionError::IndexOutOfRange { index: 5, len: 5 })
        );
        assert_eq!(
            SelectionSession::new("t", Vec::new()).select(0),
            Err(SelectionError::IndexOutOfRange { index: 0, len: 0 })
        );
    }
}
