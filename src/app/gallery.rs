// SPDX-License-Identifier: GPL-3.0-only

//! Append-only gallery of photos

use std::sync::Arc;

/// Where a gallery entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Captured in this run
    Captured,
    /// Loaded from the photo store at startup
    Stored,
}

/// One displayed photo
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub key: String,
    pub origin: EntryOrigin,
    /// PNG payload
    pub image: Arc<[u8]>,
}

/// Gallery presenter
///
/// Entries are only ever appended: no dedup, no cap, no removal.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: GalleryEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The gallery surface is shown once it has an entry
    pub fn is_visible(&self) -> bool {
        !self.is_empty()
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&GalleryEntry> {
        self.entries.last()
    }
}
