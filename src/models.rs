//! Data models shared across the scraper, engine, and notifier.
//!
//! This module defines the core data structures used throughout the
//! application:
//! - [`Item`]: a single scraped link (news entry, editorial, or article)
//! - [`Section`]: the two front-page sections the watcher tracks
//!
//! Items are identified by URL; the title is display-only payload for the
//! notification embed.

use std::fmt;

/// A single scraped link from the current-affairs page.
///
/// Produced by the scrapers and immutable once created. The `url` is the
/// identity used for deduplication; two items with the same URL are the
/// same item regardless of title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// The link text, as displayed on the page.
    pub title: String,
    /// The link target. Unique identifier for deduplication.
    pub url: String,
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// The two tracked sections of the front page.
///
/// Each section has its own history log and its own display name in
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// The "Daily Current Affairs" list.
    News,
    /// The "Important Editorials" list.
    Editorials,
}

impl Section {
    /// Display name used in notification text.
    pub fn label(&self) -> &'static str {
        match self {
            Section::News => "Daily Current Affairs",
            Section::Editorials => "Important Editorial",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
