//! Persisted announcement history.
//!
//! The watcher keeps three bounded logs of URLs it has already announced:
//! one for Daily Current Affairs items, one for Important Editorials, and
//! one for date pages whose "News of the Day" batch has been sent. The
//! logs are persisted as a single human-readable JSON object so that a
//! re-run (typically from cron or CI) does not re-announce the same links.
//!
//! # File format
//!
//! ```json
//! {
//!   "news": ["https://...", "https://..."],
//!   "editorials": ["https://..."],
//!   "news_articles": ["https://..."]
//! }
//! ```
//!
//! Every key is optional on load, so files written by older versions (which
//! lacked `news_articles`) deserialize cleanly.
//!
//! # Bounding
//!
//! Each log holds at most [`MAX_LOG_ENTRIES`] URLs. Appending beyond the
//! cap drops the oldest entries first, so the logs always hold the most
//! recently announced URLs. Order within a log is announcement order.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::{info, warn};

use crate::models::Section;

/// Maximum number of URLs retained per log.
pub const MAX_LOG_ENTRIES: usize = 50;

/// The three announcement logs, as persisted on disk.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// URLs of announced Daily Current Affairs items.
    #[serde(default)]
    pub news: Vec<String>,
    /// URLs of announced Important Editorial items.
    #[serde(default)]
    pub editorials: Vec<String>,
    /// URLs of date pages whose News of the Day batch has been announced.
    #[serde(default)]
    pub news_articles: Vec<String>,
}

impl History {
    /// Load history from `path`.
    ///
    /// Never fails the caller: a missing, unreadable, or corrupt file is
    /// logged and recovered to an empty history. Per-key absence is handled
    /// by the serde defaults.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No history file yet; starting empty");
                return History::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read history; starting empty");
                return History::default();
            }
        };

        match serde_json::from_str(&data) {
            Ok(history) => history,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not parse history; starting empty");
                History::default()
            }
        }
    }

    /// Persist the history as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        info!(
            news = self.news.len(),
            editorials = self.editorials.len(),
            news_articles = self.news_articles.len(),
            path = %path.display(),
            "History saved"
        );
        Ok(())
    }

    /// Has `url` already been announced for `section`?
    pub fn seen(&self, section: Section, url: &str) -> bool {
        self.log(section).iter().any(|u| u == url)
    }

    /// Record an announced URL for `section`, evicting the oldest entries
    /// beyond the cap.
    pub fn record(&mut self, section: Section, url: &str) {
        push_bounded(self.log_mut(section), url);
    }

    /// Has the News of the Day batch for this date page been announced?
    pub fn seen_derived(&self, url: &str) -> bool {
        self.news_articles.iter().any(|u| u == url)
    }

    /// Record a date page whose batch has been announced.
    pub fn record_derived(&mut self, url: &str) {
        push_bounded(&mut self.news_articles, url);
    }

    fn log(&self, section: Section) -> &Vec<String> {
        match section {
            Section::News => &self.news,
            Section::Editorials => &self.editorials,
        }
    }

    fn log_mut(&mut self, section: Section) -> &mut Vec<String> {
        match section {
            Section::News => &mut self.news,
            Section::Editorials => &mut self.editorials,
        }
    }
}

/// Append to a log, dropping the oldest entries once the cap is exceeded.
fn push_bounded(log: &mut Vec<String>, url: &str) {
    log.push(url.to_string());
    if log.len() > MAX_LOG_ENTRIES {
        let excess = log.len() - MAX_LOG_ENTRIES;
        log.drain(..excess);
    }
}
