//! Change detection and deduplication.
//!
//! This module decides which scraped items get announced, in what order,
//! and how the announcement history is updated. Everything with a policy
//! in it lives here; fetching, parsing, and delivery sit behind the
//! [`Notifier`] and [`DatePageSource`] seams so the policies can be tested
//! without a network.
//!
//! # Announcement policy
//!
//! Scrapers return items most-recent-first. Per section only the first
//! [`RECENT_WINDOW`] items are considered; anything deeper is presumed
//! already seen or irrelevant by position. Candidates are then visited
//! oldest-to-newest so that when several items are new, the notification
//! stream reads in chronological order.
//!
//! For each candidate: a URL already in the section's history log is
//! skipped, a successful delivery appends the URL to the log (bounded,
//! oldest evicted first), and a failed delivery leaves the log untouched
//! so the item is retried on the next run. One failed delivery never
//! blocks later candidates.
//!
//! # News of the Day
//!
//! The chronologically earliest news item announced in a run anchors the
//! derived batch: its date page is fetched and its article list announced
//! as one consolidated notification, at most once per date page (tracked
//! in its own history log).

use crate::history::History;
use crate::models::{Item, Section};
use crate::utils::truncate_for_log;
use std::error::Error;
use tracing::{info, instrument, warn};

/// Number of most-recent items considered per section.
pub const RECENT_WINDOW: usize = 5;

/// Outbound notification delivery.
///
/// Implementors deliver one message per item or one consolidated message
/// per date-page batch. Formatting and transport are the implementor's
/// concern; the engine only cares whether delivery succeeded.
pub trait Notifier {
    /// Announce a single item under its section.
    async fn notify(&self, title: &str, url: &str, section: Section)
    -> Result<(), Box<dyn Error>>;

    /// Announce a date page's article list as one consolidated message.
    async fn notify_batch(
        &self,
        date_title: &str,
        articles: &[Item],
        source_url: &str,
    ) -> Result<(), Box<dyn Error>>;
}

/// Access to per-date article lists.
///
/// Infallible by contract: implementors degrade any fetch or parse
/// failure to an empty list.
pub trait DatePageSource {
    async fn date_articles(&self, url: &str) -> Vec<Item>;
}

/// Take the `n` most recent items and yield them oldest first.
///
/// Scrape order is most-recent-first, so this is "first `n`, reversed".
/// Fewer than `n` items means all of them, same rule.
pub fn select_recent_window_oldest_first(items: &[Item], n: usize) -> impl Iterator<Item = &Item> {
    items[..items.len().min(n)].iter().rev()
}

/// What one section pass produced.
#[derive(Debug, Default)]
struct SectionReport {
    /// Number of successfully delivered announcements.
    announced: usize,
    /// The first item announced in the oldest-first scan, i.e. the
    /// chronologically earliest new item.
    first_new: Option<Item>,
}

/// The deduplication engine.
///
/// Holds the run's mutable history plus the two collaborator seams.
/// One engine instance corresponds to one run; [`DedupEngine::run`] is
/// not re-entrant.
pub struct DedupEngine<'a, N, D> {
    notifier: &'a N,
    date_pages: &'a D,
    history: &'a mut History,
}

impl<'a, N, D> DedupEngine<'a, N, D>
where
    N: Notifier,
    D: DatePageSource,
{
    pub fn new(notifier: &'a N, date_pages: &'a D, history: &'a mut History) -> Self {
        Self {
            notifier,
            date_pages,
            history,
        }
    }

    /// Process both sections and the derived News of the Day batch.
    ///
    /// Returns `true` if at least one notification (item or batch) was
    /// delivered; the caller uses this to gate persistence.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&mut self, news: &[Item], editorials: &[Item]) -> bool {
        let news_report = self.process_section(Section::News, news).await;
        let editorials_report = self.process_section(Section::Editorials, editorials).await;

        let mut new_items_found = news_report.announced > 0 || editorials_report.announced > 0;

        if let Some(anchor) = news_report.first_new {
            if self.announce_news_of_the_day(&anchor).await {
                new_items_found = true;
            }
        }

        new_items_found
    }

    /// Announce the new items of one section, oldest first.
    async fn process_section(&mut self, section: Section, items: &[Item]) -> SectionReport {
        let mut report = SectionReport::default();

        for item in select_recent_window_oldest_first(items, RECENT_WINDOW) {
            if self.history.seen(section, &item.url) {
                info!(
                    %section,
                    title = %truncate_for_log(&item.title, 50),
                    "Already notified"
                );
                continue;
            }

            match self.notifier.notify(&item.title, &item.url, section).await {
                Ok(()) => {
                    self.history.record(section, &item.url);
                    report.announced += 1;
                    if report.first_new.is_none() {
                        report.first_new = Some(item.clone());
                    }
                }
                Err(e) => {
                    // Not recorded, so the item is retried next run.
                    warn!(%section, url = %item.url, error = %e, "Delivery failed");
                }
            }
        }

        info!(
            %section,
            announced = report.announced,
            considered = items.len().min(RECENT_WINDOW),
            "Section processed"
        );
        report
    }

    /// Announce the anchor date page's article list, at most once per page.
    async fn announce_news_of_the_day(&mut self, anchor: &Item) -> bool {
        if self.history.seen_derived(&anchor.url) {
            info!(
                title = %truncate_for_log(&anchor.title, 50),
                "News of the Day already sent for this date"
            );
            return false;
        }

        let articles = self.date_pages.date_articles(&anchor.url).await;
        if articles.is_empty() {
            info!(url = %anchor.url, "No News of the Day articles found");
            return false;
        }

        match self
            .notifier
            .notify_batch(&anchor.title, &articles, &anchor.url)
            .await
        {
            Ok(()) => {
                self.history.record_derived(&anchor.url);
                info!(count = articles.len(), "News of the Day batch sent");
                true
            }
            Err(e) => {
                warn!(url = %anchor.url, error = %e, "News of the Day delivery failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(Section, String)>>,
        batches: Mutex<Vec<(String, usize, String)>>,
        fail_urls: HashSet<String>,
        fail_batches: bool,
    }

    impl RecordingNotifier {
        fn failing_on(urls: &[&str]) -> Self {
            Self {
                fail_urls: urls.iter().map(|u| u.to_string()).collect(),
                ..Self::default()
            }
        }

        fn sent_urls(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(_, url)| url.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            _title: &str,
            url: &str,
            section: Section,
        ) -> Result<(), Box<dyn Error>> {
            if self.fail_urls.contains(url) {
                return Err("delivery refused".into());
            }
            self.sent.lock().unwrap().push((section, url.to_string()));
            Ok(())
        }

        async fn notify_batch(
            &self,
            date_title: &str,
            articles: &[Item],
            source_url: &str,
        ) -> Result<(), Box<dyn Error>> {
            if self.fail_batches {
                return Err("delivery refused".into());
            }
            self.batches.lock().unwrap().push((
                date_title.to_string(),
                articles.len(),
                source_url.to_string(),
            ));
            Ok(())
        }
    }

    struct StubDatePages {
        articles: Vec<Item>,
        requested: Mutex<Vec<String>>,
    }

    impl StubDatePages {
        fn with(articles: Vec<Item>) -> Self {
            Self {
                articles,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self::with(Vec::new())
        }
    }

    impl DatePageSource for StubDatePages {
        async fn date_articles(&self, url: &str) -> Vec<Item> {
            self.requested.lock().unwrap().push(url.to_string());
            self.articles.clone()
        }
    }

    fn items(urls: &[&str]) -> Vec<Item> {
        urls.iter()
            .map(|u| Item::new(format!("title for {u}"), *u))
            .collect()
    }

    #[test]
    fn test_window_yields_oldest_first() {
        let all = items(&["u1", "u2", "u3", "u4", "u5", "u6", "u7"]);
        let selected: Vec<&str> = select_recent_window_oldest_first(&all, 5)
            .map(|i| i.url.as_str())
            .collect();
        assert_eq!(selected, vec!["u5", "u4", "u3", "u2", "u1"]);
    }

    #[test]
    fn test_window_with_fewer_items_takes_all() {
        let all = items(&["u1", "u2"]);
        let selected: Vec<&str> = select_recent_window_oldest_first(&all, 5)
            .map(|i| i.url.as_str())
            .collect();
        assert_eq!(selected, vec!["u2", "u1"]);
    }

    #[test]
    fn test_window_empty() {
        let all: Vec<Item> = Vec::new();
        assert_eq!(select_recent_window_oldest_first(&all, 5).count(), 0);
    }

    #[tokio::test]
    async fn test_fresh_history_announces_oldest_first() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1", "u2"]), &[])
            .await;

        assert!(announced);
        assert_eq!(notifier.sent_urls(), vec!["u2", "u1"]);
        assert_eq!(history.news, vec!["u2", "u1"]);
        assert!(history.editorials.is_empty());
    }

    #[tokio::test]
    async fn test_never_reannounces_seen_urls() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();
        for url in ["u1", "u2", "u3"] {
            history.record(Section::News, url);
        }

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1", "u2", "u3"]), &[])
            .await;

        assert!(!announced);
        assert!(notifier.sent_urls().is_empty());
        // No anchor, so the date page is never consulted.
        assert!(pages.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_identical_run_is_silent() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();
        let news = items(&["u1", "u2"]);
        let editorials = items(&["e1"]);

        let first = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&news, &editorials)
            .await;
        let second = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&news, &editorials)
            .await;

        assert!(first);
        assert!(!second);
        assert_eq!(notifier.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_only_unseen_item_is_announced() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();
        history.record(Section::News, "u1");

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1", "u2"]), &[])
            .await;

        assert!(announced);
        assert_eq!(notifier.sent_urls(), vec!["u2"]);
        assert_eq!(history.news, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_mixed_positions_announced_chronologically() {
        // Positions 1 and 3 (0-indexed, most-recent-first) are new; the
        // chronologically earlier position 3 must go out first.
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();
        for url in ["u0", "u2", "u4"] {
            history.record(Section::News, url);
        }

        DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u0", "u1", "u2", "u3", "u4"]), &[])
            .await;

        assert_eq!(notifier.sent_urls(), vec!["u3", "u1"]);
    }

    #[tokio::test]
    async fn test_items_beyond_window_are_ignored() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();

        DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1", "u2", "u3", "u4", "u5", "u6", "u7"]), &[])
            .await;

        assert_eq!(notifier.sent_urls(), vec!["u5", "u4", "u3", "u2", "u1"]);
        assert!(!history.seen(Section::News, "u6"));
        assert!(!history.seen(Section::News, "u7"));
    }

    #[tokio::test]
    async fn test_delivery_failure_skips_recording_and_continues() {
        let notifier = RecordingNotifier::failing_on(&["u2"]);
        let pages = StubDatePages::empty();
        let mut history = History::default();

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1", "u2", "u3"]), &[])
            .await;

        assert!(announced);
        // u2 failed but u1 (processed after it) still went out.
        assert_eq!(notifier.sent_urls(), vec!["u3", "u1"]);
        assert_eq!(history.news, vec!["u3", "u1"]);
        assert!(!history.seen(Section::News, "u2"));
    }

    #[tokio::test]
    async fn test_sections_are_independent() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();
        history.record(Section::News, "shared");

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&[], &items(&["shared"]))
            .await;

        // The news log does not suppress an editorial with the same URL.
        assert!(announced);
        assert_eq!(history.editorials, vec!["shared"]);
    }

    #[tokio::test]
    async fn test_batch_anchored_to_earliest_new_news_item() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::with(items(&["a1", "a2"]));
        let mut history = History::default();

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1", "u2", "u3"]), &[])
            .await;

        assert!(announced);
        // u3 is the chronologically earliest new item, so its page anchors
        // the batch.
        assert_eq!(*pages.requested.lock().unwrap(), vec!["u3"]);
        let batches = notifier.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].1, 2);
        assert_eq!(batches[0].2, "u3");
        assert_eq!(history.news_articles, vec!["u3"]);
    }

    #[tokio::test]
    async fn test_batch_suppressed_by_derived_log() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::with(items(&["a1"]));
        let mut history = History::default();
        history.record_derived("u1");

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1"]), &[])
            .await;

        // The item itself is still new and announced, but the batch is not
        // re-sent and the date page is not even fetched.
        assert!(announced);
        assert!(pages.requested.lock().unwrap().is_empty());
        assert!(notifier.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_date_page_sends_and_records_nothing() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();

        DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1"]), &[])
            .await;

        assert!(notifier.batches.lock().unwrap().is_empty());
        assert!(history.news_articles.is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_leaves_derived_log_untouched() {
        let notifier = RecordingNotifier {
            fail_batches: true,
            ..RecordingNotifier::default()
        };
        let pages = StubDatePages::with(items(&["a1"]));
        let mut history = History::default();

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&items(&["u1"]), &[])
            .await;

        // The item announcement alone still counts as new.
        assert!(announced);
        assert!(history.news_articles.is_empty());
    }

    #[tokio::test]
    async fn test_editorials_never_anchor_a_batch() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::with(items(&["a1"]));
        let mut history = History::default();

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&[], &items(&["e1"]))
            .await;

        assert!(announced);
        assert!(pages.requested.lock().unwrap().is_empty());
        assert!(notifier.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_scrape_announces_nothing() {
        let notifier = RecordingNotifier::default();
        let pages = StubDatePages::empty();
        let mut history = History::default();

        let announced = DedupEngine::new(&notifier, &pages, &mut history)
            .run(&[], &[])
            .await;

        assert!(!announced);
        assert!(notifier.sent_urls().is_empty());
    }
}
