//! Drishti IAS current-affairs scraper.
//!
//! This module scrapes the [Drishti IAS](https://www.drishtiias.com)
//! current-affairs page, which publishes two link lists the watcher
//! tracks: "Daily Current Affairs" (one entry per date) and "Important
//! Editorials". Each daily entry links to a date page that carries a
//! consolidated "News of the day" article list.
//!
//! # Page structure
//!
//! The front page nests both lists inside collapsible boxes:
//!
//! - news: `div.daily-news-list` → `div.box-hide` → `ul` → `li a`
//! - editorials: the `p.editorials` heading, then `div.box-hide` → `ul`
//!   inside the heading's parent box
//!
//! Date pages list articles under `div.category.news` → `ul` → `li a`,
//! with hrefs that are usually site-relative (including `#anchor`
//! fragments), so they are resolved against the site base before use.

use crate::engine::DatePageSource;
use crate::models::Item;
use crate::scrapers::Parsed;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// The front page carrying both tracked sections.
pub const FRONT_PAGE_URL: &str =
    "https://www.drishtiias.com/current-affairs-news-analysis-editorials";

const SITE_BASE: &str = "https://www.drishtiias.com";

/// The site serves an empty shell to clients without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Timeout for page fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

static NEWS_SECTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.daily-news-list").unwrap());
static EDITORIAL_HEADER: Lazy<Selector> = Lazy::new(|| Selector::parse("p.editorials").unwrap());
static LIST_CONTAINER: Lazy<Selector> = Lazy::new(|| Selector::parse("div.box-hide").unwrap());
static LIST: Lazy<Selector> = Lazy::new(|| Selector::parse("ul").unwrap());
static LIST_LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("li a[href]").unwrap());
static DATE_NEWS_SECTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.category.news").unwrap());
static BASE: Lazy<Url> = Lazy::new(|| Url::parse(SITE_BASE).unwrap());

/// Build the HTTP client used for all page fetches.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
}

/// Fetch the current-affairs front page.
///
/// A failure here is fatal for the run; there is nothing to process
/// without the front page.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_front_page(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    info!(bytes = html.len(), "Fetched front page");
    Ok(html)
}

/// Fetch a per-date page for its "News of the day" list.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_date_page(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    info!(bytes = html.len(), "Fetched date page");
    Ok(html)
}

/// Parse the Daily Current Affairs list from the front page.
///
/// Returns the entries in page order, most recent first.
pub fn parse_news(html: &str) -> Parsed {
    let document = Html::parse_document(html);
    let Some(section) = document.select(&NEWS_SECTION).next() else {
        return Parsed::Missing("news section not found");
    };
    let Some(container) = section.select(&LIST_CONTAINER).next() else {
        return Parsed::Missing("news list container not found");
    };
    let Some(list) = container.select(&LIST).next() else {
        return Parsed::Missing("news list not found");
    };

    let items = collect_links(list);
    debug!(count = items.len(), "Parsed news links");
    Parsed::Items(items)
}

/// Parse the Important Editorials list from the front page.
///
/// The editorials list has no class of its own; it is located through the
/// `p.editorials` heading and the collapsible box the heading sits in.
pub fn parse_editorials(html: &str) -> Parsed {
    let document = Html::parse_document(html);
    let Some(header) = document.select(&EDITORIAL_HEADER).next() else {
        return Parsed::Missing("editorial header not found");
    };
    let Some(parent) = header.parent().and_then(ElementRef::wrap) else {
        return Parsed::Missing("editorial box not found");
    };
    let Some(container) = parent.select(&LIST_CONTAINER).next() else {
        return Parsed::Missing("editorial list container not found");
    };
    let Some(list) = container.select(&LIST).next() else {
        return Parsed::Missing("editorial list not found");
    };

    let items = collect_links(list);
    debug!(count = items.len(), "Parsed editorial links");
    Parsed::Items(items)
}

/// Parse the consolidated "News of the day" list from a date page.
///
/// Hrefs on date pages are site-relative anchor links; they are resolved
/// to absolute URLs here so the notifier can link them directly.
pub fn parse_date_articles(html: &str) -> Parsed {
    let document = Html::parse_document(html);
    let Some(section) = document.select(&DATE_NEWS_SECTION).next() else {
        return Parsed::Missing("news of the day section not found");
    };
    let Some(list) = section.select(&LIST).next() else {
        return Parsed::Missing("news of the day list not found");
    };

    let items = list
        .select(&LIST_LINKS)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let resolved = BASE.join(href).ok()?;
            Some(Item::new(link_text(a), resolved))
        })
        .collect::<Vec<_>>();
    debug!(count = items.len(), "Parsed news of the day links");
    Parsed::Items(items)
}

fn collect_links(list: ElementRef<'_>) -> Vec<Item> {
    list.select(&LIST_LINKS)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            Some(Item::new(link_text(a), href))
        })
        .collect()
}

/// Link text with whitespace collapsed, the way it displays on the page.
fn link_text(a: ElementRef<'_>) -> String {
    a.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`DatePageSource`] backed by live fetches of the site's date pages.
///
/// Degrades every failure to an empty list: losing the News of the day
/// batch must not abort a run that has already announced items.
pub struct DatePages {
    client: Client,
}

impl DatePages {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl DatePageSource for DatePages {
    async fn date_articles(&self, url: &str) -> Vec<Item> {
        match fetch_date_page(&self.client, url).await {
            Ok(html) => parse_date_articles(&html).into_items("news of the day"),
            Err(e) => {
                warn!(%url, error = %e, "Date page fetch failed");
                Vec::new()
            }
        }
    }
}
