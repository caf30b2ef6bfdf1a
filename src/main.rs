//! # Drishti Watch
//!
//! A change-detection bot that watches the Drishti IAS current-affairs
//! page and announces new entries to a Discord webhook, keeping a bounded
//! on-disk history so repeated runs never re-announce the same links.
//!
//! ## Features
//!
//! - Scrapes the Daily Current Affairs and Important Editorials lists from
//!   the front page
//! - Announces each unseen item as a color-coded Discord embed, oldest
//!   first so the channel reads chronologically
//! - Drills into the newest announced date page and posts its consolidated
//!   "News of the Day" article list as one numbered message, at most once
//!   per date
//! - Persists three bounded history logs to `history.json`, written only
//!   when something new went out
//!
//! ## Usage
//!
//! ```sh
//! DISCORD_WEBHOOK=https://discord.com/api/webhooks/... drishti_watch
//! ```
//!
//! ## Architecture
//!
//! One invocation is one run: fetch front page → parse both sections →
//! deduplicate against history and announce → conditionally fetch and
//! announce the News of the Day batch → persist history if anything was
//! announced. Only a missing webhook or a failed front-page fetch ends
//! the run with a non-zero exit.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod engine;
mod history;
mod models;
mod notify;
mod scrapers;
mod utils;

use cli::Cli;
use engine::DedupEngine;
use history::History;
use notify::DiscordNotifier;
use scrapers::drishti;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("drishti_watch starting up");

    // Aborts here with a non-zero exit when the webhook is unconfigured,
    // before any network I/O.
    let args = Cli::parse();

    let history_path = Path::new(&args.history_file).to_path_buf();
    let mut history = History::load(&history_path);

    let client = drishti::http_client()?;
    let html = match drishti::fetch_front_page(&client, &args.page_url).await {
        Ok(html) => html,
        Err(e) => {
            error!(url = %args.page_url, error = %e, "Front page fetch failed");
            return Err(e);
        }
    };

    let news = drishti::parse_news(&html).into_items("news");
    let editorials = drishti::parse_editorials(&html).into_items("editorials");
    info!(
        news = news.len(),
        editorials = editorials.len(),
        "Parsed front page sections"
    );

    let notifier = DiscordNotifier::new(args.webhook_url)?;
    let date_pages = drishti::DatePages::new(client);
    let mut engine = DedupEngine::new(&notifier, &date_pages, &mut history);
    let new_items_found = engine.run(&news, &editorials).await;

    if new_items_found {
        if let Err(e) = history.save(&history_path) {
            // Not fatal; already-delivered announcements for this run may
            // repeat on the next one.
            error!(path = %history_path.display(), error = %e, "Failed to save history");
        }
    } else {
        info!("No new updates found");
    }

    let elapsed = start_time.elapsed();
    info!(
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Run complete"
    );

    Ok(())
}
