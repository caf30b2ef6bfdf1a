//! Discord webhook delivery.
//!
//! Announcements go out as rich embeds: one embed per new item, color-coded
//! by section, and one consolidated numbered-list embed per News of the Day
//! batch. The webhook URL is injected at construction; delivery uses a
//! dedicated client with its own timeout.

use crate::engine::Notifier;
use crate::models::{Item, Section};
use crate::utils::truncate_for_log;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::error::Error;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::info;

/// Timeout for webhook deliveries.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

const USERNAME: &str = "Drill Ustaad - IMA";
const AVATAR_URL: &str = "https://i.ibb.co/Q79mP6CC/ima-ustad.jpg";
const FOOTER_TEXT: &str = "Exam Oriented • Daily Updates to Prepare thyself for the Written and SSB of the upcoming UPSC CDS Exam";

const NEWS_COLOR: u32 = 3447003;
const EDITORIAL_COLOR: u32 = 15158332;

#[derive(Debug, Serialize)]
struct WebhookPayload {
    username: &'static str,
    avatar_url: &'static str,
    embeds: [Embed; 1],
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    url: String,
    color: u32,
    timestamp: String,
    footer: Footer,
}

#[derive(Debug, Serialize)]
struct Footer {
    text: &'static str,
}

/// Webhook-backed [`Notifier`].
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        Ok(Self {
            client,
            webhook_url,
        })
    }

    async fn post(&self, payload: &WebhookPayload) -> Result<(), Box<dyn Error>> {
        self.client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Notifier for DiscordNotifier {
    async fn notify(
        &self,
        title: &str,
        url: &str,
        section: Section,
    ) -> Result<(), Box<dyn Error>> {
        let payload = WebhookPayload {
            username: USERNAME,
            avatar_url: AVATAR_URL,
            embeds: [item_embed(title, url, section)],
        };
        self.post(&payload).await?;
        info!(%section, title = %truncate_for_log(title, 50), "Notification sent");
        Ok(())
    }

    async fn notify_batch(
        &self,
        date_title: &str,
        articles: &[Item],
        source_url: &str,
    ) -> Result<(), Box<dyn Error>> {
        let payload = WebhookPayload {
            username: USERNAME,
            avatar_url: AVATAR_URL,
            embeds: [batch_embed(date_title, articles, source_url)],
        };
        self.post(&payload).await?;
        info!(count = articles.len(), "News of the Day notification sent");
        Ok(())
    }
}

fn section_color(section: Section) -> u32 {
    match section {
        Section::News => NEWS_COLOR,
        Section::Editorials => EDITORIAL_COLOR,
    }
}

/// Clean a scraped title for display: trim and drop the trailing ellipsis
/// the site appends to long link texts.
fn clean_title(title: &str) -> String {
    title.trim().replace("...", "")
}

fn item_embed(title: &str, url: &str, section: Section) -> Embed {
    Embed {
        title: clean_title(title),
        description: format!(
            "New update available in {} section!\n[Click to Read full article]({})",
            section.label(),
            url
        ),
        url: url.to_string(),
        color: section_color(section),
        timestamp: Utc::now().to_rfc3339(),
        footer: Footer { text: FOOTER_TEXT },
    }
}

fn batch_embed(date_title: &str, articles: &[Item], source_url: &str) -> Embed {
    Embed {
        title: "News of the Day".to_string(),
        description: batch_description(date_title, articles, source_url),
        url: source_url.to_string(),
        color: NEWS_COLOR,
        timestamp: Utc::now().to_rfc3339(),
        footer: Footer { text: FOOTER_TEXT },
    }
}

/// Numbered markdown list of the batch, with a link back to the date page.
fn batch_description(date_title: &str, articles: &[Item], source_url: &str) -> String {
    let mut description = format!(
        "**{} articles published on {}:**\n\n",
        articles.len(),
        date_title
    );
    for (idx, article) in articles.iter().enumerate() {
        writeln!(description, "{}. [{}]({})", idx + 1, article.title, article.url).unwrap();
    }
    write!(description, "\n[View full page]({})", source_url).unwrap();
    description
}
