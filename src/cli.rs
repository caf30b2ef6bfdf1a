//! Command-line interface definitions for Drishti Watch.
//!
//! This module defines the CLI arguments and options using the `clap`
//! crate. The webhook URL is required and usually supplied via the
//! `DISCORD_WEBHOOK` environment variable; a missing webhook aborts the
//! process before any network I/O. The parsed struct is the run's
//! configuration, injected into the components rather than read from
//! ambient state.

use crate::scrapers::drishti;
use clap::Parser;

/// Command-line arguments for the Drishti Watch application.
///
/// # Examples
///
/// ```sh
/// # Webhook from the environment
/// DISCORD_WEBHOOK=https://discord.com/api/webhooks/... drishti_watch
///
/// # Everything explicit
/// drishti_watch --webhook-url https://... --history-file /var/lib/drishti/history.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Discord webhook URL that receives the announcements
    #[arg(long, env = "DISCORD_WEBHOOK", hide_env_values = true)]
    pub webhook_url: String,

    /// Current-affairs page to watch
    #[arg(long, default_value = drishti::FRONT_PAGE_URL)]
    pub page_url: String,

    /// Path of the announcement history file
    #[arg(long, default_value = "history.json")]
    pub history_file: String,
}
