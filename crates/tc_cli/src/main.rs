use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tc_core::config::{DEFAULT_OUTPUT_PATH, DEFAULT_SOURCE_URL, DEFAULT_USER_AGENT};
use tc_core::FeedConfig;
use tc_scrapers::logging::{init_logging, level_from_verbosity};
use tc_scrapers::FeedBuilder;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut total_millis = 0u64;
        let mut current_number = String::new();
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current_number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let num = current_number
                .parse::<u64>()
                .map_err(|_| format!("Invalid character in duration: {}", c))?;
            let unit_millis = match c {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                's' => 1_000,
                'm' => 60_000,
                'h' => 3_600_000,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_millis = add_millis(total_millis, num, unit_millis)?;
            current_number.clear();
        }

        // A trailing bare number is seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_millis = add_millis(total_millis, num, 1_000)?;
        } else if s.trim().is_empty() {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_millis(total_millis)))
    }
}

fn add_millis(total: u64, num: u64, unit_millis: u64) -> Result<u64, String> {
    num.checked_mul(unit_millis)
        .and_then(|millis| total.checked_add(millis))
        .ok_or_else(|| "Duration is too large".to_string())
}

/// Builds an RSS feed from the transformer-circuits.pub homepage.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Listing page to scrape
    #[arg(long, env = "TC_FEED_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    source_url: String,

    /// Where the feed is written
    #[arg(short, long, env = "TC_FEED_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Print the feed to stdout instead of writing it
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    #[arg(long, env = "TC_FEED_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// HTTP timeout per request (e.g. 30s, 1m30s)
    #[arg(long, env = "TC_FEED_TIMEOUT", default_value = "30s")]
    timeout: HumanDuration,

    /// Maximum number of items; 0 keeps every link found
    #[arg(long, env = "TC_FEED_MAX_ITEMS", default_value_t = 50)]
    max_items: usize,

    /// Pause after each article page fetch (e.g. 200ms)
    #[arg(long, env = "TC_FEED_DELAY", default_value = "200ms")]
    delay: HumanDuration,

    /// Article pages fetched at once
    #[arg(long, env = "TC_FEED_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Skip article pages; use listing data only
    #[arg(long)]
    no_details: bool,

    /// Channel link, if the feed should point somewhere other than the source
    #[arg(long, env = "TC_FEED_CHANNEL_LINK")]
    channel_link: Option<String>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn feed_config(&self) -> FeedConfig {
        let mut config = FeedConfig {
            user_agent: self.user_agent.clone(),
            timeout: self.timeout.0,
            max_items: (self.max_items > 0).then_some(self.max_items),
            request_delay: self.delay.0,
            detail_concurrency: self.concurrency,
            fetch_details: !self.no_details,
            ..FeedConfig::default()
        }
        .with_source_url(self.source_url.clone())
        .with_output_path(self.output.clone());
        config.channel.link = self.channel_link.clone();
        config
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.feed_config();
    let builder = FeedBuilder::new(config.clone()).context("invalid configuration")?;

    if cli.stdout {
        let entries = builder.collect_entries(&config.source_url).await?;
        let xml = builder.render(&config.source_url, &entries, Utc::now())?;
        println!("{}", xml);
        return Ok(());
    }

    let summary = builder.run().await?;
    info!(path = %summary.path.display(), items = summary.items, "Feed updated");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(level_from_verbosity(cli.verbose, cli.quiet));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
