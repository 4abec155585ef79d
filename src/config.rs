use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use dotenv::dotenv;
use env_logger::TimestampPrecision;
use url::Url;

use crate::query::SortOrder;

#[derive(Debug, Parser)]
pub struct Config {
    /// Root URL of the feed API
    #[clap(long, env = "FEED_API_URL")]
    api_url: Url,
    /// Bearer access token for the feed API
    #[clap(long, env = "FEED_ACCESS_TOKEN", hide_env_values = true)]
    token: String,
    /// Posts requested per page
    #[arg(long, default_value = "15")]
    page_size: usize,
    /// Limit request concurrency
    #[arg(short, long, default_value = "5")]
    limit: usize,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    command: Command,
}

impl Config {
    pub fn parse() -> Self {
        dotenv().ok();
        let config = <Self as Parser>::parse();

        let chatty = config
            .verbose
            .log_level()
            .map_or(false, |level| level > log::Level::Info);
        env_logger::Builder::new()
            .format_timestamp(if chatty {
                Some(TimestampPrecision::Millis)
            } else {
                None
            })
            .format_target(chatty)
            .filter_level(config.verbose.log_level_filter())
            .init();

        config
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }
    pub fn token(&self) -> &str {
        &self.token
    }
    pub fn page_size(&self) -> usize {
        self.page_size
    }
    pub fn limit(&self) -> usize {
        self.limit
    }
    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the feed
    Feed {
        /// How many pages to load
        #[arg(long, default_value = "1")]
        pages: u32,
        /// Keep loading until the feed is exhausted
        #[arg(long, conflicts_with = "pages")]
        all: bool,
        /// Show only posts containing this text
        #[arg(long)]
        search: Option<String>,
        /// Presentation order
        #[arg(long, value_enum, default_value = "unsorted")]
        sort: SortOrder,
    },
    /// Show a single post
    Show { id: u64 },
    /// Publish a new post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        media: Option<Url>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Rewrite an existing post
    Edit {
        id: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        media: Option<Url>,
    },
    /// Delete a post
    Delete {
        id: u64,
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}
