use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use sitefeed::config::{
    DEFAULT_CHANNEL_URL, DEFAULT_MARKETPLACE_URL, DEFAULT_POSTS_PATH, DEFAULT_REVIEWS_PATH,
};
use sitefeed::{PipelineConfig, Profile, SourceConfig};

/// Every option is read from the environment; flags only exist for local runs.
#[derive(Parser)]
#[command(name = "sitefeed", version)]
#[command(
    about = "Scrapes marketplace reviews and channel posts into JSON files",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        hide = true,
        env = "SITEFEED_LOG_LEVEL",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        hide = true,
        env = "FUNPAY_USER_URL",
        default_value = DEFAULT_MARKETPLACE_URL,
        help = "Marketplace seller profile to read reviews from"
    )]
    marketplace_url: String,

    #[arg(
        long,
        hide = true,
        env = "TG_CHANNEL_URL",
        default_value = DEFAULT_CHANNEL_URL,
        help = "Channel web preview to read posts from"
    )]
    channel_url: String,

    #[arg(
        long,
        hide = true,
        env = "SITEFEED_PROFILE",
        value_parser = parse_profile,
        default_value = "hardened",
        help = "Selector set and limits (basic or hardened)"
    )]
    profile: Profile,

    #[arg(
        long,
        hide = true,
        env = "REVIEWS_OUTPUT",
        default_value = DEFAULT_REVIEWS_PATH,
        help = "Where to write the reviews JSON"
    )]
    reviews_output: PathBuf,

    #[arg(
        long,
        hide = true,
        env = "TG_POSTS_OUTPUT",
        default_value = DEFAULT_POSTS_PATH,
        help = "Where to write the posts JSON"
    )]
    posts_output: PathBuf,

    #[arg(
        long,
        hide = true,
        env = "SITEFEED_MAX_REVIEWS",
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Override the profile's review cap"
    )]
    max_reviews: Option<u16>,

    #[arg(
        long,
        hide = true,
        env = "SITEFEED_MAX_POSTS",
        value_parser = clap::value_parser!(u16).range(1..),
        help = "Override the profile's post cap"
    )]
    max_posts: Option<u16>,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn parse_profile(s: &str) -> Result<Profile, String> {
    s.parse::<Profile>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let config = PipelineConfig::new(
        cli.profile,
        SourceConfig::new(cli.marketplace_url, cli.reviews_output),
        SourceConfig::new(cli.channel_url, cli.posts_output),
    )
    .with_review_cap(cli.max_reviews.map(usize::from))
    .with_post_cap(cli.max_posts.map(usize::from));

    log::info!("Running with the {} profile", config.profile);

    match sitefeed::fetch_and_write(&config).await {
        Ok(report) => log::info!(
            "Saved {} and {} ({})",
            config.reviews.output.display(),
            config.posts.output.display(),
            report
        ),
        Err(e) => {
            log::error!("Error: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "sitefeed",
            "--profile",
            "basic",
            "--max-posts",
            "5",
            "--channel-url",
            "https://t.me/s/other",
        ])
        .unwrap();

        assert_eq!(cli.profile, Profile::Basic);
        assert_eq!(cli.max_posts, Some(5));
        assert_eq!(cli.channel_url, "https://t.me/s/other");
    }

    #[test]
    fn test_rejects_zero_cap() {
        assert!(Cli::try_parse_from(["sitefeed", "--max-reviews", "0"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_profile() {
        assert!(Cli::try_parse_from(["sitefeed", "--profile", "strict"]).is_err());
    }
}
