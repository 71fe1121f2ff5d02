use std::fmt::Display;

use serde::Serialize;

use crate::config::{PipelineConfig, SourceConfig};
use crate::parser::{ParseError, PostExtractor, ReviewExtractor};
use crate::scraper::{FetchError, PageSource, WebScraper};
use crate::writer::{self, WriteError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] FetchError),
    #[error("Invalid extraction rules: {0}")]
    Rules(#[from] ParseError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Extracted(usize),
    /// The page could not be fetched; an empty array was written instead.
    Unavailable(String),
}

impl Display for SourceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceOutcome::Extracted(count) => write!(f, "{count} extracted"),
            SourceOutcome::Unavailable(reason) => write!(f, "unavailable ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reviews: SourceOutcome,
    pub posts: SourceOutcome,
}

impl Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reviews: {}, posts: {}", self.reviews, self.posts)
    }
}

/// Fetches both pages over HTTP and writes both output files.
pub async fn fetch_and_write(config: &PipelineConfig) -> Result<RunReport, PipelineError> {
    match WebScraper::new(&config.fetch) {
        Ok(scraper) => run(config, &scraper).await,
        Err(e) => Err(abort(config, e.into())),
    }
}

/// Runs the reviews pipeline, then the posts pipeline, against `source`.
///
/// A page that cannot be fetched only empties its own output file. Any other
/// failure is fatal: both output files are reset to `[]` before the error is
/// returned, so neither is ever left missing.
pub async fn run<S: PageSource>(
    config: &PipelineConfig,
    source: &S,
) -> Result<RunReport, PipelineError> {
    match try_run(config, source).await {
        Ok(report) => Ok(report),
        Err(e) => Err(abort(config, e)),
    }
}

async fn try_run<S: PageSource>(
    config: &PipelineConfig,
    source: &S,
) -> Result<RunReport, PipelineError> {
    let review_extractor = ReviewExtractor::new(&config.review_rules)?;
    let post_extractor = PostExtractor::new(&config.post_rules)?;

    let reviews = run_source("reviews", &config.reviews, source, |html| {
        review_extractor.extract(html)
    })
    .await?;
    let posts = run_source("posts", &config.posts, source, |html| {
        post_extractor.extract(html)
    })
    .await?;

    Ok(RunReport { reviews, posts })
}

async fn run_source<S, T, F>(
    name: &str,
    target: &SourceConfig,
    source: &S,
    extract: F,
) -> Result<SourceOutcome, WriteError>
where
    S: PageSource,
    T: Serialize,
    F: FnOnce(&str) -> Vec<T>,
{
    log::info!("Fetching {} from {}...", name, target.url);
    let (items, outcome) = match source.fetch_page(&target.url).await {
        Ok(html) => {
            let items = extract(&html);
            log::info!("Extracted {} {}", items.len(), name);
            let count = items.len();
            (items, SourceOutcome::Extracted(count))
        }
        Err(e) => {
            log::warn!("Skipping {}: {}", name, e);
            (Vec::new(), SourceOutcome::Unavailable(e.to_string()))
        }
    };

    writer::write_json(&target.output, &items)?;
    Ok(outcome)
}

fn abort(config: &PipelineConfig, err: PipelineError) -> PipelineError {
    log::error!("Run failed: {err}");
    let paths = config.output_paths().map(|p| p.as_path());
    let written = writer::write_empty(&paths);
    log::warn!(
        "Reset {}/{} output files to empty arrays",
        written,
        paths.len()
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::types::{Post, Review};
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const MARKETPLACE: &str = "https://market.test/users/1/";
    const CHANNEL: &str = "https://t.me/s/example";

    struct StubSource {
        pages: HashMap<&'static str, String>,
    }

    impl StubSource {
        fn new(pages: &[(&'static str, &str)]) -> Self {
            Self {
                pages: pages.iter().map(|(u, h)| (*u, h.to_string())).collect(),
            }
        }
    }

    impl PageSource for StubSource {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: StatusCode::SERVICE_UNAVAILABLE,
                })
        }
    }

    fn config_in(dir: &Path, profile: Profile) -> PipelineConfig {
        PipelineConfig::new(
            profile,
            SourceConfig::new(MARKETPLACE, dir.join("reviews.json")),
            SourceConfig::new(CHANNEL, dir.join("tg_posts.json")),
        )
    }

    fn read<T: serde::de::DeserializeOwned>(path: &Path) -> T {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_marketplace_failure_keeps_channel_output() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path(), Profile::Hardened);
        let source = StubSource::new(&[(
            CHANNEL,
            r#"<html><body><div class="tgme_widget_message_text">Hello world</div></body></html>"#,
        )]);

        let report = run(&config, &source).await.unwrap();

        assert!(matches!(report.reviews, SourceOutcome::Unavailable(_)));
        assert_eq!(report.posts, SourceOutcome::Extracted(1));
        assert_eq!(fs::read_to_string(&config.reviews.output).unwrap(), "[]");
        let posts: Vec<Post> = read(&config.posts.output);
        assert_eq!(
            posts,
            vec![Post {
                id: "1".to_string(),
                time: String::new(),
                text: "Hello world".to_string(),
                link: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn test_unrecognised_pages_write_empty_arrays() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path(), Profile::Basic);
        let blank = "<html><body><p>Nothing here</p></body></html>";
        let source = StubSource::new(&[(MARKETPLACE, blank), (CHANNEL, blank)]);

        let report = run(&config, &source).await.unwrap();

        assert_eq!(report.reviews, SourceOutcome::Extracted(0));
        assert_eq!(report.posts, SourceOutcome::Extracted(0));
        assert_eq!(fs::read_to_string(&config.reviews.output).unwrap(), "[]");
        assert_eq!(fs::read_to_string(&config.posts.output).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_both_sources_extracted() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path(), Profile::Hardened);
        let source = StubSource::new(&[
            (
                MARKETPLACE,
                r#"<div class="feedback-list"><div class="feedback-item">
                    <span class="buyer-name">A</span>
                    <span class="rating-stars" data-rating="5"></span>
                    <p class="feedback-text">Great seller, fast delivery</p>
                    <span class="date">yesterday</span>
                </div></div>"#,
            ),
            (
                CHANNEL,
                r#"<div class="tgme_widget_message">
                    <div class="tgme_widget_message_text">News</div>
                    <a class="tgme_widget_message_date" href="https://t.me/example/42">
                        <time datetime="2025-05-01T08:00:00+00:00">08:00</time>
                    </a>
                </div>"#,
            ),
        ]);

        let report = run(&config, &source).await.unwrap();

        assert_eq!(report.to_string(), "reviews: 1 extracted, posts: 1 extracted");
        let reviews: Vec<Review> = read(&config.reviews.output);
        assert_eq!(reviews[0].author, "A");
        assert_eq!(reviews[0].time, "yesterday");
        let posts: Vec<Post> = read(&config.posts.output);
        assert_eq!(posts[0].id, "42");
        assert_eq!(posts[0].link, "https://t.me/example/42");
    }

    #[tokio::test]
    async fn test_fatal_error_resets_both_outputs() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(dir.path(), Profile::Hardened);
        config.post_rules.item_selectors = &["div["];
        fs::write(&config.reviews.output, "previous run").unwrap();
        let source = StubSource::new(&[]);

        let err = run(&config, &source).await.unwrap_err();

        assert!(matches!(err, PipelineError::Rules(_)));
        assert_eq!(fs::read_to_string(&config.reviews.output).unwrap(), "[]");
        assert_eq!(fs::read_to_string(&config.posts.output).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut config = config_in(dir.path(), Profile::Basic);
        config.reviews.output = blocker.join("reviews.json");
        let source = StubSource::new(&[]);

        let err = run(&config, &source).await.unwrap_err();

        assert!(matches!(err, PipelineError::Write(_)));
        assert_eq!(fs::read_to_string(&config.posts.output).unwrap(), "[]");
    }
}
