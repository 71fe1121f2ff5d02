use std::{fmt::Display, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_MARKETPLACE_URL: &str = "https://funpay.com/users/1/";
pub const DEFAULT_CHANNEL_URL: &str = "https://t.me/s/telegram";
pub const DEFAULT_REVIEWS_PATH: &str = "reviews.json";
pub const DEFAULT_POSTS_PATH: &str = "tg_posts.json";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, thiserror::Error)]
#[error("Invalid profile '{0}'. Accepted values: 'basic', 'hardened'")]
pub struct ProfileParseError(String);

/// Selector sets and limits applied to both sources.
///
/// `Basic` mirrors the first, minimal scraper: one item selector per source and
/// a cap of 12. `Hardened` tries more markup variants, matches trigger words in
/// two languages, sends `Accept-Language` and keeps up to 50 entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    Basic,
    #[default]
    Hardened,
}

impl Profile {
    pub fn review_rules(&self) -> ReviewRules {
        match self {
            Profile::Basic => ReviewRules {
                item_selectors: &[".feedback-list .feedback-item"],
                author_selectors: &[".buyer-name"],
                rating_selectors: &[".rating-stars"],
                text_selectors: &[".feedback-text"],
                time_selectors: &[".date"],
                author_placeholder: "User",
                block_selector: "div",
                trigger_words: &["отзыв"],
                min_block_chars: 80,
                max_block_chars: 400,
                skip_duplicate_blocks: false,
                cap: 12,
            },
            Profile::Hardened => ReviewRules {
                item_selectors: &[
                    ".feedback-list .feedback-item",
                    ".review-container .review-item",
                    ".feedback-item",
                    ".review-item",
                ],
                author_selectors: &[
                    ".buyer-name",
                    ".media-user-name",
                    ".review-item-user",
                    ".author",
                ],
                rating_selectors: &[".rating-stars", "[data-rating]", ".rating"],
                text_selectors: &[".feedback-text", ".review-item-text", ".text"],
                time_selectors: &[".date", ".review-item-date", "time"],
                author_placeholder: "Пользователь",
                block_selector: "div, p, li, article",
                trigger_words: &[
                    "отзыв",
                    "спасибо",
                    "рекомендую",
                    "review",
                    "thanks",
                    "recommend",
                ],
                min_block_chars: 80,
                max_block_chars: 400,
                skip_duplicate_blocks: true,
                cap: 50,
            },
        }
    }

    pub fn post_rules(&self) -> PostRules {
        match self {
            Profile::Basic => PostRules {
                item_selectors: &["div.tgme_widget_message"],
                text_selector: ".tgme_widget_message_text",
                datetime_selector: "time[datetime]",
                date_text_selectors: &[],
                permalink_selectors: &[],
                fallback_limit: Some(1),
                cap: 12,
            },
            Profile::Hardened => PostRules {
                item_selectors: &["div.tgme_widget_message", ".js-widget_message"],
                text_selector: ".tgme_widget_message_text",
                datetime_selector: "time[datetime]",
                date_text_selectors: &[
                    ".tgme_widget_message_date time",
                    ".tgme_widget_message_date",
                ],
                permalink_selectors: &["a.tgme_widget_message_date[href]"],
                fallback_limit: None,
                cap: 50,
            },
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let accept_language = match self {
            Profile::Basic => None,
            Profile::Hardened => Some("ru-RU,ru;q=0.9,en;q=0.8".to_string()),
        };
        FetchSettings {
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept_language,
            timeout: Duration::from_secs(30),
        }
    }
}

impl FromStr for Profile {
    type Err = ProfileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Profile::Basic),
            "hardened" => Ok(Profile::Hardened),
            _ => Err(ProfileParseError(s.to_string())),
        }
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Basic => write!(f, "basic"),
            Profile::Hardened => write!(f, "hardened"),
        }
    }
}

/// How review entries are located on the marketplace profile page.
#[derive(Debug, Clone)]
pub struct ReviewRules {
    /// Each selector is tried in order as its own strategy.
    pub item_selectors: &'static [&'static str],
    pub author_selectors: &'static [&'static str],
    pub rating_selectors: &'static [&'static str],
    pub text_selectors: &'static [&'static str],
    pub time_selectors: &'static [&'static str],
    pub author_placeholder: &'static str,
    /// Elements scanned by the keyword fallback.
    pub block_selector: &'static str,
    pub trigger_words: &'static [&'static str],
    pub min_block_chars: usize,
    pub max_block_chars: usize,
    pub skip_duplicate_blocks: bool,
    pub cap: usize,
}

/// How messages are located on the channel web preview.
#[derive(Debug, Clone)]
pub struct PostRules {
    pub item_selectors: &'static [&'static str],
    pub text_selector: &'static str,
    pub datetime_selector: &'static str,
    pub date_text_selectors: &'static [&'static str],
    pub permalink_selectors: &'static [&'static str],
    /// Upper bound on entries taken by the text-only fallback, if any.
    pub fallback_limit: Option<usize>,
    pub cap: usize,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub accept_language: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: String,
    pub output: PathBuf,
}

impl SourceConfig {
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
        }
    }
}

/// Everything a single run needs. Nothing is read from the environment here.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub profile: Profile,
    pub reviews: SourceConfig,
    pub posts: SourceConfig,
    pub review_rules: ReviewRules,
    pub post_rules: PostRules,
    pub fetch: FetchSettings,
}

impl PipelineConfig {
    pub fn new(profile: Profile, reviews: SourceConfig, posts: SourceConfig) -> Self {
        Self {
            profile,
            reviews,
            posts,
            review_rules: profile.review_rules(),
            post_rules: profile.post_rules(),
            fetch: profile.fetch_settings(),
        }
    }

    pub fn with_review_cap(mut self, cap: Option<usize>) -> Self {
        if let Some(cap) = cap {
            self.review_rules.cap = cap;
        }
        self
    }

    pub fn with_post_cap(mut self, cap: Option<usize>) -> Self {
        if let Some(cap) = cap {
            self.post_rules.cap = cap;
        }
        self
    }

    pub fn output_paths(&self) -> [&PathBuf; 2] {
        [&self.reviews.output, &self.posts.output]
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(
            Profile::default(),
            SourceConfig::new(DEFAULT_MARKETPLACE_URL, DEFAULT_REVIEWS_PATH),
            SourceConfig::new(DEFAULT_CHANNEL_URL, DEFAULT_POSTS_PATH),
        )
    }
}
