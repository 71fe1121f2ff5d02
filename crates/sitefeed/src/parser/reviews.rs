use std::collections::HashSet;
use std::fmt::Display;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};

use super::{
    ParseError, compile, compile_all, elem_text, first_non_empty, first_text,
    normalize_whitespace, truncate_chars,
};
use crate::config::ReviewRules;
use crate::types::Review;

static RE_RATING_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rating-?(\d)$").expect("invalid regex: rating class"));

enum ReviewStrategy {
    Items {
        source: &'static str,
        selector: Selector,
    },
    KeywordBlocks {
        source: &'static str,
        selector: Selector,
    },
}

impl Display for ReviewStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStrategy::Items { source, .. } => write!(f, "review items '{source}'"),
            ReviewStrategy::KeywordBlocks { source, .. } => {
                write!(f, "keyword blocks '{source}'")
            }
        }
    }
}

/// Pulls reviews out of a marketplace profile page.
///
/// Structured item selectors are tried first, one at a time. If none of them
/// yields a review with text, generic blocks are scanned for long passages that
/// mention one of the trigger words.
pub struct ReviewExtractor {
    strategies: Vec<ReviewStrategy>,
    author: Vec<Selector>,
    rating: Vec<Selector>,
    text: Vec<Selector>,
    time: Vec<Selector>,
    author_placeholder: String,
    triggers: Option<Regex>,
    min_block_chars: usize,
    max_block_chars: usize,
    skip_duplicate_blocks: bool,
    cap: usize,
}

impl ReviewExtractor {
    pub fn new(rules: &ReviewRules) -> Result<Self, ParseError> {
        let mut strategies = rules
            .item_selectors
            .iter()
            .map(|&source| {
                compile(source).map(|selector| ReviewStrategy::Items { source, selector })
            })
            .collect::<Result<Vec<_>, _>>()?;
        strategies.push(ReviewStrategy::KeywordBlocks {
            source: rules.block_selector,
            selector: compile(rules.block_selector)?,
        });

        let triggers = if rules.trigger_words.is_empty() {
            None
        } else {
            let pattern = rules
                .trigger_words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            Some(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
        };

        Ok(Self {
            strategies,
            author: compile_all(rules.author_selectors)?,
            rating: compile_all(rules.rating_selectors)?,
            text: compile_all(rules.text_selectors)?,
            time: compile_all(rules.time_selectors)?,
            author_placeholder: rules.author_placeholder.to_string(),
            triggers,
            min_block_chars: rules.min_block_chars,
            max_block_chars: rules.max_block_chars,
            skip_duplicate_blocks: rules.skip_duplicate_blocks,
            cap: rules.cap,
        })
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn extract(&self, html: &str) -> Vec<Review> {
        let document = Html::parse_document(html);
        let mut reviews = first_non_empty(&self.strategies, |strategy| match strategy {
            ReviewStrategy::Items { selector, .. } => self.from_items(&document, selector),
            ReviewStrategy::KeywordBlocks { selector, .. } => {
                self.from_keyword_blocks(&document, selector)
            }
        });
        reviews.truncate(self.cap);
        reviews
    }

    fn from_items(&self, document: &Html, selector: &Selector) -> Vec<Review> {
        document
            .select(selector)
            .filter_map(|item| {
                let text = first_text(item, &self.text)?;
                let author = first_text(item, &self.author)
                    .unwrap_or_else(|| self.author_placeholder.clone());
                Some(Review {
                    author,
                    rating: self.rating(item),
                    text,
                    time: first_text(item, &self.time).unwrap_or_default(),
                })
            })
            .collect()
    }

    fn from_keyword_blocks(&self, document: &Html, selector: &Selector) -> Vec<Review> {
        let Some(triggers) = &self.triggers else {
            return Vec::new();
        };
        let mut seen = HashSet::new();

        document
            .select(selector)
            .map(|block| normalize_whitespace(&elem_text(block)))
            .filter(|text| text.chars().count() > self.min_block_chars && triggers.is_match(text))
            .map(|text| truncate_chars(&text, self.max_block_chars).trim_end().to_string())
            .filter(|text| !self.skip_duplicate_blocks || seen.insert(text.clone()))
            .map(|text| Review {
                author: String::new(),
                rating: String::new(),
                text,
                time: String::new(),
            })
            .collect()
    }

    /// `data-rating` wins, then a `ratingN` class on the element or below it,
    /// then whatever text the element holds.
    fn rating(&self, item: ElementRef) -> String {
        for selector in &self.rating {
            for element in item.select(selector) {
                if let Some(value) = element.value().attr("data-rating") {
                    let value = normalize_whitespace(value);
                    if !value.is_empty() {
                        return value;
                    }
                }

                let from_class = element
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .flat_map(|e| e.value().classes())
                    .find_map(|class| RE_RATING_CLASS.captures(class).map(|c| c[1].to_string()));
                if let Some(value) = from_class {
                    return value;
                }

                let text = normalize_whitespace(&elem_text(element));
                if !text.is_empty() {
                    return text;
                }
            }
        }
        String::new()
    }
}

/// Builds a [`ReviewExtractor`] for `rules` and runs it once.
pub fn extract_reviews(html: &str, rules: &ReviewRules) -> Result<Vec<Review>, ParseError> {
    Ok(ReviewExtractor::new(rules)?.extract(html))
}
