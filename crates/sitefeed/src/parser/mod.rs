pub mod posts;
pub mod reviews;

use std::fmt::Display;

use scraper::{ElementRef, Selector};

pub use posts::{PostExtractor, extract_posts};
pub use reviews::{ReviewExtractor, extract_reviews};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
    #[error("Invalid trigger pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector(format!("{selector} ({e})")))
}

fn compile_all(selectors: &[&str]) -> Result<Vec<Selector>, ParseError> {
    selectors.iter().map(|s| compile(s)).collect()
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-blank text found under `element`, trying `selectors` in order.
fn first_text(element: ElementRef, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        element
            .select(selector)
            .map(|e| normalize_whitespace(&elem_text(e)))
            .find(|s| !s.is_empty())
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Runs `strategies` in order and keeps the output of the first one that
/// produces anything. Later strategies are never evaluated.
fn first_non_empty<S: Display, T>(strategies: &[S], mut extract: impl FnMut(&S) -> Vec<T>) -> Vec<T> {
    for strategy in strategies {
        let found = extract(strategy);
        if !found.is_empty() {
            log::debug!("{} produced {} entries", strategy, found.len());
            return found;
        }
        log::debug!("{} produced nothing", strategy);
    }
    Vec::new()
}
