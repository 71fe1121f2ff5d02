use std::fmt::Display;

use scraper::{ElementRef, Html, Selector};

use super::{
    ParseError, compile, compile_all, elem_text, first_non_empty, first_text,
    normalize_whitespace,
};
use crate::config::PostRules;
use crate::types::Post;

enum PostStrategy {
    Messages {
        source: &'static str,
        selector: Selector,
    },
    TextOnly {
        source: &'static str,
        selector: Selector,
    },
}

impl Display for PostStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostStrategy::Messages { source, .. } => write!(f, "messages '{source}'"),
            PostStrategy::TextOnly { source, .. } => write!(f, "message texts '{source}'"),
        }
    }
}

/// Pulls posts out of a channel web preview.
pub struct PostExtractor {
    strategies: Vec<PostStrategy>,
    text: Selector,
    datetime: Selector,
    date_text: Vec<Selector>,
    permalink: Vec<Selector>,
    fallback_limit: Option<usize>,
    cap: usize,
}

impl PostExtractor {
    pub fn new(rules: &PostRules) -> Result<Self, ParseError> {
        let mut strategies = rules
            .item_selectors
            .iter()
            .map(|&source| {
                compile(source).map(|selector| PostStrategy::Messages { source, selector })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let text = compile(rules.text_selector)?;
        strategies.push(PostStrategy::TextOnly {
            source: rules.text_selector,
            selector: text.clone(),
        });

        Ok(Self {
            strategies,
            text,
            datetime: compile(rules.datetime_selector)?,
            date_text: compile_all(rules.date_text_selectors)?,
            permalink: compile_all(rules.permalink_selectors)?,
            fallback_limit: rules.fallback_limit,
            cap: rules.cap,
        })
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn extract(&self, html: &str) -> Vec<Post> {
        let document = Html::parse_document(html);
        let mut posts = first_non_empty(&self.strategies, |strategy| match strategy {
            PostStrategy::Messages { selector, .. } => self.from_messages(&document, selector),
            PostStrategy::TextOnly { selector, .. } => self.from_texts(&document, selector),
        });
        posts.retain(Post::is_retained);
        posts.truncate(self.cap);
        posts
    }

    /// One entry per matched message, blank ones included, so a matching
    /// selector always wins over the text-only fallback.
    fn from_messages(&self, document: &Html, selector: &Selector) -> Vec<Post> {
        document
            .select(selector)
            .enumerate()
            .map(|(i, message)| {
                let link = self.permalink(message);
                let id = id_from_link(&link).unwrap_or_else(|| (i + 1).to_string());
                Post {
                    id,
                    time: self.time(message),
                    text: message
                        .select(&self.text)
                        .next()
                        .map(|e| normalize_whitespace(&elem_text(e)))
                        .unwrap_or_default(),
                    link,
                }
            })
            .collect()
    }

    fn from_texts(&self, document: &Html, selector: &Selector) -> Vec<Post> {
        document
            .select(selector)
            .take(self.fallback_limit.unwrap_or(usize::MAX))
            .map(|e| normalize_whitespace(&elem_text(e)))
            .filter(|text| !text.is_empty())
            .enumerate()
            .map(|(i, text)| Post {
                id: (i + 1).to_string(),
                time: String::new(),
                text,
                link: String::new(),
            })
            .collect()
    }

    /// Machine-readable `datetime` first, then the visible date label.
    fn time(&self, message: ElementRef) -> String {
        message
            .select(&self.datetime)
            .filter_map(|e| e.value().attr("datetime"))
            .map(normalize_whitespace)
            .find(|s| !s.is_empty())
            .or_else(|| first_text(message, &self.date_text))
            .unwrap_or_default()
    }

    fn permalink(&self, message: ElementRef) -> String {
        self.permalink
            .iter()
            .find_map(|selector| {
                message
                    .select(selector)
                    .filter_map(|e| e.value().attr("href"))
                    .map(normalize_whitespace)
                    .find(|href| !href.is_empty())
            })
            .unwrap_or_default()
    }
}

/// Last path segment of `link`, ignoring scheme, host, query and fragment.
fn id_from_link(link: &str) -> Option<String> {
    let path = link.split(['?', '#']).next()?;
    let (has_host, rest) = match path.split_once("://") {
        Some((_, rest)) => (true, rest),
        None => (false, path),
    };
    rest.split('/')
        .filter(|segment| !segment.is_empty())
        .skip(usize::from(has_host))
        .last()
        .map(str::to_string)
}

/// Builds a [`PostExtractor`] for `rules` and runs it once.
pub fn extract_posts(html: &str, rules: &PostRules) -> Result<Vec<Post>, ParseError> {
    Ok(PostExtractor::new(rules)?.extract(html))
}
