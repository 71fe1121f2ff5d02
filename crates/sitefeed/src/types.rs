use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A single piece of buyer feedback from the marketplace profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub author: String,
    pub rating: String,
    pub text: String,
    pub time: String,
}

impl Display for Review {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.author)?;
        if !self.rating.is_empty() {
            write!(f, " [{}]", self.rating)?;
        }
        if !self.time.is_empty() {
            write!(f, " ({})", self.time)?;
        }
        let preview: String = self.text.chars().take(80).collect();
        write!(f, ": {}", preview)
    }
}

/// A message from the channel web preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub time: String,
    pub text: String,
    pub link: String,
}

impl Post {
    pub(crate) fn is_retained(&self) -> bool {
        !self.text.trim().is_empty() || !self.link.trim().is_empty()
    }
}

impl Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.id)?;
        if !self.time.is_empty() {
            write!(f, " {}", self.time)?;
        }
        let preview: String = self.text.chars().take(80).collect();
        write!(f, ": {}", preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_serializes_in_field_order() {
        let review = Review {
            author: "A".to_string(),
            rating: "5".to_string(),
            text: "Great seller".to_string(),
            time: "2 days ago".to_string(),
        };
        let json = serde_json::to_string(&review).unwrap();
        assert_eq!(
            json,
            r#"{"author":"A","rating":"5","text":"Great seller","time":"2 days ago"}"#
        );
    }

    #[test]
    fn test_post_serializes_in_field_order() {
        let post = Post {
            id: "7".to_string(),
            time: String::new(),
            text: "Hello".to_string(),
            link: String::new(),
        };
        let json = serde_json::to_string(&post).unwrap();
        assert_eq!(json, r#"{"id":"7","time":"","text":"Hello","link":""}"#);
    }

    #[test]
    fn test_post_retention() {
        let mut post = Post {
            id: "1".to_string(),
            time: "2025-01-01".to_string(),
            text: "   ".to_string(),
            link: String::new(),
        };
        assert!(!post.is_retained());

        post.link = "https://t.me/channel/1".to_string();
        assert!(post.is_retained());
    }
}
