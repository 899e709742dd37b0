use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book from the user's "already read" list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadBook {
    #[serde(default)]
    pub title: Option<String>,
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// The user's own rating
    pub rating: f64,
    /// When the book was marked as read; `None` sorts before every timestamp
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ReadBook {
    /// Text used to compare catalog books against this one
    pub fn content_text(&self) -> String {
        format!("{} {}", self.author, self.description)
    }
}

/// Everything the ranking pipeline needs to know about one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    /// Preferred genres as entered by the user
    #[serde(default)]
    pub preferred_genres: Vec<String>,
    /// Read history, in store order
    #[serde(default)]
    pub read_books: Vec<ReadBook>,
}

impl UserProfile {
    /// Creates a profile from preferred genres and read history
    pub fn new(preferred_genres: Vec<String>, read_books: Vec<ReadBook>) -> Self {
        Self {
            preferred_genres,
            read_books,
        }
    }
}
