//! Document store abstraction
//!
//! The recommender reads a user's reading history and genre preferences from a
//! remote document store and writes the ranked books back to it. Backends
//! implement `DocumentStore`; the ranking code never sees their wire formats.
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{ReadBook, ScoredCandidate, UserProfile},
};

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::InMemoryStore;

/// Trait for user data backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the user's "already read" list.
    ///
    /// Entries that cannot be resolved to a rated book are dropped by the backend.
    async fn fetch_read_books(&self, user_id: &str) -> AppResult<Vec<ReadBook>>;

    /// Fetch the user's preferred genres; `NotFound` if the user does not exist
    async fn fetch_preferred_genres(&self, user_id: &str) -> AppResult<Vec<String>>;

    /// Store the ranked books for a user and return the ids of the stored book records
    async fn post_recommendations(
        &self,
        user_id: &str,
        recommendations: &[ScoredCandidate],
    ) -> AppResult<Vec<String>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Loads everything the ranking pipeline needs for one user
pub async fn fetch_profile(store: &dyn DocumentStore, user_id: &str) -> AppResult<UserProfile> {
    let preferred_genres = store.fetch_preferred_genres(user_id).await?;
    let read_books = store.fetch_read_books(user_id).await?;

    tracing::info!(
        user_id = %user_id,
        store = store.name(),
        preferred_genres = preferred_genres.len(),
        read_books = read_books.len(),
        "Profile fetched"
    );

    Ok(UserProfile::new(preferred_genres, read_books))
}

/// A recommended book as persisted in the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub author: String,
    pub cover_image_url: String,
    pub description: String,
    pub genre: Vec<String>,
    pub isbn10: String,
    pub isbn13: String,
    pub title: String,
}

impl From<&ScoredCandidate> for BookRecord {
    fn from(candidate: &ScoredCandidate) -> Self {
        let book = &candidate.book;
        let or_default = |value: &str, default: &str| {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };

        Self {
            author: or_default(&book.authors.join(", "), "Unknown"),
            cover_image_url: book.cover_image_url.clone(),
            description: or_default(&book.description, "No description available"),
            genre: book.genres.clone(),
            isbn10: book.isbn10.clone(),
            isbn13: book.isbn13.clone(),
            title: or_default(&book.title, "No title provided"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{CatalogBook, MatchLevel},
    };

    fn candidate(book: CatalogBook) -> ScoredCandidate {
        ScoredCandidate {
            book,
            genre_match: MatchLevel::High,
            content_match: 0.6,
            recommend_probability: 0.35,
        }
    }

    #[test]
    fn test_book_record_joins_authors() {
        let record = BookRecord::from(&candidate(CatalogBook {
            title: "Good Omens".to_string(),
            authors: vec!["Terry Pratchett".to_string(), "Neil Gaiman".to_string()],
            genres: vec!["fantasy".to_string()],
            description: "The end is nigh".to_string(),
            isbn10: "0060853980".to_string(),
            isbn13: "9780060853983".to_string(),
            cover_image_url: "https://example.com/omens.jpg".to_string(),
            average_rating: 4.3,
        }));

        assert_eq!(record.author, "Terry Pratchett, Neil Gaiman");
        assert_eq!(record.genre, vec!["fantasy"]);
        assert_eq!(record.isbn13, "9780060853983");
    }

    #[test]
    fn test_book_record_fills_defaults() {
        let record = BookRecord::from(&candidate(CatalogBook::default()));
        assert_eq!(record.author, "Unknown");
        assert_eq!(record.description, "No description available");
        assert_eq!(record.title, "No title provided");
        assert!(record.genre.is_empty());
    }

    #[test]
    fn test_book_record_serializes_camel_case() {
        let record = BookRecord::from(&candidate(CatalogBook::default()));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("coverImageUrl").is_some());
        assert!(json.get("cover_image_url").is_none());
    }

    #[tokio::test]
    async fn test_fetch_profile_combines_both_lookups() {
        let mut store = MockDocumentStore::new();
        store
            .expect_fetch_preferred_genres()
            .withf(|user_id| user_id == "reader-1")
            .returning(|_| Ok(vec!["Fantasy".to_string()]));
        store.expect_fetch_read_books().returning(|_| {
            Ok(vec![ReadBook {
                title: Some("The Hobbit".to_string()),
                author: "J.R.R. Tolkien".to_string(),
                description: "a reluctant hobbit".to_string(),
                rating: 5.0,
                timestamp: None,
            }])
        });
        store.expect_name().return_const("mock");

        let profile = fetch_profile(&store, "reader-1").await.unwrap();
        assert_eq!(profile.preferred_genres, vec!["Fantasy"]);
        assert_eq!(profile.read_books.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_profile_propagates_missing_user() {
        let mut store = MockDocumentStore::new();
        store
            .expect_fetch_preferred_genres()
            .returning(|user_id| Err(AppError::NotFound(format!("user {user_id}"))));
        store.expect_fetch_read_books().never();

        let result = fetch_profile(&store, "ghost").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
