use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{ReadBook, ScoredCandidate, UserProfile},
    services::store::{BookRecord, DocumentStore},
};

/// Recommendations stored for one user by the in-memory backend
#[derive(Debug, Clone)]
pub struct StoredRecommendations {
    pub book_ids: Vec<String>,
    pub books: Vec<BookRecord>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct InMemoryInner {
    profiles: HashMap<String, UserProfile>,
    recommendations: HashMap<String, StoredRecommendations>,
}

/// Process-local document store.
///
/// Used when no remote store is configured, and by tests.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<InMemoryInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user
    pub async fn insert_profile(&self, user_id: impl Into<String>, profile: UserProfile) {
        let mut inner = self.inner.write().await;
        inner.profiles.insert(user_id.into(), profile);
    }

    /// Recommendations most recently posted for a user
    pub async fn recommendations_for(&self, user_id: &str) -> Option<StoredRecommendations> {
        let inner = self.inner.read().await;
        inner.recommendations.get(user_id).cloned()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
    async fn fetch_read_books(&self, user_id: &str) -> AppResult<Vec<ReadBook>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .get(user_id)
            .map(|profile| profile.read_books.clone())
            .unwrap_or_default())
    }

    async fn fetch_preferred_genres(&self, user_id: &str) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        inner
            .profiles
            .get(user_id)
            .map(|profile| profile.preferred_genres.clone())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    async fn post_recommendations(
        &self,
        user_id: &str,
        recommendations: &[ScoredCandidate],
    ) -> AppResult<Vec<String>> {
        let books: Vec<BookRecord> = recommendations.iter().map(BookRecord::from).collect();
        let book_ids: Vec<String> = books.iter().map(|_| Uuid::new_v4().to_string()).collect();

        let mut inner = self.inner.write().await;
        inner.recommendations.insert(
            user_id.to_string(),
            StoredRecommendations {
                book_ids: book_ids.clone(),
                books,
                timestamp: Utc::now(),
            },
        );

        Ok(book_ids)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
