use std::{cmp::Ordering, collections::HashMap, sync::Arc, time::Instant};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogBook, MatchLevel, ReadBook, ScoredCandidate, UserProfile},
    services::{
        bayes::{Evidence, ModelError, RecommendationModel},
        genres::GenreGraph,
        similarity::ContentScorer,
        store::{fetch_profile, DocumentStore},
    },
};

/// How many top-rated read books represent the user's taste
pub const FAVORITES_LIMIT: usize = 10;

/// Maximum number of recommendations returned
pub const RESULT_LIMIT: usize = 10;

/// Books below this content match are dropped unless their genre matches at least partially
pub const CONTENT_FILTER_THRESHOLD: f64 = 0.3;

#[derive(Debug, Default)]
struct PassStats {
    scored: usize,
    filtered: usize,
    failed: usize,
}

/// Picks the user's favorite books: highest rating first, earliest timestamp
/// first among equal ratings. Books without a timestamp come before stamped ones.
pub fn select_favorites(read_books: &[ReadBook], limit: usize) -> Vec<&ReadBook> {
    let mut favorites: Vec<&ReadBook> = read_books.iter().collect();
    favorites.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
    favorites.truncate(limit);
    favorites
}

/// Scores a catalog against one user's profile.
///
/// Holds only read-only configuration, so one instance can be shared across
/// threads; all per-pass state lives inside `rank`.
#[derive(Debug, Clone)]
pub struct Recommender {
    genres: GenreGraph,
    model: RecommendationModel,
}

impl Recommender {
    pub fn new(genres: GenreGraph, model: RecommendationModel) -> Self {
        Self { genres, model }
    }

    /// Recommender with the built-in genre graph and probability tables
    pub fn standard() -> Result<Self, ModelError> {
        Ok(Self::new(GenreGraph::new(), RecommendationModel::standard()?))
    }

    pub fn genres(&self) -> &GenreGraph {
        &self.genres
    }

    pub fn model(&self) -> &RecommendationModel {
        &self.model
    }

    /// Ranks the catalog for a user and returns at most `RESULT_LIMIT` books,
    /// ordered by recommendation probability. Equal probabilities keep catalog order.
    pub fn rank(&self, profile: &UserProfile, catalog: &[CatalogBook]) -> Vec<ScoredCandidate> {
        let start = Instant::now();

        let favorite_texts: Vec<String> = select_favorites(&profile.read_books, FAVORITES_LIMIT)
            .into_iter()
            .map(ReadBook::content_text)
            .collect();

        let mut scorer = ContentScorer::new();
        let mut memo: HashMap<Evidence, f64> = HashMap::new();
        let mut stats = PassStats::default();
        let mut candidates = Vec::new();

        for book in catalog {
            match self.score_book(
                book,
                &profile.preferred_genres,
                &favorite_texts,
                &mut scorer,
                &mut memo,
            ) {
                Ok(Some(candidate)) => {
                    stats.scored += 1;
                    candidates.push(candidate);
                }
                Ok(None) => stats.filtered += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(title = %book.title, error = %e, "Skipping book that could not be scored");
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.recommend_probability
                .partial_cmp(&a.recommend_probability)
                .unwrap_or(Ordering::Equal)
        });
        candidates.truncate(RESULT_LIMIT);

        tracing::info!(
            catalog = catalog.len(),
            favorites = favorite_texts.len(),
            scored = stats.scored,
            filtered = stats.filtered,
            failed = stats.failed,
            distinct_evidence = memo.len(),
            returned = candidates.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations generated"
        );

        candidates
    }

    /// Scores one book, or returns `None` if it is filtered out
    fn score_book(
        &self,
        book: &CatalogBook,
        preferred_genres: &[String],
        favorite_texts: &[String],
        scorer: &mut ContentScorer,
        memo: &mut HashMap<Evidence, f64>,
    ) -> Result<Option<ScoredCandidate>, ModelError> {
        let genre_match = self.genres.classify(&book.genres, preferred_genres);
        let content_match = scorer.similarity(&book.content_text(), favorite_texts);

        if content_match < CONTENT_FILTER_THRESHOLD && genre_match == MatchLevel::Low {
            return Ok(None);
        }

        let evidence = Evidence::from_signals(genre_match, content_match, book.average_rating)?;
        let recommend_probability = *memo
            .entry(evidence)
            .or_insert_with(|| self.model.posterior(&evidence));

        Ok(Some(ScoredCandidate {
            book: book.clone(),
            genre_match,
            content_match,
            recommend_probability,
        }))
    }
}

/// Generates recommendations for a stored user and writes them back
///
/// 1. Fetch preferred genres and read history from the document store
/// 2. Rank the catalog on the blocking pool (pure CPU work)
/// 3. Post the ranked books back to the store
pub async fn recommend_for_user(
    store: Arc<dyn DocumentStore>,
    recommender: Arc<Recommender>,
    catalog: Arc<Vec<CatalogBook>>,
    user_id: &str,
) -> AppResult<Vec<ScoredCandidate>> {
    let profile = fetch_profile(store.as_ref(), user_id).await?;

    let recommendations =
        tokio::task::spawn_blocking(move || recommender.rank(&profile, &catalog))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

    store.post_recommendations(user_id, &recommendations).await?;

    Ok(recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MockDocumentStore;
    use chrono::{TimeZone, Utc};

    fn read_book(author: &str, description: &str, rating: f64, day: Option<u32>) -> ReadBook {
        ReadBook {
            title: None,
            author: author.to_string(),
            description: description.to_string(),
            rating,
            timestamp: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()),
        }
    }

    fn catalog_book(title: &str, genres: &[&str], description: &str, rating: f64) -> CatalogBook {
        CatalogBook {
            title: title.to_string(),
            authors: vec![format!("{} Author", title)],
            genres: genres.iter().map(|g| g.to_string()).collect(),
            description: description.to_string(),
            average_rating: rating,
            ..Default::default()
        }
    }

    #[test]
    fn test_select_favorites_orders_by_rating_then_earliest_timestamp() {
        let books = vec![
            read_book("a", "", 3.0, Some(1)),
            read_book("b", "", 5.0, Some(9)),
            read_book("c", "", 5.0, Some(2)),
            read_book("d", "", 4.0, None),
        ];

        let authors: Vec<&str> = select_favorites(&books, 10)
            .iter()
            .map(|b| b.author.as_str())
            .collect();
        assert_eq!(authors, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_select_favorites_missing_timestamp_sorts_first_on_ties() {
        let books = vec![
            read_book("stamped", "", 4.0, Some(1)),
            read_book("unstamped", "", 4.0, None),
        ];
        let favorites = select_favorites(&books, 10);
        assert_eq!(favorites[0].author, "unstamped");
    }

    #[test]
    fn test_select_favorites_limits_count() {
        let books: Vec<ReadBook> = (1..=15)
            .map(|d| read_book("x", "", d as f64 / 3.0, Some(d)))
            .collect();
        let favorites = select_favorites(&books, FAVORITES_LIMIT);
        assert_eq!(favorites.len(), FAVORITES_LIMIT);
        assert_eq!(favorites[0].rating, 5.0);
    }

    #[test]
    fn test_low_genre_and_low_content_is_filtered() {
        let recommender = Recommender::standard().unwrap();
        let profile = UserProfile::new(vec!["Romance".to_string()], Vec::new());
        let catalog = vec![catalog_book("Stew", &["Cookbooks"], "pasta recipes", 4.5)];

        assert!(recommender.rank(&profile, &catalog).is_empty());
    }

    #[test]
    fn test_medium_genre_with_zero_content_is_kept() {
        let recommender = Recommender::standard().unwrap();
        let profile = UserProfile::new(vec!["Science Fiction".to_string()], Vec::new());
        let catalog = vec![catalog_book("Dragons", &["Fantasy"], "epic quest", 4.0)];

        let ranked = recommender.rank(&profile, &catalog);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].genre_match, MatchLevel::Medium);
        assert_eq!(ranked[0].content_match, 0.0);
    }

    #[test]
    fn test_content_match_alone_passes_filter() {
        let recommender = Recommender::standard().unwrap();
        let profile = UserProfile::new(
            Vec::new(),
            vec![read_book("Ann Leckie", "ancillary justice empire", 5.0, None)],
        );
        let mut book = catalog_book("Sword", &["Science Fiction"], "ancillary justice empire", 4.3);
        book.authors = vec!["Ann Leckie".to_string()];

        let ranked = recommender.rank(&profile, &[book]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].genre_match, MatchLevel::Low);
        assert!(ranked[0].content_match > 0.99);
    }

    #[test]
    fn test_non_finite_rating_excludes_only_that_book() {
        let recommender = Recommender::standard().unwrap();
        let profile = UserProfile::new(vec!["Horror".to_string()], Vec::new());
        let catalog = vec![
            catalog_book("Broken", &["Horror"], "ghosts", f64::NAN),
            catalog_book("Fine", &["Horror"], "ghosts", 4.0),
        ];

        let ranked = recommender.rank(&profile, &catalog);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].book.title, "Fine");
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let recommender = Recommender::standard().unwrap();
        let profile = UserProfile::new(vec!["Horror".to_string()], Vec::new());
        let catalog: Vec<CatalogBook> = ["first", "second", "third"]
            .iter()
            .map(|t| catalog_book(t, &["Horror"], "", 4.0))
            .collect();

        let titles: Vec<String> = recommender
            .rank(&profile, &catalog)
            .into_iter()
            .map(|c| c.book.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_probability_matches_model() {
        let recommender = Recommender::standard().unwrap();
        let profile = UserProfile::new(vec!["Horror".to_string()], Vec::new());
        let catalog = vec![catalog_book("Carrie", &["Horror"], "telekinesis", 3.9)];

        let ranked = recommender.rank(&profile, &catalog);
        let expected = recommender
            .model()
            .infer(MatchLevel::High, 0.0, 3.9)
            .unwrap();
        assert_eq!(ranked[0].recommend_probability, expected);
    }

    #[tokio::test]
    async fn test_recommend_for_user_posts_ranked_books() {
        let mut store = MockDocumentStore::new();
        store
            .expect_fetch_preferred_genres()
            .returning(|_| Ok(vec!["Fantasy".to_string()]));
        store.expect_fetch_read_books().returning(|_| Ok(Vec::new()));
        store.expect_name().return_const("mock");
        store
            .expect_post_recommendations()
            .withf(|user_id, recommendations| {
                user_id == "reader-1" && recommendations.len() == 1
            })
            .times(1)
            .returning(|_, _| Ok(vec!["doc-1".to_string()]));

        let catalog = vec![
            catalog_book("Dragons", &["Fantasy"], "epic quest", 4.5),
            catalog_book("Stew", &["Cookbooks"], "pasta recipes", 4.5),
        ];

        let recommendations = recommend_for_user(
            Arc::new(store),
            Arc::new(Recommender::standard().unwrap()),
            Arc::new(catalog),
            "reader-1",
        )
        .await
        .unwrap();

        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].book.title, "Dragons");
    }

    #[tokio::test]
    async fn test_recommend_for_user_does_not_post_when_fetch_fails() {
        let mut store = MockDocumentStore::new();
        store
            .expect_fetch_preferred_genres()
            .returning(|_| Err(AppError::DocumentStore("unavailable".to_string())));
        store.expect_post_recommendations().never();

        let result = recommend_for_user(
            Arc::new(store),
            Arc::new(Recommender::standard().unwrap()),
            Arc::new(Vec::new()),
            "reader-1",
        )
        .await;

        assert!(matches!(result, Err(AppError::DocumentStore(_))));
    }
}
