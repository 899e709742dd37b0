use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod fields;
pub mod user_profile;

pub use fields::{parse_literal_list, parse_name_list, FieldParseError, GenreField};
pub use user_profile::{ReadBook, UserProfile};

/// A candidate book from the static catalog dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogBook {
    pub title: String,
    /// Author names in dataset order
    pub authors: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub average_rating: f64,
    pub isbn10: String,
    pub isbn13: String,
    pub cover_image_url: String,
}

impl CatalogBook {
    /// Text compared against the user's favorites: author names followed by the description
    pub fn content_text(&self) -> String {
        let mut text = self.authors.join(" ");
        text.push(' ');
        text.push_str(&self.description);
        text
    }
}

/// Discretized genre affinity between a book and a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchLevel {
    Low,
    Medium,
    High,
}

impl Display for MatchLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchLevel::Low => write!(f, "low"),
            MatchLevel::Medium => write!(f, "medium"),
            MatchLevel::High => write!(f, "high"),
        }
    }
}

/// A catalog book together with the signals computed for one user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub book: CatalogBook,
    pub genre_match: MatchLevel,
    pub content_match: f64,
    pub recommend_probability: f64,
}

/// Request body for the recommendation endpoint
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(rename = "userID", default)]
    pub user_id: Option<String>,
}

/// Response body for the recommendation endpoint
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub status: &'static str,
    pub recommendations: Vec<ScoredCandidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_text_joins_authors_and_description() {
        let book = CatalogBook {
            title: "Good Omens".to_string(),
            authors: vec!["Terry Pratchett".to_string(), "Neil Gaiman".to_string()],
            description: "an angel and a demon".to_string(),
            ..Default::default()
        };
        assert_eq!(
            book.content_text(),
            "Terry Pratchett Neil Gaiman an angel and a demon"
        );
    }

    #[test]
    fn test_match_level_serialization() {
        assert_eq!(serde_json::to_string(&MatchLevel::High).unwrap(), "\"high\"");
        assert_eq!(MatchLevel::Medium.to_string(), "medium");
    }

    #[test]
    fn test_scored_candidate_flattens_book_fields() {
        let candidate = ScoredCandidate {
            book: CatalogBook {
                title: "Dune".to_string(),
                average_rating: 4.2,
                ..Default::default()
            },
            genre_match: MatchLevel::High,
            content_match: 0.5,
            recommend_probability: 0.3,
        };

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["title"], "Dune");
        assert_eq!(json["genre_match"], "high");
        assert_eq!(json["recommend_probability"], 0.3);
    }

    #[test]
    fn test_request_accepts_missing_user_id() {
        let request: RecommendationRequest = serde_json::from_str("{}").unwrap();
        assert!(request.user_id.is_none());

        let request: RecommendationRequest =
            serde_json::from_str(r#"{"userID": "abc123"}"#).unwrap();
        assert_eq!(request.user_id.as_deref(), Some("abc123"));
    }
}
