use std::collections::HashMap;

use crate::models::MatchLevel;

/// Genre vocabulary users can pick their preferences from
pub const KNOWN_GENRES: [&str; 39] = [
    "Art",
    "Biography",
    "Business",
    "Chick Lit",
    "Children's",
    "Christian",
    "Classics",
    "Comics",
    "Contemporary",
    "Cookbooks",
    "Crime",
    "Ebooks",
    "Fantasy",
    "Fiction",
    "Graphic Novels",
    "Historical Fiction",
    "History",
    "Horror",
    "Humor and Comedy",
    "Manga",
    "Memoir",
    "Music",
    "Mystery",
    "Nonfiction",
    "Paranormal",
    "Philosophy",
    "Poetry",
    "Psychology",
    "Religion",
    "Romance",
    "Science",
    "Science Fiction",
    "Self Help",
    "Suspense",
    "Spirituality",
    "Sports",
    "Thriller",
    "Travel",
    "Young Adult",
];

/// Hand-authored relations, keyed by lower-case genre.
/// Directional: `b` in `related(a)` says nothing about `a` in `related(b)`.
const RELATED_GENRES: [(&str, &[&str]); 39] = [
    ("art", &["history", "classics"]),
    ("biography", &["memoir", "history", "nonfiction"]),
    ("business", &["self help", "psychology", "nonfiction"]),
    ("chick lit", &["romance", "contemporary", "humor and comedy"]),
    ("children's", &["young adult", "fantasy", "comics"]),
    ("christian", &["religion", "spirituality", "self help"]),
    ("classics", &["fiction", "historical fiction", "philosophy"]),
    ("comics", &["graphic novels", "manga", "fantasy"]),
    ("contemporary", &["fiction", "romance", "chick lit"]),
    ("cookbooks", &["nonfiction", "self help", "travel"]),
    ("crime", &["mystery", "thriller", "suspense"]),
    ("ebooks", &["fiction", "nonfiction", "self help"]),
    ("fantasy", &["science fiction", "young adult", "fiction"]),
    ("fiction", &["historical fiction", "contemporary", "philosophy"]),
    ("graphic novels", &["comics", "manga", "fiction"]),
    ("historical fiction", &["history", "classics", "fiction"]),
    ("history", &["biography", "nonfiction", "philosophy"]),
    ("horror", &["thriller", "paranormal", "suspense"]),
    ("humor and comedy", &["chick lit", "fiction", "memoir"]),
    ("manga", &["comics", "graphic novels", "young adult"]),
    ("memoir", &["biography", "self help", "humor and comedy"]),
    ("music", &["biography", "history", "art"]),
    ("mystery", &["crime", "thriller", "fiction"]),
    ("nonfiction", &["biography", "history", "science"]),
    ("paranormal", &["horror", "fantasy", "thriller"]),
    ("philosophy", &["psychology", "classics", "religion"]),
    ("poetry", &["classics", "fiction", "memoir"]),
    ("psychology", &["self help", "philosophy", "science"]),
    ("religion", &["christian", "philosophy", "spirituality"]),
    ("romance", &["chick lit", "contemporary", "young adult"]),
    ("science", &["science fiction", "nonfiction", "psychology"]),
    ("science fiction", &["fantasy", "fiction", "thriller"]),
    ("self help", &["psychology", "nonfiction", "spirituality"]),
    ("suspense", &["thriller", "crime", "mystery"]),
    ("spirituality", &["religion", "self help", "philosophy"]),
    ("sports", &["biography", "nonfiction", "travel"]),
    ("thriller", &["crime", "mystery", "horror"]),
    ("travel", &["nonfiction", "cookbooks", "memoir"]),
    ("young adult", &["fantasy", "romance", "children's"]),
];

/// Static graph of related genres used to soften genre matching
#[derive(Debug, Clone)]
pub struct GenreGraph {
    relations: HashMap<&'static str, &'static [&'static str]>,
}

impl Default for GenreGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GenreGraph {
    /// Builds the graph from the built-in relation table
    pub fn new() -> Self {
        Self {
            relations: RELATED_GENRES.iter().copied().collect(),
        }
    }

    /// Genres related to `genre`, which must already be normalized.
    /// Unknown genres have no relations.
    pub fn related(&self, genre: &str) -> &'static [&'static str] {
        self.relations.get(genre).copied().unwrap_or(&[])
    }

    /// Whether `to` is listed as related to `from`
    pub fn is_related(&self, from: &str, to: &str) -> bool {
        self.related(from).contains(&to)
    }

    /// Decides how well a book's genres match a user's preferred genres.
    ///
    /// Any exact (case-insensitive) match is `High`. Failing that, a book genre
    /// whose related set contains a preferred genre is `Medium`. Otherwise `Low`.
    pub fn classify<B, P>(&self, book_genres: &[B], preferred_genres: &[P]) -> MatchLevel
    where
        B: AsRef<str>,
        P: AsRef<str>,
    {
        if book_genres.is_empty() {
            return MatchLevel::Low;
        }

        let book: Vec<String> = book_genres.iter().map(|g| normalize(g.as_ref())).collect();
        let preferred: Vec<String> = preferred_genres
            .iter()
            .map(|g| normalize(g.as_ref()))
            .collect();

        if book.iter().any(|genre| preferred.contains(genre)) {
            return MatchLevel::High;
        }

        let related = book.iter().any(|genre| {
            preferred
                .iter()
                .any(|user_genre| self.is_related(genre, user_genre))
        });

        if related {
            MatchLevel::Medium
        } else {
            MatchLevel::Low
        }
    }
}

fn normalize(genre: &str) -> String {
    genre.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_GENRES: [&str; 0] = [];

    #[test]
    fn test_empty_book_genres_is_low() {
        let graph = GenreGraph::new();
        assert_eq!(graph.classify(&NO_GENRES, &["Fantasy"]), MatchLevel::Low);
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let graph = GenreGraph::new();
        assert_eq!(graph.classify(&["Fantasy"], &["fantasy"]), MatchLevel::High);
        assert_eq!(
            graph.classify(&["  science FICTION "], &["Science Fiction"]),
            MatchLevel::High
        );
    }

    #[test]
    fn test_related_genre_is_medium() {
        let graph = GenreGraph::new();
        assert_eq!(
            graph.classify(&["Fantasy"], &["Science Fiction"]),
            MatchLevel::Medium
        );
    }

    #[test]
    fn test_unrelated_genre_is_low() {
        let graph = GenreGraph::new();
        assert_eq!(graph.classify(&["Cookbooks"], &["Romance"]), MatchLevel::Low);
    }

    #[test]
    fn test_no_preferences_is_low() {
        let graph = GenreGraph::new();
        assert_eq!(graph.classify(&["Fantasy"], &NO_GENRES), MatchLevel::Low);
    }

    #[test]
    fn test_direct_match_wins_over_earlier_related_genre() {
        let graph = GenreGraph::new();
        // "fantasy" relates to "science fiction", but a later exact match must still win
        assert_eq!(
            graph.classify(&["Fantasy", "Science Fiction"], &["Science Fiction"]),
            MatchLevel::High
        );
    }

    #[test]
    fn test_relation_is_directional() {
        let graph = GenreGraph::new();
        assert!(graph.is_related("art", "history"));
        assert!(!graph.is_related("history", "art"));
        // book genre "history" does not reach the "art" preference
        assert_eq!(graph.classify(&["History"], &["Art"]), MatchLevel::Low);
        assert_eq!(graph.classify(&["Art"], &["History"]), MatchLevel::Medium);
    }

    #[test]
    fn test_unknown_genre_has_no_relations() {
        let graph = GenreGraph::new();
        assert!(graph.related("steampunk").is_empty());
        assert_eq!(graph.classify(&["Steampunk"], &["Fantasy"]), MatchLevel::Low);
    }

    #[test]
    fn test_every_known_genre_has_relations() {
        let graph = GenreGraph::new();
        for genre in KNOWN_GENRES {
            assert!(
                !graph.related(&genre.to_lowercase()).is_empty(),
                "{genre} missing from relation table"
            );
        }
    }

    #[test]
    fn test_relations_stay_inside_vocabulary() {
        let graph = GenreGraph::new();
        let vocabulary: Vec<String> = KNOWN_GENRES.iter().map(|g| g.to_lowercase()).collect();
        for genre in &vocabulary {
            for related in graph.related(genre) {
                assert!(vocabulary.iter().any(|v| v == related), "{related}");
            }
        }
    }
}
