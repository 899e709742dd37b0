//! Fixed discrete Bayesian network behind recommendation probabilities.
//!
//! Structure (parent -> child):
//!
//! ```text
//! GenreMatch ---\
//! ContentMatch ---> Rating ---> Recommendation
//! AvgRating ----/
//! ```
//!
//! The three roots are always observed at query time, so exact inference is a
//! column lookup in the Rating table followed by a three-term sum against the
//! Recommendation table.

use thiserror::Error;

use crate::models::MatchLevel;

/// Number of states of every evidence variable and of `Rating`
pub const LEVELS: usize = 3;

/// Number of joint parent configurations of `Rating`
pub const RATING_COLUMNS: usize = LEVELS * LEVELS * LEVELS;

const COLUMN_SUM_TOLERANCE: f64 = 1e-6;

/// Content similarity bin edges
pub const CONTENT_MEDIUM_THRESHOLD: f64 = 0.3;
pub const CONTENT_HIGH_THRESHOLD: f64 = 0.5;

/// Average rating bin edges
pub const RATING_MEDIUM_THRESHOLD: f64 = 3.5;
pub const RATING_HIGH_THRESHOLD: f64 = 4.2;

/// Root marginal of GenreMatch, listed low, medium, high
pub const GENRE_MATCH_PRIOR: [f64; LEVELS] = [0.45, 0.35, 0.20];

/// Root marginal of ContentMatch
pub const CONTENT_MATCH_PRIOR: [f64; LEVELS] = [0.50, 0.35, 0.15];

/// Root marginal of AvgRating
pub const AVG_RATING_PRIOR: [f64; LEVELS] = [0.20, 0.50, 0.30];

/// P(Rating | GenreMatch, ContentMatch, AvgRating).
/// Rows are Rating low, medium, high; column index is `g * 9 + c * 3 + a`.
#[rustfmt::skip]
pub const RATING_CPT: [[f64; RATING_COLUMNS]; LEVELS] = [
    [
        0.95, 0.90, 0.85, 0.70, 0.65, 0.60, 0.45, 0.40, 0.35,
        0.65, 0.60, 0.55, 0.40, 0.35, 0.30, 0.25, 0.20, 0.15,
        0.40, 0.35, 0.30, 0.25, 0.20, 0.15, 0.15, 0.10, 0.05,
    ],
    [
        0.04, 0.08, 0.12, 0.25, 0.28, 0.30, 0.40, 0.42, 0.45,
        0.30, 0.32, 0.35, 0.45, 0.47, 0.50, 0.45, 0.47, 0.50,
        0.45, 0.47, 0.50, 0.45, 0.47, 0.50, 0.35, 0.37, 0.40,
    ],
    [
        0.01, 0.02, 0.03, 0.05, 0.07, 0.10, 0.15, 0.18, 0.20,
        0.05, 0.08, 0.10, 0.15, 0.18, 0.20, 0.30, 0.33, 0.35,
        0.15, 0.18, 0.20, 0.30, 0.33, 0.35, 0.50, 0.53, 0.55,
    ],
];

/// P(Recommendation | Rating). Rows are not-recommend, recommend.
pub const RECOMMENDATION_CPT: [[f64; LEVELS]; 2] = [[0.98, 0.60, 0.20], [0.02, 0.40, 0.80]];

/// Index of the "recommend" outcome
const RECOMMEND: usize = 1;

/// Errors from building or querying the model
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("{table}: expected {expected} {axis}, found {found}")]
    Cardinality {
        table: &'static str,
        axis: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{table}: column {column} sums to {sum}, expected 1")]
    ColumnSum {
        table: &'static str,
        column: usize,
        sum: f64,
    },
    #[error("{table}: entry {value} at row {row}, column {column} is not a probability")]
    InvalidProbability {
        table: &'static str,
        row: usize,
        column: usize,
        value: f64,
    },
    #[error("{signal} must be a finite number, got {value}")]
    NonFiniteEvidence { signal: &'static str, value: f64 },
}

/// Conditional probability tables of the network, row-major per variable.
///
/// Each table is `states x parent configurations`; the roots have a single
/// column.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkTables {
    pub genre_match: Vec<Vec<f64>>,
    pub content_match: Vec<Vec<f64>>,
    pub avg_rating: Vec<Vec<f64>>,
    pub rating: Vec<Vec<f64>>,
    pub recommendation: Vec<Vec<f64>>,
}

impl Default for NetworkTables {
    fn default() -> Self {
        let column = |prior: [f64; LEVELS]| -> Vec<Vec<f64>> {
            prior.iter().map(|&p| vec![p]).collect()
        };
        Self {
            genre_match: column(GENRE_MATCH_PRIOR),
            content_match: column(CONTENT_MATCH_PRIOR),
            avg_rating: column(AVG_RATING_PRIOR),
            rating: RATING_CPT.iter().map(|row| row.to_vec()).collect(),
            recommendation: RECOMMENDATION_CPT.iter().map(|row| row.to_vec()).collect(),
        }
    }
}

impl NetworkTables {
    /// Checks shapes and that every column is a probability distribution
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_table("GenreMatch", &self.genre_match, LEVELS, 1)?;
        validate_table("ContentMatch", &self.content_match, LEVELS, 1)?;
        validate_table("AvgRating", &self.avg_rating, LEVELS, 1)?;
        validate_table("Rating", &self.rating, LEVELS, RATING_COLUMNS)?;
        validate_table("Recommendation", &self.recommendation, 2, LEVELS)?;
        Ok(())
    }
}

fn validate_table(
    table: &'static str,
    values: &[Vec<f64>],
    states: usize,
    columns: usize,
) -> Result<(), ModelError> {
    if values.len() != states {
        return Err(ModelError::Cardinality {
            table,
            axis: "states",
            expected: states,
            found: values.len(),
        });
    }

    for row in values {
        if row.len() != columns {
            return Err(ModelError::Cardinality {
                table,
                axis: "parent configurations",
                expected: columns,
                found: row.len(),
            });
        }
    }

    for column in 0..columns {
        let mut sum = 0.0;
        for (row, values) in values.iter().enumerate() {
            let value = values[column];
            if !(0.0..=1.0).contains(&value) {
                return Err(ModelError::InvalidProbability {
                    table,
                    row,
                    column,
                    value,
                });
            }
            sum += value;
        }
        if (sum - 1.0).abs() > COLUMN_SUM_TOLERANCE {
            return Err(ModelError::ColumnSum { table, column, sum });
        }
    }

    Ok(())
}

/// Fully observed, discretized evidence for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Evidence {
    pub genre_match: usize,
    pub content_match: usize,
    pub avg_rating: usize,
}

impl Evidence {
    /// Discretizes raw signals.
    ///
    /// GenreMatch is indexed high, medium, low (0, 1, 2), the reverse of the
    /// order `GENRE_MATCH_PRIOR` is written in; queries depend on this order.
    pub fn from_signals(
        genre_match: MatchLevel,
        content_match: f64,
        avg_rating: f64,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            genre_match: genre_index(genre_match),
            content_match: content_bin(finite("content match", content_match)?),
            avg_rating: rating_bin(finite("average rating", avg_rating)?),
        })
    }

    fn rating_column(&self) -> usize {
        self.genre_match * LEVELS * LEVELS + self.content_match * LEVELS + self.avg_rating
    }
}

fn finite(signal: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::NonFiniteEvidence { signal, value })
    }
}

pub fn genre_index(level: MatchLevel) -> usize {
    match level {
        MatchLevel::High => 0,
        MatchLevel::Medium => 1,
        MatchLevel::Low => 2,
    }
}

pub fn content_bin(content_match: f64) -> usize {
    if content_match < CONTENT_MEDIUM_THRESHOLD {
        0
    } else if content_match < CONTENT_HIGH_THRESHOLD {
        1
    } else {
        2
    }
}

pub fn rating_bin(avg_rating: f64) -> usize {
    if avg_rating < RATING_MEDIUM_THRESHOLD {
        0
    } else if avg_rating < RATING_HIGH_THRESHOLD {
        1
    } else {
        2
    }
}

/// Validated network answering P(Recommendation = recommend | evidence)
#[derive(Debug, Clone)]
pub struct RecommendationModel {
    tables: NetworkTables,
}

impl RecommendationModel {
    /// Builds a model from the given tables, refusing invalid ones
    pub fn new(tables: NetworkTables) -> Result<Self, ModelError> {
        tables.validate()?;
        Ok(Self { tables })
    }

    /// Builds the model from the built-in tables
    pub fn standard() -> Result<Self, ModelError> {
        Self::new(NetworkTables::default())
    }

    /// P(Rating = r | evidence) for each rating state
    pub fn rating_distribution(&self, evidence: &Evidence) -> [f64; LEVELS] {
        let column = evidence.rating_column();
        let mut distribution = [0.0; LEVELS];
        for (state, row) in self.tables.rating.iter().enumerate() {
            distribution[state] = row[column];
        }
        distribution
    }

    /// Exact P(Recommendation = recommend | evidence), marginalizing Rating
    pub fn posterior(&self, evidence: &Evidence) -> f64 {
        let recommend = &self.tables.recommendation[RECOMMEND];
        self.rating_distribution(evidence)
            .iter()
            .zip(recommend)
            .map(|(p_rating, p_recommend)| p_rating * p_recommend)
            .sum()
    }

    /// Discretizes the signals and returns the recommend probability
    pub fn infer(
        &self,
        genre_match: MatchLevel,
        content_match: f64,
        avg_rating: f64,
    ) -> Result<f64, ModelError> {
        let evidence = Evidence::from_signals(genre_match, content_match, avg_rating)?;
        Ok(self.posterior(&evidence))
    }
}
