//! Normalization of loosely-typed record fields.
//!
//! The catalog dataset stores list-valued columns as Python list literals
//! (`['fantasy', 'young-adult']`), and document store records hold a genre
//! either as a single string or as an array. Everything here turns those
//! shapes into plain `Vec<String>` before they reach the scoring code.

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while parsing a list literal
#[derive(Debug, Error, PartialEq)]
pub enum FieldParseError {
    #[error("expected a bracketed list, got {0:?}")]
    NotAList(String),
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
}

/// A genre value that may be stored as a single string or as a list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GenreField {
    List(Vec<String>),
    Single(String),
}

impl GenreField {
    /// Normalizes into a list of non-empty genre names.
    ///
    /// A single string that looks like a list literal is parsed as one;
    /// any other non-blank string is a one-genre list.
    pub fn into_genres(self) -> Result<Vec<String>, FieldParseError> {
        match self {
            GenreField::List(values) => Ok(values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()),
            GenreField::Single(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Ok(Vec::new())
                } else if trimmed.starts_with('[') {
                    parse_literal_list(trimmed)
                } else {
                    Ok(vec![trimmed.to_string()])
                }
            }
        }
    }
}

impl From<Option<String>> for GenreField {
    fn from(value: Option<String>) -> Self {
        GenreField::Single(value.unwrap_or_default())
    }
}

/// Parses a Python-style list of string literals, e.g. `['a', "b's"]`.
pub fn parse_literal_list(raw: &str) -> Result<Vec<String>, FieldParseError> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| FieldParseError::NotAList(trimmed.to_string()))?;

    // Offsets in errors are relative to the trimmed input
    let base = 1;
    let mut values = Vec::new();
    let mut chars = inner.char_indices().peekable();
    let mut expect_item = true;

    while let Some(&(offset, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            ',' if !expect_item => {
                expect_item = true;
                chars.next();
            }
            '\'' | '"' if expect_item => {
                let quote = ch;
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        c => value.push(c),
                    }
                }
                if !closed {
                    return Err(FieldParseError::UnterminatedString(base + offset));
                }
                values.push(value);
                expect_item = false;
            }
            other => {
                return Err(FieldParseError::UnexpectedChar {
                    ch: other,
                    offset: base + offset,
                })
            }
        }
    }

    Ok(values)
}

/// Parses a list of person names.
///
/// Accepts either a list literal or a comma-separated string; surrounding
/// whitespace and stray double quotes are removed from each name.
pub fn parse_name_list(raw: &str) -> Result<Vec<String>, FieldParseError> {
    let trimmed = raw.trim();
    let names = if trimmed.starts_with('[') {
        parse_literal_list(trimmed)?
    } else {
        trimmed.split(',').map(str::to_string).collect()
    };

    Ok(names
        .into_iter()
        .map(|name| name.trim().trim_matches('"').trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_list_single_quotes() {
        let parsed = parse_literal_list("['fantasy', 'young-adult', 'fiction']").unwrap();
        assert_eq!(parsed, vec!["fantasy", "young-adult", "fiction"]);
    }

    #[test]
    fn test_parse_literal_list_mixed_quotes_and_apostrophe() {
        let parsed = parse_literal_list(r#"["children's", 'comics']"#).unwrap();
        assert_eq!(parsed, vec!["children's", "comics"]);
    }

    #[test]
    fn test_parse_literal_list_escaped_quote() {
        let parsed = parse_literal_list(r"['children\'s']").unwrap();
        assert_eq!(parsed, vec!["children's"]);
    }

    #[test]
    fn test_parse_literal_list_empty() {
        assert!(parse_literal_list("[]").unwrap().is_empty());
        assert!(parse_literal_list("[ ]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_literal_list_trailing_comma() {
        let parsed = parse_literal_list("['fantasy',]").unwrap();
        assert_eq!(parsed, vec!["fantasy"]);
    }

    #[test]
    fn test_parse_literal_list_rejects_non_list() {
        assert!(matches!(
            parse_literal_list("fantasy"),
            Err(FieldParseError::NotAList(_))
        ));
    }

    #[test]
    fn test_parse_literal_list_rejects_unterminated() {
        assert!(matches!(
            parse_literal_list("['fantasy]"),
            Err(FieldParseError::UnterminatedString(_))
        ));
    }

    #[test]
    fn test_parse_literal_list_rejects_bare_words() {
        assert!(matches!(
            parse_literal_list("[fantasy]"),
            Err(FieldParseError::UnexpectedChar { ch: 'f', .. })
        ));
    }

    #[test]
    fn test_parse_literal_list_rejects_missing_separator() {
        assert!(parse_literal_list("['a' 'b']").is_err());
    }

    #[test]
    fn test_genre_field_single_value() {
        let genres = GenreField::Single(" Fantasy ".to_string()).into_genres().unwrap();
        assert_eq!(genres, vec!["Fantasy"]);
    }

    #[test]
    fn test_genre_field_blank_is_empty() {
        assert!(GenreField::Single("   ".to_string())
            .into_genres()
            .unwrap()
            .is_empty());
        assert!(GenreField::from(None).into_genres().unwrap().is_empty());
    }

    #[test]
    fn test_genre_field_literal_string() {
        let genres = GenreField::Single("['horror', 'thriller']".to_string())
            .into_genres()
            .unwrap();
        assert_eq!(genres, vec!["horror", "thriller"]);
    }

    #[test]
    fn test_genre_field_deserializes_both_shapes() {
        let single: GenreField = serde_json::from_str(r#""Romance""#).unwrap();
        assert_eq!(single, GenreField::Single("Romance".to_string()));

        let list: GenreField = serde_json::from_str(r#"["Romance", ""]"#).unwrap();
        assert_eq!(list.into_genres().unwrap(), vec!["Romance"]);
    }

    #[test]
    fn test_parse_name_list_literal() {
        let names = parse_name_list("['Suzanne Collins']").unwrap();
        assert_eq!(names, vec!["Suzanne Collins"]);
    }

    #[test]
    fn test_parse_name_list_comma_separated() {
        let names = parse_name_list(r#"Terry Pratchett, "Neil Gaiman""#).unwrap();
        assert_eq!(names, vec!["Terry Pratchett", "Neil Gaiman"]);
    }
}
