use std::{fs::File, io::Read, path::Path};

use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{parse_name_list, CatalogBook, FieldParseError, GenreField},
};

/// One row of the enriched books dataset. Columns not listed here are ignored.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: String,
    #[serde(default)]
    genres: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    average_rating: Option<String>,
    #[serde(default)]
    isbn: String,
    #[serde(default)]
    isbn13: String,
    #[serde(default)]
    image_url: String,
}

impl TryFrom<CatalogRow> for CatalogBook {
    type Error = FieldParseError;

    fn try_from(row: CatalogRow) -> Result<Self, Self::Error> {
        let average_rating = row
            .average_rating
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|rating| rating.is_finite())
            .unwrap_or(0.0);

        Ok(CatalogBook {
            title: row.title,
            authors: parse_name_list(&row.authors)?,
            genres: GenreField::from(row.genres).into_genres()?,
            description: row.description.unwrap_or_default(),
            average_rating,
            isbn10: row.isbn,
            isbn13: row.isbn13,
            cover_image_url: row.image_url,
        })
    }
}

/// Loads the candidate catalog from a CSV file
pub fn load_catalog(path: impl AsRef<Path>) -> AppResult<Vec<CatalogBook>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let catalog = read_catalog(file)?;

    tracing::info!(path = %path.display(), books = catalog.len(), "Catalog loaded");
    Ok(catalog)
}

/// Reads catalog rows, skipping rows that cannot be parsed
pub fn read_catalog<R: Read>(reader: R) -> AppResult<Vec<CatalogBook>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    reader.headers()?;

    let mut books = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in reader.deserialize::<CatalogRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                skipped += 1;
                tracing::warn!(row = index + 1, error = %e, "Skipping unreadable catalog row");
                continue;
            }
        };

        let title = row.title.clone();
        match CatalogBook::try_from(row) {
            Ok(book) => books.push(book),
            Err(e) => {
                skipped += 1;
                tracing::warn!(row = index + 1, title = %title, error = %e, "Skipping catalog row with malformed list field");
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, loaded = books.len(), "Some catalog rows were skipped");
    }

    Ok(books)
}
