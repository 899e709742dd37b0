//! Firestore REST backend
//!
//! Collections used:
//! 1. `user/{uid}` → `preferredGenres`
//! 2. `lists/{uid}/already_read/*` → `bookId`, `rating`, `timestamp`
//! 3. `books/{bookId}` → `title`, `author`, `genre`, `description`
//! 4. `recommendations/{uid}` → `bookIDs`, `timestamp`, `userID` (written)
//!
//! Each recommended book is written as a new auto-id document in `books`.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{parse_name_list, ReadBook, ScoredCandidate},
    services::store::{BookRecord, DocumentStore},
};

const READ_LIST: &str = "already_read";
const PAGE_SIZE: &str = "300";

/// A typed Firestore field value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    pub fn string_array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::ArrayValue(ArrayValue {
            values: values
                .into_iter()
                .map(|v| Value::StringValue(v.into()))
                .collect(),
        })
    }

    pub fn timestamp(value: DateTime<Utc>) -> Self {
        Value::TimestampValue(value.to_rfc3339())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value; Firestore encodes 64-bit integers as strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::DoubleValue(d) => Some(*d),
            Value::IntegerValue(i) => i.parse::<i64>().ok().map(|i| i as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::TimestampValue(ts) => DateTime::parse_from_rfc3339(ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// String entries of an array, or a single string as a one-element list
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Value::ArrayValue(array) => Some(
                array
                    .values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            Value::StringValue(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}

/// A Firestore document as returned by the REST API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Document {
    /// Last path segment of the document name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Builds a read-history entry from a list entry and the book it points to.
///
/// Returns `None` when the entry has no usable rating.
fn read_book_from_documents(entry: &Document, book: &Document) -> Option<ReadBook> {
    let Some(rating) = entry.get("rating").and_then(Value::as_f64) else {
        tracing::warn!(entry = %entry.id(), "Read list entry has no rating, skipping");
        return None;
    };
    if !rating.is_finite() {
        tracing::warn!(entry = %entry.id(), rating, "Read list entry has a non-finite rating, skipping");
        return None;
    }

    let author = match book.get("author").and_then(Value::as_str) {
        Some(raw) => parse_name_list(raw)
            .unwrap_or_else(|_| vec![raw.trim().to_string()])
            .join(", "),
        None => {
            tracing::warn!(book_id = %book.id(), "No author found for book");
            "Unknown".to_string()
        }
    };

    let description = book
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .replace('"', "");

    Some(ReadBook {
        title: book
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        author,
        description,
        rating,
        timestamp: entry.get("timestamp").and_then(Value::as_timestamp),
    })
}

fn book_record_fields(record: &BookRecord) -> HashMap<String, Value> {
    HashMap::from([
        ("author".to_string(), Value::string(&record.author)),
        ("coverImageUrl".to_string(), Value::string(&record.cover_image_url)),
        ("description".to_string(), Value::string(&record.description)),
        ("genre".to_string(), Value::string_array(record.genre.iter().cloned())),
        ("isbn10".to_string(), Value::string(&record.isbn10)),
        ("isbn13".to_string(), Value::string(&record.isbn13)),
        ("title".to_string(), Value::string(&record.title)),
    ])
}

fn recommendation_index_fields(
    user_id: &str,
    book_ids: &[String],
    timestamp: DateTime<Utc>,
) -> HashMap<String, Value> {
    HashMap::from([
        ("bookIDs".to_string(), Value::string_array(book_ids.iter().cloned())),
        ("timestamp".to_string(), Value::timestamp(timestamp)),
        ("userID".to_string(), Value::string(user_id)),
    ])
}

#[derive(Clone)]
pub struct FirestoreStore {
    http_client: HttpClient,
    documents_url: String,
    access_token: Option<String>,
}

impl FirestoreStore {
    pub fn new(
        api_url: &str,
        project_id: &str,
        database: &str,
        access_token: Option<String>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            documents_url: format!(
                "{}/projects/{}/databases/{}/documents",
                api_url.trim_end_matches('/'),
                project_id,
                database
            ),
            access_token,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.documents_url, path)
    }

    async fn ensure_success(response: Response) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::DocumentStore(format!(
            "Firestore returned status {}: {}",
            status, body
        )))
    }

    /// Fetches a single document; `None` if it does not exist
    async fn get_document(&self, path: &str) -> AppResult<Option<Document>> {
        let response = self
            .authorize(self.http_client.get(self.url(path)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document = Self::ensure_success(response).await?.json().await?;
        Ok(Some(document))
    }

    /// Lists every document in a collection, following page tokens
    async fn list_documents(&self, collection: &str) -> AppResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let response = self
                .authorize(self.http_client.get(self.url(collection)))
                .query(&query)
                .send()
                .await?;

            // A collection that was never written to lists as not found on some emulators
            if response.status() == StatusCode::NOT_FOUND {
                break;
            }

            let page: ListDocumentsResponse = Self::ensure_success(response).await?.json().await?;
            documents.extend(page.documents);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    /// Creates a document with an auto-generated id and returns that id
    async fn create_document(
        &self,
        collection: &str,
        fields: HashMap<String, Value>,
    ) -> AppResult<String> {
        let body = Document {
            name: String::new(),
            fields,
        };
        let response = self
            .authorize(self.http_client.post(self.url(collection)))
            .json(&body)
            .send()
            .await?;

        let created: Document = Self::ensure_success(response).await?.json().await?;
        Ok(created.id().to_string())
    }

    /// Writes the given fields into a document, leaving other fields untouched
    async fn merge_document(&self, path: &str, fields: HashMap<String, Value>) -> AppResult<()> {
        let mask: Vec<(&str, String)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.clone()))
            .collect();
        let body = Document {
            name: String::new(),
            fields,
        };

        let response = self
            .authorize(self.http_client.patch(self.url(path)))
            .query(&mask)
            .json(&body)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreStore {
    async fn fetch_read_books(&self, user_id: &str) -> AppResult<Vec<ReadBook>> {
        let entries = self
            .list_documents(&format!("lists/{}/{}", user_id, READ_LIST))
            .await?;

        let mut read_books = Vec::with_capacity(entries.len());
        for entry in &entries {
            let Some(book_id) = entry.get("bookId").and_then(Value::as_str) else {
                tracing::warn!(entry = %entry.id(), "No bookId found for read list entry");
                continue;
            };

            let Some(book) = self.get_document(&format!("books/{}", book_id)).await? else {
                tracing::debug!(book_id = %book_id, "No book info found, skipping");
                continue;
            };

            if let Some(read_book) = read_book_from_documents(entry, &book) {
                read_books.push(read_book);
            }
        }

        tracing::info!(
            user_id = %user_id,
            entries = entries.len(),
            read_books = read_books.len(),
            "Read list fetched"
        );

        Ok(read_books)
    }

    async fn fetch_preferred_genres(&self, user_id: &str) -> AppResult<Vec<String>> {
        let user = self
            .get_document(&format!("user/{}", user_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        Ok(user
            .get("preferredGenres")
            .and_then(Value::as_string_list)
            .unwrap_or_default())
    }

    async fn post_recommendations(
        &self,
        user_id: &str,
        recommendations: &[ScoredCandidate],
    ) -> AppResult<Vec<String>> {
        let mut book_ids = Vec::with_capacity(recommendations.len());

        for candidate in recommendations {
            let record = BookRecord::from(candidate);
            match self
                .create_document("books", book_record_fields(&record))
                .await
            {
                Ok(id) => book_ids.push(id),
                Err(e) => {
                    tracing::error!(title = %record.title, error = %e, "Failed to post book");
                }
            }
        }

        self.merge_document(
            &format!("recommendations/{}", user_id),
            recommendation_index_fields(user_id, &book_ids, Utc::now()),
        )
        .await?;

        tracing::info!(
            user_id = %user_id,
            posted = book_ids.len(),
            requested = recommendations.len(),
            "Recommendations posted"
        );

        Ok(book_ids)
    }

    fn name(&self) -> &'static str {
        "firestore"
    }
}
