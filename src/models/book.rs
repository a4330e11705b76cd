use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    error::BoxDynError,
    postgres::{PgTypeInfo, PgValueRef},
    Decode, Postgres, Type,
};

use crate::error::UnknownBookStatus;

/// Circulation state of a catalog copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
    Reserved,
    Maintenance,
    Lost,
    Damaged,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
            BookStatus::Reserved => "reserved",
            BookStatus::Maintenance => "maintenance",
            BookStatus::Lost => "lost",
            BookStatus::Damaged => "damaged",
        }
    }

    pub fn is_available(&self) -> bool {
        *self == BookStatus::Available
    }

    pub fn is_borrowed(&self) -> bool {
        *self == BookStatus::Borrowed
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = UnknownBookStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BookStatus::Available),
            "borrowed" => Ok(BookStatus::Borrowed),
            "reserved" => Ok(BookStatus::Reserved),
            "maintenance" => Ok(BookStatus::Maintenance),
            "lost" => Ok(BookStatus::Lost),
            "damaged" => Ok(BookStatus::Damaged),
            other => Err(UnknownBookStatus(other.to_string())),
        }
    }
}

// Stored as VARCHAR, so the text impls are reused rather than a Postgres enum type.
impl Type<Postgres> for BookStatus {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<Postgres>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

/// Full catalog record for a library book, as stored in `book_information`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub book_id: Option<String>,
    pub book_barcode: Option<String>,
    /// Title doubles as the item key shared with the scorer
    pub title: String,
    pub publication_number: Option<String>,
    pub primary_author: Option<String>,
    pub classification_number: Option<String>,
    pub language_code: Option<String>,
    pub edition: Option<String>,
    pub publisher: Option<String>,
    pub publication_place: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub distribution_unit: Option<String>,
    pub notes: Option<String>,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Minimal record with only a title set, used for fixtures and tests
    pub fn with_title(id: i64, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            book_id: None,
            book_barcode: None,
            title: title.into(),
            publication_number: None,
            primary_author: None,
            classification_number: None,
            language_code: None,
            edition: None,
            publisher: None,
            publication_place: None,
            publication_date: None,
            distribution_unit: None,
            notes: None,
            status: BookStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of a catalog batch lookup: unordered matches plus the match count
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub books: Vec<Book>,
    pub total: i64,
}

impl CatalogPage {
    /// Page whose total is the number of rows a single lookup returned
    pub fn from_books(books: Vec<Book>) -> Self {
        Self {
            total: books.len() as i64,
            books,
        }
    }
}
