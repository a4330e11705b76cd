use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::LookupError,
    models::{Book, CatalogPage},
};

/// Batch lookup of catalog records by title
///
/// Results are unordered. Titles without a catalog entry simply produce no record.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find_by_titles(&self, titles: Vec<String>) -> Result<CatalogPage, LookupError>;
}

/// Turns ranked item keys into catalog records
///
/// The output keeps the ranking order of the input keys. This step is lossy: keys
/// with no catalog match are dropped, and a key repeated in the input yields its
/// record only once, at its first position.
#[derive(Clone)]
pub struct CatalogResolver {
    lookup: Arc<dyn CatalogLookup>,
}

impl CatalogResolver {
    pub fn new(lookup: Arc<dyn CatalogLookup>) -> Self {
        Self { lookup }
    }

    pub async fn resolve(&self, keys: &[String]) -> Result<Vec<Book>, LookupError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let page = self.lookup.find_by_titles(keys.to_vec()).await?;

        // Several catalog rows may share a title; the first one returned wins.
        let mut by_title: HashMap<String, Book> = HashMap::with_capacity(page.books.len());
        for book in page.books {
            by_title.entry(book.title.clone()).or_insert(book);
        }

        let books: Vec<Book> = keys
            .iter()
            .filter_map(|key| by_title.remove(key))
            .collect();

        if books.len() < keys.len() {
            tracing::debug!(
                requested = keys.len(),
                resolved = books.len(),
                "Some ranked items have no catalog record"
            );
        }

        Ok(books)
    }
}
