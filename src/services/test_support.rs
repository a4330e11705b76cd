//! Scripted scorer and in-memory catalog used by service unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{LookupError, ScorerError};
use crate::models::{Book, CatalogPage};
use crate::services::catalog::CatalogLookup;
use crate::services::scorer::{Feedback, Scorer};

/// What a list endpoint answers with
#[derive(Debug, Clone)]
pub enum Source {
    /// Ranked pool; a request for `n` returns the first `n` entries
    Items(Vec<String>),
    Fail,
}

impl Default for Source {
    fn default() -> Self {
        Source::Items(Vec::new())
    }
}

impl Source {
    fn take(&self, n: usize) -> Result<Vec<String>, ScorerError> {
        match self {
            Source::Items(items) => Ok(items.iter().take(n).cloned().collect()),
            Source::Fail => Err(unavailable()),
        }
    }
}

pub fn unavailable() -> ScorerError {
    ScorerError::Status {
        status: 503,
        body: "scorer unavailable".to_string(),
    }
}

pub fn keys(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}{}", prefix, i)).collect()
}

#[derive(Default)]
pub struct FakeScorer {
    personalized: HashMap<String, Vec<String>>,
    recommend_fails: bool,
    popular: Source,
    latest: Source,
    neighbors: HashMap<String, Vec<String>>,
    neighbors_fail: bool,
    feedback_fails: bool,
    ignores_n: bool,
    feedback: Mutex<Vec<Feedback>>,
    feedback_attempts: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl FakeScorer {
    pub fn with_personalized(mut self, user_id: &str, items: Vec<String>) -> Self {
        self.personalized.insert(user_id.to_string(), items);
        self
    }

    pub fn failing_recommend(mut self) -> Self {
        self.recommend_fails = true;
        self
    }

    pub fn with_popular(mut self, items: Vec<String>) -> Self {
        self.popular = Source::Items(items);
        self
    }

    pub fn failing_popular(mut self) -> Self {
        self.popular = Source::Fail;
        self
    }

    pub fn with_latest(mut self, items: Vec<String>) -> Self {
        self.latest = Source::Items(items);
        self
    }

    pub fn failing_latest(mut self) -> Self {
        self.latest = Source::Fail;
        self
    }

    pub fn with_neighbors(mut self, item_key: &str, items: Vec<String>) -> Self {
        self.neighbors.insert(item_key.to_string(), items);
        self
    }

    pub fn failing_neighbors(mut self) -> Self {
        self.neighbors_fail = true;
        self
    }

    pub fn failing_feedback(mut self) -> Self {
        self.feedback_fails = true;
        self
    }

    /// Answers list calls with the whole pool regardless of `n`
    pub fn ignoring_n(mut self) -> Self {
        self.ignores_n = true;
        self
    }

    fn cap(&self, n: usize) -> usize {
        if self.ignores_n {
            usize::MAX
        } else {
            n
        }
    }

    pub fn sent_feedback(&self) -> Vec<Feedback> {
        self.feedback.lock().unwrap().clone()
    }

    pub fn feedback_attempts(&self) -> usize {
        self.feedback_attempts.load(Ordering::SeqCst)
    }

    /// Calls made so far, e.g. `popular:6`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl Scorer for FakeScorer {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), ScorerError> {
        self.feedback_attempts.fetch_add(1, Ordering::SeqCst);
        if self.feedback_fails {
            return Err(unavailable());
        }
        self.feedback.lock().unwrap().push(feedback.clone());
        Ok(())
    }

    async fn recommend(
        &self,
        user_id: &str,
        _category: Option<&str>,
        n: usize,
    ) -> Result<Vec<String>, ScorerError> {
        self.record(format!("recommend:{}:{}", user_id, n));
        if self.recommend_fails {
            return Err(unavailable());
        }
        Ok(self
            .personalized
            .get(user_id)
            .map(|items| items.iter().take(n).cloned().collect())
            .unwrap_or_default())
    }

    async fn popular(&self, _category: Option<&str>, n: usize) -> Result<Vec<String>, ScorerError> {
        self.record(format!("popular:{}", n));
        self.popular.take(self.cap(n))
    }

    async fn latest(&self, _category: Option<&str>, n: usize) -> Result<Vec<String>, ScorerError> {
        self.record(format!("latest:{}", n));
        self.latest.take(self.cap(n))
    }

    async fn neighbors(
        &self,
        item_key: &str,
        _category: Option<&str>,
        n: usize,
    ) -> Result<Vec<String>, ScorerError> {
        self.record(format!("neighbors:{}:{}", item_key, n));
        if self.neighbors_fail {
            return Err(unavailable());
        }
        Ok(self
            .neighbors
            .get(item_key)
            .map(|items| items.iter().take(self.cap(n)).cloned().collect())
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Catalog holding one record per known title
#[derive(Default)]
pub struct InMemoryCatalog {
    books: Vec<Book>,
    fails: bool,
    lookups: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn with_titles<S: AsRef<str>>(titles: &[S]) -> Self {
        Self {
            books: titles
                .iter()
                .enumerate()
                .map(|(i, t)| Book::with_title(i as i64 + 1, t.as_ref()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn find_by_titles(&self, titles: Vec<String>) -> Result<CatalogPage, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(LookupError::Backend("catalog offline".to_string()));
        }

        // Reverse storage order so callers cannot rely on the catalog's ordering.
        let books: Vec<Book> = self
            .books
            .iter()
            .rev()
            .filter(|b| titles.contains(&b.title))
            .cloned()
            .collect();

        Ok(CatalogPage::from_books(books))
    }
}
