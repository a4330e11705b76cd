use serde::Serialize;

use super::Book;

/// Terminal output of a recommendation read
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResult {
    pub items: Vec<Book>,
    pub category: String,
    pub reason: String,
}

impl RecommendationResult {
    pub fn new(items: Vec<Book>, category: &str, reason: &str) -> Self {
        Self {
            items,
            category: category.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// One named shelf in the category overview
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationCategory {
    pub id: String,
    pub name: String,
    pub description: String,
    pub items: Vec<Book>,
    pub total: usize,
}
