//! External collaborative-filtering scorer abstraction
//!
//! The scorer owns all ranking. This crate only forwards feedback to it and reads
//! ranked item keys back out of it. Components receive the scorer as an
//! `Arc<dyn Scorer>` so tests can substitute a fake with the same call contract.
use serde::Serialize;

use crate::{
    error::ScorerError,
    models::{Extra, FeedbackRecord},
};

pub mod gorse;

pub use gorse::GorseClient;

/// Feedback in the scorer's wire shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Feedback {
    pub feedback_type: String,
    pub user_id: String,
    pub item_id: String,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Extra>,
}

impl From<FeedbackRecord> for Feedback {
    fn from(record: FeedbackRecord) -> Self {
        Self {
            feedback_type: record.feedback_type.as_str().to_string(),
            user_id: record.user_id,
            item_id: record.item_key,
            timestamp: record.timestamp,
            extra: (!record.extra.is_empty()).then_some(record.extra),
        }
    }
}

/// Trait for recommendation scorers
///
/// Every list operation returns item keys in the scorer's ranking order. An empty
/// list is a valid answer, not an error.
#[async_trait::async_trait]
pub trait Scorer: Send + Sync {
    /// Ingest a single feedback record
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), ScorerError>;

    /// Personalized ranking for a user
    async fn recommend(
        &self,
        user_id: &str,
        category: Option<&str>,
        n: usize,
    ) -> Result<Vec<String>, ScorerError>;

    /// Most popular items across all users
    async fn popular(&self, category: Option<&str>, n: usize) -> Result<Vec<String>, ScorerError>;

    /// Most recently added items
    async fn latest(&self, category: Option<&str>, n: usize) -> Result<Vec<String>, ScorerError>;

    /// Items most similar to `item_key`
    async fn neighbors(
        &self,
        item_key: &str,
        category: Option<&str>,
        n: usize,
    ) -> Result<Vec<String>, ScorerError>;

    /// Scorer name for logging and debugging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeedbackType;
    use serde_json::json;

    #[test]
    fn test_feedback_wire_shape() {
        let mut extra = Extra::new();
        extra.insert("stay_time".to_string(), json!(45));

        let feedback = Feedback::from(FeedbackRecord {
            feedback_type: FeedbackType::Read,
            user_id: "u1".to_string(),
            item_key: "Dream of the Red Chamber".to_string(),
            timestamp: 1_700_000_000,
            extra,
        });

        assert_eq!(
            serde_json::to_value(&feedback).unwrap(),
            json!({
                "FeedbackType": "read",
                "UserId": "u1",
                "ItemId": "Dream of the Red Chamber",
                "Timestamp": 1_700_000_000,
                "Extra": { "stay_time": 45 }
            })
        );
    }

    #[test]
    fn test_feedback_omits_empty_extra() {
        let feedback = Feedback::from(FeedbackRecord {
            feedback_type: FeedbackType::View,
            user_id: "u1".to_string(),
            item_key: "Fortress Besieged".to_string(),
            timestamp: 1,
            extra: Extra::new(),
        });

        let value = serde_json::to_value(&feedback).unwrap();
        assert!(value.get("Extra").is_none());
        assert_eq!(value["FeedbackType"], "view");
    }
}
