use std::sync::Arc;

use crate::{
    error::DispatchError,
    models::FeedbackRecord,
    services::scorer::{Feedback, Scorer},
};

/// Forwards classified feedback to the scorer
///
/// Delivery is at-most-once: one call, no retry, and the record is consumed whether
/// or not the scorer accepted it.
#[derive(Clone)]
pub struct FeedbackDispatcher {
    scorer: Arc<dyn Scorer>,
}

impl FeedbackDispatcher {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    pub async fn dispatch(&self, record: FeedbackRecord) -> Result<(), DispatchError> {
        let feedback = Feedback::from(record);

        if let Err(e) = self.scorer.insert_feedback(&feedback).await {
            tracing::warn!(
                error = %e,
                scorer = self.scorer.name(),
                feedback_type = %feedback.feedback_type,
                user_id = %feedback.user_id,
                item_id = %feedback.item_id,
                "Feedback dispatch failed"
            );
            return Err(DispatchError(e));
        }

        Ok(())
    }
}
