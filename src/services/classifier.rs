use chrono::Utc;
use serde_json::Value;

use crate::{
    error::ValidationError,
    models::{BehaviorType, Extra, FeedbackRecord, FeedbackType, InteractionEvent},
};

/// Seconds on a book page after which a visit counts as reading
pub const DEFAULT_STAY_TIME_READ_THRESHOLD_SECS: i64 = 30;

/// Maps raw client interactions onto the scorer's feedback taxonomy
///
/// | behavior    | condition              | feedback |
/// |-------------|------------------------|----------|
/// | `view`      |                        | view     |
/// | `click`     |                        | click    |
/// | `read`      | `read_time_minutes`    | read     |
/// | `stay_time` | `>= threshold` seconds | read     |
/// | `stay_time` | `< threshold` seconds  | view     |
///
/// Client-supplied `extra` keys are merged last and win over the synthesized
/// `read_time` / `stay_time` keys.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorClassifier {
    stay_time_read_threshold_secs: i64,
}

impl Default for BehaviorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_STAY_TIME_READ_THRESHOLD_SECS)
    }
}

impl BehaviorClassifier {
    pub fn new(stay_time_read_threshold_secs: i64) -> Self {
        Self {
            stay_time_read_threshold_secs,
        }
    }

    /// Classifies an event, stamping it with the current time
    pub fn classify(&self, event: &InteractionEvent) -> Result<FeedbackRecord, ValidationError> {
        self.classify_at(event, Utc::now().timestamp())
    }

    /// Classifies an event with an explicit unix timestamp
    pub fn classify_at(
        &self,
        event: &InteractionEvent,
        timestamp: i64,
    ) -> Result<FeedbackRecord, ValidationError> {
        if event.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("user_id"));
        }
        if event.item_key.trim().is_empty() {
            return Err(ValidationError::MissingField("book_title"));
        }

        let (feedback_type, mut extra) = match event.behavior_type {
            BehaviorType::View => (FeedbackType::View, Extra::new()),
            BehaviorType::Click => (FeedbackType::Click, Extra::new()),
            BehaviorType::Read => {
                let minutes = required(event.read_time_minutes, "read_time_minutes", event)?;
                (FeedbackType::Read, synthesized("read_time", minutes))
            }
            BehaviorType::StayTime => {
                let seconds = required(event.stay_time_seconds, "stay_time_seconds", event)?;
                let feedback_type = if seconds >= self.stay_time_read_threshold_secs {
                    FeedbackType::Read
                } else {
                    FeedbackType::View
                };
                (feedback_type, synthesized("stay_time", seconds))
            }
        };

        extra.extend(event.extra.clone());

        Ok(FeedbackRecord {
            feedback_type,
            user_id: event.user_id.clone(),
            item_key: event.item_key.clone(),
            timestamp,
            extra,
        })
    }
}

fn required(
    value: Option<i64>,
    field: &'static str,
    event: &InteractionEvent,
) -> Result<i64, ValidationError> {
    match value {
        None => Err(ValidationError::MissingBehaviorField {
            field,
            behavior: event.behavior_type,
        }),
        Some(v) if v < 1 => Err(ValidationError::OutOfRange { field, value: v }),
        Some(v) => Ok(v),
    }
}

fn synthesized(key: &str, value: i64) -> Extra {
    let mut extra = Extra::new();
    extra.insert(key.to_string(), Value::from(value));
    extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TS: i64 = 1_700_000_000;

    fn classify(event: InteractionEvent) -> Result<FeedbackRecord, ValidationError> {
        BehaviorClassifier::default().classify_at(&event, TS)
    }

    fn extra_of(value: serde_json::Value) -> Extra {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_view_passes_through_extra() {
        let event = InteractionEvent::new("u1", "Walden", BehaviorType::View)
            .with_extra(extra_of(json!({ "source": "search" })));

        let record = classify(event).unwrap();

        assert_eq!(record.feedback_type, FeedbackType::View);
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.item_key, "Walden");
        assert_eq!(record.timestamp, TS);
        assert_eq!(record.extra, extra_of(json!({ "source": "search" })));
    }

    #[test]
    fn test_click_has_no_synthesized_extra() {
        let record = classify(InteractionEvent::new("u1", "Walden", BehaviorType::Click)).unwrap();
        assert_eq!(record.feedback_type, FeedbackType::Click);
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_read_records_read_time() {
        let event = InteractionEvent::new("u1", "Walden", BehaviorType::Read).with_read_time(12);

        let record = classify(event).unwrap();

        assert_eq!(record.feedback_type, FeedbackType::Read);
        assert_eq!(record.extra, extra_of(json!({ "read_time": 12 })));
    }

    #[test]
    fn test_read_without_minutes_is_rejected() {
        let result = classify(InteractionEvent::new("u1", "Walden", BehaviorType::Read));
        assert_eq!(
            result,
            Err(ValidationError::MissingBehaviorField {
                field: "read_time_minutes",
                behavior: BehaviorType::Read,
            })
        );
    }

    #[test]
    fn test_long_stay_becomes_read() {
        for seconds in [30, 31, 600] {
            let event =
                InteractionEvent::new("u1", "Walden", BehaviorType::StayTime).with_stay_time(seconds);

            let record = classify(event).unwrap();

            assert_eq!(record.feedback_type, FeedbackType::Read, "stay {}s", seconds);
            assert_eq!(record.extra["stay_time"], json!(seconds));
        }
    }

    #[test]
    fn test_short_stay_stays_view() {
        for seconds in [1, 15, 29] {
            let event =
                InteractionEvent::new("u1", "Walden", BehaviorType::StayTime).with_stay_time(seconds);

            let record = classify(event).unwrap();

            assert_eq!(record.feedback_type, FeedbackType::View, "stay {}s", seconds);
            assert_eq!(record.extra["stay_time"], json!(seconds));
        }
    }

    #[test]
    fn test_stay_time_without_seconds_is_rejected() {
        let result = classify(InteractionEvent::new("u1", "Walden", BehaviorType::StayTime));
        assert!(matches!(
            result,
            Err(ValidationError::MissingBehaviorField {
                field: "stay_time_seconds",
                ..
            })
        ));
    }

    #[test]
    fn test_non_positive_durations_are_rejected() {
        let result = classify(
            InteractionEvent::new("u1", "Walden", BehaviorType::StayTime).with_stay_time(0),
        );
        assert_eq!(
            result,
            Err(ValidationError::OutOfRange {
                field: "stay_time_seconds",
                value: 0,
            })
        );

        let result =
            classify(InteractionEvent::new("u1", "Walden", BehaviorType::Read).with_read_time(-3));
        assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_client_extra_wins_on_conflict() {
        let event = InteractionEvent::new("u1", "Walden", BehaviorType::StayTime)
            .with_stay_time(45)
            .with_extra(extra_of(json!({ "stay_time": "overridden", "page": 3 })));

        let record = classify(event).unwrap();

        assert_eq!(record.feedback_type, FeedbackType::Read);
        assert_eq!(record.extra["stay_time"], json!("overridden"));
        assert_eq!(record.extra["page"], json!(3));
    }

    #[test]
    fn test_configured_threshold() {
        let classifier = BehaviorClassifier::new(60);
        let event = InteractionEvent::new("u1", "Walden", BehaviorType::StayTime).with_stay_time(45);

        let record = classifier.classify_at(&event, TS).unwrap();

        assert_eq!(record.feedback_type, FeedbackType::View);
    }

    #[test]
    fn test_blank_identifiers_are_rejected() {
        let result = classify(InteractionEvent::new("", "Walden", BehaviorType::View));
        assert_eq!(result, Err(ValidationError::MissingField("user_id")));

        let result = classify(InteractionEvent::new("u1", "  ", BehaviorType::Click));
        assert_eq!(result, Err(ValidationError::MissingField("book_title")));
    }
}
