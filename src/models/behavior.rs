use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt::Display, str::FromStr};

use crate::error::ValidationError;

/// Free-form attributes attached to an event or feedback record
pub type Extra = Map<String, Value>;

/// Interaction kinds a client may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorType {
    View,
    Click,
    Read,
    StayTime,
}

impl BehaviorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorType::View => "view",
            BehaviorType::Click => "click",
            BehaviorType::Read => "read",
            BehaviorType::StayTime => "stay_time",
        }
    }
}

impl Display for BehaviorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(BehaviorType::View),
            "click" => Ok(BehaviorType::Click),
            "read" => Ok(BehaviorType::Read),
            "stay_time" => Ok(BehaviorType::StayTime),
            "" => Err(ValidationError::MissingField("behavior_type")),
            other => Err(ValidationError::UnsupportedBehavior(other.to_string())),
        }
    }
}

/// Canonical feedback taxonomy understood by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    View,
    Click,
    Read,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::View => "view",
            FeedbackType::Click => "click",
            FeedbackType::Read => "read",
        }
    }
}

impl Display for FeedbackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw interaction reported by a client against a book title
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    pub user_id: String,
    pub item_key: String,
    pub behavior_type: BehaviorType,
    /// Seconds spent on the item page; required for `stay_time`
    pub stay_time_seconds: Option<i64>,
    /// Minutes spent reading; required for `read`
    pub read_time_minutes: Option<i64>,
    pub extra: Extra,
}

impl InteractionEvent {
    pub fn new(
        user_id: impl Into<String>,
        item_key: impl Into<String>,
        behavior_type: BehaviorType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_key: item_key.into(),
            behavior_type,
            stay_time_seconds: None,
            read_time_minutes: None,
            extra: Extra::new(),
        }
    }

    pub fn with_stay_time(mut self, seconds: i64) -> Self {
        self.stay_time_seconds = Some(seconds);
        self
    }

    pub fn with_read_time(mut self, minutes: i64) -> Self {
        self.read_time_minutes = Some(minutes);
        self
    }

    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }
}

/// A classified interaction, ready to be sent to the scorer exactly once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub feedback_type: FeedbackType,
    pub user_id: String,
    pub item_key: String,
    /// Unix seconds
    pub timestamp: i64,
    pub extra: Extra,
}
