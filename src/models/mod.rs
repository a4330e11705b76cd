mod behavior;
mod book;
mod recommendation;

pub use behavior::{BehaviorType, Extra, FeedbackRecord, FeedbackType, InteractionEvent};
pub use book::{Book, BookStatus, CatalogPage};
pub use recommendation::{RecommendationCategory, RecommendationResult};
