pub mod blender;
pub mod catalog;
pub mod classifier;
pub mod dispatcher;
pub mod recommendations;
pub mod scorer;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{CatalogLookup, CatalogResolver};
pub use recommendations::{RecommendationOptions, RecommendationService};
pub use scorer::{Feedback, GorseClient, Scorer};
