use std::sync::Arc;

use crate::services::{CatalogLookup, RecommendationOptions, RecommendationService, Scorer};

/// Shared application state
///
/// Holds no per-request data; every handler works off the same stateless service.
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    /// Creates application state from the scorer and catalog collaborators
    pub fn new(
        scorer: Arc<dyn Scorer>,
        catalog: Arc<dyn CatalogLookup>,
        options: RecommendationOptions,
    ) -> Self {
        Self {
            recommendations: Arc::new(RecommendationService::new(scorer, catalog, options)),
        }
    }
}
