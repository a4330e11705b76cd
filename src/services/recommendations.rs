use std::sync::Arc;

use tokio::task::JoinSet;

use crate::{
    error::AppResult,
    models::{FeedbackType, InteractionEvent, RecommendationCategory, RecommendationResult},
    services::{
        blender::ColdStartBlender,
        catalog::{CatalogLookup, CatalogResolver},
        classifier::{BehaviorClassifier, DEFAULT_STAY_TIME_READ_THRESHOLD_SECS},
        dispatcher::FeedbackDispatcher,
        scorer::Scorer,
    },
};

const PERSONALIZED_REASON: &str = "Recommended from your reading history";
const COLD_START_REASON: &str = "Popular and newly added titles to get you started";
const POPULAR_REASON: &str = "Most popular titles across all readers";
const SIMILAR_REASON: &str = "Readers of this title also engaged with these";

/// Policy knobs for the recommendation service
#[derive(Debug, Clone, Copy)]
pub struct RecommendationOptions {
    pub stay_time_read_threshold_secs: i64,
    pub blend_dedup: bool,
}

impl Default for RecommendationOptions {
    fn default() -> Self {
        Self {
            stay_time_read_threshold_secs: DEFAULT_STAY_TIME_READ_THRESHOLD_SECS,
            blend_dedup: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalSource {
    Popular,
    Latest,
}

struct CategoryDef {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    source: SignalSource,
}

static CATEGORIES: [CategoryDef; 2] = [
    CategoryDef {
        id: "popular",
        name: "Popular",
        description: "Most borrowed and viewed titles",
        source: SignalSource::Popular,
    },
    CategoryDef {
        id: "latest",
        name: "New arrivals",
        description: "Recently added to the library",
        source: SignalSource::Latest,
    },
];

/// Entry point for behavior tracking and every recommendation read
///
/// Writes go classifier → dispatcher → scorer. Reads go scorer → (blender when the
/// user has no history) → catalog resolver.
#[derive(Clone)]
pub struct RecommendationService {
    scorer: Arc<dyn Scorer>,
    classifier: BehaviorClassifier,
    dispatcher: FeedbackDispatcher,
    blender: ColdStartBlender,
    resolver: CatalogResolver,
}

impl RecommendationService {
    pub fn new(
        scorer: Arc<dyn Scorer>,
        catalog: Arc<dyn CatalogLookup>,
        options: RecommendationOptions,
    ) -> Self {
        Self {
            dispatcher: FeedbackDispatcher::new(Arc::clone(&scorer)),
            classifier: BehaviorClassifier::new(options.stay_time_read_threshold_secs),
            blender: ColdStartBlender::new(options.blend_dedup),
            resolver: CatalogResolver::new(catalog),
            scorer,
        }
    }

    /// Classifies an interaction and forwards it to the scorer
    ///
    /// Nothing is sent when validation fails.
    pub async fn record_behavior(&self, event: InteractionEvent) -> AppResult<FeedbackType> {
        let record = self.classifier.classify(&event)?;
        let feedback_type = record.feedback_type;

        self.dispatcher.dispatch(record).await?;

        tracing::info!(
            user_id = %event.user_id,
            item = %event.item_key,
            behavior = %event.behavior_type,
            feedback = %feedback_type,
            "Behavior recorded"
        );

        Ok(feedback_type)
    }

    /// Personalized list, falling back to a cold-start blend for users without history
    ///
    /// A scorer failure on the personalized call is returned as is; only an empty
    /// answer triggers the fallback.
    pub async fn get_recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> AppResult<RecommendationResult> {
        let mut keys = self.scorer.recommend(user_id, None, limit).await?;

        if !keys.is_empty() {
            keys.truncate(limit);
            let items = self.resolver.resolve(&keys).await?;
            return Ok(RecommendationResult::new(
                items,
                "personalized",
                PERSONALIZED_REASON,
            ));
        }

        tracing::info!(user_id = %user_id, limit = limit, "No personalization data, blending cold-start list");

        let scorer = self.scorer.as_ref();
        let keys = self
            .blender
            .blend(
                limit,
                |n| scorer.popular(None, n),
                |n| scorer.latest(None, n),
            )
            .await?;

        let items = self.resolver.resolve(&keys).await?;
        Ok(RecommendationResult::new(
            items,
            "cold_start",
            COLD_START_REASON,
        ))
    }

    /// Most popular titles, no fallback
    pub async fn get_popular(&self, limit: usize) -> AppResult<RecommendationResult> {
        let mut keys = self.scorer.popular(None, limit).await?;
        keys.truncate(limit);
        let items = self.resolver.resolve(&keys).await?;
        Ok(RecommendationResult::new(items, "popular", POPULAR_REASON))
    }

    /// Titles similar to `item_key`, no fallback
    pub async fn get_similar_items(
        &self,
        item_key: &str,
        limit: usize,
    ) -> AppResult<RecommendationResult> {
        let mut keys = self.scorer.neighbors(item_key, None, limit).await?;
        keys.truncate(limit);
        let items = self.resolver.resolve(&keys).await?;
        Ok(RecommendationResult::new(items, "similar", SIMILAR_REASON))
    }

    /// One shelf per category, each fetched independently
    ///
    /// A category whose fetch or resolution fails is left out of the result instead
    /// of failing the whole overview. Order follows the fixed category order.
    pub async fn get_category_recommendations(&self, limit: usize) -> Vec<RecommendationCategory> {
        let mut tasks = JoinSet::new();

        for (index, def) in CATEGORIES.iter().enumerate() {
            let scorer = Arc::clone(&self.scorer);
            let resolver = self.resolver.clone();
            tasks.spawn(async move { (index, fetch_category(scorer, resolver, def, limit).await) });
        }

        let mut slots: Vec<Option<RecommendationCategory>> = vec![None; CATEGORIES.len()];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(category))) => slots[index] = Some(category),
                Ok((index, Err(e))) => {
                    tracing::warn!(
                        category = CATEGORIES[index].id,
                        error = %e,
                        "Skipping recommendation category"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Category task join error");
                }
            }
        }

        let categories: Vec<RecommendationCategory> = slots.into_iter().flatten().collect();

        tracing::info!(
            requested = CATEGORIES.len(),
            returned = categories.len(),
            "Category recommendations assembled"
        );

        categories
    }
}

async fn fetch_category(
    scorer: Arc<dyn Scorer>,
    resolver: CatalogResolver,
    def: &'static CategoryDef,
    limit: usize,
) -> AppResult<RecommendationCategory> {
    let mut keys = match def.source {
        SignalSource::Popular => scorer.popular(None, limit).await?,
        SignalSource::Latest => scorer.latest(None, limit).await?,
    };
    keys.truncate(limit);

    let items = resolver.resolve(&keys).await?;

    Ok(RecommendationCategory {
        id: def.id.to_string(),
        name: def.name.to_string(),
        description: def.description.to_string(),
        total: items.len(),
        items,
    })
}
