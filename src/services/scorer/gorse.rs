//! Gorse recommender client
//!
//! Talks to the Gorse REST API. Item ids on the Gorse side are book titles, so path
//! segments are percent-encoded.
//!
//! API Flow:
//! 1. Feedback: POST /api/feedback
//! 2. Lists: /api/recommend/{user}, /api/popular, /api/latest, /api/item/{item}/neighbors
//!
//! Popular and latest lists are identical for every user, so they are cached in Redis
//! when a cache is attached.
use std::time::Duration;

use reqwest::{Client as HttpClient, Response, Url};
use serde::Deserialize;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::ScorerError,
    services::scorer::{Feedback, Scorer},
};

const API_KEY_HEADER: &str = "X-API-Key";

/// Gorse answers list endpoints either with bare ids or with scored entries
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemEntry {
    Id(String),
    Scored {
        #[serde(rename = "Id")]
        id: String,
    },
}

impl ItemEntry {
    fn into_id(self) -> String {
        match self {
            ItemEntry::Id(id) | ItemEntry::Scored { id } => id,
        }
    }
}

#[derive(Clone)]
pub struct GorseClient {
    http_client: HttpClient,
    endpoint: Url,
    api_key: String,
    cache: Option<Cache>,
    list_cache_ttl: u64,
}

impl GorseClient {
    /// Creates a client with a per-request timeout
    pub fn new(endpoint: &str, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("Gorse endpoint {} cannot be used as a base URL", endpoint);
        }

        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint,
            api_key,
            cache: None,
            list_cache_ttl: 0,
        })
    }

    /// Caches popular and latest lists for `ttl` seconds
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.list_cache_ttl = ttl;
        self
    }

    /// Builds `{endpoint}/{segments...}?n=..[&category=..]`
    fn list_url(&self, segments: &[&str], category: Option<&str>, n: usize) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("n", &n.to_string());
            if let Some(category) = category.filter(|c| !c.is_empty()) {
                query.append_pair("category", category);
            }
        }
        url
    }

    fn feedback_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "feedback"]);
        }
        url
    }

    async fn check_status(response: Response) -> Result<Response, ScorerError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = %status,
            body = %body,
            "Gorse request failed"
        );

        Err(ScorerError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_items(&self, url: Url) -> Result<Vec<String>, ScorerError> {
        tracing::debug!(url = %url, "Fetching item list from Gorse");

        let response = self
            .http_client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let response = Self::check_status(response).await?;

        let entries: Option<Vec<ItemEntry>> = response.json().await?;
        let items: Vec<String> = entries
            .unwrap_or_default()
            .into_iter()
            .map(ItemEntry::into_id)
            .collect();

        Ok(items)
    }

    /// Fetches a user-independent list, going through the cache when one is attached
    async fn get_shared_items(&self, key: CacheKey, url: Url) -> Result<Vec<String>, ScorerError> {
        match &self.cache {
            Some(cache) if self.list_cache_ttl > 0 => {
                cached!(cache, key, self.list_cache_ttl, self.get_items(url))
            }
            _ => self.get_items(url).await,
        }
    }
}

#[async_trait::async_trait]
impl Scorer for GorseClient {
    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), ScorerError> {
        let response = self
            .http_client
            .post(self.feedback_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(feedback)
            .send()
            .await?;

        Self::check_status(response).await?;

        tracing::info!(
            feedback_type = %feedback.feedback_type,
            user_id = %feedback.user_id,
            item_id = %feedback.item_id,
            "Feedback inserted"
        );

        Ok(())
    }

    async fn recommend(
        &self,
        user_id: &str,
        category: Option<&str>,
        n: usize,
    ) -> Result<Vec<String>, ScorerError> {
        let url = self.list_url(&["api", "recommend", user_id], category, n);
        let items = self.get_items(url).await?;

        tracing::info!(
            user_id = %user_id,
            requested = n,
            returned = items.len(),
            "Personalized recommendations fetched"
        );

        Ok(items)
    }

    async fn popular(&self, category: Option<&str>, n: usize) -> Result<Vec<String>, ScorerError> {
        let url = self.list_url(&["api", "popular"], category, n);
        let key = CacheKey::Popular {
            category: category.unwrap_or_default().to_string(),
            n,
        };
        self.get_shared_items(key, url).await
    }

    async fn latest(&self, category: Option<&str>, n: usize) -> Result<Vec<String>, ScorerError> {
        let url = self.list_url(&["api", "latest"], category, n);
        let key = CacheKey::Latest {
            category: category.unwrap_or_default().to_string(),
            n,
        };
        self.get_shared_items(key, url).await
    }

    async fn neighbors(
        &self,
        item_key: &str,
        category: Option<&str>,
        n: usize,
    ) -> Result<Vec<String>, ScorerError> {
        let url = self.list_url(&["api", "item", item_key, "neighbors"], category, n);
        let items = self.get_items(url).await?;

        tracing::info!(
            item = %item_key,
            requested = n,
            returned = items.len(),
            "Item neighbors fetched"
        );

        Ok(items)
    }

    fn name(&self) -> &'static str {
        "gorse"
    }
}
