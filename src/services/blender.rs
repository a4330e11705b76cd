use std::fmt::Display;
use std::future::Future;

/// Percentage of a cold-start list allocated to popular items
pub const POPULAR_SHARE_PERCENT: usize = 60;

/// Builds a fallback ranking for users the scorer knows nothing about
///
/// Three stages, popularity first:
/// 1. `floor(limit * 0.6)` popular items. Failure here fails the blend, and the
///    call is made even when that share rounds down to zero.
/// 2. Latest items for the remainder. Failure is tolerated (treated as empty).
/// 3. If still short, one more popular request for the shortfall. Failure is
///    tolerated.
///
/// The result is truncated to `limit`, never padded. By default keys are not
/// deduplicated across sources, so a title that is both popular and new appears
/// twice; with `dedup` enabled each key is kept only at its first position and the
/// backfill asks the popular source for enough extra items to skip what it already
/// returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColdStartBlender {
    dedup: bool,
}

impl ColdStartBlender {
    pub fn new(dedup: bool) -> Self {
        Self { dedup }
    }

    pub async fn blend<P, PF, L, LF, E>(
        &self,
        limit: usize,
        mut popular: P,
        mut latest: L,
    ) -> Result<Vec<String>, E>
    where
        P: FnMut(usize) -> PF,
        PF: Future<Output = Result<Vec<String>, E>>,
        L: FnMut(usize) -> LF,
        LF: Future<Output = Result<Vec<String>, E>>,
        E: Display,
    {
        if limit == 0 {
            return Ok(Vec::new());
        }

        // Always asked, even for a zero share: popular being down fails the blend.
        let popular_limit = limit * POPULAR_SHARE_PERCENT / 100;
        let mut popular_items = popular(popular_limit).await?;
        popular_items.truncate(popular_limit);
        let popular_taken = popular_items.len();

        let mut items = Vec::with_capacity(limit);
        self.extend(&mut items, popular_items);

        let latest_limit = limit.saturating_sub(popular_taken);
        if latest_limit > 0 {
            match latest(latest_limit).await {
                Ok(mut latest_items) => {
                    latest_items.truncate(latest_limit);
                    self.extend(&mut items, latest_items);
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        requested = latest_limit,
                        "Latest source failed during cold-start blend, continuing without it"
                    );
                }
            }
        }

        if items.len() < limit {
            let shortfall = limit - items.len();
            let request = if self.dedup {
                popular_taken + shortfall
            } else {
                shortfall
            };

            match popular(request).await {
                Ok(more) => self.extend(&mut items, more),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        shortfall = shortfall,
                        "Popular backfill failed, returning partial cold-start list"
                    );
                }
            }
        }

        items.truncate(limit);

        tracing::debug!(
            limit = limit,
            popular = popular_taken,
            returned = items.len(),
            dedup = self.dedup,
            "Cold-start list blended"
        );

        Ok(items)
    }

    fn extend(&self, items: &mut Vec<String>, more: Vec<String>) {
        if self.dedup {
            for key in more {
                if !items.contains(&key) {
                    items.push(key);
                }
            }
        } else {
            items.extend(more);
        }
    }
}
