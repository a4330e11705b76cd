/// Read-through cache lookup around a fallible future.
///
/// A hit returns the cached value. A miss, or an unreachable cache, awaits `$fetch`,
/// queues the result for a background write with `$ttl` seconds to live, and returns
/// it. Errors from `$fetch` propagate with `?`.
///
/// `$cache` must provide `get_from_cache` and `set_in_background`.
///
/// ```rust,ignore
/// let items = cached!(cache, CacheKey::Popular { category, n }, 300, self.get_items(url));
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $fetch:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Some(hit) => Ok(hit),
            None => {
                let fresh = $fetch.await?;
                $cache.set_in_background(&$key, &fresh, $ttl);
                Ok(fresh)
            }
        }
    }};
}
