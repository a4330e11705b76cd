use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Popular { category: String, n: usize },
    Latest { category: String, n: usize },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Popular { category, n } => write!(f, "popular:{}:{}", category, n),
            CacheKey::Latest { category, n } => write!(f, "latest:{}:{}", category, n),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Upper bound on writes sent in one pipeline
const MAX_WRITE_BATCH: usize = 32;

#[derive(Debug, Clone)]
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Best-effort cache for scorer lists
///
/// Reads that fail are reported as misses and writes happen on a background task,
/// so Redis being down never fails a request. Every read is bounded by `timeout`,
/// so an unresponsive Redis costs at most that much before the call falls through.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    timeout: Duration,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Sends a shutdown signal to the writer task, which flushes pending writes
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache instance with an async write background task
    pub async fn new(redis_client: Client, timeout: Duration) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, timeout, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            timeout,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx };

        (cache, handle)
    }

    /// Drains queued writes in pipelined batches until told to stop
    ///
    /// After the stop signal, whatever is already queued is flushed once more.
    async fn cache_writer_task(
        client: Client,
        timeout: Duration,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(first) = write_rx.recv() => {
                    let batch = drain_batch(first, &mut write_rx);
                    Self::flush(&client, timeout, batch).await;
                }
                _ = shutdown_rx.recv() => {
                    let mut remaining = Vec::new();
                    while let Ok(msg) = write_rx.try_recv() {
                        remaining.push(msg);
                    }
                    tracing::info!(pending = remaining.len(), "Cache writer shutting down");

                    for batch in remaining.chunks(MAX_WRITE_BATCH) {
                        Self::flush(&client, timeout, batch.to_vec()).await;
                    }
                    break;
                }
            }
        }
    }

    async fn flush(client: &Client, timeout: Duration, batch: Vec<CacheWriteMessage>) {
        let size = batch.len();
        if let Err(e) = Self::write_batch(client, timeout, batch).await {
            tracing::warn!(error = %e, batch = size, "Failed to write list cache batch");
        }
    }

    async fn write_batch(
        client: &Client,
        timeout: Duration,
        batch: Vec<CacheWriteMessage>,
    ) -> redis::RedisResult<()> {
        let mut pipe = redis::pipe();
        for msg in batch {
            pipe.set_ex(msg.key, msg.value, msg.ttl).ignore();
        }

        let mut conn = connect(client, timeout).await?;
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` on a miss, and also when Redis is unreachable or the stored
    /// payload no longer deserializes.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let cached = match tokio::time::timeout(self.timeout, self.read_raw(key)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, key = %key, "Redis get failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    key = %key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Redis read timed out"
                );
                return None;
            }
        };

        let json = cached?;
        match serde_json::from_str(&json) {
            Ok(data) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(data)
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache deserialization error");
                None
            }
        }
    }

    async fn read_raw(&self, key: &CacheKey) -> redis::RedisResult<Option<String>> {
        let mut conn = connect(&self.redis_client, self.timeout).await?;
        conn.get(key.to_string()).await
    }

    /// Stores a value in the cache without waiting for the write to complete
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

async fn connect(client: &Client, timeout: Duration) -> redis::RedisResult<MultiplexedConnection> {
    client
        .get_multiplexed_async_connection_with_timeouts(timeout, timeout)
        .await
}

/// Collects `first` plus whatever else is already queued, up to the batch limit
fn drain_batch(
    first: CacheWriteMessage,
    write_rx: &mut mpsc::UnboundedReceiver<CacheWriteMessage>,
) -> Vec<CacheWriteMessage> {
    let mut batch = vec![first];
    while batch.len() < MAX_WRITE_BATCH {
        match write_rx.try_recv() {
            Ok(msg) => batch.push(msg),
            Err(_) => break,
        }
    }
    batch
}
