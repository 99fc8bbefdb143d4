/// Quote ingestion. One `QuoteSource` fans a snapshot rebuild out across
/// every configured (symbol, venue) pair as bounded subtasks, joins them,
/// and caches the assembled snapshot behind a freshness TTL. A venue that
/// fails or times out is simply absent from the snapshot.
use crate::config::EngineConfig;
use dashmap::DashMap;
use futures_util::future::join_all;
use parking_lot::Mutex;
use pool_core::telemetry::QUOTE_FETCH_ERRORS_TOTAL;
use pool_core::{QuoteSnapshot, VenueQuote};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(5);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(2);
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Venues quotes are pulled from. Credentials exist for a subset; the
/// rest are public-data only.
pub const QUOTE_VENUES: [&str; 5] = ["binance", "coinbase", "kraken", "kucoin", "huobi"];

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("venue fetch failed: {0}")]
    Fetch(String),
    #[error("venue fetch timed out")]
    Timeout,
    #[error("no venue returned data for any symbol")]
    Empty,
}

/// Per-venue market data feed.
#[async_trait::async_trait]
pub trait VenueFeed: Send + Sync {
    fn venue(&self) -> &str;

    async fn fetch(&self, symbol: &str) -> Result<VenueQuote, QuoteError>;
}

pub struct QuoteSource {
    feeds: Vec<Arc<dyn VenueFeed>>,
    symbols: Vec<String>,
    ttl: Duration,
    fetch_timeout: Duration,
    cached: Mutex<Option<(QuoteSnapshot, Instant)>>,
}

impl QuoteSource {
    pub fn new(
        feeds: Vec<Arc<dyn VenueFeed>>,
        symbols: Vec<String>,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            feeds,
            symbols,
            ttl,
            fetch_timeout,
            cached: Mutex::new(None),
        }
    }

    /// The freshest snapshot: the cached one while it is younger than the
    /// TTL, a full rebuild otherwise.
    pub async fn snapshot(&self) -> Result<QuoteSnapshot, QuoteError> {
        {
            let cached = self.cached.lock();
            if let Some((snapshot, at)) = cached.as_ref() {
                if at.elapsed() < self.ttl {
                    return Ok(snapshot.clone());
                }
            }
        }

        let snapshot = self.rebuild().await?;
        *self.cached.lock() = Some((snapshot.clone(), Instant::now()));
        Ok(snapshot)
    }

    async fn rebuild(&self) -> Result<QuoteSnapshot, QuoteError> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut tasks = Vec::with_capacity(self.symbols.len() * self.feeds.len());
        for symbol in &self.symbols {
            for feed in &self.feeds {
                let feed = Arc::clone(feed);
                let symbol = symbol.clone();
                let timeout = self.fetch_timeout;
                tasks.push(async move {
                    let venue = feed.venue().to_string();
                    let result = fetch_with_retry(feed.as_ref(), &symbol, timeout).await;
                    (symbol, venue, result)
                });
            }
        }

        let mut quotes: HashMap<String, HashMap<String, VenueQuote>> = HashMap::new();
        for (symbol, venue, result) in join_all(tasks).await {
            match result {
                Ok(quote) => {
                    quotes.entry(symbol).or_default().insert(venue, quote);
                }
                Err(e) => {
                    QUOTE_FETCH_ERRORS_TOTAL.with_label_values(&[venue.as_str()]).inc();
                    debug!("Dropping {}/{} from snapshot: {}", symbol, venue, e);
                }
            }
        }

        let snapshot = QuoteSnapshot { quotes, ts };
        if snapshot.is_empty() {
            warn!("Snapshot rebuild produced no quotes at all");
            return Err(QuoteError::Empty);
        }
        Ok(snapshot)
    }
}

/// One retry with a short backoff; transient venue hiccups should not
/// cost a whole cycle the pair.
async fn fetch_with_retry(
    feed: &dyn VenueFeed,
    symbol: &str,
    timeout: Duration,
) -> Result<VenueQuote, QuoteError> {
    let mut last_error = QuoteError::Timeout;
    for attempt in 0..2 {
        if attempt > 0 {
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
        match tokio::time::timeout(timeout, feed.fetch(symbol)).await {
            Ok(Ok(quote)) => return Ok(quote),
            Ok(Err(e)) => last_error = e,
            Err(_) => last_error = QuoteError::Timeout,
        }
    }
    Err(last_error)
}

/// Shared random-walk price state backing the simulated feeds, so every
/// venue's quotes wander around one mid price per symbol.
pub struct SimulatedMarket {
    base_prices: DashMap<String, f64>,
}

impl SimulatedMarket {
    pub fn new() -> Self {
        Self {
            base_prices: DashMap::new(),
        }
    }

    fn base_price(&self, symbol: &str) -> f64 {
        let mut entry = self
            .base_prices
            .entry(symbol.to_string())
            .or_insert_with(|| Self::reference_price(symbol));
        // Small random walk so consecutive snapshots differ
        let drift = 1.0 + rand::thread_rng().gen_range(-0.002..0.002);
        *entry *= drift;
        *entry
    }

    fn reference_price(symbol: &str) -> f64 {
        match symbol {
            "BTC/USDT" => 50_000.0,
            "ETH/USDT" => 3_000.0,
            "ADA/USDT" => 0.5,
            "DOT/USDT" => 15.0,
            "LINK/USDT" => 20.0,
            "XRP/USDT" => 0.6,
            "SOL/USDT" => 100.0,
            "DOGE/USDT" => 0.1,
            "AVAX/USDT" => 35.0,
            "MATIC/USDT" => 1.2,
            _ => 10.0,
        }
    }
}

/// Sandbox feed: venue-specific variation around the shared mid price,
/// a 0.05-0.25% book spread, and a 20% chance the venue does not list
/// the pair at all.
pub struct SimulatedFeed {
    venue: String,
    market: Arc<SimulatedMarket>,
    skip_probability: f64,
}

impl SimulatedFeed {
    pub fn new(venue: &str, market: Arc<SimulatedMarket>) -> Self {
        Self {
            venue: venue.to_string(),
            market,
            skip_probability: 0.2,
        }
    }

    pub fn always_listed(mut self) -> Self {
        self.skip_probability = 0.0;
        self
    }
}

#[async_trait::async_trait]
impl VenueFeed for SimulatedFeed {
    fn venue(&self) -> &str {
        &self.venue
    }

    async fn fetch(&self, symbol: &str) -> Result<VenueQuote, QuoteError> {
        let base = self.market.base_price(symbol);
        let (skip, variation, spread_fraction, volume) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen::<f64>() < self.skip_probability,
                0.98 + rng.gen::<f64>() * 0.04,
                0.0005 + rng.gen::<f64>() * 0.002,
                rng.gen_range(10.0..100.0),
            )
        };

        if skip {
            return Err(QuoteError::Fetch(format!(
                "{} not listed on {}",
                symbol, self.venue
            )));
        }

        let mid = base * variation;
        let spread = mid * spread_fraction;
        Ok(VenueQuote {
            bid: mid - spread / 2.0,
            ask: mid + spread / 2.0,
            volume,
            ts: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        })
    }
}

/// Build the source the engine runs with: one simulated feed per venue.
/// A live deployment swaps these for real venue connectors behind the
/// same trait.
pub fn build_quote_source(config: &EngineConfig) -> Arc<QuoteSource> {
    let market = Arc::new(SimulatedMarket::new());
    let feeds: Vec<Arc<dyn VenueFeed>> = QUOTE_VENUES
        .iter()
        .map(|venue| Arc::new(SimulatedFeed::new(venue, Arc::clone(&market))) as Arc<dyn VenueFeed>)
        .collect();
    Arc::new(QuoteSource::new(
        feeds,
        config.symbols(),
        DEFAULT_SNAPSHOT_TTL,
        DEFAULT_FETCH_TIMEOUT,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFeed {
        venue: String,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl VenueFeed for CountingFeed {
        fn venue(&self) -> &str {
            &self.venue
        }

        async fn fetch(&self, _symbol: &str) -> Result<VenueQuote, QuoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VenueQuote { bid: 99.0, ask: 100.0, volume: 10.0, ts: 0 })
        }
    }

    struct DeadFeed {
        venue: String,
    }

    #[async_trait::async_trait]
    impl VenueFeed for DeadFeed {
        fn venue(&self) -> &str {
            &self.venue
        }

        async fn fetch(&self, _symbol: &str) -> Result<VenueQuote, QuoteError> {
            Err(QuoteError::Fetch("maintenance".into()))
        }
    }

    fn source(feeds: Vec<Arc<dyn VenueFeed>>, ttl: Duration) -> QuoteSource {
        QuoteSource::new(
            feeds,
            vec!["BTC/USDT".to_string()],
            ttl,
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_snapshot_cached_within_ttl() {
        let feed = Arc::new(CountingFeed { venue: "binance".into(), calls: AtomicUsize::new(0) });
        let src = source(vec![feed.clone() as Arc<dyn VenueFeed>], Duration::from_secs(60));

        let first = src.snapshot().await.unwrap();
        let second = src.snapshot().await.unwrap();
        assert_eq!(first.ts, second.ts);
        // One rebuild, two fetches would mean the cache was bypassed
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_ttl_rebuilds() {
        let feed = Arc::new(CountingFeed { venue: "binance".into(), calls: AtomicUsize::new(0) });
        let src = source(vec![feed.clone() as Arc<dyn VenueFeed>], Duration::from_millis(0));

        src.snapshot().await.unwrap();
        src.snapshot().await.unwrap();
        assert!(feed.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_failing_venue_omitted() {
        let good: Arc<dyn VenueFeed> =
            Arc::new(CountingFeed { venue: "binance".into(), calls: AtomicUsize::new(0) });
        let bad: Arc<dyn VenueFeed> = Arc::new(DeadFeed { venue: "kraken".into() });
        let src = source(vec![good, bad], Duration::from_secs(60));

        let snapshot = src.snapshot().await.unwrap();
        let venues = &snapshot.quotes["BTC/USDT"];
        assert!(venues.contains_key("binance"));
        assert!(!venues.contains_key("kraken"));
    }

    #[tokio::test]
    async fn test_all_venues_failing_is_an_error() {
        let bad: Arc<dyn VenueFeed> = Arc::new(DeadFeed { venue: "kraken".into() });
        let src = source(vec![bad], Duration::from_secs(60));
        assert!(matches!(src.snapshot().await, Err(QuoteError::Empty)));
    }

    #[tokio::test]
    async fn test_simulated_feed_quotes_are_coherent() {
        let market = Arc::new(SimulatedMarket::new());
        let feed = SimulatedFeed::new("binance", market).always_listed();

        for _ in 0..50 {
            let quote = feed.fetch("BTC/USDT").await.unwrap();
            assert!(quote.bid < quote.ask);
            assert!(quote.volume >= 10.0);
            assert!(quote.bid > 0.0);
        }
    }
}
