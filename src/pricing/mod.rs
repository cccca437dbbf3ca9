pub mod cache;
pub mod profit;
pub(crate) mod strategies;

use crate::config::AppConfig;
use crate::errors::PricingResult;
use crate::models::black_scholes::LinearVegaApprox;
use crate::state::{PricingRequest, StrikeQuote};
use cache::{CacheStats, Clock, PremiumCache, SystemClock};
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const LADDER_LEN: usize = 5;

/// Offsets of the strike ladder from the current price.
pub const LADDER_OFFSETS: [f64; LADDER_LEN] = [-0.10, -0.05, 0.0, 0.05, 0.10];

/// Default premium cache time-to-live.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Quotes for one request, in ladder order. Spreads hold four.
pub type QuoteLadder = SmallVec<[StrikeQuote; LADDER_LEN]>;

/// Strike prices centered on `current_price`.
#[inline]
pub fn strike_ladder(current_price: f64) -> [f64; LADDER_LEN] {
    LADDER_OFFSETS.map(|offset| current_price * (1.0 + offset))
}

/// Premium engine. Owns its cache and clock; wrap in a mutex to share.
pub struct PricingEngine {
    model: LinearVegaApprox,
    cache: PremiumCache,
    clock: Arc<dyn Clock>,
    computations: u64,
    cache_hits: u64,
}

impl PricingEngine {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, capacity: Option<usize>) -> Self {
        Self {
            model: LinearVegaApprox::new(),
            cache: PremiumCache::new(ttl, capacity),
            clock,
            computations: 0,
            cache_hits: 0,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(SystemClock),
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_capacity(),
        )
    }

    /// Premiums and profit zones for every usable rung of the strike ladder.
    ///
    /// Results may be up to one TTL stale. A rejected request computes and
    /// caches nothing.
    pub fn calculate_premiums(&mut self, request: &PricingRequest) -> PricingResult<Arc<QuoteLadder>> {
        request.validate()?;

        let key = serde_json::to_string(request)?;
        let now_ms = self.clock.now_ms();

        if let Some(hit) = self.cache.get(&key, now_ms) {
            self.cache_hits += 1;
            tracing::debug!(key = %key, "premium cache hit");
            return Ok(hit);
        }

        let started = Instant::now();
        let pricer = strategies::LegPricer::new(&self.model, request);
        let ladder = strike_ladder(request.current_price);
        let quotes = Arc::new(strategies::quote_ladder(&pricer, request.strategy, &ladder));
        self.computations += 1;

        tracing::debug!(
            strategy = %request.strategy,
            asset = %request.asset,
            quotes = quotes.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "premiums computed"
        );

        self.cache.insert(key, Arc::clone(&quotes), now_ms);
        Ok(quotes)
    }

    pub fn clear_cache(&mut self) {
        let dropped = self.cache.len();
        self.cache.clear();
        tracing::info!(dropped, "premium cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(self.clock.now_ms())
    }

    /// Number of fresh (uncached) computations so far.
    #[inline]
    pub fn computations(&self) -> u64 {
        self.computations
    }

    #[inline]
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }
}
