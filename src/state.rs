use crate::config::AppConfig;
use crate::errors::{PricingError, PricingResult};
use crate::pricing::PricingEngine;
use portable_atomic::{AtomicU64, Ordering};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ── Request bounds ──

pub const MIN_AMOUNT_EXCLUSIVE: f64 = 0.0;
pub const MAX_AMOUNT: f64 = 1_000_000.0;
pub const MIN_PERIOD_DAYS: u32 = 7;
pub const MAX_PERIOD_DAYS: u32 = 90;
pub const MAX_CURRENT_PRICE: f64 = 1_000_000.0;

// ── Strategy ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Strategy {
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "STRAP")]
    Strap,
    #[serde(rename = "STRIP")]
    Strip,
    BullCallSpread,
    BullPutSpread,
    BearPutSpread,
    BearCallSpread,
}

/// Which side of the profit zone pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyFamily {
    /// Profits when settlement is above the zone.
    Bullish,
    /// Profits when settlement is below the zone.
    Bearish,
}

impl Strategy {
    pub const ALL: [Strategy; 8] = [
        Strategy::Call,
        Strategy::Put,
        Strategy::Strap,
        Strategy::Strip,
        Strategy::BullCallSpread,
        Strategy::BullPutSpread,
        Strategy::BearPutSpread,
        Strategy::BearCallSpread,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::Put => "PUT",
            Self::Strap => "STRAP",
            Self::Strip => "STRIP",
            Self::BullCallSpread => "BullCallSpread",
            Self::BullPutSpread => "BullPutSpread",
            Self::BearPutSpread => "BearPutSpread",
            Self::BearCallSpread => "BearCallSpread",
        }
    }

    /// Number of option legs in one unit of the position.
    pub fn legs(&self) -> u8 {
        match self {
            Self::Call | Self::Put => 1,
            Self::Strap | Self::Strip => 3,
            _ => 2,
        }
    }

    #[inline]
    pub fn is_spread(&self) -> bool {
        matches!(
            self,
            Self::BullCallSpread | Self::BullPutSpread | Self::BearPutSpread | Self::BearCallSpread
        )
    }

    /// Opened for a net credit; premium is reported negative.
    #[inline]
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::BullPutSpread | Self::BearCallSpread)
    }

    pub fn family(&self) -> StrategyFamily {
        match self {
            Self::Call | Self::Strap | Self::BullCallSpread | Self::BullPutSpread => {
                StrategyFamily::Bullish
            }
            Self::Put | Self::Strip | Self::BearPutSpread | Self::BearCallSpread => {
                StrategyFamily::Bearish
            }
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Strategy::ALL
            .iter()
            .copied()
            .find(|st| st.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                let names: Vec<&str> = Strategy::ALL.iter().map(|st| st.as_str()).collect();
                PricingError::InvalidParameter(format!(
                    "strategy must be one of {} (got '{trimmed}')",
                    names.join(", ")
                ))
            })
    }
}

// ── Asset (volatility regime) ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    #[default]
    Stx,
    Btc,
}

impl Asset {
    /// Annualized volatility used for the asset's regime.
    #[inline]
    pub fn volatility(&self) -> f64 {
        match self {
            Self::Stx => 0.65,
            Self::Btc => 0.50,
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stx => write!(f, "STX"),
            Self::Btc => write!(f, "BTC"),
        }
    }
}

impl FromStr for Asset {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STX" => Ok(Self::Stx),
            "BTC" => Ok(Self::Btc),
            other => Err(PricingError::InvalidParameter(format!(
                "asset must be one of STX, BTC (got '{other}')"
            ))),
        }
    }
}

// ── Pricing request ──

/// A typed pricing request. The serialized form is the cache key, so the
/// asset is always resolved (an absent asset and STX share an entry).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    pub amount: f64,
    pub period_days: u32,
    pub current_price: f64,
    pub strategy: Strategy,
    pub asset: Asset,
}

impl PricingRequest {
    pub fn new(
        amount: f64,
        period_days: u32,
        current_price: f64,
        strategy: Strategy,
        asset: Option<Asset>,
    ) -> Self {
        Self {
            amount,
            period_days,
            current_price,
            strategy,
            asset: asset.unwrap_or_default(),
        }
    }

    /// Check every bound before any computation happens.
    pub fn validate(&self) -> PricingResult<()> {
        if !self.amount.is_finite()
            || self.amount <= MIN_AMOUNT_EXCLUSIVE
            || self.amount > MAX_AMOUNT
        {
            return Err(PricingError::InvalidParameter(format!(
                "amount must be greater than 0 and at most {MAX_AMOUNT} (got {})",
                self.amount
            )));
        }

        if !(MIN_PERIOD_DAYS..=MAX_PERIOD_DAYS).contains(&self.period_days) {
            return Err(PricingError::InvalidParameter(format!(
                "periodDays must be between {MIN_PERIOD_DAYS} and {MAX_PERIOD_DAYS} (got {})",
                self.period_days
            )));
        }

        if !self.current_price.is_finite()
            || self.current_price <= 0.0
            || self.current_price > MAX_CURRENT_PRICE
        {
            return Err(PricingError::InvalidParameter(format!(
                "currentPrice must be greater than 0 and at most {MAX_CURRENT_PRICE} (got {})",
                self.current_price
            )));
        }

        Ok(())
    }

    #[inline]
    pub fn years(&self) -> f64 {
        self.period_days as f64 / 365.0
    }
}

/// Loosely-typed request as it arrives from callers (strategy and asset by name).
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingParams {
    pub amount: f64,
    pub period_days: i64,
    pub current_price: f64,
    pub strategy: String,
    #[serde(default)]
    pub asset: Option<String>,
}

impl PricingParams {
    /// Decode a raw JSON body. Wrong types and missing fields are invalid parameters.
    pub fn from_json(body: serde_json::Value) -> PricingResult<Self> {
        serde_json::from_value(body).map_err(|e| PricingError::InvalidParameter(e.to_string()))
    }

    /// Parse names and validate bounds into a typed request.
    pub fn into_request(self) -> PricingResult<PricingRequest> {
        let strategy = self.strategy.parse::<Strategy>()?;
        let asset = self.asset.as_deref().map(str::parse::<Asset>).transpose()?;
        let period_days = u32::try_from(self.period_days).map_err(|_| {
            PricingError::InvalidParameter(format!(
                "periodDays must be between {MIN_PERIOD_DAYS} and {MAX_PERIOD_DAYS} (got {})",
                self.period_days
            ))
        })?;
        let request = PricingRequest::new(
            self.amount,
            period_days,
            self.current_price,
            strategy,
            asset,
        );
        request.validate()?;
        Ok(request)
    }
}

// ── Strike quote ──

/// One rung of the strike ladder.
///
/// `premium` is the total for the whole amount: positive for a net debit,
/// negative for a net credit. Unbounded `max_profit` and ROI are
/// `f64::INFINITY` and serialize as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeQuote {
    pub strike_price: f64,
    pub premium: f64,
    pub profit_zone: f64,
    pub break_even: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    pub return_on_investment: f64,
}

impl StrikeQuote {
    pub fn new(
        strike_price: f64,
        premium: f64,
        break_even: f64,
        max_profit: f64,
        max_loss: f64,
        return_on_investment: f64,
    ) -> Self {
        Self {
            strike_price,
            premium,
            profit_zone: break_even,
            break_even,
            max_profit,
            max_loss,
            return_on_investment,
        }
    }
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub requests_served: AtomicU64,
    pub validation_errors: AtomicU64,
    pub lenient_rejections: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            requests_served: AtomicU64::new(0),
            validation_errors: AtomicU64::new(0),
            lenient_rejections: AtomicU64::new(0),
        }
    }
}

impl Default for PerfCounters {
    fn default() -> Self {
        Self::new()
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    /// The engine's cache check-then-insert is not atomic on its own.
    pub engine: Mutex<PricingEngine>,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig, engine: PricingEngine) -> Arc<Self> {
        Arc::new(Self {
            config,
            engine: Mutex::new(engine),
            counters: PerfCounters::new(),
        })
    }

    pub fn engine(&self) -> PricingResult<MutexGuard<'_, PricingEngine>> {
        self.engine
            .lock()
            .map_err(|e| PricingError::StateCorruption(format!("engine lock poisoned: {e}")))
    }

    #[inline]
    pub fn count_request(&self) {
        self.counters.requests_served.fetch_add(1, Ordering::Relaxed);
    }
}
