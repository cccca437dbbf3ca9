pub mod black_scholes;

/// Side of a single vanilla option leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

/// All premium models implement this trait.
/// premium() must be a pure function: deterministic output from inputs only.
pub trait PremiumModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Premium per unit of underlying, in USD. Never negative, never panics.
    fn premium(&self, kind: OptionKind, params: &OptionParams) -> f64;
}

/// Precomputed inputs shared by every leg priced at the same strike.
/// Stack-allocated, Copy.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct OptionParams {
    pub spot: f64,
    pub strike: f64,
    pub years: f64,
    pub sigma: f64,
    // Precomputed
    pub sigma_sqrt_t: f64,
}

impl OptionParams {
    #[inline]
    pub fn new(spot: f64, strike: f64, years: f64, sigma: f64) -> Self {
        Self {
            spot,
            strike,
            years,
            sigma,
            sigma_sqrt_t: sigma * years.max(0.0).sqrt(),
        }
    }

    /// Strike relative to spot for calls, spot relative to strike for puts.
    /// Above 1 means out of the money.
    #[inline]
    pub fn moneyness(&self, kind: OptionKind) -> f64 {
        match kind {
            OptionKind::Call => self.strike / self.spot,
            OptionKind::Put => self.spot / self.strike,
        }
    }

    #[inline]
    pub fn intrinsic(&self, kind: OptionKind) -> f64 {
        match kind {
            OptionKind::Call => (self.spot - self.strike).max(0.0),
            OptionKind::Put => (self.strike - self.spot).max(0.0),
        }
    }
}
