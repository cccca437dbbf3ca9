use crate::models::{OptionKind, OptionParams, PremiumModel};
use statrs::distribution::{ContinuousCDF, Normal};

/// Scale applied to the linear time-value term.
const TIME_VALUE_FACTOR: f64 = 0.4;

/// Premium floor as a fraction of the reference price.
const PREMIUM_FLOOR_PCT: f64 = 0.001;

/// Approximate option premium used by the engine.
///
/// premium = (intrinsic + time_value) * moneyness_adjustment
///
/// where:
///   time_value = ref * sigma * sqrt(T) * 0.4
///   moneyness_adjustment = exp(-2 * (m - 1)^2) if m > 1 (OTM), else 1
///   ref = spot for calls, strike for puts
///
/// This is NOT closed-form Black-Scholes. The time value is a linear
/// stand-in for the vega term (0.4 ~ 1/sqrt(2*pi)), good enough for a
/// client-side estimate. The result is floored at 0.1% of `ref`, so it
/// is always strictly positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearVegaApprox;

impl LinearVegaApprox {
    pub fn new() -> Self {
        Self
    }
}

impl PremiumModel for LinearVegaApprox {
    #[inline]
    fn name(&self) -> &'static str {
        "Linear-Vega"
    }

    fn premium(&self, kind: OptionKind, params: &OptionParams) -> f64 {
        let reference = match kind {
            OptionKind::Call => params.spot,
            OptionKind::Put => params.strike,
        };

        let intrinsic = params.intrinsic(kind);
        let time_value = reference * params.sigma_sqrt_t * TIME_VALUE_FACTOR;

        let moneyness = params.moneyness(kind);
        let adjustment = if moneyness > 1.0 {
            let d = moneyness - 1.0;
            (-2.0 * d * d).exp()
        } else {
            1.0
        };

        ((intrinsic + time_value) * adjustment).max(reference * PREMIUM_FLOOR_PCT)
    }
}

/// Textbook Black-Scholes with zero rate and no dividends.
///
/// call = S * Phi(d1) - K * Phi(d2)
/// put  = K * Phi(-d2) - S * Phi(-d1)
///
/// where d1 = (ln(S/K) + sigma^2 * T / 2) / (sigma * sqrt(T)), d2 = d1 - sigma * sqrt(T).
/// Only used as a reference to compare the approximation against.
pub struct ClosedFormBlackScholes {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl ClosedFormBlackScholes {
    pub fn new() -> Self {
        let normal = Normal::new(0.0, 1.0).unwrap_or_else(|_| {
            tracing::error!("failed to create standard normal -- using fallback");
            Normal::standard()
        });
        Self { normal }
    }
}

impl Default for ClosedFormBlackScholes {
    fn default() -> Self {
        Self::new()
    }
}

impl PremiumModel for ClosedFormBlackScholes {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes"
    }

    fn premium(&self, kind: OptionKind, params: &OptionParams) -> f64 {
        // Degenerate: no time or no vol leaves only intrinsic value
        if params.sigma_sqrt_t < 1e-12 || params.spot <= 0.0 || params.strike <= 0.0 {
            return params.intrinsic(kind);
        }

        let d1 = ((params.spot / params.strike).ln()
            + 0.5 * params.sigma * params.sigma * params.years)
            / params.sigma_sqrt_t;
        let d2 = d1 - params.sigma_sqrt_t;

        let value = match kind {
            OptionKind::Call => {
                params.spot * self.normal.cdf(d1) - params.strike * self.normal.cdf(d2)
            }
            OptionKind::Put => {
                params.strike * self.normal.cdf(-d2) - params.spot * self.normal.cdf(-d1)
            }
        };

        value.max(0.0)
    }
}

/// Premium per unit from the closed-form model.
pub fn closed_form_premium(kind: OptionKind, spot: f64, strike: f64, years: f64, sigma: f64) -> f64 {
    ClosedFormBlackScholes::new().premium(kind, &OptionParams::new(spot, strike, years, sigma))
}
