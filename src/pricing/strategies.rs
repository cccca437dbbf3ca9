use crate::models::{OptionKind, OptionParams, PremiumModel};
use crate::pricing::{QuoteLadder, LADDER_LEN};
use crate::state::{PricingRequest, Strategy, StrikeQuote};

// ═══════════════════════════════════════════════════════════════════════════════
// STRATEGY CALCULATORS
//
// Every calculator works from per-unit leg premiums and scales by `amount`.
// Single-strike strategies (CALL, PUT, STRAP, STRIP) quote every rung.
// Spreads pair the anchor rung with an adjacent rung:
//   BullCallSpread, BearCallSpread: anchor is the lower strike, pair with next
//   BullPutSpread, BearPutSpread:   anchor is the upper strike, pair with previous
// so each spread quotes four of the five rungs.
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-request pricing inputs. Stack-allocated.
pub(crate) struct LegPricer<'a, M: PremiumModel + ?Sized> {
    model: &'a M,
    spot: f64,
    years: f64,
    sigma: f64,
    amount: f64,
}

impl<'a, M: PremiumModel + ?Sized> LegPricer<'a, M> {
    pub(crate) fn new(model: &'a M, request: &PricingRequest) -> Self {
        Self {
            model,
            spot: request.current_price,
            years: request.years(),
            sigma: request.asset.volatility(),
            amount: request.amount,
        }
    }

    #[inline]
    fn unit(&self, kind: OptionKind, strike: f64) -> f64 {
        self.model
            .premium(kind, &OptionParams::new(self.spot, strike, self.years, self.sigma))
    }
}

/// Quote every rung the strategy can use, in ladder order.
pub(crate) fn quote_ladder<M: PremiumModel + ?Sized>(
    pricer: &LegPricer<'_, M>,
    strategy: Strategy,
    ladder: &[f64; LADDER_LEN],
) -> QuoteLadder {
    (0..LADDER_LEN)
        .filter_map(|i| quote_at(pricer, strategy, ladder, i))
        .collect()
}

fn quote_at<M: PremiumModel + ?Sized>(
    pricer: &LegPricer<'_, M>,
    strategy: Strategy,
    ladder: &[f64; LADDER_LEN],
    i: usize,
) -> Option<StrikeQuote> {
    let strike = ladder[i];
    let next = ladder.get(i + 1).copied();
    let prev = i.checked_sub(1).map(|j| ladder[j]);

    match strategy {
        Strategy::Call => Some(long_call(pricer, strike)),
        Strategy::Put => Some(long_put(pricer, strike)),
        Strategy::Strap => Some(strap(pricer, strike)),
        Strategy::Strip => Some(strip(pricer, strike)),
        Strategy::BullCallSpread => next.map(|upper| bull_call_spread(pricer, strike, upper)),
        Strategy::BullPutSpread => prev.map(|lower| bull_put_spread(pricer, lower, strike)),
        Strategy::BearPutSpread => prev.map(|lower| bear_put_spread(pricer, lower, strike)),
        Strategy::BearCallSpread => next.map(|upper| bear_call_spread(pricer, strike, upper)),
    }
}

/// Return on investment in percent. Unbounded profit gives an unbounded ROI.
#[inline]
fn roi_pct(max_profit: f64, capital_at_risk: f64) -> f64 {
    if !max_profit.is_finite() || capital_at_risk <= 0.0 {
        return f64::INFINITY;
    }
    max_profit / capital_at_risk * 100.0
}

fn long_call<M: PremiumModel + ?Sized>(p: &LegPricer<'_, M>, strike: f64) -> StrikeQuote {
    let unit = p.unit(OptionKind::Call, strike);
    let premium = unit * p.amount;
    StrikeQuote::new(strike, premium, strike + unit, f64::INFINITY, premium, f64::INFINITY)
}

fn long_put<M: PremiumModel + ?Sized>(p: &LegPricer<'_, M>, strike: f64) -> StrikeQuote {
    let unit = p.unit(OptionKind::Put, strike);
    let premium = unit * p.amount;
    // Best case: underlying goes to zero
    let max_profit = strike * p.amount - premium;
    StrikeQuote::new(
        strike,
        premium,
        strike - unit,
        max_profit,
        premium,
        roi_pct(max_profit, premium),
    )
}

/// Two calls and one put at the same strike.
fn strap<M: PremiumModel + ?Sized>(p: &LegPricer<'_, M>, strike: f64) -> StrikeQuote {
    let unit = 2.0 * p.unit(OptionKind::Call, strike) + p.unit(OptionKind::Put, strike);
    let premium = unit * p.amount;
    StrikeQuote::new(
        strike,
        premium,
        strike + unit / 2.0,
        f64::INFINITY,
        premium,
        f64::INFINITY,
    )
}

/// Two puts and one call at the same strike.
fn strip<M: PremiumModel + ?Sized>(p: &LegPricer<'_, M>, strike: f64) -> StrikeQuote {
    let unit = 2.0 * p.unit(OptionKind::Put, strike) + p.unit(OptionKind::Call, strike);
    let premium = unit * p.amount;
    StrikeQuote::new(
        strike,
        premium,
        strike - unit / 2.0,
        f64::INFINITY,
        premium,
        f64::INFINITY,
    )
}

/// Long call at `lower`, short call at `upper`. Net debit.
fn bull_call_spread<M: PremiumModel + ?Sized>(
    p: &LegPricer<'_, M>,
    lower: f64,
    upper: f64,
) -> StrikeQuote {
    let net = p.unit(OptionKind::Call, lower) - p.unit(OptionKind::Call, upper);
    let premium = net * p.amount;
    let width = (upper - lower) * p.amount;
    let max_profit = (width - premium).max(0.0);
    StrikeQuote::new(
        lower,
        premium,
        lower + net,
        max_profit,
        premium,
        roi_pct(max_profit, premium),
    )
}

/// Short put at `upper`, long put at `lower`. Net credit, reported negative.
fn bull_put_spread<M: PremiumModel + ?Sized>(
    p: &LegPricer<'_, M>,
    lower: f64,
    upper: f64,
) -> StrikeQuote {
    let credit = p.unit(OptionKind::Put, upper) - p.unit(OptionKind::Put, lower);
    let credit_total = credit * p.amount;
    let width = (upper - lower) * p.amount;
    let max_loss = (width - credit_total).max(0.0);
    StrikeQuote::new(
        upper,
        -credit_total,
        upper - credit,
        credit_total,
        max_loss,
        roi_pct(credit_total, max_loss),
    )
}

/// Long put at `upper`, short put at `lower`. Net debit.
fn bear_put_spread<M: PremiumModel + ?Sized>(
    p: &LegPricer<'_, M>,
    lower: f64,
    upper: f64,
) -> StrikeQuote {
    let net = p.unit(OptionKind::Put, upper) - p.unit(OptionKind::Put, lower);
    let premium = net * p.amount;
    let width = (upper - lower) * p.amount;
    let max_profit = (width - premium).max(0.0);
    StrikeQuote::new(
        upper,
        premium,
        upper - net,
        max_profit,
        premium,
        roi_pct(max_profit, premium),
    )
}

/// Short call at `lower`, long call at `upper`. Net credit, reported negative.
fn bear_call_spread<M: PremiumModel + ?Sized>(
    p: &LegPricer<'_, M>,
    lower: f64,
    upper: f64,
) -> StrikeQuote {
    let credit = p.unit(OptionKind::Call, lower) - p.unit(OptionKind::Call, upper);
    let credit_total = credit * p.amount;
    let width = (upper - lower) * p.amount;
    let max_loss = (width - credit_total).max(0.0);
    StrikeQuote::new(
        lower,
        -credit_total,
        lower + credit,
        credit_total,
        max_loss,
        roi_pct(credit_total, max_loss),
    )
}
