use crate::state::{Strategy, StrategyFamily};
use serde_json::Value;

/// Profit or loss of a position if the underlying settles at `current_price`.
///
/// `premium` is the total paid for `amount` units. Covers the single-strike
/// strategies only; spreads are fully described by their break-even and
/// max profit/loss, so `None` is returned for them.
pub fn calculate_profit_loss(
    strategy: Strategy,
    strike_price: f64,
    premium: f64,
    current_price: f64,
    amount: f64,
) -> Option<f64> {
    let upside = (current_price - strike_price).max(0.0);
    let downside = (strike_price - current_price).max(0.0);

    let payoff = match strategy {
        Strategy::Call => upside,
        Strategy::Put => downside,
        Strategy::Strap => {
            if current_price > strike_price {
                2.0 * upside
            } else {
                downside
            }
        }
        Strategy::Strip => {
            if current_price < strike_price {
                2.0 * downside
            } else {
                upside
            }
        }
        _ => return None,
    };

    // Long options: never lose more than was paid
    Some((payoff * amount - premium).max(-premium))
}

/// Whether `current_price` is on the profitable side of `profit_zone`.
pub fn is_in_profit_zone(current_price: f64, profit_zone: f64, strategy: Strategy) -> bool {
    match strategy.family() {
        StrategyFamily::Bullish => current_price > profit_zone,
        StrategyFamily::Bearish => current_price < profit_zone,
    }
}

/// Break-even for a position anchored at `strike` with the given per-unit premium.
/// Credit spreads may pass the premium with either sign.
pub fn break_even(strategy: Strategy, strike: f64, unit_premium: f64) -> f64 {
    match strategy {
        Strategy::Call | Strategy::BullCallSpread => strike + unit_premium,
        Strategy::Put | Strategy::BearPutSpread => strike - unit_premium,
        Strategy::Strap => strike + unit_premium / 2.0,
        Strategy::Strip => strike - unit_premium / 2.0,
        Strategy::BearCallSpread => strike + unit_premium.abs(),
        Strategy::BullPutSpread => strike - unit_premium.abs(),
    }
}

// ── Lenient batch helper ──

/// A number that may arrive as JSON number or numeric string. Any other
/// JSON shape (null, bool, object) is kept as `Other` and never parses.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
    Other(Value),
}

impl NumericInput {
    /// Finite value, or None if unparseable.
    pub fn to_f64(&self) -> Option<f64> {
        let v = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Other(_) => return None,
        };
        v.is_finite().then_some(v)
    }
}

impl Default for NumericInput {
    fn default() -> Self {
        Self::Other(Value::Null)
    }
}

impl From<&Value> for NumericInput {
    fn from(v: &Value) -> Self {
        if let Some(n) = v.as_f64() {
            return Self::Number(n);
        }
        match v {
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Other(other.clone()),
        }
    }
}

impl From<f64> for NumericInput {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for NumericInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Profit-zone inputs after boundary parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfitZoneInput {
    Ready {
        strategy: Strategy,
        strike_price: f64,
        amount: f64,
        premiums: Vec<f64>,
    },
    Empty {
        reason: String,
    },
}

impl ProfitZoneInput {
    pub fn parse(
        premiums: &[NumericInput],
        strategy: &str,
        strike_price: &NumericInput,
        amount: &NumericInput,
    ) -> Self {
        let strategy = match strategy.parse::<Strategy>() {
            Ok(s) => s,
            Err(e) => return Self::empty(e.to_string()),
        };

        let Some(strike_price) = strike_price.to_f64().filter(|v| *v > 0.0) else {
            return Self::empty(format!("strikePrice is not a positive number: {strike_price:?}"));
        };

        let Some(amount) = amount.to_f64().filter(|v| *v > 0.0) else {
            return Self::empty(format!("amount is not a positive number: {amount:?}"));
        };

        let mut parsed = Vec::with_capacity(premiums.len());
        for (i, p) in premiums.iter().enumerate() {
            match p.to_f64() {
                Some(v) => parsed.push(v),
                None => return Self::empty(format!("premiums[{i}] is not a number: {p:?}")),
            }
        }

        Self::Ready {
            strategy,
            strike_price,
            amount,
            premiums: parsed,
        }
    }

    /// Parse a raw JSON body (`premiums`, `strategy`, `strikePrice`, `amount`).
    /// Missing fields and wrong shapes become `Empty`; this never fails.
    pub fn from_json(body: &Value) -> Self {
        let Some(items) = body.get("premiums").and_then(Value::as_array) else {
            return Self::empty("premiums is not a list".to_string());
        };
        let Some(strategy) = body.get("strategy").and_then(Value::as_str) else {
            return Self::empty("strategy is not a string".to_string());
        };

        let premiums: Vec<NumericInput> = items.iter().map(NumericInput::from).collect();
        let field = |name: &str| body.get(name).map(NumericInput::from).unwrap_or_default();
        Self::parse(&premiums, strategy, &field("strikePrice"), &field("amount"))
    }

    fn empty(reason: String) -> Self {
        Self::Empty { reason }
    }

    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    /// Same as `zones()`, logging the reason when the input was rejected.
    pub fn zones_or_warn(&self) -> Vec<f64> {
        if let Self::Empty { reason } = self {
            tracing::warn!(reason = %reason, "profit zone input rejected");
        }
        self.zones()
    }

    /// Break-even per premium total; empty when the input was rejected.
    pub fn zones(&self) -> Vec<f64> {
        match self {
            Self::Ready {
                strategy,
                strike_price,
                amount,
                premiums,
            } => premiums
                .iter()
                .map(|total| break_even(*strategy, *strike_price, total / amount))
                .collect(),
            Self::Empty { .. } => Vec::new(),
        }
    }
}

/// Break-even prices for a batch of premium totals. Never fails: any
/// unparseable input or non-positive amount yields an empty list.
pub fn get_profit_zones(
    premiums: &[NumericInput],
    strategy: &str,
    strike_price: &NumericInput,
    amount: &NumericInput,
) -> Vec<f64> {
    ProfitZoneInput::parse(premiums, strategy, strike_price, amount).zones_or_warn()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_pnl_floors_at_premium() {
        let pnl = calculate_profit_loss(Strategy::Call, 2.5, 2.0, 2.0, 10.0).unwrap();
        assert!((pnl + 2.0).abs() < 1e-12, "OTM call loses exactly the premium: {pnl}");

        let pnl = calculate_profit_loss(Strategy::Call, 2.5, 2.0, 3.0, 10.0).unwrap();
        assert!((pnl - 3.0).abs() < 1e-12, "0.5 * 10 - 2 = 3, got {pnl}");
    }

    #[test]
    fn test_put_pnl() {
        let pnl = calculate_profit_loss(Strategy::Put, 2.5, 1.0, 2.0, 10.0).unwrap();
        assert!((pnl - 4.0).abs() < 1e-12, "0.5 * 10 - 1 = 4, got {pnl}");
    }

    #[test]
    fn test_strap_doubles_upside() {
        let up = calculate_profit_loss(Strategy::Strap, 2.5, 3.0, 3.0, 10.0).unwrap();
        assert!((up - 7.0).abs() < 1e-12, "2 * 0.5 * 10 - 3 = 7, got {up}");
        let down = calculate_profit_loss(Strategy::Strap, 2.5, 3.0, 2.0, 10.0).unwrap();
        assert!((down - 2.0).abs() < 1e-12, "0.5 * 10 - 3 = 2, got {down}");
    }

    #[test]
    fn test_strip_doubles_downside() {
        let down = calculate_profit_loss(Strategy::Strip, 2.5, 3.0, 2.0, 10.0).unwrap();
        assert!((down - 7.0).abs() < 1e-12, "got {down}");
        let up = calculate_profit_loss(Strategy::Strip, 2.5, 3.0, 3.0, 10.0).unwrap();
        assert!((up - 2.0).abs() < 1e-12, "got {up}");
    }

    #[test]
    fn test_spreads_have_no_pnl_curve() {
        for st in Strategy::ALL.iter().filter(|s| s.is_spread()) {
            assert!(calculate_profit_loss(*st, 2.5, 1.0, 2.6, 10.0).is_none());
        }
    }

    #[test]
    fn test_profit_zone_direction() {
        assert!(is_in_profit_zone(3.0, 2.7, Strategy::Call));
        assert!(!is_in_profit_zone(2.6, 2.7, Strategy::Call));
        assert!(is_in_profit_zone(2.0, 2.3, Strategy::Put));
        assert!(is_in_profit_zone(2.0, 2.3, Strategy::BearCallSpread));
        assert!(is_in_profit_zone(3.0, 2.3, Strategy::BullCallSpread));
        assert!(!is_in_profit_zone(3.0, 2.3, Strategy::Strip));
    }

    #[test]
    fn test_profit_zones_from_strings() {
        let premiums = vec![NumericInput::from("1.5"), NumericInput::from(2.0)];
        let zones = get_profit_zones(&premiums, "CALL", &"2.5".into(), &"10".into());
        assert_eq!(zones.len(), 2);
        assert!((zones[0] - 2.65).abs() < 1e-12);
        assert!((zones[1] - 2.70).abs() < 1e-12);
    }

    #[test]
    fn test_profit_zones_credit_spread_sign_agnostic() {
        let premiums = vec![NumericInput::from(-1.0)];
        let zones = get_profit_zones(&premiums, "BullPutSpread", &2.5_f64.into(), &10.0_f64.into());
        assert!((zones[0] - 2.4).abs() < 1e-12, "got {:?}", zones);
    }

    #[test]
    fn test_profit_zones_lenient_on_bad_input() {
        let good = vec![NumericInput::from("1.0")];
        assert!(get_profit_zones(&good, "CALL", &"2.5".into(), &"0".into()).is_empty());
        assert!(get_profit_zones(&good, "CALL", &"2.5".into(), &"-3".into()).is_empty());
        assert!(get_profit_zones(&good, "CALL", &"abc".into(), &"10".into()).is_empty());
        assert!(get_profit_zones(&good, "NOPE", &"2.5".into(), &"10".into()).is_empty());

        let bad = vec![NumericInput::from("1.0"), NumericInput::from("1.2.3")];
        assert!(get_profit_zones(&bad, "CALL", &"2.5".into(), &"10".into()).is_empty());
    }

    #[test]
    fn test_parse_reports_reason() {
        let parsed = ProfitZoneInput::parse(&[], "CALL", &"2.5".into(), &"".into());
        match parsed {
            ProfitZoneInput::Empty { reason } => assert!(reason.contains("amount"), "{reason}"),
            other => panic!("expected empty, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_tolerates_any_shape() {
        let ok = serde_json::json!({
            "premiums": ["1.5", 2.0], "strategy": "CALL", "strikePrice": 2.5, "amount": "10"
        });
        let parsed = ProfitZoneInput::from_json(&ok);
        assert!(!parsed.is_rejected(), "{parsed:?}");
        assert_eq!(parsed.zones().len(), 2);

        let bodies = [
            serde_json::json!({ "premiums": [null], "strategy": "CALL", "strikePrice": 2.5, "amount": 10 }),
            serde_json::json!({ "premiums": [1.0], "strategy": "CALL", "strikePrice": true, "amount": 10 }),
            serde_json::json!({ "premiums": [1.0], "strategy": null, "strikePrice": 2.5, "amount": 10 }),
            serde_json::json!({ "premiums": "1.0", "strategy": "CALL", "strikePrice": 2.5, "amount": 10 }),
            serde_json::json!({ "premiums": [1.0], "strategy": "CALL", "strikePrice": 2.5 }),
            serde_json::json!([1, 2, 3]),
            serde_json::Value::Null,
        ];
        for body in bodies {
            let parsed = ProfitZoneInput::from_json(&body);
            assert!(parsed.is_rejected(), "{body} should be rejected");
            assert!(parsed.zones_or_warn().is_empty());
        }
    }

    #[test]
    fn test_other_shapes_never_parse() {
        assert_eq!(NumericInput::from(&Value::Bool(true)).to_f64(), None);
        assert_eq!(NumericInput::default().to_f64(), None);
        let untagged: NumericInput = serde_json::from_str("null").unwrap();
        assert_eq!(untagged, NumericInput::Other(Value::Null));
    }
}
