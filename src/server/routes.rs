use crate::errors::PricingError;
use crate::models::black_scholes::{ClosedFormBlackScholes, LinearVegaApprox};
use crate::models::{OptionKind, OptionParams, PremiumModel};
use crate::pricing::profit::{self, ProfitZoneInput};
use crate::state::{AppState, Asset, PricingParams, Strategy, MAX_PERIOD_DAYS, MIN_PERIOD_DAYS};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use portable_atomic::Ordering;
use std::sync::Arc;

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

fn reject(state: &AppState, e: PricingError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match e {
        PricingError::InvalidParameter(_) => {
            state.counters.validation_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "request rejected");
            StatusCode::BAD_REQUEST
        }
        _ => {
            tracing::error!(error = %e, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}

/// POST /api/premiums -- strike ladder quotes (cached)
pub async fn post_premiums(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult {
    state.count_request();
    let request = PricingParams::from_json(body)
        .and_then(PricingParams::into_request)
        .map_err(|e| reject(&state, e))?;
    let quotes = state
        .engine()
        .and_then(|mut engine| engine.calculate_premiums(&request))
        .map_err(|e| reject(&state, e))?;

    Ok(Json(serde_json::json!({
        "strategy": request.strategy,
        "asset": request.asset,
        "quotes": &*quotes,
    })))
}

/// POST /api/profit-zones -- lenient: any JSON body gives 200, bad input an empty list
pub async fn post_profit_zones(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    state.count_request();
    let input = ProfitZoneInput::from_json(&body);
    if input.is_rejected() {
        state.counters.lenient_rejections.fetch_add(1, Ordering::Relaxed);
    }
    Json(serde_json::json!({ "profitZones": input.zones_or_warn() }))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLossBody {
    pub strategy: String,
    pub strike_price: f64,
    pub premium: f64,
    pub current_price: f64,
    pub amount: f64,
}

/// POST /api/profit-loss -- what-if P/L at a hypothetical price (null for spreads)
pub async fn post_profit_loss(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProfitLossBody>,
) -> ApiResult {
    state.count_request();
    let strategy = body.strategy.parse::<Strategy>().map_err(|e| reject(&state, e))?;
    let pnl = profit::calculate_profit_loss(
        strategy,
        body.strike_price,
        body.premium,
        body.current_price,
        body.amount,
    );
    Ok(Json(serde_json::json!({ "strategy": strategy, "profitLoss": pnl })))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitZoneCheckBody {
    pub strategy: String,
    pub current_price: f64,
    pub profit_zone: f64,
}

/// POST /api/profit-zone/check -- is the price on the profitable side
pub async fn post_profit_zone_check(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProfitZoneCheckBody>,
) -> ApiResult {
    state.count_request();
    let strategy = body.strategy.parse::<Strategy>().map_err(|e| reject(&state, e))?;
    let in_zone = profit::is_in_profit_zone(body.current_price, body.profit_zone, strategy);
    Ok(Json(serde_json::json!({
        "strategy": strategy,
        "family": strategy.family(),
        "inProfitZone": in_zone,
    })))
}

/// GET /api/cache -- cache size and per-entry age
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> ApiResult {
    let stats = state
        .engine()
        .map(|engine| engine.cache_stats())
        .map_err(|e| reject(&state, e))?;
    Ok(Json(serde_json::json!(stats)))
}

/// DELETE /api/cache -- drop every cached ladder
pub async fn delete_cache(State(state): State<Arc<AppState>>) -> ApiResult {
    state
        .engine()
        .map(|mut engine| engine.clear_cache())
        .map_err(|e| reject(&state, e))?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceQuery {
    pub spot: f64,
    pub strike: f64,
    pub period_days: u32,
    pub kind: OptionKind,
    pub asset: Option<String>,
}

/// GET /api/reference -- per-unit premium from closed-form Black-Scholes next to the engine's estimate
pub async fn get_reference(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ReferenceQuery>,
) -> ApiResult {
    state.count_request();
    let asset = q
        .asset
        .as_deref()
        .map(str::parse::<Asset>)
        .transpose()
        .map_err(|e| reject(&state, e))?
        .unwrap_or_default();

    if !(q.spot.is_finite() && q.spot > 0.0 && q.strike.is_finite() && q.strike > 0.0) {
        return Err(reject(
            &state,
            PricingError::InvalidParameter("spot and strike must be positive".into()),
        ));
    }
    if !(MIN_PERIOD_DAYS..=MAX_PERIOD_DAYS).contains(&q.period_days) {
        return Err(reject(
            &state,
            PricingError::InvalidParameter(format!(
                "periodDays must be between {MIN_PERIOD_DAYS} and {MAX_PERIOD_DAYS} (got {})",
                q.period_days
            )),
        ));
    }

    let params = OptionParams::new(q.spot, q.strike, q.period_days as f64 / 365.0, asset.volatility());
    let closed_form = ClosedFormBlackScholes::new();
    let approx = LinearVegaApprox::new();

    Ok(Json(serde_json::json!({
        "kind": q.kind,
        "asset": asset,
        "volatility": asset.volatility(),
        "closedForm": closed_form.premium(q.kind, &params),
        "approximation": approx.premium(q.kind, &params),
        "models": [closed_form.name(), approx.name()],
    })))
}

/// GET /api/counters -- performance counters (lock-free reads, plus engine totals)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> ApiResult {
    use portable_atomic::Ordering::Relaxed;
    let (computations, cache_hits) = state
        .engine()
        .map(|engine| (engine.computations(), engine.cache_hits()))
        .map_err(|e| reject(&state, e))?;
    Ok(Json(serde_json::json!({
        "requests_served": state.counters.requests_served.load(Relaxed),
        "validation_errors": state.counters.validation_errors.load(Relaxed),
        "lenient_rejections": state.counters.lenient_rejections.load(Relaxed),
        "computations": computations,
        "cache_hits": cache_hits,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::pricing::cache::ManualClock;
    use crate::pricing::{PricingEngine, DEFAULT_CACHE_TTL};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn app() -> (axum::Router, Arc<AppState>) {
        let clock = Arc::new(ManualClock::new(0));
        let engine = PricingEngine::new(clock, DEFAULT_CACHE_TTL, None);
        let state = AppState::new(AppConfig::default(), engine);
        (crate::server::router(state.clone()), state)
    }

    async fn send(
        app: axum::Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_premiums_route() {
        let (app, state) = app();
        let body = serde_json::json!({
            "amount": 10, "periodDays": 30, "currentPrice": 2.5, "strategy": "CALL", "asset": "STX"
        });
        let (status, json) = send(app, Method::POST, "/api/premiums", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let quotes = json["quotes"].as_array().unwrap();
        assert_eq!(quotes.len(), 5);
        assert!(quotes[0]["maxProfit"].is_null(), "unbounded profit is null");
        assert!(quotes[0]["premium"].as_f64().unwrap() > 0.0);
        assert_eq!(state.counters.requests_served.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_premiums_route_rejects_invalid() {
        let (app, state) = app();
        let body = serde_json::json!({
            "amount": 10, "periodDays": 91, "currentPrice": 2.5, "strategy": "CALL"
        });
        let (status, json) = send(app, Method::POST, "/api/premiums", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("periodDays"));
        assert_eq!(state.counters.validation_errors.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_premiums_route_malformed_body_is_bad_request() {
        let (app, state) = app();
        let bodies = [
            serde_json::json!({ "amount": 10, "periodDays": 30.5, "currentPrice": 2.5, "strategy": "CALL" }),
            serde_json::json!({ "amount": 10, "periodDays": 30, "currentPrice": 2.5 }),
            serde_json::json!({ "amount": "ten", "periodDays": 30, "currentPrice": 2.5, "strategy": "CALL" }),
        ];
        for body in bodies {
            let (status, json) = send(app.clone(), Method::POST, "/api/premiums", Some(body.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(json["error"].as_str().unwrap().starts_with("invalid parameter"), "{json}");
        }
        assert_eq!(state.counters.validation_errors.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_profit_zones_route_is_lenient() {
        let (app, state) = app();
        let body = serde_json::json!({
            "premiums": ["1.5", 2.0], "strategy": "CALL", "strikePrice": "2.5", "amount": "10"
        });
        let (status, json) = send(app.clone(), Method::POST, "/api/profit-zones", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["profitZones"].as_array().unwrap().len(), 2);

        let body = serde_json::json!({ "premiums": ["1.5"], "strategy": "CALL", "strikePrice": "2.5", "amount": "0" });
        let (status, json) = send(app, Method::POST, "/api/profit-zones", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["profitZones"].as_array().unwrap().is_empty());
        assert_eq!(state.counters.lenient_rejections.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_profit_zones_route_accepts_null_and_wrong_types() {
        let (app, state) = app();
        let bodies = [
            serde_json::json!({ "premiums": [null], "strategy": "CALL", "strikePrice": 2.5, "amount": 10 }),
            serde_json::json!({ "premiums": [1.5], "strategy": "CALL", "strikePrice": true, "amount": 10 }),
            serde_json::json!({ "premiums": [1.5], "strategy": null, "strikePrice": 2.5, "amount": 10 }),
        ];
        for body in bodies {
            let (status, json) = send(app.clone(), Method::POST, "/api/profit-zones", Some(body.clone())).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(json["profitZones"], serde_json::json!([]), "{body}");
        }
        assert_eq!(state.counters.lenient_rejections.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_profit_loss_route() {
        let (app, _) = app();
        let body = serde_json::json!({
            "strategy": "CALL", "strikePrice": 2.5, "premium": 2.0, "currentPrice": 3.0, "amount": 10
        });
        let (status, json) = send(app.clone(), Method::POST, "/api/profit-loss", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert!((json["profitLoss"].as_f64().unwrap() - 3.0).abs() < 1e-12);

        let body = serde_json::json!({
            "strategy": "BullCallSpread", "strikePrice": 2.5, "premium": 2.0, "currentPrice": 3.0, "amount": 10
        });
        let (_, json) = send(app, Method::POST, "/api/profit-loss", Some(body)).await;
        assert!(json["profitLoss"].is_null());
    }

    #[tokio::test]
    async fn test_profit_zone_check_route() {
        let (app, _) = app();
        let body = serde_json::json!({ "strategy": "PUT", "currentPrice": 2.0, "profitZone": 2.3 });
        let (status, json) = send(app, Method::POST, "/api/profit-zone/check", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["inProfitZone"], true);
        assert_eq!(json["family"], "bearish");
    }

    #[tokio::test]
    async fn test_cache_routes() {
        let (app, state) = app();
        let body = serde_json::json!({
            "amount": 10, "periodDays": 30, "currentPrice": 2.5, "strategy": "STRIP"
        });
        send(app.clone(), Method::POST, "/api/premiums", Some(body)).await;

        let (_, stats) = send(app.clone(), Method::GET, "/api/cache", None).await;
        assert_eq!(stats["size"], 1);
        assert_eq!(stats["entries"][0]["quoteCount"], 5);

        let (status, _) = send(app.clone(), Method::DELETE, "/api/cache", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.engine().unwrap().cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_reference_route() {
        let (app, _) = app();
        let uri = "/api/reference?spot=2.5&strike=2.5&periodDays=30&kind=call&asset=STX";
        let (status, json) = send(app.clone(), Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let closed = json["closedForm"].as_f64().unwrap();
        let approx = json["approximation"].as_f64().unwrap();
        // ATM: 0.4 is close to 1/sqrt(2*pi), so the two agree within a few percent
        assert!((closed - approx).abs() / closed < 0.05, "closed={closed} approx={approx}");

        let uri = "/api/reference?spot=2.5&strike=2.5&periodDays=120&kind=put";
        let (status, _) = send(app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
