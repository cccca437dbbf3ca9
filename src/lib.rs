//! Premium and profit-zone engine for structured option strategies.
//!
//! Prices a five-rung strike ladder for CALL, PUT, STRAP, STRIP and the four
//! vertical spreads from a simplified Black-Scholes approximation, with a
//! short-lived cache, plus pure profit/loss and profit-zone helpers.

pub mod config;
pub mod errors;
pub mod models;
pub mod pricing;
pub mod server;
pub mod state;

pub use errors::{PricingError, PricingResult};
pub use pricing::profit::{calculate_profit_loss, get_profit_zones, is_in_profit_zone};
pub use pricing::{PricingEngine, QuoteLadder};
pub use state::{Asset, PricingRequest, Strategy, StrikeQuote};
