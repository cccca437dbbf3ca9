use crate::errors::{PricingError, PricingResult};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub cache_ttl_secs: u64,
    /// 0 leaves the premium cache unbounded.
    pub cache_max_entries: usize,
}

impl AppConfig {
    pub fn from_env() -> PricingResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PricingResult<Self> {
        let server_port: u16 = parse_var(&lookup, "SERVER_PORT", "3001")?;
        let cache_ttl_secs: u64 = parse_var(&lookup, "CACHE_TTL_SECS", "30")?;
        let cache_max_entries: usize = parse_var(&lookup, "CACHE_MAX_ENTRIES", "0")?;

        if cache_ttl_secs == 0 {
            return Err(PricingError::Config("CACHE_TTL_SECS must be positive".into()));
        }

        Ok(Self {
            server_port,
            cache_ttl_secs,
            cache_max_entries,
        })
    }

    #[inline]
    pub fn cache_capacity(&self) -> Option<usize> {
        (self.cache_max_entries > 0).then_some(self.cache_max_entries)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            cache_ttl_secs: 30,
            cache_max_entries: 0,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> PricingResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|e| PricingError::Config(format!("{key}: {e}")))
}
