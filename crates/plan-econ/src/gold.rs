//! Caller-owned gold price cache.
//!
//! The engine never reads a price from ambient state; the surrounding
//! application keeps one of these next to its price feed and hands the
//! resulting per-gram price to [`crate::GoldPricing`].

use chrono::{DateTime, Duration, Utc};
use plan_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::{positive, EconError};

/// A price observation and the instant it was fetched.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedGoldPrice {
    pub price_per_gram: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Time-bounded cache for the live gold price.
#[derive(Clone, Debug)]
pub struct GoldPriceCache {
    cached: Option<CachedGoldPrice>,
    ttl: Duration,
}

impl GoldPriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self { cached: None, ttl }
    }

    /// Negative lifetimes are treated as zero; lifetimes beyond what a
    /// `Duration` can hold saturate to `Duration::MAX`.
    pub fn with_ttl_minutes(minutes: i64) -> Self {
        Self::new(Duration::try_minutes(minutes.max(0)).unwrap_or(Duration::MAX))
    }

    /// Cache whose lifetime comes from `gold_cache_ttl_minutes`.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_ttl_minutes(config.gold_cache_ttl_minutes)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cached(&self) -> Option<&CachedGoldPrice> {
        self.cached.as_ref()
    }

    /// The cached price if it is younger than the TTL at `now`.
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<f64> {
        self.cached
            .filter(|c| now - c.fetched_at < self.ttl)
            .map(|c| c.price_per_gram)
    }

    /// Record a newly fetched price.
    pub fn store(&mut self, price_per_gram: f64, now: DateTime<Utc>) -> Result<(), EconError> {
        let price_per_gram = positive("gold price per gram", price_per_gram)?;
        self.cached = Some(CachedGoldPrice {
            price_per_gram,
            fetched_at: now,
        });
        Ok(())
    }

    /// Return a fresh price, refreshing through `fetch` when expired.
    ///
    /// A failed or invalid refresh keeps serving the stale price; `None`
    /// means no price was ever obtained.
    pub fn get_or_fetch<E, F>(&mut self, now: DateTime<Utc>, fetch: F) -> Option<f64>
    where
        E: fmt::Display,
        F: FnOnce() -> Result<f64, E>,
    {
        if let Some(price) = self.fresh(now) {
            return Some(price);
        }
        match fetch() {
            Ok(price) => match self.store(price, now) {
                Ok(()) => {
                    debug!(price, "gold price refreshed");
                    Some(price)
                }
                Err(e) => {
                    warn!(price, error = %e, "rejected gold price from feed");
                    self.cached.map(|c| c.price_per_gram)
                }
            },
            Err(e) => {
                warn!(error = %e, "gold price refresh failed");
                self.cached.map(|c| c.price_per_gram)
            }
        }
    }
}
