#![deny(warnings)]

//! Economic primitives for the planning engine.
//!
//! This module provides validated utilities for:
//! - Converting grams of gold into local currency (gold price × FX rate)
//! - Construction cost per m² and total build cost
//! - Yearly and whole-period rental revenue of one unit
//!
//! The [`gold`] module holds the caller-owned gold price cache and
//! [`legacy`] the older mix-rule costing model.

pub mod gold;
pub mod legacy;

use plan_core::ConstructionCostType;
use thiserror::Error;

/// Months in a rental year.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Grams in one troy ounce, the unit gold quotes are published in.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.103_476_8;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Prices and FX rates must be finite and > 0; areas, rents and
    /// quantities must be finite and >= 0.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

fn non_negative(what: &'static str, v: f64) -> Result<f64, EconError> {
    if !v.is_finite() || v < 0.0 {
        return Err(EconError::InvalidInput(what));
    }
    Ok(v)
}

fn positive(what: &'static str, v: f64) -> Result<f64, EconError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(EconError::InvalidInput(what));
    }
    Ok(v)
}

/// Gold price and FX rate used to turn grams of gold into local currency.
///
/// Both values are validated once at construction, so the engine can price
/// every line item without re-checking them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoldPricing {
    price_per_gram: f64,
    fx_rate: f64,
}

impl GoldPricing {
    /// `price_per_gram` in the quote currency, `fx_rate` from quote to local currency.
    pub fn new(price_per_gram: f64, fx_rate: f64) -> Result<Self, EconError> {
        Ok(Self {
            price_per_gram: positive("gold price per gram", price_per_gram)?,
            fx_rate: positive("fx rate", fx_rate)?,
        })
    }

    /// Build from a per-troy-ounce quote.
    pub fn from_troy_ounce(price_per_oz: f64, fx_rate: f64) -> Result<Self, EconError> {
        Self::new(price_per_gram_from_troy_ounce(price_per_oz)?, fx_rate)
    }

    pub fn price_per_gram(&self) -> f64 {
        self.price_per_gram
    }

    pub fn fx_rate(&self) -> f64 {
        self.fx_rate
    }

    /// Local currency value of one gram of gold.
    pub fn currency_per_gram(&self) -> f64 {
        self.price_per_gram * self.fx_rate
    }

    /// Local currency value of `grams` of gold.
    pub fn to_currency(&self, grams: f64) -> Result<f64, EconError> {
        gold_to_currency(grams, self.price_per_gram, self.fx_rate)
    }

    /// Construction cost per m² for a cost grade.
    pub fn cost_per_m2(&self, cost_type: &ConstructionCostType) -> Result<f64, EconError> {
        cost_per_m2(cost_type, self.price_per_gram, self.fx_rate)
    }
}

/// Convert grams of gold into local currency: grams × price/g × FX.
pub fn gold_to_currency(grams: f64, price_per_gram: f64, fx_rate: f64) -> Result<f64, EconError> {
    let grams = non_negative("gold grams", grams)?;
    let price = positive("gold price per gram", price_per_gram)?;
    let fx = positive("fx rate", fx_rate)?;
    Ok(grams * price * fx)
}

/// Construction cost per built m².
///
/// A ZME grade of 14.91 g/m² at 65 USD/g and 656 XOF/USD costs
/// 635 762.4 XOF per m².
pub fn cost_per_m2(
    cost_type: &ConstructionCostType,
    gold_price_per_gram: f64,
    fx_rate: f64,
) -> Result<f64, EconError> {
    gold_to_currency(cost_type.gold_grams_per_m2, gold_price_per_gram, fx_rate)
}

/// Total build cost = area × cost per m².
pub fn total_build_cost(area_m2: f64, cost_per_m2: f64) -> Result<f64, EconError> {
    Ok(non_negative("area m2", area_m2)? * non_negative("cost per m2", cost_per_m2)?)
}

/// Yearly revenue of one unit = monthly rent × 12.
pub fn yearly_revenue(rent_monthly: f64) -> Result<f64, EconError> {
    Ok(non_negative("monthly rent", rent_monthly)? * MONTHS_PER_YEAR)
}

/// Revenue of one unit over the whole rental period.
pub fn total_revenue(rent_monthly: f64, rental_period_years: u32) -> Result<f64, EconError> {
    Ok(yearly_revenue(rent_monthly)? * f64::from(rental_period_years))
}

/// Convert a per-troy-ounce gold quote into a per-gram price.
pub fn price_per_gram_from_troy_ounce(price_per_oz: f64) -> Result<f64, EconError> {
    Ok(positive("gold price per ounce", price_per_oz)? / GRAMS_PER_TROY_OUNCE)
}
