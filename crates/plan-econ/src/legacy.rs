//! Legacy mix-rule costing model.
//!
//! Older scenarios describe their build-out as `(category, gfa, units)` line
//! items instead of a block hierarchy. Each category is priced as a blend of
//! finish grades, and revenue is the maximum capex a lease can carry. This
//! model shares only [`gold_to_currency`](crate::gold_to_currency) with the
//! takeoff engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::{non_negative, EconError, GoldPricing, MONTHS_PER_YEAR};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishGrade {
    MidEnd,
    HighEnd,
    Outstanding,
}

impl FinishGrade {
    pub const ALL: [FinishGrade; 3] = [
        FinishGrade::MidEnd,
        FinishGrade::HighEnd,
        FinishGrade::Outstanding,
    ];
}

/// Grams of gold per m² for each finish grade.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinishGradeCosts {
    pub mid_end: f64,
    pub high_end: f64,
    pub outstanding: f64,
}

impl FinishGradeCosts {
    pub fn grams_per_m2(&self, grade: FinishGrade) -> f64 {
        match grade {
            FinishGrade::MidEnd => self.mid_end,
            FinishGrade::HighEnd => self.high_end,
            FinishGrade::Outstanding => self.outstanding,
        }
    }
}

/// Percentage blend of finish grades for one typology category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MixRule {
    pub category: String,
    pub mid_end_pct: f64,
    pub high_end_pct: f64,
    pub outstanding_pct: f64,
}

impl MixRule {
    pub fn percent(&self, grade: FinishGrade) -> f64 {
        match grade {
            FinishGrade::MidEnd => self.mid_end_pct,
            FinishGrade::HighEnd => self.high_end_pct,
            FinishGrade::Outstanding => self.outstanding_pct,
        }
    }

    /// Each share must lie in [0, 100] and the blend must not exceed 100%.
    pub fn validate(&self) -> Result<(), EconError> {
        let mut sum = 0.0;
        for grade in FinishGrade::ALL {
            let pct = self.percent(grade);
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(EconError::InvalidInput("mix percentage"));
            }
            sum += pct;
        }
        if sum > 100.0 + 1e-9 {
            return Err(EconError::InvalidInput("mix percentages exceed 100"));
        }
        Ok(())
    }

    /// Σ pct/100 × grams over the three finish grades.
    pub fn blended_grams_per_m2(&self, grades: &FinishGradeCosts) -> f64 {
        FinishGrade::ALL
            .iter()
            .map(|&g| self.percent(g) / 100.0 * grades.grams_per_m2(g))
            .sum()
    }
}

/// Per-unit lease economics of a line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaseTerms {
    pub rent_monthly: f64,
    #[serde(default)]
    pub dev_monthly: f64,
    #[serde(default)]
    pub maint_monthly: f64,
    pub lease_years: u32,
    #[serde(default)]
    pub non_construction_capex: f64,
}

/// Maximum capex one unit can carry over its lease:
/// rent×12×years − (dev+maint)×12×years − non-construction capex.
///
/// May be negative when running costs exceed rent.
pub fn calculate_max_capex(terms: &LeaseTerms) -> Result<f64, EconError> {
    let rent = non_negative("monthly rent", terms.rent_monthly)?;
    let dev = non_negative("monthly development fee", terms.dev_monthly)?;
    let maint = non_negative("monthly maintenance", terms.maint_monthly)?;
    let capex = non_negative("non-construction capex", terms.non_construction_capex)?;
    let months = MONTHS_PER_YEAR * f64::from(terms.lease_years);
    Ok(rent * months - (dev + maint) * months - capex)
}

/// One row of a legacy scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyLineItem {
    pub category: String,
    /// Gross floor area of the whole line in m².
    pub gfa_m2: f64,
    pub units: u32,
    pub lease: LeaseTerms,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyCategoryResult {
    pub gfa_m2: f64,
    pub units: u64,
    pub cost_per_m2: f64,
    pub cost: f64,
    pub revenue: f64,
    pub margin: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySummary {
    pub by_category: BTreeMap<String, LegacyCategoryResult>,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub margin: f64,
}

/// Blended construction cost per m² of a category.
pub fn legacy_cost_per_m2(
    rule: &MixRule,
    grades: &FinishGradeCosts,
    pricing: &GoldPricing,
) -> Result<f64, EconError> {
    rule.validate()?;
    pricing.to_currency(rule.blended_grams_per_m2(grades))
}

/// Price every line item and aggregate per category and overall.
///
/// `pricing` is applied as given, FX included. The historical figures were
/// computed straight from the gold price per gram, so pass an FX rate of 1.0
/// to reproduce them; the takeoff engine's local-currency pricing scales every
/// cost by its FX rate.
///
/// Every mix rule is validated up front and an invalid one fails the whole
/// evaluation. A line item whose category has no rule, or whose area or lease
/// terms are invalid, is skipped with a warning.
pub fn evaluate_legacy(
    items: &[LegacyLineItem],
    rules: &[MixRule],
    grades: &FinishGradeCosts,
    pricing: &GoldPricing,
) -> Result<LegacySummary, EconError> {
    let mut costs = BTreeMap::new();
    for rule in rules {
        let cost_per_m2 = legacy_cost_per_m2(rule, grades, pricing)?;
        costs.entry(rule.category.as_str()).or_insert(cost_per_m2);
    }

    let mut summary = LegacySummary::default();
    for item in items {
        let Some(&cost_per_m2) = costs.get(item.category.as_str()) else {
            warn!(category = %item.category, "no mix rule for legacy line item; skipped");
            continue;
        };
        let priced = non_negative("gfa m2", item.gfa_m2).and_then(|gfa| {
            let revenue = calculate_max_capex(&item.lease)? * f64::from(item.units);
            Ok((gfa, gfa * cost_per_m2, revenue))
        });
        let (gfa, cost, revenue) = match priced {
            Ok(line) => line,
            Err(e) => {
                warn!(category = %item.category, error = %e, "invalid legacy line item; skipped");
                continue;
            }
        };

        let entry = summary.by_category.entry(item.category.clone()).or_default();
        entry.gfa_m2 += gfa;
        entry.units += u64::from(item.units);
        entry.cost_per_m2 = cost_per_m2;
        entry.cost += cost;
        entry.revenue += revenue;
        entry.margin = entry.revenue - entry.cost;

        summary.total_cost += cost;
        summary.total_revenue += revenue;
    }
    summary.margin = summary.total_revenue - summary.total_cost;
    Ok(summary)
}
