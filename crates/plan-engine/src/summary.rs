//! Scenario-level financial summary.

use plan_core::TypeCode;
use plan_econ::MONTHS_PER_YEAR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::takeoff::{EquipmentBreakdown, HousingBreakdown, TakeoffResult};

/// What reporting and UI collaborators read. Never recomputed downstream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub rental_period_years: u32,
    pub total_units: u64,
    pub total_build_area_m2: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    /// Sum of monthly rents of every dwelling.
    pub total_monthly_rent: f64,
    pub surplus: f64,
    pub surplus_percent: f64,
    pub break_even_months: f64,
    pub break_even_years: f64,
    pub estimated_population: f64,
    pub units_by_type: BTreeMap<TypeCode, HousingBreakdown>,
    pub equipment_by_type: BTreeMap<TypeCode, EquipmentBreakdown>,
    pub utility_by_type: BTreeMap<TypeCode, EquipmentBreakdown>,
}

/// Surplus as a percentage of cost; 0 when there is no cost.
pub fn surplus_percent(surplus: f64, total_cost: f64) -> f64 {
    if total_cost > 0.0 {
        surplus / total_cost * 100.0
    } else {
        0.0
    }
}

/// Months of average revenue needed to pay back the cost; 0 when there is
/// no revenue or no rental period.
pub fn break_even_months(total_cost: f64, total_revenue: f64, rental_period_years: u32) -> f64 {
    let months = f64::from(rental_period_years) * MONTHS_PER_YEAR;
    if months <= 0.0 {
        return 0.0;
    }
    let monthly_average = total_revenue / months;
    if monthly_average > 0.0 {
        total_cost / monthly_average
    } else {
        0.0
    }
}

/// Fold a takeoff into the scenario summary.
pub fn summarize(takeoff: TakeoffResult, rental_period_years: u32) -> ScenarioSummary {
    let surplus = takeoff.total_revenue - takeoff.total_cost;
    let break_even = break_even_months(
        takeoff.total_cost,
        takeoff.total_revenue,
        rental_period_years,
    );
    ScenarioSummary {
        rental_period_years,
        total_units: takeoff.total_units,
        total_build_area_m2: takeoff.total_build_area_m2,
        total_cost: takeoff.total_cost,
        total_revenue: takeoff.total_revenue,
        total_monthly_rent: takeoff.units_by_type.values().map(|b| b.rent_monthly).sum(),
        surplus,
        surplus_percent: surplus_percent(surplus, takeoff.total_cost),
        break_even_months: break_even,
        break_even_years: break_even / MONTHS_PER_YEAR,
        estimated_population: takeoff.estimated_population,
        units_by_type: takeoff.units_by_type,
        equipment_by_type: takeoff.equipment_by_type,
        utility_by_type: takeoff.utility_by_type,
    }
}
