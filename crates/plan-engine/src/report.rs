//! Flat report rows for PDF/Excel export.
//!
//! Rows are built from a [`ScenarioSummary`] and named through the same
//! resolver that priced them, so exported figures match the in-app summary.

use plan_core::{ParameterCategory, Project, Scenario, TypeCode};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::evaluate::{evaluate_scenario, EvaluationInputs};
use crate::resolver::TypologyResolver;
use crate::summary::ScenarioSummary;
use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSection {
    Residential,
    Equipment,
    Utility,
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportSection::Residential => "residential",
            ReportSection::Equipment => "equipment",
            ReportSection::Utility => "utility",
        };
        f.pad(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub section: ReportSection,
    pub code: TypeCode,
    /// `None` when no catalog knows the code.
    pub name: Option<String>,
    pub count: u64,
    pub area_m2: f64,
    pub rent_monthly: f64,
    pub cost: f64,
    pub revenue: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub units: u64,
    pub build_area_m2: f64,
    pub cost: f64,
    pub revenue: f64,
    pub surplus: f64,
    pub surplus_percent: f64,
    pub break_even_months: f64,
    pub population: f64,
    pub rental_period_years: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario_id: String,
    pub scenario_name: String,
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

impl ScenarioReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Residential rows first, then equipment, then utilities; codes ascending.
pub fn build_rows(summary: &ScenarioSummary, resolver: &TypologyResolver<'_>) -> Vec<ReportRow> {
    let name = |category, code: &TypeCode| resolver.name_of(category, code).map(str::to_string);
    let mut rows = Vec::with_capacity(
        summary.units_by_type.len()
            + summary.equipment_by_type.len()
            + summary.utility_by_type.len(),
    );
    for (code, b) in &summary.units_by_type {
        rows.push(ReportRow {
            section: ReportSection::Residential,
            code: code.clone(),
            name: name(ParameterCategory::Housing, code),
            count: b.count,
            area_m2: b.area_m2,
            rent_monthly: b.rent_monthly,
            cost: b.cost,
            revenue: b.revenue,
        });
    }
    let buildings = [
        (ReportSection::Equipment, &summary.equipment_by_type),
        (ReportSection::Utility, &summary.utility_by_type),
    ];
    for (section, map) in buildings {
        for (code, b) in map {
            rows.push(ReportRow {
                section,
                code: code.clone(),
                name: name(ParameterCategory::EquipmentUtility, code),
                count: b.count,
                area_m2: b.build_area_m2,
                rent_monthly: 0.0,
                cost: b.cost,
                revenue: 0.0,
            });
        }
    }
    rows
}

pub fn totals(summary: &ScenarioSummary) -> ReportTotals {
    ReportTotals {
        units: summary.total_units,
        build_area_m2: summary.total_build_area_m2,
        cost: summary.total_cost,
        revenue: summary.total_revenue,
        surplus: summary.surplus,
        surplus_percent: summary.surplus_percent,
        break_even_months: summary.break_even_months,
        population: summary.estimated_population,
        rental_period_years: summary.rental_period_years,
    }
}

/// Evaluate a scenario and lay it out for export.
pub fn scenario_report(
    project: &Project,
    scenario: &Scenario,
    inputs: &EvaluationInputs,
) -> Result<ScenarioReport, EngineError> {
    let summary = evaluate_scenario(project, scenario, inputs)?;
    let resolver = inputs.resolver(project, Some(scenario));
    Ok(ScenarioReport {
        scenario_id: scenario.id.clone(),
        scenario_name: scenario.name.clone(),
        rows: build_rows(&summary, &resolver),
        totals: totals(&summary),
    })
}
