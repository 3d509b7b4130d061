//! Entry points: evaluate a scenario, a bare site, or a whole snapshot.

use plan_catalog::{
    default_layouts, default_occupancy_rates, default_parameters, BuildingLayout, Snapshot,
};
use plan_core::{EngineConfig, OccupancyRate, ParameterSet, Project, Scenario, Site};
use plan_econ::GoldPricing;
use std::collections::BTreeMap;
use tracing::debug;

use crate::resolver::TypologyResolver;
use crate::summary::{summarize, ScenarioSummary};
use crate::takeoff::{takeoff, TakeoffContext};
use crate::EngineError;

/// Tables and prices shared by every evaluation of one snapshot.
#[derive(Clone, Debug)]
pub struct EvaluationInputs {
    pub pricing: GoldPricing,
    pub layouts: Vec<BuildingLayout>,
    pub occupancy_rates: Vec<OccupancyRate>,
    /// Last resolution tier.
    pub builtin: ParameterSet,
    pub config: EngineConfig,
}

impl EvaluationInputs {
    /// Inputs backed by the built-in catalog tables.
    pub fn new(pricing: GoldPricing) -> Self {
        Self {
            pricing,
            layouts: default_layouts(),
            occupancy_rates: default_occupancy_rates(),
            builtin: default_parameters(),
            config: EngineConfig::default(),
        }
    }

    pub fn from_snapshot(snapshot: &Snapshot, pricing: GoldPricing) -> Self {
        Self {
            pricing,
            layouts: snapshot.layouts.clone(),
            occupancy_rates: snapshot.occupancy_rates.clone(),
            builtin: default_parameters(),
            config: snapshot.config.clone(),
        }
    }

    /// Resolver for a project, optionally seen through a scenario's overrides.
    pub fn resolver<'a>(
        &'a self,
        project: &'a Project,
        scenario: Option<&'a Scenario>,
    ) -> TypologyResolver<'a> {
        TypologyResolver::new(
            &project.parameters,
            scenario.map(|s| &s.overrides),
            &self.builtin,
            self.pricing,
        )
    }

    fn run(&self, site: &Site, resolver: TypologyResolver<'_>, years: u32) -> ScenarioSummary {
        let ctx = TakeoffContext {
            resolver,
            layouts: &self.layouts,
            occupancy_rates: &self.occupancy_rates,
            rental_period_years: years,
            config: &self.config,
        };
        summarize(takeoff(&site.blocks, &ctx), years)
    }
}

/// Evaluate one scenario against its site.
pub fn evaluate_scenario(
    project: &Project,
    scenario: &Scenario,
    inputs: &EvaluationInputs,
) -> Result<ScenarioSummary, EngineError> {
    let site = project
        .site(&scenario.site_id)
        .ok_or_else(|| EngineError::UnknownSite(scenario.site_id.clone()))?;
    let years = scenario.effective_rental_period(project, &inputs.config);
    let summary = inputs.run(site, inputs.resolver(project, Some(scenario)), years);
    debug!(
        scenario = %scenario.id,
        units = summary.total_units,
        cost = summary.total_cost,
        revenue = summary.total_revenue,
        "scenario evaluated"
    );
    Ok(summary)
}

/// Evaluate a site with project defaults only.
pub fn evaluate_site(project: &Project, site: &Site, inputs: &EvaluationInputs) -> ScenarioSummary {
    let years = project
        .max_rental_period_years
        .unwrap_or(inputs.config.default_rental_period_years);
    inputs.run(site, inputs.resolver(project, None), years)
}

/// Evaluate every scenario of a snapshot, keyed by scenario id.
pub fn evaluate_snapshot(
    snapshot: &Snapshot,
    pricing: GoldPricing,
) -> Result<BTreeMap<String, ScenarioSummary>, EngineError> {
    let inputs = EvaluationInputs::from_snapshot(snapshot, pricing);
    snapshot
        .scenarios
        .iter()
        .map(|s| {
            evaluate_scenario(&snapshot.project, s, &inputs).map(|summary| (s.id.clone(), summary))
        })
        .collect()
}
