//! Typology resolution: scenario override → project default → built-in catalog.
//!
//! Scenario overrides replace project defaults per category, all or nothing:
//! if a scenario owns any record of a category, lookups for that category
//! search only the scenario's records. A miss in the selected set falls back
//! to the built-in catalog, and a miss there is [`EngineError::UnresolvedTypeCode`].

use plan_core::{
    BaselineFallback, ConstructionCostType, EquipmentCategory, EquipmentUtilityType, HousingType,
    ParameterCategory, ParameterSet, TypeCode,
};
use plan_econ::GoldPricing;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::EngineError;

/// A resolved parameter record of any category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TypeRecord<'a> {
    ConstructionCost(&'a ConstructionCostType),
    Housing(&'a HousingType),
    EquipmentUtility(&'a EquipmentUtilityType),
}

impl<'a> TypeRecord<'a> {
    pub fn category(&self) -> ParameterCategory {
        match *self {
            TypeRecord::ConstructionCost(_) => ParameterCategory::ConstructionCost,
            TypeRecord::Housing(_) => ParameterCategory::Housing,
            TypeRecord::EquipmentUtility(_) => ParameterCategory::EquipmentUtility,
        }
    }

    pub fn code(&self) -> &'a TypeCode {
        match *self {
            TypeRecord::ConstructionCost(c) => &c.code,
            TypeRecord::Housing(h) => &h.code,
            TypeRecord::EquipmentUtility(e) => &e.code,
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            TypeRecord::ConstructionCost(c) => &c.name,
            TypeRecord::Housing(h) => &h.name,
            TypeRecord::EquipmentUtility(e) => &e.name,
        }
    }
}

/// Which tier answered a lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Scenario,
    Project,
    Builtin,
    Baseline,
}

fn lookup<'a>(
    set: &'a ParameterSet,
    category: ParameterCategory,
    code: &TypeCode,
) -> Option<TypeRecord<'a>> {
    match category {
        ParameterCategory::ConstructionCost => {
            set.construction_cost(code).map(TypeRecord::ConstructionCost)
        }
        ParameterCategory::Housing => set.housing_type(code).map(TypeRecord::Housing),
        ParameterCategory::EquipmentUtility => {
            set.equipment_type(code).map(TypeRecord::EquipmentUtility)
        }
    }
}

/// The set answering lookups for `category`, and its tier.
pub fn select_set<'a>(
    category: ParameterCategory,
    project: &'a ParameterSet,
    scenario: Option<&'a ParameterSet>,
) -> (&'a ParameterSet, Tier) {
    match scenario {
        Some(s) if !s.is_empty_for(category) => (s, Tier::Scenario),
        _ => (project, Tier::Project),
    }
}

/// Look `code` up in the scenario overrides if the scenario owns any record
/// of `category`, otherwise in the project defaults.
pub fn resolve<'a>(
    category: ParameterCategory,
    code: &TypeCode,
    project: &'a ParameterSet,
    scenario: Option<&'a ParameterSet>,
) -> Option<TypeRecord<'a>> {
    let (set, _) = select_set(category, project, scenario);
    lookup(set, category, code)
}

/// Priced economics of one dwelling type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HousingEconomics {
    /// `None` when the typology carries no usable area.
    pub area_m2: Option<f64>,
    pub cost_per_m2: f64,
    pub rent_monthly: f64,
    pub source: Tier,
}

/// Priced economics of one equipment/utility type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentEconomics {
    pub category: EquipmentCategory,
    pub build_area_m2: f64,
    pub cost_per_m2: f64,
    pub source: Tier,
}

/// Resolves type codes for one scenario computation and prices them.
#[derive(Clone, Debug)]
pub struct TypologyResolver<'a> {
    project: &'a ParameterSet,
    scenario: Option<&'a ParameterSet>,
    builtin: &'a ParameterSet,
    pricing: GoldPricing,
    baseline: BaselineFallback,
}

impl<'a> TypologyResolver<'a> {
    pub fn new(
        project: &'a ParameterSet,
        scenario: Option<&'a ParameterSet>,
        builtin: &'a ParameterSet,
        pricing: GoldPricing,
    ) -> Self {
        Self {
            project,
            scenario,
            builtin,
            pricing,
            baseline: plan_catalog::BASELINE,
        }
    }

    pub fn with_baseline(mut self, baseline: BaselineFallback) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn pricing(&self) -> &GoldPricing {
        &self.pricing
    }

    pub fn baseline(&self) -> &BaselineFallback {
        &self.baseline
    }

    /// Three-tier lookup.
    pub fn resolve(
        &self,
        category: ParameterCategory,
        code: &TypeCode,
    ) -> Result<(TypeRecord<'a>, Tier), EngineError> {
        let (set, tier) = select_set(category, self.project, self.scenario);
        if let Some(record) = lookup(set, category, code) {
            return Ok((record, tier));
        }
        lookup(self.builtin, category, code)
            .map(|record| (record, Tier::Builtin))
            .ok_or_else(|| EngineError::UnresolvedTypeCode {
                category,
                code: code.clone(),
            })
    }

    /// Currency per m² of a construction cost grade.
    pub fn cost_per_m2(&self, code: &TypeCode) -> Result<f64, EngineError> {
        match self.resolve(ParameterCategory::ConstructionCost, code)? {
            (TypeRecord::ConstructionCost(c), _) => Ok(self.pricing.cost_per_m2(c)?),
            _ => Err(EngineError::UnresolvedTypeCode {
                category: ParameterCategory::ConstructionCost,
                code: code.clone(),
            }),
        }
    }

    /// Cost per m² with the baseline substituted for an unknown grade.
    fn cost_per_m2_or_baseline(&self, code: &TypeCode, owner: &TypeCode) -> f64 {
        match self.cost_per_m2(code) {
            Ok(c) => c,
            Err(e) => {
                warn!(%owner, cost_type = %code, error = %e, "using baseline cost per m2");
                self.baseline.cost_per_m2
            }
        }
    }

    pub fn housing(&self, code: &TypeCode) -> Result<HousingEconomics, EngineError> {
        let (record, source) = self.resolve(ParameterCategory::Housing, code)?;
        let TypeRecord::Housing(h) = record else {
            return Err(EngineError::UnresolvedTypeCode {
                category: ParameterCategory::Housing,
                code: code.clone(),
            });
        };
        Ok(HousingEconomics {
            area_m2: (h.default_area_m2 > 0.0).then_some(h.default_area_m2),
            cost_per_m2: self.cost_per_m2_or_baseline(&h.default_cost_type, code),
            rent_monthly: h.default_rent_monthly,
            source,
        })
    }

    /// Housing economics, or the baseline when the code is unknown everywhere.
    pub fn housing_or_baseline(&self, code: &TypeCode) -> HousingEconomics {
        self.housing(code).unwrap_or_else(|e| {
            warn!(%code, error = %e, "using baseline housing economics");
            HousingEconomics {
                area_m2: Some(self.baseline.area_m2),
                cost_per_m2: self.baseline.cost_per_m2,
                rent_monthly: self.baseline.rent_monthly,
                source: Tier::Baseline,
            }
        })
    }

    pub fn equipment(&self, code: &TypeCode) -> Result<EquipmentEconomics, EngineError> {
        let (record, source) = self.resolve(ParameterCategory::EquipmentUtility, code)?;
        let TypeRecord::EquipmentUtility(e) = record else {
            return Err(EngineError::UnresolvedTypeCode {
                category: ParameterCategory::EquipmentUtility,
                code: code.clone(),
            });
        };
        Ok(EquipmentEconomics {
            category: e.category,
            build_area_m2: e.build_area_m2(),
            cost_per_m2: self.cost_per_m2_or_baseline(&e.cost_type, code),
            source,
        })
    }

    /// Display name of a code, whichever tier holds it.
    pub fn name_of(&self, category: ParameterCategory, code: &TypeCode) -> Option<&'a str> {
        self.resolve(category, code).ok().map(|(r, _)| r.name())
    }
}
