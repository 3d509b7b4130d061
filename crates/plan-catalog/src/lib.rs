#![deny(warnings)]

//! Built-in typology catalogs and YAML snapshot loading.
//!
//! The default catalog seeds the parameters of new projects and is the last
//! resolution tier of the engine. Snapshots bundle a project, its scenarios
//! and the tables the engine reads (layouts, occupancy rates, config).

use plan_core::{
    validate_occupancy_rate, validate_project, validate_scenario, BaselineFallback,
    ConstructionCostType, EngineConfig, EquipmentCategory, EquipmentUtilityType, HousingCategory,
    HousingType, OccupancyCategory, OccupancyRate, ParameterSet, Project, Scenario, TypeCode,
    ValidationError,
};
use plan_econ::legacy::FinishGradeCosts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Economics substituted for a housing code unknown to every catalog.
pub const BASELINE: BaselineFallback = BaselineFallback {
    area_m2: 80.0,
    cost_per_m2: 900.0,
    rent_monthly: 400.0,
};

/// Fixed table of dwellings per building for an apartment layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingLayout {
    pub code: TypeCode,
    pub name: String,
    /// Housing code → units in one building.
    pub units_per_building: BTreeMap<TypeCode, u32>,
}

/// Find a layout by code.
pub fn find_layout<'a>(
    layouts: &'a [BuildingLayout],
    code: &TypeCode,
) -> Option<&'a BuildingLayout> {
    layouts.iter().find(|l| &l.code == code)
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid snapshot: {0}")]
    Parse(String),
    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationError),
    #[error("scenario {scenario} references unknown site {site}")]
    UnknownSite { scenario: String, site: String },
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(e: serde_yaml::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}

fn cost(code: &str, name: &str, grams: f64) -> ConstructionCostType {
    ConstructionCostType {
        code: TypeCode::from(code),
        name: name.to_string(),
        gold_grams_per_m2: grams,
    }
}

fn housing(
    code: &str,
    name: &str,
    category: HousingCategory,
    area: f64,
    cost_type: &str,
    rent: f64,
) -> HousingType {
    HousingType {
        code: TypeCode::from(code),
        name: name.to_string(),
        category,
        default_area_m2: area,
        default_cost_type: TypeCode::from(cost_type),
        default_rent_monthly: rent,
    }
}

fn equipment(
    code: &str,
    name: &str,
    category: EquipmentCategory,
    land: f64,
    frac: f64,
    cost_type: &str,
) -> EquipmentUtilityType {
    EquipmentUtilityType {
        code: TypeCode::from(code),
        name: name.to_string(),
        category,
        land_area_m2: land,
        building_occupation_fraction: frac,
        cost_type: TypeCode::from(cost_type),
    }
}

/// The hardcoded default catalog.
pub fn default_parameters() -> ParameterSet {
    use EquipmentCategory::{Equipment, Utility};
    use HousingCategory::{Apartment, Commercial, Villa};
    ParameterSet {
        construction_costs: vec![
            cost("ZME", "Mid-end finish", 14.91),
            cost("ZHE", "High-end finish", 19.88),
            cost("ZOS", "Outstanding finish", 27.34),
            cost("ZEQ", "Equipment shell and core", 11.18),
            cost("ZUT", "Utility civil works", 8.70),
        ],
        housing_types: vec![
            housing("AMS", "Apartment mid-standing", Apartment, 75.0, "ZME", 250_000.0),
            housing("AHS", "Apartment high-standing", Apartment, 110.0, "ZHE", 400_000.0),
            housing("BMS", "Villa mid-standing", Villa, 120.0, "ZME", 450_000.0),
            housing("BHS", "Villa high-standing", Villa, 180.0, "ZHE", 700_000.0),
            housing("BOS", "Villa outstanding", Villa, 260.0, "ZOS", 1_200_000.0),
            housing("CMS", "Ground-floor shop", Commercial, 60.0, "ZME", 300_000.0),
        ],
        equipment_utility_types: vec![
            equipment("EQ-SCH", "Primary school", Equipment, 5_000.0, 0.35, "ZEQ"),
            equipment("EQ-HLT", "Health centre", Equipment, 3_000.0, 0.40, "ZEQ"),
            equipment("EQ-MSQ", "Mosque", Equipment, 1_500.0, 0.60, "ZEQ"),
            equipment("EQ-MKT", "Covered market", Equipment, 2_500.0, 0.70, "ZEQ"),
            equipment("UT-WTR", "Water tower", Utility, 400.0, 0.25, "ZUT"),
            equipment("UT-SUB", "Power substation", Utility, 600.0, 0.30, "ZUT"),
            equipment("UT-WWT", "Wastewater plant", Utility, 2_000.0, 0.20, "ZUT"),
        ],
    }
}

/// Default apartment building layouts.
pub fn default_layouts() -> Vec<BuildingLayout> {
    fn layout(code: &str, name: &str, units: &[(&str, u32)]) -> BuildingLayout {
        BuildingLayout {
            code: TypeCode::from(code),
            name: name.to_string(),
            units_per_building: units
                .iter()
                .map(|(c, n)| (TypeCode::from(*c), *n))
                .collect(),
        }
    }
    vec![
        layout("R4-AMS", "R+4 mid-standing", &[("AMS", 20)]),
        layout("R4-MIX", "R+4 mixed", &[("AMS", 12), ("AHS", 4), ("CMS", 2)]),
        layout("R6-AHS", "R+6 high-standing", &[("AHS", 24), ("CMS", 4)]),
    ]
}

/// Default people-per-unit brackets.
pub fn default_occupancy_rates() -> Vec<OccupancyRate> {
    fn rate(category: OccupancyCategory, min: f64, max: Option<f64>, people: f64) -> OccupancyRate {
        OccupancyRate {
            category,
            min_area_m2: min,
            max_area_m2: max,
            people,
        }
    }
    use OccupancyCategory::{Apartment, Villa};
    vec![
        rate(Villa, 0.0, Some(100.0), 3.0),
        rate(Villa, 100.0, Some(200.0), 5.0),
        rate(Villa, 200.0, None, 7.0),
        rate(Apartment, 0.0, Some(50.0), 2.0),
        rate(Apartment, 50.0, Some(90.0), 3.0),
        rate(Apartment, 90.0, None, 4.0),
    ]
}

/// Finish grade weights used by the legacy mix-rule model.
pub fn default_finish_grades() -> FinishGradeCosts {
    FinishGradeCosts {
        mid_end: 14.91,
        high_end: 19.88,
        outstanding: 27.34,
    }
}

/// Create a project seeded with the default catalog.
pub fn new_project(id: impl Into<String>, name: impl Into<String>) -> Project {
    Project {
        id: id.into(),
        name: name.into(),
        sites: vec![],
        parameters: default_parameters(),
        max_rental_period_years: None,
    }
}

/// Fill every empty category of `set` from the default catalog.
pub fn seed_missing_categories(set: &mut ParameterSet) {
    let defaults = default_parameters();
    if set.construction_costs.is_empty() {
        set.construction_costs = defaults.construction_costs;
    }
    if set.housing_types.is_empty() {
        set.housing_types = defaults.housing_types;
    }
    if set.equipment_utility_types.is_empty() {
        set.equipment_utility_types = defaults.equipment_utility_types;
    }
}

/// Everything the engine needs to evaluate the scenarios of one project.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub project: Project,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default = "default_layouts")]
    pub layouts: Vec<BuildingLayout>,
    #[serde(default = "default_occupancy_rates")]
    pub occupancy_rates: Vec<OccupancyRate>,
    #[serde(default)]
    pub config: EngineConfig,
}

impl Snapshot {
    /// Parse a YAML snapshot, seed missing project categories and validate.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let mut snap: Snapshot = serde_yaml::from_str(text)?;
        seed_missing_categories(&mut snap.project.parameters);
        snap.validate()?;
        debug!(
            project = %snap.project.id,
            scenarios = snap.scenarios.len(),
            layouts = snap.layouts.len(),
            "snapshot parsed"
        );
        Ok(snap)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_project(&self.project)?;
        for rate in &self.occupancy_rates {
            validate_occupancy_rate(rate)?;
        }
        for s in &self.scenarios {
            validate_scenario(s)?;
            if self.project.site(&s.site_id).is_none() {
                return Err(CatalogError::UnknownSite {
                    scenario: s.id.clone(),
                    site: s.site_id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}

/// Read and parse a snapshot file.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot, CatalogError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let snap = Snapshot::from_yaml_str(&text)?;
    info!(path = %path.display(), project = %snap.project.id, "snapshot loaded");
    Ok(snap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::{validate_parameter_set, HalfBlockKind, ParameterCategory};
    use plan_econ::legacy::{evaluate_legacy, LeaseTerms, LegacyLineItem, MixRule};
    use plan_econ::GoldPricing;
    use std::path::PathBuf;

    fn sample_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/sample_snapshot.yaml")
    }

    #[test]
    fn default_catalog_is_valid_and_self_consistent() {
        let set = default_parameters();
        validate_parameter_set(&set).unwrap();
        for h in &set.housing_types {
            assert!(
                set.construction_cost(&h.default_cost_type).is_some(),
                "{} references missing cost type",
                h.code
            );
        }
        for e in &set.equipment_utility_types {
            assert!(set.construction_cost(&e.cost_type).is_some());
        }
        for l in default_layouts() {
            for code in l.units_per_building.keys() {
                assert!(set.housing_type(code).is_some(), "{} in {}", code, l.code);
            }
        }
    }

    #[test]
    fn new_project_is_seeded() {
        let p = new_project("p", "Demo");
        assert_eq!(p.parameters, default_parameters());
        let s = Scenario::from_project("s", "site", "Copy", &p);
        assert!(s.overrides_category(ParameterCategory::Housing));
    }

    #[test]
    fn sample_snapshot_loads() {
        let snap = load_snapshot(sample_path()).unwrap();
        assert_eq!(snap.project.id, "prj-diamniadio");
        assert_eq!(snap.scenarios.len(), 2);
        // Project had no parameters in the file: seeded from the catalog.
        assert_eq!(snap.project.parameters, default_parameters());
        let site = snap.project.site("site-a").unwrap();
        assert_eq!(site.blocks.len(), 2);
        assert_eq!(site.blocks[0].half_blocks[1].kind, HalfBlockKind::Apartments);
        assert_eq!(site.blocks[0].half_blocks[1].apartment_building_count(), 2);
        let premium = snap.scenario("scn-premium").unwrap();
        assert!(premium.overrides_category(ParameterCategory::Housing));
        assert!(!premium.overrides_category(ParameterCategory::ConstructionCost));
        assert_eq!(snap.layouts, default_layouts());
        assert_eq!(snap.config.default_rental_period_years, 20);
    }

    #[test]
    fn scenario_with_unknown_site_is_rejected() {
        let yaml = r#"
project:
  id: p
  name: P
scenarios:
  - id: s
    site_id: nowhere
    name: Orphan
"#;
        assert!(matches!(
            Snapshot::from_yaml_str(yaml),
            Err(CatalogError::UnknownSite { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            Snapshot::from_yaml_str("project: [1, 2"),
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(
            load_snapshot("/definitely/not/here.yaml"),
            Err(CatalogError::Io(_))
        ));
    }

    #[test]
    fn find_layout_by_code() {
        let layouts = default_layouts();
        let l = find_layout(&layouts, &TypeCode::from("R4-MIX")).unwrap();
        assert_eq!(l.units_per_building[&TypeCode::from("AHS")], 4);
        assert!(find_layout(&layouts, &TypeCode::from("R9-XXL")).is_none());
    }

    #[test]
    fn default_finish_grades_price_a_legacy_scenario() {
        let grades = default_finish_grades();
        let set = default_parameters();
        // Finish grades mirror the residential cost grades of the catalog.
        for (code, grams) in [
            ("ZME", grades.mid_end),
            ("ZHE", grades.high_end),
            ("ZOS", grades.outstanding),
        ] {
            let cost = set.construction_cost(&TypeCode::from(code)).unwrap();
            assert_eq!(cost.gold_grams_per_m2, grams);
        }

        let rules = vec![MixRule {
            category: "apartment".into(),
            mid_end_pct: 60.0,
            high_end_pct: 40.0,
            outstanding_pct: 0.0,
        }];
        let items = vec![LegacyLineItem {
            category: "apartment".into(),
            gfa_m2: 1_000.0,
            units: 10,
            lease: LeaseTerms {
                rent_monthly: 250_000.0,
                dev_monthly: 0.0,
                maint_monthly: 0.0,
                lease_years: 20,
                non_construction_capex: 0.0,
            },
        }];
        let pricing = GoldPricing::new(65.0, 1.0).unwrap();
        let s = evaluate_legacy(&items, &rules, &grades, &pricing).unwrap();
        let expected = 1_000.0 * (0.6 * 14.91 + 0.4 * 19.88) * 65.0;
        assert!((s.total_cost - expected).abs() < 1e-6);
        assert_eq!(s.total_revenue, 250_000.0 * 12.0 * 20.0 * 10.0);
        assert_eq!(s.margin, s.total_revenue - s.total_cost);
    }
}
