#![deny(warnings)]

//! Core domain models and invariants for the urban planning engine.
//!
//! This crate defines serializable records used across the workspace:
//! parameter catalogs, the project/site/block hierarchy, scenarios and
//! occupancy tables. It also carries validation helpers and the typed
//! per-category update requests used to edit parameter records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Identifier of a typology or cost grade, e.g. "ZME", "AMS", "BMS".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCode(pub String);

impl TypeCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TypeCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The three parameter categories that can be overridden per scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterCategory {
    ConstructionCost,
    Housing,
    EquipmentUtility,
}

impl fmt::Display for ParameterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterCategory::ConstructionCost => "construction_cost",
            ParameterCategory::Housing => "housing",
            ParameterCategory::EquipmentUtility => "equipment_utility",
        };
        f.write_str(s)
    }
}

/// A material/finish grade priced in grams of gold per built m².
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstructionCostType {
    pub code: TypeCode,
    pub name: String,
    /// Grams of gold per built square meter (>= 0).
    pub gold_grams_per_m2: f64,
}

/// Residential typology families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HousingCategory {
    Apartment,
    Villa,
    Commercial,
}

/// A reusable residential unit template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HousingType {
    pub code: TypeCode,
    pub name: String,
    pub category: HousingCategory,
    /// Built area of one unit in m². Non-positive means "not set".
    pub default_area_m2: f64,
    /// Construction cost grade used to price the unit.
    pub default_cost_type: TypeCode,
    /// Monthly rent in local currency.
    pub default_rent_monthly: f64,
}

/// Non-residential asset families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentCategory {
    Equipment,
    Utility,
}

/// A non-residential built asset template (school, market, water tower...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentUtilityType {
    pub code: TypeCode,
    pub name: String,
    pub category: EquipmentCategory,
    /// Land parcel area in m².
    pub land_area_m2: f64,
    /// Share of the parcel covered by the building, in (0, 1].
    pub building_occupation_fraction: f64,
    pub cost_type: TypeCode,
}

impl EquipmentUtilityType {
    /// Built area = land area × occupation fraction.
    pub fn build_area_m2(&self) -> f64 {
        self.land_area_m2 * self.building_occupation_fraction
    }
}

/// One snapshot of the three parameter categories.
///
/// Used both for project-level defaults and for scenario-level overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    #[serde(default)]
    pub construction_costs: Vec<ConstructionCostType>,
    #[serde(default)]
    pub housing_types: Vec<HousingType>,
    #[serde(default)]
    pub equipment_utility_types: Vec<EquipmentUtilityType>,
}

impl ParameterSet {
    /// True when the set holds no record of `category`.
    pub fn is_empty_for(&self, category: ParameterCategory) -> bool {
        match category {
            ParameterCategory::ConstructionCost => self.construction_costs.is_empty(),
            ParameterCategory::Housing => self.housing_types.is_empty(),
            ParameterCategory::EquipmentUtility => self.equipment_utility_types.is_empty(),
        }
    }

    pub fn construction_cost(&self, code: &TypeCode) -> Option<&ConstructionCostType> {
        self.construction_costs.iter().find(|c| &c.code == code)
    }

    pub fn housing_type(&self, code: &TypeCode) -> Option<&HousingType> {
        self.housing_types.iter().find(|h| &h.code == code)
    }

    pub fn equipment_type(&self, code: &TypeCode) -> Option<&EquipmentUtilityType> {
        self.equipment_utility_types.iter().find(|e| &e.code == code)
    }

    /// Insert a construction cost record or replace the one with the same code.
    pub fn upsert_construction_cost(
        &mut self,
        record: ConstructionCostType,
    ) -> Result<(), ValidationError> {
        validate_construction_cost(&record)?;
        match self
            .construction_costs
            .iter_mut()
            .find(|c| c.code == record.code)
        {
            Some(slot) => *slot = record,
            None => self.construction_costs.push(record),
        }
        Ok(())
    }

    /// Insert a housing type or replace the one with the same code.
    pub fn upsert_housing_type(&mut self, record: HousingType) -> Result<(), ValidationError> {
        validate_housing_type(&record)?;
        match self.housing_types.iter_mut().find(|h| h.code == record.code) {
            Some(slot) => *slot = record,
            None => self.housing_types.push(record),
        }
        Ok(())
    }

    /// Insert an equipment/utility type or replace the one with the same code.
    pub fn upsert_equipment_type(
        &mut self,
        record: EquipmentUtilityType,
    ) -> Result<(), ValidationError> {
        validate_equipment_type(&record)?;
        match self
            .equipment_utility_types
            .iter_mut()
            .find(|e| e.code == record.code)
        {
            Some(slot) => *slot = record,
            None => self.equipment_utility_types.push(record),
        }
        Ok(())
    }

    /// Apply a validated partial update to an existing record.
    ///
    /// The record is only modified when the merged result still validates.
    pub fn apply(&mut self, update: &ParameterUpdate) -> Result<(), ValidationError> {
        update.validate()?;
        let unknown = || ValidationError::UnknownCode {
            category: update.category(),
            code: update.code().to_string(),
        };
        match update {
            ParameterUpdate::ConstructionCost(u) => {
                let mut next = self.construction_cost(&u.code).cloned().ok_or_else(unknown)?;
                if let Some(name) = &u.name {
                    next.name = name.clone();
                }
                if let Some(g) = u.gold_grams_per_m2 {
                    next.gold_grams_per_m2 = g;
                }
                self.upsert_construction_cost(next)
            }
            ParameterUpdate::Housing(u) => {
                let mut next = self.housing_type(&u.code).cloned().ok_or_else(unknown)?;
                if let Some(name) = &u.name {
                    next.name = name.clone();
                }
                if let Some(category) = u.category {
                    next.category = category;
                }
                if let Some(area) = u.default_area_m2 {
                    next.default_area_m2 = area;
                }
                if let Some(cost_type) = &u.default_cost_type {
                    next.default_cost_type = cost_type.clone();
                }
                if let Some(rent) = u.default_rent_monthly {
                    next.default_rent_monthly = rent;
                }
                self.upsert_housing_type(next)
            }
            ParameterUpdate::EquipmentUtility(u) => {
                let mut next = self.equipment_type(&u.code).cloned().ok_or_else(unknown)?;
                if let Some(name) = &u.name {
                    next.name = name.clone();
                }
                if let Some(category) = u.category {
                    next.category = category;
                }
                if let Some(land) = u.land_area_m2 {
                    next.land_area_m2 = land;
                }
                if let Some(frac) = u.building_occupation_fraction {
                    next.building_occupation_fraction = frac;
                }
                if let Some(cost_type) = &u.cost_type {
                    next.cost_type = cost_type.clone();
                }
                self.upsert_equipment_type(next)
            }
        }
    }

    /// Remove one record. Returns `true` when the category is now empty.
    pub fn remove(
        &mut self,
        category: ParameterCategory,
        code: &TypeCode,
    ) -> Result<bool, ValidationError> {
        let before = self.len_for(category);
        match category {
            ParameterCategory::ConstructionCost => {
                self.construction_costs.retain(|c| &c.code != code)
            }
            ParameterCategory::Housing => self.housing_types.retain(|h| &h.code != code),
            ParameterCategory::EquipmentUtility => {
                self.equipment_utility_types.retain(|e| &e.code != code)
            }
        }
        if self.len_for(category) == before {
            return Err(ValidationError::UnknownCode {
                category,
                code: code.to_string(),
            });
        }
        Ok(self.is_empty_for(category))
    }

    fn len_for(&self, category: ParameterCategory) -> usize {
        match category {
            ParameterCategory::ConstructionCost => self.construction_costs.len(),
            ParameterCategory::Housing => self.housing_types.len(),
            ParameterCategory::EquipmentUtility => self.equipment_utility_types.len(),
        }
    }
}

/// Partial update of a construction cost record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstructionCostUpdate {
    pub code: TypeCode,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gold_grams_per_m2: Option<f64>,
}

/// Partial update of a housing type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HousingTypeUpdate {
    pub code: TypeCode,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<HousingCategory>,
    #[serde(default)]
    pub default_area_m2: Option<f64>,
    #[serde(default)]
    pub default_cost_type: Option<TypeCode>,
    #[serde(default)]
    pub default_rent_monthly: Option<f64>,
}

/// Partial update of an equipment/utility type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquipmentUtilityUpdate {
    pub code: TypeCode,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<EquipmentCategory>,
    #[serde(default)]
    pub land_area_m2: Option<f64>,
    #[serde(default)]
    pub building_occupation_fraction: Option<f64>,
    #[serde(default)]
    pub cost_type: Option<TypeCode>,
}

/// An edit of one parameter record, tagged by category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ParameterUpdate {
    ConstructionCost(ConstructionCostUpdate),
    Housing(HousingTypeUpdate),
    EquipmentUtility(EquipmentUtilityUpdate),
}

impl ParameterUpdate {
    pub fn category(&self) -> ParameterCategory {
        match self {
            ParameterUpdate::ConstructionCost(_) => ParameterCategory::ConstructionCost,
            ParameterUpdate::Housing(_) => ParameterCategory::Housing,
            ParameterUpdate::EquipmentUtility(_) => ParameterCategory::EquipmentUtility,
        }
    }

    pub fn code(&self) -> &TypeCode {
        match self {
            ParameterUpdate::ConstructionCost(u) => &u.code,
            ParameterUpdate::Housing(u) => &u.code,
            ParameterUpdate::EquipmentUtility(u) => &u.code,
        }
    }

    /// Check the fields present in the request before it reaches a record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_code(self.code())?;
        match self {
            ParameterUpdate::ConstructionCost(u) => {
                if let Some(g) = u.gold_grams_per_m2 {
                    check_non_negative("gold_grams_per_m2", g)?;
                }
            }
            ParameterUpdate::Housing(u) => {
                if let Some(area) = u.default_area_m2 {
                    check_non_negative("default_area_m2", area)?;
                }
                if let Some(rent) = u.default_rent_monthly {
                    check_non_negative("default_rent_monthly", rent)?;
                }
                if let Some(cost_type) = &u.default_cost_type {
                    check_code(cost_type)?;
                }
            }
            ParameterUpdate::EquipmentUtility(u) => {
                if let Some(land) = u.land_area_m2 {
                    check_non_negative("land_area_m2", land)?;
                }
                if let Some(frac) = u.building_occupation_fraction {
                    check_fraction(frac)?;
                }
                if let Some(cost_type) = &u.cost_type {
                    check_code(cost_type)?;
                }
            }
        }
        Ok(())
    }
}

/// A geographic coordinate in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Site location as picked on the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    Point(LatLng),
    Polygon { ring: Vec<LatLng> },
}

/// Half-block layout family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HalfBlockKind {
    Villas,
    Apartments,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HalfBlockSide {
    North,
    South,
}

/// Leaf of the physical hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit_type", rename_all = "snake_case")]
pub enum UnitKind {
    /// A detached house with its plot size in m².
    Villa {
        #[serde(default)]
        building_type: Option<TypeCode>,
        #[serde(default)]
        size_m2: f64,
    },
    /// Placeholder for one apartment building; expands through the layout.
    ApartmentBuilding,
    Equipment { type_code: TypeCode },
    Utility { type_code: TypeCode },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    #[serde(flatten)]
    pub kind: UnitKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HalfBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: HalfBlockKind,
    #[serde(default)]
    pub side: Option<HalfBlockSide>,
    /// Building layout code, required for apartment half-blocks.
    #[serde(default)]
    pub layout: Option<TypeCode>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl HalfBlock {
    /// Number of apartment-building placeholders in this half-block.
    pub fn apartment_building_count(&self) -> u32 {
        self.units
            .iter()
            .filter(|u| matches!(u.kind, UnitKind::ApartmentBuilding))
            .count() as u32
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub half_blocks: Vec<HalfBlock>,
}

/// A geographic site with its physical hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<Location>,
    /// Site area in hectares, computed by the caller.
    #[serde(default)]
    pub area_ha: f64,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// A planning project: sites plus the default parameter catalogs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub parameters: ParameterSet,
    #[serde(default)]
    pub max_rental_period_years: Option<u32>,
}

impl Project {
    pub fn site(&self, id: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }
}

/// An alternative build-out plan for one site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub site_id: String,
    pub name: String,
    #[serde(default)]
    pub rental_period_years: Option<u32>,
    /// Scenario-scoped copies of parameter categories.
    #[serde(default)]
    pub overrides: ParameterSet,
}

impl Scenario {
    /// Create a scenario seeded with a copy of the project's current parameters.
    pub fn from_project(
        id: impl Into<String>,
        site_id: impl Into<String>,
        name: impl Into<String>,
        project: &Project,
    ) -> Self {
        Self {
            id: id.into(),
            site_id: site_id.into(),
            name: name.into(),
            rental_period_years: None,
            overrides: project.parameters.clone(),
        }
    }

    /// True when the scenario owns at least one record of `category`.
    pub fn overrides_category(&self, category: ParameterCategory) -> bool {
        !self.overrides.is_empty_for(category)
    }

    pub fn apply_override(&mut self, update: &ParameterUpdate) -> Result<(), ValidationError> {
        self.overrides.apply(update)
    }

    /// Delete one override record; the last deletion of a category makes the
    /// scenario inherit project defaults for it again.
    pub fn remove_override(
        &mut self,
        category: ParameterCategory,
        code: &TypeCode,
    ) -> Result<(), ValidationError> {
        if self.overrides.remove(category, code)? {
            debug!(scenario = %self.id, %category, "scenario reverts to project defaults");
        }
        Ok(())
    }

    /// Rental period used for revenue: scenario value, else the project
    /// maximum, else the configured default. Clamped to the project maximum.
    pub fn effective_rental_period(&self, project: &Project, config: &EngineConfig) -> u32 {
        let years = self
            .rental_period_years
            .or(project.max_rental_period_years)
            .unwrap_or(config.default_rental_period_years);
        match project.max_rental_period_years {
            Some(max) => years.min(max),
            None => years,
        }
    }
}

/// Occupancy category used by the population estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyCategory {
    Villa,
    Apartment,
}

/// People per unit for an area bracket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupancyRate {
    pub category: OccupancyCategory,
    pub min_area_m2: f64,
    #[serde(default)]
    pub max_area_m2: Option<f64>,
    pub people: f64,
}

impl OccupancyRate {
    pub fn matches(&self, area_m2: f64, category: OccupancyCategory) -> bool {
        self.category == category
            && self.min_area_m2 <= area_m2
            && self.max_area_m2.map_or(true, |max| area_m2 <= max)
    }
}

/// Substitute economics for a housing code nobody knows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineFallback {
    pub area_m2: f64,
    /// Currency per m², not gold-indexed.
    pub cost_per_m2: f64,
    pub rent_monthly: f64,
}

/// Engine configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rental period when neither scenario nor project sets one.
    pub default_rental_period_years: u32,
    /// Share of the villa plot used as built area when the typology has none.
    pub villa_footprint_ratio: f64,
    /// Housing code assumed for villas without a building type.
    pub default_villa_code: TypeCode,
    /// People per villa when no occupancy bracket matches.
    pub villa_occupancy_fallback: f64,
    /// People per apartment when no occupancy bracket matches.
    pub apartment_occupancy_fallback: f64,
    /// Lifetime of a cached gold price.
    pub gold_cache_ttl_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_rental_period_years: 20,
            villa_footprint_ratio: 0.3,
            default_villa_code: TypeCode::from("BMS"),
            villa_occupancy_fallback: 4.0,
            apartment_occupancy_fallback: 3.0,
            gold_cache_ttl_minutes: 60,
        }
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("type code must not be empty")]
    EmptyCode,
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
    #[error("negative value for {0}")]
    Negative(&'static str),
    /// Building occupation fraction must lie in (0, 1].
    #[error("occupation fraction {0} is outside (0, 1]")]
    InvalidFraction(f64),
    #[error("unknown {category} code: {code}")]
    UnknownCode {
        category: ParameterCategory,
        code: String,
    },
    #[error("duplicate {category} code: {code}")]
    DuplicateCode {
        category: ParameterCategory,
        code: String,
    },
    #[error("occupancy bracket has max area below min area")]
    InvertedBracket,
    #[error("rental period {0} years is out of range [1, 99]")]
    RentalPeriodOutOfRange(u32),
}

fn check_code(code: &TypeCode) -> Result<(), ValidationError> {
    if code.0.trim().is_empty() {
        return Err(ValidationError::EmptyCode);
    }
    Ok(())
}

fn check_non_negative(field: &'static str, v: f64) -> Result<(), ValidationError> {
    if !v.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    if v < 0.0 {
        return Err(ValidationError::Negative(field));
    }
    Ok(())
}

fn check_fraction(v: f64) -> Result<(), ValidationError> {
    if !(v.is_finite() && v > 0.0 && v <= 1.0) {
        return Err(ValidationError::InvalidFraction(v));
    }
    Ok(())
}

fn check_rental_period(years: u32) -> Result<(), ValidationError> {
    if !(1..=99).contains(&years) {
        return Err(ValidationError::RentalPeriodOutOfRange(years));
    }
    Ok(())
}

/// Validate a construction cost record.
pub fn validate_construction_cost(c: &ConstructionCostType) -> Result<(), ValidationError> {
    check_code(&c.code)?;
    check_non_negative("gold_grams_per_m2", c.gold_grams_per_m2)
}

/// Validate a housing type.
pub fn validate_housing_type(h: &HousingType) -> Result<(), ValidationError> {
    check_code(&h.code)?;
    check_code(&h.default_cost_type)?;
    check_non_negative("default_area_m2", h.default_area_m2)?;
    check_non_negative("default_rent_monthly", h.default_rent_monthly)
}

/// Validate an equipment/utility type.
pub fn validate_equipment_type(e: &EquipmentUtilityType) -> Result<(), ValidationError> {
    check_code(&e.code)?;
    check_code(&e.cost_type)?;
    check_non_negative("land_area_m2", e.land_area_m2)?;
    check_fraction(e.building_occupation_fraction)
}

/// Validate every record of a parameter set and reject duplicate codes.
pub fn validate_parameter_set(set: &ParameterSet) -> Result<(), ValidationError> {
    fn unique<'a>(
        category: ParameterCategory,
        codes: impl Iterator<Item = &'a TypeCode>,
    ) -> Result<(), ValidationError> {
        let mut seen: BTreeSet<&TypeCode> = BTreeSet::new();
        for code in codes {
            if !seen.insert(code) {
                return Err(ValidationError::DuplicateCode {
                    category,
                    code: code.to_string(),
                });
            }
        }
        Ok(())
    }

    for c in &set.construction_costs {
        validate_construction_cost(c)?;
    }
    for h in &set.housing_types {
        validate_housing_type(h)?;
    }
    for e in &set.equipment_utility_types {
        validate_equipment_type(e)?;
    }
    unique(
        ParameterCategory::ConstructionCost,
        set.construction_costs.iter().map(|c| &c.code),
    )?;
    unique(
        ParameterCategory::Housing,
        set.housing_types.iter().map(|h| &h.code),
    )?;
    unique(
        ParameterCategory::EquipmentUtility,
        set.equipment_utility_types.iter().map(|e| &e.code),
    )
}

/// Validate an occupancy bracket.
pub fn validate_occupancy_rate(r: &OccupancyRate) -> Result<(), ValidationError> {
    check_non_negative("min_area_m2", r.min_area_m2)?;
    check_non_negative("people", r.people)?;
    if let Some(max) = r.max_area_m2 {
        check_non_negative("max_area_m2", max)?;
        if max < r.min_area_m2 {
            return Err(ValidationError::InvertedBracket);
        }
    }
    Ok(())
}

/// Validate the physical hierarchy of a site.
pub fn validate_site(site: &Site) -> Result<(), ValidationError> {
    check_non_negative("area_ha", site.area_ha)?;
    for unit in site
        .blocks
        .iter()
        .flat_map(|b| &b.half_blocks)
        .flat_map(|hb| &hb.units)
    {
        match &unit.kind {
            UnitKind::Villa { size_m2, .. } => check_non_negative("size_m2", *size_m2)?,
            UnitKind::Equipment { type_code } | UnitKind::Utility { type_code } => {
                check_code(type_code)?
            }
            UnitKind::ApartmentBuilding => {}
        }
    }
    Ok(())
}

/// Validate a project: its parameters, sites and rental period cap.
pub fn validate_project(p: &Project) -> Result<(), ValidationError> {
    validate_parameter_set(&p.parameters)?;
    if let Some(max) = p.max_rental_period_years {
        check_rental_period(max)?;
    }
    for s in &p.sites {
        validate_site(s)?;
    }
    Ok(())
}

/// Validate a scenario's overrides and rental period.
pub fn validate_scenario(s: &Scenario) -> Result<(), ValidationError> {
    validate_parameter_set(&s.overrides)?;
    if let Some(years) = s.rental_period_years {
        check_rental_period(years)?;
    }
    Ok(())
}
