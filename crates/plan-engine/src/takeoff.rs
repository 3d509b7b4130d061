//! Quantity takeoff over the block → half-block → unit hierarchy.
//!
//! Dispatch is by `(half-block type, unit type)`:
//! - villas half-block, villa unit: one dwelling of the villa's housing code;
//! - apartments half-block: the layout table × number of apartment buildings,
//!   plus equipment/utility units found there.
//!
//! Anything else is skipped with a warning. The walk never fails: one bad
//! reference degrades a single line item, not the whole result.

use plan_catalog::{find_layout, BuildingLayout};
use plan_core::{
    Block, EngineConfig, HalfBlock, HalfBlockKind, OccupancyCategory, OccupancyRate, TypeCode,
    UnitKind,
};
use plan_econ::{total_build_cost, total_revenue, EconError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::occupancy::people_per_unit;
use crate::resolver::{HousingEconomics, TypologyResolver};

/// Aggregated dwellings of one housing code.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HousingBreakdown {
    pub count: u64,
    /// Total built area of all units of this code.
    pub area_m2: f64,
    /// Sum of monthly rents.
    pub rent_monthly: f64,
    pub cost: f64,
    pub revenue: f64,
    pub population: f64,
}

/// Aggregated equipment or utility buildings of one code.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentBreakdown {
    pub count: u64,
    pub build_area_m2: f64,
    pub cost: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TakeoffResult {
    /// Residential units (villas and layout dwellings).
    pub total_units: u64,
    /// Dwellings plus equipment/utility built area.
    pub total_build_area_m2: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub units_by_type: BTreeMap<TypeCode, HousingBreakdown>,
    pub equipment_by_type: BTreeMap<TypeCode, EquipmentBreakdown>,
    pub utility_by_type: BTreeMap<TypeCode, EquipmentBreakdown>,
    pub estimated_population: f64,
}

/// Inputs shared by every unit of one takeoff.
#[derive(Clone, Debug)]
pub struct TakeoffContext<'a> {
    pub resolver: TypologyResolver<'a>,
    pub layouts: &'a [BuildingLayout],
    pub occupancy_rates: &'a [OccupancyRate],
    pub rental_period_years: u32,
    pub config: &'a EngineConfig,
}

/// One priced dwelling, ready to be multiplied by a count.
struct DwellingLine {
    area_m2: f64,
    rent_monthly: f64,
    cost: f64,
    revenue: f64,
    people: f64,
}

impl TakeoffResult {
    fn add_dwellings(&mut self, code: &TypeCode, line: &DwellingLine, count: u64) {
        let n = count as f64;
        let entry = self.units_by_type.entry(code.clone()).or_default();
        entry.count += count;
        entry.area_m2 += line.area_m2 * n;
        entry.rent_monthly += line.rent_monthly * n;
        entry.cost += line.cost * n;
        entry.revenue += line.revenue * n;
        entry.population += line.people * n;

        self.total_units += count;
        self.total_build_area_m2 += line.area_m2 * n;
        self.total_cost += line.cost * n;
        self.total_revenue += line.revenue * n;
        self.estimated_population += line.people * n;
    }

    fn add_building(&mut self, kind: &UnitKind, code: &TypeCode, area_m2: f64, cost: f64) {
        let map = match kind {
            UnitKind::Utility { .. } => &mut self.utility_by_type,
            _ => &mut self.equipment_by_type,
        };
        let entry = map.entry(code.clone()).or_default();
        entry.count += 1;
        entry.build_area_m2 += area_m2;
        entry.cost += cost;

        self.total_build_area_m2 += area_m2;
        self.total_cost += cost;
    }
}

fn price_dwelling(
    econ: &HousingEconomics,
    area_m2: f64,
    category: OccupancyCategory,
    ctx: &TakeoffContext<'_>,
) -> Result<DwellingLine, EconError> {
    Ok(DwellingLine {
        area_m2,
        rent_monthly: econ.rent_monthly,
        cost: total_build_cost(area_m2, econ.cost_per_m2)?,
        revenue: total_revenue(econ.rent_monthly, ctx.rental_period_years)?,
        people: people_per_unit(ctx.occupancy_rates, area_m2, category, ctx.config),
    })
}

fn walk_villas(hb: &HalfBlock, ctx: &TakeoffContext<'_>, acc: &mut TakeoffResult) {
    for unit in &hb.units {
        let UnitKind::Villa {
            building_type,
            size_m2,
        } = &unit.kind
        else {
            warn!(unit = %unit.id, half_block = %hb.id, "misplaced unit skipped");
            continue;
        };
        let code = building_type
            .as_ref()
            .unwrap_or(&ctx.config.default_villa_code);
        let econ = ctx.resolver.housing_or_baseline(code);
        let area = econ
            .area_m2
            .unwrap_or(size_m2 * ctx.config.villa_footprint_ratio);
        match price_dwelling(&econ, area, OccupancyCategory::Villa, ctx) {
            Ok(line) => acc.add_dwellings(code, &line, 1),
            Err(e) => warn!(unit = %unit.id, %code, error = %e, "villa skipped"),
        }
    }
}

fn walk_layout(hb: &HalfBlock, ctx: &TakeoffContext<'_>, acc: &mut TakeoffResult) {
    let buildings = hb.apartment_building_count();
    if buildings == 0 {
        return;
    }
    let Some(layout_code) = &hb.layout else {
        warn!(half_block = %hb.id, buildings, "no layout on half-block; buildings skipped");
        return;
    };
    let Some(layout) = find_layout(ctx.layouts, layout_code) else {
        warn!(half_block = %hb.id, layout = %layout_code, "unknown layout; buildings skipped");
        return;
    };
    for (code, per_building) in &layout.units_per_building {
        let count = u64::from(*per_building) * u64::from(buildings);
        if count == 0 {
            continue;
        }
        let econ = ctx.resolver.housing_or_baseline(code);
        let area = econ.area_m2.unwrap_or(ctx.resolver.baseline().area_m2);
        match price_dwelling(&econ, area, OccupancyCategory::Apartment, ctx) {
            Ok(line) => acc.add_dwellings(code, &line, count),
            Err(e) => warn!(half_block = %hb.id, %code, error = %e, "layout line skipped"),
        }
    }
}

fn walk_apartments(hb: &HalfBlock, ctx: &TakeoffContext<'_>, acc: &mut TakeoffResult) {
    walk_layout(hb, ctx, acc);
    for unit in &hb.units {
        match &unit.kind {
            UnitKind::ApartmentBuilding => {}
            UnitKind::Equipment { type_code } | UnitKind::Utility { type_code } => {
                let econ = match ctx.resolver.equipment(type_code) {
                    Ok(econ) => econ,
                    Err(e) => {
                        warn!(unit = %unit.id, code = %type_code, error = %e, "equipment skipped");
                        continue;
                    }
                };
                match total_build_cost(econ.build_area_m2, econ.cost_per_m2) {
                    Ok(cost) => acc.add_building(&unit.kind, type_code, econ.build_area_m2, cost),
                    Err(e) => {
                        warn!(unit = %unit.id, code = %type_code, error = %e, "equipment skipped")
                    }
                }
            }
            UnitKind::Villa { .. } => {
                warn!(unit = %unit.id, half_block = %hb.id, "misplaced villa skipped")
            }
        }
    }
}

/// Walk every block and accumulate quantities, costs, revenue and population.
///
/// The result is a plain sum, so block, half-block and unit order only
/// affects floating-point rounding.
pub fn takeoff(blocks: &[Block], ctx: &TakeoffContext<'_>) -> TakeoffResult {
    let mut acc = TakeoffResult::default();
    for block in blocks {
        for hb in &block.half_blocks {
            match hb.kind {
                HalfBlockKind::Villas => walk_villas(hb, ctx, &mut acc),
                HalfBlockKind::Apartments => walk_apartments(hb, ctx, &mut acc),
            }
        }
    }
    acc
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;
    use plan_catalog::{default_layouts, default_occupancy_rates, default_parameters};
    use plan_core::{ConstructionCostType, HousingCategory, HousingType, ParameterSet, Unit};
    use plan_econ::GoldPricing;
    use proptest::prelude::*;

    fn villa(id: &str, code: Option<&str>, size: f64) -> Unit {
        Unit {
            id: id.to_string(),
            kind: UnitKind::Villa {
                building_type: code.map(TypeCode::from),
                size_m2: size,
            },
        }
    }

    fn unit(id: &str, kind: UnitKind) -> Unit {
        Unit {
            id: id.to_string(),
            kind,
        }
    }

    fn equipment(id: &str, code: &str) -> Unit {
        unit(
            id,
            UnitKind::Equipment {
                type_code: TypeCode::from(code),
            },
        )
    }

    fn utility(id: &str, code: &str) -> Unit {
        unit(
            id,
            UnitKind::Utility {
                type_code: TypeCode::from(code),
            },
        )
    }

    fn half_block(
        id: &str,
        kind: HalfBlockKind,
        layout: Option<&str>,
        units: Vec<Unit>,
    ) -> HalfBlock {
        HalfBlock {
            id: id.to_string(),
            kind,
            side: None,
            layout: layout.map(TypeCode::from),
            units,
        }
    }

    fn villas(id: &str, units: Vec<Unit>) -> HalfBlock {
        half_block(id, HalfBlockKind::Villas, None, units)
    }

    fn block(id: &str, half_blocks: Vec<HalfBlock>) -> Block {
        Block {
            id: id.to_string(),
            half_blocks,
        }
    }

    fn reference_project() -> ParameterSet {
        ParameterSet {
            construction_costs: vec![ConstructionCostType {
                code: TypeCode::from("ZME"),
                name: "Mid-end".into(),
                gold_grams_per_m2: 14.91,
            }],
            housing_types: vec![HousingType {
                code: TypeCode::from("BMS"),
                name: "Villa".into(),
                category: HousingCategory::Villa,
                default_area_m2: 120.0,
                default_cost_type: TypeCode::from("ZME"),
                default_rent_monthly: 450_000.0,
            }],
            equipment_utility_types: vec![],
        }
    }

    struct Fixture {
        project: ParameterSet,
        builtin: ParameterSet,
        layouts: Vec<BuildingLayout>,
        rates: Vec<OccupancyRate>,
        config: EngineConfig,
    }

    impl Fixture {
        fn new(project: ParameterSet) -> Self {
            Self {
                project,
                builtin: default_parameters(),
                layouts: default_layouts(),
                rates: default_occupancy_rates(),
                config: EngineConfig::default(),
            }
        }

        fn ctx(&self) -> TakeoffContext<'_> {
            TakeoffContext {
                resolver: TypologyResolver::new(
                    &self.project,
                    None,
                    &self.builtin,
                    GoldPricing::new(65.0, 656.0).unwrap(),
                ),
                layouts: &self.layouts,
                occupancy_rates: &self.rates,
                rental_period_years: 20,
                config: &self.config,
            }
        }
    }

    fn mixed_site() -> Vec<Block> {
        vec![
            block(
                "b1",
                vec![
                    villas(
                        "b1-n",
                        vec![
                            villa("v1", Some("BMS"), 250.0),
                            villa("v2", Some("BHS"), 400.0),
                            villa("v3", None, 300.0),
                        ],
                    ),
                    half_block(
                        "b1-s",
                        HalfBlockKind::Apartments,
                        Some("R4-MIX"),
                        vec![
                            unit("a1", UnitKind::ApartmentBuilding),
                            unit("a2", UnitKind::ApartmentBuilding),
                            equipment("e1", "EQ-SCH"),
                            utility("t1", "UT-WTR"),
                        ],
                    ),
                ],
            ),
            block(
                "b2",
                vec![
                    half_block(
                        "b2-n",
                        HalfBlockKind::Apartments,
                        Some("R4-AMS"),
                        vec![
                            unit("a3", UnitKind::ApartmentBuilding),
                            equipment("e2", "EQ-MKT"),
                        ],
                    ),
                    villas(
                        "b2-s",
                        vec![villa("v4", Some("BOS"), 600.0), villa("v5", Some("ZZZ"), 200.0)],
                    ),
                ],
            ),
            block(
                "b3",
                vec![half_block(
                    "b3-n",
                    HalfBlockKind::Apartments,
                    Some("R6-AHS"),
                    vec![
                        utility("t2", "UT-SUB"),
                        unit("a4", UnitKind::ApartmentBuilding),
                        equipment("e3", "EQ-SCH"),
                    ],
                )],
            ),
        ]
    }

    /// `mixed_site` with blocks, half-blocks and units independently shuffled.
    fn shuffled_site() -> impl Strategy<Value = Vec<Block>> {
        let blocks: Vec<BoxedStrategy<Block>> = mixed_site()
            .into_iter()
            .map(|b| {
                let half_blocks: Vec<BoxedStrategy<HalfBlock>> = b
                    .half_blocks
                    .into_iter()
                    .map(|hb| {
                        Just(hb.units.clone())
                            .prop_shuffle()
                            .prop_map(move |units| HalfBlock {
                                units,
                                ..hb.clone()
                            })
                            .boxed()
                    })
                    .collect();
                let id = b.id;
                half_blocks
                    .prop_shuffle()
                    .prop_map(move |half_blocks| Block {
                        id: id.clone(),
                        half_blocks,
                    })
                    .boxed()
            })
            .collect();
        blocks.prop_shuffle()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn single_villa_reference_scenario() {
        let f = Fixture::new(reference_project());
        let blocks = vec![block("b1", vec![villas("hb", vec![villa("v", Some("BMS"), 250.0)])])];
        let r = takeoff(&blocks, &f.ctx());
        let cost_per_m2 = 14.91 * 65.0 * 656.0;
        assert_eq!(r.total_units, 1);
        assert_eq!(r.total_build_area_m2, 120.0);
        assert!((r.total_cost - 120.0 * cost_per_m2).abs() < 1e-3);
        assert_eq!(r.total_revenue, 108_000_000.0);
        // 120 m² villa falls in the 100–200 bracket.
        assert_eq!(r.estimated_population, 5.0);
        let bms = &r.units_by_type[&TypeCode::from("BMS")];
        assert_eq!(bms.count, 1);
        assert_eq!(bms.rent_monthly, 450_000.0);
    }

    #[test]
    fn reference_villa_summary_end_to_end() {
        let f = Fixture::new(reference_project());
        let blocks = vec![block("b1", vec![villas("hb", vec![villa("v", Some("BMS"), 250.0)])])];
        let s = summarize(takeoff(&blocks, &f.ctx()), 20);
        // 120 m² × 14.91 g × 65 USD/g × 656 XOF/USD = 76 291 488
        assert!((s.total_cost - 76_291_488.0).abs() < 1e-3);
        assert_eq!(s.total_revenue, 108_000_000.0);
        assert!((s.surplus - 31_708_512.0).abs() < 1e-3);
        assert!((s.surplus_percent - 41.6).abs() < 0.1);
        assert_eq!(s.total_monthly_rent, 450_000.0);
        // Average month brings 450 000 in.
        assert!((s.break_even_months - 76_291_488.0 / 450_000.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_code_uses_baseline_and_still_counts() {
        let f = Fixture::new(reference_project());
        let blocks = vec![block("b1", vec![villas("hb", vec![villa("v", Some("ZZZ"), 250.0)])])];
        let r = takeoff(&blocks, &f.ctx());
        assert_eq!(r.total_units, 1);
        assert_eq!(r.total_build_area_m2, 80.0);
        assert_eq!(r.total_cost, 72_000.0);
        assert_eq!(r.total_revenue, 96_000.0);
        assert!(r.units_by_type.contains_key(&TypeCode::from("ZZZ")));
    }

    #[test]
    fn villa_without_typology_area_uses_plot_footprint() {
        let mut project = reference_project();
        project.housing_types[0].default_area_m2 = 0.0;
        let f = Fixture::new(project);
        let blocks = vec![block("b1", vec![villas("hb", vec![villa("v", None, 250.0)])])];
        let r = takeoff(&blocks, &f.ctx());
        assert!((r.total_build_area_m2 - 75.0).abs() < 1e-9);
    }

    #[test]
    fn apartment_layout_scales_by_building_count() {
        let f = Fixture::new(default_parameters());
        let r = takeoff(&mixed_site(), &f.ctx());
        // R4-MIX × 2: AMS 24, AHS 8, CMS 4. R4-AMS × 1: AMS 20. R6-AHS × 1: AHS 24, CMS 4.
        assert_eq!(r.units_by_type[&TypeCode::from("AMS")].count, 44);
        assert_eq!(r.units_by_type[&TypeCode::from("AHS")].count, 32);
        assert_eq!(r.units_by_type[&TypeCode::from("CMS")].count, 8);
        // Five villas: BMS twice (v1 and the defaulted v3), BHS, BOS, ZZZ.
        assert_eq!(r.units_by_type[&TypeCode::from("BMS")].count, 2);
        assert_eq!(r.total_units, 44 + 32 + 8 + 5);
        let ams = &r.units_by_type[&TypeCode::from("AMS")];
        assert!((ams.area_m2 - 44.0 * 75.0).abs() < 1e-9);
        // 75 m² apartments house 3 people each.
        assert!((ams.population - 132.0).abs() < 1e-9);
    }

    #[test]
    fn equipment_contributes_cost_but_no_revenue() {
        let f = Fixture::new(default_parameters());
        let r = takeoff(&mixed_site(), &f.ctx());
        let school = &r.equipment_by_type[&TypeCode::from("EQ-SCH")];
        assert_eq!(school.count, 2);
        assert!((school.build_area_m2 - 2.0 * 1_750.0).abs() < 1e-9);
        let tower = &r.utility_by_type[&TypeCode::from("UT-WTR")];
        assert!((tower.build_area_m2 - 100.0).abs() < 1e-9);
        assert!(r.utility_by_type.contains_key(&TypeCode::from("UT-SUB")));
        let residential_revenue: f64 = r.units_by_type.values().map(|b| b.revenue).sum();
        assert!((r.total_revenue - residential_revenue).abs() < 1e-6 * r.total_revenue);
    }

    #[test]
    fn misplaced_and_unknown_units_are_skipped() {
        let f = Fixture::new(default_parameters());
        let blocks = vec![block(
            "b1",
            vec![
                villas(
                    "villas",
                    vec![
                        equipment("e", "EQ-SCH"),
                        unit("a", UnitKind::ApartmentBuilding),
                    ],
                ),
                half_block(
                    "no-layout",
                    HalfBlockKind::Apartments,
                    None,
                    vec![
                        unit("a1", UnitKind::ApartmentBuilding),
                        villa("v", Some("BMS"), 300.0),
                    ],
                ),
                half_block(
                    "bad-layout",
                    HalfBlockKind::Apartments,
                    Some("R9-XXL"),
                    vec![
                        unit("a2", UnitKind::ApartmentBuilding),
                        equipment("e2", "EQ-NONE"),
                    ],
                ),
            ],
        )];
        let r = takeoff(&blocks, &f.ctx());
        assert_eq!(r, TakeoffResult::default());
    }

    #[test]
    fn takeoff_is_idempotent() {
        let f = Fixture::new(default_parameters());
        let site = mixed_site();
        let a = takeoff(&site, &f.ctx());
        let b = takeoff(&site, &f.ctx());
        assert_eq!(a, b);
        assert_eq!(a.total_cost.to_bits(), b.total_cost.to_bits());
    }

    proptest! {
        #[test]
        fn order_does_not_change_result(shuffled in shuffled_site()) {
            let f = Fixture::new(default_parameters());
            let a = takeoff(&mixed_site(), &f.ctx());
            let b = takeoff(&shuffled, &f.ctx());

            prop_assert_eq!(a.total_units, b.total_units);
            prop_assert!(close(a.total_cost, b.total_cost));
            prop_assert!(close(a.total_revenue, b.total_revenue));
            prop_assert!(close(a.total_build_area_m2, b.total_build_area_m2));
            prop_assert!(close(a.estimated_population, b.estimated_population));

            prop_assert!(a.units_by_type.keys().eq(b.units_by_type.keys()));
            for (code, x) in &a.units_by_type {
                let y = &b.units_by_type[code];
                prop_assert_eq!(x.count, y.count);
                prop_assert!(close(x.area_m2, y.area_m2));
                prop_assert!(close(x.rent_monthly, y.rent_monthly));
                prop_assert!(close(x.cost, y.cost));
                prop_assert!(close(x.revenue, y.revenue));
                prop_assert!(close(x.population, y.population));
            }
            for (left, right) in [
                (&a.equipment_by_type, &b.equipment_by_type),
                (&a.utility_by_type, &b.utility_by_type),
            ] {
                prop_assert!(left.keys().eq(right.keys()));
                for (code, x) in left {
                    let y = &right[code];
                    prop_assert_eq!(x.count, y.count);
                    prop_assert!(close(x.build_area_m2, y.build_area_m2));
                    prop_assert!(close(x.cost, y.cost));
                }
            }
        }
    }
}
