//! People-per-unit lookup for the population estimate.

use plan_core::{EngineConfig, OccupancyCategory, OccupancyRate};

/// People living in one unit of `area_m2`.
///
/// The first bracket of `category` containing the area wins; without a match
/// the configured fallback applies (4 per villa, 3 per apartment by default).
pub fn people_per_unit(
    rates: &[OccupancyRate],
    area_m2: f64,
    category: OccupancyCategory,
    config: &EngineConfig,
) -> f64 {
    rates
        .iter()
        .find(|r| r.matches(area_m2, category))
        .map(|r| r.people)
        .unwrap_or(match category {
            OccupancyCategory::Villa => config.villa_occupancy_fallback,
            OccupancyCategory::Apartment => config.apartment_occupancy_fallback,
        })
}
