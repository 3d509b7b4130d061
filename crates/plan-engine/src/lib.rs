#![deny(warnings)]

//! Quantity takeoff and financial aggregation for planning scenarios.
//!
//! The engine walks a site's blocks, half-blocks and units, prices every
//! dwelling and equipment through one [`resolver::TypologyResolver`], and
//! folds the result into a [`summary::ScenarioSummary`]. Everything here is
//! synchronous and pure: callers pass a snapshot in and get values out.

pub mod evaluate;
pub mod occupancy;
pub mod report;
pub mod resolver;
pub mod summary;
pub mod takeoff;

use plan_core::{ParameterCategory, TypeCode};
use plan_econ::EconError;
use thiserror::Error;

pub use evaluate::{evaluate_scenario, evaluate_site, evaluate_snapshot, EvaluationInputs};
pub use resolver::{resolve, Tier, TypeRecord, TypologyResolver};
pub use summary::{summarize, ScenarioSummary};
pub use takeoff::{takeoff, TakeoffContext, TakeoffResult};

/// Errors surfaced by the engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Invalid numeric input (price, FX rate, area, rent).
    #[error(transparent)]
    Econ(#[from] EconError),
    /// A code known to no catalog tier. Recoverable: callers substitute the baseline.
    #[error("unresolved {category} code: {code}")]
    UnresolvedTypeCode {
        category: ParameterCategory,
        code: TypeCode,
    },
    #[error("site {0} not found in project")]
    UnknownSite(String),
}
