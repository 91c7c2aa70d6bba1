//! # Budget Scenario Engine
//!
//! A driver-based budget and forecast model. A handful of business drivers
//! (price, unit cost, monthly volume, headcount, salary) derive the monthly
//! Revenue, COGS and Payroll rows of a scenario's ledger; manual Opex/Capex
//! rows sit alongside them. Scenarios are cloned from a permanent `Base`,
//! edited independently, compared to Base cell by cell, and gated on a
//! variance threshold before submission.
//!
//! ## Core Concepts
//!
//! - **Money**: whole currency units as `i64`. All rounding is half away from zero.
//! - **Spread curve**: 12 weights summing to 1, used to turn an annual total
//!   into monthly amounts that sum back to the total exactly
//! - **Scenario store**: `Base` plus its clones, each with its own lock flag
//! - **Variance issue**: a row/month cell deviating from Base by at least the threshold
//!
//! ## Example
//!
//! ```rust,ignore
//! use budget_scenario_engine::*;
//!
//! let mut store = create_store()?;
//! store.clone_scenario("Base", "Promo")?;
//! store.mutate_drivers(
//!     "Promo",
//!     &DriverPatch { headcount: Some(30), ..Default::default() },
//!     Some(5.0),
//! )?;
//! store.spread_row("Promo", "ox-mkt", 2_400_000_000, &SpreadCurve::SeasonalQ4)?;
//!
//! let kpis = totals(&store.get("Promo")?.accounts);
//! println!("EBITDA {} (GM {}%)", kpis.ebitda, kpis.gm_pct);
//!
//! let outcome = store.submit("Promo", "")?;
//! if outcome.status == SubmissionStatus::NeedsJustification {
//!     for issue in &outcome.issues {
//!         println!("{} M{:02}: {:?}%", issue.row_name, issue.month, issue.pct);
//!     }
//! }
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod ledger;
pub mod schema;
pub mod spread;
pub mod store;
pub mod submission;
pub mod utils;
pub mod variance;

pub use config::{NegativeDriverPolicy, PlannerConfig};
pub use drivers::{derive_accounts, is_derived_row, DerivedAccounts};
pub use error::{PlannerError, Result};
pub use ledger::{gross_margin_pct, month_totals, monthly_ebitda, row_total, totals, Totals};
pub use schema::*;
pub use spread::{allocate, allocate_weights, allocate_with_tolerance, SpreadCurve};
pub use store::ScenarioStore;
pub use submission::{
    submit, SubmissionOutcome, SubmissionRecord, SubmissionState, SubmissionStatus,
    SubmissionWorkflow,
};
pub use variance::{compare_to_base, VarianceIssue, VarianceValidator};

use log::info;

/// Spreads `total` over the built-in curve called `curve_name`
/// (`flat`, `front`, `back`, `seasonalQ4`).
pub fn allocate_named(total: Money, curve_name: &str) -> Result<MonthlyVector> {
    let curve: SpreadCurve = curve_name.parse()?;
    allocate(total, &curve)
}

/// A store seeded with `Base`, `Upside` and `Downside` under default config.
pub fn create_store() -> Result<ScenarioStore> {
    create_store_with_config(PlannerConfig::default())
}

pub fn create_store_with_config(config: PlannerConfig) -> Result<ScenarioStore> {
    let store = ScenarioStore::seeded(config)?;
    info!("Seeded scenario store with {:?}", store.names());
    Ok(store)
}
