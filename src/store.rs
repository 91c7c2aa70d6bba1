use crate::config::PlannerConfig;
use crate::drivers::{
    apply_patch, check_field, derive_accounts, is_derived_row, normalize_drivers,
    replace_derived_rows,
};
use crate::error::{PlannerError, Result};
use crate::schema::{
    AccountRow, AccountType, DriverModel, DriverPatch, Money, Scenario, StoreSnapshot,
    BASE_SCENARIO,
};
use crate::spread::{allocate_with_tolerance, SpreadCurve};
use crate::submission::{SubmissionOutcome, SubmissionWorkflow};
use crate::utils::{month_index, round_money};
use crate::variance::{VarianceIssue, VarianceValidator};
use chrono::Utc;
use log::{debug, info};
use std::collections::BTreeMap;

/// Named scenarios with the permanent `Base` baseline.
///
/// Base lives in its own field so it can never be missing from the store.
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    config: PlannerConfig,
    base: Scenario,
    others: BTreeMap<String, Scenario>,
}

impl ScenarioStore {
    /// Builds a store around `base`. The scenario is renamed to `Base`, its
    /// drivers are normalised and its derived rows recomputed.
    pub fn new(config: PlannerConfig, mut base: Scenario) -> Result<Self> {
        config.validate()?;
        base.name = BASE_SCENARIO.to_string();
        recompute(&mut base, &config)?;

        info!(
            "Scenario store created for {} / {} ({})",
            base.company, base.department, base.year
        );

        Ok(Self {
            config,
            base,
            others: BTreeMap::new(),
        })
    }

    /// Base plus the `Upside` (+10% volume, +5% price) and `Downside`
    /// (-10% volume, -5% price) clones.
    pub fn seeded(config: PlannerConfig) -> Result<Self> {
        let tolerance = config.curve_tolerance;
        let base = Scenario {
            name: BASE_SCENARIO.to_string(),
            company: "ABC Trading JSC".to_string(),
            department: "Sales".to_string(),
            year: 2025,
            drivers: DriverModel {
                price: 1_200_000,
                unit_cost: 720_000,
                volume: [
                    800, 820, 850, 870, 900, 950, 980, 1_000, 1_050, 1_100, 1_200, 1_350,
                ],
                headcount: 25,
                salary: 18_000_000,
            },
            accounts: vec![
                manual_row("ox-rent", "Office rent", AccountType::Opex, [120_000_000; 12]),
                manual_row(
                    "ox-mkt",
                    "Marketing",
                    AccountType::Opex,
                    allocate_with_tolerance(1_800_000_000, &SpreadCurve::SeasonalQ4, tolerance)?,
                ),
                manual_row(
                    "cx-it",
                    "IT equipment",
                    AccountType::Capex,
                    allocate_with_tolerance(600_000_000, &SpreadCurve::Front, tolerance)?,
                ),
            ],
            locked: false,
            created_at: Utc::now(),
        };

        let mut store = Self::new(config, base)?;
        let base_volume = store.base.drivers.volume;

        store.clone_scenario(BASE_SCENARIO, "Upside")?;
        store.mutate_drivers(
            "Upside",
            &DriverPatch {
                volume: Some(base_volume.map(|v| round_money(v as f64 * 1.1))),
                ..Default::default()
            },
            Some(5.0),
        )?;

        store.clone_scenario(BASE_SCENARIO, "Downside")?;
        store.mutate_drivers(
            "Downside",
            &DriverPatch {
                volume: Some(base_volume.map(|v| round_money(v as f64 * 0.9))),
                ..Default::default()
            },
            Some(-5.0),
        )?;

        Ok(store)
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn base(&self) -> &Scenario {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.others.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, name: &str) -> bool {
        name == BASE_SCENARIO || self.others.contains_key(name)
    }

    /// Base first, then the rest by name.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.base.name.as_str())
            .chain(self.others.keys().map(String::as_str))
            .collect()
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        std::iter::once(&self.base).chain(self.others.values())
    }

    pub fn get(&self, name: &str) -> Result<&Scenario> {
        if name == BASE_SCENARIO {
            return Ok(&self.base);
        }
        self.others
            .get(name)
            .ok_or_else(|| PlannerError::UnknownScenario(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Scenario> {
        if name == BASE_SCENARIO {
            return Ok(&mut self.base);
        }
        self.others
            .get_mut(name)
            .ok_or_else(|| PlannerError::UnknownScenario(name.to_string()))
    }

    fn unlocked_mut(&mut self, name: &str) -> Result<&mut Scenario> {
        let scenario = self.get_mut(name)?;
        if scenario.locked {
            return Err(PlannerError::ScenarioLocked(name.to_string()));
        }
        Ok(scenario)
    }

    /// Deep-copies `source` under `new_name`, unlocked and freshly timestamped.
    pub fn clone_scenario(&mut self, source: &str, new_name: &str) -> Result<&Scenario> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(PlannerError::InvalidName(new_name.to_string()));
        }
        if self.contains(new_name) {
            return Err(PlannerError::DuplicateName(new_name.to_string()));
        }

        let mut copy = self.get(source)?.clone();
        copy.name = new_name.to_string();
        copy.locked = false;
        copy.created_at = Utc::now();

        info!("Cloned scenario '{}' into '{}'", source, new_name);

        Ok(&*self.others.entry(new_name.to_string()).or_insert(copy))
    }

    /// Flips the lock flag and returns the new value.
    pub fn toggle_lock(&mut self, name: &str) -> Result<bool> {
        let scenario = self.get_mut(name)?;
        scenario.locked = !scenario.locked;
        info!(
            "Scenario '{}' is now {}",
            name,
            if scenario.locked { "locked" } else { "unlocked" }
        );
        Ok(scenario.locked)
    }

    /// Applies `patch` (and the optional one-off price drift) and re-derives
    /// revenue, COGS and payroll in full.
    pub fn mutate_drivers(
        &mut self,
        name: &str,
        patch: &DriverPatch,
        what_if_pct: Option<f64>,
    ) -> Result<&Scenario> {
        let policy = self.config.negative_drivers;
        let scenario = self.unlocked_mut(name)?;

        scenario.drivers = apply_patch(&scenario.drivers, patch, what_if_pct, policy)?;
        replace_derived_rows(&mut scenario.accounts, derive_accounts(&scenario.drivers));
        debug!("Re-derived accounts for '{}'", name);

        Ok(&*scenario)
    }

    /// Overwrites one cell of a manual row. `month` is 1-based.
    pub fn edit_cell(
        &mut self,
        name: &str,
        row_id: &str,
        month: usize,
        value: Money,
    ) -> Result<()> {
        let policy = self.config.negative_drivers;
        let row = self.editable_row(name, row_id)?;
        let idx = month_index(month)?;
        let label = format!("{}[M{:02}]", row_id, month);

        row.monthly[idx] = check_field(&label, value, policy)?;
        debug!("Set {}.{} = {}", name, label, row.monthly[idx]);
        Ok(())
    }

    /// Replaces a manual row with `annual_total` spread over `curve`.
    pub fn spread_row(
        &mut self,
        name: &str,
        row_id: &str,
        annual_total: Money,
        curve: &SpreadCurve,
    ) -> Result<()> {
        let tolerance = self.config.curve_tolerance;
        let row = self.editable_row(name, row_id)?;

        row.monthly = allocate_with_tolerance(annual_total, curve, tolerance)?;
        debug!(
            "Spread {} over {}.{} using '{}'",
            annual_total, name, row_id, curve
        );
        Ok(())
    }

    fn editable_row(&mut self, name: &str, row_id: &str) -> Result<&mut AccountRow> {
        let scenario = self.unlocked_mut(name)?;
        let row = scenario
            .row_mut(row_id)
            .ok_or_else(|| PlannerError::UnknownRow {
                scenario: name.to_string(),
                row: row_id.to_string(),
            })?;

        if !row.editable || is_derived_row(row_id) {
            return Err(PlannerError::NotEditable {
                scenario: name.to_string(),
                row: row_id.to_string(),
            });
        }
        Ok(row)
    }

    /// Variance of `name` against Base at the configured threshold.
    pub fn compare_to_base(&self, name: &str) -> Result<Vec<VarianceIssue>> {
        let scenario = self.get(name)?;
        let validator = VarianceValidator::new(self.config.variance_threshold_pct)?;
        Ok(validator.compare(scenario, &self.base))
    }

    pub fn submit(&self, name: &str, justification: &str) -> Result<SubmissionOutcome> {
        let scenario = self.get(name)?;
        let mut workflow = SubmissionWorkflow::new(self.config.variance_threshold_pct)?;
        Ok(workflow.submit(scenario, &self.base, justification))
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            config: self.config.clone(),
            scenarios: self.scenarios().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Rebuilds a store from a snapshot. Derived rows are recomputed from the
    /// stored drivers rather than trusted.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        let StoreSnapshot { config, scenarios } = snapshot;
        config.validate()?;

        let mut base = None;
        let mut others = BTreeMap::new();

        for mut scenario in scenarios {
            recompute(&mut scenario, &config)?;
            let name = scenario.name.clone();

            if name == BASE_SCENARIO {
                if base.replace(scenario).is_some() {
                    return Err(PlannerError::DuplicateName(name));
                }
            } else if name.trim().is_empty() {
                return Err(PlannerError::InvalidName(name));
            } else if others.insert(name.clone(), scenario).is_some() {
                return Err(PlannerError::DuplicateName(name));
            }
        }

        let base = base.ok_or(PlannerError::MissingBaseline)?;
        debug!("Loaded store snapshot with {} scenario(s)", others.len() + 1);

        Ok(Self {
            config,
            base,
            others,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: StoreSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }
}

fn manual_row(id: &str, name: &str, account_type: AccountType, monthly: [Money; 12]) -> AccountRow {
    AccountRow {
        id: id.to_string(),
        name: name.to_string(),
        account_type,
        editable: true,
        monthly,
    }
}

fn recompute(scenario: &mut Scenario, config: &PlannerConfig) -> Result<()> {
    scenario.drivers = normalize_drivers(&scenario.drivers, config.negative_drivers)?;
    replace_derived_rows(&mut scenario.accounts, derive_accounts(&scenario.drivers));
    Ok(())
}
