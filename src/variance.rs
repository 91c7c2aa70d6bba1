use crate::error::{PlannerError, Result};
use crate::schema::{Money, Scenario};
use crate::utils::MONTHS_PER_YEAR;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VarianceIssue {
    pub row_id: String,
    pub row_name: String,
    #[schemars(description = "1-based month number")]
    pub month: usize,
    pub base_value: Money,
    pub current_value: Money,
    #[schemars(
        description = "Relative deviation from Base in percent. Null when the Base cell is 0 and the current cell is not."
    )]
    pub pct: Option<f64>,
}

impl VarianceIssue {
    /// True when Base is zero and the scenario is not, so no ratio exists.
    pub fn is_unbounded(&self) -> bool {
        self.pct.is_none()
    }
}

/// `None` means unbounded: the Base cell is 0 while the current cell is not.
pub fn relative_deviation_pct(base: Money, current: Money) -> Option<f64> {
    if base == 0 {
        return if current == 0 { Some(0.0) } else { None };
    }
    let diff = current as i128 - base as i128;
    Some(diff as f64 * 100.0 / base as f64)
}

#[derive(Debug, Clone)]
pub struct VarianceValidator {
    threshold_pct: f64,
}

impl VarianceValidator {
    pub fn new(threshold_pct: f64) -> Result<Self> {
        if !threshold_pct.is_finite() || threshold_pct < 0.0 {
            return Err(PlannerError::InvalidThreshold(threshold_pct));
        }
        Ok(Self { threshold_pct })
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    fn is_flagged(&self, pct: Option<f64>) -> bool {
        match pct {
            Some(p) => p.abs() >= self.threshold_pct,
            None => true,
        }
    }

    /// Scans every Base row and month. Rows the scenario lacks compare as zero.
    ///
    /// A cell whose value matches Base is never reported, even at a 0%
    /// threshold. Any other cell is reported once `|pct| >= threshold`.
    pub fn compare(&self, scenario: &Scenario, base: &Scenario) -> Vec<VarianceIssue> {
        let mut issues = Vec::new();

        for base_row in &base.accounts {
            let current = scenario.row(&base_row.id).map(|r| r.monthly);

            for idx in 0..MONTHS_PER_YEAR {
                let base_value = base_row.monthly[idx];
                let current_value = current.map(|m| m[idx]).unwrap_or(0);
                if base_value == current_value {
                    continue;
                }

                let pct = relative_deviation_pct(base_value, current_value);
                if self.is_flagged(pct) {
                    issues.push(VarianceIssue {
                        row_id: base_row.id.clone(),
                        row_name: base_row.name.clone(),
                        month: idx + 1,
                        base_value,
                        current_value,
                        pct,
                    });
                }
            }
        }

        debug!(
            "Variance scan of '{}' against '{}' at {}%: {} issue(s)",
            scenario.name,
            base.name,
            self.threshold_pct,
            issues.len()
        );

        issues
    }
}

pub fn compare_to_base(
    scenario: &Scenario,
    base: &Scenario,
    threshold_pct: f64,
) -> Result<Vec<VarianceIssue>> {
    let validator = VarianceValidator::new(threshold_pct)?;
    Ok(validator.compare(scenario, base))
}
