//! Approval gate for a scenario.
//!
//! ```text
//! Clean -> Validated(no issues) -> Submitted
//! Clean -> Validated(issues) -> AwaitingJustification -> Submitted
//! ```
//!
//! Every call to [`SubmissionWorkflow::submit`] re-runs validation against the
//! current values; nothing from an earlier attempt is carried over.

use crate::config::DEFAULT_VARIANCE_THRESHOLD_PCT;
use crate::error::Result;
use crate::schema::Scenario;
use crate::variance::{VarianceIssue, VarianceValidator};
use chrono::{DateTime, Utc};
use log::{info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    NeedsJustification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionRecord {
    pub scenario: String,
    pub issues: Vec<VarianceIssue>,
    pub justification: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn accepted_with_exception(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Clean,
    Validated { issues: Vec<VarianceIssue> },
    AwaitingJustification { issues: Vec<VarianceIssue> },
    Submitted(SubmissionRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    pub issues: Vec<VarianceIssue>,
    pub justification: Option<String>,
}

impl SubmissionOutcome {
    pub fn is_submitted(&self) -> bool {
        self.status == SubmissionStatus::Submitted
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionWorkflow {
    validator: VarianceValidator,
    state: SubmissionState,
}

impl SubmissionWorkflow {
    pub fn new(threshold_pct: f64) -> Result<Self> {
        Ok(Self {
            validator: VarianceValidator::new(threshold_pct)?,
            state: SubmissionState::Clean,
        })
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn validate(&mut self, scenario: &Scenario, base: &Scenario) -> Vec<VarianceIssue> {
        let issues = self.validator.compare(scenario, base);
        self.state = SubmissionState::Validated {
            issues: issues.clone(),
        };
        issues
    }

    pub fn submit(
        &mut self,
        scenario: &Scenario,
        base: &Scenario,
        justification: &str,
    ) -> SubmissionOutcome {
        let issues = self.validator.compare(scenario, base);
        let justification = justification.trim();

        if issues.is_empty() {
            info!("Scenario '{}' submitted with no variance issues", scenario.name);
            return self.finish(scenario, issues, None);
        }

        if justification.is_empty() {
            info!(
                "Scenario '{}' needs justification for {} variance issue(s)",
                scenario.name,
                issues.len()
            );
            self.state = SubmissionState::AwaitingJustification {
                issues: issues.clone(),
            };
            return SubmissionOutcome {
                status: SubmissionStatus::NeedsJustification,
                issues,
                justification: None,
            };
        }

        warn!(
            "Scenario '{}' submitted with {} variance exception(s): {}",
            scenario.name,
            issues.len(),
            justification
        );
        self.finish(scenario, issues, Some(justification.to_string()))
    }

    fn finish(
        &mut self,
        scenario: &Scenario,
        issues: Vec<VarianceIssue>,
        justification: Option<String>,
    ) -> SubmissionOutcome {
        self.state = SubmissionState::Submitted(SubmissionRecord {
            scenario: scenario.name.clone(),
            issues: issues.clone(),
            justification: justification.clone(),
            submitted_at: Utc::now(),
        });
        SubmissionOutcome {
            status: SubmissionStatus::Submitted,
            issues,
            justification,
        }
    }
}

/// Submits `scenario` against `base` at the default 10% threshold.
pub fn submit(
    scenario: &Scenario,
    base: &Scenario,
    justification: &str,
) -> Result<SubmissionOutcome> {
    let mut workflow = SubmissionWorkflow::new(DEFAULT_VARIANCE_THRESHOLD_PCT)?;
    Ok(workflow.submit(scenario, base, justification))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;
    use crate::schema::{AccountRow, AccountType, DriverModel};

    fn scenario(name: &str, monthly: [i64; 12]) -> Scenario {
        Scenario {
            name: name.to_string(),
            company: "HQ".to_string(),
            department: "Sales".to_string(),
            year: 2025,
            drivers: DriverModel {
                price: 0,
                unit_cost: 0,
                volume: [0; 12],
                headcount: 0,
                salary: 0,
            },
            accounts: vec![AccountRow {
                id: "ox-rent".to_string(),
                name: "Rent".to_string(),
                account_type: AccountType::Opex,
                editable: true,
                monthly,
            }],
            locked: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_clean_submission() {
        let base = scenario("Base", [100; 12]);
        let current = scenario("S", [105; 12]);

        let mut workflow = SubmissionWorkflow::new(10.0).unwrap();
        assert_eq!(workflow.state(), &SubmissionState::Clean);

        let outcome = workflow.submit(&current, &base, "");
        assert!(outcome.is_submitted());
        assert!(outcome.issues.is_empty());
        match workflow.state() {
            SubmissionState::Submitted(record) => {
                assert_eq!(record.scenario, "S");
                assert!(!record.accepted_with_exception());
            }
            other => panic!("expected Submitted, got {:?}", other),
        }
    }

    #[test]
    fn test_issues_need_justification() {
        let base = scenario("Base", [200; 12]);
        let mut monthly = [200; 12];
        monthly[6] = 230;
        let current = scenario("S", monthly);

        let mut workflow = SubmissionWorkflow::new(10.0).unwrap();
        let outcome = workflow.submit(&current, &base, "   ");
        assert_eq!(outcome.status, SubmissionStatus::NeedsJustification);
        assert_eq!(outcome.issues.len(), 1);
        assert!(matches!(
            workflow.state(),
            SubmissionState::AwaitingJustification { issues } if issues.len() == 1
        ));

        let outcome = workflow.submit(&current, &base, "Promo in July");
        assert!(outcome.is_submitted());
        assert_eq!(outcome.justification.as_deref(), Some("Promo in July"));
        match workflow.state() {
            SubmissionState::Submitted(record) => {
                assert!(record.accepted_with_exception());
                assert_eq!(record.justification.as_deref(), Some("Promo in July"));
            }
            other => panic!("expected Submitted, got {:?}", other),
        }
    }

    #[test]
    fn test_resubmit_revalidates() {
        let base = scenario("Base", [100; 12]);
        let mut workflow = SubmissionWorkflow::new(10.0).unwrap();

        let outcome = workflow.submit(&scenario("S", [150; 12]), &base, "");
        assert_eq!(outcome.status, SubmissionStatus::NeedsJustification);
        assert_eq!(outcome.issues.len(), 12);

        // Edited back within the band: second call starts over.
        let outcome = workflow.submit(&scenario("S", [101; 12]), &base, "");
        assert!(outcome.is_submitted());
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_validate_sets_state() {
        let base = scenario("Base", [100; 12]);
        let mut workflow = SubmissionWorkflow::new(10.0).unwrap();
        let issues = workflow.validate(&scenario("S", [80; 12]), &base);
        assert_eq!(issues.len(), 12);
        match workflow.state() {
            SubmissionState::Validated { issues: stored } => assert_eq!(stored, &issues),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_free_submit_and_status_serialization() {
        let base = scenario("Base", [100; 12]);
        let outcome = submit(&base, &base, "").unwrap();
        assert!(outcome.is_submitted());

        let json = serde_json::to_string(&SubmissionStatus::NeedsJustification).unwrap();
        assert_eq!(json, "\"needs_justification\"");
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(matches!(
            SubmissionWorkflow::new(-5.0),
            Err(PlannerError::InvalidThreshold(_))
        ));
    }
}
