use crate::error::{PlannerError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VARIANCE_THRESHOLD_PCT: f64 = 10.0;
pub const DEFAULT_CURVE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NegativeDriverPolicy {
    #[default]
    #[schemars(description = "Negative driver inputs are replaced with 0 and a warning is logged")]
    Clamp,

    #[schemars(description = "Negative driver inputs fail with an InvalidDriver error")]
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PlannerConfig {
    #[serde(default = "default_variance_threshold_pct")]
    #[schemars(
        description = "Relative deviation from Base, in percent, at or above which a cell is flagged"
    )]
    pub variance_threshold_pct: f64,

    #[serde(default = "default_curve_tolerance")]
    #[schemars(description = "Allowed distance of a spread curve's weight sum from 1.0")]
    pub curve_tolerance: f64,

    #[serde(default)]
    pub negative_drivers: NegativeDriverPolicy,
}

fn default_variance_threshold_pct() -> f64 {
    DEFAULT_VARIANCE_THRESHOLD_PCT
}

fn default_curve_tolerance() -> f64 {
    DEFAULT_CURVE_TOLERANCE
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            variance_threshold_pct: DEFAULT_VARIANCE_THRESHOLD_PCT,
            curve_tolerance: DEFAULT_CURVE_TOLERANCE,
            negative_drivers: NegativeDriverPolicy::Clamp,
        }
    }
}

impl PlannerConfig {
    /// Parses a (possibly partial) JSON document; missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlannerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.variance_threshold_pct.is_finite() || self.variance_threshold_pct < 0.0 {
            return Err(PlannerError::InvalidThreshold(self.variance_threshold_pct));
        }

        if !self.curve_tolerance.is_finite() || self.curve_tolerance <= 0.0 {
            return Err(PlannerError::InvalidConfig(format!(
                "curve_tolerance must be finite and positive (got {})",
                self.curve_tolerance
            )));
        }

        Ok(())
    }
}
