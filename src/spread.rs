use crate::config::DEFAULT_CURVE_TOLERANCE;
use crate::error::{PlannerError, Result};
use crate::schema::{Money, MonthlyVector};
use crate::utils::{round_money, sum_months, MAX_EXACT_MONEY, MONTHS_PER_YEAR};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SpreadCurve {
    #[schemars(description = "Evenly distributed across all 12 months")]
    Flat,

    #[schemars(description = "Front-loaded: 12% in January tapering to 6% in December")]
    Front,

    #[schemars(description = "Back-loaded: 6% in January ramping to 12% in December")]
    Back,

    #[serde(rename = "seasonalQ4")]
    #[schemars(description = "Flat 7% through H1, climbing to a December peak of 12%")]
    SeasonalQ4,

    #[schemars(description = "Twelve non-negative weights summing to 1.0, January first")]
    Custom(Vec<f64>),
}

const FRONT_WEIGHTS: [f64; 12] = [
    0.12, 0.11, 0.10, 0.09, 0.09, 0.08, 0.08, 0.07, 0.07, 0.07, 0.06, 0.06,
];

const BACK_WEIGHTS: [f64; 12] = [
    0.06, 0.06, 0.07, 0.07, 0.07, 0.08, 0.08, 0.09, 0.09, 0.10, 0.11, 0.12,
];

const SEASONAL_Q4_WEIGHTS: [f64; 12] = [
    0.07, 0.07, 0.07, 0.07, 0.07, 0.07, 0.08, 0.08, 0.09, 0.10, 0.11, 0.12,
];

impl SpreadCurve {
    pub fn builtin() -> [SpreadCurve; 4] {
        [
            SpreadCurve::Flat,
            SpreadCurve::Front,
            SpreadCurve::Back,
            SpreadCurve::SeasonalQ4,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpreadCurve::Flat => "flat",
            SpreadCurve::Front => "front",
            SpreadCurve::Back => "back",
            SpreadCurve::SeasonalQ4 => "seasonalQ4",
            SpreadCurve::Custom(_) => "custom",
        }
    }

    pub fn weights(&self) -> Vec<f64> {
        match self {
            SpreadCurve::Flat => vec![1.0 / 12.0; MONTHS_PER_YEAR],
            SpreadCurve::Front => FRONT_WEIGHTS.to_vec(),
            SpreadCurve::Back => BACK_WEIGHTS.to_vec(),
            SpreadCurve::SeasonalQ4 => SEASONAL_Q4_WEIGHTS.to_vec(),
            SpreadCurve::Custom(weights) => weights.clone(),
        }
    }
}

impl fmt::Display for SpreadCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpreadCurve {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(SpreadCurve::Flat),
            "front" => Ok(SpreadCurve::Front),
            "back" => Ok(SpreadCurve::Back),
            "seasonalq4" | "seasonal_q4" | "seasonal-q4" => Ok(SpreadCurve::SeasonalQ4),
            _ => Err(PlannerError::UnknownCurve(s.to_string())),
        }
    }
}

pub fn validate_weights(weights: &[f64], tolerance: f64) -> Result<()> {
    if weights.len() != MONTHS_PER_YEAR {
        return Err(PlannerError::InvalidCurve(format!(
            "Expected 12 weights, got {}",
            weights.len()
        )));
    }

    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(PlannerError::InvalidCurve(
            "All weights must be finite and non-negative".to_string(),
        ));
    }

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(PlannerError::InvalidCurve(format!(
            "Weights must sum to 1.0 (got {})",
            sum
        )));
    }

    Ok(())
}

/// Spreads an annual `total` over 12 months using the default curve tolerance.
pub fn allocate(total: Money, curve: &SpreadCurve) -> Result<MonthlyVector> {
    allocate_with_tolerance(total, curve, DEFAULT_CURVE_TOLERANCE)
}

pub fn allocate_with_tolerance(
    total: Money,
    curve: &SpreadCurve,
    tolerance: f64,
) -> Result<MonthlyVector> {
    allocate_weights(total, &curve.weights(), tolerance)
}

/// Each month gets `round(total * weight)`; the rounding remainder lands on
/// M12. The result always sums to `total` and never goes below zero.
pub fn allocate_weights(total: Money, weights: &[f64], tolerance: f64) -> Result<MonthlyVector> {
    if !(0..=MAX_EXACT_MONEY).contains(&total) {
        return Err(PlannerError::InvalidTotal(total));
    }
    validate_weights(weights, tolerance)?;

    let mut values: MonthlyVector = [0; MONTHS_PER_YEAR];
    for (value, weight) in values.iter_mut().zip(weights) {
        *value = round_money(total as f64 * weight);
    }

    let last = MONTHS_PER_YEAR - 1;
    values[last] += total - sum_months(&values);

    // Rounding up across many small months can overshoot by more than M12 holds.
    if values[last] < 0 {
        let mut deficit = -values[last];
        values[last] = 0;
        for value in values[..last].iter_mut().rev() {
            let take = deficit.min(*value);
            *value -= take;
            deficit -= take;
            if deficit == 0 {
                break;
            }
        }
    }

    Ok(values)
}
