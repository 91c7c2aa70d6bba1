use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Spread curve has invalid weights: {0}")]
    InvalidCurve(String),

    #[error("Unknown spread curve: {0}")]
    UnknownCurve(String),

    #[error("Invalid total {0}: must be a non-negative amount no larger than 2^53 - 1")]
    InvalidTotal(i64),

    #[error("Scenario '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid scenario name '{0}': must not be blank")]
    InvalidName(String),

    #[error("Scenario '{0}' is locked")]
    ScenarioLocked(String),

    #[error("Row '{row}' in scenario '{scenario}' is derived from drivers and cannot be edited")]
    NotEditable { scenario: String, row: String },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Unknown row '{row}' in scenario '{scenario}'")]
    UnknownRow { scenario: String, row: String },

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(usize),

    #[error("Invalid driver value for {field}: {value}")]
    InvalidDriver { field: String, value: f64 },

    #[error("Invalid variance threshold {0}: must be finite and non-negative")]
    InvalidThreshold(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Store snapshot has no Base scenario")]
    MissingBaseline,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
