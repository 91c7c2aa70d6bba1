use crate::config::PlannerConfig;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Whole units of the reporting currency (e.g. Vietnamese đồng).
pub type Money = i64;

/// One value per calendar month, M01 first.
pub type MonthlyVector = [Money; 12];

pub const REVENUE_ROW_ID: &str = "rev";
pub const COGS_ROW_ID: &str = "cogs";
pub const PAYROLL_ROW_ID: &str = "ox-pay";

pub const BASE_SCENARIO: &str = "Base";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub enum AccountType {
    #[schemars(description = "Sales of goods or services")]
    Revenue,

    #[serde(rename = "COGS")]
    #[schemars(description = "Direct cost of goods sold")]
    Cogs,

    #[schemars(description = "Operating expenses such as payroll, rent, marketing")]
    Opex,

    #[schemars(
        description = "Capital expenditure. Folded into Opex when computing EBITDA in this model."
    )]
    Capex,
}

impl AccountType {
    /// Whether rows of this type count towards the opex line of the totals.
    pub fn is_operating_cost(&self) -> bool {
        matches!(self, AccountType::Opex | AccountType::Capex)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AccountRow {
    #[schemars(description = "Stable row identity, e.g. 'rev', 'cogs', 'ox-pay', 'ox-rent'")]
    pub id: String,

    #[schemars(description = "Display name of the account")]
    pub name: String,

    #[serde(rename = "type")]
    pub account_type: AccountType,

    #[schemars(
        description = "Manual rows are editable cell by cell. Derived rows (revenue, COGS, payroll) are recomputed from drivers and never editable."
    )]
    pub editable: bool,

    #[schemars(description = "Twelve monthly amounts, M01..M12")]
    pub monthly: MonthlyVector,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct DriverModel {
    #[schemars(description = "Selling price per unit")]
    pub price: Money,

    #[schemars(description = "Direct cost per unit")]
    pub unit_cost: Money,

    #[schemars(description = "Units sold per month, M01..M12")]
    pub volume: MonthlyVector,

    #[schemars(description = "Number of employees on payroll")]
    pub headcount: i64,

    #[schemars(description = "Salary per head per month")]
    pub salary: Money,
}

/// Partial update of a [`DriverModel`]. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct DriverPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<MonthlyVector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headcount: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Money>,
}

impl DriverPatch {
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.unit_cost.is_none()
            && self.volume.is_none()
            && self.headcount.is_none()
            && self.salary.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Scenario {
    #[schemars(description = "Unique key within the store, e.g. 'Base', 'Upside'")]
    pub name: String,

    pub company: String,

    pub department: String,

    #[schemars(description = "Budget year")]
    pub year: i32,

    pub drivers: DriverModel,

    #[schemars(
        description = "Ordered account rows. Revenue, COGS and payroll are always present; manual Opex/Capex rows follow."
    )]
    pub accounts: Vec<AccountRow>,

    #[schemars(description = "When true, every mutation of this scenario is rejected")]
    pub locked: bool,

    pub created_at: DateTime<Utc>,
}

impl Scenario {
    pub fn row(&self, row_id: &str) -> Option<&AccountRow> {
        self.accounts.iter().find(|r| r.id == row_id)
    }

    pub(crate) fn row_mut(&mut self, row_id: &str) -> Option<&mut AccountRow> {
        self.accounts.iter_mut().find(|r| r.id == row_id)
    }
}

/// Serialized form of a whole scenario store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub config: PlannerConfig,

    #[schemars(description = "All scenarios. Must include the 'Base' scenario.")]
    pub scenarios: Vec<Scenario>,
}

impl StoreSnapshot {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(StoreSnapshot)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
