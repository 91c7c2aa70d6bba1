use crate::config::NegativeDriverPolicy;
use crate::error::{PlannerError, Result};
use crate::schema::{
    AccountRow, AccountType, DriverModel, DriverPatch, Money, MonthlyVector, COGS_ROW_ID,
    PAYROLL_ROW_ID, REVENUE_ROW_ID,
};
use crate::utils::{round_money, saturate_money, MAX_EXACT_MONEY, MONTHS_PER_YEAR};
use log::{debug, warn};

/// The three rows computed from drivers. They replace their namesakes by id.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedAccounts {
    pub revenue: AccountRow,
    pub cogs: AccountRow,
    pub payroll: AccountRow,
}

impl DerivedAccounts {
    pub fn into_rows(self) -> [AccountRow; 3] {
        [self.revenue, self.cogs, self.payroll]
    }
}

pub fn is_derived_row(row_id: &str) -> bool {
    matches!(row_id, REVENUE_ROW_ID | COGS_ROW_ID | PAYROLL_ROW_ID)
}

fn per_unit(rate: Money, volume: &MonthlyVector) -> MonthlyVector {
    let mut monthly = [0; MONTHS_PER_YEAR];
    for (cell, &units) in monthly.iter_mut().zip(volume) {
        *cell = saturate_money(rate as i128 * units as i128);
    }
    monthly
}

fn derived_row(
    id: &str,
    name: &str,
    account_type: AccountType,
    monthly: MonthlyVector,
) -> AccountRow {
    AccountRow {
        id: id.to_string(),
        name: name.to_string(),
        account_type,
        editable: false,
        monthly,
    }
}

/// Revenue and COGS follow monthly volume; payroll is `headcount * salary`
/// in every month.
pub fn derive_accounts(drivers: &DriverModel) -> DerivedAccounts {
    let payroll = saturate_money(drivers.headcount as i128 * drivers.salary as i128);

    DerivedAccounts {
        revenue: derived_row(
            REVENUE_ROW_ID,
            "Revenue",
            AccountType::Revenue,
            per_unit(drivers.price, &drivers.volume),
        ),
        cogs: derived_row(
            COGS_ROW_ID,
            "COGS",
            AccountType::Cogs,
            per_unit(drivers.unit_cost, &drivers.volume),
        ),
        payroll: derived_row(
            PAYROLL_ROW_ID,
            "Payroll",
            AccountType::Opex,
            [payroll; MONTHS_PER_YEAR],
        ),
    }
}

pub(crate) fn check_field(field: &str, value: i64, policy: NegativeDriverPolicy) -> Result<i64> {
    if value >= 0 {
        return Ok(value);
    }
    match policy {
        NegativeDriverPolicy::Clamp => {
            warn!("Clamping negative value for {} ({}) to 0", field, value);
            Ok(0)
        }
        NegativeDriverPolicy::Reject => Err(PlannerError::InvalidDriver {
            field: field.to_string(),
            value: value as f64,
        }),
    }
}

/// Enforces the non-negative driver invariant according to `policy`.
pub fn normalize_drivers(
    drivers: &DriverModel,
    policy: NegativeDriverPolicy,
) -> Result<DriverModel> {
    let mut volume = drivers.volume;
    for (idx, units) in volume.iter_mut().enumerate() {
        *units = check_field(&format!("volume[M{:02}]", idx + 1), *units, policy)?;
    }

    Ok(DriverModel {
        price: check_field("price", drivers.price, policy)?,
        unit_cost: check_field("unit_cost", drivers.unit_cost, policy)?,
        volume,
        headcount: check_field("headcount", drivers.headcount, policy)?,
        salary: check_field("salary", drivers.salary, policy)?,
    })
}

/// Merges `patch` over `current`, then applies the optional what-if price
/// drift once: `price *= 1 + what_if_pct / 100`. A 0% drift leaves the price
/// untouched; a non-zero drift on a price beyond 2^53 - 1 is rejected.
pub fn apply_patch(
    current: &DriverModel,
    patch: &DriverPatch,
    what_if_pct: Option<f64>,
    policy: NegativeDriverPolicy,
) -> Result<DriverModel> {
    let mut next = DriverModel {
        price: patch.price.unwrap_or(current.price),
        unit_cost: patch.unit_cost.unwrap_or(current.unit_cost),
        volume: patch.volume.unwrap_or(current.volume),
        headcount: patch.headcount.unwrap_or(current.headcount),
        salary: patch.salary.unwrap_or(current.salary),
    };

    if let Some(pct) = what_if_pct {
        if !pct.is_finite() {
            return Err(PlannerError::InvalidDriver {
                field: "what_if_pct".to_string(),
                value: pct,
            });
        }
        if pct != 0.0 {
            // The drift runs through f64, which is exact only up to 2^53.
            if next.price.unsigned_abs() > MAX_EXACT_MONEY as u64 {
                return Err(PlannerError::InvalidDriver {
                    field: "price".to_string(),
                    value: next.price as f64,
                });
            }
            let drifted = round_money(next.price as f64 * (1.0 + pct / 100.0));
            debug!("What-if {}% moves price {} -> {}", pct, next.price, drifted);
            next.price = drifted;
        }
    }

    normalize_drivers(&next, policy)
}

/// Swaps the derived rows inside `accounts` by id, leaving manual rows alone.
/// Derived rows missing from `accounts` are inserted at the front in
/// revenue, COGS, payroll order.
pub fn replace_derived_rows(accounts: &mut Vec<AccountRow>, derived: DerivedAccounts) {
    let mut missing = Vec::new();
    for row in derived.into_rows() {
        match accounts.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => missing.push(row),
        }
    }
    if !missing.is_empty() {
        accounts.splice(0..0, missing);
    }
}
