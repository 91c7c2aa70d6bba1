//! KPI aggregation over a scenario's account rows.
//!
//! Capex rows are folded into opex, so EBITDA here is
//! `revenue - cogs - (opex + capex)`. This is a simplification of the
//! planning model, not standard EBITDA.

use crate::error::Result;
use crate::schema::{AccountRow, AccountType, Money, MonthlyVector};
use crate::utils::{month_index, round_div, saturate_money, sum_months, MONTHS_PER_YEAR};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Totals {
    pub revenue: Money,
    pub cogs: Money,
    pub opex: Money,
    pub gross: Money,
    pub ebitda: Money,
    #[schemars(description = "Gross margin percentage with one decimal place, 0 when revenue is 0")]
    pub gm_pct: f64,
}

impl Totals {
    fn from_lines(revenue: Money, cogs: Money, opex: Money) -> Self {
        let gross = saturate_money(revenue as i128 - cogs as i128);
        Self {
            revenue,
            cogs,
            opex,
            gross,
            ebitda: saturate_money(gross as i128 - opex as i128),
            gm_pct: gross_margin_pct(gross, revenue),
        }
    }
}

/// `round(gross / revenue * 1000) / 10`, computed in integers.
pub fn gross_margin_pct(gross: Money, revenue: Money) -> f64 {
    if revenue <= 0 {
        return 0.0;
    }
    round_div(gross as i128 * 1000, revenue as i128) as f64 / 10.0
}

pub fn row_total(row: &AccountRow) -> Money {
    sum_months(&row.monthly)
}

fn accumulate<F>(accounts: &[AccountRow], cell: F) -> (Money, Money, Money)
where
    F: Fn(&AccountRow) -> Money,
{
    let mut revenue: i128 = 0;
    let mut cogs: i128 = 0;
    let mut opex: i128 = 0;

    for row in accounts {
        let value = cell(row) as i128;
        match row.account_type {
            AccountType::Revenue => revenue += value,
            AccountType::Cogs => cogs += value,
            AccountType::Opex | AccountType::Capex => opex += value,
        }
    }

    (
        saturate_money(revenue),
        saturate_money(cogs),
        saturate_money(opex),
    )
}

/// Full-year totals across all rows.
pub fn totals(accounts: &[AccountRow]) -> Totals {
    let (revenue, cogs, opex) = accumulate(accounts, row_total);
    Totals::from_lines(revenue, cogs, opex)
}

/// Totals for a single 1-based month.
pub fn month_totals(accounts: &[AccountRow], month: usize) -> Result<Totals> {
    let idx = month_index(month)?;
    let (revenue, cogs, opex) = accumulate(accounts, |row| row.monthly[idx]);
    Ok(Totals::from_lines(revenue, cogs, opex))
}

/// EBITDA per month, for the grid footer.
pub fn monthly_ebitda(accounts: &[AccountRow]) -> MonthlyVector {
    let mut footer = [0; MONTHS_PER_YEAR];
    for (idx, cell) in footer.iter_mut().enumerate() {
        let (revenue, cogs, opex) = accumulate(accounts, |row| row.monthly[idx]);
        let gross = saturate_money(revenue as i128 - cogs as i128);
        *cell = saturate_money(gross as i128 - opex as i128);
    }
    footer
}
