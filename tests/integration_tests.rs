use budget_scenario_engine::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn manual_opex(id: &str, monthly: MonthlyVector) -> AccountRow {
    AccountRow {
        id: id.to_string(),
        name: id.to_string(),
        account_type: AccountType::Opex,
        editable: true,
        monthly,
    }
}

fn flat_store() -> anyhow::Result<ScenarioStore> {
    let base = Scenario {
        name: "ignored".to_string(),
        company: "Flat Co".to_string(),
        department: "Ops".to_string(),
        year: 2026,
        drivers: DriverModel {
            price: 1_000,
            unit_cost: 400,
            volume: [100; 12],
            headcount: 2,
            salary: 5_000,
        },
        accounts: vec![manual_opex("ox-rent", [2_000; 12])],
        locked: false,
        created_at: chrono::Utc::now(),
    };
    Ok(ScenarioStore::new(PlannerConfig::default(), base)?)
}

#[test]
fn test_allocation_sum_invariant_randomized() {
    let mut rng = StdRng::seed_from_u64(7);

    for curve in SpreadCurve::builtin() {
        for total in 0..500 {
            let values = allocate(total, &curve).unwrap();
            assert_eq!(values.iter().sum::<i64>(), total, "{} / {}", curve, total);
            assert!(values.iter().all(|&v| v >= 0), "{} / {}", curve, total);
        }

        for _ in 0..2_000 {
            let total: i64 = rng.gen_range(0..=1_000_000_000_000);
            let values = allocate(total, &curve).unwrap();
            assert_eq!(values.iter().sum::<i64>(), total);
            assert!(values.iter().all(|&v| v >= 0));
        }
    }
}

#[test]
fn test_allocation_custom_curves_randomized() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let raw: Vec<f64> = (0..12)
            .map(|_| if rng.gen_bool(0.3) { 0.0 } else { rng.gen_range(0.0..1.0) })
            .collect();
        let sum: f64 = raw.iter().sum();
        if sum == 0.0 {
            continue;
        }
        let weights: Vec<f64> = raw.iter().map(|w| w / sum).collect();
        let total: i64 = rng.gen_range(0..10_000);

        let values = allocate(total, &SpreadCurve::Custom(weights)).unwrap();
        assert_eq!(values.iter().sum::<i64>(), total);
        assert!(values.iter().all(|&v| v >= 0));
    }
}

#[test]
fn test_revenue_and_payroll_derivation() {
    let drivers = DriverModel {
        price: 1_200_000,
        unit_cost: 650_000,
        volume: [800, 810, 820, 830, 840, 850, 860, 870, 880, 890, 900, 910],
        headcount: 12,
        salary: 20_000_000,
    };
    let derived = derive_accounts(&drivers);

    assert_eq!(derived.revenue.monthly[0], 1_200_000 * 800);
    assert_eq!(derived.cogs.monthly[11], 650_000 * 910);
    for month in 0..12 {
        assert_eq!(derived.payroll.monthly[month], 12 * 20_000_000);
    }
}

#[test]
fn test_ebitda_identity_randomized() {
    let mut rng = StdRng::seed_from_u64(3);
    let types = [
        AccountType::Revenue,
        AccountType::Cogs,
        AccountType::Opex,
        AccountType::Capex,
    ];

    for _ in 0..200 {
        let rows: Vec<AccountRow> = (0..rng.gen_range(0..8))
            .map(|i| AccountRow {
                id: format!("row-{}", i),
                name: format!("Row {}", i),
                account_type: types[rng.gen_range(0..types.len())],
                editable: true,
                monthly: std::array::from_fn(|_| rng.gen_range(0..5_000_000)),
            })
            .collect();

        let t = totals(&rows);
        let capex: i64 = rows
            .iter()
            .filter(|r| r.account_type == AccountType::Capex)
            .map(row_total)
            .sum();
        let opex_only: i64 = rows
            .iter()
            .filter(|r| r.account_type == AccountType::Opex)
            .map(row_total)
            .sum();

        assert_eq!(t.ebitda, (t.revenue - t.cogs) - t.opex);
        assert_eq!(t.opex, opex_only + capex);
        assert_eq!(monthly_ebitda(&rows).iter().sum::<i64>(), t.ebitda);
    }
}

#[test]
fn test_lock_rejection_is_idempotent() -> anyhow::Result<()> {
    let mut store = create_store()?;
    assert!(store.toggle_lock("Upside")?);
    let before = store.get("Upside")?.clone();

    for _ in 0..3 {
        let patch = DriverPatch {
            volume: Some([1; 12]),
            ..Default::default()
        };
        assert!(matches!(
            store.mutate_drivers("Upside", &patch, Some(20.0)),
            Err(PlannerError::ScenarioLocked(_))
        ));
        assert!(matches!(
            store.edit_cell("Upside", "ox-rent", 4, 1),
            Err(PlannerError::ScenarioLocked(_))
        ));
    }

    assert_eq!(store.get("Upside")?, &before);
    Ok(())
}

#[test]
fn test_identical_scenario_has_no_variance() -> anyhow::Result<()> {
    let mut store = create_store()?;
    store.clone_scenario("Base", "Mirror")?;

    let issues = compare_to_base(store.get("Mirror")?, store.base(), 10.0)?;
    assert!(issues.is_empty());
    assert!(store.compare_to_base("Base")?.is_empty());
    Ok(())
}

#[test]
fn test_submission_gating_single_cell() -> anyhow::Result<()> {
    let mut store = flat_store()?;
    store.clone_scenario("Base", "Plan")?;
    // 2_000 -> 2_300 is exactly +15%.
    store.edit_cell("Plan", "ox-rent", 5, 2_300)?;

    let plan = store.get("Plan")?;
    let base = store.base();

    let outcome = submit(plan, base, "")?;
    assert_eq!(outcome.status, SubmissionStatus::NeedsJustification);
    assert_eq!(outcome.issues.len(), 1);

    let issue = &outcome.issues[0];
    assert_eq!(issue.row_id, "ox-rent");
    assert_eq!(issue.month, 5);
    assert_eq!(issue.base_value, 2_000);
    assert_eq!(issue.current_value, 2_300);
    assert_eq!(issue.pct, Some(15.0));

    let outcome = submit(plan, base, "reason")?;
    assert_eq!(outcome.status, SubmissionStatus::Submitted);
    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(outcome.justification.as_deref(), Some("reason"));
    Ok(())
}

#[test]
fn test_clone_isolation() -> anyhow::Result<()> {
    let mut store = create_store()?;
    let base_before = store.base().clone();

    store.clone_scenario("Base", "Experiment")?;
    store.mutate_drivers(
        "Experiment",
        &DriverPatch {
            price: Some(2_000_000),
            headcount: Some(50),
            ..Default::default()
        },
        Some(15.0),
    )?;
    store.edit_cell("Experiment", "ox-rent", 1, 1)?;
    store.spread_row("Experiment", "cx-it", 0, &SpreadCurve::Flat)?;

    assert_eq!(store.base(), &base_before);
    assert_eq!(store.get("Experiment")?.drivers.price, 2_300_000);
    Ok(())
}

#[test]
fn test_what_if_is_not_cumulative_state() -> anyhow::Result<()> {
    let mut store = flat_store()?;
    store.mutate_drivers("Base", &DriverPatch::default(), Some(10.0))?;
    assert_eq!(store.base().drivers.price, 1_100);

    // Next patch without a drift leaves price where the last one put it.
    store.mutate_drivers(
        "Base",
        &DriverPatch {
            headcount: Some(3),
            ..Default::default()
        },
        None,
    )?;
    assert_eq!(store.base().drivers.price, 1_100);
    Ok(())
}

#[test]
fn test_kpis_follow_driver_edits() -> anyhow::Result<()> {
    let mut store = flat_store()?;
    let before = totals(&store.base().accounts);
    assert_eq!(before.revenue, 1_200_000);
    assert_eq!(before.cogs, 480_000);
    assert_eq!(before.opex, 2 * 5_000 * 12 + 2_000 * 12);
    assert_eq!(before.gm_pct, 60.0);

    store.mutate_drivers(
        "Base",
        &DriverPatch {
            unit_cost: Some(500),
            ..Default::default()
        },
        None,
    )?;
    let after = totals(&store.base().accounts);
    assert_eq!(after.cogs, 600_000);
    assert_eq!(after.gm_pct, 50.0);
    assert_eq!(after.revenue, before.revenue);

    let march = month_totals(&store.base().accounts, 3)?;
    assert_eq!(march.ebitda, 100_000 - 50_000 - 10_000 - 2_000);
    Ok(())
}

#[test]
fn test_zero_baseline_policy() -> anyhow::Result<()> {
    let mut store = flat_store()?;
    store.spread_row("Base", "ox-rent", 0, &SpreadCurve::Flat)?;
    store.clone_scenario("Base", "Plan")?;
    store.edit_cell("Plan", "ox-rent", 12, 1)?;

    let issues = store.compare_to_base("Plan")?;
    assert_eq!(issues.len(), 1);
    assert!(issues[0].is_unbounded());
    Ok(())
}

#[test]
fn test_config_threshold_drives_store_validation() -> anyhow::Result<()> {
    let config = PlannerConfig::from_json_str(r#"{"variance_threshold_pct": 20.0}"#)?;
    let mut store = create_store_with_config(config)?;
    store.clone_scenario("Base", "Plan")?;
    let rent = store.base().row("ox-rent").map(|r| r.monthly[0]).unwrap_or(0);
    store.edit_cell("Plan", "ox-rent", 1, rent * 115 / 100)?;

    assert!(store.compare_to_base("Plan")?.is_empty());
    assert!(store.submit("Plan", "")?.is_submitted());
    Ok(())
}

#[test]
fn test_store_json_roundtrip_preserves_state() -> anyhow::Result<()> {
    let mut store = create_store()?;
    store.clone_scenario("Upside", "Stretch")?;
    store.toggle_lock("Stretch")?;

    let json = store.to_json()?;
    let restored = ScenarioStore::from_json(&json)?;

    assert_eq!(restored.names(), vec!["Base", "Downside", "Stretch", "Upside"]);
    assert!(restored.get("Stretch")?.locked);
    assert_eq!(restored.base(), store.base());
    Ok(())
}

#[test]
fn test_schema_generation() {
    let schema = StoreSnapshot::schema_as_json().unwrap();
    assert!(schema.contains("headcount"));
    assert!(schema.contains("editable"));
}

#[test]
fn test_extreme_unit_cost_saturates_kpis() -> anyhow::Result<()> {
    let mut store = create_store()?;
    store.mutate_drivers(
        "Upside",
        &DriverPatch {
            price: Some(0),
            unit_cost: Some(i64::MAX),
            ..Default::default()
        },
        None,
    )?;

    let accounts = &store.get("Upside")?.accounts;
    let kpis = totals(accounts);
    assert_eq!(kpis.revenue, 0);
    assert_eq!(kpis.cogs, i64::MAX);
    assert_eq!(kpis.gross, -i64::MAX);
    assert_eq!(kpis.ebitda, i64::MIN);
    assert_eq!(kpis.gm_pct, 0.0);
    assert_eq!(monthly_ebitda(accounts), [i64::MIN; 12]);
    Ok(())
}
