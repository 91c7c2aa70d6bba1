use budget_scenario_engine::*;

fn print_kpis(label: &str, accounts: &[AccountRow]) {
    let kpis = totals(accounts);
    println!(
        "  {:<10} revenue {:>16}  cogs {:>16}  opex {:>15}  ebitda {:>16}  gm {:>5.1}%",
        label, kpis.revenue, kpis.cogs, kpis.opex, kpis.ebitda, kpis.gm_pct
    );
}

fn main() -> Result<()> {
    println!("📊 Budget scenario walkthrough\n");

    let mut store = create_store()?;

    println!("Seeded scenarios:");
    for scenario in store.scenarios() {
        print_kpis(&scenario.name, &scenario.accounts);
    }

    println!("\n🧪 Cloning Base into 'Promo' and hiring 5 more people at +3% price...");
    store.clone_scenario("Base", "Promo")?;
    store.mutate_drivers(
        "Promo",
        &DriverPatch {
            headcount: Some(30),
            ..Default::default()
        },
        Some(3.0),
    )?;
    store.spread_row("Promo", "ox-mkt", 2_400_000_000, &SpreadCurve::SeasonalQ4)?;
    print_kpis("Promo", &store.get("Promo")?.accounts);

    println!("\nMonthly EBITDA (Promo):");
    for (idx, value) in monthly_ebitda(&store.get("Promo")?.accounts).iter().enumerate() {
        println!("  {} {:>16}", utils::month_label(idx), value);
    }

    println!(
        "\n🔍 Variance against Base (threshold {}%):",
        store.config().variance_threshold_pct
    );
    let issues = store.compare_to_base("Promo")?;
    for issue in &issues {
        let pct = issue
            .pct
            .map(|p| format!("{:+.1}%", p))
            .unwrap_or_else(|| "new".to_string());
        println!(
            "  {:<12} M{:02}  {:>14} -> {:>14}  {}",
            issue.row_name, issue.month, issue.base_value, issue.current_value, pct
        );
    }

    println!("\n📨 Submitting without justification...");
    let outcome = store.submit("Promo", "")?;
    println!("  status: {:?} ({} issue(s))", outcome.status, outcome.issues.len());

    if outcome.status == SubmissionStatus::NeedsJustification {
        let outcome = store.submit("Promo", "Q4 campaign approved by sales director")?;
        println!("  status: {:?} with justification", outcome.status);
    }

    println!("\n🔒 Locking Promo...");
    store.toggle_lock("Promo")?;
    match store.edit_cell("Promo", "ox-rent", 1, 0) {
        Err(e) => println!("  edit rejected: {}", e),
        Ok(()) => println!("  edit unexpectedly accepted"),
    }

    Ok(())
}
