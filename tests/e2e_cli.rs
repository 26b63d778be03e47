
use cli_helpers::{fixture, seed_universe_cache, Sandbox};
use predicates::prelude::*;

#[test]
fn lots_with_all_flags_prints_totals_and_projection() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["lots", "-i", &fixture("lots.txt"), "-s", "ko", "-d", "2025-12-31"])
        .args(["-b", "QQQ", "--no-sp500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Breakeven prices for KO as of 2025-01-31"))
        .stdout(predicate::str::contains("TOTAL"))
        .stdout(predicate::str::contains("=== Projected Future Values ==="))
        .stdout(predicate::str::contains("FUTURE (2025-12-31)"))
        .stdout(predicate::str::contains("Benchmarks used: SPY, QQQ"))
        .stdout(predicate::str::contains("Breakeven report saved to"))
        .stdout(predicate::str::contains("\u{001b}[").not());

    let reports = sandbox.outputs("breakeven_output_");
    assert_eq!(reports.len(), 1, "one timestamped report expected");
    let csv = std::fs::read_to_string(&reports[0]).unwrap();
    assert!(csv.starts_with("Symbol,Purchase Date,QTY,Cost-Basis,Days-Held"));
    assert!(csv.contains("KO,2024-01-02,10,\"$1,000.00\",395,"));
    assert!(csv.contains("KO,TOTAL,15.5,"));
    assert!(csv.contains("Benchmarks used: SPY, QQQ"));
}

#[test]
fn lots_answers_prompts_from_stdin() {
    let sandbox = Sandbox::new();
    let answers = format!("{}\nko\n\n\nn\n", fixture("lots.txt"));

    sandbox
        .cmd()
        .arg("lots")
        .write_stdin(answers)
        .assert()
        .success()
        .stdout(predicate::str::contains("Enter the name of the input file (e.g., input.txt): "))
        .stdout(predicate::str::contains("Enter the stock/ETF symbol to analyze: "))
        .stdout(predicate::str::contains("SPY will always be included"))
        .stdout(predicate::str::contains("FUTURE (2025-12-31)"))
        .stdout(predicate::str::contains("Would you like to compare your investments against all S&P 500 stocks? (y/n): "));

    assert_eq!(sandbox.outputs("sp500_comparison_").len(), 0);
}

#[test]
fn lots_missing_file_prints_error_and_exits_zero() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["lots", "-i", "missing.txt", "-s", "KO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✗ Error: file 'missing.txt' not found"));

    assert!(sandbox.outputs("breakeven_output_").is_empty());
}

#[test]
fn lots_malformed_disposal_date_is_reported() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["lots", "-i", &fixture("lots.txt"), "-s", "KO", "-d", "12/31/2025"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "✗ Error: invalid date '12/31/2025', expected YYYY-MM-DD",
        ));
}

#[test]
fn lots_sp500_run_uses_cached_list() {
    let sandbox = Sandbox::new();
    seed_universe_cache(&sandbox, &["MMM", "AOS"]);

    sandbox
        .cmd()
        .args(["lots", "-i", &fixture("lots.txt"), "-s", "KO", "-d", "2025-06-30", "-b", "SPY", "--sp500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Comparing 2 lots against 2 S&P 500 symbols"))
        .stdout(predicate::str::contains("S&P 500 comparison saved to"))
        .stdout(predicate::str::contains("2 comparisons failed after retry"));

    let failed = sandbox.outputs("sp500_failed_final_");
    assert_eq!(failed.len(), 1);
    let csv = std::fs::read_to_string(&failed[0]).unwrap();
    assert!(csv.contains("MMM,ALL,no data returned for symbol"));
    assert!(csv.contains("AOS,ALL,no data returned for symbol"));
}

#[test]
fn lots_sp500_without_cache_is_skipped() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["lots", "-i", &fixture("lots.txt"), "-s", "KO", "-d", "2025-06-30", "-b", "SPY", "--sp500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("S&P 500 comparison skipped"));
}

#[test]
fn confirm_appends_trade_and_prints_breakeven() {
    let sandbox = Sandbox::new();

    for _ in 0..2 {
        sandbox
            .cmd_at("2025-05-31")
            .args(["confirm", "-i", &fixture("confirmation.txt")])
            .assert()
            .success()
            .stdout(predicate::str::contains("Interest at 5.00% since 05/01/2025:"))
            .stdout(predicate::str::contains("$7.01"))
            .stdout(predicate::str::contains("$171.20"));
    }

    let csv = std::fs::read_to_string(sandbox.workdir.path().join("trades.csv")).unwrap();
    assert_eq!(
        csv,
        "Trade date,Symbol,Action,Quantity,Price,Total,Commission\n\
         05/01/2025,AAPL,Buy,10,170.5,-1705,0.00\n\
         05/01/2025,AAPL,Buy,10,170.5,-1705,0.00\n"
    );
}

#[test]
fn confirm_pasted_text_ends_at_blank_line() {
    let sandbox = Sandbox::new();
    let pasted = std::fs::read_to_string(fixture("confirmation.txt"))
        .unwrap()
        .replace("\n\n", "\n");

    sandbox
        .cmd_at("2025-05-31")
        .args(["confirm", "--paste"])
        .write_stdin(format!("{}\n", pasted))
        .assert()
        .success()
        .stdout(predicate::str::contains("Paste the trade details and press Enter twice:"))
        .stdout(predicate::str::contains("$171.20"));
}

#[test]
fn compare_offline_writes_report_and_lists_failures() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["compare", &fixture("investments.csv")])
        .assert()
        .success()
        .stdout(predicate::str::contains("No investments could be valued."))
        .stdout(predicate::str::contains("2 lookups failed"))
        .stdout(predicate::str::contains("Portfolio performance saved to"));

    let csv =
        std::fs::read_to_string(sandbox.workdir.path().join("portfolio_performance.csv")).unwrap();
    assert!(csv.starts_with("Symbol,Investment Date,Start Price,Shares Bought"));
    assert!(csv.contains("Yearly Growth Breakdown"));
}

#[test]
fn growth_without_cached_list_warns() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["growth", "--start", "2024-02-29", "--end", "2025-01-02", "--amount", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("S&P 500 list unavailable"));
}

#[test]
fn growth_rejects_inverted_range() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["growth", "--start", "2025-01-02", "--end", "2024-01-02", "--amount", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "✗ Error: validation error: start date 2025-01-02 must be before end date 2024-01-02",
        ));
}

#[test]
fn universe_show_reports_cache_state() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["universe", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached S&P 500 list"));

    seed_universe_cache(&sandbox, &["MMM", "AOS", "ABT"]);
    sandbox
        .cmd()
        .args(["universe", "show", "--limit", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 constituents fetched 2025-01-30 12:00 UTC"))
        .stdout(predicate::str::contains("AOS"))
        .stdout(predicate::str::contains("ABT").not());
}

#[test]
fn universe_refresh_needs_network() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["universe", "refresh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network access is disabled"));
}
