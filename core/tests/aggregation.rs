use yoy_core::{
    config::DashboardConfig,
    presentation::{Percent, SummaryDisplay},
    record::{ChangeCategory, SalesRecord, Status},
    summary::{summarize, VolumeComparison},
    types::SalesMonth,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn record(customer: &str, current: Option<f64>, prior: Option<f64>) -> SalesRecord {
    with_cumulative(customer, current, prior, current, prior)
}

fn with_cumulative(
    customer: &str,
    current: Option<f64>,
    prior: Option<f64>,
    current_cumulative: Option<f64>,
    prior_cumulative: Option<f64>,
) -> SalesRecord {
    let status = Status::classify(current, prior).unwrap();
    SalesRecord {
        customer_name: customer.into(),
        contract_id: "1".into(),
        facility_id: "1".into(),
        product_name: "residential".into(),
        address: String::new(),
        normalized_address: String::new(),
        province: String::new(),
        district: String::new(),
        latitude: None,
        longitude: None,
        industry_category: String::new(),
        industry: String::new(),
        sales_month: SalesMonth::new(2024, 3).unwrap(),
        current_volume: current,
        prior_volume: prior,
        current_cumulative,
        prior_cumulative,
        status,
        change_category: ChangeCategory::classify(status, current, prior, 0.20),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn retained_and_new_example() {
    let subset = vec![
        record("A", Some(100.0), Some(80.0)),
        record("B", Some(50.0), None),
    ];
    let s = summarize(&subset);

    assert_eq!(s.monthly.current, 150);
    assert_eq!(s.monthly.prior, 80);
    assert_eq!(s.monthly.delta, 70);
    assert_eq!(Percent::from_rate(s.monthly.rate).to_string(), "88%");
    assert_eq!((s.retained_count, s.new_count, s.churned_count), (1, 1, 0));
}

#[test]
fn zero_prior_total_falls_back_to_zero_percent() {
    let subset = vec![record("B", Some(40.0), None)];
    let s = summarize(&subset);

    assert_eq!(s.monthly.prior, 0);
    assert_eq!(s.monthly.delta, 40);
    assert_eq!(s.monthly.rate, None);

    let pct = Percent::from_rate(s.monthly.rate);
    assert_eq!(pct.to_string(), "0%");
    assert!(!pct.defined, "fallback must be distinguishable from a true 0%");
}

#[test]
fn customer_counts_are_distinct_names() {
    let subset = vec![
        record("A", Some(10.0), Some(10.0)),
        record("A", Some(20.0), Some(15.0)),
        record("B", Some(5.0), Some(0.0)),
        record("C", None, Some(7.0)),
        record("C", None, Some(3.0)),
    ];
    let s = summarize(&subset);
    assert_eq!(s.retained_count, 2);
    assert_eq!(s.churned_count, 1);
    assert_eq!(s.count_for(Status::New), 0);
}

#[test]
fn absent_volumes_sum_as_zero() {
    let subset = vec![
        record("A", Some(10.0), None),
        record("B", None, Some(4.0)),
    ];
    let s = summarize(&subset);
    assert_eq!(s.monthly, VolumeComparison { current: 10, prior: 4, delta: 6, rate: Some(1.5) });
}

#[test]
fn totals_truncate_before_delta() {
    let subset = vec![
        record("A", Some(10.6), Some(5.9)),
        record("B", Some(0.3), Some(0.0)),
    ];
    let s = summarize(&subset);
    // 10.9 → 10, 5.9 → 5
    assert_eq!((s.monthly.current, s.monthly.prior, s.monthly.delta), (10, 5, 5));
}

#[test]
fn cumulative_figures_use_cumulative_fields() {
    let subset = vec![
        with_cumulative("A", Some(10.0), Some(10.0), Some(1_200.0), Some(1_000.0)),
        with_cumulative("B", None, Some(10.0), None, Some(250.0)),
    ];
    let s = summarize(&subset);
    assert_eq!(s.cumulative.current, 1_200);
    assert_eq!(s.cumulative.prior, 1_250);
    assert_eq!(s.cumulative.delta, -50);
    assert_eq!(Percent::from_rate(s.cumulative.rate).to_string(), "-4%");
}

#[test]
fn empty_subset_summarizes_to_zero() {
    let s = summarize(&[]);
    assert_eq!((s.retained_count, s.new_count, s.churned_count), (0, 0, 0));
    assert_eq!(s.monthly, VolumeComparison::default());
    assert_eq!(s.cumulative.rate, None);
}

#[test]
fn summary_metrics_are_formatted_with_unit() {
    let subset = vec![
        record("A", Some(12_500.0), Some(10_000.0)),
        record("B", Some(1_000.0), None),
    ];
    let display = SummaryDisplay::new(&summarize(&subset), &DashboardConfig::default());
    assert_eq!(display.retained, "1 customers");
    assert_eq!(display.monthly.value, "13,500 m³");
    assert_eq!(display.monthly.delta, "3,500 m³ / 35%");
}
