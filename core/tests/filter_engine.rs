use yoy_core::{
    dataset::Dataset,
    filter::{filter, FilterCriteria, SelectorOptions},
    record::{ChangeCategory, SalesRecord, Status},
    types::SalesMonth,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn month(y: i32, m: u32) -> SalesMonth {
    SalesMonth::new(y, m).unwrap()
}

fn record(
    customer: &str,
    product: &str,
    sales_month: SalesMonth,
    (province, district): (&str, &str),
    (category, industry): (&str, &str),
    current: Option<f64>,
    prior: Option<f64>,
) -> SalesRecord {
    let status = Status::classify(current, prior).unwrap();
    SalesRecord {
        customer_name: customer.into(),
        contract_id: format!("{customer}-contract"),
        facility_id: format!("{customer}-facility"),
        product_name: product.into(),
        address: String::new(),
        normalized_address: String::new(),
        province: province.into(),
        district: district.into(),
        latitude: Some(35.87),
        longitude: Some(128.6),
        industry_category: category.into(),
        industry: industry.into(),
        sales_month,
        current_volume: current,
        prior_volume: prior,
        current_cumulative: current,
        prior_cumulative: prior,
        status,
        change_category: ChangeCategory::classify(status, current, prior, 0.20),
    }
}

fn dataset() -> Dataset {
    let mar = month(2024, 3);
    let apr = month(2024, 4);
    Dataset::new(vec![
        record("A", "residential", mar, ("Daegu", "Jung-gu"), ("Food", "Korean"), Some(100.0), Some(80.0)),
        record("B", "residential", mar, ("Daegu", "Suseong-gu"), ("Food", "Snack"), Some(50.0), None),
        record("C", "residential", mar, ("Gyeongbuk", "Gyeongsan"), ("Factory", "Metal"), None, Some(30.0)),
        record("D", "commercial", mar, ("Daegu", "Jung-gu"), ("Factory", "Textile"), Some(10.0), Some(10.0)),
        record("A", "residential", apr, ("Daegu", "Jung-gu"), ("Food", "Korean"), Some(90.0), Some(95.0)),
    ])
}

fn names(records: &[SalesRecord]) -> Vec<&str> {
    records.iter().map(|r| r.customer_name.as_str()).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn product_and_month_are_exact_matches() {
    let ds = dataset();
    let criteria = FilterCriteria {
        product: Some("residential".into()),
        month: Some(month(2024, 3)),
        ..Default::default()
    };
    assert_eq!(names(&filter(ds.records(), &criteria)), ["A", "B", "C"]);
}

#[test]
fn unset_criteria_match_everything() {
    let ds = dataset();
    assert_eq!(filter(ds.records(), &FilterCriteria::default()).len(), ds.len());
}

#[test]
fn constraints_combine_with_and() {
    let ds = dataset();
    let criteria = FilterCriteria {
        product: Some("residential".into()),
        month: Some(month(2024, 3)),
        provinces: vec!["Daegu".into()],
        industry_categories: vec!["Food".into()],
        statuses: vec![Status::New, Status::Churned],
        ..Default::default()
    };
    assert_eq!(names(&filter(ds.records(), &criteria)), ["B"]);
}

#[test]
fn change_category_filter() {
    let ds = dataset();
    let criteria = FilterCriteria {
        change_categories: vec![ChangeCategory::Increase],
        ..Default::default()
    };
    assert_eq!(names(&filter(ds.records(), &criteria)), ["A"]);
}

#[test]
fn empty_result_is_not_an_error() {
    let ds = dataset();
    let criteria = FilterCriteria {
        product: Some("commercial".into()),
        statuses: vec![Status::Churned],
        ..Default::default()
    };
    assert!(filter(ds.records(), &criteria).is_empty());
}

#[test]
fn filtering_leaves_dataset_untouched() {
    let ds = dataset();
    let before = ds.records().to_vec();
    let mut subset = filter(ds.records(), &FilterCriteria::default());
    subset[0].current_volume = Some(1.0e9);
    assert_eq!(ds.records(), before.as_slice());
}

#[test]
fn defaults_pick_first_product_and_month() {
    let ds = dataset();
    let criteria = FilterCriteria::defaults_for(&ds);
    assert_eq!(criteria.product.as_deref(), Some("commercial"));
    assert_eq!(criteria.month, Some(month(2024, 3)));
}

/// A product or month the dataset lacks is a real constraint, not a cue to
/// fall back to the first value.
#[test]
fn unknown_product_is_kept_and_matches_nothing() {
    let ds = dataset();
    let mut criteria = FilterCriteria {
        product: Some("industrial".into()),
        month: Some(month(2019, 1)),
        ..Default::default()
    };
    criteria.fill_defaults(&ds);
    assert_eq!(criteria.product.as_deref(), Some("industrial"));
    assert_eq!(criteria.month, Some(month(2019, 1)));
    assert!(filter(ds.records(), &criteria).is_empty());
}

#[test]
fn defaults_on_empty_dataset_stay_unset() {
    let criteria = FilterCriteria::defaults_for(&Dataset::default());
    assert_eq!(criteria.product, None);
    assert_eq!(criteria.month, None);
}

#[test]
fn district_options_narrow_by_province() {
    let ds = dataset();
    let all = SelectorOptions::build(&ds, &FilterCriteria::default());
    assert_eq!(all.districts, ["Gyeongsan", "Jung-gu", "Suseong-gu"]);

    let daegu = SelectorOptions::build(
        &ds,
        &FilterCriteria {
            provinces: vec!["Daegu".into()],
            ..Default::default()
        },
    );
    assert_eq!(daegu.districts, ["Jung-gu", "Suseong-gu"]);
    assert_eq!(daegu.provinces, ["Daegu", "Gyeongbuk"]);
}

#[test]
fn industry_options_narrow_by_category() {
    let ds = dataset();
    let factory = SelectorOptions::build(
        &ds,
        &FilterCriteria {
            industry_categories: vec!["Factory".into()],
            ..Default::default()
        },
    );
    assert_eq!(factory.industries, ["Metal", "Textile"]);

    let all = SelectorOptions::build(&ds, &FilterCriteria::default());
    assert_eq!(all.industries, ["Korean", "Metal", "Snack", "Textile"]);
    assert_eq!(all.statuses, [Status::Retained, Status::New, Status::Churned]);
}

#[test]
fn stale_child_selections_are_dropped() {
    let ds = dataset();
    let mut criteria = FilterCriteria {
        provinces: vec!["Gyeongbuk".into()],
        districts: vec!["Jung-gu".into(), "Gyeongsan".into()],
        industry_categories: vec!["Factory".into()],
        industries: vec!["Korean".into(), "Metal".into()],
        ..Default::default()
    };
    let options = SelectorOptions::build(&ds, &criteria);
    options.drop_stale_children(&mut criteria);
    assert_eq!(criteria.districts, ["Gyeongsan"]);
    assert_eq!(criteria.industries, ["Metal"]);
}

#[test]
fn root_selections_are_never_pruned() {
    let ds = dataset();
    let mut criteria = FilterCriteria {
        provinces: vec!["Busan".into()],
        industry_categories: vec!["Mining".into()],
        statuses: vec![Status::Retained, Status::New],
        change_categories: vec![ChangeCategory::Decrease],
        ..Default::default()
    };
    let before = criteria.clone();
    let options = SelectorOptions::build(&ds, &criteria);
    options.drop_stale_children(&mut criteria);
    assert_eq!(criteria, before);
    assert!(filter(ds.records(), &criteria).is_empty());
}

/// Without a parent selection, child values are left alone even when unknown.
#[test]
fn child_selections_without_parent_are_kept() {
    let ds = dataset();
    let mut criteria = FilterCriteria {
        districts: vec!["Haeundae".into()],
        ..Default::default()
    };
    let options = SelectorOptions::build(&ds, &criteria);
    options.drop_stale_children(&mut criteria);
    assert_eq!(criteria.districts, ["Haeundae"]);
    assert!(filter(ds.records(), &criteria).is_empty());
}
