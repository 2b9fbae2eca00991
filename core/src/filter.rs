//! Filter engine: independent equality and membership predicates, ANDed.
//!
//! An empty set means "no constraint". An empty result is a valid state,
//! never an error.

use crate::{
    dataset::{distinct, Dataset},
    record::{ChangeCategory, SalesRecord, Status},
    types::SalesMonth,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub product:             Option<String>,
    pub month:               Option<SalesMonth>,
    pub provinces:           Vec<String>,
    pub districts:           Vec<String>,
    pub industry_categories: Vec<String>,
    pub industries:          Vec<String>,
    pub statuses:            Vec<Status>,
    pub change_categories:   Vec<ChangeCategory>,
}

impl FilterCriteria {
    /// First product and first month, nothing else set.
    pub fn defaults_for(dataset: &Dataset) -> Self {
        let mut criteria = Self::default();
        criteria.fill_defaults(dataset);
        criteria
    }

    /// Fill an unset product / month with the first available value. A value
    /// the dataset does not contain is kept and simply matches nothing.
    pub fn fill_defaults(&mut self, dataset: &Dataset) {
        if self.product.is_none() {
            self.product = dataset.products().into_iter().next();
        }
        if self.month.is_none() {
            self.month = dataset.months().into_iter().next();
        }
    }

    /// `None` product or month matches every row. Product and month are
    /// required selections, so callers run `fill_defaults` first.
    pub fn matches(&self, r: &SalesRecord) -> bool {
        self.product.as_ref().is_none_or(|p| &r.product_name == p)
            && self.month.is_none_or(|m| r.sales_month == m)
            && member(&self.provinces, &r.province)
            && member(&self.districts, &r.district)
            && member(&self.industry_categories, &r.industry_category)
            && member(&self.industries, &r.industry)
            && member(&self.statuses, &r.status)
            && member(&self.change_categories, &r.change_category)
    }
}

fn member<T: PartialEq>(selected: &[T], value: &T) -> bool {
    selected.is_empty() || selected.contains(value)
}

/// The filtered view: cloned rows, the dataset itself is untouched.
/// Criteria are applied as given; see `FilterCriteria::fill_defaults` for the
/// required product / month.
pub fn filter(records: &[SalesRecord], criteria: &FilterCriteria) -> Vec<SalesRecord> {
    records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}

// ── Selector options ─────────────────────────────────────────────────────────

/// Candidate values for each selector, sorted. District and industry lists
/// are narrowed by the selected provinces / industry categories and fall
/// back to every value when the parent selection is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorOptions {
    pub products:            Vec<String>,
    pub months:              Vec<SalesMonth>,
    pub provinces:           Vec<String>,
    pub districts:           Vec<String>,
    pub industry_categories: Vec<String>,
    pub industries:          Vec<String>,
    pub statuses:            Vec<Status>,
    pub change_categories:   Vec<ChangeCategory>,
}

impl SelectorOptions {
    pub fn build(dataset: &Dataset, criteria: &FilterCriteria) -> Self {
        let records = dataset.records();

        let districts = distinct(
            records
                .iter()
                .filter(|r| member(&criteria.provinces, &r.province))
                .map(|r| r.district.as_str()),
        );
        let industries = distinct(
            records
                .iter()
                .filter(|r| member(&criteria.industry_categories, &r.industry_category))
                .map(|r| r.industry.as_str()),
        );

        Self {
            products: dataset.products(),
            months: dataset.months(),
            provinces: distinct(records.iter().map(|r| r.province.as_str())),
            districts,
            industry_categories: distinct(records.iter().map(|r| r.industry_category.as_str())),
            industries,
            statuses: records
                .iter()
                .map(|r| r.status)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            change_categories: records
                .iter()
                .map(|r| r.change_category)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }

    /// Drop district / industry selections made stale by their parent, e.g. a
    /// district outside the selected provinces. Only applies while a parent is
    /// selected; root selections are never touched, so a value no record has
    /// still filters down to an empty result.
    pub fn drop_stale_children(&self, criteria: &mut FilterCriteria) {
        if !criteria.provinces.is_empty() {
            criteria.districts.retain(|v| self.districts.contains(v));
        }
        if !criteria.industry_categories.is_empty() {
            criteria.industries.retain(|v| self.industries.contains(v));
        }
    }
}
