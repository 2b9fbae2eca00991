//! Customer counts per status and year-over-year volume totals.

use crate::record::{SalesRecord, Status};
use crate::types::Volume;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current vs prior totals, truncated to whole volume units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeComparison {
    pub current: i64,
    pub prior:   i64,
    pub delta:   i64,
    /// `delta / prior`; `None` when prior is 0 (displayed as "0%").
    pub rate:    Option<f64>,
}

impl VolumeComparison {
    pub fn from_totals(current: f64, prior: f64) -> Self {
        let current = current.trunc() as i64;
        let prior = prior.trunc() as i64;
        let delta = current - prior;
        let rate = (prior != 0).then(|| delta as f64 / prior as f64);
        Self { current, prior, delta, rate }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub retained_count: usize,
    pub new_count:      usize,
    pub churned_count:  usize,
    pub monthly:        VolumeComparison,
    pub cumulative:     VolumeComparison,
}

impl Summary {
    pub fn count_for(&self, status: Status) -> usize {
        match status {
            Status::Retained => self.retained_count,
            Status::New => self.new_count,
            Status::Churned => self.churned_count,
        }
    }
}

pub fn summarize(subset: &[SalesRecord]) -> Summary {
    let distinct_customers = |status: Status| {
        subset
            .iter()
            .filter(|r| r.status == status)
            .map(|r| r.customer_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    };

    Summary {
        retained_count: distinct_customers(Status::Retained),
        new_count: distinct_customers(Status::New),
        churned_count: distinct_customers(Status::Churned),
        monthly: VolumeComparison::from_totals(
            total(subset, |r| r.current_volume),
            total(subset, |r| r.prior_volume),
        ),
        cumulative: VolumeComparison::from_totals(
            total(subset, |r| r.current_cumulative),
            total(subset, |r| r.prior_cumulative),
        ),
    }
}

/// Absent volumes add nothing.
fn total(subset: &[SalesRecord], field: impl Fn(&SalesRecord) -> Volume) -> f64 {
    subset.iter().filter_map(field).sum()
}
