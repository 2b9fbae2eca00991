//! The sales record model and the retained / new / churned classifier.
//!
//! RULE: a volume "exists" when it is present, even if it is exactly 0.
//! Classification is the one place where absent volumes are NOT read as zero.

use crate::types::{CustomerName, SalesMonth, Volume};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Retained,
    New,
    Churned,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Retained, Status::New, Status::Churned];

    /// Truth table over volume presence. Both absent has no status.
    pub fn classify(current: Volume, prior: Volume) -> Option<Status> {
        match (current.is_some(), prior.is_some()) {
            (true, true) => Some(Status::Retained),
            (true, false) => Some(Status::New),
            (false, true) => Some(Status::Churned),
            (false, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Retained => "retained",
            Status::New => "new",
            Status::Churned => "churned",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "retained" | "유지" => Ok(Status::Retained),
            "new" | "신규" => Ok(Status::New),
            "churned" | "해지" => Ok(Status::Churned),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

// ── Change category ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    Normal,
    Increase,
    Decrease,
    NoData,
}

impl ChangeCategory {
    pub const ALL: [ChangeCategory; 4] = [
        ChangeCategory::Normal,
        ChangeCategory::Increase,
        ChangeCategory::Decrease,
        ChangeCategory::NoData,
    ];

    /// Defined only for retained rows with a positive prior volume.
    /// `threshold` is a fraction (0.20 = 20%) and both bounds are inclusive.
    pub fn classify(status: Status, current: Volume, prior: Volume, threshold: f64) -> Self {
        let (Status::Retained, Some(current), Some(prior)) = (status, current, prior) else {
            return ChangeCategory::NoData;
        };
        if prior <= 0.0 {
            return ChangeCategory::NoData;
        }

        let pct = (current - prior) / prior;
        if pct >= threshold {
            ChangeCategory::Increase
        } else if pct <= -threshold {
            ChangeCategory::Decrease
        } else {
            ChangeCategory::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCategory::Normal => "normal",
            ChangeCategory::Increase => "increase_20pct",
            ChangeCategory::Decrease => "decrease_20pct",
            ChangeCategory::NoData => "no_data",
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "normal" | "정상" => Ok(ChangeCategory::Normal),
            "increase_20pct" | "20% 이상 증가" => Ok(ChangeCategory::Increase),
            "decrease_20pct" | "20% 이상 감소" => Ok(ChangeCategory::Decrease),
            "no_data" | "데이터 없음" => Ok(ChangeCategory::NoData),
            other => Err(format!("unknown change category '{other}'")),
        }
    }
}

// ── Record ───────────────────────────────────────────────────────────────────

/// One customer + contract + facility + product + month, joined across years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub customer_name:      CustomerName,
    pub contract_id:        String,
    pub facility_id:        String,
    pub product_name:       String,

    pub address:            String,
    pub normalized_address: String,
    pub province:           String,
    pub district:           String,
    pub latitude:           Option<f64>,
    pub longitude:          Option<f64>,

    pub industry_category:  String,
    pub industry:           String,

    pub sales_month:        SalesMonth,

    pub current_volume:     Volume,
    pub prior_volume:       Volume,
    pub current_cumulative: Volume,
    pub prior_cumulative:   Volume,

    pub status:             Status,
    pub change_category:    ChangeCategory,
}

impl SalesRecord {
    /// Volume that represents this row on the map: prior volume for churned
    /// rows, current volume otherwise.
    pub fn representative_volume(&self) -> Volume {
        match self.status {
            Status::Churned => self.prior_volume,
            _ => self.current_volume,
        }
    }

    /// Re-derive status and change category from the volumes. Returns the
    /// labels that were replaced, or `None` when both monthly volumes are
    /// absent and no status exists.
    pub fn reclassify(&mut self, threshold: f64) -> Option<Vec<String>> {
        let status = Status::classify(self.current_volume, self.prior_volume)?;
        let change = ChangeCategory::classify(status, self.current_volume, self.prior_volume, threshold);

        let mut replaced = Vec::new();
        if self.status != status {
            replaced.push(format!("{} -> {status}", self.status));
            self.status = status;
        }
        if self.change_category != change {
            replaced.push(format!("{} -> {change}", self.change_category));
            self.change_category = change;
        }
        Some(replaced)
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}
