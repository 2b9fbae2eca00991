//! CSV ingestion of the pre-joined year-over-year dataset.
//!
//! Headers may use the upstream pipeline's Korean names or English
//! snake_case names. Required columns are checked before any row is read;
//! a bad row fails the whole load with its row number.

use crate::{
    error::{YoyError, YoyResult},
    record::{ChangeCategory, SalesRecord, Status},
    types::{SalesMonth, Volume},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use serde::Deserialize;
use std::{fs, io::Read, path::Path};

/// (canonical name, upstream name) for every column a load cannot do without.
const REQUIRED_COLUMNS: &[(&str, &str)] = &[
    ("customer_name", "고객명"),
    ("product_name", "상품명"),
    ("sales_month", "매출년월"),
    ("current_volume", "당년당월판매량"),
    ("prior_volume", "전년동월판매량"),
    ("current_cumulative", "당년당월누계판매량"),
    ("prior_cumulative", "전년동월누계판매량"),
];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "customer_name", alias = "고객명")]
    customer_name: String,
    #[serde(rename = "contract_id", alias = "계약번호", default)]
    contract_id: String,
    #[serde(rename = "facility_id", alias = "시설물번호", default)]
    facility_id: String,
    #[serde(rename = "product_name", alias = "상품명")]
    product_name: String,

    #[serde(rename = "address", alias = "도로명주소", default)]
    address: String,
    #[serde(rename = "normalized_address", alias = "정제된 도로명주소", default)]
    normalized_address: String,
    #[serde(rename = "province", alias = "시도", default)]
    province: String,
    #[serde(rename = "district", alias = "시군구", default)]
    district: String,
    #[serde(rename = "latitude", alias = "위도", default)]
    latitude: Option<f64>,
    #[serde(rename = "longitude", alias = "경도", default)]
    longitude: Option<f64>,

    #[serde(rename = "industry_category", alias = "업종분류", default)]
    industry_category: String,
    #[serde(rename = "industry", alias = "업종", default)]
    industry: String,

    #[serde(rename = "sales_month", alias = "매출년월")]
    sales_month: String,

    #[serde(rename = "current_volume", alias = "당년당월판매량")]
    current_volume: Option<f64>,
    #[serde(rename = "prior_volume", alias = "전년동월판매량")]
    prior_volume: Option<f64>,
    #[serde(rename = "current_cumulative", alias = "당년당월누계판매량")]
    current_cumulative: Option<f64>,
    #[serde(rename = "prior_cumulative", alias = "전년동월누계판매량")]
    prior_cumulative: Option<f64>,

    #[serde(rename = "status", alias = "상태", default)]
    status: Option<String>,
    #[serde(rename = "change_category", alias = "증감범주", default)]
    change_category: Option<String>,
}

/// Read and classify every row of a CSV file.
pub fn load_csv(path: &Path, change_threshold: f64) -> YoyResult<Vec<SalesRecord>> {
    let bytes = fs::read(path)?;
    let records = read_csv(bytes.as_slice(), change_threshold)?;
    info!("Loaded {} sales records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_csv<R: Read>(mut reader: R, change_threshold: f64) -> YoyResult<Vec<SalesRecord>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    check_headers(&headers)?;

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        // Header is line 1; data rows start at 2.
        let row = idx + 2;
        let raw = result.map_err(|e| YoyError::Schema {
            row,
            detail: e.to_string(),
        })?;
        records.push(classify_row(raw, row, change_threshold)?);
    }
    Ok(records)
}

fn check_headers(headers: &StringRecord) -> YoyResult<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|(name, upstream)| !headers.iter().any(|h| h == *name || h == *upstream))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(YoyError::Schema {
            row: 1,
            detail: format!("missing required columns: {}", missing.join(", ")),
        })
    }
}

fn classify_row(raw: RawRow, row: usize, change_threshold: f64) -> YoyResult<SalesRecord> {
    let sales_month = raw.sales_month.parse::<SalesMonth>().map_err(|e| YoyError::Schema {
        row,
        detail: e.to_string(),
    })?;

    let current_volume = checked_volume(raw.current_volume, "current_volume", row)?;
    let prior_volume = checked_volume(raw.prior_volume, "prior_volume", row)?;
    let current_cumulative = checked_volume(raw.current_cumulative, "current_cumulative", row)?;
    let prior_cumulative = checked_volume(raw.prior_cumulative, "prior_cumulative", row)?;

    let status = Status::classify(current_volume, prior_volume).ok_or_else(|| YoyError::Schema {
        row,
        detail: "both current and prior monthly volumes are empty".into(),
    })?;
    let change_category =
        ChangeCategory::classify(status, current_volume, prior_volume, change_threshold);

    cross_check(row, raw.status.as_deref(), status);
    cross_check(row, raw.change_category.as_deref(), change_category);

    Ok(SalesRecord {
        customer_name: raw.customer_name,
        contract_id: raw.contract_id,
        facility_id: raw.facility_id,
        product_name: raw.product_name,
        address: raw.address,
        normalized_address: raw.normalized_address,
        province: raw.province,
        district: raw.district,
        latitude: raw.latitude,
        longitude: raw.longitude,
        industry_category: raw.industry_category,
        industry: raw.industry,
        sales_month,
        current_volume,
        prior_volume,
        current_cumulative,
        prior_cumulative,
        status,
        change_category,
    })
}

fn checked_volume(value: Option<f64>, column: &str, row: usize) -> YoyResult<Volume> {
    match value {
        Some(v) if v.is_nan() => Ok(None),
        Some(v) if v < 0.0 || v.is_infinite() => Err(YoyError::InvalidVolume {
            column: column.to_string(),
            row,
            value: v,
        }),
        other => Ok(other),
    }
}

/// Upstream labels are advisory; the derived value always wins.
fn cross_check<T>(row: usize, upstream: Option<&str>, derived: T)
where
    T: std::str::FromStr + PartialEq + std::fmt::Display,
{
    let Some(label) = upstream.filter(|l| !l.is_empty()) else {
        return;
    };
    match label.parse::<T>() {
        Ok(parsed) if parsed == derived => {}
        Ok(parsed) => warn!("Row {row}: upstream label '{parsed}' disagrees with derived '{derived}'"),
        Err(_) => warn!("Row {row}: unrecognised upstream label '{label}'"),
    }
}
