//! Display-only projections of a filtered subset.
//!
//! Nothing here feeds back into aggregation: marker sizes are clamped for
//! visibility only and every projection is built from borrowed records.

use crate::{
    config::DashboardConfig,
    error::YoyResult,
    record::{ChangeCategory, SalesRecord, Status},
    summary::{Summary, VolumeComparison},
    types::{SalesMonth, Volume},
};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

const UTF8_BOM: &str = "\u{feff}";

// ── Number formatting ────────────────────────────────────────────────────────

/// `1234567` → `"1,234,567"`, `-1200` → `"-1,200"`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Absent volumes count as 0; fractions are truncated.
pub fn volume_units(volume: Volume) -> i64 {
    volume.unwrap_or(0.0).trunc() as i64
}

pub fn format_volume(volume: Volume) -> String {
    format_thousands(volume_units(volume))
}

/// A rate shown as a whole percent. An undefined rate (zero denominator)
/// shows as "0%" with `defined = false`, so callers can tell it apart from
/// a true zero change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percent {
    pub value:   i64,
    pub defined: bool,
}

impl Percent {
    /// Rounds half away from zero: 0.875 → 88%, -0.125 → -13%.
    pub fn from_rate(rate: Option<f64>) -> Self {
        match rate.filter(|r| r.is_finite()) {
            Some(r) => Self {
                value: (r * 100.0).round() as i64,
                defined: true,
            },
            None => Self {
                value: 0,
                defined: false,
            },
        }
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.value)
    }
}

/// Inverse of `Percent`'s display form: `"-13%"` → `-13`.
pub fn parse_percent(text: &str) -> Option<i64> {
    text.trim().strip_suffix('%')?.trim().parse().ok()
}

fn row_rate(current: Volume, prior: Volume) -> Option<f64> {
    let prior = prior.unwrap_or(0.0);
    (prior != 0.0).then(|| (current.unwrap_or(0.0) - prior) / prior)
}

fn row_delta(current: Volume, prior: Volume) -> i64 {
    (current.unwrap_or(0.0) - prior.unwrap_or(0.0)).trunc() as i64
}

// ── Color dimension ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorDimension {
    Status,
    ChangeCategory,
}

impl ColorDimension {
    pub fn column_name(&self) -> &'static str {
        match self {
            ColorDimension::Status => "status",
            ColorDimension::ChangeCategory => "change_category",
        }
    }
}

/// Change category colors the map only when the status filter is exactly
/// `{retained}`. Any other selection, including none, colors by status.
pub fn select_dimension(status_filter: &[Status]) -> ColorDimension {
    if !status_filter.is_empty() && status_filter.iter().all(|s| *s == Status::Retained) {
        ColorDimension::ChangeCategory
    } else {
        ColorDimension::Status
    }
}

/// Rows drawn for `dimension`. Under change-category coloring, no-data rows
/// are dropped; the summary is computed before this step.
pub fn visualized_subset(subset: &[SalesRecord], dimension: ColorDimension) -> Vec<SalesRecord> {
    match dimension {
        ColorDimension::Status => subset.to_vec(),
        ColorDimension::ChangeCategory => subset
            .iter()
            .filter(|r| r.change_category != ChangeCategory::NoData)
            .cloned()
            .collect(),
    }
}

/// Prior volume for churned rows, current volume otherwise, floored at
/// `min_size` so zero-volume points stay visible.
pub fn marker_size(record: &SalesRecord, min_size: f64) -> f64 {
    record.representative_volume().unwrap_or(0.0).max(min_size)
}

// ── Map layers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    Monthly,
    Cumulative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub customer_name:      String,
    pub normalized_address: String,
    pub latitude:           f64,
    pub longitude:          f64,
    pub marker_size:        f64,
    pub color_key:          String,
    pub color:              String,
    pub current_fmt:        String,
    pub prior_fmt:          String,
    pub delta_fmt:          String,
    pub percent_fmt:        String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MapLayer {
    Markers {
        kind:        MapKind,
        color_column: String,
        markers:     Vec<MapMarker>,
        /// Rows in the view that had no coordinates to place.
        unplaced:    usize,
    },
    NoData {
        kind:    MapKind,
        message: String,
    },
}

impl MapLayer {
    pub fn markers(&self) -> &[MapMarker] {
        match self {
            MapLayer::Markers { markers, .. } => markers,
            MapLayer::NoData { .. } => &[],
        }
    }

    pub fn is_empty_state(&self) -> bool {
        matches!(self, MapLayer::NoData { .. })
    }
}

pub fn build_map_layer(
    visualized: &[SalesRecord],
    dimension: ColorDimension,
    kind: MapKind,
    config: &DashboardConfig,
) -> MapLayer {
    let no_data = || MapLayer::NoData {
        kind,
        message: match kind {
            MapKind::Monthly => config.empty_message.clone(),
            MapKind::Cumulative => config.empty_cumulative_message.clone(),
        },
    };

    let mut markers = Vec::with_capacity(visualized.len());
    let mut unplaced = 0;
    for r in visualized {
        let (Some(latitude), Some(longitude)) = (r.latitude, r.longitude) else {
            unplaced += 1;
            continue;
        };
        let (color_key, color) = match dimension {
            ColorDimension::Status => (
                r.status.to_string(),
                config.colors.for_status(r.status).to_string(),
            ),
            ColorDimension::ChangeCategory => match config.colors.for_change(r.change_category) {
                Some(c) => (r.change_category.to_string(), c.to_string()),
                None => continue,
            },
        };
        let (current, prior) = match kind {
            MapKind::Monthly => (r.current_volume, r.prior_volume),
            MapKind::Cumulative => (r.current_cumulative, r.prior_cumulative),
        };
        markers.push(MapMarker {
            customer_name: r.customer_name.clone(),
            normalized_address: r.normalized_address.clone(),
            latitude,
            longitude,
            marker_size: marker_size(r, config.min_marker_size),
            color_key,
            color,
            current_fmt: format_volume(current),
            prior_fmt: format_volume(prior),
            delta_fmt: format_thousands(row_delta(current, prior)),
            percent_fmt: Percent::from_rate(row_rate(current, prior)).to_string(),
        });
    }

    if unplaced > 0 {
        log::warn!("{unplaced} rows without coordinates left off the {kind:?} map");
    }
    // Nothing placeable is the same empty state as nothing selected.
    if markers.is_empty() {
        return no_data();
    }

    MapLayer::Markers {
        kind,
        color_column: dimension.column_name().to_string(),
        markers,
        unplaced,
    }
}

// ── Display table & export ───────────────────────────────────────────────────

/// One row of the display table. Volumes are whole units and change rates
/// are percent strings, exactly as exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    pub customer_name:          String,
    pub contract_id:            String,
    pub facility_id:            String,
    pub product_name:           String,
    pub address:                String,
    pub normalized_address:     String,
    pub province:               String,
    pub district:               String,
    pub latitude:               Option<f64>,
    pub longitude:              Option<f64>,
    pub industry_category:      String,
    pub industry:               String,
    pub sales_month:            SalesMonth,
    pub current_volume:         i64,
    pub prior_volume:           i64,
    pub delta:                  i64,
    pub change_rate:            String,
    pub current_cumulative:     i64,
    pub prior_cumulative:       i64,
    pub cumulative_delta:       i64,
    pub cumulative_change_rate: String,
    pub status:                 Status,
    pub change_category:        ChangeCategory,
}

impl DisplayRow {
    pub fn from_record(r: &SalesRecord) -> Self {
        Self {
            customer_name: r.customer_name.clone(),
            contract_id: r.contract_id.clone(),
            facility_id: r.facility_id.clone(),
            product_name: r.product_name.clone(),
            address: r.address.clone(),
            normalized_address: r.normalized_address.clone(),
            province: r.province.clone(),
            district: r.district.clone(),
            latitude: r.latitude,
            longitude: r.longitude,
            industry_category: r.industry_category.clone(),
            industry: r.industry.clone(),
            sales_month: r.sales_month,
            current_volume: volume_units(r.current_volume),
            prior_volume: volume_units(r.prior_volume),
            delta: row_delta(r.current_volume, r.prior_volume),
            change_rate: Percent::from_rate(row_rate(r.current_volume, r.prior_volume))
                .to_string(),
            current_cumulative: volume_units(r.current_cumulative),
            prior_cumulative: volume_units(r.prior_cumulative),
            cumulative_delta: row_delta(r.current_cumulative, r.prior_cumulative),
            cumulative_change_rate: Percent::from_rate(row_rate(
                r.current_cumulative,
                r.prior_cumulative,
            ))
            .to_string(),
            status: r.status,
            change_category: r.change_category,
        }
    }
}

pub fn display_table(visualized: &[SalesRecord]) -> Vec<DisplayRow> {
    visualized.iter().map(DisplayRow::from_record).collect()
}

/// Comma-delimited UTF-8 with a leading BOM so spreadsheet tools pick the
/// right encoding for non-Latin text.
pub fn export_csv(rows: &[DisplayRow]) -> YoyResult<Vec<u8>> {
    let mut buf = UTF8_BOM.as_bytes().to_vec();
    {
        let mut wtr = WriterBuilder::new().has_headers(true).from_writer(&mut buf);
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
    }
    Ok(buf)
}

pub fn parse_export(bytes: &[u8]) -> YoyResult<Vec<DisplayRow>> {
    let bytes = bytes.strip_prefix(UTF8_BOM.as_bytes()).unwrap_or(bytes);
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let rows = rdr.deserialize().collect::<Result<Vec<DisplayRow>, _>>()?;
    Ok(rows)
}

// ── Summary metrics ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeMetric {
    /// e.g. `"1,250 m³"`
    pub value: String,
    /// e.g. `"70 m³ / 88%"`
    pub delta: String,
    pub percent: Percent,
}

impl VolumeMetric {
    pub fn new(cmp: &VolumeComparison, unit: &str) -> Self {
        let percent = Percent::from_rate(cmp.rate);
        Self {
            value: format!("{} {unit}", format_thousands(cmp.current)),
            delta: format!("{} {unit} / {percent}", format_thousands(cmp.delta)),
            percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDisplay {
    pub retained:   String,
    pub new:        String,
    pub churned:    String,
    pub monthly:    VolumeMetric,
    pub cumulative: VolumeMetric,
}

impl SummaryDisplay {
    pub fn new(summary: &Summary, config: &DashboardConfig) -> Self {
        let customers = |n: usize| format!("{} customers", format_thousands(n as i64));
        Self {
            retained: customers(summary.retained_count),
            new: customers(summary.new_count),
            churned: customers(summary.churned_count),
            monthly: VolumeMetric::new(&summary.monthly, &config.volume_unit),
            cumulative: VolumeMetric::new(&summary.cumulative, &config.volume_unit),
        }
    }
}
