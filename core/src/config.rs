use crate::record::{ChangeCategory, Status};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMap {
    pub retained: String,
    pub new: String,
    pub churned: String,
    pub normal: String,
    pub increase: String,
    pub decrease: String,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            retained: "green".into(),
            new: "blue".into(),
            churned: "red".into(),
            normal: "green".into(),
            increase: "blue".into(),
            decrease: "red".into(),
        }
    }
}

impl ColorMap {
    pub fn for_status(&self, status: Status) -> &str {
        match status {
            Status::Retained => &self.retained,
            Status::New => &self.new,
            Status::Churned => &self.churned,
        }
    }

    /// `None` for no-data, which is never drawn.
    pub fn for_change(&self, change: ChangeCategory) -> Option<&str> {
        match change {
            ChangeCategory::Normal => Some(&self.normal),
            ChangeCategory::Increase => Some(&self.increase),
            ChangeCategory::Decrease => Some(&self.decrease),
            ChangeCategory::NoData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub style: String,
    pub zoom: u32,
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style: "carto-positron".into(),
            zoom: 10,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Fractional change that moves a retained row out of "normal".
    pub change_threshold: f64,
    /// Smallest marker size drawn on the map.
    pub min_marker_size: f64,
    pub volume_unit: String,
    pub export_file_name: String,
    pub empty_message: String,
    pub empty_cumulative_message: String,
    pub colors: ColorMap,
    pub map: MapConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            change_threshold: 0.20,
            min_marker_size: 10.0,
            volume_unit: "m³".into(),
            export_file_name: "filtered_sales_data.csv".into(),
            empty_message: "No matching data for the selected filters.".into(),
            empty_cumulative_message: "No matching cumulative data for the selected filters."
                .into(),
            colors: ColorMap::default(),
            map: MapConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load `<data_dir>/dashboard.json`. Missing keys fall back to defaults;
    /// a missing file is an error so a typo in `--data-dir` is not silent.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/dashboard.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DashboardConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.change_threshold > 0.0 && self.change_threshold.is_finite()) {
            anyhow::bail!("change_threshold must be positive, got {}", self.change_threshold);
        }
        if self.min_marker_size < 0.0 {
            anyhow::bail!("min_marker_size must be non-negative, got {}", self.min_marker_size);
        }
        Ok(())
    }
}
