//! One full recomputation pass: filter → summarize → select dimension →
//! project for display. Pure; the caller's event handler runs it on every
//! filter change.

use crate::{
    config::{ColorMap, DashboardConfig, MapConfig},
    dataset::Dataset,
    filter::{filter, FilterCriteria, SelectorOptions},
    presentation::{
        build_map_layer, display_table, select_dimension, visualized_subset, ColorDimension,
        DisplayRow, MapKind, MapLayer, SummaryDisplay,
    },
    summary::{summarize, Summary},
};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    /// Criteria actually applied, after defaults and narrowing.
    pub criteria:        FilterCriteria,
    pub options:         SelectorOptions,
    pub summary:         Summary,
    pub summary_display: SummaryDisplay,
    pub dimension:       ColorDimension,
    pub map:             MapConfig,
    pub monthly_map:     MapLayer,
    pub cumulative_map:  MapLayer,
    pub rows:            Vec<DisplayRow>,
    pub colors:          ColorMap,
}

impl ViewModel {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn render_state(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    config: &DashboardConfig,
) -> ViewModel {
    let mut applied = criteria.clone();
    applied.fill_defaults(dataset);

    let options = SelectorOptions::build(dataset, &applied);
    options.drop_stale_children(&mut applied);

    let subset = filter(dataset.records(), &applied);
    let summary = summarize(&subset);

    // Statuses are never pruned, so this is the caller's own selection.
    let dimension = select_dimension(&criteria.statuses);
    let visualized = visualized_subset(&subset, dimension);
    debug!(
        "render pass: {} filtered, {} visualized, dimension={}",
        subset.len(),
        visualized.len(),
        dimension.column_name()
    );

    ViewModel {
        summary_display: SummaryDisplay::new(&summary, config),
        monthly_map: build_map_layer(&visualized, dimension, MapKind::Monthly, config),
        cumulative_map: build_map_layer(&visualized, dimension, MapKind::Cumulative, config),
        rows: display_table(&visualized),
        colors: config.colors.clone(),
        map: config.map.clone(),
        criteria: applied,
        options,
        summary,
        dimension,
    }
}
