//! Year-over-year customer sales comparison: classification, filtering,
//! aggregation and map-ready projections over a pre-joined dataset.

pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod presentation;
pub mod record;
pub mod store;
pub mod summary;
pub mod types;
pub mod view;
