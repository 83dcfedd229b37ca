//! Agreement between estimated and true cell-type proportions.
//!
//! - **[`stats`]**: Pearson and Spearman correlation kernels
//! - **[`report`]**: per-cell-type and per-sample correlation tables for several
//!   deconvolution methods, their summaries, and long-format reshaping for reporting

pub mod report;
pub mod stats;

pub use report::{
    CorrelationRecord, CorrelationReport, CorrelationSummary, GROUND_TRUTH, PairedPrediction,
    PairedPredictions, SUMMARY_COLUMNS, correlation_table, flatten_per_cell,
    paired_predictions_long, summarize_correlation, summary_table,
};
pub use stats::{average_ranks, pearson, spearman};
