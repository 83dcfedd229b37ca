//! Correlation reports comparing deconvolution methods against ground truth.
//!
//! Proportion tables have samples as rows and cell types as columns. Method estimates are
//! matched to the ground truth by sample label and cell-type label, never by position.

use super::stats::{pearson, spearman};
use crate::error::DeconError;
use crate::table::{CorrelationTable, LabeledMatrix, ProportionTable};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::{HashMap, HashSet};

/// Column label used for true fractions in long-format output.
pub const GROUND_TRUTH: &str = "Ground truth";

/// Column names of [`summary_table`].
pub const SUMMARY_COLUMNS: [&str; 4] = [
    "Mean_corr_per_sample",
    "Std_corr_per_sample",
    "Mean_corr_per_cell",
    "Std_corr_per_cell",
];

const CELL_TYPE_INDEX: &str = "Cell_type";

/// Absolute Pearson and Spearman correlations of every method against the ground truth.
///
/// Per-cell tables have the requested cell types as rows; per-sample tables have the ground
/// truth's samples as rows. Methods are the columns in every table.
#[derive(Debug, Clone)]
pub struct CorrelationReport {
    pub pearson_per_cell: CorrelationTable,
    pub pearson_per_sample: CorrelationTable,
    pub spearman_per_cell: CorrelationTable,
    pub spearman_per_sample: CorrelationTable,
}

/// Mean and standard deviation of one method's correlations.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationSummary {
    pub method: String,
    pub mean_corr_per_sample: f64,
    pub std_corr_per_sample: f64,
    pub mean_corr_per_cell: f64,
    pub std_corr_per_cell: f64,
}

/// One (method, cell type) correlation in long format.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRecord {
    pub method: String,
    pub category: String,
    pub correlation: f64,
}

/// Estimated and true fraction of one cell type in one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedPrediction {
    pub sample: String,
    pub category: String,
    pub estimate: f64,
    pub truth: f64,
}

/// Long-format pairing of a method's estimates with the ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedPredictions {
    pub method: String,
    pub rows: Vec<PairedPrediction>,
}

impl PairedPredictions {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn estimates(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.estimate).collect()
    }

    pub fn truths(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.truth).collect()
    }
}

/// Column positions of the requested cell types in a proportion table.
fn category_columns(table: &ProportionTable, categories: &[String]) -> anyhow::Result<Vec<usize>> {
    categories
        .iter()
        .map(|c| {
            table
                .column_index(c)
                .ok_or_else(|| anyhow::Error::from(DeconError::MissingColumn(c.clone())))
        })
        .collect()
}

/// Row positions in `estimates` of every ground-truth sample.
///
/// A sample listed more than once in `estimates` resolves to its first row.
fn sample_rows(
    method: &str,
    estimates: &ProportionTable,
    ground_truth: &ProportionTable,
) -> anyhow::Result<Vec<usize>> {
    let mut seen = HashSet::new();
    let duplicated = estimates
        .row_labels()
        .iter()
        .filter(|label| !seen.insert(label.as_str()))
        .count();
    if duplicated > 0 {
        log::warn!(
            "method '{}' repeats {} sample labels; the first row of each is used",
            method,
            duplicated
        );
    }

    ground_truth
        .row_labels()
        .iter()
        .map(|sample| {
            estimates.row_index(sample).ok_or_else(|| {
                anyhow::Error::from(DeconError::InvalidArgument(format!(
                    "method '{}' has no estimate for sample '{}'",
                    method, sample
                )))
            })
        })
        .collect()
}

/// Estimates rearranged to the ground truth's samples × the requested cell types.
fn aligned_estimates(
    method: &str,
    estimates: &ProportionTable,
    ground_truth: &ProportionTable,
    categories: &[String],
) -> anyhow::Result<Array2<f64>> {
    let rows = sample_rows(method, estimates, ground_truth)?;
    let cols = category_columns(estimates, categories)?;
    let values = estimates.values();
    Ok(Array2::from_shape_fn((rows.len(), cols.len()), |(s, c)| {
        values[[rows[s], cols[c]]]
    }))
}

struct MethodCorrelations {
    pearson_per_cell: Vec<f64>,
    spearman_per_cell: Vec<f64>,
    pearson_per_sample: Vec<f64>,
    spearman_per_sample: Vec<f64>,
}

fn correlate_lanes(
    estimate: ArrayView1<'_, f64>,
    truth: ArrayView1<'_, f64>,
) -> anyhow::Result<(f64, f64)> {
    let x = estimate.to_vec();
    let y = truth.to_vec();
    Ok((pearson(&x, &y)?.abs(), spearman(&x, &y)?.abs()))
}

fn method_correlations(
    estimates: &Array2<f64>,
    truth: &Array2<f64>,
) -> anyhow::Result<MethodCorrelations> {
    let mut result = MethodCorrelations {
        pearson_per_cell: Vec::with_capacity(truth.ncols()),
        spearman_per_cell: Vec::with_capacity(truth.ncols()),
        pearson_per_sample: Vec::with_capacity(truth.nrows()),
        spearman_per_sample: Vec::with_capacity(truth.nrows()),
    };

    // across samples, one value per cell type
    for (est, tru) in estimates.columns().into_iter().zip(truth.columns()) {
        let (p, s) = correlate_lanes(est, tru)?;
        result.pearson_per_cell.push(p);
        result.spearman_per_cell.push(s);
    }

    // across cell types, one value per sample
    for (est, tru) in estimates.rows().into_iter().zip(truth.rows()) {
        let (p, s) = correlate_lanes(est, tru)?;
        result.pearson_per_sample.push(p);
        result.spearman_per_sample.push(s);
    }

    Ok(result)
}

fn method_table(
    columns: Vec<Vec<f64>>,
    row_labels: Vec<String>,
    methods: &[String],
    index_name: &str,
) -> anyhow::Result<CorrelationTable> {
    let nrows = row_labels.len();
    let values = Array2::from_shape_fn((nrows, columns.len()), |(r, m)| columns[m][r]);
    LabeledMatrix::new(values, row_labels, methods.to_vec(), index_name)
}

/// Correlate every method's estimated proportions with the ground truth.
///
/// # Arguments
///
/// * `methods` - Method names, in the column order of the output tables
/// * `results` - Estimated proportions (samples × cell types) per method name
/// * `categories` - Cell types to evaluate; each must be a column of every table
/// * `ground_truth` - True proportions (samples × cell types)
///
/// # Returns
///
/// A [`CorrelationReport`] with absolute coefficients. Per cell type, the correlation runs
/// across samples; per sample, it runs across the requested cell types. Degenerate
/// comparisons (e.g. a cell type estimated as constant) are NaN.
pub fn correlation_table(
    methods: &[String],
    results: &HashMap<String, ProportionTable>,
    categories: &[String],
    ground_truth: &ProportionTable,
) -> anyhow::Result<CorrelationReport> {
    let truth_cols = category_columns(ground_truth, categories)?;
    let truth_values = ground_truth.values();
    let truth = Array2::from_shape_fn((ground_truth.nrows(), truth_cols.len()), |(s, c)| {
        truth_values[[s, truth_cols[c]]]
    });

    let per_method: Vec<MethodCorrelations> = methods
        .par_iter()
        .map(|method| {
            let estimates = results.get(method).ok_or_else(|| {
                anyhow::Error::from(DeconError::InvalidArgument(format!(
                    "no results for method '{}'",
                    method
                )))
            })?;
            let aligned = aligned_estimates(method, estimates, ground_truth, categories)?;
            method_correlations(&aligned, &truth)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    log::debug!(
        "correlated {} methods over {} cell types and {} samples",
        methods.len(),
        categories.len(),
        ground_truth.nrows()
    );

    let mut pearson_cell = Vec::with_capacity(per_method.len());
    let mut spearman_cell = Vec::with_capacity(per_method.len());
    let mut pearson_sample = Vec::with_capacity(per_method.len());
    let mut spearman_sample = Vec::with_capacity(per_method.len());
    for m in per_method {
        pearson_cell.push(m.pearson_per_cell);
        spearman_cell.push(m.spearman_per_cell);
        pearson_sample.push(m.pearson_per_sample);
        spearman_sample.push(m.spearman_per_sample);
    }

    let samples = ground_truth.row_labels().to_vec();
    let sample_index = ground_truth.index_name();

    Ok(CorrelationReport {
        pearson_per_cell: method_table(
            pearson_cell,
            categories.to_vec(),
            methods,
            CELL_TYPE_INDEX,
        )?,
        pearson_per_sample: method_table(pearson_sample, samples.clone(), methods, sample_index)?,
        spearman_per_cell: method_table(
            spearman_cell,
            categories.to_vec(),
            methods,
            CELL_TYPE_INDEX,
        )?,
        spearman_per_sample: method_table(spearman_sample, samples, methods, sample_index)?,
    })
}

/// Mean and population standard deviation, skipping NaN.
fn mean_std(values: ArrayView1<'_, f64>) -> (f64, f64) {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    (present.iter().mean(), present.iter().population_std_dev())
}

/// Summarize each method's per-sample and per-cell-type correlations.
///
/// Both tables must list the same methods as columns, in the same order.
pub fn summarize_correlation(
    per_cell: &CorrelationTable,
    per_sample: &CorrelationTable,
) -> anyhow::Result<Vec<CorrelationSummary>> {
    if per_cell.ncols() != per_sample.ncols() {
        return Err(DeconError::DimensionMismatch {
            expected: per_cell.ncols(),
            actual: per_sample.ncols(),
        }
        .into());
    }
    if per_cell.col_labels() != per_sample.col_labels() {
        return Err(DeconError::InvalidArgument(
            "per-cell and per-sample tables list different methods".to_string(),
        )
        .into());
    }

    let summaries = per_cell
        .col_labels()
        .iter()
        .enumerate()
        .map(|(m, method)| {
            let (mean_sample, std_sample) = mean_std(per_sample.values().column(m));
            let (mean_cell, std_cell) = mean_std(per_cell.values().column(m));
            CorrelationSummary {
                method: method.clone(),
                mean_corr_per_sample: mean_sample,
                std_corr_per_sample: std_sample,
                mean_corr_per_cell: mean_cell,
                std_corr_per_cell: std_cell,
            }
        })
        .collect();

    Ok(summaries)
}

/// Summaries as a table: methods × [`SUMMARY_COLUMNS`].
pub fn summary_table(summaries: &[CorrelationSummary]) -> anyhow::Result<LabeledMatrix> {
    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.mean_corr_per_sample,
                s.std_corr_per_sample,
                s.mean_corr_per_cell,
                s.std_corr_per_cell,
            ]
        })
        .collect();
    LabeledMatrix::from_rows(
        "Method",
        summaries.iter().map(|s| s.method.clone()).collect(),
        SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    )
}

/// Reshape a cell types × methods table into one record per (method, cell type).
///
/// Records are grouped by method, cell types in table order within each method.
pub fn flatten_per_cell(per_cell: &CorrelationTable) -> Vec<CorrelationRecord> {
    let values = per_cell.values();
    per_cell
        .col_labels()
        .iter()
        .enumerate()
        .flat_map(|(m, method)| {
            per_cell
                .row_labels()
                .iter()
                .enumerate()
                .map(move |(c, category)| CorrelationRecord {
                    method: method.clone(),
                    category: category.clone(),
                    correlation: values[[c, m]],
                })
        })
        .collect()
}

/// Pair one method's estimates with the ground truth, one row per (cell type, sample).
///
/// Rows are grouped by cell type, samples in ground-truth order within each cell type.
pub fn paired_predictions_long(
    method_name: &str,
    estimates: &ProportionTable,
    ground_truth: &ProportionTable,
    categories: &[String],
) -> anyhow::Result<PairedPredictions> {
    let aligned = aligned_estimates(method_name, estimates, ground_truth, categories)?;
    let truth_cols = category_columns(ground_truth, categories)?;
    let samples = ground_truth.row_labels();

    let mut rows = Vec::with_capacity(samples.len() * categories.len());
    for (c, category) in categories.iter().enumerate() {
        for (s, sample) in samples.iter().enumerate() {
            rows.push(PairedPrediction {
                sample: sample.clone(),
                category: category.clone(),
                estimate: aligned[[s, c]],
                truth: ground_truth.values()[[s, truth_cols[c]]],
            });
        }
    }

    Ok(PairedPredictions {
        method: method_name.to_string(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn ground_truth() -> ProportionTable {
        LabeledMatrix::from_rows(
            "sample",
            strings(&["s1", "s2", "s3", "s4"]),
            strings(&["T", "B", "NK"]),
            vec![
                vec![0.5, 0.3, 0.2],
                vec![0.2, 0.5, 0.3],
                vec![0.1, 0.1, 0.8],
                vec![0.4, 0.4, 0.2],
            ],
        )
        .unwrap()
    }

    fn perfect_method() -> ProportionTable {
        // same values, different row and column order
        LabeledMatrix::from_rows(
            "sample",
            strings(&["s4", "s3", "s2", "s1"]),
            strings(&["NK", "B", "T"]),
            vec![
                vec![0.2, 0.4, 0.4],
                vec![0.8, 0.1, 0.1],
                vec![0.3, 0.5, 0.2],
                vec![0.2, 0.3, 0.5],
            ],
        )
        .unwrap()
    }

    fn inverted_method() -> ProportionTable {
        // T estimates reversed across samples, others constant
        LabeledMatrix::from_rows(
            "sample",
            strings(&["s1", "s2", "s3", "s4"]),
            strings(&["T", "B", "NK"]),
            vec![
                vec![0.1, 0.45, 0.45],
                vec![0.4, 0.3, 0.3],
                vec![0.5, 0.25, 0.25],
                vec![0.2, 0.4, 0.4],
            ],
        )
        .unwrap()
    }

    fn results() -> HashMap<String, ProportionTable> {
        let mut results = HashMap::new();
        results.insert("perfect".to_string(), perfect_method());
        results.insert("inverted".to_string(), inverted_method());
        results
    }

    #[test]
    fn test_correlation_table_alignment() {
        let methods = strings(&["perfect", "inverted"]);
        let categories = strings(&["T", "B", "NK"]);
        let report = correlation_table(&methods, &results(), &categories, &ground_truth()).unwrap();

        assert_eq!(report.pearson_per_cell.row_labels(), &["T", "B", "NK"]);
        assert_eq!(report.pearson_per_cell.col_labels(), &["perfect", "inverted"]);
        assert_eq!(report.pearson_per_sample.row_labels(), &["s1", "s2", "s3", "s4"]);

        for c in 0..3 {
            assert_abs_diff_eq!(report.pearson_per_cell.values()[[c, 0]], 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(report.spearman_per_cell.values()[[c, 0]], 1.0, epsilon = 1e-12);
        }
        for s in 0..4 {
            assert_abs_diff_eq!(report.pearson_per_sample.values()[[s, 0]], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_correlation_values_are_absolute() {
        let methods = strings(&["inverted"]);
        let categories = strings(&["T"]);
        let report = correlation_table(&methods, &results(), &categories, &ground_truth()).unwrap();

        // T truth [0.5, 0.2, 0.1, 0.4] vs estimate [0.1, 0.4, 0.5, 0.2]: perfectly anti-ranked
        assert_abs_diff_eq!(report.spearman_per_cell.values()[[0, 0]], 1.0, epsilon = 1e-12);
        assert!(report.pearson_per_cell.values()[[0, 0]] > 0.0);
        // a single cell type per sample cannot be correlated
        assert!(report.pearson_per_sample.values()[[0, 0]].is_nan());
    }

    #[test]
    fn test_correlation_table_errors() {
        let categories = strings(&["T"]);
        let missing_method = correlation_table(
            &strings(&["unknown"]),
            &results(),
            &categories,
            &ground_truth(),
        );
        assert!(missing_method.is_err());

        let missing_category = correlation_table(
            &strings(&["perfect"]),
            &results(),
            &strings(&["Mono"]),
            &ground_truth(),
        );
        let err = missing_category.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeconError>(),
            Some(DeconError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_summarize_correlation() {
        let per_cell = LabeledMatrix::from_rows(
            CELL_TYPE_INDEX,
            strings(&["T", "B", "NK"]),
            strings(&["m1", "m2"]),
            vec![vec![0.9, 0.2], vec![0.7, f64::NAN], vec![0.8, 0.4]],
        )
        .unwrap();
        let per_sample = LabeledMatrix::from_rows(
            "sample",
            strings(&["s1", "s2"]),
            strings(&["m1", "m2"]),
            vec![vec![1.0, 0.5], vec![0.5, 0.5]],
        )
        .unwrap();

        let summary = summarize_correlation(&per_cell, &per_sample).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].method, "m1");
        assert_abs_diff_eq!(summary[0].mean_corr_per_cell, 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(summary[0].std_corr_per_cell, (0.02_f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(summary[0].mean_corr_per_sample, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(summary[0].std_corr_per_sample, 0.25, epsilon = 1e-12);
        // NaN skipped
        assert_abs_diff_eq!(summary[1].mean_corr_per_cell, 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(summary[1].std_corr_per_sample, 0.0, epsilon = 1e-12);

        let table = summary_table(&summary).unwrap();
        assert_eq!(table.row_labels(), &["m1", "m2"]);
        assert_eq!(table.col_labels()[2], "Mean_corr_per_cell");
    }

    #[test]
    fn test_summarize_requires_same_methods() {
        let a = LabeledMatrix::from_rows("x", strings(&["r"]), strings(&["m1"]), vec![vec![1.0]])
            .unwrap();
        let b = LabeledMatrix::from_rows("x", strings(&["r"]), strings(&["m2"]), vec![vec![1.0]])
            .unwrap();
        assert!(summarize_correlation(&a, &b).is_err());
    }

    #[test]
    fn test_flatten_per_cell() {
        let per_cell = LabeledMatrix::from_rows(
            CELL_TYPE_INDEX,
            strings(&["T", "B"]),
            strings(&["m1", "m2"]),
            vec![vec![0.1, 0.2], vec![0.3, 0.4]],
        )
        .unwrap();
        let flat = flatten_per_cell(&per_cell);
        let order: Vec<(&str, &str, f64)> = flat
            .iter()
            .map(|r| (r.method.as_str(), r.category.as_str(), r.correlation))
            .collect();
        assert_eq!(
            order,
            vec![("m1", "T", 0.1), ("m1", "B", 0.3), ("m2", "T", 0.2), ("m2", "B", 0.4)]
        );
    }

    #[test]
    fn test_paired_predictions_long() {
        let categories = strings(&["T", "NK"]);
        let paired =
            paired_predictions_long("perfect", &perfect_method(), &ground_truth(), &categories)
                .unwrap();

        assert_eq!(paired.method, "perfect");
        assert_eq!(paired.len(), 8);
        assert_eq!(paired.rows[0].category, "T");
        assert_eq!(paired.rows[0].sample, "s1");
        assert_eq!(paired.rows[4].category, "NK");
        assert_eq!(paired.estimates(), paired.truths());
        assert_abs_diff_eq!(paired.rows[6].truth, 0.8);
    }

    #[test]
    fn test_duplicate_estimate_samples_use_first_row() {
        let estimates = LabeledMatrix::from_rows(
            "sample",
            strings(&["s1", "s2", "s3", "s4", "s1"]),
            strings(&["T"]),
            vec![vec![0.5], vec![0.2], vec![0.1], vec![0.4], vec![0.9]],
        )
        .unwrap();
        let paired =
            paired_predictions_long("dup", &estimates, &ground_truth(), &strings(&["T"])).unwrap();
        assert_eq!(paired.len(), 4);
        assert_eq!(paired.rows[0].sample, "s1");
        assert_abs_diff_eq!(paired.rows[0].estimate, 0.5);
    }
}
