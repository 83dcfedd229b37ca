//! Variance-threshold feature selection with genes as features.
//!
//! Each row is one gene measured across the columns (samples or cell types). Rows whose
//! population variance is at or below the threshold are dropped.

use crate::error::DeconError;
use crate::table::LabeledMatrix;
use nalgebra_sparse::CsrMatrix;
use ndarray::Array2;
use rayon::prelude::*;
use single_utilities::traits::FloatOpsTS;
use statrs::statistics::Statistics;

/// Threshold used by [`select_by_variance`] unless told otherwise.
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.5;

/// Population variance (ddof = 0) of every row of a matrix.
pub trait RowVariance {
    fn row_variances(&self) -> Vec<f64>;
}

impl RowVariance for Array2<f64> {
    fn row_variances(&self) -> Vec<f64> {
        (0..self.nrows())
            .into_par_iter()
            .map(|row| {
                let present: Vec<f64> = self
                    .row(row)
                    .iter()
                    .copied()
                    .filter(|v| !v.is_nan())
                    .collect();
                present.iter().population_variance()
            })
            .collect()
    }
}

/// Sparse rows: implicit entries count as zeros.
impl<T> RowVariance for CsrMatrix<T>
where
    T: FloatOpsTS,
{
    fn row_variances(&self) -> Vec<f64> {
        let n = self.ncols() as f64;
        (0..self.nrows())
            .into_par_iter()
            .map(|row| {
                let (sum, sum_sq) = self.row(row).values().iter().fold(
                    (0.0_f64, 0.0_f64),
                    |(s, s2), v| {
                        let x = num_traits::ToPrimitive::to_f64(v).unwrap_or(0.0);
                        (s + x, s2 + x * x)
                    },
                );
                let mean = sum / n;
                (sum_sq / n - mean * mean).max(0.0)
            })
            .collect()
    }
}

fn check_threshold(threshold: f64) -> anyhow::Result<()> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(DeconError::InvalidArgument(format!(
            "variance threshold must be non-negative, got {}",
            threshold
        ))
        .into());
    }
    Ok(())
}

/// Indices of the rows whose variance is strictly greater than `threshold`, ascending.
pub fn variance_support<M>(matrix: &M, threshold: f64) -> anyhow::Result<Vec<usize>>
where
    M: RowVariance + ?Sized,
{
    check_threshold(threshold)?;
    Ok(matrix
        .row_variances()
        .into_iter()
        .enumerate()
        .filter_map(|(i, var)| if var > threshold { Some(i) } else { None })
        .collect())
}

/// Keep the genes (rows) whose variance across columns exceeds `threshold`.
///
/// Rows with variance `<= threshold` are dropped; row order and all columns are kept. When
/// no row passes, the result is an empty table with the original columns.
pub fn select_by_variance(table: &LabeledMatrix, threshold: f64) -> anyhow::Result<LabeledMatrix> {
    let support = variance_support(table.values(), threshold)?;

    if support.is_empty() && table.nrows() > 0 {
        log::warn!(
            "no row has a variance above {}; returning an empty table",
            threshold
        );
    } else {
        log::debug!(
            "variance threshold {} keeps {} of {} rows",
            threshold,
            support.len(),
            table.nrows()
        );
    }

    table.select_rows(&support)
}
