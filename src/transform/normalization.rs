//! Z-score and min-max normalization of expression tables.
//!
//! Statistics ignore missing (NaN) cells, which stay NaN in the output.

use crate::error::DeconError;
use crate::table::LabeledMatrix;
use ndarray::{Array2, ArrayView2, ArrayViewMut1, Axis};
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;

/// Normalization method for [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scaling {
    /// Subtract the mean, divide by the population standard deviation
    ZScore,
    /// Rescale to the closed interval [0, 1]
    MinMax,
}

impl FromStr for Scaling {
    type Err = DeconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zscore" => Ok(Scaling::ZScore),
            "minmax" => Ok(Scaling::MinMax),
            other => Err(DeconError::InvalidArgument(format!(
                "scaling must be 'zscore' or 'minmax', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scaling::ZScore => write!(f, "zscore"),
            Scaling::MinMax => write!(f, "minmax"),
        }
    }
}

/// Normalize a table column-wise (`axis = 0`) or row-wise (`axis = 1`).
///
/// # Arguments
///
/// * `table` - Input table, left untouched
/// * `method` - [`Scaling::ZScore`] or [`Scaling::MinMax`]
/// * `axis` - 0 to normalize each column independently, 1 for each row
///
/// # Returns
///
/// A table with the same labels and normalized values. A constant column (or row) becomes
/// all zeros under both methods.
pub fn normalize(
    table: &LabeledMatrix,
    method: Scaling,
    axis: usize,
) -> anyhow::Result<LabeledMatrix> {
    if axis > 1 {
        return Err(
            DeconError::InvalidArgument(format!("axis must be 0 or 1, got {}", axis)).into(),
        );
    }

    log::debug!(
        "{} normalization along axis {} of a {}x{} table",
        method,
        axis,
        table.nrows(),
        table.ncols()
    );

    let values = match method {
        Scaling::ZScore => z_score(table.values(), Axis(axis)),
        Scaling::MinMax if axis == 1 => min_max_columns(table.values().t()).reversed_axes(),
        Scaling::MinMax => min_max_columns(table.values().view()),
    };

    table.with_values(values)
}

fn present_values(lane: &ArrayViewMut1<'_, f64>) -> Vec<f64> {
    lane.iter().copied().filter(|v| !v.is_nan()).collect()
}

fn z_score(values: &Array2<f64>, axis: Axis) -> Array2<f64> {
    let mut out = values.clone();
    for mut lane in out.lanes_mut(axis) {
        let present = present_values(&lane);
        let mean = present.iter().mean();
        let std = present.iter().population_std_dev();
        let scale = if std > 0.0 { std } else { 1.0 };
        lane.mapv_inplace(|v| (v - mean) / scale);
    }
    out
}

/// Rescale every column to [0, 1]. Row-wise rescaling goes through a transposed view.
fn min_max_columns(values: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = values.to_owned();
    for mut column in out.columns_mut() {
        let present = present_values(&column);
        let min = present.iter().fold(f64::INFINITY, |acc, &v| acc.min(v));
        let max = present.iter().fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let range = max - min;
        let scale = if range > 0.0 { range } else { 1.0 };
        column.mapv_inplace(|v| (v - min) / scale);
    }
    out
}
