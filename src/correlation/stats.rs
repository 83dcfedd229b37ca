//! Correlation coefficients between two equally long samples.
//!
//! Degenerate inputs (fewer than two points, a constant sample, missing values) give a NaN
//! coefficient rather than an error, so one bad cell type does not abort a whole report.

use crate::error::DeconError;
use single_utilities::traits::FloatOps;
use statrs::statistics::Statistics;
use std::cmp::Ordering;

fn to_f64_vec<T>(values: &[T]) -> Vec<f64>
where
    T: FloatOps,
{
    values
        .iter()
        .map(|v| num_traits::ToPrimitive::to_f64(v).unwrap_or(f64::NAN))
        .collect()
}

fn check_lengths(nx: usize, ny: usize) -> anyhow::Result<()> {
    if nx != ny {
        return Err(DeconError::DimensionMismatch {
            expected: nx,
            actual: ny,
        }
        .into());
    }
    Ok(())
}

fn pearson_f64(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 || x.iter().chain(y.iter()).any(|v| v.is_nan()) {
        return f64::NAN;
    }

    let cov = x.iter().covariance(y.iter());
    let sd_x = x.iter().std_dev();
    let sd_y = y.iter().std_dev();
    let r = cov / (sd_x * sd_y);

    // rounding can push |r| slightly past 1
    if r.is_finite() { r.clamp(-1.0, 1.0) } else { f64::NAN }
}

/// Rank values from 1..=n, ties sharing the average of their ranks.
pub fn average_ranks<T>(values: &[T]) -> Vec<f64>
where
    T: FloatOps,
{
    let mut indexed: Vec<(usize, T)> = values.iter().enumerate().map(|(i, &v)| (i, v)).collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < indexed.len() {
        let val = indexed[i].1;
        let mut j = i + 1;

        while j < indexed.len() && indexed[j].1 == val {
            j += 1;
        }

        // positions i..j share ranks i+1..=j
        let rank = (i + j + 1) as f64 / 2.0;
        for entry in &indexed[i..j] {
            ranks[entry.0] = rank;
        }

        i = j;
    }

    ranks
}

/// Pearson product-moment correlation of `x` and `y`.
///
/// Fails only when the slices differ in length; degenerate input yields NaN.
pub fn pearson<T>(x: &[T], y: &[T]) -> anyhow::Result<f64>
where
    T: FloatOps,
{
    check_lengths(x.len(), y.len())?;
    Ok(pearson_f64(&to_f64_vec(x), &to_f64_vec(y)))
}

/// Spearman rank correlation: Pearson correlation of the tie-averaged ranks.
pub fn spearman<T>(x: &[T], y: &[T]) -> anyhow::Result<f64>
where
    T: FloatOps,
{
    check_lengths(x.len(), y.len())?;
    let xs = to_f64_vec(x);
    let ys = to_f64_vec(y);
    if xs.iter().chain(ys.iter()).any(|v| v.is_nan()) {
        return Ok(f64::NAN);
    }
    Ok(pearson_f64(&average_ranks(&xs), &average_ranks(&ys)))
}
