//! Gene sets derived from a signature matrix.
//!
//! Up/down-regulated genes are found by dividing every signature value by the median of
//! its gene across all cell types; genes far below or above that reference level are
//! considered down- or up-regulated in that cell type.

use super::GeneSets;
use crate::error::DeconError;
use crate::table::SignatureTable;
use ndarray::Array2;
use rayon::prelude::*;
use statrs::statistics::{Data, Median};
use std::cmp::Ordering;

/// Number of genes kept per cell type by [`top_ranked_genes`] unless told otherwise.
pub const DEFAULT_TOP_GENES: usize = 50;

/// Ratio cutoffs for [`derive_up_down_genes`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpDownCutoffs {
    /// Ratios strictly below this mark a down-regulated gene
    pub down: f64,
    /// Ratios strictly above this mark an up-regulated gene
    pub up: f64,
}

impl Default for UpDownCutoffs {
    fn default() -> Self {
        UpDownCutoffs { down: 0.4, up: 4.0 }
    }
}

impl UpDownCutoffs {
    pub fn new(down: f64, up: f64) -> Self {
        UpDownCutoffs { down, up }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !self.down.is_finite() || !self.up.is_finite() || self.down > self.up {
            return Err(DeconError::InvalidArgument(format!(
                "cutoffs must be finite with down <= up, got down={} up={}",
                self.down, self.up
            ))
            .into());
        }
        Ok(())
    }
}

/// Median of every row, NaN cells skipped. A row without values has a NaN median.
fn reference_levels(values: &Array2<f64>) -> Vec<f64> {
    (0..values.nrows())
        .into_par_iter()
        .map(|row| {
            let present: Vec<f64> = values
                .row(row)
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .collect();
            Data::new(present).median()
        })
        .collect()
}

#[inline]
fn has_reference(level: f64) -> bool {
    level.is_finite() && level != 0.0
}

/// Signature values divided by their gene's median across cell types.
///
/// Genes with a zero median produce non-finite ratios here; [`derive_up_down_genes`] skips them.
pub fn gene_ratios(signature: &SignatureTable) -> anyhow::Result<SignatureTable> {
    let levels = reference_levels(signature.values());
    let mut ratios = signature.values().clone();
    for (mut row, level) in ratios.rows_mut().into_iter().zip(levels) {
        row.mapv_inplace(|v| v / level);
    }
    signature.with_values(ratios)
}

/// Per cell type, the finite ratios of [`gene_ratios`] in ascending order.
///
/// Useful for inspecting the ratio distribution before choosing cutoffs.
pub fn sorted_ratios(signature: &SignatureTable) -> anyhow::Result<Vec<(String, Vec<f64>)>> {
    let ratios = gene_ratios(signature)?;
    let sorted = ratios
        .col_labels()
        .iter()
        .zip(ratios.values().columns())
        .map(|(category, column)| {
            let mut finite: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
            finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            (category.clone(), finite)
        })
        .collect();
    Ok(sorted)
}

/// Find up- and down-regulated genes for every cell type of a signature matrix.
///
/// Returns `(up, down)`. Both contain every cell type of the signature, possibly with an
/// empty list, and list genes in the signature's row order. Genes whose median is zero or
/// missing have no meaningful ratio and are in neither set.
pub fn derive_up_down_genes(
    signature: &SignatureTable,
    cutoffs: UpDownCutoffs,
) -> anyhow::Result<(GeneSets, GeneSets)> {
    cutoffs.validate()?;

    let values = signature.values();
    let levels = reference_levels(values);

    let skipped = levels.iter().filter(|&&l| !has_reference(l)).count();
    if skipped > 0 {
        log::warn!(
            "{} of {} genes have a zero or missing median and are excluded from up/down sets",
            skipped,
            levels.len()
        );
    }

    let mut up = GeneSets::new();
    let mut down = GeneSets::new();

    for (col, category) in signature.col_labels().iter().enumerate() {
        let mut up_genes = Vec::new();
        let mut down_genes = Vec::new();

        for (row, gene) in signature.row_labels().iter().enumerate() {
            let level = levels[row];
            if !has_reference(level) {
                continue;
            }
            let ratio = values[[row, col]] / level;
            if ratio < cutoffs.down {
                down_genes.push(gene.clone());
            } else if ratio > cutoffs.up {
                up_genes.push(gene.clone());
            }
        }

        log::debug!(
            "{}: {} up-regulated, {} down-regulated genes",
            category,
            up_genes.len(),
            down_genes.len()
        );
        up.insert(category.clone(), up_genes);
        down.insert(category.clone(), down_genes);
    }

    Ok((up, down))
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// The `size` most expressed genes of every cell type, highest first.
///
/// Ties keep the signature's row order. Missing values rank last.
pub fn top_ranked_genes(signature: &SignatureTable, size: usize) -> GeneSets {
    let values = signature.values();
    let genes = signature.row_labels();

    let mut top = GeneSets::new();
    for (col, category) in signature.col_labels().iter().enumerate() {
        let mut order: Vec<usize> = (0..genes.len()).collect();
        order.sort_by(|&a, &b| descending_nan_last(values[[a, col]], values[[b, col]]));
        order.truncate(size);
        top.insert(
            category.clone(),
            order.into_iter().map(|i| genes[i].clone()).collect(),
        );
    }
    top
}
