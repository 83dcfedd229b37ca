//! Restricting two gene-indexed tables to the genes they share.

use crate::table::LabeledMatrix;
use std::collections::{BTreeMap, HashSet};

/// Sorted distinct row labels present in both tables.
pub fn shared_labels(table_a: &LabeledMatrix, table_b: &LabeledMatrix) -> Vec<String> {
    let in_b: HashSet<&str> = table_b.row_labels().iter().map(|l| l.as_str()).collect();
    let mut shared: Vec<String> = table_a
        .row_labels()
        .iter()
        .filter(|l| in_b.contains(l.as_str()))
        .cloned()
        .collect();
    shared.sort();
    shared.dedup();
    shared
}

fn rows_by_label(table: &LabeledMatrix) -> BTreeMap<&str, Vec<usize>> {
    let mut rows: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in table.row_labels().iter().enumerate() {
        rows.entry(label.as_str()).or_default().push(i);
    }
    rows
}

/// Keep only the genes present in both tables and sort both by gene label.
///
/// Row `i` of the first returned table and row `i` of the second always carry the same
/// label. A label that occurs `m` times in `table_a` and `n` times in `table_b` is an
/// inner-join expansion: it appears `m * n` times in both outputs, every row of `table_a`
/// paired with every row of `table_b`.
///
/// # Arguments
///
/// * `table_a` - e.g. an expression table (genes × samples)
/// * `table_b` - e.g. a signature table (genes × cell types), same identifier scheme
pub fn intersect_by_index(
    table_a: &LabeledMatrix,
    table_b: &LabeledMatrix,
) -> anyhow::Result<(LabeledMatrix, LabeledMatrix)> {
    let rows_a = rows_by_label(table_a);
    let rows_b = rows_by_label(table_b);

    let mut idx_a = Vec::new();
    let mut idx_b = Vec::new();
    let mut expanded = 0usize;

    for (label, a_rows) in &rows_a {
        let Some(b_rows) = rows_b.get(label) else {
            continue;
        };
        if a_rows.len() > 1 || b_rows.len() > 1 {
            expanded += 1;
        }
        for &i in a_rows {
            for &j in b_rows {
                idx_a.push(i);
                idx_b.push(j);
            }
        }
    }

    if expanded > 0 {
        log::warn!(
            "{} shared gene labels are duplicated; rows were expanded pairwise",
            expanded
        );
    }
    log::debug!(
        "keeping {} shared rows ({} and {} rows before)",
        idx_a.len(),
        table_a.nrows(),
        table_b.nrows()
    );

    Ok((table_a.select_rows(&idx_a)?, table_b.select_rows(&idx_b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(genes: &[&str], ncols: usize, offset: f64) -> LabeledMatrix {
        let rows = (0..genes.len())
            .map(|i| (0..ncols).map(|j| offset + (i * ncols + j) as f64).collect())
            .collect();
        LabeledMatrix::from_rows(
            "Hugo_Symbol",
            genes.iter().map(|g| g.to_string()).collect(),
            (0..ncols).map(|j| format!("c{}", j)).collect(),
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_intersection_sorted_and_aligned() {
        let rna = table(&["TP53", "CD3E", "ACTB", "CD19"], 3, 0.0);
        let sig = table(&["CD19", "MS4A1", "CD3E", "ACTB"], 2, 100.0);

        let (rna_red, sig_red) = intersect_by_index(&rna, &sig).unwrap();
        assert_eq!(rna_red.row_labels(), &["ACTB", "CD19", "CD3E"]);
        assert_eq!(rna_red.row_labels(), sig_red.row_labels());
        assert_eq!(shared_labels(&rna, &sig), vec!["ACTB", "CD19", "CD3E"]);

        // values travel with their labels
        assert_eq!(rna_red.values().row(0).to_vec(), vec![6.0, 7.0, 8.0]);
        assert_eq!(sig_red.values().row(0).to_vec(), vec![106.0, 107.0]);
        assert_eq!(sig_red.col_labels(), sig.col_labels());
    }

    #[test]
    fn test_disjoint_tables() {
        let a = table(&["A", "B"], 1, 0.0);
        let b = table(&["C"], 1, 0.0);
        let (a_red, b_red) = intersect_by_index(&a, &b).unwrap();
        assert_eq!(a_red.nrows(), 0);
        assert_eq!(b_red.nrows(), 0);
        assert_eq!(a_red.ncols(), 1);
    }

    #[test]
    fn test_duplicate_labels_expand_pairwise() {
        let a = table(&["G", "X", "G"], 1, 0.0);
        let b = table(&["G", "G"], 1, 10.0);
        let (a_red, b_red) = intersect_by_index(&a, &b).unwrap();

        assert_eq!(a_red.nrows(), 4);
        assert_eq!(a_red.row_labels(), b_red.row_labels());
        let a_vals: Vec<f64> = a_red.values().column(0).to_vec();
        let b_vals: Vec<f64> = b_red.values().column(0).to_vec();
        assert_eq!(a_vals, vec![0.0, 0.0, 2.0, 2.0]);
        assert_eq!(b_vals, vec![10.0, 11.0, 10.0, 11.0]);
    }
}
