//! Gene-set files.
//!
//! Two comma-separated layouts are supported:
//!
//! - **named**: one row per (cell type, gene) pair, e.g. the ssGSEA immune gene sets
//! - **columnar**: one column per cell type, its non-missing cells being the genes; columns
//!   may differ in length

use super::{COMMA, is_missing, open_reader, open_writer, read_header};
use crate::error::DeconError;
use crate::genesets::GeneSets;
use anyhow::Context;
use std::path::Path;

/// Bundled ssGSEA gene-set file, relative to the working directory.
pub const DEFAULT_GENE_SET_FILE: &str = "data/Gene_sets.csv";
pub const DEFAULT_CATEGORY_COLUMN: &str = "Cell type";
pub const DEFAULT_GENE_COLUMN: &str = "Symbol";

/// Read gene sets from a file with one row per (category, gene) pair.
///
/// Categories appear in order of first occurrence and genes in file order within each
/// category. Rows with a missing category or gene are skipped.
pub fn read_named_gene_sets<P: AsRef<Path>>(
    path: P,
    category_column: &str,
    gene_column: &str,
) -> anyhow::Result<GeneSets> {
    let path = path.as_ref();
    let mut reader = open_reader(path, COMMA, false)?;
    let header = read_header(&mut reader, path)?;

    let position = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow::Error::from(DeconError::MissingColumn(name.to_string())))
    };
    let category_idx = position(category_column)?;
    let gene_idx = position(gene_column)?;

    let mut sets = GeneSets::new();
    let mut skipped = 0usize;
    for (row, record) in reader.records().enumerate() {
        let record = record
            .map_err(DeconError::from)
            .with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;

        let category = record.get(category_idx).unwrap_or("");
        let gene = record.get(gene_idx).unwrap_or("");
        if is_missing(category) || is_missing(gene) {
            skipped += 1;
            continue;
        }
        sets.push_gene(category, gene);
    }

    if skipped > 0 {
        log::debug!("skipped {} incomplete rows in {}", skipped, path.display());
    }
    log::debug!("read {} gene sets from {}", sets.len(), path.display());
    Ok(sets)
}

/// Read the bundled ssGSEA gene sets from [`DEFAULT_GENE_SET_FILE`].
pub fn read_default_gene_sets() -> anyhow::Result<GeneSets> {
    read_named_gene_sets(
        DEFAULT_GENE_SET_FILE,
        DEFAULT_CATEGORY_COLUMN,
        DEFAULT_GENE_COLUMN,
    )
}

/// Read gene sets stored one column per category.
///
/// Each column header is a category; its cells, minus missing values, are the genes in
/// file order. Short columns may be padded with empty cells or NA tokens, or rows may
/// simply end early. Duplicate column headers fail with [`DeconError::InvalidArgument`].
pub fn read_columnar_gene_sets<P: AsRef<Path>>(path: P) -> anyhow::Result<GeneSets> {
    let path = path.as_ref();
    let mut reader = open_reader(path, COMMA, true)?;
    let header = read_header(&mut reader, path)?;

    let mut sets = GeneSets::new();
    // an empty file or a lone empty header field holds no sets
    if header.iter().all(|h| h.is_empty()) {
        return Ok(sets);
    }
    for category in &header {
        if sets.contains(category) {
            return Err(DeconError::InvalidArgument(format!(
                "duplicate gene-set column '{}' in {}",
                category,
                path.display()
            ))
            .into());
        }
        sets.insert(category.clone(), Vec::new());
    }

    for (row, record) in reader.records().enumerate() {
        let record = record
            .map_err(DeconError::from)
            .with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;

        for (category, cell) in header.iter().zip(record.iter()) {
            if !is_missing(cell) {
                sets.push_gene(category, cell.trim());
            }
        }
    }

    log::debug!("read {} gene sets from {}", sets.len(), path.display());
    Ok(sets)
}

/// Write gene sets one column per category, padding shorter columns with empty cells.
///
/// [`read_columnar_gene_sets`] reads the file back into the same sets. Empty sets produce an
/// empty file. Gene or category labels that would read back as missing (empty or an NA
/// token) fail with [`DeconError::InvalidArgument`] before anything is written.
pub fn write_columnar_gene_sets<P: AsRef<Path>>(sets: &GeneSets, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    for (category, genes) in sets.iter() {
        if category.is_empty() {
            return Err(DeconError::InvalidArgument(
                "gene-set category must not be empty".to_string(),
            )
            .into());
        }
        if let Some(gene) = genes.iter().find(|g| is_missing(g.as_str())) {
            return Err(DeconError::InvalidArgument(format!(
                "gene '{}' in set '{}' would be read back as a missing value",
                gene, category
            ))
            .into());
        }
    }

    let mut writer = open_writer(path, COMMA)?;
    if sets.is_empty() {
        writer.flush().map_err(DeconError::from)?;
        return Ok(());
    }

    writer
        .write_record(sets.categories())
        .map_err(DeconError::from)?;

    for i in 0..sets.max_set_size() {
        let record: Vec<&str> = sets
            .iter()
            .map(|(_, genes)| genes.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&record).map_err(DeconError::from)?;
    }

    writer.flush().map_err(DeconError::from)?;
    Ok(())
}
