//! Reading and writing the delimited text files of a deconvolution workflow.
//!
//! - **[`tables`]**: expression matrices, signature matrices and other labeled tables
//! - **[`gene_sets`]**: gene sets in long (category, gene) or columnar layout
//! - **[`reports`]**: long-format correlation and prediction reports

use crate::error::DeconError;
use anyhow::Context;
use std::fs::File;
use std::path::Path;

pub mod gene_sets;
pub mod reports;
pub mod tables;

pub use gene_sets::{
    DEFAULT_CATEGORY_COLUMN, DEFAULT_GENE_COLUMN, DEFAULT_GENE_SET_FILE,
    read_columnar_gene_sets, read_default_gene_sets, read_named_gene_sets,
    write_columnar_gene_sets,
};
pub use reports::{write_correlation_records, write_paired_predictions};
pub use tables::{
    read_expression_table, read_expression_table_by_name, read_labeled_table,
    read_signature_table, write_table,
};

pub const TAB: u8 = b'\t';
pub const COMMA: u8 = b',';

/// Cell contents treated as missing values.
pub const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "#N/A", "<NA>", "None",
];

#[inline]
pub(crate) fn is_missing(cell: &str) -> bool {
    NA_TOKENS.contains(&cell.trim())
}

pub(crate) fn open_reader(
    path: &Path,
    delimiter: u8,
    flexible: bool,
) -> anyhow::Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(flexible)
        .from_path(path)
        .map_err(DeconError::from)
        .with_context(|| format!("opening {}", path.display()))
}

pub(crate) fn open_writer(path: &Path, delimiter: u8) -> anyhow::Result<csv::Writer<File>> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(DeconError::from)
        .with_context(|| format!("creating {}", path.display()))
}

/// Header row as owned strings.
pub(crate) fn read_header(
    reader: &mut csv::Reader<File>,
    path: &Path,
) -> anyhow::Result<Vec<String>> {
    let header = reader
        .headers()
        .map_err(DeconError::from)
        .with_context(|| format!("reading header of {}", path.display()))?;
    Ok(header.iter().map(|h| h.to_string()).collect())
}
