//! Delimited readers and writers for labeled tables.
//!
//! Every table file has one header row and one row per gene (or sample). Empty cells and
//! the tokens in [`NA_TOKENS`](super::NA_TOKENS) are read as NaN.

use super::{TAB, is_missing, open_reader, open_writer, read_header};
use crate::error::DeconError;
use crate::table::{ExpressionTable, GeneIdentifier, HUGO_SYMBOL, LabeledMatrix, SignatureTable};
use anyhow::Context;
use ndarray::Array2;
use std::path::Path;

/// Which column holds the row labels and which hold values.
struct KeyLayout {
    key: usize,
    values: Vec<usize>,
    index_name: String,
}

fn parse_cell(raw: &str, row: usize, column: &str) -> anyhow::Result<f64> {
    if is_missing(raw) {
        return Ok(f64::NAN);
    }
    raw.trim().parse::<f64>().map_err(|_| {
        anyhow::Error::from(DeconError::InvalidValue {
            value: raw.to_string(),
            row,
            column: column.to_string(),
        })
    })
}

fn read_keyed<F>(path: &Path, delimiter: u8, layout: F) -> anyhow::Result<LabeledMatrix>
where
    F: FnOnce(&[String]) -> anyhow::Result<KeyLayout>,
{
    let mut reader = open_reader(path, delimiter, false)?;
    let header = read_header(&mut reader, path)?;
    let layout = layout(&header)?;

    let col_labels: Vec<String> = layout.values.iter().map(|&i| header[i].clone()).collect();
    let mut row_labels = Vec::new();
    let mut flat = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record
            .map_err(DeconError::from)
            .with_context(|| format!("reading row {} of {}", row + 1, path.display()))?;

        row_labels.push(record.get(layout.key).unwrap_or("").trim().to_string());
        for &col in &layout.values {
            flat.push(parse_cell(record.get(col).unwrap_or(""), row, &header[col])?);
        }
    }

    let values = Array2::from_shape_vec((row_labels.len(), col_labels.len()), flat)?;
    log::debug!(
        "read {}x{} table from {}",
        row_labels.len(),
        col_labels.len(),
        path.display()
    );
    LabeledMatrix::new(values, row_labels, col_labels, layout.index_name)
}

fn first_column_layout(header: &[String], index_name: Option<&str>) -> anyhow::Result<KeyLayout> {
    let first = header.first().ok_or_else(|| {
        anyhow::Error::from(DeconError::InvalidArgument(
            "table has no columns".to_string(),
        ))
    })?;
    Ok(KeyLayout {
        key: 0,
        values: (1..header.len()).collect(),
        index_name: index_name.unwrap_or(first).to_string(),
    })
}

/// Read a delimited table whose first column holds the row labels.
///
/// The first column's header becomes the table's index name.
pub fn read_labeled_table<P: AsRef<Path>>(path: P, delimiter: u8) -> anyhow::Result<LabeledMatrix> {
    read_keyed(path.as_ref(), delimiter, |header| {
        first_column_layout(header, None)
    })
}

/// Read a tab-separated expression matrix (genes × samples).
///
/// The file must carry both a `Hugo_Symbol` and an `Entrez_Gene_Id` column. Both are read
/// as text; the column of `identifier` becomes the row label and the other one is dropped.
/// All remaining columns are samples. Duplicate gene labels are kept as they are.
pub fn read_expression_table<P: AsRef<Path>>(
    path: P,
    identifier: GeneIdentifier,
) -> anyhow::Result<ExpressionTable> {
    let path = path.as_ref();
    read_keyed(path, TAB, |header| {
        let position = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| anyhow::Error::from(DeconError::MissingColumn(name.to_string())))
        };
        let key = position(identifier.column_name())?;
        let dropped = position(identifier.other().column_name())?;
        Ok(KeyLayout {
            key,
            values: (0..header.len())
                .filter(|&i| i != key && i != dropped)
                .collect(),
            index_name: identifier.column_name().to_string(),
        })
    })
    .with_context(|| format!("loading expression table {}", path.display()))
}

/// Like [`read_expression_table`], with the identifier given as `"hugo"` or `"entrez"`.
///
/// Any other identifier fails with [`DeconError::InvalidArgument`] before the file is opened.
pub fn read_expression_table_by_name<P: AsRef<Path>>(
    path: P,
    identifier: &str,
) -> anyhow::Result<ExpressionTable> {
    let identifier: GeneIdentifier = identifier.parse()?;
    read_expression_table(path, identifier)
}

/// Read a tab-separated signature matrix (genes × cell types).
///
/// The first column holds gene symbols whatever its header says; it is renamed
/// `Hugo_Symbol`.
pub fn read_signature_table<P: AsRef<Path>>(path: P) -> anyhow::Result<SignatureTable> {
    let path = path.as_ref();
    read_keyed(path, TAB, |header| {
        first_column_layout(header, Some(HUGO_SYMBOL))
    })
    .with_context(|| format!("loading signature table {}", path.display()))
}

/// Write a table with a header of the index name followed by the column labels.
pub fn write_table<P: AsRef<Path>>(
    table: &LabeledMatrix,
    path: P,
    delimiter: u8,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut writer = open_writer(path, delimiter)?;

    let mut header = Vec::with_capacity(table.ncols() + 1);
    header.push(table.index_name().to_string());
    header.extend(table.col_labels().iter().cloned());
    writer.write_record(&header).map_err(DeconError::from)?;

    for (label, row) in table.row_labels().iter().zip(table.values().rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(label.clone());
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record).map_err(DeconError::from)?;
    }

    writer.flush().map_err(DeconError::from)?;
    Ok(())
}
