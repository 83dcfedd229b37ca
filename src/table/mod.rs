//! Labeled dense tables used throughout the crate.
//!
//! A [`LabeledMatrix`] is a dense `f64` matrix whose rows and columns carry string labels,
//! together with the name of the row-label column as it appeared in the source file. The
//! same structure plays several roles in a deconvolution workflow, named by the aliases
//! below: expression matrices (genes × samples), signature matrices (genes × cell types),
//! proportion tables (samples × cell types) and correlation tables (cell types or samples ×
//! methods).

use crate::error::DeconError;
use nalgebra_sparse::CsrMatrix;
use ndarray::{Array2, ArrayView1, Axis};
use single_utilities::traits::FloatOpsTS;
use std::fmt;
use std::str::FromStr;

/// Header of the Hugo symbol identifier column.
pub const HUGO_SYMBOL: &str = "Hugo_Symbol";
/// Header of the Entrez gene ID identifier column.
pub const ENTREZ_GENE_ID: &str = "Entrez_Gene_Id";

/// Expression matrix: genes × samples.
pub type ExpressionTable = LabeledMatrix;
/// Reference signature matrix: genes × cell types.
pub type SignatureTable = LabeledMatrix;
/// Estimated or true cell-type fractions: samples × cell types.
pub type ProportionTable = LabeledMatrix;
/// Correlation coefficients: cell types (or samples) × methods.
pub type CorrelationTable = LabeledMatrix;

/// Gene identifier scheme used to index an expression table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneIdentifier {
    /// HGNC gene symbols (`Hugo_Symbol`)
    Hugo,
    /// NCBI Entrez gene IDs (`Entrez_Gene_Id`)
    Entrez,
}

impl GeneIdentifier {
    /// Header of the column holding this identifier.
    pub fn column_name(&self) -> &'static str {
        match self {
            GeneIdentifier::Hugo => HUGO_SYMBOL,
            GeneIdentifier::Entrez => ENTREZ_GENE_ID,
        }
    }

    /// The other scheme, whose column is dropped when this one is selected.
    pub fn other(&self) -> GeneIdentifier {
        match self {
            GeneIdentifier::Hugo => GeneIdentifier::Entrez,
            GeneIdentifier::Entrez => GeneIdentifier::Hugo,
        }
    }
}

impl FromStr for GeneIdentifier {
    type Err = DeconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hugo" => Ok(GeneIdentifier::Hugo),
            "entrez" => Ok(GeneIdentifier::Entrez),
            other => Err(DeconError::InvalidArgument(format!(
                "gene identifier must be 'hugo' or 'entrez', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for GeneIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneIdentifier::Hugo => write!(f, "hugo"),
            GeneIdentifier::Entrez => write!(f, "entrez"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    values: Array2<f64>,
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    index_name: String,
}

impl LabeledMatrix {
    /// Create a table, checking that the label counts match the matrix shape.
    pub fn new(
        values: Array2<f64>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        index_name: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let (nrows, ncols) = values.dim();
        if nrows != row_labels.len() {
            return Err(DeconError::DimensionMismatch {
                expected: nrows,
                actual: row_labels.len(),
            }
            .into());
        }
        if ncols != col_labels.len() {
            return Err(DeconError::DimensionMismatch {
                expected: ncols,
                actual: col_labels.len(),
            }
            .into());
        }
        Ok(LabeledMatrix {
            values,
            row_labels,
            col_labels,
            index_name: index_name.into(),
        })
    }

    /// Build a table from row-major nested vectors.
    pub fn from_rows(
        index_name: impl Into<String>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> anyhow::Result<Self> {
        let ncols = col_labels.len();
        let mut flat = Vec::with_capacity(rows.len() * ncols);
        for row in &rows {
            if row.len() != ncols {
                return Err(DeconError::DimensionMismatch {
                    expected: ncols,
                    actual: row.len(),
                }
                .into());
            }
            flat.extend_from_slice(row);
        }
        let values = Array2::from_shape_vec((rows.len(), ncols), flat)?;
        Self::new(values, row_labels, col_labels, index_name)
    }

    /// Densify a sparse matrix; implicit entries become zero.
    pub fn from_csr<T>(
        matrix: &CsrMatrix<T>,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        index_name: impl Into<String>,
    ) -> anyhow::Result<Self>
    where
        T: FloatOpsTS,
    {
        let mut values = Array2::zeros((matrix.nrows(), matrix.ncols()));
        for (row, col, value) in matrix.triplet_iter() {
            values[[row, col]] = value.to_f64().unwrap_or(f64::NAN);
        }
        Self::new(values, row_labels, col_labels, index_name)
    }

    /// Same labels, new cell values of the same shape.
    pub fn with_values(&self, values: Array2<f64>) -> anyhow::Result<Self> {
        if values.dim() != self.values.dim() {
            return Err(DeconError::DimensionMismatch {
                expected: self.values.len(),
                actual: values.len(),
            }
            .into());
        }
        Self::new(
            values,
            self.row_labels.clone(),
            self.col_labels.clone(),
            self.index_name.clone(),
        )
    }

    /// Keep the given rows, in the given order. Indices may repeat.
    pub fn select_rows(&self, indices: &[usize]) -> anyhow::Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.nrows()) {
            return Err(DeconError::InvalidArgument(format!(
                "row index {} out of bounds for {} rows",
                bad,
                self.nrows()
            ))
            .into());
        }
        let values = if indices.is_empty() {
            Array2::zeros((0, self.ncols()))
        } else {
            self.values.select(Axis(0), indices)
        };
        let row_labels = indices.iter().map(|&i| self.row_labels[i].clone()).collect();
        Self::new(
            values,
            row_labels,
            self.col_labels.clone(),
            self.index_name.clone(),
        )
    }

    #[inline]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    #[inline]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[inline]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    #[inline]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of the first row with this label.
    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.row_labels.iter().position(|l| l == label)
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.col_labels.iter().position(|l| l == label)
    }

    /// Column view by label.
    pub fn column(&self, label: &str) -> anyhow::Result<ArrayView1<'_, f64>> {
        let idx = self
            .column_index(label)
            .ok_or_else(|| DeconError::MissingColumn(label.to_string()))?;
        Ok(self.values.column(idx))
    }

    /// Cell value by row and column label.
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.row_index(row)?;
        let c = self.column_index(col)?;
        self.values.get((r, c)).copied()
    }
}
