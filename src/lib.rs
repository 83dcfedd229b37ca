//! # decon-utils
//!
//! Data utilities for evaluating cell-type deconvolution of bulk RNA-seq data.
//!
//! The crate covers the steps around a deconvolution method rather than the method itself:
//! loading expression and signature matrices, harmonizing and normalizing them, deriving
//! marker gene sets from a signature matrix, and scoring estimated cell-type proportions
//! against a ground truth.
//!
//! ## Core Features
//!
//! - **Table I/O**: tab-separated expression and signature matrices, gene-set files and
//!   long-format reports
//! - **Transforms**: z-score and min-max normalization, shared-gene intersection and
//!   variance-threshold gene selection (dense tables or `CsrMatrix` rows)
//! - **Gene sets**: up/down-regulated and top-ranked genes per cell type
//! - **Correlation**: per-cell-type and per-sample Pearson and Spearman reports
//!
//! ## Module Organization
//!
//! - **[`table`]**: the labeled matrix shared by all modules
//! - **[`io`]**: file readers and writers
//! - **[`transform`]**: normalization, intersection and variance filtering
//! - **[`genesets`]**: gene-set container and derivation from signatures
//! - **[`correlation`]**: correlation coefficients and evaluation reports
//! - **[`error`]**: typed errors carried inside `anyhow::Error`

pub mod correlation;
pub mod error;
pub mod genesets;
pub mod io;
pub mod table;
pub mod transform;

pub use error::DeconError;
pub use genesets::GeneSets;
pub use table::{GeneIdentifier, LabeledMatrix};
pub use transform::Scaling;
