//! Whole-table transforms: normalization, shared-gene intersection and variance-based
//! feature selection.
//!
//! All functions take tables by reference and return new tables; labels are carried over
//! unchanged.

pub mod intersect;
pub mod normalization;
pub mod variance;

pub use intersect::{intersect_by_index, shared_labels};
pub use normalization::{Scaling, normalize};
pub use variance::{DEFAULT_VARIANCE_THRESHOLD, RowVariance, select_by_variance, variance_support};
