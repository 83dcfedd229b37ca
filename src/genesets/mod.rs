//! Gene sets per cell type.
//!
//! [`GeneSets`] maps a category label (usually a cell type) to an ordered list of gene
//! identifiers. Sets come either from files (see [`crate::io`]) or are derived from a
//! signature matrix by [`derive_up_down_genes`] and [`top_ranked_genes`].

use std::collections::HashMap;

mod derive;

pub use derive::{
    DEFAULT_TOP_GENES, UpDownCutoffs, derive_up_down_genes, gene_ratios, sorted_ratios,
    top_ranked_genes,
};

/// Ordered mapping from category to gene list. Categories keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneSets {
    entries: Vec<(String, Vec<String>)>,
    positions: HashMap<String, usize>,
}

impl GeneSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gene list of a category, replacing any previous list but keeping its position.
    pub fn insert(&mut self, category: impl Into<String>, genes: Vec<String>) {
        let category = category.into();
        match self.positions.get(&category) {
            Some(&pos) => self.entries[pos].1 = genes,
            None => {
                self.positions.insert(category.clone(), self.entries.len());
                self.entries.push((category, genes));
            }
        }
    }

    /// Append one gene to a category, creating the category on first use.
    pub fn push_gene(&mut self, category: &str, gene: impl Into<String>) {
        let pos = match self.positions.get(category) {
            Some(&pos) => pos,
            None => {
                self.positions.insert(category.to_string(), self.entries.len());
                self.entries.push((category.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        self.entries[pos].1.push(gene.into());
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.positions
            .get(category)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.positions.contains_key(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.entries.iter().map(|(c, g)| (c.as_str(), g.as_slice()))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of the longest gene list.
    pub fn max_set_size(&self) -> usize {
        self.entries.iter().map(|(_, g)| g.len()).fold(0, usize::max)
    }
}
