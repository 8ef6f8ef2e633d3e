use crate::core::models::residue::ResidueType;
use rand::Rng;
use rand::seq::SliceRandom;

/// The genotype of one residue: a target type and a selector in `[0, 1)`.
///
/// The selector is an index fraction into the candidate rotamers of the
/// target type, not a probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlleleEntry {
    pub residue_type: ResidueType,
    pub selector: f64,
}

impl AlleleEntry {
    pub fn new(residue_type: ResidueType, selector: f64) -> Self {
        Self {
            residue_type,
            selector,
        }
    }
}

/// The per-individual genotype, one entry per residue in residue-table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allele {
    entries: Vec<AlleleEntry>,
}

impl Allele {
    pub fn new(entries: Vec<AlleleEntry>) -> Self {
        Self { entries }
    }

    /// Pairs types and selectors entry by entry; extra items on either side are dropped.
    pub fn from_parts(types: &[ResidueType], selectors: &[f64]) -> Self {
        Self {
            entries: types
                .iter()
                .zip(selectors)
                .map(|(&t, &s)| AlleleEntry::new(t, s))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AlleleEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlleleEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[AlleleEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [AlleleEntry] {
        &mut self.entries
    }

    pub fn push(&mut self, entry: AlleleEntry) {
        self.entries.push(entry);
    }

    pub fn types(&self) -> Vec<ResidueType> {
        self.entries.iter().map(|e| e.residue_type).collect()
    }

    pub fn selectors(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.selector).collect()
    }
}

/// Maps a selector onto an index into `count` candidates.
///
/// `floor(selector * count)`, clamped to `[0, count - 1]`. `None` when there
/// are no candidates.
pub fn selector_index(selector: f64, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let index = (selector * count as f64).floor();
    Some((index.max(0.0) as usize).min(count - 1))
}

/// Draws a fresh selector uniformly from `[0, 1)`.
pub fn draw_selector(rng: &mut impl Rng) -> f64 {
    rng.r#gen::<f64>()
}

/// The target types a residue may take: the configured mutations plus its current type.
pub fn type_options(mutations: &[ResidueType], current: ResidueType) -> Vec<ResidueType> {
    let mut options: Vec<ResidueType> = Vec::with_capacity(mutations.len() + 1);
    for &t in mutations.iter().chain(std::iter::once(&current)) {
        if !options.contains(&t) {
            options.push(t);
        }
    }
    options
}

/// Draws a target type uniformly from [`type_options`].
pub fn draw_type(mutations: &[ResidueType], current: ResidueType, rng: &mut impl Rng) -> ResidueType {
    type_options(mutations, current)
        .choose(rng)
        .copied()
        .unwrap_or(current)
}
