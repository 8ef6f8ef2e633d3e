//! Shared helpers for the core models: atom-name classification and the
//! geometry used to superimpose and complete residues.

pub mod geometry;
pub mod identifiers;
