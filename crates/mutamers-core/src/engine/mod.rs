//! # Engine Module
//!
//! The stateful machinery behind a mutamers gene.
//!
//! ## Overview
//!
//! A gene's allele is a sequence of `(target residue type, selector)` pairs,
//! one per configured residue. The engine resolves residue references to live
//! residues, looks up candidate rotamers through a shared LRU cache, expresses
//! alleles as structural changes and implements the genetic operators.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Gene parameters, residue specifications and TOML loading
//! - **Allele Model** ([`allele`]) - Allele entries and selector-to-candidate mapping
//! - **Residue Table** ([`residues`]) - Logical residue references and their live handles
//! - **Rotamer Cache** ([`cache`]) - Bounded LRU candidate cache and the per-run registry
//! - **Resolver** ([`resolver`]) - Cached candidate lookup with the no-rotamer record
//! - **Expression** ([`expression`]) - Applying and hiding alleles on the host structures
//! - **Operators** ([`operators`]) - Two-point crossover and allele redraws
//! - **Structure Edits** ([`placement`], [`swap`]) - Rotamer replacement and backbone-preserving type swaps
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod allele;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod expression;
pub mod operators;
pub mod placement;
pub mod residues;
pub mod resolver;
pub mod swap;
