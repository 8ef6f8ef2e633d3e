//! # Mutamers Core Library
//!
//! A genetic-algorithm gene that explores side-chain rotamers and point
//! mutations on a fixed set of protein residues.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three layers throughout:
//!
//! - **[`core`]: The Foundation.** Stateless molecular models (`MolecularSystem`,
//!   `Workspace`), rotamer libraries and providers, hydrogen completion and geometry.
//!
//! - **[`engine`]: The Logic Core.** Alleles, the residue table, the shared LRU
//!   rotamer cache with its registry, candidate resolution, expression and the
//!   genetic operators.
//!
//! - **[`workflows`]: The Public API.** The `Mutamers` gene, which ties the
//!   `engine` and `core` together behind the operations a search framework calls.

pub mod core;
pub mod engine;
pub mod workflows;
