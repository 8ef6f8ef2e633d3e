//! # Core Module
//!
//! The molecular building blocks a mutamers gene works on.
//!
//! ## Overview
//!
//! The core module holds the stateless pieces: the structures the host owns,
//! the rotamer candidates that can be placed onto them, and the geometry both
//! rely on. Nothing here knows about alleles, caches or genetic operators.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, systems and the named workspace
//! - **Conformational Libraries** ([`rotamers`]) - Rotamer libraries, candidate providers and hydrogen completion
//! - **Utilities** ([`utils`]) - Backbone atom classification and superposition geometry

pub mod models;
pub mod rotamers;
pub mod utils;
