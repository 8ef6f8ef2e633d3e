//! # Core Models Module
//!
//! Data structures for the molecular structures a mutamers gene operates on.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom representation with coordinates, chemical type and display state
//! - [`residue`] - Residue structure and the standard [`residue::ResidueType`]s
//! - [`chain`] - Chain organization
//! - [`system`] - A complete molecular structure with all components and relationships
//! - [`topology`] - Bond connectivity
//! - [`ids`] - Slotmap handles for atoms, residues, and chains
//! - [`workspace`] - Named structures of a search run, looked up by the gene
//!
//! ## Usage
//!
//! ```ignore
//! use mutamers::core::models::{system::MolecularSystem, atom::Atom, workspace::Workspace};
//!
//! let mut system = MolecularSystem::new();
//! let chain_id = system.add_chain('A', ChainType::Protein);
//! let residue_id = system.add_residue(chain_id, 233, "SER", Some(ResidueType::Serine)).unwrap();
//! system.add_atom_to_residue(residue_id, Atom::new("CA", residue_id, Point3::origin()));
//!
//! let mut workspace = Workspace::new();
//! workspace.insert("Protein", system);
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod system;
pub mod topology;
pub mod workspace;
