//! # Rotamers Module
//!
//! Candidate side-chain conformations and the collaborators that produce and
//! post-process them.
//!
//! ## Overview
//!
//! Rotamers are discrete, empirically observed side-chain conformations. A
//! mutamers gene never builds side-chain geometry itself; it indexes into the
//! candidate lists a [`provider::RotamerProvider`] returns for a residue and a
//! target residue type.
//!
//! ## Key Components
//!
//! - [`library`] - Named rotamer libraries loaded from TOML files
//! - [`rotamer`] - Data structures for individual rotamers
//! - [`provider`] - Candidate lookup, superimposed onto a residue's backbone
//! - [`hydrogens`] - Hydrogen completion of candidate conformations
//!
//! ## Usage
//!
//! ```ignore
//! use mutamers::core::rotamers::{library::LibraryName, provider::{LibraryProvider, RotamerProvider}};
//!
//! let mut provider = LibraryProvider::new();
//! provider.load(LibraryName::Dunbrack, Path::new("dunbrack.toml"))?;
//! let candidates = provider.get_rotamers(&system, residue_id, ResidueType::Serine, LibraryName::Dunbrack)?;
//! ```

pub mod hydrogens;
pub mod library;
pub mod provider;
pub mod rotamer;
