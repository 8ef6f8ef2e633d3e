use super::library::{LibraryLoadError, LibraryName, RotamerLibrary};
use super::rotamer::Rotamer;
use crate::core::models::{ids::ResidueId, residue::ResidueType, system::MolecularSystem};
use crate::core::utils::{geometry::superposition_transform, identifiers::ANCHOR_ATOM_NAMES};
use nalgebra::Point3;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The library has no side-chain conformations for this residue type.
    #[error("No rotamers available for residue type {0}")]
    NoRotamers(ResidueType),
    #[error("Rotamer library '{0}' is not loaded")]
    LibraryNotLoaded(LibraryName),
    #[error("Residue {0:?} does not exist in the structure")]
    ResidueNotFound(ResidueId),
    #[error("Anchor atom '{atom}' is missing from {location}")]
    MissingAnchorAtom { atom: String, location: String },
    #[error("Failed to superimpose rotamer onto the residue backbone")]
    Superposition,
}

/// A source of candidate side-chain conformations for a residue.
///
/// Implementations return full-residue conformations already placed onto the
/// backbone of `residue_id`. A residue type without side-chain freedom is
/// reported as [`ProviderError::NoRotamers`].
pub trait RotamerProvider {
    fn get_rotamers(
        &self,
        system: &MolecularSystem,
        residue_id: ResidueId,
        residue_type: ResidueType,
        library: LibraryName,
    ) -> Result<Vec<Rotamer>, ProviderError>;
}

/// A [`RotamerProvider`] backed by in-memory rotamer libraries.
#[derive(Debug, Default, Clone)]
pub struct LibraryProvider {
    libraries: HashMap<LibraryName, RotamerLibrary>,
}

impl LibraryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `library` under `name`, replacing any library already there.
    pub fn with_library(mut self, name: LibraryName, library: RotamerLibrary) -> Self {
        self.libraries.insert(name, library);
        self
    }

    /// Loads a library file and registers it under `name`.
    pub fn load(&mut self, name: LibraryName, path: &Path) -> Result<(), LibraryLoadError> {
        let library = RotamerLibrary::load(path)?;
        info!(library = %name, residue_types = library.rotamers.len(), "Rotamer library loaded.");
        self.libraries.insert(name, library);
        Ok(())
    }

    pub fn library(&self, name: LibraryName) -> Option<&RotamerLibrary> {
        self.libraries.get(&name)
    }
}

fn anchor_positions(
    find: impl Fn(&str) -> Option<Point3<f64>>,
    location: impl Fn() -> String,
) -> Result<Vec<Point3<f64>>, ProviderError> {
    ANCHOR_ATOM_NAMES
        .iter()
        .map(|&name| {
            find(name).ok_or_else(|| ProviderError::MissingAnchorAtom {
                atom: name.to_string(),
                location: location(),
            })
        })
        .collect()
}

impl RotamerProvider for LibraryProvider {
    fn get_rotamers(
        &self,
        system: &MolecularSystem,
        residue_id: ResidueId,
        residue_type: ResidueType,
        library: LibraryName,
    ) -> Result<Vec<Rotamer>, ProviderError> {
        let residue = system
            .residue(residue_id)
            .ok_or(ProviderError::ResidueNotFound(residue_id))?;
        let lib = self
            .libraries
            .get(&library)
            .ok_or(ProviderError::LibraryNotLoaded(library))?;
        let stored = match lib.get_rotamers_for(residue_type) {
            Some(rotamers) if !rotamers.is_empty() => rotamers,
            _ => return Err(ProviderError::NoRotamers(residue_type)),
        };

        let target = anchor_positions(
            |name| {
                residue
                    .get_atom_id_by_name(name)
                    .and_then(|id| system.atom(id))
                    .map(|atom| atom.position)
            },
            || format!("residue {} {}", residue.residue_number, residue.name),
        )?;

        stored
            .iter()
            .map(|template| {
                let source = anchor_positions(
                    |name| template.atom(name).map(|atom| atom.position),
                    || format!("{library} rotamer for {residue_type}"),
                )?;
                let (rotation, translation) =
                    superposition_transform(&source, &target).ok_or(ProviderError::Superposition)?;

                let mut placed = template.clone();
                placed.transform(&rotation, &translation);
                for atom in &mut placed.atoms {
                    atom.residue_id = residue_id;
                }
                Ok(placed)
            })
            .collect()
    }
}
