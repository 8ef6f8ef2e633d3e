use super::rotamer::{Rotamer, RotamerData};
use crate::core::models::{
    atom::{Atom, AtomRole},
    ids::ResidueId,
    residue::ResidueType,
};
use crate::core::utils::identifiers::is_backbone_atom;
use nalgebra::Point3;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, instrument};

/// Raw rotamer data as stored in library files: residue name to rotamer list.
type RawRotamerFile = HashMap<String, Vec<RotamerData>>;

/// The named rotamer libraries a gene can draw candidates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryName {
    Dunbrack,
    Dynameomics,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown rotamer library '{0}' (expected 'Dunbrack' or 'Dynameomics')")]
pub struct ParseLibraryNameError(pub String);

impl FromStr for LibraryName {
    type Err = ParseLibraryNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dunbrack" => Ok(Self::Dunbrack),
            "dynameomics" => Ok(Self::Dynameomics),
            _ => Err(ParseLibraryNameError(s.to_string())),
        }
    }
}

impl fmt::Display for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dunbrack => "Dunbrack",
            Self::Dynameomics => "Dynameomics",
        };
        f.write_str(name)
    }
}

/// A collection of rotamer conformations per residue type, in the library's local frame.
#[derive(Debug, Default, Clone)]
pub struct RotamerLibrary {
    pub rotamers: HashMap<ResidueType, Vec<Rotamer>>,
}

/// Errors that can occur while loading a rotamer library file.
#[derive(Debug, Error)]
pub enum LibraryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Unknown residue type '{0}' found in library file")]
    UnknownResidueType(String),
    #[error(
        "Invalid bond definition in rotamer library for residue '{residue_type}': bond references non-existent atom serial '{serial}'"
    )]
    InvalidBondSerial { residue_type: String, serial: usize },
    #[error(
        "Duplicate atom serial '{serial}' found in rotamer definition for residue '{residue_type}'"
    )]
    DuplicateAtomSerial { residue_type: String, serial: usize },
}

impl RotamerLibrary {
    /// Loads a rotamer library from a TOML file of `[[RES]]` tables.
    ///
    /// Atom roles are assigned from atom names; backbone names become
    /// [`AtomRole::Backbone`], everything else [`AtomRole::Sidechain`].
    ///
    /// # Errors
    ///
    /// Returns `LibraryLoadError::Io` if the file cannot be read.
    /// Returns `LibraryLoadError::Toml` if the file is not valid TOML.
    /// Returns `LibraryLoadError::UnknownResidueType` if unknown residues are found.
    /// Returns `LibraryLoadError::InvalidBondSerial` if bond definitions are invalid.
    /// Returns `LibraryLoadError::DuplicateAtomSerial` if duplicate serials exist.
    #[instrument(skip_all, name = "rotamer_library_load", fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, LibraryLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LibraryLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw_lib: RawRotamerFile =
            toml::from_str(&content).map_err(|e| LibraryLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut rotamers = HashMap::new();
        for (res_name, raw_rotamer_list) in raw_lib {
            let residue_type = ResidueType::from_str(&res_name)
                .map_err(|_| LibraryLoadError::UnknownResidueType(res_name.clone()))?;

            let processed = raw_rotamer_list
                .iter()
                .map(|raw| Self::process_raw_rotamer(raw, &res_name))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(
                residue = %res_name,
                count = processed.len(),
                "Loaded rotamers."
            );
            rotamers.insert(residue_type, processed);
        }

        Ok(Self { rotamers })
    }

    fn process_raw_rotamer(
        raw_rotamer_data: &RotamerData,
        res_name: &str,
    ) -> Result<Rotamer, LibraryLoadError> {
        let mut atoms = Vec::with_capacity(raw_rotamer_data.atoms.len());
        let mut serial_to_index_map = HashMap::with_capacity(raw_rotamer_data.atoms.len());
        let placeholder_residue_id = ResidueId::default();

        for (index, atom_data) in raw_rotamer_data.atoms.iter().enumerate() {
            if serial_to_index_map
                .insert(atom_data.serial, index)
                .is_some()
            {
                return Err(LibraryLoadError::DuplicateAtomSerial {
                    residue_type: res_name.to_string(),
                    serial: atom_data.serial,
                });
            }

            let mut atom = Atom::new(
                &atom_data.atom_name,
                placeholder_residue_id,
                Point3::from(atom_data.position),
            );
            atom.partial_charge = atom_data.partial_charge;
            atom.force_field_type = atom_data.force_field_type.clone();
            atom.role = if is_backbone_atom(&atom_data.atom_name) {
                AtomRole::Backbone
            } else {
                AtomRole::Sidechain
            };

            atoms.push(atom);
        }

        let lookup = |serial: usize| {
            serial_to_index_map
                .get(&serial)
                .copied()
                .ok_or_else(|| LibraryLoadError::InvalidBondSerial {
                    residue_type: res_name.to_string(),
                    serial,
                })
        };
        let bonds = raw_rotamer_data
            .bonds
            .iter()
            .map(|&[s1, s2]| Ok((lookup(s1)?, lookup(s2)?)))
            .collect::<Result<Vec<_>, LibraryLoadError>>()?;

        Ok(Rotamer { atoms, bonds })
    }

    /// Retrieves all available rotamers for a specific residue type.
    pub fn get_rotamers_for(&self, residue_type: ResidueType) -> Option<&Vec<Rotamer>> {
        self.rotamers.get(&residue_type)
    }

    /// Adds rotamers for a residue type, appending to any already present.
    pub fn insert(&mut self, residue_type: ResidueType, rotamers: Vec<Rotamer>) {
        self.rotamers.entry(residue_type).or_default().extend(rotamers);
    }
}
