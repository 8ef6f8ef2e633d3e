use crate::core::models::atom::Atom;
use nalgebra::{Rotation3, Vector3};
use serde::Deserialize;

/// Atom data for a single atom in a rotamer, as stored in library files.
#[derive(Debug, Clone, Deserialize)]
pub struct RotamerAtomData {
    /// The serial number of the atom within the rotamer, referenced by `bonds`.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "CB", "CG").
    pub atom_name: String,
    /// The partial charge of the atom in atomic units.
    #[serde(default)]
    pub partial_charge: f64,
    /// Cartesian coordinates in Angstroms, in the library's local frame.
    pub position: [f64; 3],
    /// The chemical-type descriptor (e.g., "C_3", "N_R", "O_2").
    #[serde(default)]
    pub force_field_type: String,
}

/// The complete data for one rotamer, suitable for deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct RotamerData {
    pub atoms: Vec<RotamerAtomData>,
    /// Bonds as pairs of atom serials.
    #[serde(default)]
    pub bonds: Vec<[usize; 2]>,
}

/// A full-residue conformation: backbone anchor atoms plus one side-chain conformation.
///
/// Rotamers returned by a rotamer provider are already superimposed onto the
/// backbone of the residue they were requested for, so their coordinates can
/// be copied straight into the structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotamer {
    pub atoms: Vec<Atom>,
    /// Bonds as index pairs into `atoms`.
    pub bonds: Vec<(usize, usize)>,
}

impl Rotamer {
    /// Returns the first atom with the given name.
    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|atom| atom.name == name)
    }

    /// Returns every atom with the given name, in rotamer order.
    pub fn atoms_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Atom> + 'a {
        self.atoms.iter().filter(move |atom| atom.name == name)
    }

    /// Applies a rigid transform to every atom.
    pub fn transform(&mut self, rotation: &Rotation3<f64>, translation: &Vector3<f64>) {
        for atom in &mut self.atoms {
            atom.position = rotation * atom.position + translation;
        }
    }

    /// Returns the indices of the atoms bonded to the atom at `index`.
    pub fn neighbors_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.bonds.iter().filter_map(move |&(a, b)| {
            if a == index {
                Some(b)
            } else if b == index {
                Some(a)
            } else {
                None
            }
        })
    }
}
