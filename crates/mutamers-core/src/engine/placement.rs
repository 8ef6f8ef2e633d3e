use crate::core::models::{
    atom::{Atom, AtomRole},
    ids::{AtomId, ResidueId},
    residue::ResidueType,
    system::MolecularSystem,
};
use crate::core::rotamers::rotamer::Rotamer;
use crate::core::utils::identifiers::is_backbone_atom;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Residue {0:?} does not exist in the structure")]
    ResidueNotFound(ResidueId),

    #[error("Rotamer bond references missing atom index {index}")]
    InvalidRotamerBond { index: usize },
}

/// The backbone atoms of a residue together with the bonds between them.
pub(crate) struct RetainedBackbone {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<(usize, usize)>,
    pub index_by_name: HashMap<String, usize>,
}

/// Copies the backbone atoms of `residue_id` and their mutual bonds.
pub(crate) fn retained_backbone(
    system: &MolecularSystem,
    residue_id: ResidueId,
) -> Option<RetainedBackbone> {
    system.residue(residue_id)?;

    let mut atoms = Vec::new();
    let mut index_of: HashMap<AtomId, usize> = HashMap::new();
    let mut index_by_name = HashMap::new();
    for (atom_id, atom) in system.residue_atoms(residue_id) {
        if !is_backbone_atom(&atom.name) {
            continue;
        }
        let mut kept = atom.clone();
        kept.role = AtomRole::Backbone;
        index_of.insert(atom_id, atoms.len());
        index_by_name.entry(atom.name.clone()).or_insert(atoms.len());
        atoms.push(kept);
    }

    let mut seen = HashSet::new();
    let mut bonds = Vec::new();
    for (&atom_id, &i) in &index_of {
        for neighbor in system.get_bonded_neighbors(atom_id).unwrap_or(&[]) {
            if let Some(&j) = index_of.get(neighbor) {
                let pair = (i.min(j), i.max(j));
                if seen.insert(pair) {
                    bonds.push(pair);
                }
            }
        }
    }
    bonds.sort_unstable();

    Some(RetainedBackbone {
        atoms,
        bonds,
        index_by_name,
    })
}

/// Rebuilds a residue from its own backbone and the side chain of `rotamer`.
///
/// Only side-chain atoms of the rotamer, hydrogens included, are transferred.
/// Its backbone atoms stand in for the residue's same-named atoms when bonds
/// are mapped and are otherwise dropped. The residue is re-created, so
/// `residue_id` is invalid afterwards.
///
/// # Return
///
/// The handle of the rebuilt residue.
pub fn replace_with_rotamer(
    system: &mut MolecularSystem,
    residue_id: ResidueId,
    rotamer: &Rotamer,
    residue_type: ResidueType,
) -> Result<ResidueId, PlacementError> {
    let RetainedBackbone {
        mut atoms,
        mut bonds,
        index_by_name,
    } = retained_backbone(system, residue_id).ok_or(PlacementError::ResidueNotFound(residue_id))?;

    let backbone_count = atoms.len();
    let mut rotamer_to_new: HashMap<usize, usize> = HashMap::new();
    for (index, atom) in rotamer.atoms.iter().enumerate() {
        if is_backbone_atom(&atom.name) {
            if let Some(&kept) = index_by_name.get(atom.name.trim()) {
                rotamer_to_new.insert(index, kept);
            }
            continue;
        }
        let mut added = atom.clone();
        added.residue_id = residue_id;
        added.role = AtomRole::Sidechain;
        rotamer_to_new.insert(index, atoms.len());
        atoms.push(added);
    }

    for &(a, b) in &rotamer.bonds {
        for index in [a, b] {
            if index >= rotamer.atoms.len() {
                return Err(PlacementError::InvalidRotamerBond { index });
            }
        }
        // Bonds to rotamer backbone atoms the residue lacks are dropped with them.
        let (Some(&i), Some(&j)) = (rotamer_to_new.get(&a), rotamer_to_new.get(&b)) else {
            continue;
        };
        if i < backbone_count && j < backbone_count {
            continue;
        }
        let pair = (i.min(j), i.max(j));
        if i != j && !bonds.contains(&pair) {
            bonds.push(pair);
        }
    }

    system
        .replace_residue(
            residue_id,
            residue_type.to_three_letter(),
            Some(residue_type),
            atoms,
            &bonds,
        )
        .ok_or(PlacementError::ResidueNotFound(residue_id))
}

/// Copies rotamer coordinates onto the same-named atoms of a residue in place.
///
/// Atoms are paired by name, in order, when several share a name. Atoms of
/// either side without a counterpart are left alone.
///
/// # Return
///
/// The number of atoms whose coordinates were updated.
pub fn update_rotamer_coords(
    system: &mut MolecularSystem,
    residue_id: ResidueId,
    rotamer: &Rotamer,
) -> Result<usize, PlacementError> {
    if system.residue(residue_id).is_none() {
        return Err(PlacementError::ResidueNotFound(residue_id));
    }

    let mut by_name: HashMap<&str, Vec<AtomId>> = HashMap::new();
    for (atom_id, atom) in system.residue_atoms(residue_id) {
        by_name.entry(atom.name.as_str()).or_default().push(atom_id);
    }

    let mut updates: Vec<(AtomId, Point3<f64>)> = Vec::new();
    let mut names_done = HashSet::new();
    for atom in &rotamer.atoms {
        if !names_done.insert(atom.name.as_str()) {
            continue;
        }
        if let Some(targets) = by_name.get(atom.name.as_str()) {
            updates.extend(
                targets
                    .iter()
                    .zip(rotamer.atoms_named(&atom.name))
                    .map(|(&id, source)| (id, source.position)),
            );
        }
    }

    let count = updates.len();
    for (atom_id, position) in updates {
        if let Some(atom) = system.atom_mut(atom_id) {
            atom.position = position;
        }
    }
    Ok(count)
}
