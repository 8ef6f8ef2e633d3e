use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::{Residue, ResidueType};
use super::topology::{Bond, BondOrder};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{HashMap, HashSet};

/// Represents a complete molecular structure with atoms, residues, chains, and bonds.
///
/// Residues are addressed by slotmap handles. A handle stays valid as long as
/// the residue exists; operations that rebuild a residue (see
/// [`MolecularSystem::replace_residue`]) issue a fresh handle, so callers
/// holding the old one must look the residue up again by position.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains.
    chains: SlotMap<ChainId, Chain>,
    /// List of all bonds in the system.
    bonds: Vec<Bond>,
    /// Lookup map for finding residues by chain ID and residue number.
    residue_id_map: HashMap<(ChainId, isize), ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
    /// Cached adjacency list for bond connectivity, indexed by atom ID.
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residues.iter()
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chains.iter()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Finds a residue ID by its chain ID and residue number.
    pub fn find_residue_by_id(
        &self,
        chain_id: ChainId,
        residue_number: isize,
    ) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, residue_number))
            .copied()
    }

    /// Finds all residues with the given sequence number.
    ///
    /// When `chain` is given only that chain is searched. Otherwise every
    /// chain is searched and the matches are returned ordered by chain
    /// identifier.
    ///
    /// # Return
    ///
    /// The IDs of all matching residues; empty if there is none.
    pub fn find_residues(&self, residue_number: isize, chain: Option<char>) -> Vec<ResidueId> {
        let mut chain_ids: Vec<(char, ChainId)> = match chain {
            Some(id) => self
                .find_chain_by_id(id)
                .map(|chain_id| vec![(id, chain_id)])
                .unwrap_or_default(),
            None => self.chain_id_map.iter().map(|(&c, &id)| (c, id)).collect(),
        };
        chain_ids.sort_by_key(|&(c, _)| c);

        chain_ids
            .into_iter()
            .filter_map(|(_, chain_id)| self.find_residue_by_id(chain_id, residue_number))
            .collect()
    }

    /// Returns the atoms of a residue, in residue order.
    pub fn residue_atoms(&self, residue_id: ResidueId) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.residues
            .get(residue_id)
            .map(|residue| residue.atoms())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.atoms.get(id).map(|atom| (id, atom)))
    }

    /// Adds a new chain to the system or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given ID already exists,
    /// it returns the existing chain ID without creating a duplicate.
    pub fn add_chain(&mut self, id: char, chain_type: ChainType) -> ChainId {
        *self.chain_id_map.entry(id).or_insert_with(|| {
            let chain = Chain::new(id, chain_type);
            self.chains.insert(chain)
        })
    }

    /// Adds a new residue to the system or returns the existing one.
    ///
    /// This method is idempotent; if a residue with the given chain ID and
    /// residue number already exists, it returns the existing residue ID.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if successful, otherwise `None` (e.g., if chain doesn't exist).
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        name: &str,
        residue_type: Option<ResidueType>,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        let key = (chain_id, residue_number);

        let residue_id = *self.residue_id_map.entry(key).or_insert_with(|| {
            let residue = Residue::new(residue_number, name, residue_type, chain_id);
            self.residues.insert(residue)
        });

        if !chain.residues.contains(&residue_id) {
            chain.residues.push(residue_id);
        }

        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (e.g., if residue doesn't exist).
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        let residue = self.residues.get_mut(residue_id)?;

        atom.residue_id = residue_id;
        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        residue.add_atom(&name, atom_id);
        self.bond_adjacency.insert(atom_id, Vec::new());

        Some(atom_id)
    }

    /// Adds a bond between two atoms.
    ///
    /// Adding an existing bond succeeds without creating a duplicate.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if successful, otherwise `None` (e.g., if atoms don't exist).
    pub fn add_bond(&mut self, atom1_id: AtomId, atom2_id: AtomId, order: BondOrder) -> Option<()> {
        if !self.atoms.contains_key(atom1_id) || !self.atoms.contains_key(atom2_id) {
            return None;
        }

        if let Some(neighbors) = self.bond_adjacency.get(atom1_id) {
            if neighbors.contains(&atom2_id) {
                return Some(());
            }
        }

        self.bonds.push(Bond::new(atom1_id, atom2_id, order));
        self.bond_adjacency.get_mut(atom1_id)?.push(atom2_id);
        self.bond_adjacency.get_mut(atom2_id)?.push(atom1_id);
        Some(())
    }

    /// Removes an atom, its bonds and its membership in the parent residue.
    ///
    /// # Return
    ///
    /// Returns `Some(Atom)` if the atom existed and was removed, otherwise `None`.
    pub fn remove_atom(&mut self, atom_id: AtomId) -> Option<Atom> {
        let atom = self.atoms.remove(atom_id)?;

        if let Some(residue) = self.residues.get_mut(atom.residue_id) {
            residue.remove_atom(&atom.name, atom_id);
        }

        self.bonds.retain(|bond| !bond.contains(atom_id));

        let neighbors = self.bond_adjacency.remove(atom_id).unwrap_or_default();
        for neighbor_id in neighbors {
            if let Some(adjacency) = self.bond_adjacency.get_mut(neighbor_id) {
                adjacency.retain(|&id| id != atom_id);
            }
        }

        Some(atom)
    }

    /// Removes a residue with all its atoms, updating the parent chain.
    ///
    /// # Return
    ///
    /// Returns `Some(Residue)` if the residue existed and was removed, otherwise `None`.
    pub fn remove_residue(&mut self, residue_id: ResidueId) -> Option<Residue> {
        let atom_ids = self.residues.get(residue_id)?.atoms().to_vec();
        for atom_id in atom_ids {
            self.remove_atom(atom_id);
        }

        let residue = self.residues.remove(residue_id)?;
        if let Some(chain) = self.chains.get_mut(residue.chain_id) {
            chain.residues.retain(|&id| id != residue_id);
        }
        self.residue_id_map
            .remove(&(residue.chain_id, residue.residue_number));

        Some(residue)
    }

    /// Rebuilds a residue from a new set of atoms.
    ///
    /// The old residue and all its atoms are removed and a new residue is
    /// created at the same chain, sequence number and chain position. Bonds
    /// between the old residue and the rest of the structure are re-attached
    /// to the new atom of the same name, when there is one.
    ///
    /// # Arguments
    ///
    /// * `residue_id` - The residue to rebuild. This handle is invalid afterwards.
    /// * `name` - The name of the new residue.
    /// * `residue_type` - The type of the new residue.
    /// * `atoms` - The atoms of the new residue.
    /// * `bonds` - Intra-residue bonds as index pairs into `atoms`.
    ///
    /// # Return
    ///
    /// The handle of the new residue, or `None` if `residue_id` does not exist.
    pub fn replace_residue(
        &mut self,
        residue_id: ResidueId,
        name: &str,
        residue_type: Option<ResidueType>,
        atoms: Vec<Atom>,
        bonds: &[(usize, usize)],
    ) -> Option<ResidueId> {
        let old = self.residues.get(residue_id)?;
        let chain_id = old.chain_id;
        let residue_number = old.residue_number;
        let chain_index = self
            .chains
            .get(chain_id)?
            .residues
            .iter()
            .position(|&id| id == residue_id)?;

        let old_atoms: HashSet<AtomId> = old.atoms().iter().copied().collect();
        let external_bonds: Vec<(String, AtomId, BondOrder)> = self
            .bonds
            .iter()
            .filter_map(|bond| {
                let (inside, outside) = match (
                    old_atoms.contains(&bond.atom1_id),
                    old_atoms.contains(&bond.atom2_id),
                ) {
                    (true, false) => (bond.atom1_id, bond.atom2_id),
                    (false, true) => (bond.atom2_id, bond.atom1_id),
                    _ => return None,
                };
                let name = self.atoms.get(inside)?.name.clone();
                Some((name, outside, bond.order))
            })
            .collect();

        self.remove_residue(residue_id)?;

        let new_id = self
            .residues
            .insert(Residue::new(residue_number, name, residue_type, chain_id));
        self.residue_id_map.insert((chain_id, residue_number), new_id);
        if let Some(chain) = self.chains.get_mut(chain_id) {
            let index = chain_index.min(chain.residues.len());
            chain.residues.insert(index, new_id);
        }

        let mut new_atom_ids = Vec::with_capacity(atoms.len());
        for atom in atoms {
            new_atom_ids.push(self.add_atom_to_residue(new_id, atom)?);
        }
        for &(i, j) in bonds {
            if let (Some(&a), Some(&b)) = (new_atom_ids.get(i), new_atom_ids.get(j)) {
                self.add_bond(a, b, BondOrder::Single);
            }
        }
        for (atom_name, partner, order) in external_bonds {
            if let Some(local) = self
                .residues
                .get(new_id)
                .and_then(|r| r.get_atom_id_by_name(&atom_name))
            {
                self.add_bond(local, partner, order);
            }
        }

        Some(new_id)
    }

    /// Retrieves the bonded neighbors of an atom.
    pub fn get_bonded_neighbors(&self, atom_id: AtomId) -> Option<&[AtomId]> {
        self.bond_adjacency.get(atom_id).map(|v| v.as_slice())
    }
}
