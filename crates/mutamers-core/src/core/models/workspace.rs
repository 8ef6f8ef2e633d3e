use super::system::MolecularSystem;
use std::collections::HashMap;

/// Access to the named molecular structures of a search run.
///
/// The gene never owns structures; it looks molecules up by the name used
/// in its residue specifications and mutates them in place.
pub trait MoleculeHost {
    fn find_molecule(&self, name: &str) -> Option<&MolecularSystem>;
    fn find_molecule_mut(&mut self, name: &str) -> Option<&mut MolecularSystem>;
}

/// A set of molecular structures keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    molecules: HashMap<String, MolecularSystem>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a structure under `name`, returning the one it replaces, if any.
    pub fn insert(&mut self, name: &str, system: MolecularSystem) -> Option<MolecularSystem> {
        self.molecules.insert(name.to_string(), system)
    }

    pub fn remove(&mut self, name: &str) -> Option<MolecularSystem> {
        self.molecules.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.molecules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }
}

impl MoleculeHost for Workspace {
    fn find_molecule(&self, name: &str) -> Option<&MolecularSystem> {
        self.molecules.get(name)
    }

    fn find_molecule_mut(&mut self, name: &str) -> Option<&mut MolecularSystem> {
        self.molecules.get_mut(name)
    }
}
