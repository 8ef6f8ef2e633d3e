use super::config::ResidueSpec;
use super::error::EngineError;
use crate::core::models::{
    ids::ResidueId, residue::Residue, system::MolecularSystem, workspace::MoleculeHost,
};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Finds the single residue a reference points at in `system`.
///
/// A position without a chain must be unique across chains.
pub fn resolve_residue(
    system: &MolecularSystem,
    reference: &ResidueSpec,
) -> Result<ResidueId, EngineError> {
    let matches = system.find_residues(reference.position.number, reference.position.chain);
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(EngineError::lookup(reference, "no residue at this position")),
        many => Err(EngineError::lookup(
            reference,
            format!(
                "{} residues share this position; add a chain identifier",
                many.len()
            ),
        )),
    }
}

/// Logical residue references and the live handles they currently resolve to.
///
/// References are fixed at construction and keep their order. Handles are
/// refreshed whenever an operation re-creates a residue. The table is shared
/// between a gene and its duplicates.
#[derive(Debug)]
pub struct ResidueTable {
    references: Vec<ResidueSpec>,
    handles: RwLock<Vec<Option<ResidueId>>>,
}

impl ResidueTable {
    /// Creates an unresolved table. Repeated references are kept once, at their first position.
    pub fn new(references: &[ResidueSpec]) -> Self {
        let mut unique: Vec<ResidueSpec> = Vec::with_capacity(references.len());
        for reference in references {
            if !unique.contains(reference) {
                unique.push(reference.clone());
            }
        }
        let handles = RwLock::new(vec![None; unique.len()]);
        Self {
            references: unique,
            handles,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Option<ResidueId>>> {
        self.handles.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Option<ResidueId>>> {
        self.handles.write().unwrap_or_else(|p| p.into_inner())
    }

    pub fn references(&self) -> &[ResidueSpec] {
        &self.references
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn handle(&self, index: usize) -> Option<ResidueId> {
        self.read().get(index).copied().flatten()
    }

    pub fn is_resolved(&self) -> bool {
        self.read().iter().all(Option::is_some)
    }

    /// Resolves every reference against the molecules of `host`.
    pub fn resolve_all(&self, host: &dyn MoleculeHost) -> Result<(), EngineError> {
        let resolved = self
            .references
            .iter()
            .map(|reference| {
                let system = molecule(host, reference)?;
                resolve_residue(system, reference)
            })
            .collect::<Result<Vec<_>, _>>()?;
        *self.write() = resolved.into_iter().map(Some).collect();
        Ok(())
    }

    /// Re-resolves the reference at `index` after its residue was re-created.
    pub fn refresh(&self, index: usize, system: &MolecularSystem) -> Result<ResidueId, EngineError> {
        let reference = self
            .references
            .get(index)
            .ok_or(EngineError::NotReady)?;
        let id = resolve_residue(system, reference)?;
        if let Some(slot) = self.write().get_mut(index) {
            *slot = Some(id);
        }
        debug!(residue = %reference, "Residue handle refreshed.");
        Ok(id)
    }

    /// The live residue behind the reference at `index`.
    ///
    /// A handle invalidated by another gene re-creating the residue is
    /// re-resolved by position and stored.
    pub fn live_residue<'a>(
        &self,
        index: usize,
        system: &'a MolecularSystem,
    ) -> Result<(ResidueId, &'a Residue), EngineError> {
        let reference = self.references.get(index).ok_or(EngineError::NotReady)?;
        let id = self.handle(index).ok_or(EngineError::NotReady)?;
        if let Some(residue) = system.residue(id) {
            return Ok((id, residue));
        }
        let id = self.refresh(index, system)?;
        let residue = system
            .residue(id)
            .ok_or_else(|| EngineError::lookup(reference, "residue handle is stale"))?;
        Ok((id, residue))
    }
}

pub(crate) fn molecule<'a>(
    host: &'a dyn MoleculeHost,
    reference: &ResidueSpec,
) -> Result<&'a MolecularSystem, EngineError> {
    host.find_molecule(&reference.molecule)
        .ok_or_else(|| EngineError::lookup(reference, "no molecule with this name"))
}

pub(crate) fn molecule_mut<'a>(
    host: &'a mut dyn MoleculeHost,
    reference: &ResidueSpec,
) -> Result<&'a mut MolecularSystem, EngineError> {
    host.find_molecule_mut(&reference.molecule)
        .ok_or_else(|| EngineError::lookup(reference, "no molecule with this name"))
}
