use super::cache::{CacheKey, Candidates, RotamerCache};
use super::config::ResidueSpec;
use super::error::EngineError;
use crate::core::models::{ids::ResidueId, residue::ResidueType, system::MolecularSystem};
use crate::core::rotamers::{
    hydrogens::{Hybridization, HybridizationOverrides, HydrogenAdder},
    library::LibraryName,
    provider::{ProviderError, RotamerProvider},
    rotamer::Rotamer,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Placeholder type given to alpha carbons while hydrogens are added, so that
/// only the explicit override decides their geometry.
const ALPHA_CARBON_PLACEHOLDER: &str = "_CA";

/// Residue types seeded as having no side-chain rotamers.
pub const SEEDED_NO_ROTAMER_TYPES: [ResidueType; 2] = [ResidueType::Alanine, ResidueType::Glycine];

/// Looks up candidate rotamers for a residue and target type.
///
/// Consults the shared cache first and remembers residue types the provider
/// reported as having no rotamers.
#[derive(Debug, Clone)]
pub struct RotamerResolver {
    library: LibraryName,
    hydrogens: bool,
    cache: Arc<RotamerCache>,
    no_rotamers: HashSet<ResidueType>,
}

impl RotamerResolver {
    pub fn new(library: LibraryName, hydrogens: bool, cache: Arc<RotamerCache>) -> Self {
        Self {
            library,
            hydrogens,
            cache,
            no_rotamers: SEEDED_NO_ROTAMER_TYPES.into_iter().collect(),
        }
    }

    pub fn cache(&self) -> &Arc<RotamerCache> {
        &self.cache
    }

    pub fn library(&self) -> LibraryName {
        self.library
    }

    pub fn no_rotamer_types(&self) -> &HashSet<ResidueType> {
        &self.no_rotamers
    }

    pub fn has_no_rotamers(&self, residue_type: ResidueType) -> bool {
        self.no_rotamers.contains(&residue_type)
    }

    /// Returns the candidate rotamers of `target` at `reference`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoCandidates` when `target` has no rotamers, and
    /// wraps every other provider or hydrogen failure.
    #[instrument(skip_all, fields(residue = %reference, target = %target))]
    pub fn resolve(
        &mut self,
        reference: &ResidueSpec,
        system: &MolecularSystem,
        residue_id: ResidueId,
        target: ResidueType,
        provider: &dyn RotamerProvider,
        hydrogens: &dyn HydrogenAdder,
    ) -> Result<Candidates, EngineError> {
        if self.no_rotamers.contains(&target) {
            return Err(EngineError::NoCandidates {
                residue_type: target,
            });
        }

        let key = CacheKey::new(reference, target);
        if let Some(candidates) = self.cache.get(&key) {
            return Ok(candidates);
        }

        if system.residue(residue_id).is_none() {
            return Err(EngineError::lookup(reference, "residue handle is stale"));
        }

        debug!("Rotamer cache miss, querying provider.");
        let mut rotamers = match provider.get_rotamers(system, residue_id, target, self.library) {
            Ok(rotamers) if !rotamers.is_empty() => rotamers,
            Ok(_) | Err(ProviderError::NoRotamers(_)) => {
                debug!("No rotamers for this type, remembering it.");
                self.no_rotamers.insert(target);
                return Err(EngineError::NoCandidates {
                    residue_type: target,
                });
            }
            Err(source) => {
                return Err(EngineError::Provider {
                    reference: reference.clone(),
                    source,
                });
            }
        };

        if self.hydrogens {
            add_hydrogens_with_planar_alpha_carbons(&mut rotamers, hydrogens)?;
        }

        let candidates: Candidates = rotamers.into();
        self.cache.put(key, Arc::clone(&candidates));
        Ok(candidates)
    }
}

/// Completes candidates with hydrogens, placing alpha-carbon hydrogens with
/// trigonal-planar geometry.
///
/// Tetrahedral alpha hydrogens tend to collide with the next residue's
/// nitrogen. Alpha-carbon types are swapped for a placeholder during the call
/// and restored afterwards, also when hydrogen addition fails.
fn add_hydrogens_with_planar_alpha_carbons(
    rotamers: &mut [Rotamer],
    adder: &dyn HydrogenAdder,
) -> Result<(), EngineError> {
    let mut overrides = HybridizationOverrides::new();
    let mut original_types = Vec::new();
    for (candidate, rotamer) in rotamers.iter_mut().enumerate() {
        for (index, atom) in rotamer.atoms.iter_mut().enumerate() {
            if atom.name == "CA" {
                overrides.insert((candidate, index), Hybridization::TRIGONAL_PLANAR);
                let original =
                    std::mem::replace(&mut atom.force_field_type, ALPHA_CARBON_PLACEHOLDER.to_string());
                original_types.push((candidate, index, original));
            }
        }
    }

    let result = adder.add_hydrogens(rotamers, &overrides);

    for (candidate, index, original) in original_types {
        if let Some(atom) = rotamers
            .get_mut(candidate)
            .and_then(|r| r.atoms.get_mut(index))
        {
            atom.force_field_type = original;
        }
    }

    result.map_err(EngineError::from)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::rotamers::hydrogens::HydrogenError;
    use nalgebra::Point3;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// A provider that returns a fixed number of candidates per type and counts calls.
    #[derive(Default)]
    pub struct CountingProvider {
        pub counts: HashMap<ResidueType, usize>,
        pub calls: Cell<usize>,
        pub failing: bool,
    }

    impl CountingProvider {
        pub fn with(counts: &[(ResidueType, usize)]) -> Self {
            Self {
                counts: counts.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    /// Builds candidate `index` of `residue_type`: a typed backbone plus CB and a marker atom.
    pub fn candidate(residue_id: ResidueId, residue_type: ResidueType, index: usize) -> Rotamer {
        let typed = |name: &str, ff_type: &str, position: Point3<f64>| {
            let mut atom = Atom::new(name, residue_id, position);
            atom.force_field_type = ff_type.to_string();
            atom
        };
        let marker_x = index as f64;
        Rotamer {
            atoms: vec![
                typed("N", "N_R", Point3::new(-0.525, 1.363, 0.0)),
                typed("CA", "C_3", Point3::origin()),
                typed("C", "C_2", Point3::new(1.526, 0.0, 0.0)),
                typed("CB", "C_3", Point3::new(-0.53, -0.77, -1.21)),
                Atom::new(
                    &format!("X{}", residue_type.to_three_letter()),
                    residue_id,
                    Point3::new(marker_x, -2.0, -2.0),
                ),
                typed("O", "O_2", Point3::new(2.15, -1.05, 0.0)),
            ],
            bonds: vec![(0, 1), (1, 2), (1, 3), (3, 4), (2, 5)],
        }
    }

    impl RotamerProvider for CountingProvider {
        fn get_rotamers(
            &self,
            system: &MolecularSystem,
            residue_id: ResidueId,
            residue_type: ResidueType,
            _library: LibraryName,
        ) -> Result<Vec<Rotamer>, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            if self.failing {
                return Err(ProviderError::Superposition);
            }
            if system.residue(residue_id).is_none() {
                return Err(ProviderError::ResidueNotFound(residue_id));
            }
            match self.counts.get(&residue_type) {
                Some(&n) if n > 0 => Ok((0..n)
                    .map(|i| candidate(residue_id, residue_type, i))
                    .collect()),
                _ => Err(ProviderError::NoRotamers(residue_type)),
            }
        }
    }

    /// A hydrogen adder that records the CA types and overrides it was called with.
    #[derive(Default)]
    pub struct RecordingAdder {
        pub seen_ca_types: RefCell<Vec<String>>,
        pub seen_overrides: RefCell<Vec<(usize, usize)>>,
    }

    impl HydrogenAdder for RecordingAdder {
        fn add_hydrogens(
            &self,
            candidates: &mut [Rotamer],
            overrides: &HybridizationOverrides,
        ) -> Result<(), HydrogenError> {
            for rotamer in candidates.iter() {
                if let Some(ca) = rotamer.atom("CA") {
                    self.seen_ca_types.borrow_mut().push(ca.force_field_type.clone());
                }
            }
            let mut keys: Vec<_> = overrides.keys().copied().collect();
            keys.sort();
            self.seen_overrides.borrow_mut().extend(keys);
            Ok(())
        }
    }
}
