use super::allele::{Allele, selector_index};
use super::context::ExpressionContext;
use super::error::EngineError;
use super::placement::{replace_with_rotamer, update_rotamer_coords};
use super::resolver::RotamerResolver;
use super::residues::{ResidueTable, molecule_mut};
use crate::core::models::{ids::AtomId, workspace::MoleculeHost};
use tracing::{debug, instrument, warn};

/// What expression did to each residue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionReport {
    /// Residues rebuilt from a candidate rotamer.
    pub replaced: usize,
    /// Residues whose coordinates were refreshed in place.
    pub refreshed: usize,
    /// Residues swapped to a type without rotamers.
    pub swapped: usize,
    /// Residues left as they were.
    pub unchanged: usize,
}

/// Applies `allele` to the residues of `residues`, in table order.
///
/// Target types without rotamers fall back to a backbone-preserving swap
/// when the live type differs. Every other failure aborts expression.
#[instrument(skip_all, fields(residues = residues.len()))]
pub fn express(
    allele: &Allele,
    residues: &ResidueTable,
    resolver: &mut RotamerResolver,
    avoid_replacement: bool,
    host: &mut dyn MoleculeHost,
    ctx: &ExpressionContext<'_>,
) -> Result<ExpressionReport, EngineError> {
    if allele.len() != residues.len() {
        return Err(EngineError::AlleleLength {
            expected: residues.len(),
            found: allele.len(),
        });
    }

    let mut report = ExpressionReport::default();
    for (index, (reference, entry)) in residues.references().iter().zip(allele.iter()).enumerate() {
        let target = entry.residue_type;
        let system = molecule_mut(host, reference)?;
        let (residue_id, residue) = residues.live_residue(index, system)?;
        let current = residue.residue_type;

        let replaced = match resolver.resolve(
            reference,
            system,
            residue_id,
            target,
            ctx.provider,
            ctx.hydrogens,
        ) {
            Err(EngineError::NoCandidates { .. }) => {
                if current == Some(target) {
                    report.unchanged += 1;
                    false
                } else {
                    debug!(residue = %reference, target = %target, "No rotamers for target, swapping type.");
                    ctx.swapper
                        .swap(system, residue_id, target)
                        .map_err(|source| EngineError::Swap {
                            reference: reference.clone(),
                            source,
                        })?;
                    report.swapped += 1;
                    true
                }
            }
            Err(e) => return Err(e),
            Ok(candidates) => {
                let chosen = selector_index(entry.selector, candidates.len())
                    .and_then(|i| candidates.get(i))
                    .ok_or(EngineError::NoCandidates {
                        residue_type: target,
                    })?;

                if avoid_replacement && current == Some(target) {
                    update_rotamer_coords(system, residue_id, chosen).map_err(|source| {
                        EngineError::Placement {
                            reference: reference.clone(),
                            source,
                        }
                    })?;
                    report.refreshed += 1;
                    false
                } else {
                    replace_with_rotamer(system, residue_id, chosen, target).map_err(|source| {
                        EngineError::Placement {
                            reference: reference.clone(),
                            source,
                        }
                    })?;
                    report.replaced += 1;
                    true
                }
            }
        };

        if replaced {
            residues.refresh(index, system)?;
        }
    }

    debug!(?report, "Allele expressed.");
    Ok(report)
}

/// Hides every atom of every resolved residue.
///
/// Leaves coordinates, the allele and the cache untouched. Residues that were
/// never resolved, or whose molecule or position no longer exists, are skipped.
///
/// # Return
///
/// The number of atoms visited.
pub fn unexpress(residues: &ResidueTable, host: &mut dyn MoleculeHost) -> usize {
    let mut hidden = 0;
    for (index, reference) in residues.references().iter().enumerate() {
        if residues.handle(index).is_none() {
            continue;
        }
        let Ok(system) = molecule_mut(host, reference) else {
            warn!(residue = %reference, "Molecule not found while hiding residue.");
            continue;
        };
        let atom_ids: Vec<AtomId> = match residues.live_residue(index, system) {
            Ok((_, residue)) => residue.atoms().to_vec(),
            Err(e) => {
                warn!(residue = %reference, error = %e, "Residue not found while hiding it.");
                continue;
            }
        };
        for atom_id in atom_ids {
            if let Some(atom) = system.atom_mut(atom_id) {
                atom.display = false;
                hidden += 1;
            }
        }
    }
    hidden
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{
        residue::ResidueType, system::MolecularSystem, workspace::Workspace,
    };
    use crate::engine::allele::AlleleEntry;
    use crate::engine::cache::RotamerCache;
    use crate::engine::config::ResidueSpec;
    use crate::engine::placement::test_support::add_residue;
    use crate::engine::resolver::test_support::CountingProvider;
    use crate::core::rotamers::library::LibraryName;
    use nalgebra::Point3;
    use std::sync::Arc;

    struct Fixture {
        workspace: Workspace,
        residues: ResidueTable,
        resolver: RotamerResolver,
    }

    fn fixture(types: &[ResidueType]) -> Fixture {
        let mut system = MolecularSystem::new();
        let mut specs = Vec::new();
        for (i, &t) in types.iter().enumerate() {
            let number = 10 + i as isize;
            add_residue(&mut system, 'A', number, t, 3.8 * i as f64);
            specs.push(ResidueSpec::new("ProtA", number, None));
        }
        let mut workspace = Workspace::new();
        workspace.insert("ProtA", system);
        let residues = ResidueTable::new(&specs);
        residues.resolve_all(&workspace).unwrap();
        let resolver = RotamerResolver::new(
            LibraryName::Dunbrack,
            false,
            Arc::new(RotamerCache::new(8)),
        );
        Fixture {
            workspace,
            residues,
            resolver,
        }
    }

    fn live_type(f: &Fixture, index: usize) -> Option<ResidueType> {
        let system = f.workspace.find_molecule("ProtA").unwrap();
        f.residues.live_residue(index, system).unwrap().1.residue_type
    }

    fn marker_x(f: &Fixture, index: usize, name: &str) -> f64 {
        let system = f.workspace.find_molecule("ProtA").unwrap();
        let (_, residue) = f.residues.live_residue(index, system).unwrap();
        let atom_id = residue.get_atom_id_by_name(name).unwrap();
        system.atom(atom_id).unwrap().position.x
    }

    #[test]
    fn selector_point_eight_picks_fourth_of_four_candidates() {
        let mut f = fixture(&[ResidueType::Serine]);
        let provider = CountingProvider::with(&[(ResidueType::Valine, 4)]);
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![AlleleEntry::new(ResidueType::Valine, 0.8)]);

        let report = express(&allele, &f.residues, &mut f.resolver, false, &mut f.workspace, &ctx)
            .unwrap();

        assert_eq!(report.replaced, 1);
        assert_eq!(live_type(&f, 0), Some(ResidueType::Valine));
        assert_eq!(marker_x(&f, 0, "XVAL"), 3.0);
    }

    #[test]
    fn glycine_target_swaps_without_provider_call() {
        let mut f = fixture(&[ResidueType::Serine]);
        let provider = CountingProvider::with(&[(ResidueType::Glycine, 2)]);
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![AlleleEntry::new(ResidueType::Glycine, 0.3)]);
        let old_handle = f.residues.handle(0).unwrap();

        let report = express(&allele, &f.residues, &mut f.resolver, false, &mut f.workspace, &ctx)
            .unwrap();

        assert_eq!(provider.calls.get(), 0);
        assert_eq!(report.swapped, 1);
        assert_ne!(f.residues.handle(0), Some(old_handle));
        assert_eq!(live_type(&f, 0), Some(ResidueType::Glycine));
    }

    #[test]
    fn no_rotamer_target_matching_live_type_is_left_alone() {
        let mut f = fixture(&[ResidueType::Alanine]);
        let provider = CountingProvider::default();
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![AlleleEntry::new(ResidueType::Alanine, 0.5)]);
        let old_handle = f.residues.handle(0);

        let report = express(&allele, &f.residues, &mut f.resolver, false, &mut f.workspace, &ctx)
            .unwrap();

        assert_eq!(report.unchanged, 1);
        assert_eq!(f.residues.handle(0), old_handle);
    }

    #[test]
    fn avoid_replacement_refreshes_coordinates_in_place() {
        let mut f = fixture(&[ResidueType::Serine, ResidueType::Valine]);
        let provider = CountingProvider::with(&[(ResidueType::Valine, 4)]);
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![
            AlleleEntry::new(ResidueType::Serine, 0.0),
            AlleleEntry::new(ResidueType::Valine, 0.0),
        ]);
        let old_handle = f.residues.handle(1);

        let report = express(&allele, &f.residues, &mut f.resolver, true, &mut f.workspace, &ctx)
            .unwrap();

        assert_eq!(report.refreshed, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(f.residues.handle(1), old_handle);
        let system = f.workspace.find_molecule("ProtA").unwrap();
        let residue = system.residue(old_handle.unwrap()).unwrap();
        let ca = residue.get_atom_id_by_name("CA").unwrap();
        assert_eq!(system.atom(ca).unwrap().position, Point3::origin());
        assert!(residue.get_atom_id_by_name("XVAL").is_none());
    }

    #[test]
    fn avoid_replacement_still_replaces_on_type_change() {
        let mut f = fixture(&[ResidueType::Serine]);
        let provider = CountingProvider::with(&[(ResidueType::Valine, 2)]);
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![AlleleEntry::new(ResidueType::Valine, 0.9)]);

        let report = express(&allele, &f.residues, &mut f.resolver, true, &mut f.workspace, &ctx)
            .unwrap();

        assert_eq!(report.replaced, 1);
        assert_eq!(marker_x(&f, 0, "XVAL"), 1.0);
    }

    #[test]
    fn hydrogenated_candidates_keep_the_residue_backbone() {
        use crate::core::models::{atom::Atom, topology::BondOrder};

        let mut f = fixture(&[ResidueType::Serine]);
        f.resolver = RotamerResolver::new(LibraryName::Dunbrack, true, Arc::new(RotamerCache::new(8)));
        let system = f.workspace.find_molecule_mut("ProtA").unwrap();
        let residue_id = f.residues.handle(0).unwrap();
        let n = system.residue(residue_id).unwrap().get_atom_id_by_name("N").unwrap();
        let h = system
            .add_atom_to_residue(residue_id, Atom::new("H", residue_id, Point3::new(-1.5, 1.4, 0.0)))
            .unwrap();
        system.add_bond(n, h, BondOrder::Single).unwrap();

        let provider = CountingProvider::with(&[(ResidueType::Valine, 2)]);
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![AlleleEntry::new(ResidueType::Valine, 0.2)]);
        express(&allele, &f.residues, &mut f.resolver, false, &mut f.workspace, &ctx).unwrap();

        let system = f.workspace.find_molecule("ProtA").unwrap();
        let (_, residue) = f.residues.live_residue(0, system).unwrap();
        let mut hydrogens: Vec<&str> = residue
            .atoms()
            .iter()
            .map(|&id| system.atom(id).unwrap())
            .filter(|a| a.is_hydrogen())
            .map(|a| a.name.as_str())
            .collect();
        hydrogens.sort_unstable();
        assert_eq!(hydrogens, vec!["H", "HB1", "HB2"]);
        let n = residue.get_atom_id_by_name("N").unwrap();
        let c = residue.get_atom_id_by_name("C").unwrap();
        assert_eq!(system.get_bonded_neighbors(n).unwrap().len(), 2);
        assert_eq!(system.get_bonded_neighbors(c).unwrap().len(), 2);
    }

    #[test]
    fn repeated_expression_uses_the_cache() {
        let mut f = fixture(&[ResidueType::Serine, ResidueType::Leucine]);
        let provider = CountingProvider::with(&[(ResidueType::Valine, 3), (ResidueType::Leucine, 2)]);
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![
            AlleleEntry::new(ResidueType::Valine, 0.1),
            AlleleEntry::new(ResidueType::Leucine, 0.6),
        ]);

        for _ in 0..3 {
            express(&allele, &f.residues, &mut f.resolver, false, &mut f.workspace, &ctx).unwrap();
        }

        assert_eq!(provider.calls.get(), 2);
        assert_eq!(live_type(&f, 1), Some(ResidueType::Leucine));
    }

    #[test]
    fn provider_failure_aborts_expression() {
        let mut f = fixture(&[ResidueType::Serine]);
        let provider = CountingProvider {
            failing: true,
            ..CountingProvider::default()
        };
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![AlleleEntry::new(ResidueType::Valine, 0.1)]);

        let result = express(&allele, &f.residues, &mut f.resolver, false, &mut f.workspace, &ctx);
        assert!(matches!(result, Err(EngineError::Provider { .. })));
    }

    #[test]
    fn mismatched_allele_length_is_rejected() {
        let mut f = fixture(&[ResidueType::Serine, ResidueType::Valine]);
        let provider = CountingProvider::default();
        let ctx = ExpressionContext::with_provider(&provider);
        let allele = Allele::new(vec![AlleleEntry::new(ResidueType::Valine, 0.1)]);

        let result = express(&allele, &f.residues, &mut f.resolver, false, &mut f.workspace, &ctx);
        assert!(matches!(
            result,
            Err(EngineError::AlleleLength { expected: 2, found: 1 })
        ));
    }

    mod unexpress_tests {
        use super::*;

        fn displayed(f: &Fixture) -> Vec<bool> {
            let system = f.workspace.find_molecule("ProtA").unwrap();
            system.atoms_iter().map(|(_, a)| a.display).collect()
        }

        #[test]
        fn hides_every_atom_and_is_idempotent() {
            let mut f = fixture(&[ResidueType::Serine, ResidueType::Valine]);
            assert!(displayed(&f).iter().all(|&d| d));

            let first = unexpress(&f.residues, &mut f.workspace);
            let after_first = displayed(&f);
            let second = unexpress(&f.residues, &mut f.workspace);

            assert_eq!(first, 10);
            assert_eq!(first, second);
            assert!(after_first.iter().all(|&d| !d));
            assert_eq!(after_first, displayed(&f));
        }

        #[test]
        fn leaves_cache_untouched() {
            let mut f = fixture(&[ResidueType::Serine]);
            let provider = CountingProvider::with(&[(ResidueType::Valine, 2)]);
            let ctx = ExpressionContext::with_provider(&provider);
            let allele = Allele::new(vec![AlleleEntry::new(ResidueType::Valine, 0.1)]);
            express(&allele, &f.residues, &mut f.resolver, false, &mut f.workspace, &ctx).unwrap();

            unexpress(&f.residues, &mut f.workspace);

            assert_eq!(f.resolver.cache().len(), 1);
        }
    }
}
