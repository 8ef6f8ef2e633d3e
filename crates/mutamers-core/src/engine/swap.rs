use super::placement::{RetainedBackbone, retained_backbone};
use crate::core::models::{
    atom::{Atom, AtomRole},
    ids::ResidueId,
    residue::ResidueType,
    system::MolecularSystem,
};
use crate::core::utils::geometry::ideal_cb_position;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Residue {0:?} does not exist in the structure")]
    ResidueNotFound(ResidueId),

    #[error("Backbone atom '{atom}' is required to build a side chain but is missing")]
    MissingBackboneAtom { atom: &'static str },
}

/// Changes the residue type at a position while preserving its backbone.
pub trait ResidueSwapper {
    fn swap(
        &self,
        system: &mut MolecularSystem,
        residue_id: ResidueId,
        target: ResidueType,
    ) -> Result<(), SwapError>;
}

/// Swaps a residue down to its backbone plus an ideal beta carbon.
///
/// The side chain is dropped entirely. Unless the target is glycine, a `CB`
/// is rebuilt from the `N`, `CA` and `C` positions. The residue is
/// re-created, so the old handle is invalid afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackboneSwapper;

impl ResidueSwapper for BackboneSwapper {
    fn swap(
        &self,
        system: &mut MolecularSystem,
        residue_id: ResidueId,
        target: ResidueType,
    ) -> Result<(), SwapError> {
        let RetainedBackbone {
            mut atoms,
            mut bonds,
            index_by_name,
        } = retained_backbone(system, residue_id).ok_or(SwapError::ResidueNotFound(residue_id))?;

        if target != ResidueType::Glycine {
            let position_of = |name: &'static str| {
                index_by_name
                    .get(name)
                    .map(|&i| atoms[i].position)
                    .ok_or(SwapError::MissingBackboneAtom { atom: name })
            };
            let n = position_of("N")?;
            let ca = position_of("CA")?;
            let c = position_of("C")?;
            let ca_index = index_by_name["CA"];

            let mut cb = Atom::new("CB", residue_id, ideal_cb_position(&n, &ca, &c));
            cb.role = AtomRole::Sidechain;
            cb.force_field_type = "C_3".to_string();
            atoms.push(cb);
            bonds.push((ca_index, atoms.len() - 1));
        }

        debug!(residue = ?residue_id, target = %target, "Swapping residue type.");
        system
            .replace_residue(
                residue_id,
                target.to_three_letter(),
                Some(target),
                atoms,
                &bonds,
            )
            .map(|_| ())
            .ok_or(SwapError::ResidueNotFound(residue_id))
    }
}
