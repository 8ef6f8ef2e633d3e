use super::rotamer::Rotamer;
use crate::core::models::atom::{Atom, AtomRole};
use crate::core::utils::{
    geometry::{linear_hydrogens, planar_hydrogens, tetrahedral_hydrogens},
    identifiers::{element_of, is_backbone_atom},
};
use nalgebra::Point3;
use phf::{Map, phf_map};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{trace, warn};

/// Electron-domain geometry and total substituent count of a heavy atom.
///
/// `geometry` is the number of electron domains (4 tetrahedral, 3 trigonal
/// planar, 2 linear); `substituents` is how many atoms the center bonds to
/// once its valence is completed with hydrogens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hybridization {
    pub geometry: u8,
    pub substituents: u8,
}

impl Hybridization {
    pub const TETRAHEDRAL: Self = Self::new(4, 4);
    pub const TRIGONAL_PLANAR: Self = Self::new(3, 3);

    pub const fn new(geometry: u8, substituents: u8) -> Self {
        Self {
            geometry,
            substituents,
        }
    }
}

static HYBRIDIZATIONS: Map<&'static str, Hybridization> = phf_map! {
    "C_3" => Hybridization::new(4, 4),
    "C_2" => Hybridization::new(3, 3),
    "C_R" => Hybridization::new(3, 3),
    "C_1" => Hybridization::new(2, 2),
    "N_3" => Hybridization::new(4, 3),
    "N_2" => Hybridization::new(3, 2),
    "N_R" => Hybridization::new(3, 3),
    "O_3" => Hybridization::new(4, 2),
    "O_2" => Hybridization::new(3, 1),
    "O_R" => Hybridization::new(3, 2),
    "S_3" => Hybridization::new(4, 2),
};

/// Hybridizations that replace the table entry of specific atoms for one call.
///
/// Keyed by `(candidate index, atom index)` into the candidate slice passed to
/// [`HydrogenAdder::add_hydrogens`].
pub type HybridizationOverrides = HashMap<(usize, usize), Hybridization>;

#[derive(Debug, Error)]
pub enum HydrogenError {
    #[error("Bond in candidate {candidate} references missing atom index {index}")]
    DanglingBond { candidate: usize, index: usize },
}

/// Completes the valences of candidate conformations with explicit hydrogens.
pub trait HydrogenAdder {
    fn add_hydrogens(
        &self,
        candidates: &mut [Rotamer],
        overrides: &HybridizationOverrides,
    ) -> Result<(), HydrogenError>;
}

/// Places hydrogens with ideal geometry derived from each atom's chemical type.
///
/// Atoms whose type is unknown and that carry no override are left untouched.
/// Backbone atoms only receive hydrogens through an override, since the
/// residue a candidate is placed on keeps its own backbone.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeometricHydrogenAdder;

fn bond_length_for(element: Option<char>) -> f64 {
    match element {
        Some('C') => 1.09,
        Some('N') => 1.01,
        Some('O') => 0.96,
        Some('S') => 1.34,
        _ => 1.0,
    }
}

fn hydrogen_name(parent: &str, ordinal: usize, count: usize) -> String {
    let suffix: String = parent.trim().chars().skip(1).collect();
    if count == 1 {
        format!("H{suffix}")
    } else {
        format!("H{suffix}{}", ordinal + 1)
    }
}

impl GeometricHydrogenAdder {
    fn complete_valences(
        candidate_index: usize,
        rotamer: &mut Rotamer,
        overrides: &HybridizationOverrides,
    ) -> Result<(), HydrogenError> {
        let heavy_count = rotamer.atoms.len();
        for atom_index in 0..heavy_count {
            let atom = &rotamer.atoms[atom_index];
            if atom.is_hydrogen() {
                continue;
            }
            let overridden = overrides.get(&(candidate_index, atom_index));
            if overridden.is_none() && is_backbone_atom(&atom.name) {
                continue;
            }
            let hybridization = match overridden
                .or_else(|| HYBRIDIZATIONS.get(atom.force_field_type.as_str()))
            {
                Some(h) => *h,
                None => {
                    trace!(atom = %atom.name, ff_type = %atom.force_field_type, "No hybridization known, skipping.");
                    continue;
                }
            };

            let neighbors = rotamer
                .neighbors_of(atom_index)
                .map(|i| {
                    rotamer
                        .atoms
                        .get(i)
                        .map(|a| a.position)
                        .ok_or(HydrogenError::DanglingBond {
                            candidate: candidate_index,
                            index: i,
                        })
                })
                .collect::<Result<Vec<Point3<f64>>, _>>()?;

            let missing = (hybridization.substituents as usize).saturating_sub(neighbors.len());
            if missing == 0 {
                continue;
            }

            let bond_length = bond_length_for(element_of(&atom.name));
            let positions = match hybridization.geometry {
                4 => tetrahedral_hydrogens(&atom.position, &neighbors, bond_length),
                3 => planar_hydrogens(&atom.position, &neighbors, bond_length),
                2 => linear_hydrogens(&atom.position, &neighbors, bond_length),
                _ => Vec::new(),
            };
            if positions.len() < missing {
                warn!(
                    atom = %atom.name,
                    neighbors = neighbors.len(),
                    "Cannot place hydrogens on an atom with this many neighbors, skipping."
                );
                continue;
            }

            let parent_name = atom.name.clone();
            let residue_id = atom.residue_id;
            for (ordinal, position) in positions.into_iter().take(missing).enumerate() {
                let name = hydrogen_name(&parent_name, ordinal, missing);
                let mut hydrogen = Atom::new(&name, residue_id, position);
                hydrogen.force_field_type = "H_".to_string();
                hydrogen.role = if is_backbone_atom(&name) {
                    AtomRole::Backbone
                } else {
                    AtomRole::Sidechain
                };
                rotamer.atoms.push(hydrogen);
                rotamer.bonds.push((atom_index, rotamer.atoms.len() - 1));
            }
        }
        Ok(())
    }
}

impl HydrogenAdder for GeometricHydrogenAdder {
    fn add_hydrogens(
        &self,
        candidates: &mut [Rotamer],
        overrides: &HybridizationOverrides,
    ) -> Result<(), HydrogenError> {
        for (candidate_index, rotamer) in candidates.iter_mut().enumerate() {
            Self::complete_valences(candidate_index, rotamer, overrides)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ResidueId;

    fn atom(name: &str, ff_type: &str, position: Point3<f64>) -> Atom {
        let mut atom = Atom::new(name, ResidueId::default(), position);
        atom.force_field_type = ff_type.to_string();
        atom
    }

    fn serine(ca_type: &str) -> Rotamer {
        Rotamer {
            atoms: vec![
                atom("N", "", Point3::new(-0.525, 1.363, 0.0)),
                atom("CA", ca_type, Point3::new(0.0, 0.0, 0.0)),
                atom("C", "", Point3::new(1.526, 0.0, 0.0)),
                atom("CB", "C_3", Point3::new(-0.53, -0.77, -1.21)),
                atom("OG", "O_3", Point3::new(-0.2, -2.15, -1.1)),
            ],
            bonds: vec![(0, 1), (1, 2), (1, 3), (3, 4)],
        }
    }

    fn hydrogens_of(rotamer: &Rotamer, parent: usize) -> Vec<&Atom> {
        rotamer
            .neighbors_of(parent)
            .map(|i| &rotamer.atoms[i])
            .filter(|a| a.is_hydrogen())
            .collect()
    }

    #[test]
    fn completes_valences_from_the_type_table() {
        let mut candidates = vec![serine("C_3")];
        GeometricHydrogenAdder
            .add_hydrogens(&mut candidates, &HybridizationOverrides::new())
            .unwrap();
        let rotamer = &candidates[0];

        let cb_hydrogens = hydrogens_of(rotamer, 3);
        assert_eq!(cb_hydrogens.len(), 2);
        assert_eq!(cb_hydrogens[0].name, "HB1");
        assert_eq!(cb_hydrogens[1].name, "HB2");
        let og_hydrogens = hydrogens_of(rotamer, 4);
        assert_eq!(og_hydrogens.len(), 1);
        assert_eq!(og_hydrogens[0].name, "HG");
        assert!(((og_hydrogens[0].position - rotamer.atoms[4].position).norm() - 0.96).abs() < 1e-6);
    }

    #[test]
    fn atoms_with_unknown_types_are_skipped() {
        let mut candidates = vec![serine("_CA")];
        GeometricHydrogenAdder
            .add_hydrogens(&mut candidates, &HybridizationOverrides::new())
            .unwrap();
        assert!(hydrogens_of(&candidates[0], 1).is_empty());
        assert!(hydrogens_of(&candidates[0], 0).is_empty());
    }

    #[test]
    fn backbone_atoms_without_override_are_left_alone() {
        let mut rotamer = serine("C_3");
        rotamer.atoms[0].force_field_type = "N_R".to_string();
        rotamer.atoms[2].force_field_type = "C_2".to_string();
        rotamer.atoms.push(atom("O", "O_2", Point3::new(2.15, -1.05, 0.0)));
        rotamer.bonds.push((2, 5));
        let mut candidates = vec![rotamer];

        GeometricHydrogenAdder
            .add_hydrogens(&mut candidates, &HybridizationOverrides::new())
            .unwrap();

        let rotamer = &candidates[0];
        for backbone in [0, 1, 2, 5] {
            assert!(hydrogens_of(rotamer, backbone).is_empty());
        }
        assert!(rotamer.atoms.iter().filter(|a| a.is_hydrogen()).all(|a| !is_backbone_atom(&a.name)));
        assert_eq!(hydrogens_of(rotamer, 3).len(), 2);
    }

    #[test]
    fn planar_override_adds_nothing_to_a_saturated_alpha_carbon() {
        let mut candidates = vec![serine("C_3"), serine("_CA")];
        let mut overrides = HybridizationOverrides::new();
        overrides.insert((1, 1), Hybridization::TRIGONAL_PLANAR);

        GeometricHydrogenAdder
            .add_hydrogens(&mut candidates, &overrides)
            .unwrap();

        assert!(hydrogens_of(&candidates[0], 1).is_empty());
        assert!(hydrogens_of(&candidates[1], 1).is_empty());
        assert_eq!(hydrogens_of(&candidates[1], 3).len(), 2);
    }

    #[test]
    fn planar_override_completes_an_open_alpha_carbon() {
        let mut rotamer = serine("_CA");
        rotamer.bonds.retain(|&bond| bond != (1, 3));
        rotamer.bonds.push((0, 3));
        let mut candidates = vec![rotamer];
        let mut overrides = HybridizationOverrides::new();
        overrides.insert((0, 1), Hybridization::TRIGONAL_PLANAR);

        GeometricHydrogenAdder
            .add_hydrogens(&mut candidates, &overrides)
            .unwrap();

        let rotamer = &candidates[0];
        let ha = hydrogens_of(rotamer, 1);
        assert_eq!(ha.len(), 1);
        let ca = rotamer.atoms[1].position;
        let normal = (rotamer.atoms[0].position - ca).cross(&(rotamer.atoms[2].position - ca));
        assert!((ha[0].position - ca).dot(&normal).abs() < 1e-6);
    }

    #[test]
    fn dangling_bond_is_an_error() {
        let mut rotamer = serine("C_3");
        rotamer.bonds.push((3, 42));
        let result =
            GeometricHydrogenAdder.add_hydrogens(&mut [rotamer], &HybridizationOverrides::new());
        assert!(matches!(
            result,
            Err(HydrogenError::DanglingBond { candidate: 0, index: 42 })
        ));
    }
}
