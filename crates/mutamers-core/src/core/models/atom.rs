use super::ids::ResidueId;
use nalgebra::Point3;

/// Represents the role of an atom within a residue.
///
/// Side-chain replacement only ever touches `Sidechain` atoms; `Backbone`
/// atoms are preserved across rotamer placement and residue swaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Backbone atom (e.g., N, CA, C, O).
    Backbone,
    /// Sidechain atom, part of the side group attached to CA.
    Sidechain,
    /// Ligand atom, associated with small molecules bound to the structure.
    Ligand,
    /// Water molecule atom.
    Water,
    /// Unknown or unclassified atom role.
    #[default]
    Other,
}

/// An atom of a molecular structure.
///
/// Besides geometry, an atom carries its chemical-type descriptor
/// (`force_field_type`), which drives hydrogen placement, and a `display`
/// flag that the gene clears when its structural effects are hidden.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The role of the atom in the residue.
    pub role: AtomRole,
    /// The chemical-type descriptor (e.g., "C_3", "N_R").
    pub force_field_type: String,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Whether the atom is currently shown.
    pub display: bool,
}

impl Atom {
    /// Creates a new, visible `Atom` with default values for the remaining fields.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            residue_id,
            position,
            role: AtomRole::default(),
            force_field_type: String::new(),
            partial_charge: 0.0,
            display: true,
        }
    }

    /// Returns `true` if the atom is a hydrogen (or deuterium), judged by name.
    pub fn is_hydrogen(&self) -> bool {
        !crate::core::utils::identifiers::is_heavy_atom(&self.name)
    }
}
