use super::ids::{AtomId, ChainId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The twenty standard amino-acid residue types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueType {
    // --- Aliphatic, Nonpolar ---
    Alanine,    // ALA
    Glycine,    // GLY
    Isoleucine, // ILE
    Leucine,    // LEU
    Proline,    // PRO
    Valine,     // VAL

    // --- Aromatic ---
    Phenylalanine, // PHE
    Tryptophan,    // TRP
    Tyrosine,      // TYR

    // --- Polar, Uncharged ---
    Asparagine, // ASN
    Cysteine,   // CYS
    Glutamine,  // GLN
    Serine,     // SER
    Threonine,  // THR
    Methionine, // MET

    // --- Positively Charged (Basic) ---
    Arginine,  // ARG
    Lysine,    // LYS
    Histidine, // HIS

    // --- Negatively Charged (Acidic) ---
    AsparticAcid, // ASP
    GlutamicAcid, // GLU
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown residue three-letter code '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl ResidueType {
    pub const ALL: [ResidueType; 20] = [
        ResidueType::Alanine,
        ResidueType::Glycine,
        ResidueType::Isoleucine,
        ResidueType::Leucine,
        ResidueType::Proline,
        ResidueType::Valine,
        ResidueType::Phenylalanine,
        ResidueType::Tryptophan,
        ResidueType::Tyrosine,
        ResidueType::Asparagine,
        ResidueType::Cysteine,
        ResidueType::Glutamine,
        ResidueType::Serine,
        ResidueType::Threonine,
        ResidueType::Methionine,
        ResidueType::Arginine,
        ResidueType::Lysine,
        ResidueType::Histidine,
        ResidueType::AsparticAcid,
        ResidueType::GlutamicAcid,
    ];

    pub fn to_three_letter(self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Glycine => "GLY",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Leucine => "LEU",
            ResidueType::Proline => "PRO",
            ResidueType::Valine => "VAL",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
            ResidueType::Asparagine => "ASN",
            ResidueType::Cysteine => "CYS",
            ResidueType::Glutamine => "GLN",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Methionine => "MET",
            ResidueType::Arginine => "ARG",
            ResidueType::Lysine => "LYS",
            ResidueType::Histidine => "HIS",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::GlutamicAcid => "GLU",
        }
    }
}

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        // Protonation-state variants of histidine map onto the generic type.
        let code = match code.as_str() {
            "HSE" | "HSD" | "HSP" | "HID" | "HIE" | "HIP" => "HIS",
            other => other,
        };
        ResidueType::ALL
            .iter()
            .copied()
            .find(|t| t.to_three_letter() == code)
            .ok_or_else(|| ParseResidueTypeError(s.to_string()))
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_three_letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub residue_number: isize,              // Residue sequence number from source file
    pub name: String,                       // Name of the residue (e.g., "ALA", "GLY")
    pub residue_type: Option<ResidueType>,  // Standard type, `None` for ligands and waters
    pub chain_id: ChainId,                  // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,          // Atoms belonging to this residue, in insertion order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(
        residue_number: isize,
        name: &str,
        residue_type: Option<ResidueType>,
        chain_id: ChainId,
    ) -> Self {
        Self {
            residue_number,
            name: name.to_string(),
            residue_type,
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map.insert(atom_name.to_string(), atom_id);
    }

    pub(crate) fn remove_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.retain(|&id| id != atom_id);
        if self.atom_name_map.get(atom_name) == Some(&atom_id) {
            self.atom_name_map.remove(atom_name);
        }
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_chain_id(n: u64) -> ChainId {
        ChainId::from(KeyData::from_ffi(n))
    }

    mod residue_type_tests {
        use super::*;

        #[test]
        fn parses_three_letter_codes_case_insensitively() {
            assert_eq!("ALA".parse::<ResidueType>(), Ok(ResidueType::Alanine));
            assert_eq!("gly".parse::<ResidueType>(), Ok(ResidueType::Glycine));
            assert_eq!(" Trp ".parse::<ResidueType>(), Ok(ResidueType::Tryptophan));
        }

        #[test]
        fn histidine_variants_map_to_histidine() {
            for code in ["HIS", "HSE", "HSD", "HIP"] {
                assert_eq!(code.parse::<ResidueType>(), Ok(ResidueType::Histidine));
            }
        }

        #[test]
        fn rejects_unknown_codes() {
            assert_eq!(
                "XYZ".parse::<ResidueType>(),
                Err(ParseResidueTypeError("XYZ".to_string()))
            );
            assert!("".parse::<ResidueType>().is_err());
            assert!("ALAN".parse::<ResidueType>().is_err());
        }

        #[test]
        fn three_letter_code_round_trips_for_all_types() {
            for t in ResidueType::ALL {
                assert_eq!(t.to_three_letter().parse::<ResidueType>(), Ok(t));
                assert_eq!(t.to_string(), t.to_three_letter());
            }
        }
    }

    #[test]
    fn new_residue_initializes_fields_correctly() {
        let chain_id = dummy_chain_id(1);
        let residue = Residue::new(10, "GLY", Some(ResidueType::Glycine), chain_id);
        assert_eq!(residue.residue_number, 10);
        assert_eq!(residue.name, "GLY");
        assert_eq!(residue.residue_type, Some(ResidueType::Glycine));
        assert_eq!(residue.chain_id, chain_id);
        assert!(residue.atoms().is_empty());
        assert!(residue.get_atom_id_by_name("CA").is_none());
    }

    #[test]
    fn add_atom_adds_atom_and_maps_name() {
        let mut residue = Residue::new(5, "ALA", Some(ResidueType::Alanine), dummy_chain_id(2));
        let atom_id = dummy_atom_id(42);
        residue.add_atom("CA", atom_id);
        assert_eq!(residue.atoms(), &[atom_id]);
        assert_eq!(residue.get_atom_id_by_name("CA"), Some(atom_id));
    }

    #[test]
    fn remove_atom_removes_atom_and_name_mapping() {
        let mut residue = Residue::new(8, "THR", Some(ResidueType::Threonine), dummy_chain_id(4));
        let atom_id = dummy_atom_id(100);
        residue.add_atom("OG1", atom_id);
        residue.remove_atom("OG1", atom_id);
        assert!(residue.atoms().is_empty());
        assert!(residue.get_atom_id_by_name("OG1").is_none());
    }

    #[test]
    fn remove_atom_keeps_mapping_of_a_different_atom_with_same_name() {
        let mut residue = Residue::new(9, "VAL", Some(ResidueType::Valine), dummy_chain_id(5));
        let kept = dummy_atom_id(200);
        residue.add_atom("CG1", kept);
        residue.remove_atom("CG1", dummy_atom_id(201));
        assert_eq!(residue.atoms(), &[kept]);
        assert_eq!(residue.get_atom_id_by_name("CG1"), Some(kept));
    }
}
