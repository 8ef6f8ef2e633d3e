use phf::{Set, phf_set};

static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "H", "HN", "CA", "HA", "C", "O", "OXT", "H1", "H2", "H3", "NT",
    "HT1", "HT2", "HT3", "OT1", "OT2", "HC", "HOXT", "HA1", "HA2", "1HA", "2HA",
};

/// Atom names that anchor a side chain onto its backbone, in superposition order.
pub const ANCHOR_ATOM_NAMES: [&str; 3] = ["N", "CA", "C"];

pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

pub fn is_heavy_atom(atom_name: &str) -> bool {
    let first_char = atom_name
        .trim()
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase());
    !matches!(first_char, Some('H') | Some('D'))
}

/// Guesses the element symbol of an atom from its name (first letter).
pub fn element_of(atom_name: &str) -> Option<char> {
    atom_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_backbone_atom_recognizes_standard_backbone_atoms() {
        for name in ["N", "CA", "C", "O", "OXT", "HA"] {
            assert!(is_backbone_atom(name), "{name} should be backbone");
        }
    }

    #[test]
    fn is_backbone_atom_is_case_sensitive_and_trims_whitespace() {
        assert!(!is_backbone_atom("ca"));
        assert!(is_backbone_atom(" CA "));
        assert!(!is_backbone_atom("CB"));
        assert!(!is_backbone_atom(""));
    }

    #[test]
    fn anchor_atoms_are_backbone_atoms() {
        assert!(ANCHOR_ATOM_NAMES.iter().all(|name| is_backbone_atom(name)));
    }

    #[test]
    fn is_heavy_atom_distinguishes_hydrogens() {
        assert!(!is_heavy_atom("H"));
        assert!(!is_heavy_atom("HB2"));
        assert!(!is_heavy_atom("D2"));
        assert!(!is_heavy_atom(" h "));
        assert!(is_heavy_atom("CA"));
        assert!(is_heavy_atom("SG"));
        assert!(is_heavy_atom("c"));
    }

    #[test]
    fn element_of_takes_first_letter() {
        assert_eq!(element_of("CA"), Some('C'));
        assert_eq!(element_of("ND1"), Some('N'));
        assert_eq!(element_of("1HB"), Some('H'));
        assert_eq!(element_of("og"), Some('O'));
        assert_eq!(element_of(" "), None);
    }
}
