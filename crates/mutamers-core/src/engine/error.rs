use thiserror::Error;

use super::config::{ConfigError, ResidueSpec};
use super::placement::PlacementError;
use super::swap::SwapError;
use crate::core::models::residue::ResidueType;
use crate::core::rotamers::{hydrogens::HydrogenError, provider::ProviderError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// The residue type has no side-chain rotamers. Handled inside expression.
    #[error("No candidate rotamers for residue type {residue_type}")]
    NoCandidates { residue_type: ResidueType },

    #[error("Cannot resolve residue {reference}: {reason}")]
    ResidueLookup {
        reference: ResidueSpec,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Rotamer provider failed for residue {reference}: {source}")]
    Provider {
        reference: ResidueSpec,
        source: ProviderError,
    },

    #[error("Residue swap failed for residue {reference}: {source}")]
    Swap {
        reference: ResidueSpec,
        source: SwapError,
    },

    #[error("Rotamer placement failed for residue {reference}: {source}")]
    Placement {
        reference: ResidueSpec,
        source: PlacementError,
    },

    #[error("Hydrogen addition failed: {0}")]
    Hydrogens(#[from] HydrogenError),

    #[error("Gene has not been readied against its structures")]
    NotReady,

    #[error("Allele has {found} entries but the gene has {expected} residues")]
    AlleleLength { expected: usize, found: usize },
}

impl EngineError {
    pub fn lookup(reference: &ResidueSpec, reason: impl Into<String>) -> Self {
        Self::ResidueLookup {
            reference: reference.clone(),
            reason: reason.into(),
        }
    }
}
