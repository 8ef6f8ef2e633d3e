use super::swap::{BackboneSwapper, ResidueSwapper};
use crate::core::rotamers::{
    hydrogens::{GeometricHydrogenAdder, HydrogenAdder},
    provider::RotamerProvider,
};

/// The external collaborators a gene needs to express its allele.
#[derive(Clone, Copy)]
pub struct ExpressionContext<'a> {
    pub provider: &'a dyn RotamerProvider,
    pub swapper: &'a dyn ResidueSwapper,
    pub hydrogens: &'a dyn HydrogenAdder,
}

impl<'a> ExpressionContext<'a> {
    pub fn new(
        provider: &'a dyn RotamerProvider,
        swapper: &'a dyn ResidueSwapper,
        hydrogens: &'a dyn HydrogenAdder,
    ) -> Self {
        Self {
            provider,
            swapper,
            hydrogens,
        }
    }

    /// Uses `provider` with the built-in [`BackboneSwapper`] and [`GeometricHydrogenAdder`].
    pub fn with_provider(provider: &'a dyn RotamerProvider) -> Self {
        Self {
            provider,
            swapper: &BackboneSwapper,
            hydrogens: &GeometricHydrogenAdder,
        }
    }
}
