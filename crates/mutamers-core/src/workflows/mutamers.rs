use crate::core::models::{residue::ResidueType, workspace::MoleculeHost};
use crate::engine::allele::{Allele, draw_selector};
use crate::engine::cache::{CacheRegistry, RotamerCache};
use crate::engine::config::MutamersConfig;
use crate::engine::context::ExpressionContext;
use crate::engine::error::EngineError;
use crate::engine::expression::{self, ExpressionReport};
use crate::engine::operators;
use crate::engine::residues::{ResidueTable, molecule};
use crate::engine::resolver::RotamerResolver;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A gene that explores side-chain rotamers and point mutations on a fixed
/// set of residues.
///
/// The allele holds one `(target type, selector)` pair per residue, in the
/// order the residues were configured. Expression turns the allele into
/// atomic coordinates on the host's molecules.
///
/// Genes built with the same name share one rotamer cache and one residue
/// table through the [`CacheRegistry`]. Each gene owns its allele and its
/// record of residue types without rotamers.
#[derive(Debug)]
pub struct Mutamers {
    config: Arc<MutamersConfig>,
    allele: Allele,
    residues: Arc<ResidueTable>,
    resolver: RotamerResolver,
    shared_selector: Option<f64>,
}

impl Mutamers {
    /// Creates an unreadied gene and attaches it to the cache and residue
    /// table registered under its name.
    ///
    /// With ligation enabled a shared selector is drawn here.
    pub fn new(config: MutamersConfig, registry: &CacheRegistry, rng: &mut impl Rng) -> Self {
        let residues = registry.residue_table(&config.name, &config.residues);
        let capacity = RotamerCache::capacity_for(residues.len(), config.mutations.len());
        let cache = registry.get_or_create(&config.name, capacity);
        let resolver = RotamerResolver::new(config.library, config.hydrogens, cache);
        let shared_selector = config.ligation.then(|| draw_selector(rng));

        info!(
            gene = %config.name,
            residues = residues.len(),
            mutations = config.mutations.len(),
            ligation = config.ligation,
            "Mutamers gene created."
        );

        Self {
            config: Arc::new(config),
            allele: Allele::default(),
            residues,
            resolver,
            shared_selector,
        }
    }

    pub fn config(&self) -> &MutamersConfig {
        &self.config
    }

    pub fn allele(&self) -> &Allele {
        &self.allele
    }

    pub fn residues(&self) -> &ResidueTable {
        &self.residues
    }

    pub fn resolver(&self) -> &RotamerResolver {
        &self.resolver
    }

    pub fn shared_selector(&self) -> Option<f64> {
        self.shared_selector
    }

    pub fn is_ready(&self) -> bool {
        self.residues.is_resolved() && self.allele.len() == self.residues.len()
    }

    /// Replaces the allele, for seeding individuals from a known genotype.
    pub fn set_allele(&mut self, allele: Allele) -> Result<(), EngineError> {
        if allele.len() != self.residues.len() {
            return Err(EngineError::AlleleLength {
                expected: self.residues.len(),
                found: allele.len(),
            });
        }
        self.allele = allele;
        Ok(())
    }

    /// Resolves the residue references against `host` and draws an initial allele.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ResidueLookup` if a reference matches no residue,
    /// several residues, or a residue without a standard amino-acid type.
    #[instrument(skip_all, fields(gene = %self.config.name))]
    pub fn ready(&mut self, host: &dyn MoleculeHost, rng: &mut impl Rng) -> Result<(), EngineError> {
        self.residues.resolve_all(host)?;
        self.allele = self.draw_allele(host, rng)?;
        info!(residues = self.residues.len(), "Mutamers gene ready.");
        Ok(())
    }

    /// Applies the allele to the host's molecules.
    pub fn express(
        &mut self,
        host: &mut dyn MoleculeHost,
        ctx: &ExpressionContext<'_>,
    ) -> Result<ExpressionReport, EngineError> {
        if !self.residues.is_resolved() {
            return Err(EngineError::NotReady);
        }
        expression::express(
            &self.allele,
            &self.residues,
            &mut self.resolver,
            self.config.avoid_replacement,
            host,
            ctx,
        )
    }

    /// Hides the atoms of every gene residue.
    pub fn unexpress(&self, host: &mut dyn MoleculeHost) {
        let hidden = expression::unexpress(&self.residues, host);
        debug!(gene = %self.config.name, atoms = hidden, "Residues hidden.");
    }

    /// Two-point crossover with `other`.
    ///
    /// With ligation only the selectors are recombined and both genes keep
    /// their target types.
    pub fn mate(&mut self, other: &mut Mutamers, rng: &mut impl Rng) -> Option<(usize, usize)> {
        operators::crossover(&mut self.allele, &mut other.allele, self.config.ligation, rng)
    }

    /// Redraws the whole allele with probability `probability`.
    ///
    /// Target types are drawn from the configured mutations plus each
    /// residue's type as it currently is in `host`.
    ///
    /// # Return
    ///
    /// Whether the allele was redrawn.
    pub fn mutate(
        &mut self,
        probability: f64,
        host: &dyn MoleculeHost,
        rng: &mut impl Rng,
    ) -> Result<bool, EngineError> {
        if rng.r#gen::<f64>() >= probability {
            return Ok(false);
        }
        if self.config.ligation {
            self.shared_selector = Some(draw_selector(rng));
        }
        self.allele = self.draw_allele(host, rng)?;
        debug!(gene = %self.config.name, "Allele redrawn.");
        Ok(true)
    }

    /// Copies the gene for a new individual.
    ///
    /// The allele, shared selector and no-rotamer record are copied. The
    /// configuration, residue table and rotamer cache stay shared.
    pub fn duplicate(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            allele: self.allele.clone(),
            residues: Arc::clone(&self.residues),
            resolver: self.resolver.clone(),
            shared_selector: self.shared_selector,
        }
    }

    fn draw_allele(&self, host: &dyn MoleculeHost, rng: &mut impl Rng) -> Result<Allele, EngineError> {
        let current = self.current_types(host)?;
        Ok(operators::rebuild(
            &current,
            &self.config.mutations,
            self.shared_selector,
            rng,
        ))
    }

    fn current_types(&self, host: &dyn MoleculeHost) -> Result<Vec<ResidueType>, EngineError> {
        self.residues
            .references()
            .iter()
            .enumerate()
            .map(|(index, reference)| {
                let system = molecule(host, reference)?;
                let (_, residue) = self.residues.live_residue(index, system)?;
                residue.residue_type.ok_or_else(|| {
                    EngineError::lookup(reference, "residue is not a standard amino acid")
                })
            })
            .collect()
    }
}
