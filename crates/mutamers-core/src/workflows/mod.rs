//! # Workflows Module
//!
//! The user-facing gene built on top of [`crate::engine`].
//!
//! ## Overview
//!
//! A search framework creates one [`mutamers::Mutamers`] per individual from a
//! validated configuration, readies it against the structures of the run and
//! then drives it through expression, crossover, mutation and duplication.
//!
//! ## Usage
//!
//! ```ignore
//! use mutamers::engine::{cache::CacheRegistry, config::MutamersConfig, context::ExpressionContext};
//! use mutamers::workflows::mutamers::Mutamers;
//!
//! let registry = CacheRegistry::new();
//! let config = MutamersConfig::load(Path::new("gene.toml"))?;
//! let mut gene = Mutamers::new(config, &registry, &mut rng);
//! gene.ready(&workspace, &mut rng)?;
//! gene.express(&mut workspace, &ExpressionContext::with_provider(&provider))?;
//! ```

pub mod mutamers;
