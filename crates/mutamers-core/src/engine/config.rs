use crate::core::models::residue::ResidueType;
use crate::core::rotamers::library::LibraryName;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid residue specification '{0}' (expected 'Molecule/233' or 'Molecule/233.A')")]
    InvalidResidueSpec(String),

    #[error("Unknown rotamer library '{0}'")]
    UnknownLibrary(String),

    #[error("Invalid residue type code '{0}'")]
    InvalidResidueType(String),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// A residue position inside a molecule, optionally restricted to one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResiduePosition {
    pub number: isize,
    pub chain: Option<char>,
}

impl FromStr for ResiduePosition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidResidueSpec(s.to_string());
        let (number, chain) = match s.trim().split_once('.') {
            Some((number, chain)) => {
                let mut chars = chain.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => (number, Some(c)),
                    _ => return Err(invalid()),
                }
            }
            None => (s.trim(), None),
        };
        let number = number.parse().map_err(|_| invalid())?;
        Ok(Self { number, chain })
    }
}

impl fmt::Display for ResiduePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chain {
            Some(chain) => write!(f, "{}.{}", self.number, chain),
            None => write!(f, "{}", self.number),
        }
    }
}

/// A logical reference to a mutable residue: molecule name plus position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResidueSpec {
    pub molecule: String,
    pub position: ResiduePosition,
}

impl ResidueSpec {
    pub fn new(molecule: &str, number: isize, chain: Option<char>) -> Self {
        Self {
            molecule: molecule.to_string(),
            position: ResiduePosition { number, chain },
        }
    }
}

impl FromStr for ResidueSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (molecule, position) = s
            .trim()
            .rsplit_once('/')
            .ok_or_else(|| ConfigError::InvalidResidueSpec(s.to_string()))?;
        if molecule.is_empty() {
            return Err(ConfigError::InvalidResidueSpec(s.to_string()));
        }
        let position = position
            .parse()
            .map_err(|_| ConfigError::InvalidResidueSpec(s.to_string()))?;
        Ok(Self {
            molecule: molecule.to_string(),
            position,
        })
    }
}

impl fmt::Display for ResidueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.molecule, self.position)
    }
}

fn default_name() -> String {
    "mutamers".to_string()
}

fn default_library() -> String {
    "Dunbrack".to_string()
}

/// The gene configuration as written in a TOML file, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMutamersConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub residues: Vec<String>,
    #[serde(default = "default_library")]
    pub library: String,
    #[serde(default)]
    pub mutations: Vec<String>,
    #[serde(default)]
    pub ligation: bool,
    #[serde(default)]
    pub hydrogens: bool,
    #[serde(default)]
    pub avoid_replacement: bool,
}

impl RawMutamersConfig {
    /// Turns raw strings into typed values.
    pub fn validate(self) -> Result<MutamersConfig, ConfigError> {
        let residues = self
            .residues
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<ResidueSpec>, _>>()?;
        let library = self
            .library
            .parse()
            .map_err(|_| ConfigError::UnknownLibrary(self.library.clone()))?;
        let mutations = self
            .mutations
            .iter()
            .map(|code| {
                code.parse()
                    .map_err(|_| ConfigError::InvalidResidueType(code.clone()))
            })
            .collect::<Result<Vec<ResidueType>, _>>()?;

        MutamersConfigBuilder::new()
            .name(&self.name)
            .residues(residues)
            .library(library)
            .mutations(mutations)
            .ligation(self.ligation)
            .hydrogens(self.hydrogens)
            .avoid_replacement(self.avoid_replacement)
            .build()
    }
}

/// Validated configuration of one mutamers gene.
#[derive(Debug, Clone, PartialEq)]
pub struct MutamersConfig {
    /// Gene name; genes with the same name share one rotamer cache.
    pub name: String,
    pub residues: Vec<ResidueSpec>,
    pub library: LibraryName,
    pub mutations: Vec<ResidueType>,
    /// Share one selector across all residues.
    pub ligation: bool,
    /// Complete candidate rotamers with hydrogens before caching them.
    pub hydrogens: bool,
    /// Refresh coordinates in place when the residue already has the target type.
    pub avoid_replacement: bool,
}

impl MutamersConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawMutamersConfig = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<string>".to_string(),
            source: e,
        })?;
        raw.validate()
    }

    /// Loads and validates a gene configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawMutamersConfig = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        raw.validate()
    }
}

#[derive(Default)]
pub struct MutamersConfigBuilder {
    name: Option<String>,
    residues: Vec<ResidueSpec>,
    library: Option<LibraryName>,
    mutations: Vec<ResidueType>,
    ligation: bool,
    hydrogens: bool,
    avoid_replacement: bool,
}

impl MutamersConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn residue(mut self, spec: ResidueSpec) -> Self {
        self.residues.push(spec);
        self
    }

    pub fn residues(mut self, specs: Vec<ResidueSpec>) -> Self {
        self.residues = specs;
        self
    }

    pub fn library(mut self, library: LibraryName) -> Self {
        self.library = Some(library);
        self
    }

    pub fn mutations(mut self, mutations: Vec<ResidueType>) -> Self {
        self.mutations = mutations;
        self
    }

    pub fn ligation(mut self, enabled: bool) -> Self {
        self.ligation = enabled;
        self
    }

    pub fn hydrogens(mut self, enabled: bool) -> Self {
        self.hydrogens = enabled;
        self
    }

    pub fn avoid_replacement(mut self, enabled: bool) -> Self {
        self.avoid_replacement = enabled;
        self
    }

    pub fn build(self) -> Result<MutamersConfig, ConfigError> {
        if self.residues.is_empty() {
            return Err(ConfigError::MissingParameter("residues"));
        }
        Ok(MutamersConfig {
            name: self.name.unwrap_or_else(default_name),
            residues: self.residues,
            library: self.library.unwrap_or(LibraryName::Dunbrack),
            mutations: self.mutations,
            ligation: self.ligation,
            hydrogens: self.hydrogens,
            avoid_replacement: self.avoid_replacement,
        })
    }
}
