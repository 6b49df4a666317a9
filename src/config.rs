//! Configuration shared by all solvers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Selects in which coordinates the integrand receives its points.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSpace {
    /// Points are mapped into the integration domain before the integrand is called.
    Domain,
    /// The integrand receives the raw points of the unit hypercube and performs the mapping into
    /// the domain itself. The estimate is still multiplied by the volume of the domain.
    Unit,
}

impl Default for SampleSpace {
    fn default() -> Self {
        Self::Domain
    }
}

/// What to do with integrand values that are `inf` or `nan`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NonFinitePolicy {
    /// Non-finite values enter the sums and therefore show up in the estimate.
    Propagate,
    /// Non-finite values are counted and otherwise treated as zero.
    Discard,
}

impl Default for NonFinitePolicy {
    fn default() -> Self {
        Self::Propagate
    }
}

/// The supported families of low-discrepancy sequences.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceFamily {
    /// Sobol sequence with Joe-Kuo direction numbers.
    Sobol,
    /// Halton sequence using the first primes as bases.
    Halton,
}

impl Default for SequenceFamily {
    fn default() -> Self {
        Self::Sobol
    }
}

impl fmt::Display for SequenceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sobol => write!(f, "sobol"),
            Self::Halton => write!(f, "halton"),
        }
    }
}

impl FromStr for SequenceFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sobol" => Ok(Self::Sobol),
            "halton" => Ok(Self::Halton),
            _ => Err(Error::UnknownSequenceFamily {
                name: s.to_string(),
            }),
        }
    }
}

/// Options recognized by the solvers. The number of samples is not part of the configuration,
/// it is passed to every call of `integrate`.
///
/// Options that do not apply to a solver are ignored by it: `sequence_family`, `discrepancy`
/// and `scramble` only matter for Quasi-Monte Carlo integration, and the importance sampler
/// always evaluates the integrand in domain coordinates.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Seed of the random number generator. Without a seed the generator is seeded from the
    /// operating system.
    pub seed: Option<u64>,
    /// Coordinates in which the integrand is evaluated.
    pub sample_space: SampleSpace,
    /// Treatment of non-finite integrand values.
    pub non_finite: NonFinitePolicy,
    /// Sequence used by `QuasiMonteCarloSolver::integrate`.
    pub sequence_family: SequenceFamily,
    /// Whether Quasi-Monte Carlo estimates carry the L2-star discrepancy of their point set.
    /// Its cost grows quadratically with the number of samples.
    pub discrepancy: bool,
    /// Whether Sobol points are randomized with a digital shift drawn from `seed`.
    pub scramble: bool,
}

impl IntegrationConfig {
    /// Sets the seed of the random number generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the coordinates in which the integrand is evaluated.
    #[must_use]
    pub fn with_sample_space(mut self, sample_space: SampleSpace) -> Self {
        self.sample_space = sample_space;
        self
    }

    /// Sets the treatment of non-finite integrand values.
    #[must_use]
    pub fn with_non_finite(mut self, non_finite: NonFinitePolicy) -> Self {
        self.non_finite = non_finite;
        self
    }

    /// Sets the low-discrepancy sequence used by default.
    #[must_use]
    pub fn with_sequence_family(mut self, sequence_family: SequenceFamily) -> Self {
        self.sequence_family = sequence_family;
        self
    }

    /// Enables or disables the computation of the L2-star discrepancy.
    #[must_use]
    pub fn with_discrepancy(mut self, discrepancy: bool) -> Self {
        self.discrepancy = discrepancy;
        self
    }

    /// Enables or disables the digital shift of Sobol points.
    #[must_use]
    pub fn with_scramble(mut self, scramble: bool) -> Self {
        self.scramble = scramble;
        self
    }

    /// Parses a configuration from a JSON string. Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the string is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Json`] if its content is
    /// not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}
