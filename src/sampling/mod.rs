//! Generators of sample points in the unit hypercube.
pub mod discrepancy;
pub mod halton;
pub mod proposal;
pub mod sobol;

use crate::core::SampleBatch;
use crate::error::Result;
use rand::distributions::{Distribution, Standard};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

pub use discrepancy::l2_star_discrepancy;
pub use halton::HaltonSequence;
pub use proposal::{
    ExponentialProposal, GaussianProposal, Proposal, ProposalGenerator, UniformProposal,
};
pub use sobol::SobolSequence;

/// Anything that produces batches of points in the unit hypercube $[0,1)^d$.
pub trait SampleGenerator<T> {
    /// The dimension of the generated points.
    fn dim(&self) -> usize;

    /// Generate the next `n` points.
    ///
    /// # Errors
    ///
    /// Generators with finite capacity fail once it is exhausted.
    fn generate(&mut self, n: usize) -> Result<SampleBatch<T>>;
}

/// A deterministic sequence with a cursor. Every call to `generate` continues where the
/// previous call stopped, so the points issued by one instance never repeat and successive
/// batches always form a prefix of the full sequence.
pub trait LowDiscrepancySequence<T>: SampleGenerator<T> {
    /// The index of the next point that `generate` returns.
    fn cursor(&self) -> u64;

    /// Move the cursor to `index`.
    fn seek(&mut self, index: u64);

    /// The largest dimension this family supports.
    fn max_dimension(&self) -> usize;
}

/// Create a random number generator from `seed`, or from the operating system's entropy if
/// there is none.
pub fn seeded_rng(seed: Option<u64>) -> Pcg64 {
    match seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_entropy(),
    }
}

/// Draws independent uniformly distributed points. The state of the random number generator
/// is the only state carried from one batch to the next.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(bound(serialize = "R: Serialize", deserialize = "R: Deserialize<'de>"))]
pub struct UniformGenerator<T, R = Pcg64> {
    dim: usize,
    rng: R,
    #[serde(skip)]
    numeric: PhantomData<T>,
}

impl<T> UniformGenerator<T, Pcg64> {
    /// Creates a generator of `dim`-dimensional points, seeded from `seed`.
    pub fn from_seed(dim: usize, seed: Option<u64>) -> Self {
        Self::new(dim, seeded_rng(seed))
    }
}

impl<T, R> UniformGenerator<T, R> {
    /// Creates a generator of `dim`-dimensional points that draws from `rng`.
    pub fn new(dim: usize, rng: R) -> Self {
        Self {
            dim,
            rng,
            numeric: PhantomData,
        }
    }

    /// Returns the random number generator in its current state.
    pub fn rng(&self) -> &R {
        &self.rng
    }

    pub(crate) fn set_rng(&mut self, rng: R) {
        self.rng = rng;
    }
}

impl<T, R> SampleGenerator<T> for UniformGenerator<T, R>
where
    R: Rng,
    Standard: Distribution<T>,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn generate(&mut self, n: usize) -> Result<SampleBatch<T>> {
        let dim = self.dim;
        let rng = &mut self.rng;

        Ok(SampleBatch::new(
            (0..n)
                .map(|_| (0..dim).map(|_| rng.gen()).collect::<Vec<T>>())
                .collect(),
        ))
    }
}
