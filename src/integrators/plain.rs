//! Plain integrator
use crate::callbacks::{Callback, SinkCallback};
use crate::config::{IntegrationConfig, SampleSpace};
use crate::core::domain::Domain;
use crate::core::estimators::{EstimateKind, IntegralEstimate, PlainEstimators};
use crate::core::{cumulative_estimate, evaluate_batch, Checkpoint, Integrand};
use crate::error::Result;
use crate::integrators::check_sample_count;
use crate::sampling::{seeded_rng, SampleGenerator, UniformGenerator};

use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use rand_pcg::Pcg64;
use std::ops::AddAssign;

/// A checkpoint of the plain integrator: the random number generator before and after the call.
pub type PlainCheckpoint<T, R> = Checkpoint<T, R>;

/// Integrates with uniformly distributed random points,
///
/// $$ I \approx \frac{V}{N} \sum_{j=1}^N f \left( x^{(j)} \right), $$
///
/// and estimates the standard error from the sample variance.
pub struct MonteCarloSolver<T: Float, I, R = Pcg64> {
    integrand: I,
    domain: Domain<T>,
    config: IntegrationConfig,
    generator: UniformGenerator<T, R>,
    checkpoints: Vec<PlainCheckpoint<T, R>>,
}

impl<T, I> MonteCarloSolver<T, I, Pcg64>
where
    T: Float,
    I: Integrand<T>,
{
    /// Create a solver with the default configuration and an unseeded generator.
    pub fn new(integrand: I, domain: Domain<T>) -> Self {
        Self::with_config(integrand, domain, IntegrationConfig::default())
    }

    /// Create a solver whose generator is seeded from `config`.
    pub fn with_config(integrand: I, domain: Domain<T>, config: IntegrationConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self::with_rng(integrand, domain, config, rng)
    }
}

impl<T, I, R> MonteCarloSolver<T, I, R>
where
    T: Float,
    I: Integrand<T>,
{
    /// Create a solver drawing from `rng`. The seed in `config` is ignored.
    pub fn with_rng(integrand: I, domain: Domain<T>, config: IntegrationConfig, rng: R) -> Self {
        let generator = UniformGenerator::new(domain.dimensionality(), rng);

        Self {
            integrand,
            domain,
            config,
            generator,
            checkpoints: Vec::new(),
        }
    }

    /// Create a solver that continues where the call that produced `chkpt` stopped.
    pub fn resume(
        integrand: I,
        domain: Domain<T>,
        config: IntegrationConfig,
        chkpt: &PlainCheckpoint<T, R>,
    ) -> Self
    where
        R: Clone,
    {
        Self::with_rng(integrand, domain, config, chkpt.state_after().clone())
    }

    /// Returns the integration domain.
    pub fn domain(&self) -> &Domain<T> {
        &self.domain
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Returns the random number generator in its current state.
    pub fn rng(&self) -> &R {
        self.generator.rng()
    }

    /// Returns the checkpoints of all successful calls to `integrate`.
    pub fn checkpoints(&self) -> &[PlainCheckpoint<T, R>] {
        &self.checkpoints
    }
}

impl<T, I, R> MonteCarloSolver<T, I, R>
where
    T: Float + FromPrimitive + AddAssign,
    I: Integrand<T>,
    R: Clone + Rng,
    Standard: Distribution<T>,
{
    /// Estimate the integral with `num_samples` fresh random points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSampleCount`](crate::Error::InvalidSampleCount) if `num_samples`
    /// is zero and [`Error::IntegrandShapeMismatch`](crate::Error::IntegrandShapeMismatch) if
    /// the integrand does not return one value per point. After an error the solver is in the
    /// same state as before the call.
    pub fn integrate(&mut self, num_samples: usize) -> Result<IntegralEstimate<T>> {
        self.integrate_with_callback(num_samples, &SinkCallback {})
    }

    /// Like [`MonteCarloSolver::integrate`], but hands all checkpoints to `callback` after the
    /// integration.
    ///
    /// # Errors
    ///
    /// See [`MonteCarloSolver::integrate`].
    pub fn integrate_with_callback(
        &mut self,
        num_samples: usize,
        callback: &impl Callback<T, R>,
    ) -> Result<IntegralEstimate<T>> {
        check_sample_count(num_samples)?;

        let rng_before = self.generator.rng().clone();
        let batch = self.generator.generate(num_samples)?;
        let batch = match self.config.sample_space {
            SampleSpace::Domain => self.domain.map_batch(batch),
            SampleSpace::Unit => batch,
        };

        let values = match evaluate_batch(&self.integrand, &batch) {
            Ok(values) => values,
            Err(err) => {
                // the failed call must not consume random numbers
                self.generator.set_rng(rng_before);
                return Err(err);
            }
        };

        let kind = EstimateKind::Plain {
            volume: self.domain.volume(),
        };
        let estimators = PlainEstimators::from_values(&values, self.config.non_finite);
        let estimate = kind.estimate(&estimators);

        self.checkpoints.push(Checkpoint::new(
            rng_before,
            self.generator.rng().clone(),
            estimators,
            estimate.clone(),
            kind,
        ));
        callback.print(&self.checkpoints);

        Ok(estimate)
    }

    /// Combine all calls to `integrate` into a single estimate, or `None` if there was none.
    pub fn cumulative(&self) -> Option<IntegralEstimate<T>> {
        cumulative_estimate(&self.checkpoints)
    }
}
