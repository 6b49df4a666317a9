//! Importance sampling
use crate::callbacks::{Callback, SinkCallback};
use crate::config::IntegrationConfig;
use crate::core::domain::Domain;
use crate::core::estimators::{
    importance_weights, EstimateKind, IntegralEstimate, PlainEstimators,
};
use crate::core::{cumulative_estimate, evaluate_batch, Checkpoint, Integrand};
use crate::error::Result;
use crate::integrators::check_sample_count;
use crate::sampling::{seeded_rng, Proposal, ProposalGenerator, UniformProposal};

use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use rand_pcg::Pcg64;
use std::ops::AddAssign;

/// Integrates with points drawn from a proposal distribution $p$,
///
/// $$ I \approx \frac{1}{N} \sum_{j=1}^N \frac{f \left( x^{(j)} \right)}{p \left( x^{(j)}
/// \right)}. $$
///
/// The points are drawn in the integration domain itself, so the sample space of the
/// configuration has no effect.
pub struct ImportanceSampler<T: Float, I, P = UniformProposal<T>, R = Pcg64> {
    integrand: I,
    domain: Domain<T>,
    config: IntegrationConfig,
    generator: ProposalGenerator<T, P, R>,
    checkpoints: Vec<Checkpoint<T, R>>,
}

impl<T, I> ImportanceSampler<T, I, UniformProposal<T>, Pcg64>
where
    T: Float,
    I: Integrand<T>,
    Standard: Distribution<T>,
{
    /// Create a sampler with a uniform proposal, which reproduces plain Monte Carlo.
    ///
    /// # Errors
    ///
    /// Can not fail for the uniform proposal; the signature matches the other constructors.
    pub fn new(integrand: I, domain: Domain<T>) -> Result<Self> {
        Self::with_config(integrand, domain, IntegrationConfig::default())
    }

    /// Create a sampler with a uniform proposal and a generator seeded from `config`.
    ///
    /// # Errors
    ///
    /// See [`ImportanceSampler::new`].
    pub fn with_config(integrand: I, domain: Domain<T>, config: IntegrationConfig) -> Result<Self> {
        let proposal = UniformProposal::new(domain.clone());
        Self::with_proposal(integrand, domain, proposal, config)
    }
}

impl<T, I, P> ImportanceSampler<T, I, P, Pcg64>
where
    T: Float,
    I: Integrand<T>,
    P: Proposal<T>,
{
    /// Create a sampler drawing from `proposal` with a generator seeded from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`](crate::Error::DimensionMismatch) if the dimensions
    /// of `domain` and `proposal` differ.
    pub fn with_proposal(
        integrand: I,
        domain: Domain<T>,
        proposal: P,
        config: IntegrationConfig,
    ) -> Result<Self> {
        let rng = seeded_rng(config.seed);
        Self::with_rng(integrand, domain, proposal, config, rng)
    }
}

impl<T, I, P, R> ImportanceSampler<T, I, P, R>
where
    T: Float,
    I: Integrand<T>,
    P: Proposal<T>,
    R: Rng,
{
    /// Create a sampler drawing from `proposal` with `rng`. The seed in `config` is ignored.
    ///
    /// # Errors
    ///
    /// See [`ImportanceSampler::with_proposal`].
    pub fn with_rng(
        integrand: I,
        domain: Domain<T>,
        proposal: P,
        config: IntegrationConfig,
        rng: R,
    ) -> Result<Self> {
        let generator = ProposalGenerator::new(domain.clone(), proposal, rng)?;

        Ok(Self {
            integrand,
            domain,
            config,
            generator,
            checkpoints: Vec::new(),
        })
    }

    /// Create a sampler that continues where the call that produced `chkpt` stopped.
    ///
    /// # Errors
    ///
    /// See [`ImportanceSampler::with_proposal`].
    pub fn resume(
        integrand: I,
        domain: Domain<T>,
        proposal: P,
        config: IntegrationConfig,
        chkpt: &Checkpoint<T, R>,
    ) -> Result<Self>
    where
        R: Clone,
    {
        Self::with_rng(
            integrand,
            domain,
            proposal,
            config,
            chkpt.state_after().clone(),
        )
    }

    /// Returns the integration domain.
    pub fn domain(&self) -> &Domain<T> {
        &self.domain
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Returns the proposal distribution.
    pub fn proposal(&self) -> &P {
        self.generator.proposal()
    }

    /// Returns the random number generator in its current state.
    pub fn rng(&self) -> &R {
        self.generator.rng()
    }

    /// Returns the checkpoints of all successful calls to `integrate`.
    pub fn checkpoints(&self) -> &[Checkpoint<T, R>] {
        &self.checkpoints
    }
}

impl<T, I, P, R> ImportanceSampler<T, I, P, R>
where
    T: Float + FromPrimitive + AddAssign,
    I: Integrand<T>,
    P: Proposal<T>,
    R: Clone + Rng,
{
    /// Estimate the integral with `num_samples` points drawn from the proposal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSampleCount`](crate::Error::InvalidSampleCount) for zero
    /// samples, the errors of [`ProposalGenerator::generate`], and
    /// [`Error::DivisionByZeroDensity`](crate::Error::DivisionByZeroDensity) or
    /// [`Error::InvalidDensity`](crate::Error::InvalidDensity) for bad densities. After an error
    /// the sampler is in the same state as before the call.
    pub fn integrate(&mut self, num_samples: usize) -> Result<IntegralEstimate<T>> {
        self.integrate_with_callback(num_samples, &SinkCallback {})
    }

    /// Like [`ImportanceSampler::integrate`], but hands all checkpoints to `callback` after the
    /// integration.
    ///
    /// # Errors
    ///
    /// See [`ImportanceSampler::integrate`].
    pub fn integrate_with_callback(
        &mut self,
        num_samples: usize,
        callback: &impl Callback<T, R>,
    ) -> Result<IntegralEstimate<T>> {
        check_sample_count(num_samples)?;

        let rng_before = self.generator.rng().clone();
        let weights = self.generator.generate(num_samples).and_then(|(batch, densities)| {
            let values = evaluate_batch(&self.integrand, &batch)?;
            importance_weights(&values, &densities)
        });

        let weights = match weights {
            Ok(weights) => weights,
            Err(err) => {
                self.generator.set_rng(rng_before);
                return Err(err);
            }
        };

        let estimators = PlainEstimators::from_values(&weights, self.config.non_finite);
        let estimate = EstimateKind::Importance.estimate(&estimators);

        self.checkpoints.push(Checkpoint::new(
            rng_before,
            self.generator.rng().clone(),
            estimators,
            estimate.clone(),
            EstimateKind::Importance,
        ));
        callback.print(&self.checkpoints);

        Ok(estimate)
    }

    /// Combine all calls to `integrate` into a single estimate, or `None` if there was none.
    pub fn cumulative(&self) -> Option<IntegralEstimate<T>> {
        cumulative_estimate(&self.checkpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{SimpleCallback, SimpleCumulativeCallback};
    use crate::error::Error;
    use crate::sampling::ExponentialProposal;
    use assert_approx_eq::assert_approx_eq;

    fn rng() -> Pcg64 {
        Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96)
    }

    fn exp(points: &[Vec<f64>]) -> Vec<f64> {
        points.iter().map(|x| (-x[0]).exp()).collect()
    }

    #[test]
    fn proportional_proposal_has_no_variance() {
        let domain = Domain::new(vec![(0.0, 1.0)]).unwrap();
        let proposal = ExponentialProposal::new(domain.clone(), vec![1.0]).unwrap();
        let mut sampler =
            ImportanceSampler::with_rng(exp, domain, proposal, IntegrationConfig::default(), rng())
                .unwrap();
        let estimate = sampler.integrate(1000).unwrap();

        assert_approx_eq!(estimate.value(), 1.0 - (-1.0_f64).exp(), 1e-10);
        assert_approx_eq!(estimate.standard_error().unwrap(), 0.0, 1e-10);
    }

    #[test]
    fn zero_density_fails_without_consuming_random_numbers() {
        struct Vanishing;

        impl Proposal<f64> for Vanishing {
            fn dim(&self) -> usize {
                1
            }

            fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Vec<f64>> {
                (0..n).map(|_| vec![rng.gen()]).collect()
            }

            fn density(&self, points: &[Vec<f64>]) -> Vec<f64> {
                points
                    .iter()
                    .map(|x| if x[0] < 0.5 { 0.0 } else { 2.0 })
                    .collect()
            }
        }

        let domain = Domain::new(vec![(0.0, 1.0)]).unwrap();
        let mut sampler = ImportanceSampler::with_rng(
            exp,
            domain,
            Vanishing,
            IntegrationConfig::default(),
            rng(),
        )
        .unwrap();

        assert!(matches!(
            sampler.integrate(100),
            Err(Error::DivisionByZeroDensity { .. })
        ));
        assert!(sampler.checkpoints().is_empty());
        assert_eq!(
            serde_json::to_string(sampler.rng()).unwrap(),
            serde_json::to_string(&rng()).unwrap()
        );
    }

    #[test]
    fn cumulative_and_resume() {
        let domain = Domain::new(vec![(0.0, 2.0)]).unwrap();
        let proposal = ExponentialProposal::new(domain.clone(), vec![0.5]).unwrap();

        let mut sampler = ImportanceSampler::with_rng(
            exp,
            domain.clone(),
            proposal.clone(),
            IntegrationConfig::default(),
            rng(),
        )
        .unwrap();
        assert_eq!(sampler.cumulative(), None);

        sampler.integrate(100).unwrap();
        let second = sampler.integrate(100).unwrap();
        assert_eq!(sampler.cumulative().unwrap().calls(), 200);

        let mut resumed = ImportanceSampler::resume(
            exp,
            domain,
            proposal,
            IntegrationConfig::default(),
            &sampler.checkpoints()[0],
        )
        .unwrap();

        assert_eq!(resumed.integrate(100).unwrap(), second);
    }

    #[test]
    fn callbacks_combine_importance_estimates() {
        // int_0^2 dx exp(-x) = 1 - e^-2, the domain volume must not enter the weights
        let domain = Domain::new(vec![(0.0, 2.0)]).unwrap();
        let proposal = ExponentialProposal::new(domain.clone(), vec![0.5]).unwrap();
        let mut sampler =
            ImportanceSampler::with_rng(exp, domain, proposal, IntegrationConfig::default(), rng())
                .unwrap();

        sampler
            .integrate_with_callback(1000, &SimpleCallback {})
            .unwrap();
        sampler
            .integrate_with_callback(1000, &SimpleCumulativeCallback {})
            .unwrap();

        let cumulative = cumulative_estimate(sampler.checkpoints()).unwrap();
        assert_eq!(Some(cumulative.clone()), sampler.cumulative());
        assert_eq!(cumulative.calls(), 2000);
        assert_approx_eq!(
            cumulative.value(),
            1.0 - (-2.0_f64).exp(),
            5.0 * cumulative.standard_error().unwrap()
        );
    }
}
