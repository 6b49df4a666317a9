//! Quasi-Monte Carlo integrator
use crate::callbacks::{Callback, SinkCallback};
use crate::config::{IntegrationConfig, SampleSpace, SequenceFamily};
use crate::core::domain::Domain;
use crate::core::estimators::{EstimateKind, IntegralEstimate, PlainEstimators};
use crate::core::{cumulative_estimate, evaluate_batch, Checkpoint, Integrand};
use crate::error::Result;
use crate::integrators::check_sample_count;
use crate::sampling::{
    l2_star_discrepancy, seeded_rng, HaltonSequence, LowDiscrepancySequence, SobolSequence,
};

use num_traits::{Float, FromPrimitive};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// The position of a low-discrepancy sequence: its family, the index of the next point and the
/// seed of the digital shift of a scrambled Sobol sequence.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SequenceState {
    family: SequenceFamily,
    cursor: u64,
    #[serde(default)]
    shift_seed: Option<u64>,
}

impl SequenceState {
    /// Constructor
    pub fn new(family: SequenceFamily, cursor: u64, shift_seed: Option<u64>) -> Self {
        Self {
            family,
            cursor,
            shift_seed,
        }
    }

    /// Returns the sequence family.
    pub fn family(&self) -> SequenceFamily {
        self.family
    }

    /// Returns the index of the next point.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Returns the seed of the digital shift, or `None` if the sequence is not scrambled.
    pub fn shift_seed(&self) -> Option<u64> {
        self.shift_seed
    }
}

/// A checkpoint of the Quasi-Monte Carlo integrator: the sequence position before and after
/// the call.
pub type QuasiCheckpoint<T> = Checkpoint<T, SequenceState>;

/// Integrates with the points of a low-discrepancy sequence,
///
/// $$ I \approx \frac{V}{N} \sum_{j=k}^{k+N-1} f \left( x^{(j)} \right), $$
///
/// where $k$ is the cursor of the sequence. Every call continues the sequence, so successive
/// calls never reuse points. Sobol and Halton sequences keep separate cursors.
///
/// The estimate carries no standard error. If enabled in the configuration, the L2-star
/// discrepancy of the unit hypercube points is attached instead.
pub struct QuasiMonteCarloSolver<T: Float, I> {
    integrand: I,
    domain: Domain<T>,
    config: IntegrationConfig,
    shift_seed: Option<u64>,
    sobol: Option<SobolSequence<T>>,
    halton: Option<HaltonSequence<T>>,
    checkpoints: Vec<QuasiCheckpoint<T>>,
}

impl<T, I> QuasiMonteCarloSolver<T, I>
where
    T: Float + FromPrimitive + AddAssign,
    I: Integrand<T>,
{
    /// Create a solver with the default configuration, which integrates with the Sobol
    /// sequence.
    ///
    /// # Errors
    ///
    /// See [`QuasiMonteCarloSolver::with_config`].
    pub fn new(integrand: I, domain: Domain<T>) -> Result<Self> {
        Self::with_config(integrand, domain, IntegrationConfig::default())
    }

    /// Create a solver whose default sequence is the one named in `config`. A scrambled Sobol
    /// sequence without a seed in `config` draws its shift seed from entropy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDimension`](crate::Error::UnsupportedDimension) if the
    /// configured family does not support the dimensionality of `domain`.
    pub fn with_config(integrand: I, domain: Domain<T>, config: IntegrationConfig) -> Result<Self> {
        let shift_seed = if config.scramble {
            Some(config.seed.unwrap_or_else(|| seeded_rng(None).gen()))
        } else {
            None
        };

        Self::with_shift_seed(integrand, domain, config, shift_seed)
    }

    fn with_shift_seed(
        integrand: I,
        domain: Domain<T>,
        config: IntegrationConfig,
        shift_seed: Option<u64>,
    ) -> Result<Self> {
        let mut solver = Self {
            integrand,
            domain,
            config,
            shift_seed,
            sobol: None,
            halton: None,
            checkpoints: Vec::new(),
        };

        solver.sequence(solver.config.sequence_family)?;

        Ok(solver)
    }

    /// Create a solver whose sequence continues where the call that produced `chkpt` stopped.
    /// The digital shift recorded in `chkpt` replaces the one `config` would choose.
    ///
    /// # Errors
    ///
    /// See [`QuasiMonteCarloSolver::with_config`].
    pub fn resume(
        integrand: I,
        domain: Domain<T>,
        config: IntegrationConfig,
        chkpt: &QuasiCheckpoint<T>,
    ) -> Result<Self> {
        let state = chkpt.state_after();
        let mut solver = Self::with_shift_seed(integrand, domain, config, state.shift_seed())?;
        solver.seek(state.family(), state.cursor())?;

        Ok(solver)
    }

    /// Returns the integration domain.
    pub fn domain(&self) -> &Domain<T> {
        &self.domain
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Returns the checkpoints of all successful calls, in order and for all families.
    pub fn checkpoints(&self) -> &[QuasiCheckpoint<T>] {
        &self.checkpoints
    }

    /// Returns the seed of the digital shift of the Sobol sequence, or `None` if it is not
    /// scrambled.
    pub fn shift_seed(&self) -> Option<u64> {
        self.shift_seed
    }

    /// Returns the index of the next point of `family`. Unused families are at zero.
    pub fn cursor(&self, family: SequenceFamily) -> u64 {
        match family {
            SequenceFamily::Sobol => self.sobol.as_ref().map_or(0, |s| s.cursor()),
            SequenceFamily::Halton => self.halton.as_ref().map_or(0, |s| s.cursor()),
        }
    }

    /// Move the cursor of `family` to `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDimension`](crate::Error::UnsupportedDimension) if `family`
    /// does not support the dimensionality of the domain.
    pub fn seek(&mut self, family: SequenceFamily, index: u64) -> Result<()> {
        self.sequence(family)?.seek(index);
        Ok(())
    }

    /// Estimate the integral with the next `num_samples` points of the configured sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSampleCount`](crate::Error::InvalidSampleCount) for zero samples,
    /// [`Error::SequenceExhausted`](crate::Error::SequenceExhausted) if the sequence has fewer
    /// points left and [`Error::IntegrandShapeMismatch`](crate::Error::IntegrandShapeMismatch)
    /// for a misbehaving integrand. After an error the cursor is unchanged.
    pub fn integrate(&mut self, num_samples: usize) -> Result<IntegralEstimate<T>> {
        self.integrate_family(num_samples, self.config.sequence_family, &SinkCallback {})
    }

    /// Estimate the integral with the next `num_samples` points of the Sobol sequence.
    ///
    /// # Errors
    ///
    /// See [`QuasiMonteCarloSolver::integrate`].
    pub fn integrate_sobol(&mut self, num_samples: usize) -> Result<IntegralEstimate<T>> {
        self.integrate_family(num_samples, SequenceFamily::Sobol, &SinkCallback {})
    }

    /// Estimate the integral with the next `num_samples` points of the Halton sequence.
    ///
    /// # Errors
    ///
    /// See [`QuasiMonteCarloSolver::integrate`].
    pub fn integrate_halton(&mut self, num_samples: usize) -> Result<IntegralEstimate<T>> {
        self.integrate_family(num_samples, SequenceFamily::Halton, &SinkCallback {})
    }

    /// Like [`QuasiMonteCarloSolver::integrate`], but hands all checkpoints to `callback`
    /// after the integration.
    ///
    /// # Errors
    ///
    /// See [`QuasiMonteCarloSolver::integrate`].
    pub fn integrate_with_callback(
        &mut self,
        num_samples: usize,
        callback: &impl Callback<T, SequenceState>,
    ) -> Result<IntegralEstimate<T>> {
        self.integrate_family(num_samples, self.config.sequence_family, callback)
    }

    /// Estimate the integral with the next `num_samples` points of `family` and hand all
    /// checkpoints to `callback`.
    ///
    /// # Errors
    ///
    /// See [`QuasiMonteCarloSolver::integrate`].
    pub fn integrate_family(
        &mut self,
        num_samples: usize,
        family: SequenceFamily,
        callback: &impl Callback<T, SequenceState>,
    ) -> Result<IntegralEstimate<T>> {
        check_sample_count(num_samples)?;

        // generation leaves the cursor alone when it fails
        let (unit, before, after) = {
            let sequence = self.sequence(family)?;
            let before = sequence.cursor();
            let unit = sequence.generate(num_samples)?;
            (unit, before, sequence.cursor())
        };

        let discrepancy = if self.config.discrepancy {
            l2_star_discrepancy(&unit)
        } else {
            None
        };

        let batch = match self.config.sample_space {
            SampleSpace::Domain => self.domain.map_batch(unit),
            SampleSpace::Unit => unit,
        };

        let values = match evaluate_batch(&self.integrand, &batch) {
            Ok(values) => values,
            Err(err) => {
                self.seek(family, before)?;
                return Err(err);
            }
        };

        let volume = self.domain.volume();
        let estimators = PlainEstimators::from_values(&values, self.config.non_finite);
        let estimate = IntegralEstimate::quasi(&estimators, volume, discrepancy);
        let shift_seed = match family {
            SequenceFamily::Sobol => self.shift_seed,
            SequenceFamily::Halton => None,
        };

        self.checkpoints.push(Checkpoint::new(
            SequenceState::new(family, before, shift_seed),
            SequenceState::new(family, after, shift_seed),
            estimators,
            estimate.clone(),
            EstimateKind::Quasi { volume },
        ));
        callback.print(&self.checkpoints);

        Ok(estimate)
    }

    /// Combine all calls with the configured sequence into one estimate, or `None` if there
    /// was none. The combined estimate carries no discrepancy.
    pub fn cumulative(&self) -> Option<IntegralEstimate<T>> {
        self.cumulative_of(self.config.sequence_family)
    }

    /// Combine all calls with `family` into one estimate, or `None` if there was none.
    pub fn cumulative_of(&self, family: SequenceFamily) -> Option<IntegralEstimate<T>> {
        cumulative_estimate(
            self.checkpoints
                .iter()
                .filter(|c| c.state_before().family() == family),
        )
    }

    /// The sequence of `family`, created on first use.
    fn sequence(&mut self, family: SequenceFamily) -> Result<&mut dyn LowDiscrepancySequence<T>> {
        let dim = self.domain.dimensionality();

        let sequence: &mut dyn LowDiscrepancySequence<T> = match family {
            SequenceFamily::Sobol => {
                let sobol = match self.sobol.take() {
                    Some(sobol) => sobol,
                    None => match self.shift_seed {
                        Some(seed) => SobolSequence::scrambled(dim, Some(seed))?,
                        None => SobolSequence::new(dim)?,
                    },
                };
                self.sobol.get_or_insert(sobol)
            }
            SequenceFamily::Halton => {
                let halton = match self.halton.take() {
                    Some(halton) => halton,
                    None => HaltonSequence::new(dim)?,
                };
                self.halton.get_or_insert(halton)
            }
        };

        Ok(sequence)
    }
}
