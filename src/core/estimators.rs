//! This module contains everything related to estimators.
use crate::config::NonFinitePolicy;
use crate::core::count_to_float;
use crate::error::{Error, Result};
use num_traits::{Float, FromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::{Add, AddAssign};

/// Basic estimators, like the mean, variance, and the standard deviation.
pub trait BasicEstimators<T: Float> {
    /// Returns the mean value.
    fn mean(&self) -> T;

    /// Returns the variance, $V$.
    fn var(&self) -> T;

    /// Returns the standard deviation, $\sigma = \sqrt{V}$.
    fn std(&self) -> T {
        self.var().sqrt()
    }
}

/// More estimators.
pub trait Estimators<T: Float>: BasicEstimators<T> {
    /// Returns the number of times $N$, the integrand has been called.
    fn calls(&self) -> usize;

    /// Returns the number of times, $N_\mathrm{nf}$, the integrand has been called
    /// and its return value was non-finite.
    fn non_finite_calls(&self) -> usize;

    /// Returns the number of times, $N_\mathrm{nz}$, the integrand has been called
    /// and its return value was non-zero.
    fn non_zero_calls(&self) -> usize;
}

/// Everything that needs to be updated.
pub trait Updateable<T> {
    /// Update this estimator with `value`.
    fn update(&mut self, value: T);
}

/// Running mean and sum of squared deviations (Welford) of the values a solver has seen. The
/// variance they report is the variance of the mean, so that [`BasicEstimators::std`] is the
/// standard error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlainEstimators<T> {
    mean: T,
    m2: T,
    calls: usize,
    non_finite_calls: usize,
    non_zero_calls: usize,
    policy: NonFinitePolicy,
}

impl<T: Float> Default for PlainEstimators<T> {
    fn default() -> Self {
        Self::with_policy(NonFinitePolicy::default())
    }
}

impl<T: Float> PlainEstimators<T> {
    /// Creates empty estimators that treat non-finite values according to `policy`.
    pub fn with_policy(policy: NonFinitePolicy) -> Self {
        Self {
            mean: T::zero(),
            m2: T::zero(),
            calls: 0,
            non_finite_calls: 0,
            non_zero_calls: 0,
            policy,
        }
    }

    /// Creates estimators from all `values`.
    pub fn from_values(values: &[T], policy: NonFinitePolicy) -> Self
    where
        T: AddAssign + FromPrimitive,
    {
        values.iter().fold(Self::with_policy(policy), |mut acc, &value| {
            acc.update(value);
            acc
        })
    }

    /// Returns the sum of all accumulated values.
    pub fn sum(&self) -> T
    where
        T: FromPrimitive,
    {
        self.mean * count_to_float(self.calls)
    }
}

impl<T: Float + FromPrimitive> Add for PlainEstimators<T> {
    type Output = Self;

    /// Merges the two sets of values with the pairwise update of Chan et al.
    fn add(self, other: Self) -> Self {
        let calls = self.calls + other.calls;

        let (mean, m2) = if self.calls == 0 {
            (other.mean, other.m2)
        } else if other.calls == 0 {
            (self.mean, self.m2)
        } else {
            let n_a: T = count_to_float(self.calls);
            let n_b: T = count_to_float(other.calls);
            let n: T = count_to_float(calls);
            let delta = other.mean - self.mean;

            (
                self.mean + delta * n_b / n,
                self.m2 + other.m2 + delta * delta * n_a * n_b / n,
            )
        };

        Self {
            mean,
            m2,
            calls,
            non_finite_calls: self.non_finite_calls + other.non_finite_calls,
            non_zero_calls: self.non_zero_calls + other.non_zero_calls,
            policy: self.policy,
        }
    }
}

impl<T> BasicEstimators<T> for PlainEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn mean(&self) -> T {
        if self.calls == 0 {
            T::nan()
        } else {
            self.mean
        }
    }

    /// The variance of the mean, $\frac{1}{N(N-1)} \sum (f - \langle f \rangle)^2$. Not
    /// defined for less than two calls.
    fn var(&self) -> T {
        let calls: T = count_to_float(self.calls);

        self.m2 / calls / (calls - T::one())
    }
}

impl<T> Estimators<T> for PlainEstimators<T>
where
    T: Float + FromPrimitive,
{
    fn calls(&self) -> usize {
        self.calls
    }

    fn non_finite_calls(&self) -> usize {
        self.non_finite_calls
    }

    fn non_zero_calls(&self) -> usize {
        self.non_zero_calls
    }
}

impl<T> Updateable<T> for PlainEstimators<T>
where
    T: AddAssign + Float + FromPrimitive,
{
    fn update(&mut self, value: T) {
        self.calls += 1;

        let mut value = value;

        if value != T::zero() {
            self.non_zero_calls += 1;

            if !value.is_finite() {
                self.non_finite_calls += 1;

                if self.policy == NonFinitePolicy::Discard {
                    value = T::zero();
                }
            }
        }

        let delta = value - self.mean;
        self.mean += delta / count_to_float(self.calls);
        self.m2 += delta * (value - self.mean);
    }
}

/// Divide every integrand value by the proposal density at the same point.
///
/// # Errors
///
/// Returns [`Error::DivisionByZeroDensity`] if a density is zero and [`Error::InvalidDensity`]
/// if a density is negative or not a number.
pub fn importance_weights<T: Float>(values: &[T], densities: &[T]) -> Result<Vec<T>> {
    if values.len() != densities.len() {
        return Err(Error::IntegrandShapeMismatch {
            expected: densities.len(),
            actual: values.len(),
        });
    }

    values
        .iter()
        .zip(densities)
        .enumerate()
        .map(|(index, (&value, &density))| {
            if density == T::zero() {
                Err(Error::DivisionByZeroDensity { index })
            } else if density > T::zero() {
                Ok(value / density)
            } else {
                Err(Error::InvalidDensity {
                    index,
                    density: density.to_f64().unwrap_or(f64::NAN),
                })
            }
        })
        .collect()
}

/// The uncertainty attached to an [`IntegralEstimate`].
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum ErrorEstimate<T> {
    /// The standard error of a Monte Carlo estimate, in the units of the integral.
    StandardError(T),
    /// The L2-star discrepancy of the unit hypercube points a Quasi-Monte Carlo estimate was
    /// computed from. It is dimensionless; by the Koksma-Hlawka inequality it bounds the error
    /// only after multiplication with the variation of the integrand.
    L2StarDiscrepancy(T),
}

/// The result of an integration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct IntegralEstimate<T> {
    value: T,
    error: Option<ErrorEstimate<T>>,
    calls: usize,
    non_finite_calls: usize,
}

impl<T> IntegralEstimate<T>
where
    T: Float + FromPrimitive,
{
    /// The plain Monte Carlo estimate $V \langle f \rangle$ with the standard error $V
    /// \sigma_{\langle f \rangle}$, which is only available for two or more calls.
    pub fn plain(estimators: &PlainEstimators<T>, volume: T) -> Self {
        let error = if estimators.calls() >= 2 {
            Some(ErrorEstimate::StandardError(volume * estimators.std()))
        } else {
            None
        };

        Self::new(volume * estimators.mean(), error, estimators)
    }

    /// The importance sampling estimate $\langle f / p \rangle$ with its standard error. The
    /// estimators must have been filled with the ratios of integrand and proposal density.
    pub fn importance(estimators: &PlainEstimators<T>) -> Self {
        Self::plain(estimators, T::one())
    }

    /// The Quasi-Monte Carlo estimate $V \langle f \rangle$. No statistical error is
    /// available for deterministic points; `discrepancy` is attached if it was computed.
    pub fn quasi(estimators: &PlainEstimators<T>, volume: T, discrepancy: Option<T>) -> Self {
        Self::new(
            volume * estimators.mean(),
            discrepancy.map(ErrorEstimate::L2StarDiscrepancy),
            estimators,
        )
    }

    fn new(value: T, error: Option<ErrorEstimate<T>>, estimators: &PlainEstimators<T>) -> Self {
        Self {
            value,
            error,
            calls: estimators.calls(),
            non_finite_calls: estimators.non_finite_calls(),
        }
    }

    /// Returns the estimated value of the integral.
    pub fn value(&self) -> T {
        self.value
    }

    /// Returns the uncertainty of the estimate, if there is one.
    pub fn error(&self) -> Option<ErrorEstimate<T>> {
        self.error
    }

    /// Returns the standard error, if this is a Monte Carlo estimate of at least two calls.
    pub fn standard_error(&self) -> Option<T> {
        match self.error {
            Some(ErrorEstimate::StandardError(error)) => Some(error),
            _ => None,
        }
    }

    /// Returns the L2-star discrepancy, if this is a Quasi-Monte Carlo estimate that computed
    /// it.
    pub fn discrepancy(&self) -> Option<T> {
        match self.error {
            Some(ErrorEstimate::L2StarDiscrepancy(discrepancy)) => Some(discrepancy),
            _ => None,
        }
    }

    /// Returns the number of integrand evaluations.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Returns how many integrand evaluations were not finite.
    pub fn non_finite_calls(&self) -> usize {
        self.non_finite_calls
    }
}

/// How the estimators of a checkpoint turn into an [`IntegralEstimate`].
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum EstimateKind<T> {
    /// Plain Monte Carlo over a domain with the given volume.
    Plain {
        /// The volume of the integration domain.
        volume: T,
    },
    /// Importance sampling; the estimators hold the ratios of integrand and density.
    Importance,
    /// Quasi-Monte Carlo over a domain with the given volume.
    Quasi {
        /// The volume of the integration domain.
        volume: T,
    },
}

impl<T> EstimateKind<T>
where
    T: Float + FromPrimitive,
{
    /// Build the estimate from `estimators`. Quasi-Monte Carlo estimates built this way carry
    /// no discrepancy.
    pub fn estimate(&self, estimators: &PlainEstimators<T>) -> IntegralEstimate<T> {
        match *self {
            Self::Plain { volume } => IntegralEstimate::plain(estimators, volume),
            Self::Importance => IntegralEstimate::importance(estimators),
            Self::Quasi { volume } => IntegralEstimate::quasi(estimators, volume, None),
        }
    }
}

impl<T: Display> Display for IntegralEstimate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(ErrorEstimate::StandardError(error)) => {
                write!(f, "{} \u{b1} {}", self.value, error)
            }
            Some(ErrorEstimate::L2StarDiscrepancy(discrepancy)) => {
                write!(f, "{} (L2-star discrepancy {})", self.value, discrepancy)
            }
            None => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn plain_estimators_from_values() {
        let values = [1.0, 2.0, 0.0, 5.0];
        let estimators = PlainEstimators::from_values(&values, NonFinitePolicy::Propagate);

        assert_eq!(estimators.calls(), 4);
        assert_eq!(estimators.non_zero_calls(), 3);
        assert_eq!(estimators.non_finite_calls(), 0);
        assert_approx_eq!(estimators.mean(), 2.0);
        // sample variance 14/3, divided by N = 4
        assert_approx_eq!(estimators.var(), 14.0 / 3.0 / 4.0);
    }

    #[test]
    fn constant_values_have_zero_variance() {
        let values = vec![0.1; 1000];
        let estimators = PlainEstimators::from_values(&values, NonFinitePolicy::Propagate);

        assert!(estimators.var() >= 0.0);
        assert_approx_eq!(estimators.std(), 0.0, 1e-12);
    }

    #[test]
    fn large_offset_does_not_cancel() {
        let values = [1e8 + 1.0, 1e8 + 2.0, 1e8 + 3.0];
        let estimators = PlainEstimators::from_values(&values, NonFinitePolicy::Propagate);

        assert_approx_eq!(estimators.mean(), 1e8 + 2.0);
        // sample variance 1, divided by N = 3
        assert_approx_eq!(estimators.var(), 1.0 / 3.0, 1e-9);

        let ratios = vec![0.632_120_558_828_557_7; 1000];
        let estimators = PlainEstimators::from_values(&ratios, NonFinitePolicy::Propagate);
        assert_eq!(estimators.var(), 0.0);
    }

    #[test]
    fn add_estimators() {
        let first = PlainEstimators::from_values(&[1.0, 2.0], NonFinitePolicy::Propagate);
        let second = PlainEstimators::from_values(&[3.0, 4.0], NonFinitePolicy::Propagate);
        let all = PlainEstimators::from_values(&[1.0, 2.0, 3.0, 4.0], NonFinitePolicy::Propagate);
        let sum = first + second;

        assert_eq!(sum.calls(), all.calls());
        assert_approx_eq!(sum.mean(), all.mean());
        assert_approx_eq!(sum.var(), all.var());
    }

    #[test]
    fn non_finite_values() {
        let values = [1.0, f64::NAN, 3.0, f64::INFINITY];

        let propagated = PlainEstimators::from_values(&values, NonFinitePolicy::Propagate);
        assert_eq!(propagated.non_finite_calls(), 2);
        assert!(propagated.mean().is_nan());

        let discarded = PlainEstimators::from_values(&values, NonFinitePolicy::Discard);
        assert_eq!(discarded.calls(), 4);
        assert_eq!(discarded.non_finite_calls(), 2);
        assert_approx_eq!(discarded.mean(), 1.0);
    }

    #[test]
    fn plain_estimate_needs_two_calls_for_an_error() {
        let one = PlainEstimators::from_values(&[2.0], NonFinitePolicy::Propagate);
        let estimate = IntegralEstimate::plain(&one, 3.0);

        assert_approx_eq!(estimate.value(), 6.0);
        assert_eq!(estimate.error(), None);

        let two = PlainEstimators::from_values(&[1.0, 3.0], NonFinitePolicy::Propagate);
        let estimate = IntegralEstimate::plain(&two, 3.0);

        assert_approx_eq!(estimate.value(), 6.0);
        // the standard error of the mean of {1, 3} is 1
        assert_approx_eq!(estimate.standard_error().unwrap(), 3.0);
        assert_eq!(estimate.discrepancy(), None);
    }

    #[test]
    fn quasi_estimate_never_has_a_standard_error() {
        let estimators = PlainEstimators::from_values(&[1.0, 3.0], NonFinitePolicy::Propagate);

        let estimate = IntegralEstimate::quasi(&estimators, 2.0, None);
        assert_approx_eq!(estimate.value(), 4.0);
        assert_eq!(estimate.error(), None);

        let estimate = IntegralEstimate::quasi(&estimators, 2.0, Some(0.25));
        assert_eq!(estimate.standard_error(), None);
        assert_eq!(estimate.discrepancy(), Some(0.25));
    }

    #[test]
    fn weights() {
        let weights = importance_weights(&[1.0, 2.0], &[0.5, 4.0]).unwrap();
        assert_eq!(weights, vec![2.0, 0.5]);

        assert!(matches!(
            importance_weights(&[1.0, 2.0], &[0.5, 0.0]),
            Err(Error::DivisionByZeroDensity { index: 1 })
        ));
        assert!(matches!(
            importance_weights(&[1.0, 2.0], &[-0.5, 1.0]),
            Err(Error::InvalidDensity { index: 0, .. })
        ));
        assert!(matches!(
            importance_weights(&[1.0], &[f64::NAN]),
            Err(Error::InvalidDensity { index: 0, .. })
        ));
    }

    #[test]
    fn estimate_kinds() {
        let estimators = PlainEstimators::from_values(&[1.0, 3.0], NonFinitePolicy::Propagate);

        let plain = EstimateKind::Plain { volume: 2.0 }.estimate(&estimators);
        assert_approx_eq!(plain.value(), 4.0);
        assert_approx_eq!(plain.standard_error().unwrap(), 2.0);

        let importance = EstimateKind::Importance.estimate(&estimators);
        assert_approx_eq!(importance.value(), 2.0);
        assert_approx_eq!(importance.standard_error().unwrap(), 1.0);

        let quasi = EstimateKind::Quasi { volume: 2.0 }.estimate(&estimators);
        assert_approx_eq!(quasi.value(), 4.0);
        assert_eq!(quasi.error(), None);
    }

    #[test]
    fn display() {
        let estimators = PlainEstimators::from_values(&[1.0, 3.0], NonFinitePolicy::Propagate);

        assert_eq!(IntegralEstimate::plain(&estimators, 1.0).to_string(), "2 \u{b1} 1");
        assert_eq!(IntegralEstimate::quasi(&estimators, 1.0, None).to_string(), "2");
    }
}
