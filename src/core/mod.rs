//! The core module
pub mod domain;
pub mod estimators;

use crate::core::estimators::{EstimateKind, IntegralEstimate, PlainEstimators};
use crate::error::{Error, Result};
use num_traits::{Float, FromPrimitive};
use serde::{Deserialize, Serialize};

/// Integrand trait
///
/// The integrand is evaluated on whole batches: it receives all points of one integration at
/// once and must return one value per point, in the same order.
pub trait Integrand<T> {
    /// Evaluate the integrand for every point in `points`.
    fn call(&self, points: &[Vec<T>]) -> Vec<T>;
}

impl<T, F> Integrand<T> for F
where
    F: Fn(&[Vec<T>]) -> Vec<T>,
{
    fn call(&self, points: &[Vec<T>]) -> Vec<T> {
        self(points)
    }
}

/// An ordered set of points, all of the same dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBatch<T> {
    points: Vec<Vec<T>>,
}

impl<T> SampleBatch<T> {
    /// Constructor
    pub fn new(points: Vec<Vec<T>>) -> Self {
        Self { points }
    }

    /// Returns the points of this batch.
    pub fn points(&self) -> &[Vec<T>] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [Vec<T>] {
        &mut self.points
    }

    /// Returns the number of points, $N$.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the batch contains no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consumes the batch and returns its points.
    pub fn into_points(self) -> Vec<Vec<T>> {
        self.points
    }
}

/// Evaluate `integrand` on `batch` and check that it returned one value per point.
///
/// # Errors
///
/// Returns [`Error::IntegrandShapeMismatch`] if the number of values differs from the number of
/// points.
pub fn evaluate_batch<T, I>(integrand: &I, batch: &SampleBatch<T>) -> Result<Vec<T>>
where
    I: Integrand<T> + ?Sized,
{
    let values = integrand.call(batch.points());

    if values.len() == batch.len() {
        Ok(values)
    } else {
        Err(Error::IntegrandShapeMismatch {
            expected: batch.len(),
            actual: values.len(),
        })
    }
}

/// A checkpoint saves the state of a generator before and after one call to `integrate`.
/// Checkpoints can be used to replay or resume integrations.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Checkpoint<T, S> {
    state_before: S,
    state_after: S,
    estimators: PlainEstimators<T>,
    estimate: IntegralEstimate<T>,
    kind: EstimateKind<T>,
}

impl<T, S> Checkpoint<T, S> {
    /// Constructor
    pub(crate) fn new(
        state_before: S,
        state_after: S,
        estimators: PlainEstimators<T>,
        estimate: IntegralEstimate<T>,
        kind: EstimateKind<T>,
    ) -> Self {
        Self {
            state_before,
            state_after,
            estimators,
            estimate,
            kind,
        }
    }

    /// Returns the generator state before generation of this checkpoint.
    pub fn state_before(&self) -> &S {
        &self.state_before
    }

    /// Returns the generator state after generation of this checkpoint.
    pub fn state_after(&self) -> &S {
        &self.state_after
    }

    /// Returns the estimators of this checkpoint.
    pub fn estimators(&self) -> &PlainEstimators<T> {
        &self.estimators
    }

    /// Returns the estimate of the integral.
    pub fn estimate(&self) -> &IntegralEstimate<T> {
        &self.estimate
    }

    /// Returns how the estimators of this checkpoint are turned into an estimate.
    pub fn kind(&self) -> &EstimateKind<T> {
        &self.kind
    }
}

/// Sum the estimators of all `chkpts`.
pub fn combine_estimators<'a, T, S, It>(chkpts: It) -> PlainEstimators<T>
where
    T: Float + FromPrimitive + 'a,
    S: 'a,
    It: IntoIterator<Item = &'a Checkpoint<T, S>>,
{
    chkpts
        .into_iter()
        .fold(PlainEstimators::default(), |acc, c| acc + c.estimators().clone())
}

/// Combine all `chkpts` into one estimate of the kind of the last checkpoint, or `None` if there
/// are no checkpoints.
pub fn cumulative_estimate<'a, T, S, It>(chkpts: It) -> Option<IntegralEstimate<T>>
where
    T: Float + FromPrimitive + 'a,
    S: 'a,
    It: IntoIterator<Item = &'a Checkpoint<T, S>>,
{
    let mut kind = None;
    let estimators = chkpts
        .into_iter()
        .fold(PlainEstimators::default(), |acc, c| {
            kind = Some(c.kind());
            acc + c.estimators().clone()
        });

    kind.map(|kind| kind.estimate(&estimators))
}

/// Convert a count into the numeric type `T`, giving `nan` if it is not representable.
pub(crate) fn count_to_float<T: Float + FromPrimitive>(n: usize) -> T {
    T::from_usize(n).unwrap_or_else(T::nan)
}

/// Convert an `f64` into the numeric type `T`, giving `nan` if it is not representable.
pub(crate) fn f64_to_float<T: Float + FromPrimitive>(x: f64) -> T {
    T::from_f64(x).unwrap_or_else(T::nan)
}
