//! The integration domain.
use crate::core::SampleBatch;
use crate::error::{Error, Result};
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// An axis-aligned box $[a_1, b_1] \times \ldots \times [a_d, b_d]$ with finite bounds.
///
/// A domain is validated once, when it is constructed, and is immutable afterwards. Its volume
/// is therefore always finite and positive.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "Vec<(T, T)>", into = "Vec<(T, T)>")]
pub struct Domain<T: Float> {
    intervals: Vec<(T, T)>,
    volume: T,
}

impl<T: Float> Domain<T> {
    /// Creates a domain from one `(low, high)` pair per dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDomain`] if `intervals` is empty, if a bound is not finite, if
    /// `low >= high` for any pair or if the volume overflows.
    pub fn new(intervals: Vec<(T, T)>) -> Result<Self> {
        if intervals.is_empty() {
            return Err(Error::InvalidDomain {
                reason: "the domain needs at least one dimension".to_string(),
            });
        }

        for (dim, &(low, high)) in intervals.iter().enumerate() {
            if !low.is_finite() || !high.is_finite() {
                return Err(Error::InvalidDomain {
                    reason: format!("the bounds of dimension {} are not finite", dim),
                });
            }

            if low >= high {
                return Err(Error::InvalidDomain {
                    reason: format!("the lower bound of dimension {} is not below its upper bound", dim),
                });
            }
        }

        let volume = intervals
            .iter()
            .fold(T::one(), |volume, &(low, high)| volume * (high - low));

        if !volume.is_finite() || volume <= T::zero() {
            return Err(Error::InvalidDomain {
                reason: "the volume of the domain is not a finite positive number".to_string(),
            });
        }

        Ok(Self { intervals, volume })
    }

    /// Creates a domain from a list of bounds, each of which must contain exactly a lower and an
    /// upper bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDomain`] for malformed pairs and everything that
    /// [`Domain::new`] rejects.
    pub fn from_bounds(bounds: &[Vec<T>]) -> Result<Self> {
        let intervals = bounds
            .iter()
            .enumerate()
            .map(|(dim, pair)| match pair.as_slice() {
                [low, high] => Ok((*low, *high)),
                _ => Err(Error::InvalidDomain {
                    reason: format!(
                        "dimension {} has {} bounds instead of two",
                        dim,
                        pair.len()
                    ),
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(intervals)
    }

    /// Returns the `(low, high)` pairs of this domain.
    pub fn intervals(&self) -> &[(T, T)] {
        &self.intervals
    }

    /// Returns the number of dimensions, $d$.
    pub fn dimensionality(&self) -> usize {
        self.intervals.len()
    }

    /// Returns the volume, $\prod_{i=1}^d (b_i - a_i)$.
    pub fn volume(&self) -> T {
        self.volume
    }

    /// Returns `true` if every coordinate of `point` lies within its closed interval. Points of
    /// the wrong dimensionality are never contained.
    pub fn contains(&self, point: &[T]) -> bool {
        point.len() == self.intervals.len()
            && point
                .iter()
                .zip(&self.intervals)
                .all(|(&x, &(low, high))| low <= x && x <= high)
    }

    /// Maps a point of the unit hypercube into the domain using $x_i = a_i + u_i (b_i - a_i)$.
    pub fn map_unit_to_domain(&self, unit_point: &[T]) -> Vec<T> {
        debug_assert_eq!(unit_point.len(), self.intervals.len());

        unit_point
            .iter()
            .zip(&self.intervals)
            .map(|(&u, &(low, high))| low + u * (high - low))
            .collect()
    }

    /// Maps every point of `batch` from the unit hypercube into the domain, in place.
    pub fn map_batch(&self, mut batch: SampleBatch<T>) -> SampleBatch<T> {
        for point in batch.points_mut() {
            for (x, &(low, high)) in point.iter_mut().zip(&self.intervals) {
                *x = low + *x * (high - low);
            }
        }

        batch
    }
}

impl<T: Float> TryFrom<Vec<(T, T)>> for Domain<T> {
    type Error = Error;

    fn try_from(intervals: Vec<(T, T)>) -> Result<Self> {
        Self::new(intervals)
    }
}

impl<T: Float> From<Domain<T>> for Vec<(T, T)> {
    fn from(domain: Domain<T>) -> Self {
        domain.intervals
    }
}
