//! Halton sequences.
use super::{LowDiscrepancySequence, SampleGenerator};
use crate::core::{f64_to_float, SampleBatch};
use crate::error::{Error, Result};
use num_traits::{Float, FromPrimitive};
use std::marker::PhantomData;

/// The bases of the first dimensions.
const PRIMES: [u64; 100] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293,
    307, 311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541,
];

/// The largest supported dimension.
pub const MAX_DIMENSION: usize = PRIMES.len();

/// The radical inverse of `index` in `base`: its digits mirrored at the radix point.
fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut result = 0.0;

    while index > 0 {
        result += factor * (index % base) as f64;
        index /= base;
        factor *= inv_base;
    }

    result
}

/// The Halton sequence, whose $j$-th coordinate is the radical inverse in the $j$-th prime.
///
/// Cursor position $k$ corresponds to the sequence index $k + 1$; the origin, which every
/// radical inverse maps zero to, is skipped.
#[derive(Clone, Debug)]
pub struct HaltonSequence<T> {
    dim: usize,
    cursor: u64,
    numeric: PhantomData<T>,
}

impl<T> HaltonSequence<T> {
    /// Creates the sequence for `dim` dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDimension`] if `dim` is zero or larger than
    /// [`MAX_DIMENSION`].
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 || dim > MAX_DIMENSION {
            return Err(Error::UnsupportedDimension {
                family: "halton".to_string(),
                requested: dim,
                max: MAX_DIMENSION,
            });
        }

        Ok(Self {
            dim,
            cursor: 0,
            numeric: PhantomData,
        })
    }
}

impl<T> SampleGenerator<T> for HaltonSequence<T>
where
    T: Float + FromPrimitive,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn generate(&mut self, n: usize) -> Result<SampleBatch<T>> {
        let end = self
            .cursor
            .checked_add(n as u64)
            .filter(|&end| end < u64::MAX)
            .ok_or_else(|| Error::SequenceExhausted {
                family: "halton".to_string(),
                max: u64::MAX - 1,
            })?;

        let points = (self.cursor..end)
            .map(|k| {
                PRIMES[..self.dim]
                    .iter()
                    .map(|&base| f64_to_float(radical_inverse(k + 1, base)))
                    .collect::<Vec<T>>()
            })
            .collect();

        self.cursor = end;

        Ok(SampleBatch::new(points))
    }
}

impl<T> LowDiscrepancySequence<T> for HaltonSequence<T>
where
    T: Float + FromPrimitive,
{
    fn cursor(&self) -> u64 {
        self.cursor
    }

    fn seek(&mut self, index: u64) {
        self.cursor = index;
    }

    fn max_dimension(&self) -> usize {
        MAX_DIMENSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn radical_inverses() {
        assert_approx_eq!(radical_inverse(1, 2), 0.5);
        assert_approx_eq!(radical_inverse(6, 2), 0.375);
        assert_approx_eq!(radical_inverse(5, 3), 7.0 / 9.0);
        assert_approx_eq!(radical_inverse(0, 5), 0.0);
    }

    #[test]
    fn first_points() {
        let mut halton = HaltonSequence::<f64>::new(2).unwrap();
        let points = halton.generate(3).unwrap().into_points();

        assert_approx_eq!(points[0][0], 0.5);
        assert_approx_eq!(points[0][1], 1.0 / 3.0);
        assert_approx_eq!(points[1][0], 0.25);
        assert_approx_eq!(points[1][1], 2.0 / 3.0);
        assert_approx_eq!(points[2][0], 0.75);
        assert_approx_eq!(points[2][1], 1.0 / 9.0);
    }

    #[test]
    fn successive_batches_are_a_prefix() {
        let mut split = HaltonSequence::<f64>::new(4).unwrap();
        let mut points = split.generate(17).unwrap().into_points();
        points.extend(split.generate(83).unwrap().into_points());

        let mut fresh = HaltonSequence::<f64>::new(4).unwrap();

        assert_eq!(points, fresh.generate(100).unwrap().into_points());
    }

    #[test]
    fn primes_are_prime() {
        for &p in PRIMES.iter() {
            assert!((2..p).take_while(|d| d * d <= p).all(|d| p % d != 0));
        }
        assert!(PRIMES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unsupported_dimensions() {
        assert!(HaltonSequence::<f64>::new(MAX_DIMENSION).is_ok());
        assert!(matches!(
            HaltonSequence::<f64>::new(MAX_DIMENSION + 1),
            Err(Error::UnsupportedDimension { .. })
        ));
    }
}
