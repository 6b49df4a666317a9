//! Sobol sequences.
//!
//! The $j$-th coordinate of the $k$-th point is the XOR of the direction numbers $v_{j,b}$ for
//! all bits $b$ set in the Gray code $k \oplus \lfloor k/2 \rfloor$. Successive Gray codes
//! differ in a single bit, so each further point costs one XOR per dimension. The direction
//! numbers are those of S. Joe and F. Y. Kuo, *Constructing Sobol sequences with better
//! two-dimensional projections*, SIAM J. Sci. Comput. 30, 2635 (2008).
use super::{seeded_rng, LowDiscrepancySequence, SampleGenerator};
use crate::core::{f64_to_float, SampleBatch};
use crate::error::{Error, Result};
use num_traits::{Float, FromPrimitive};
use rand::Rng;
use std::marker::PhantomData;

/// Number of bits of each coordinate.
const BITS: usize = 32;

/// The largest number of points a sequence can produce.
pub const MAX_POINTS: u64 = 1 << BITS;

/// Degree $s$, coefficients $a$ and initial direction numbers $m_1, \ldots, m_s$ of the
/// primitive polynomials for the dimensions two and higher. The first dimension is the van der
/// Corput sequence in base two.
const JOE_KUO: [(usize, u32, &[u32]); 20] = [
    (1, 0, &[1]),
    (2, 1, &[1, 3]),
    (3, 1, &[1, 3, 1]),
    (3, 2, &[1, 1, 1]),
    (4, 1, &[1, 1, 3, 3]),
    (4, 4, &[1, 3, 5, 13]),
    (5, 2, &[1, 1, 5, 5, 17]),
    (5, 4, &[1, 1, 5, 5, 5]),
    (5, 7, &[1, 1, 7, 11, 19]),
    (5, 11, &[1, 1, 5, 1, 1]),
    (5, 13, &[1, 1, 1, 3, 11]),
    (5, 14, &[1, 3, 5, 5, 31]),
    (6, 1, &[1, 3, 3, 9, 7, 49]),
    (6, 13, &[1, 1, 1, 15, 21, 21]),
    (6, 16, &[1, 3, 1, 13, 27, 49]),
    (6, 19, &[1, 1, 1, 15, 7, 5]),
    (6, 22, &[1, 3, 1, 15, 13, 25]),
    (6, 25, &[1, 1, 5, 5, 19, 61]),
    (7, 1, &[1, 3, 7, 11, 23, 15, 103]),
    (7, 4, &[1, 3, 7, 13, 13, 15, 69]),
];

/// The largest dimension for which direction numbers are tabulated.
pub const MAX_DIMENSION: usize = JOE_KUO.len() + 1;

/// Compute the direction numbers $v_{j,0}, \ldots, v_{j,31}$ of dimension `dim` (zero-based).
fn direction_numbers(dim: usize) -> [u32; BITS] {
    let mut v = [0_u32; BITS];

    if dim == 0 {
        for (bit, v) in v.iter_mut().enumerate() {
            *v = 1 << (BITS - 1 - bit);
        }

        return v;
    }

    let (s, a, m) = JOE_KUO[dim - 1];

    for bit in 0..BITS {
        v[bit] = if bit < s {
            m[bit] << (BITS - 1 - bit)
        } else {
            let mut value = v[bit - s] ^ (v[bit - s] >> s);

            for k in 1..s {
                if (a >> (s - 1 - k)) & 1 == 1 {
                    value ^= v[bit - k];
                }
            }

            value
        };
    }

    v
}

/// A Sobol sequence in up to [`MAX_DIMENSION`] dimensions with 32 bits of resolution.
///
/// The sequence starts with the origin. It can optionally be randomized with a digital shift,
/// i.e. every coordinate is XOR-ed with a random 32-bit number that is fixed for the lifetime of
/// the instance.
#[derive(Clone, Debug)]
pub struct SobolSequence<T> {
    directions: Vec<[u32; BITS]>,
    shift: Vec<u32>,
    cursor: u64,
    numeric: PhantomData<T>,
}

impl<T> SobolSequence<T> {
    /// Creates the sequence for `dim` dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDimension`] if `dim` is zero or larger than
    /// [`MAX_DIMENSION`].
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 || dim > MAX_DIMENSION {
            return Err(Error::UnsupportedDimension {
                family: "sobol".to_string(),
                requested: dim,
                max: MAX_DIMENSION,
            });
        }

        Ok(Self {
            directions: (0..dim).map(direction_numbers).collect(),
            shift: vec![0; dim],
            cursor: 0,
            numeric: PhantomData,
        })
    }

    /// Creates the sequence for `dim` dimensions with a random digital shift drawn from a
    /// generator seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Same as [`SobolSequence::new`].
    pub fn scrambled(dim: usize, seed: Option<u64>) -> Result<Self> {
        let mut sequence = Self::new(dim)?;
        let mut rng = seeded_rng(seed);
        sequence.shift = (0..dim).map(|_| rng.gen()).collect();
        Ok(sequence)
    }

    /// The unscaled coordinates of the point with the given `index`.
    fn state_at(&self, index: u64) -> Vec<u32> {
        let gray = index ^ (index >> 1);

        self.directions
            .iter()
            .map(|v| {
                v.iter()
                    .enumerate()
                    .filter(|(bit, _)| (gray >> bit) & 1 == 1)
                    .fold(0, |x, (_, &v)| x ^ v)
            })
            .collect()
    }
}

impl<T> SampleGenerator<T> for SobolSequence<T>
where
    T: Float + FromPrimitive,
{
    fn dim(&self) -> usize {
        self.directions.len()
    }

    fn generate(&mut self, n: usize) -> Result<SampleBatch<T>> {
        let end = self
            .cursor
            .checked_add(n as u64)
            .filter(|&end| end <= MAX_POINTS)
            .ok_or_else(|| Error::SequenceExhausted {
                family: "sobol".to_string(),
                max: MAX_POINTS,
            })?;

        let scale = 1.0 / MAX_POINTS as f64;
        let mut state = self.state_at(self.cursor);
        let mut points = Vec::with_capacity(n);

        for index in self.cursor..end {
            points.push(
                state
                    .iter()
                    .zip(&self.shift)
                    .map(|(&x, &shift)| f64_to_float(f64::from(x ^ shift) * scale))
                    .collect(),
            );

            if index + 1 < end {
                // the Gray codes of `index` and `index + 1` differ in the lowest zero bit of
                // `index`
                let bit = (!index).trailing_zeros() as usize;

                for (x, v) in state.iter_mut().zip(&self.directions) {
                    *x ^= v[bit];
                }
            }
        }

        self.cursor = end;

        Ok(SampleBatch::new(points))
    }
}

impl<T> LowDiscrepancySequence<T> for SobolSequence<T>
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

    #[test]
    fn first_points_in_two_dimensions() {
        let mut sobol = SobolSequence::<f64>::new(2).unwrap();
        let batch = sobol.generate(4).unwrap();

        assert_eq!(
            batch.into_points(),
            vec![
                vec![0.0, 0.0],
                vec![0.5, 0.5],
                vec![0.75, 0.25],
                vec![0.25, 0.75]
            ]
        );
        assert_eq!(sobol.cursor(), 4);
    }

    #[test]
    fn direction_numbers_are_valid() {
        // m_k must be odd and smaller than 2^k
        for (s, _, m) in JOE_KUO.iter() {
            assert_eq!(m.len(), *s);

            for (k, &m) in m.iter().enumerate() {
                assert_eq!(m % 2, 1);
                assert!(m < 1 << (k + 1));
            }
        }
    }

    #[test]
    fn one_dimensional_projections_are_stratified() {
        const M: u32 = 6;
        let mut sobol = SobolSequence::<f64>::new(MAX_DIMENSION).unwrap();
        let batch = sobol.generate(1 << M).unwrap();

        for dim in 0..MAX_DIMENSION {
            let mut strata = batch
                .points()
                .iter()
                .map(|p| (p[dim] * f64::from(1 << M)) as usize)
                .collect::<Vec<_>>();
            strata.sort_unstable();

            assert_eq!(strata, (0..1 << M).collect::<Vec<_>>());
        }
    }

    #[test]
    fn first_two_dimensions_form_a_net() {
        // every elementary interval of volume 2^-m contains exactly one of the first 2^m points
        const M: u32 = 8;
        let mut sobol = SobolSequence::<f64>::new(2).unwrap();
        let batch = sobol.generate(1 << M).unwrap();

        for a in 0..=M {
            let mut cells = batch
                .points()
                .iter()
                .map(|p| {
                    let i = (p[0] * f64::from(1 << a)) as usize;
                    let j = (p[1] * f64::from(1 << (M - a))) as usize;
                    (i, j)
                })
                .collect::<Vec<_>>();
            cells.sort_unstable();
            cells.dedup();

            assert_eq!(cells.len(), 1 << M);
        }
    }

    #[test]
    fn successive_batches_are_a_prefix() {
        let mut split = SobolSequence::<f64>::new(5).unwrap();
        let mut points = split.generate(300).unwrap().into_points();
        points.extend(split.generate(724).unwrap().into_points());

        let mut fresh = SobolSequence::<f64>::new(5).unwrap();

        assert_eq!(points, fresh.generate(1024).unwrap().into_points());
        assert_eq!(split.cursor(), fresh.cursor());
    }

    #[test]
    fn seek_continues_the_sequence() {
        let mut full = SobolSequence::<f64>::new(3).unwrap();
        let points = full.generate(100).unwrap().into_points();

        let mut sought = SobolSequence::<f64>::new(3).unwrap();
        sought.seek(37);

        assert_eq!(sought.generate(63).unwrap().into_points(), &points[37..]);
    }

    #[test]
    fn scrambled_sequence() {
        let mut first = SobolSequence::<f64>::scrambled(2, Some(3)).unwrap();
        let mut second = SobolSequence::<f64>::scrambled(2, Some(3)).unwrap();
        let batch = first.generate(64).unwrap();

        assert_eq!(batch, second.generate(64).unwrap());
        assert_ne!(batch.points()[0], vec![0.0, 0.0]);
        assert!(batch
            .points()
            .iter()
            .all(|p| p.iter().all(|&x| (0.0..1.0).contains(&x))));
    }

    #[test]
    fn unsupported_dimensions() {
        assert!(matches!(
            SobolSequence::<f64>::new(MAX_DIMENSION + 1),
            Err(Error::UnsupportedDimension { requested: 22, max: 21, .. })
        ));
        assert!(matches!(
            SobolSequence::<f64>::new(0),
            Err(Error::UnsupportedDimension { .. })
        ));
    }

    #[test]
    fn exhaustion() {
        let mut sobol = SobolSequence::<f64>::new(1).unwrap();
        sobol.seek(MAX_POINTS - 1);

        assert!(matches!(
            sobol.generate(2),
            Err(Error::SequenceExhausted { .. })
        ));
        // a failed call leaves the cursor untouched
        assert_eq!(sobol.cursor(), MAX_POINTS - 1);
        assert_eq!(sobol.generate(1).unwrap().len(), 1);
    }
}
