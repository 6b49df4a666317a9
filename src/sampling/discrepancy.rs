//! Discrepancy of point sets.
use crate::core::{count_to_float, SampleBatch};
use num_traits::{Float, FromPrimitive};

/// Compute the L2-star discrepancy of the points in `batch`, which must lie in the unit
/// hypercube, with Warnock's formula
///
/// $$ T^2 = 3^{-d} - \frac{2^{1-d}}{N} \sum_{i=1}^N \prod_{k=1}^d \left( 1 - x_{ik}^2 \right) +
/// \frac{1}{N^2} \sum_{i,j=1}^N \prod_{k=1}^d \left( 1 - \max(x_{ik}, x_{jk}) \right). $$
///
/// The cost is $O(N^2 d)$. An empty batch has no discrepancy and returns `None`.
pub fn l2_star_discrepancy<T>(batch: &SampleBatch<T>) -> Option<T>
where
    T: Float + FromPrimitive,
{
    let points = batch.points();
    let first = points.first()?;
    let dim = first.len();
    let n: T = count_to_float(points.len());
    let two = T::one() + T::one();
    let three = two + T::one();

    let single = points.iter().fold(T::zero(), |acc, p| {
        acc + p.iter().fold(T::one(), |prod, &x| prod * (T::one() - x * x))
    });

    let double = points.iter().enumerate().fold(T::zero(), |acc, (i, p)| {
        // the sum is symmetric in i and j, so only the upper triangle is computed
        let diagonal = p.iter().fold(T::one(), |prod, &x| prod * (T::one() - x));
        let off_diagonal = points[i + 1..].iter().fold(T::zero(), |acc, q| {
            acc + p
                .iter()
                .zip(q)
                .fold(T::one(), |prod, (&x, &y)| prod * (T::one() - x.max(y)))
        });

        acc + diagonal + two * off_diagonal
    });

    let dim = dim as i32;
    let squared = three.powi(-dim) - two.powi(1 - dim) * single / n + double / (n * n);

    // rounding may produce tiny negative values for very uniform sets
    if squared < T::zero() {
        Some(T::zero())
    } else {
        Some(squared.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{SampleGenerator, SobolSequence, UniformGenerator};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn single_points() {
        // int_0^1 dt (1 - t)^2 = 1/3
        let origin = SampleBatch::new(vec![vec![0.0]]);
        assert_approx_eq!(l2_star_discrepancy(&origin).unwrap(), (1.0_f64 / 3.0).sqrt());

        // int_0^0.5 dt t^2 + int_0.5^1 dt (1 - t)^2 = 1/12
        let center = SampleBatch::new(vec![vec![0.5]]);
        assert_approx_eq!(l2_star_discrepancy(&center).unwrap(), (1.0_f64 / 12.0).sqrt());
    }

    #[test]
    fn empty_batch() {
        assert_eq!(l2_star_discrepancy(&SampleBatch::<f64>::new(vec![])), None);
    }

    #[test]
    fn sobol_is_more_uniform_than_random() {
        let sobol = SobolSequence::<f64>::new(2).unwrap().generate(256).unwrap();
        let random = UniformGenerator::<f64, _>::from_seed(2, Some(11))
            .generate(256)
            .unwrap();

        let sobol = l2_star_discrepancy(&sobol).unwrap();
        let random = l2_star_discrepancy(&random).unwrap();

        assert!(sobol < random, "{} >= {}", sobol, random);
    }
}
