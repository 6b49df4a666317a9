//! Proposal distributions for importance sampling.
use crate::core::domain::Domain;
use crate::core::{f64_to_float, SampleBatch};
use crate::error::{Error, Result};
use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Standard};
use rand::Rng;

/// A probability distribution over the integration domain that points can be drawn from and
/// whose density can be evaluated.
///
/// The density must be positive wherever the integrand does not vanish. Otherwise the
/// importance sampling estimate is biased, which can not be detected reliably from the samples.
pub trait Proposal<T> {
    /// The dimension of the drawn points.
    fn dim(&self) -> usize;

    /// Draw `n` points using `rng`.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Vec<T>>;

    /// Evaluate the normalized density at each of `points`.
    fn density(&self, points: &[Vec<T>]) -> Vec<T>;
}

/// The uniform distribution over a domain. Its density is the inverse of the volume.
#[derive(Clone, Debug)]
pub struct UniformProposal<T: Float> {
    domain: Domain<T>,
}

impl<T: Float> UniformProposal<T> {
    /// Constructor
    pub fn new(domain: Domain<T>) -> Self {
        Self { domain }
    }
}

impl<T> Proposal<T> for UniformProposal<T>
where
    T: Float,
    Standard: Distribution<T>,
{
    fn dim(&self) -> usize {
        self.domain.dimensionality()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Vec<T>> {
        let dim = self.domain.dimensionality();

        (0..n)
            .map(|_| {
                let unit = (0..dim).map(|_| rng.gen()).collect::<Vec<T>>();
                self.domain.map_unit_to_domain(&unit)
            })
            .collect()
    }

    fn density(&self, points: &[Vec<T>]) -> Vec<T> {
        let density = self.domain.volume().recip();

        points
            .iter()
            .map(|p| {
                if self.domain.contains(p) {
                    density
                } else {
                    T::zero()
                }
            })
            .collect()
    }
}

/// A product of exponential distributions, each truncated to its interval of the domain.
///
/// In dimension $i$ the density is
///
/// $$ p_i(x) = \frac{\lambda_i e^{-\lambda_i (x - a_i)}}{1 - e^{-\lambda_i (b_i - a_i)}}, $$
///
/// which decays from the lower bound for positive rates $\lambda_i$ and grows towards the upper
/// bound for negative ones. Negative rates are evaluated as the mirror image about the upper
/// bound,
///
/// $$ p_i(x) = \frac{|\lambda_i| e^{-|\lambda_i| (b_i - x)}}{1 - e^{-|\lambda_i| (b_i - a_i)}}, $$
///
/// which is the same density but does not overflow for large $|\lambda_i|$.
#[derive(Clone, Debug)]
pub struct ExponentialProposal<T: Float> {
    domain: Domain<T>,
    rates: Vec<T>,
    // 1 - exp(-|rate| * width) for every dimension
    norms: Vec<T>,
}

impl<T: Float> ExponentialProposal<T> {
    /// Creates the distribution over `domain` with one rate per dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the number of rates differs from the
    /// dimensionality of `domain` and [`Error::InvalidProposal`] if a rate is zero or not
    /// finite.
    pub fn new(domain: Domain<T>, rates: Vec<T>) -> Result<Self> {
        if rates.len() != domain.dimensionality() {
            return Err(Error::DimensionMismatch {
                expected: domain.dimensionality(),
                actual: rates.len(),
            });
        }

        if let Some(dim) = rates
            .iter()
            .position(|&rate| rate == T::zero() || !rate.is_finite())
        {
            return Err(Error::InvalidProposal {
                reason: format!("the rate of dimension {} must be finite and non-zero", dim),
            });
        }

        let norms = rates
            .iter()
            .zip(domain.intervals())
            .map(|(&rate, &(low, high))| -(-rate.abs() * (high - low)).exp_m1())
            .collect::<Vec<_>>();

        if let Some(dim) = norms
            .iter()
            .position(|&norm| norm <= T::zero() || !norm.is_finite())
        {
            return Err(Error::InvalidProposal {
                reason: format!("the rate of dimension {} is too small to be normalized", dim),
            });
        }

        Ok(Self {
            domain,
            rates,
            norms,
        })
    }
}

impl<T> Proposal<T> for ExponentialProposal<T>
where
    T: Float,
    Standard: Distribution<T>,
{
    fn dim(&self) -> usize {
        self.domain.dimensionality()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Vec<T>> {
        (0..n)
            .map(|_| {
                self.rates
                    .iter()
                    .zip(&self.norms)
                    .zip(self.domain.intervals())
                    .map(|((&rate, &norm), &(low, high))| {
                        // inverse of the cumulative distribution function of the distance from
                        // the bound the density decays from
                        let u: T = rng.gen();
                        let distance = (-(-u * norm).ln_1p() / rate.abs()).min(high - low);
                        let x = if rate > T::zero() {
                            low + distance
                        } else {
                            high - distance
                        };
                        x.max(low).min(high)
                    })
                    .collect()
            })
            .collect()
    }

    fn density(&self, points: &[Vec<T>]) -> Vec<T> {
        points
            .iter()
            .map(|p| {
                if !self.domain.contains(p) {
                    return T::zero();
                }

                p.iter()
                    .zip(&self.rates)
                    .zip(&self.norms)
                    .zip(self.domain.intervals())
                    .fold(T::one(), |density, (((&x, &rate), &norm), &(low, high))| {
                        let distance = if rate > T::zero() { x - low } else { high - x };
                        density * rate.abs() * (-rate.abs() * distance).exp() / norm
                    })
            })
            .collect()
    }
}

/// The probability that a standard normal variable lies within three standard deviations,
/// $\operatorname{erf}(3/\sqrt{2})$.
const THREE_SIGMA_MASS: f64 = 0.997_300_203_936_739_8;

/// A product of normal distributions centred in the domain, each truncated to its interval.
///
/// In dimension $i$ the mean is $\mu_i = (a_i + b_i)/2$ and the standard deviation is
/// $\sigma_i = (b_i - a_i)/6$, so that the interval spans three standard deviations on either
/// side. The density
///
/// $$ p_i(x) = \frac{e^{-(x - \mu_i)^2 / (2 \sigma_i^2)}}{\sqrt{2 \pi} \sigma_i
/// \operatorname{erf}(3/\sqrt{2})} $$
///
/// is normalized over the interval.
#[derive(Clone, Debug)]
pub struct GaussianProposal<T: Float> {
    domain: Domain<T>,
    // mean and standard deviation for every dimension
    moments: Vec<(T, T)>,
}

impl<T: Float> GaussianProposal<T> {
    /// Creates the distribution centred in `domain`.
    pub fn new(domain: Domain<T>) -> Self {
        let two = T::one() + T::one();
        let six = two * (two + T::one());
        let moments = domain
            .intervals()
            .iter()
            .map(|&(low, high)| ((low + high) / two, (high - low) / six))
            .collect();

        Self { domain, moments }
    }
}

impl<T> Proposal<T> for GaussianProposal<T>
where
    T: Float + FromPrimitive,
    Standard: Distribution<T>,
{
    fn dim(&self) -> usize {
        self.domain.dimensionality()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Vec<T>> {
        let two = T::one() + T::one();
        let three = two + T::one();
        let two_pi: T = f64_to_float(2.0 * std::f64::consts::PI);

        (0..n)
            .map(|_| {
                self.moments
                    .iter()
                    .zip(self.domain.intervals())
                    .map(|(&(mean, sigma), &(low, high))| {
                        // Box-Muller, rejecting everything beyond three standard deviations
                        let z = loop {
                            let u1 = T::one() - rng.gen::<T>();
                            let u2: T = rng.gen();
                            let z = (-two * u1.ln()).sqrt() * (two_pi * u2).cos();

                            if z.abs() <= three {
                                break z;
                            }
                        };

                        (mean + sigma * z).max(low).min(high)
                    })
                    .collect()
            })
            .collect()
    }

    fn density(&self, points: &[Vec<T>]) -> Vec<T> {
        let two = T::one() + T::one();
        let norm: T = f64_to_float((2.0 * std::f64::consts::PI).sqrt() * THREE_SIGMA_MASS);

        points
            .iter()
            .map(|p| {
                if !self.domain.contains(p) {
                    return T::zero();
                }

                p.iter()
                    .zip(&self.moments)
                    .fold(T::one(), |density, (&x, &(mean, sigma))| {
                        let z = (x - mean) / sigma;
                        density * (-z * z / two).exp() / (sigma * norm)
                    })
            })
            .collect()
    }
}

/// Draws points from a proposal distribution together with their densities.
#[derive(Clone, Debug)]
pub struct ProposalGenerator<T: Float, P, R> {
    domain: Domain<T>,
    proposal: P,
    rng: R,
}

impl<T, P, R> ProposalGenerator<T, P, R>
where
    T: Float,
    P: Proposal<T>,
    R: Rng,
{
    /// Creates a generator drawing from `proposal` with `rng`. The domain is used to check the
    /// drawn points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the dimensions of `domain` and `proposal`
    /// differ.
    pub fn new(domain: Domain<T>, proposal: P, rng: R) -> Result<Self> {
        if proposal.dim() != domain.dimensionality() {
            return Err(Error::DimensionMismatch {
                expected: domain.dimensionality(),
                actual: proposal.dim(),
            });
        }

        Ok(Self {
            domain,
            proposal,
            rng,
        })
    }

    /// Returns the random number generator in its current state.
    pub fn rng(&self) -> &R {
        &self.rng
    }

    pub(crate) fn set_rng(&mut self, rng: R) {
        self.rng = rng;
    }

    /// Returns the proposal distribution.
    pub fn proposal(&self) -> &P {
        &self.proposal
    }

    /// Draw `n` points and evaluate the proposal density at each of them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProposalSupportViolation`] if a point lies outside of the domain and
    /// [`Error::InvalidProposal`] if the proposal returns the wrong number of points or
    /// densities.
    pub fn generate(&mut self, n: usize) -> Result<(SampleBatch<T>, Vec<T>)> {
        let points = self.proposal.sample(&mut self.rng, n);

        if points.len() != n {
            return Err(Error::InvalidProposal {
                reason: format!("{} points were requested but {} drawn", n, points.len()),
            });
        }

        if let Some(index) = points.iter().position(|p| !self.domain.contains(p)) {
            return Err(Error::ProposalSupportViolation { index });
        }

        let densities = self.proposal.density(&points);

        if densities.len() != n {
            return Err(Error::InvalidProposal {
                reason: format!(
                    "{} densities were returned for {} points",
                    densities.len(),
                    n
                ),
            });
        }

        Ok((SampleBatch::new(points), densities))
    }
}
