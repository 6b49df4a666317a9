#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! The crate `montrs` provides [Monte Carlo integration] routines, which approximate definite
//! multi-dimensional [integrals] over hyperrectangles, together with importance sampling and
//! [Quasi-Monte Carlo] integration with low-discrepancy sequences.
//!
//! # Features
//!
//! - **Generic numeric type**. The numeric type is a generic parameter, so that the
//! integration routines can be used with either `f32`, `f64`, or a custom numeric type that
//! implements the `Float` trait from the `num-traits` crate.
//! - **Generic random number generator**. Every random number generator that implements the
//! `Rng` trait from the `rand` crate can be used with the random integrators. The default is
//! `Pcg64` from `rand_pcg`.
//! - **Reproducibility**. Given a seed, every result is completely reproducible. The
//! low-discrepancy sequences are deterministic and keep a cursor, so that successive calls
//! never reuse points.
//! - **Batch evaluation**. The integrand receives all points of one integration at once and
//! returns one value per point, which allows vectorized integrands.
//! - **Non-finite values**. By default non-finite integrand values propagate into the result,
//! so that singular integrands are noticed. Alternatively they can be counted and discarded,
//! see [`NonFinitePolicy`].
//! - **Checkpoints**. Every call to `integrate` stores the generator state before and after the
//! call, so that an integration can be replayed or resumed later.
//!
//! # How do I get started?
//!
//! ```
//! use montrs::{Domain, IntegrationConfig, MonteCarloSolver, QuasiMonteCarloSolver};
//!
//! let integrand = |points: &[Vec<f64>]| {
//!     points.iter().map(|x| x[0] * x[0] + x[1] * x[1]).collect::<Vec<_>>()
//! };
//! let domain = Domain::new(vec![(0.0, 1.0), (0.0, 1.0)])?;
//!
//! let config = IntegrationConfig::default().with_seed(1);
//! let mut mc = MonteCarloSolver::with_config(integrand, domain.clone(), config);
//! let estimate = mc.integrate(10_000)?;
//! assert!((estimate.value() - 2.0 / 3.0).abs() < 5.0 * estimate.standard_error().unwrap());
//!
//! let mut qmc = QuasiMonteCarloSolver::new(integrand, domain)?;
//! let estimate = qmc.integrate(1024)?;
//! assert!((estimate.value() - 2.0 / 3.0).abs() < 1e-2);
//! # Ok::<(), montrs::Error>(())
//! ```
//!
//! # What is ...?
//!
//! This section is a dictionary of terms that are used in this documentation. Given
//!
//! $$ I = \int_{\Omega} \mathrm{d}^d x \, f(x), \quad \Omega = \prod_{i=1}^d [a_i, b_i], $$
//!
//! we approximate $I$ using PLAIN Monte Carlo integration with
//!
//! $$ I \approx \frac{V}{N} \sum_{j=1}^N f \left( x^{(j)} \right) $$
//!
//! where the points $x^{(j)}$ are uniformly distributed in $\Omega$ and $V$ is its volume. We
//! use the following terms:
//!
//! - the number of *calls* or the *sample size* is $N$, which is the number of times the
//! integrand is evaluated,
//! - the *integrand* is the function, $f(x_1, x_2, \ldots, x_d)$, that is being integrated,
//! - the number of *dimensions*, $d$, is number of dimensions of the integration domain,
//! - the *standard error* is $V$ times the standard deviation of the sample mean. It shrinks
//! like $1 / \sqrt{N}$,
//! - the *proposal* is the distribution with density $p$ that importance sampling draws points
//! from, estimating $I$ with the mean of $f / p$,
//! - the *discrepancy* measures how far a point set in the unit hypercube is from being
//! uniform. Quasi-Monte Carlo estimates have no standard error; the L2-star discrepancy can be
//! attached instead.
//!
//! [Monte Carlo integration]: https://en.wikipedia.org/wiki/Monte_Carlo_integration
//! [integrals]: https://en.wikipedia.org/wiki/Integral
//! [Quasi-Monte Carlo]: https://en.wikipedia.org/wiki/Quasi-Monte_Carlo_method

pub mod callbacks;
pub mod config;
pub mod core;
pub mod error;
pub mod integrators;
pub mod sampling;

pub use crate::config::{IntegrationConfig, NonFinitePolicy, SampleSpace, SequenceFamily};
pub use crate::core::domain::Domain;
pub use crate::core::estimators::{ErrorEstimate, IntegralEstimate};
pub use crate::core::{Checkpoint, Integrand, SampleBatch};
pub use crate::error::{Error, Result};
pub use crate::integrators::importance::ImportanceSampler;
pub use crate::integrators::plain::MonteCarloSolver;
pub use crate::integrators::quasi::{QuasiMonteCarloSolver, SequenceState};
