use montrs::sampling::{ExponentialProposal, GaussianProposal, Proposal, UniformProposal};
use montrs::{Domain, Error, ImportanceSampler, IntegrationConfig, MonteCarloSolver};

use assert_approx_eq::assert_approx_eq;
use rand::Rng;
use rand_pcg::Pcg64;

fn rng() -> Pcg64 {
    Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7ac28fa16a64abf96)
}

fn paraboloid(points: &[Vec<f64>]) -> Vec<f64> {
    points.iter().map(|x| x[0] * x[0] + x[1] * x[1]).collect()
}

#[test]
fn uniform_proposal_reproduces_plain_monte_carlo() {
    let domain = Domain::new(vec![(0.0, 2.0), (-1.0, 1.0)]).unwrap();
    let config = IntegrationConfig::default();

    let mut plain = MonteCarloSolver::with_rng(paraboloid, domain.clone(), config.clone(), rng());
    let mut sampler = ImportanceSampler::with_rng(
        paraboloid,
        domain.clone(),
        UniformProposal::new(domain),
        config,
        rng(),
    )
    .unwrap();

    for &samples in &[10, 1000] {
        let expected = plain.integrate(samples).unwrap();
        let estimate = sampler.integrate(samples).unwrap();

        assert_approx_eq!(estimate.value(), expected.value(), 1e-12);
        assert_approx_eq!(
            estimate.standard_error().unwrap(),
            expected.standard_error().unwrap(),
            1e-12
        );
    }
}

#[test]
fn default_sampler_is_uniform() {
    let domain = Domain::new(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
    let config = IntegrationConfig::default().with_seed(21);
    let mut sampler = ImportanceSampler::with_config(paraboloid, domain, config).unwrap();
    let estimate = sampler.integrate(50_000).unwrap();

    assert_approx_eq!(
        estimate.value(),
        2.0 / 3.0,
        5.0 * estimate.standard_error().unwrap()
    );
}

#[test]
fn exponential_proposal_removes_the_variance() {
    // int_0^1 dx int_0^1 dy exp(-x - 2y) = (1 - e^-1) (1 - e^-2) / 2
    let integrand = |points: &[Vec<f64>]| {
        points
            .iter()
            .map(|x| (-x[0] - 2.0 * x[1]).exp())
            .collect::<Vec<_>>()
    };
    let domain = Domain::new(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
    let proposal = ExponentialProposal::new(domain.clone(), vec![1.0, 2.0]).unwrap();
    let config = IntegrationConfig::default().with_seed(3);
    let mut sampler = ImportanceSampler::with_proposal(integrand, domain, proposal, config).unwrap();
    let estimate = sampler.integrate(1000).unwrap();

    let exact = (1.0 - (-1.0_f64).exp()) * (1.0 - (-2.0_f64).exp()) / 2.0;

    assert_approx_eq!(estimate.value(), exact, 1e-10);
    assert!(estimate.standard_error().unwrap() < 1e-10);
}

#[test]
fn better_proposals_have_smaller_errors() {
    // int_0^1 dx exp(-5x), concentrated near zero
    let peaked = |points: &[Vec<f64>]| points.iter().map(|x| (-5.0 * x[0]).exp()).collect::<Vec<_>>();
    let domain = Domain::new(vec![(0.0, 1.0)]).unwrap();
    let config = IntegrationConfig::default().with_seed(9);

    let mut uniform = ImportanceSampler::with_proposal(
        peaked,
        domain.clone(),
        UniformProposal::new(domain.clone()),
        config.clone(),
    )
    .unwrap();
    let mut adapted = ImportanceSampler::with_proposal(
        peaked,
        domain.clone(),
        ExponentialProposal::new(domain, vec![4.0]).unwrap(),
        config,
    )
    .unwrap();

    let uniform = uniform.integrate(10_000).unwrap();
    let adapted = adapted.integrate(10_000).unwrap();
    let exact = (1.0 - (-5.0_f64).exp()) / 5.0;

    assert_approx_eq!(adapted.value(), exact, 5.0 * adapted.standard_error().unwrap());
    assert!(adapted.standard_error().unwrap() < 0.25 * uniform.standard_error().unwrap());
}

#[test]
fn gaussian_proposal() {
    let domain = Domain::new(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
    let proposal = GaussianProposal::new(domain.clone());
    let config = IntegrationConfig::default().with_seed(5);
    let mut sampler = ImportanceSampler::with_proposal(paraboloid, domain, proposal, config).unwrap();
    let estimate = sampler.integrate(10_000).unwrap();

    assert_approx_eq!(
        estimate.value(),
        2.0 / 3.0,
        5.0 * estimate.standard_error().unwrap()
    );
}

#[test]
fn steep_growth_towards_the_upper_bound() {
    // int_0^1 dx exp(1000 (x - 1)) = (1 - e^-1000) / 1000
    let steep = |points: &[Vec<f64>]| {
        points
            .iter()
            .map(|x| (1000.0 * (x[0] - 1.0)).exp())
            .collect::<Vec<_>>()
    };
    let domain = Domain::new(vec![(0.0, 1.0)]).unwrap();
    let proposal = ExponentialProposal::new(domain.clone(), vec![-1000.0]).unwrap();
    let mut sampler =
        ImportanceSampler::with_rng(steep, domain, proposal, IntegrationConfig::default(), rng())
            .unwrap();
    let estimate = sampler.integrate(1000).unwrap();

    assert_approx_eq!(estimate.value(), 1e-3, 1e-12);
    assert!(estimate.standard_error().unwrap() < 1e-12);
}

struct Negative;

impl Proposal<f64> for Negative {
    fn dim(&self) -> usize {
        1
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Vec<f64>> {
        (0..n).map(|_| vec![rng.gen()]).collect()
    }

    fn density(&self, points: &[Vec<f64>]) -> Vec<f64> {
        points
            .iter()
            .map(|x| if x[0] < 0.25 { 0.0 } else { -1.0 })
            .collect()
    }
}

#[test]
fn invalid_densities() {
    let one = |points: &[Vec<f64>]| vec![1.0; points.len()];
    let domain = Domain::new(vec![(0.0, 1.0)]).unwrap();
    let mut sampler =
        ImportanceSampler::with_rng(one, domain, Negative, IntegrationConfig::default(), rng())
            .unwrap();

    // the error names the first offending point
    match sampler.integrate(1000) {
        Err(Error::DivisionByZeroDensity { index }) | Err(Error::InvalidDensity { index, .. }) => {
            assert!(index < 1000)
        }
        _ => panic!("the integration must fail"),
    }

    assert!(sampler.checkpoints().is_empty());
}

#[test]
fn proposal_dimension_must_match() {
    let domain = Domain::new(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();

    assert!(matches!(
        ImportanceSampler::with_rng(
            paraboloid,
            domain,
            Negative,
            IntegrationConfig::default(),
            rng()
        ),
        Err(Error::DimensionMismatch {
            expected: 2,
            actual: 1
        })
    ));
}
