use montrs::callbacks::{SimpleCallback, SimpleCumulativeCallback};
use montrs::sampling::{ExponentialProposal, GaussianProposal};
use montrs::{Domain, ImportanceSampler, IntegrationConfig, MonteCarloSolver, QuasiMonteCarloSolver};

/// Integrating the function x^2 from x=1 to x=3, which gives the result 26/3.
fn square(points: &[Vec<f64>]) -> Vec<f64> {
    points.iter().map(|x| x[0].powi(2)).collect()
}

fn main() -> montrs::Result<()> {
    // an optional configuration file is the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => IntegrationConfig::from_file(path)?,
        None => IntegrationConfig::default().with_seed(0xcafef00dd15ea5e5),
    };
    let domain = Domain::new(vec![(1.0, 3.0)])?;

    println!("plain Monte Carlo:");
    let callback = SimpleCumulativeCallback {};
    let mut plain = MonteCarloSolver::with_config(square, domain.clone(), config.clone());
    for _ in 0..4 {
        plain.integrate_with_callback(100_000, &callback)?;
    }

    println!("\nimportance sampling, growing towards x=3:");
    let proposal = ExponentialProposal::new(domain.clone(), vec![-1.0])?;
    let mut importance =
        ImportanceSampler::with_proposal(square, domain.clone(), proposal, config.clone())?;
    importance.integrate_with_callback(100_000, &SimpleCallback {})?;

    println!("\nimportance sampling, centred Gaussian:");
    let proposal = GaussianProposal::new(domain.clone());
    let mut gaussian =
        ImportanceSampler::with_proposal(square, domain.clone(), proposal, config.clone())?;
    for _ in 0..4 {
        gaussian.integrate_with_callback(100_000, &callback)?;
    }

    println!("\nQuasi-Monte Carlo with the {} sequence:", config.sequence_family);
    let mut quasi = QuasiMonteCarloSolver::with_config(square, domain, config)?;
    for _ in 0..4 {
        quasi.integrate_with_callback(1 << 12, &SimpleCallback {})?;
    }

    if let (Some(plain), Some(quasi)) = (plain.cumulative(), quasi.cumulative()) {
        println!("\nexact: {}", 26.0 / 3.0);
        println!("plain: {}", plain);
        println!("quasi: {}", quasi);
    }

    Ok(())
}
