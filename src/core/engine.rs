use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

use super::types::{BatchResult, BatchTally, SimulationParameters, Trajectory};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("number of simulations must be greater than zero")]
    NoSimulations,
}

/// Receives trajectories in run order as each one completes.
pub trait TrajectorySink {
    type Error: From<SimulationError>;

    fn accept(&mut self, trajectory: Trajectory) -> Result<(), Self::Error>;
}

impl TrajectorySink for Vec<Trajectory> {
    type Error = SimulationError;

    fn accept(&mut self, trajectory: Trajectory) -> Result<(), Self::Error> {
        self.push(trajectory);
        Ok(())
    }
}

// Offset lies in (-1.75 * change, 0.75 * change]; never clamped.
pub fn walk_rate<R: Rng + ?Sized>(rate: f64, change: f64, rng: &mut R) -> f64 {
    let draw: f64 = rng.gen_range(0.0..1.0);
    rate + change * (0.75 - draw * 2.5)
}

pub fn simulate_trajectory<R: Rng + ?Sized>(
    params: &SimulationParameters,
    rng: &mut R,
) -> Trajectory {
    let mut annual_spend = params.annual_spend;
    let mut savings_balance = params.savings_balance;
    let mut inflation_rate = params.inflation_rate;
    let mut interest_rate = params.interest_rate;

    let mut balances = Vec::with_capacity(params.num_years as usize);
    for _ in 0..params.num_years {
        annual_spend += annual_spend * inflation_rate;
        savings_balance -= annual_spend;
        // A deficit compounds too.
        savings_balance += savings_balance * interest_rate;

        // Walked rates apply from next year.
        inflation_rate = walk_rate(inflation_rate, params.inflation_change, rng);
        interest_rate = walk_rate(interest_rate, params.interest_change, rng);

        balances.push(savings_balance);
    }

    Trajectory::new(balances, params.savings_balance)
}

pub fn run_batch(
    params: &SimulationParameters,
    num_simulations: u32,
    seed: u64,
) -> Result<BatchResult, SimulationError> {
    let mut trajectories = Vec::with_capacity(num_simulations as usize);
    let tally = run_batch_into(params, num_simulations, seed, &mut trajectories)?;
    Ok(assemble(tally, trajectories))
}

pub fn run_batch_into<S: TrajectorySink>(
    params: &SimulationParameters,
    num_simulations: u32,
    seed: u64,
    sink: &mut S,
) -> Result<BatchTally, S::Error> {
    if num_simulations == 0 {
        return Err(SimulationError::NoSimulations.into());
    }
    info!(
        "running {num_simulations} simulations over {} years (seed {seed})",
        params.num_years
    );

    let mut successes = 0_u32;
    for scenario_id in 0..num_simulations {
        let trajectory = simulate_scenario(params, seed, scenario_id);
        if trajectory.outcome.is_success() {
            successes += 1;
        }
        sink.accept(trajectory)?;
    }

    let tally = BatchTally::finalize(successes, num_simulations);
    info!(
        "{}/{} simulations successful ({:.2}%)",
        tally.success_count, tally.total_runs, tally.success_percent
    );
    Ok(tally)
}

pub fn run_batch_parallel(
    params: &SimulationParameters,
    num_simulations: u32,
    seed: u64,
) -> Result<BatchResult, SimulationError> {
    if num_simulations == 0 {
        return Err(SimulationError::NoSimulations);
    }
    info!(
        "running {num_simulations} simulations over {} years in parallel (seed {seed})",
        params.num_years
    );

    let trajectories = (0..num_simulations)
        .into_par_iter()
        .map(|scenario_id| simulate_scenario(params, seed, scenario_id))
        .collect::<Vec<_>>();
    let successes = trajectories
        .iter()
        .filter(|t| t.outcome.is_success())
        .count() as u32;

    Ok(assemble(
        BatchTally::finalize(successes, num_simulations),
        trajectories,
    ))
}

fn assemble(tally: BatchTally, trajectories: Vec<Trajectory>) -> BatchResult {
    BatchResult {
        success_count: tally.success_count,
        total_runs: tally.total_runs,
        success_percent: tally.success_percent,
        trajectories,
    }
}

fn simulate_scenario(params: &SimulationParameters, seed: u64, scenario_id: u32) -> Trajectory {
    let mut rng = StdRng::seed_from_u64(derive_seed(seed, scenario_id));
    let trajectory = simulate_trajectory(params, &mut rng);
    debug!(
        "simulation {} finished {:?} at {:?}",
        scenario_id + 1,
        trajectory.outcome,
        trajectory.final_balance()
    );
    trajectory
}

fn derive_seed(base_seed: u64, scenario_id: u32) -> u64 {
    splitmix64(splitmix64(base_seed) ^ scenario_id as u64)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
