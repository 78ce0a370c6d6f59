mod http;

use clap::{Args, Parser, Subcommand};
use log::info;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::{
    BatchTally, ParameterError, SimulationError, SimulationParameters, run_batch_into,
    run_batch_parallel,
};
use crate::prompt::{
    NextAction, PartialInputs, PromptError, Prompter, parse_count, parse_non_negative_real,
    parse_real,
};
use crate::results::{ResultFileError, ResultWriter};
use crate::viewer::{ViewerSession, ViewerState, detail_lines};

pub use http::run_http_server;

const RULE: &str = "----------------------------------------------";

#[derive(Parser, Debug)]
#[command(
    name = "fisim",
    version,
    about = "Monte Carlo financial independence simulator (savings vs. inflating spend with drifting rates)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate savings trajectories and write them to a result file
    Run(RunArgs),
    /// Summarize each simulation of a result file
    View(ViewArgs),
    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

/// Any value left out is asked for interactively.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, help = "Amount spent last year, whole currency units")]
    pub annual_spend: Option<u64>,
    #[arg(
        long,
        allow_hyphen_values = true,
        value_parser = parse_real,
        help = "Base inflation rate, e.g. 0.02 for 2%"
    )]
    pub inflation_rate: Option<f64>,
    #[arg(
        long,
        value_parser = parse_non_negative_real,
        help = "Maximum change for inflation in a given year, e.g. 0.0025"
    )]
    pub inflation_change: Option<f64>,
    #[arg(long, allow_hyphen_values = true, help = "Current savings balance")]
    pub savings_balance: Option<i64>,
    #[arg(
        long,
        allow_hyphen_values = true,
        value_parser = parse_real,
        help = "Base annual interest rate, e.g. 0.04 for 4%"
    )]
    pub interest_rate: Option<f64>,
    #[arg(
        long,
        value_parser = parse_non_negative_real,
        help = "Maximum change for interest in a given year, e.g. 0.01"
    )]
    pub interest_change: Option<f64>,
    #[arg(long, value_parser = parse_count, help = "Years to simulate (1-9999)")]
    pub years: Option<u32>,
    #[arg(long, value_parser = parse_count, help = "Simulations to run (1-9999)")]
    pub simulations: Option<u32>,
    #[arg(long, help = "Seed for reproducible runs; random when omitted")]
    pub seed: Option<u64>,
    #[arg(long, short, default_value = "output.txt")]
    pub output: PathBuf,
    #[arg(long, help = "Simulate trajectories on all cores")]
    pub parallel: bool,
}

impl RunArgs {
    fn known_inputs(&self) -> PartialInputs {
        PartialInputs {
            annual_spend: self.annual_spend,
            inflation_rate: self.inflation_rate,
            inflation_change: self.inflation_change,
            savings_balance: self.savings_balance,
            interest_rate: self.interest_rate,
            interest_change: self.interest_change,
            num_years: self.years,
            simulations: self.simulations,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Result file written by `fisim run`
    pub path: PathBuf,
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Show only this simulation (1-based)"
    )]
    pub simulation: Option<u32>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Results(#[from] ResultFileError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("invalid parameters: {0}")]
    Parameters(#[from] ParameterError),
    #[error("Invalid file...")]
    InvalidFile,
    #[error("simulation {requested} is out of range, the file holds {count}")]
    NoSuchSimulation { requested: u32, count: usize },
    #[error("failed to write to the terminal: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Extra guidance printed after the error itself.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CliError::Results(ResultFileError::Unwritable { .. }) => Some(
                "Check you have permissions to read and write to files in this directory then try again.",
            ),
            CliError::Results(ResultFileError::Unreadable { .. }) => {
                Some("Check you have permission to access this directory.")
            }
            _ => None,
        }
    }
}

/// Runs simulations until the user quits. When every value came from flags
/// the session runs once without asking.
pub fn run_session<R: BufRead, W: Write>(
    args: &RunArgs,
    prompter: &mut Prompter<R, W>,
) -> Result<(), CliError> {
    let known = args.known_inputs();
    let interactive = !known.is_complete();

    loop {
        // The output file is claimed before any question is asked.
        let writer = ResultWriter::create(&args.output)?;
        let (params, simulations) = prompter.collect_parameters(&known)?;
        params.validate()?;

        let seed = args.seed.unwrap_or_else(rand::random);
        info!("using seed {seed}");
        let path = writer.path().to_path_buf();
        let tally = simulate_to_file(&params, simulations, seed, args.parallel, writer)?;

        let out = prompter.output();
        writeln!(out, "\n{RULE}")?;
        writeln!(
            out,
            "Simulation was successful in {}/{} runs ({:.2}%)",
            tally.success_count, tally.total_runs, tally.success_percent
        )?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "See {} for more detailed results.", path.display())?;

        if !interactive {
            return Ok(());
        }
        match prompter.ask_next_action()? {
            NextAction::Quit => {
                writeln!(
                    prompter.output(),
                    "--------------------------\nfisim has closed.\n--------------------------"
                )?;
                return Ok(());
            }
            NextAction::Restart => {
                writeln!(
                    prompter.output(),
                    "--------------------------\nfisim has restarted.\n--------------------------"
                )?;
            }
        }
    }
}

fn simulate_to_file<W: Write>(
    params: &SimulationParameters,
    simulations: u32,
    seed: u64,
    parallel: bool,
    mut writer: ResultWriter<W>,
) -> Result<BatchTally, CliError> {
    let tally = if parallel {
        let batch = run_batch_parallel(params, simulations, seed)?;
        for trajectory in &batch.trajectories {
            writer.write_trajectory(trajectory)?;
        }
        batch.tally()
    } else {
        run_batch_into(params, simulations, seed, &mut writer)?
    };
    writer.finish()?;
    Ok(tally)
}

pub fn view_results<W: Write>(args: &ViewArgs, out: &mut W) -> Result<(), CliError> {
    let mut session = ViewerSession::new();
    session.load_path(&args.path)?;
    match session.state() {
        ViewerState::Invalid => return Err(CliError::InvalidFile),
        ViewerState::Empty | ViewerState::NoData => {
            if let Some(message) = session.message() {
                writeln!(out, "{message}")?;
            }
            return Ok(());
        }
        ViewerState::Loaded { .. } => {}
    }

    if let Some(requested) = args.simulation {
        let count = session.entries().len();
        let entry = session
            .select(requested as usize - 1)
            .map_err(|_| CliError::NoSuchSimulation { requested, count })?;
        writeln!(out, "{}", entry.label)?;
        for line in session.detail_lines() {
            writeln!(out, "  {line}")?;
        }
        return Ok(());
    }

    for entry in session.entries() {
        writeln!(out, "{}", entry.label)?;
        for line in detail_lines(&entry.summary) {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(())
}
