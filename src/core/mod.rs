mod engine;
mod summary;
mod types;

pub use engine::{
    SimulationError, TrajectorySink, run_batch, run_batch_into, run_batch_parallel,
    simulate_trajectory, walk_rate,
};
pub use summary::{SummaryError, summarize};
pub use types::{
    BatchResult, BatchTally, MAX_COUNT, Outcome, ParameterError, SimulationParameters, Trajectory,
    TrajectorySummary, validate_simulation_count,
};
