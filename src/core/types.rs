use serde::Serialize;
use thiserror::Error;

pub const MAX_COUNT: u32 = 9999;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Successful,
    Unsuccessful,
}

impl Outcome {
    pub fn from_final_balance(balance: f64) -> Self {
        if balance < 0.0 {
            Outcome::Unsuccessful
        } else {
            Outcome::Successful
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Outcome::Successful => "successful",
            Outcome::Unsuccessful => "unsuccessful",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "successful" => Some(Outcome::Successful),
            "unsuccessful" => Some(Outcome::Unsuccessful),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Successful
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("annual spend must be >= 0")]
    NegativeSpend,
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    #[error("{0} must be >= 0")]
    NegativeChange(&'static str),
    #[error("number of years must be between 1 and 9999")]
    YearsOutOfRange,
    #[error("number of simulations must be between 1 and 9999")]
    SimulationsOutOfRange,
}

/// Inputs shared by every trajectory of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    pub annual_spend: f64,
    pub inflation_rate: f64,
    pub interest_rate: f64,
    pub savings_balance: f64,
    pub num_years: u32,
    pub inflation_change: f64,
    pub interest_change: f64,
}

impl SimulationParameters {
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [
            ("annual spend", self.annual_spend),
            ("inflation rate", self.inflation_rate),
            ("interest rate", self.interest_rate),
            ("savings balance", self.savings_balance),
            ("inflation change", self.inflation_change),
            ("interest change", self.interest_change),
        ] {
            if !value.is_finite() {
                return Err(ParameterError::NotFinite(name));
            }
        }

        if self.annual_spend < 0.0 {
            return Err(ParameterError::NegativeSpend);
        }
        if self.inflation_change < 0.0 {
            return Err(ParameterError::NegativeChange("inflation change"));
        }
        if self.interest_change < 0.0 {
            return Err(ParameterError::NegativeChange("interest change"));
        }
        if !(1..=MAX_COUNT).contains(&self.num_years) {
            return Err(ParameterError::YearsOutOfRange);
        }
        Ok(())
    }
}

pub fn validate_simulation_count(num_simulations: u32) -> Result<(), ParameterError> {
    if (1..=MAX_COUNT).contains(&num_simulations) {
        Ok(())
    } else {
        Err(ParameterError::SimulationsOutOfRange)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trajectory {
    pub balances: Vec<f64>,
    pub outcome: Outcome,
}

impl Trajectory {
    /// `starting_balance` decides the outcome only when no year was simulated.
    pub fn new(balances: Vec<f64>, starting_balance: f64) -> Self {
        let final_balance = balances.last().copied().unwrap_or(starting_balance);
        Self {
            outcome: Outcome::from_final_balance(final_balance),
            balances,
        }
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn final_balance(&self) -> Option<f64> {
        self.balances.last().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTally {
    pub success_count: u32,
    pub total_runs: u32,
    pub success_percent: f64,
}

impl BatchTally {
    pub(crate) fn finalize(success_count: u32, total_runs: u32) -> Self {
        Self {
            success_count,
            total_runs,
            success_percent: 100.0 * success_count as f64 / total_runs as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success_count: u32,
    pub total_runs: u32,
    pub success_percent: f64,
    pub trajectories: Vec<Trajectory>,
}

impl BatchResult {
    pub fn tally(&self) -> BatchTally {
        BatchTally {
            success_count: self.success_count,
            total_runs: self.total_runs,
            success_percent: self.success_percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectorySummary {
    pub maximum: f64,
    pub minimum: f64,
    pub average: f64,
}
