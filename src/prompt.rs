//! Interactive collection of simulation inputs.

use std::io::{self, BufRead, Write};

use log::debug;
use thiserror::Error;

use crate::core::{MAX_COUNT, SimulationParameters};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid input, please enter an integer.")]
    NotAnInteger,
    #[error("Please enter a real number.")]
    NotAReal,
    #[error("Please enter a non-negative integer.")]
    NegativeInteger,
    #[error("Please enter a non-negative number.")]
    NegativeReal,
    #[error("Please enter a positive integer.")]
    NotPositive,
    #[error("Please enter a value less than 10,000.")]
    TooLarge,
}

impl InputError {
    pub fn is_out_of_range(self) -> bool {
        !matches!(self, InputError::NotAnInteger | InputError::NotAReal)
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input closed before a valid value was entered")]
    InputClosed,
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}

pub fn parse_integer(raw: &str) -> Result<i64, InputError> {
    raw.trim().parse::<i64>().map_err(|_| InputError::NotAnInteger)
}

pub fn parse_non_negative_integer(raw: &str) -> Result<u64, InputError> {
    let value = parse_integer(raw)?;
    u64::try_from(value).map_err(|_| InputError::NegativeInteger)
}

pub fn parse_real(raw: &str) -> Result<f64, InputError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InputError::NotAReal),
    }
}

pub fn parse_non_negative_real(raw: &str) -> Result<f64, InputError> {
    let value = parse_real(raw)?;
    if value < 0.0 {
        return Err(InputError::NegativeReal);
    }
    Ok(value)
}

/// Years and simulation counts: `1..=9999`.
pub fn parse_count(raw: &str) -> Result<u32, InputError> {
    let value = parse_non_negative_integer(raw)?;
    if value > MAX_COUNT as u64 {
        return Err(InputError::TooLarge);
    }
    if value == 0 {
        return Err(InputError::NotPositive);
    }
    Ok(value as u32)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NextAction {
    Quit,
    Restart,
}

/// Values already known before prompting; `None` fields are asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialInputs {
    pub annual_spend: Option<u64>,
    pub inflation_rate: Option<f64>,
    pub inflation_change: Option<f64>,
    pub savings_balance: Option<i64>,
    pub interest_rate: Option<f64>,
    pub interest_change: Option<f64>,
    pub num_years: Option<u32>,
    pub simulations: Option<u32>,
}

impl PartialInputs {
    pub fn is_complete(&self) -> bool {
        self.annual_spend.is_some()
            && self.inflation_rate.is_some()
            && self.inflation_change.is_some()
            && self.savings_balance.is_some()
            && self.interest_rate.is_some()
            && self.interest_change.is_some()
            && self.num_years.is_some()
            && self.simulations.is_some()
    }
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Asks until `parse` accepts the answer.
    pub fn ask<T>(
        &mut self,
        question: &str,
        hint: &str,
        parse: impl Fn(&str) -> Result<T, InputError>,
    ) -> Result<T, PromptError> {
        loop {
            write!(self.output, "\n{question}\n{hint}: ")?;
            self.output.flush()?;
            let line = self.read_line()?;
            match parse(&line) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!("rejected input {:?}: {e}", line.trim());
                    writeln!(self.output, "\n{e}")?;
                }
            }
        }
    }

    pub fn collect_parameters(
        &mut self,
        known: &PartialInputs,
    ) -> Result<(SimulationParameters, u32), PromptError> {
        let annual_spend = match known.annual_spend {
            Some(value) => value,
            None => self.ask(
                "How much did you spend last year to support your current lifestyle?",
                "(Must be positive integer)",
                parse_non_negative_integer,
            )?,
        };
        let inflation_rate = match known.inflation_rate {
            Some(value) => value,
            None => self.ask(
                "Please enter the base inflation rate:",
                "(e.g. 2% should be entered as 0.02)",
                parse_real,
            )?,
        };
        let inflation_change = match known.inflation_change {
            Some(value) => value,
            None => self.ask(
                "Please enter the expected maximum change for inflation in a given year:",
                "(e.g. 0.25% should be entered as 0.0025)",
                parse_non_negative_real,
            )?,
        };
        let savings_balance = match known.savings_balance {
            Some(value) => value,
            None => self.ask(
                "How much do you currently have saved for investment?",
                "(Must be an integer)",
                parse_integer,
            )?,
        };
        let interest_rate = match known.interest_rate {
            Some(value) => value,
            None => self.ask(
                "Please enter the base annual interest rate:",
                "(e.g. 4% should be entered as 0.04)",
                parse_real,
            )?,
        };
        let interest_change = match known.interest_change {
            Some(value) => value,
            None => self.ask(
                "Please enter the expected maximum change for interest in a given year:",
                "(e.g. 1% should be entered as 0.01)",
                parse_non_negative_real,
            )?,
        };
        let num_years = match known.num_years {
            Some(value) => value,
            None => self.ask(
                "How many years do you want to test?",
                "(Must be positive integer, less than 10,000)",
                parse_count,
            )?,
        };
        let simulations = match known.simulations {
            Some(value) => value,
            None => self.ask(
                "How many simulations should be run?",
                "(Must be positive integer, less than 10,000)",
                parse_count,
            )?,
        };

        let params = SimulationParameters {
            annual_spend: annual_spend as f64,
            inflation_rate,
            interest_rate,
            savings_balance: savings_balance as f64,
            num_years,
            inflation_change,
            interest_change,
        };
        Ok((params, simulations))
    }

    pub fn ask_next_action(&mut self) -> Result<NextAction, PromptError> {
        loop {
            write!(
                self.output,
                "--------------------------\nWhat would you like to do?\n'Quit' or 'Restart'?\n "
            )?;
            self.output.flush()?;
            let line = self.read_line()?;
            let answer = line.trim();
            match answer.to_uppercase().as_str() {
                "Q" | "QUIT" => return Ok(NextAction::Quit),
                "R" | "RESTART" => return Ok(NextAction::Restart),
                _ => writeln!(
                    self.output,
                    "--------------------------\n\n {answer} is not a valid option.\n"
                )?,
            }
        }
    }

    fn read_line(&mut self) -> Result<String, PromptError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::InputClosed);
        }
        Ok(line)
    }
}
