use thiserror::Error;

use super::types::TrajectorySummary;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("trajectory has no balances to summarize")]
    EmptyTrajectory,
}

pub fn summarize(balances: &[f64]) -> Result<TrajectorySummary, SummaryError> {
    let Some(&first) = balances.first() else {
        return Err(SummaryError::EmptyTrajectory);
    };

    let (maximum, minimum, total) = balances[1..].iter().fold(
        (first, first, first),
        |(max, min, total), &value| (max.max(value), min.min(value), total + value),
    );

    Ok(TrajectorySummary {
        maximum,
        minimum,
        average: total / balances.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_average_lies_between_minimum_and_maximum(
            balances in proptest::collection::vec(-1.0e7_f64..1.0e7, 1..60),
        ) {
            let summary = summarize(&balances).expect("non-empty");
            prop_assert!(summary.minimum <= summary.maximum);
            prop_assert!(summary.average >= summary.minimum - 1e-6);
            prop_assert!(summary.average <= summary.maximum + 1e-6);
        }
    }

    #[test]
    fn summary_of_known_trajectory() {
        let summary = summarize(&[997_568.0, 994_190.08, 989_811.43]).expect("non-empty");
        assert_approx(summary.maximum, 997_568.0);
        assert_approx(summary.minimum, 989_811.43);
        assert_approx(summary.average, (997_568.0 + 994_190.08 + 989_811.43) / 3.0);
    }

    #[test]
    fn single_balance_is_its_own_summary() {
        let summary = summarize(&[-12.5]).expect("non-empty");
        assert_approx(summary.maximum, -12.5);
        assert_approx(summary.minimum, -12.5);
        assert_approx(summary.average, -12.5);
    }

    #[test]
    fn empty_trajectory_is_rejected() {
        assert_eq!(summarize(&[]), Err(SummaryError::EmptyTrajectory));
    }
}
