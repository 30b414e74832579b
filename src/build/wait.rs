//! Block until a build reached a terminal result

use std::time::Duration;

use crate::host::{Session, TransportError};
use crate::retry::RetryBudget;

use super::Build;

/// Polling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Pause before each poll
    pub poll_interval: Duration,
    /// Poll errors tolerated over the whole wait
    pub max_retries: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            max_retries: 4,
        }
    }
}

/// Waiting errors
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("Max retries ({limit}) exceeded while waiting for build to finish. Last error: {last}")]
    RetriesExceeded { limit: u32, last: TransportError },
}

/// Poll `build` until it is terminal.
///
/// Every poll error spends one unit of the retry budget; a successful poll
/// does not restore it.
pub fn wait_for_terminal(session: &dyn Session, build: &mut Build, config: &WaitConfig) -> Result<(), WaitError> {
    let mut budget = RetryBudget::new(config.max_retries);

    while build.is_running() {
        if !config.poll_interval.is_zero() {
            std::thread::sleep(config.poll_interval);
        }

        match session.poll(build) {
            Ok(result) => {
                tracing::debug!(build = build.number, "polled build state: {}", result);
                build.record(result);
            }
            Err(e) => {
                if !budget.spend() {
                    return Err(WaitError::RetriesExceeded {
                        limit: budget.limit(),
                        last: e,
                    });
                }
                tracing::warn!(
                    "({}/{}) Failed to poll build '{}': {}",
                    budget.spent(),
                    budget.limit(),
                    build.url,
                    e
                );
            }
        }
    }

    tracing::info!("Build {} finished with result {}", build.url, build.result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildResult;
    use crate::mock::{FailureConfig, MockOrchestrator, Operation};

    fn config() -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::ZERO,
            max_retries: 4,
        }
    }

    #[test]
    fn test_wait_until_terminal() {
        let orchestrator = MockOrchestrator::new("https://j");
        let mut build = orchestrator.add_build(
            "f/job/app",
            7,
            vec![BuildResult::Running, BuildResult::Running, BuildResult::Success],
        );

        wait_for_terminal(&orchestrator.session(), &mut build, &config()).unwrap();
        assert_eq!(build.result, BuildResult::Success);
        assert_eq!(orchestrator.call_count(Operation::Poll), 3);
    }

    #[test]
    fn test_terminal_build_not_polled() {
        let orchestrator = MockOrchestrator::new("https://j");
        let mut build = orchestrator.add_build("f/job/app", 7, vec![BuildResult::Success]);
        build.record(BuildResult::Failure);

        wait_for_terminal(&orchestrator.session(), &mut build, &config()).unwrap();
        assert_eq!(build.result, BuildResult::Failure);
        assert_eq!(orchestrator.call_count(Operation::Poll), 0);
    }

    #[test]
    fn test_poll_budget_exhausted() {
        let orchestrator = MockOrchestrator::new("https://j");
        orchestrator.inject(Operation::Poll, FailureConfig::error("EOF"));
        let mut build = orchestrator.add_build("f/job/app", 7, vec![BuildResult::Success]);

        let err = wait_for_terminal(&orchestrator.session(), &mut build, &config()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Max retries (4) exceeded while waiting for build to finish. Last error: EOF"
        );
        assert_eq!(orchestrator.call_count(Operation::Poll), 5);
    }

    #[test]
    fn test_budget_not_refilled_by_success() {
        let orchestrator = MockOrchestrator::new("https://j");
        let eof = || -> Result<BuildResult, TransportError> { Err(TransportError::Connection("EOF".to_string())) };
        let mut build = orchestrator.add_build_with_polls(
            "f/job/app",
            7,
            vec![
                eof(),
                Ok(BuildResult::Running),
                eof(),
                Ok(BuildResult::Running),
                eof(),
                eof(),
                eof(),
                Ok(BuildResult::Success),
            ],
        );

        let err = wait_for_terminal(&orchestrator.session(), &mut build, &config()).unwrap_err();
        assert!(matches!(err, WaitError::RetriesExceeded { limit: 4, .. }));
        assert_eq!(orchestrator.call_count(Operation::Poll), 7);
        assert!(build.is_running());
    }

    #[test]
    fn test_errors_within_budget_tolerated() {
        let orchestrator = MockOrchestrator::new("https://j");
        orchestrator.inject(Operation::Poll, FailureConfig::error("EOF").with_fail_count(3));
        let mut build = orchestrator.add_build(
            "f/job/app",
            7,
            vec![BuildResult::Running, BuildResult::Success],
        );

        wait_for_terminal(&orchestrator.session(), &mut build, &config()).unwrap();
        assert_eq!(build.result, BuildResult::Success);
        assert_eq!(orchestrator.call_count(Operation::Poll), 5);
    }
}
