//! Failure injection for the mock orchestrator
//!
//! Supports configurable failure injection for testing retry and error paths.

use std::collections::HashMap;
use std::time::Duration;

use crate::host::TransportError;

/// Orchestrator operations that can be observed and failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Trigger,
    Poll,
    FetchArtifact,
    ConsoleOutput,
    LocateBuild,
}

/// Failure configuration for an operation
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// Error to return (if any)
    pub error: Option<TransportError>,
    /// Delay to add before responding
    pub delay: Option<Duration>,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Create a config that fails without a response; `message` is the error text
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(TransportError::Connection(message.into())),
            delay: None,
            fail_count: None,
        }
    }

    /// Create a config that answers with an HTTP error status
    pub fn http(status: u16) -> Self {
        Self {
            error: Some(TransportError::Http {
                status,
                url: "mock://orchestrator".to_string(),
            }),
            delay: None,
            fail_count: None,
        }
    }

    /// Create a config that just adds delay
    pub fn delay(duration: Duration) -> Self {
        Self {
            error: None,
            delay: Some(duration),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Failure injector for the mock orchestrator
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<Operation, FailureConfig>,
    /// Calls seen per configured operation (for fail_count tracking)
    call_counts: HashMap<Operation, u32>,
}

impl FailureInjector {
    /// Create a new failure injector
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for an operation, replacing any previous one
    pub fn inject(&mut self, op: Operation, config: FailureConfig) {
        self.configs.insert(op, config);
        self.call_counts.insert(op, 0);
    }

    /// Clear all failure injections
    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Clear failure injection for a specific operation
    pub fn clear_op(&mut self, op: Operation) {
        self.configs.remove(&op);
        self.call_counts.remove(&op);
    }

    /// Error to return for this call of `op`, if any
    pub fn check(&mut self, op: Operation) -> Option<TransportError> {
        let config = self.configs.get(&op)?;
        let count = self.call_counts.entry(op).or_insert(0);
        *count += 1;

        if let Some(limit) = config.fail_count {
            if *count > limit {
                return None;
            }
        }
        config.error.clone()
    }

    /// Get the delay for an operation (if any)
    pub fn get_delay(&self, op: Operation) -> Option<Duration> {
        self.configs.get(&op).and_then(|c| c.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_config_http() {
        let config = FailureConfig::http(404);
        assert_eq!(config.error.unwrap().status(), Some(404));
    }

    #[test]
    fn test_injector_without_config() {
        let mut injector = FailureInjector::new();
        assert!(injector.check(Operation::Poll).is_none());
    }

    #[test]
    fn test_injector_fail_count() {
        let mut injector = FailureInjector::new();
        injector.inject(Operation::Connect, FailureConfig::error("EOF").with_fail_count(2));

        assert_eq!(injector.check(Operation::Connect), Some(TransportError::Connection("EOF".to_string())));
        assert!(injector.check(Operation::Connect).is_some());
        assert!(injector.check(Operation::Connect).is_none());
    }

    #[test]
    fn test_delay_only_never_fails() {
        let mut injector = FailureInjector::new();
        injector.inject(Operation::Poll, FailureConfig::delay(Duration::from_millis(1)));
        assert!(injector.check(Operation::Poll).is_none());
        assert_eq!(injector.get_delay(Operation::Poll), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_clear_op() {
        let mut injector = FailureInjector::new();
        injector.inject(Operation::Trigger, FailureConfig::error("x"));
        injector.clear_op(Operation::Trigger);
        assert!(injector.check(Operation::Trigger).is_none());
    }
}
