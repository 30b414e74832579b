//! Bounded retry
//!
//! One retry mechanism shared by connection setup, artifact retrieval and
//! build polling:
//! - `RetryPolicy`: fixed number of attempts with a fixed delay in between
//! - `RetryBudget`: error allowance that is spent across a longer loop and
//!   never refilled

use std::time::Duration;

/// Fixed-attempt retry with a constant delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (at least 1)
    pub max_attempts: u32,
    /// Pause between two attempts
    pub delay: Duration,
}

/// Successful outcome of a retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    pub value: T,
    /// Attempt (1-based) that succeeded
    pub attempts: u32,
}

/// All attempts failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    /// Number of attempts made
    pub attempts: u32,
    /// Error of the final attempt
    pub last_error: E,
}

impl RetryPolicy {
    /// Create a new policy; `max_attempts` below 1 is raised to 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Policy without any delay, for tests and local use
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run<T, E, F>(&self, op: F) -> Result<Attempted<T>, Exhausted<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        self.run_observed(op, |_, _| {})
    }

    /// Like `run`, calling `on_failure(attempt, &error)` after each failed attempt
    pub fn run_observed<T, E, F, O>(&self, mut op: F, mut on_failure: O) -> Result<Attempted<T>, Exhausted<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
        O: FnMut(u32, &E),
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        attempts: attempt,
                    })
                }
                Err(e) => {
                    on_failure(attempt, &e);
                    if attempt >= self.max_attempts {
                        return Err(Exhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                }
            }
            attempt += 1;
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }
    }
}

/// Error allowance spent across a polling loop.
///
/// Every error spends one unit; successful iterations do not refill it.
/// The loop must stop once more errors than `limit` have been seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    limit: u32,
    spent: u32,
}

impl RetryBudget {
    /// Create a new budget allowing `limit` errors
    pub fn new(limit: u32) -> Self {
        Self { limit, spent: 0 }
    }

    /// Record one error. Returns `false` once the budget is exceeded.
    pub fn spend(&mut self) -> bool {
        self.spent = self.spent.saturating_add(1);
        self.spent <= self.limit
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn spent(&self) -> u32 {
        self.spent
    }

    pub fn is_exhausted(&self) -> bool {
        self.spent > self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_after_failures() {
        let policy = RetryPolicy::immediate(5);
        let result: Result<Attempted<&str>, Exhausted<String>> = policy.run(|attempt| {
            if attempt <= 3 {
                Err(format!("fail {}", attempt))
            } else {
                Ok("up")
            }
        });

        let done = result.unwrap();
        assert_eq!(done.value, "up");
        assert_eq!(done.attempts, 4);
    }

    #[test]
    fn test_exhausted_keeps_last_error() {
        let policy = RetryPolicy::immediate(5);
        let mut calls = 0;
        let result: Result<Attempted<()>, Exhausted<String>> = policy.run(|attempt| {
            calls += 1;
            Err(format!("fail {}", attempt))
        });

        let exhausted = result.unwrap_err();
        assert_eq!(calls, 5);
        assert_eq!(exhausted.attempts, 5);
        assert_eq!(exhausted.last_error, "fail 5");
    }

    #[test]
    fn test_observer_sees_each_failure() {
        let mut seen = Vec::new();
        let _ = RetryPolicy::immediate(3).run_observed(
            |_| Err::<(), _>("nope"),
            |attempt, err| seen.push((attempt, *err)),
        );
        assert_eq!(seen, vec![(1, "nope"), (2, "nope"), (3, "nope")]);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        let result = policy.run(|_| Err::<(), _>("x"));
        assert_eq!(result.unwrap_err().attempts, 1);
    }

    #[test]
    fn test_budget_allows_limit_errors() {
        let mut budget = RetryBudget::new(4);
        for _ in 0..4 {
            assert!(budget.spend());
        }
        assert!(!budget.is_exhausted());
        assert!(!budget.spend());
        assert!(budget.is_exhausted());
        assert_eq!(budget.spent(), 5);
    }
}
