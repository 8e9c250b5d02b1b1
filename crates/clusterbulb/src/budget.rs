//! Cumulative failure budget for collaborator calls.

use thiserror::Error;

/// Returned by [`ErrorBudget::record_failure`] once the limit is reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} error budget exhausted after {failures} failures")]
pub struct BudgetExhausted {
    pub name: &'static str,
    pub failures: u32,
}

/// Counts failures of one collaborator for the process lifetime.
///
/// Successes never reset the count. Reaching `limit` is fatal; the caller
/// decides how to terminate.
#[derive(Debug, Clone)]
pub struct ErrorBudget {
    name: &'static str,
    limit: u32,
    failures: u32,
}

impl ErrorBudget {
    /// `limit` of zero is treated as one.
    #[must_use]
    pub fn new(name: &'static str, limit: u32) -> Self {
        Self {
            name,
            limit: limit.max(1),
            failures: 0,
        }
    }

    pub fn record_failure(&mut self) -> Result<(), BudgetExhausted> {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.limit {
            Err(BudgetExhausted {
                name: self.name,
                failures: self.failures,
            })
        } else {
            Ok(())
        }
    }

    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.failures)
    }
}
