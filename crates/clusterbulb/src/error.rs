//! Errors that stop the monitor.

use thiserror::Error;

use crate::budget::BudgetExhausted;

/// Fatal conditions surfaced by the monitor loop. Everything else is
/// recovered locally and logged.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    BudgetExhausted(#[from] BudgetExhausted),
}
