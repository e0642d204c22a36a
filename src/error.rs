//! # Error Types
//!
//! This module defines the error type shared by every part of the solving layer.
//! Most of these errors never reach the caller of [`Optimizer::solve`]: solvers
//! convert them into a [`SolverStatus::Failed`] result, and the factory recovers
//! from construction errors by substituting the heuristic fallback.
//!
//! [`Optimizer::solve`]: crate::optimizer::Optimizer::solve
//! [`SolverStatus::Failed`]: crate::result::SolverStatus::Failed
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use qapopt::error::{OptimizerError, Result};
//!
//! fn check_dimension(n: usize) -> Result<usize> {
//!     if n == 0 {
//!         return Err(OptimizerError::Validation("empty instance".to_string()));
//!     }
//!     Ok(n)
//! }
//!
//! assert!(check_dimension(0).is_err());
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use qapopt::error::{OptimizerError, OptionExt};
//!
//! fn best_cost(costs: &[f64]) -> qapopt::error::Result<f64> {
//!     costs
//!         .iter()
//!         .copied()
//!         .reduce(f64::min)
//!         .ok_or_else_opt(|| OptimizerError::Algorithm("no candidates evaluated".to_string()))
//! }
//!
//! assert_eq!(best_cost(&[3.0, 1.0]).unwrap(), 1.0);
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Represents errors that can occur while building, configuring, or running optimizers.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// The problem instance is structurally invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A solver could not be instantiated.
    #[error("Construction error: {0}")]
    Construction(String),

    /// An invalid configuration value was provided.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A benchmark instance name is not part of the catalog.
    #[error("Unknown benchmark instance: {0}")]
    UnknownInstance(String),

    /// Instance data could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unexpected failure inside an optimization loop.
    #[error("Algorithm error: {0}")]
    Algorithm(String),

    /// Error that occurs when an I/O operation fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for optimizer operations.
pub type Result<T> = std::result::Result<T, OptimizerError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use qapopt::error::ResultExt;
/// use std::fs::File;
///
/// fn open_instance(path: &str) -> qapopt::error::Result<()> {
///     File::open(path).context("Failed to open instance file")?;
///     Ok(())
/// }
///
/// assert!(open_instance("/definitely/not/here.dat").is_err());
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error into an `OptimizerError::Other` prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| OptimizerError::Other(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T>` using a closure to build the error.
    fn ok_or_else_opt<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> OptimizerError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_opt<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> OptimizerError,
    {
        self.ok_or_else(err_fn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let err = OptimizerError::Validation("distance is not square".to_string());
        assert_eq!(err.to_string(), "Validation error: distance is not square");
    }

    #[test]
    fn test_io_error_converts() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/qapopt/instance.dat")?)
        }
        assert!(matches!(read(), Err(OptimizerError::Io(_))));
    }

    #[test]
    fn test_context_wraps_message() {
        let parsed: std::result::Result<u32, _> = "x".parse::<u32>();
        let err = parsed.context("reading n").unwrap_err();
        assert!(err.to_string().starts_with("reading n: "));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<u8> = None;
        let err = none
            .ok_or_else_opt(|| OptimizerError::Other("missing".to_string()))
            .unwrap_err();
        assert_eq!(err.to_string(), "missing");
    }
}
