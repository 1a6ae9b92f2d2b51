use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::driver::DriverError;

/// Failures surfaced by mapper operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input was not a record or a non-empty collection of records.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// The query destination cannot receive materialized records.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// An element could not be classified against its table descriptor.
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// Pass-through failure from the driver, prefixed with the operation.
    #[error("{op}: {source}")]
    Driver {
        /// Operation that issued the statement (select/insert/update/delete).
        op: &'static str,
        /// Underlying driver failure.
        #[source]
        source: DriverError,
    },

    /// A row value could not be bound to its destination field.
    #[error("binding column `{column}`: {source}")]
    Binding {
        /// Resolved column name of the failing binding.
        column: String,
        /// Underlying conversion failure.
        #[source]
        source: anyhow::Error,
    },

    /// Internal fault recovered at an operation boundary.
    #[error("internal fault: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) const fn driver(op: &'static str, source: DriverError) -> Self {
        Self::Driver { op, source }
    }
}

/// Runs a unit of work with a panic guard: query and mutation entry points
/// must never let an internal fault escape to the caller as a panic.
pub(crate) fn guard<T>(work: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
    catch_unwind(AssertUnwindSafe(work))
        .unwrap_or_else(|panic| Err(Error::Internal(panic_message(panic.as_ref()))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}
