//! The driver boundary: the mapper renders SQL text and positional
//! arguments, the driver executes them. Implementations live outside this
//! crate; these traits only fix the shape of the exchange.

use std::time::Instant;

use sea_query::Value;

/// Opaque cancellation/deadline token threaded through to every driver call
/// unchanged. The mapper itself imposes no timeout and performs no retries;
/// honoring the deadline is entirely the driver's concern.
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// A context with no deadline.
    #[must_use]
    pub const fn background() -> Self {
        Self { deadline: None }
    }

    /// A context carrying an absolute deadline.
    #[must_use]
    pub const fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// The deadline, if one was set.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Failure reported by the driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The statement produced no rows. On single-row fetches the mapper
    /// translates this to success-with-no-data; absence is not an error.
    #[error("no rows in result set")]
    NoRows,

    /// Any other driver failure, passed through unchanged.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Write channel: executes a statement and reports the affected-row count.
pub trait Executor {
    /// Executes `sql` with positional `args`.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure unchanged.
    fn execute(&self, cx: &Context, sql: &str, args: &[Value]) -> Result<u64, DriverError>;
}

/// Read channel: executes a query and returns a row cursor.
pub trait Querier {
    /// Executes `sql` with positional `args` and opens a cursor.
    ///
    /// # Errors
    ///
    /// Returns the driver's failure unchanged.
    fn query<'a>(
        &'a self, cx: &Context, sql: &str, args: &[Value],
    ) -> Result<Box<dyn Rows + 'a>, DriverError>;
}

/// An open cursor. Each row's values arrive in the column order the query
/// requested. Dropping the cursor releases it, on every exit path.
pub trait Rows {
    /// Advances to the next row, or `None` once the cursor is exhausted.
    fn next_row(&mut self) -> Option<Result<Vec<Value>, DriverError>>;
}
