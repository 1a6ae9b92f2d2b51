use sea_query::Value;
use tracing::debug;

use crate::driver::{Context, DriverError, Querier};
use crate::error::{Error, guard};
use crate::mapper::{Mapper, append_where};
use crate::record::Record;
use crate::table::Table;

/// Receiver of materialized records. Single-record destinations keep only
/// the first row; collection destinations accumulate every row.
///
/// Implemented for `Option<T>` (single) and `Vec<T>` (collection). Custom
/// containers implement it to receive rows directly.
pub trait Destination {
    /// Record type the destination receives.
    type Record: Record;

    /// Whether the destination holds at most one record. Single
    /// destinations get a `limit 1` appended to generated queries and stop
    /// reading after the first row.
    const SINGLE: bool;

    /// Receives one materialized record.
    fn receive(&mut self, record: Self::Record);
}

impl<T: Record> Destination for Option<T> {
    type Record = T;
    const SINGLE: bool = true;

    fn receive(&mut self, record: T) {
        *self = Some(record);
    }
}

impl<T: Record> Destination for Vec<T> {
    type Record = T;
    const SINGLE: bool = false;

    fn receive(&mut self, record: T) {
        self.push(record);
    }
}

impl Mapper {
    /// Queries the destination's table with an optional filter clause and
    /// materializes rows into `dest`.
    ///
    /// The statement is the table's generated select list plus `clause`; a
    /// bare clause gets a `WHERE ` prefix. An empty result set leaves the
    /// destination untouched and is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] on driver failure, [`Error::Binding`] when
    /// a row value cannot be bound, and [`Error::Internal`] when an internal
    /// fault is recovered.
    pub fn select<D: Destination>(
        &self, cx: &Context, db: &dyn Querier, dest: &mut D, clause: &str, args: &[Value],
    ) -> Result<(), Error> {
        guard(|| {
            let table = Table::of::<D::Record>();
            let mut sql = table.select_sql.clone();
            append_where(&mut sql, clause);
            fetch(cx, db, dest, &table, sql, args)
        })
    }

    /// Runs a caller-written query and materializes rows into `dest`.
    ///
    /// The SQL is passed through verbatim, except that single destinations
    /// get a ` limit 1` appended when the text does not already mention a
    /// limit. The query must select the destination table's full column
    /// list, in sorted column order.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`select`](Self::select).
    pub fn query<D: Destination>(
        &self, cx: &Context, db: &dyn Querier, dest: &mut D, sql: &str, args: &[Value],
    ) -> Result<(), Error> {
        guard(|| {
            let table = Table::of::<D::Record>();
            fetch(cx, db, dest, &table, sql.to_string(), args)
        })
    }

    /// Runs a caller-written query and returns the first row's raw values,
    /// or `None` when the result set is empty.
    ///
    /// The SQL is passed through verbatim; only the first row is read and
    /// the cursor is then released.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] on driver failure and [`Error::Internal`]
    /// when an internal fault is recovered.
    pub fn query_row(
        &self, cx: &Context, db: &dyn Querier, sql: &str, args: &[Value],
    ) -> Result<Option<Vec<Value>>, Error> {
        guard(|| {
            debug!(sql = %sql, param_count = args.len(), "running row query");

            let mut rows = match db.query(cx, sql, args) {
                Ok(rows) => rows,
                Err(DriverError::NoRows) => return Ok(None),
                Err(source) => return Err(Error::driver("select", source)),
            };
            match rows.next_row() {
                Some(Ok(row)) => Ok(Some(row)),
                Some(Err(DriverError::NoRows)) | None => Ok(None),
                Some(Err(source)) => Err(Error::driver("select", source)),
            }
        })
    }
}

fn fetch<D: Destination>(
    cx: &Context, db: &dyn Querier, dest: &mut D, table: &Table, mut sql: String, args: &[Value],
) -> Result<(), Error> {
    if D::SINGLE {
        push_limit_one(&mut sql);
    }
    debug!(table = %table.name, sql = %sql, param_count = args.len(), "generated select SQL");

    let mut rows = match db.query(cx, &sql, args) {
        Ok(rows) => rows,
        // Absence is not an error: the destination stays untouched.
        Err(DriverError::NoRows) => return Ok(()),
        Err(source) => return Err(Error::driver("select", source)),
    };

    // Materialize into a local buffer first: the destination only receives
    // records once the cursor has drained cleanly, so a mid-stream failure
    // leaves it untouched.
    let mut buffered = Vec::new();
    while let Some(row) = rows.next_row() {
        let row = match row {
            Ok(row) => row,
            Err(DriverError::NoRows) => break,
            Err(source) => return Err(Error::driver("select", source)),
        };
        buffered.push(table.scan::<D::Record>(row)?);
        if D::SINGLE {
            break;
        }
    }
    for record in buffered {
        dest.receive(record);
    }
    Ok(())
}

/// Appends ` limit 1` unless the text already mentions a limit, in any case.
fn push_limit_one(sql: &mut String) {
    if !sql.to_ascii_lowercase().contains("limit") {
        sql.push_str(" limit 1");
    }
}
