use sea_query::Value;
use tracing::debug;

use crate::driver::{Context, Executor};
use crate::error::{Error, guard};
use crate::mapper::{Mapper, TableRef, append_where};

impl Mapper {
    /// Updates rows of `table`, setting each named column to its paired
    /// value, filtered by an optional clause. Returns the affected-row
    /// count.
    ///
    /// Assignments keep the caller's order; clause arguments are bound after
    /// the assignment values, and only when the clause is non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] on driver failure and [`Error::Internal`]
    /// when an internal fault is recovered.
    pub fn update(
        &self, cx: &Context, db: &dyn Executor, table: TableRef<'_>,
        values: &[(&str, Value)], clause: &str, args: &[Value],
    ) -> Result<u64, Error> {
        guard(|| {
            let name = table.resolve();
            let mut sql = format!("UPDATE `{name}` SET ");
            let mut params = Vec::with_capacity(values.len() + args.len());
            for (i, (column, value)) in values.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&format!("`{column}`=?"));
                params.push(value.clone());
            }
            if append_where(&mut sql, clause) {
                params.extend_from_slice(args);
            }

            debug!(table = %name, sql = %sql, param_count = params.len(), "generated update SQL");
            db.execute(cx, &sql, &params)
                .map_err(|source| Error::driver("update", source))
        })
    }
}
