use sea_query::Value;
use tracing::debug;

use crate::driver::{Context, Executor};
use crate::error::{Error, guard};
use crate::mapper::{Mapper, TableRef, append_where};

impl Mapper {
    /// Deletes rows of `table` matching an optional filter clause. Returns
    /// the affected-row count. A blank clause deletes every row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] on driver failure and [`Error::Internal`]
    /// when an internal fault is recovered.
    pub fn delete(
        &self, cx: &Context, db: &dyn Executor, table: TableRef<'_>, clause: &str,
        args: &[Value],
    ) -> Result<u64, Error> {
        guard(|| {
            let name = table.resolve();
            let mut sql = format!("DELETE FROM `{name}`");
            append_where(&mut sql, clause);

            debug!(table = %name, sql = %sql, param_count = args.len(), "generated delete SQL");
            db.execute(cx, &sql, args)
                .map_err(|source| Error::driver("delete", source))
        })
    }
}
