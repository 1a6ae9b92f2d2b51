use std::any::TypeId;
use std::sync::Arc;

use sea_query::Value;
use tracing::debug;

use crate::driver::{Context, Executor};
use crate::error::{Error, guard};
use crate::mapper::Mapper;
use crate::record::{Record, RecordObject};
use crate::table::{Column, Table};

/// A polymorphic insert batch. Records of different types may be mixed; the
/// batch groups them by concrete type while preserving the first-seen order
/// of the types, and each group becomes one multi-row statement.
#[derive(Default)]
pub struct Batch<'a> {
    groups: Vec<(TypeId, Vec<&'a dyn RecordObject>)>,
}

impl<'a> Batch<'a> {
    /// An empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record, appending it to its type's group.
    pub fn add(&mut self, record: &'a dyn RecordObject) {
        let key = record.record_type();
        match self.groups.iter_mut().find(|(group, _)| *group == key) {
            Some((_, items)) => items.push(record),
            None => self.groups.push((key, vec![record])),
        }
    }

    /// Adds every record of a homogeneous slice.
    pub fn add_all<T: Record>(&mut self, records: &'a [T]) {
        for record in records {
            self.add(record);
        }
    }

    /// Total number of records across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }

    /// Whether the batch holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The table descriptor of the batch's first record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] when the batch is empty.
    pub fn table(&self) -> Result<Arc<Table>, Error> {
        self.groups
            .first()
            .and_then(|(_, items)| items.first())
            .map(|record| record.table())
            .ok_or_else(|| Error::InvalidShape("empty batch has no table".to_string()))
    }

    pub(crate) fn groups(&self) -> &[(TypeId, Vec<&'a dyn RecordObject>)] {
        &self.groups
    }
}

impl Mapper {
    /// Inserts a homogeneous slice of records as one multi-row statement.
    ///
    /// Uses the table's batch template: the upsert form (`ON DUPLICATE KEY
    /// UPDATE`) when any column is marked for replacement, `INSERT IGNORE`
    /// otherwise. Returns the affected-row count.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`insert_batch`](Self::insert_batch).
    pub fn insert<T: Record>(
        &self, cx: &Context, db: &dyn Executor, records: &[T],
    ) -> Result<u64, Error> {
        let mut batch = Batch::new();
        batch.add_all(records);
        self.insert_batch(cx, db, &batch)
    }

    /// Inserts one record with the table's plain single-row statement,
    /// without the ignore/upsert behavior of the batch form.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`insert_batch`](Self::insert_batch).
    pub fn insert_one<T: Record>(
        &self, cx: &Context, db: &dyn Executor, record: &T,
    ) -> Result<u64, Error> {
        guard(|| {
            let table = Table::of::<T>();
            let item: &dyn RecordObject = record;
            let mut args = Vec::with_capacity(table.insert_columns().len());
            self.bind_insert_args(&table, item, &mut args)?;

            debug!(
                table = %table.name,
                sql = %table.insert_sql,
                param_count = args.len(),
                "generated insert SQL"
            );
            db.execute(cx, &table.insert_sql, &args)
                .map_err(|source| Error::driver("insert", source))
        })
    }

    /// Inserts a batch, issuing one multi-row statement per type group in
    /// the batch's group order. Returns the summed affected-row count.
    ///
    /// Blank (`0`) `i64` values of special columns are replaced in the bound
    /// arguments, never in the records themselves: `created_at` and
    /// `updated_at` get the current Unix timestamp, generated-id and
    /// primary-key columns get a fresh identifier.
    ///
    /// Groups run sequentially without a transaction; when a group fails,
    /// earlier groups have already been committed and the error is returned
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Driver`] on driver failure, [`Error::UnsupportedShape`]
    /// when a record does not expose a mapped column, and [`Error::Internal`]
    /// when an internal fault is recovered.
    pub fn insert_batch(
        &self, cx: &Context, db: &dyn Executor, batch: &Batch<'_>,
    ) -> Result<u64, Error> {
        guard(|| {
            let mut affected = 0;
            for (_, items) in batch.groups() {
                let Some(first) = items.first() else {
                    continue;
                };
                let table = first.table();
                let sql = table.batch_insert_sql(items.len());

                let mut args = Vec::with_capacity(items.len() * table.insert_columns().len());
                for item in items {
                    self.bind_insert_args(&table, *item, &mut args)?;
                }

                debug!(
                    table = %table.name,
                    sql = %sql,
                    param_count = args.len(),
                    rows = items.len(),
                    "generated batch insert SQL"
                );
                affected += db
                    .execute(cx, &sql, &args)
                    .map_err(|source| Error::driver("insert", source))?;
            }
            Ok(affected)
        })
    }

    /// Binds one record's insert arguments in sorted column order, skipping
    /// auto-increment columns and substituting blank special values.
    fn bind_insert_args(
        &self, table: &Table, record: &dyn RecordObject, args: &mut Vec<Value>,
    ) -> Result<(), Error> {
        for column in table.columns() {
            if column.auto_increment {
                continue;
            }
            let value = record.read_field(column.field).ok_or_else(|| {
                Error::UnsupportedShape(format!(
                    "record for table `{}` has no field `{}`",
                    table.name, column.field,
                ))
            })?;
            args.push(self.coerce_blank(column, value));
        }
        Ok(())
    }

    /// Substitutes a blank `i64` value for a special column; all other
    /// values pass through unchanged.
    fn coerce_blank(&self, column: &Column, value: Value) -> Value {
        if !matches!(value, Value::BigInt(Some(0))) {
            return value;
        }
        if column.field == "created_at" || column.field == "updated_at" {
            return Value::BigInt(Some(chrono::Utc::now().timestamp()));
        }
        if column.generated_id || column.primary_key {
            return Value::BigInt(Some(self.ids.next_id()));
        }
        value
    }
}
