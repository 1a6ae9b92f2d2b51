use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use sea_query::Value;

use crate::error::Error;
use crate::name::column_name;
use crate::record::Record;

/// Process-wide descriptor cache. Populated lazily, never evicted; cached
/// lookups are cheap concurrent reads.
static TABLES: LazyLock<DashMap<TypeId, Arc<Table>>> = LazyLock::new(DashMap::new);

/// One mapped field of a record type. Immutable once built.
#[derive(Debug, Clone)]
pub struct Column {
    /// Resolved column name (annotation override or normalized field name).
    pub name: String,
    /// Declared field name on the owning record type.
    pub field: &'static str,
    /// The column is part of the primary key.
    pub primary_key: bool,
    /// The column is auto-incremented and excluded from inserts.
    pub auto_increment: bool,
    /// A blank value is replaced by a generated identifier on insert.
    pub generated_id: bool,
    /// The column participates in the upsert assignment list.
    pub on_update: bool,
    /// Full annotation mapping, including unrecognized keys.
    pub tags: HashMap<String, String>,
}

/// A record type's relational shape: its resolved table name, column
/// descriptors sorted by column name, and pre-rendered SQL fragments.
/// Exactly one instance exists per record type for the process lifetime.
#[derive(Debug)]
pub struct Table {
    /// Resolved table name.
    pub name: String,
    /// Fully-qualified record type name, for diagnostics.
    pub type_name: &'static str,
    /// `SELECT <columns> FROM <table>`, ready for a clause suffix.
    pub select_sql: String,
    /// Single-row insert statement. Always the plain form, never upsert.
    pub insert_sql: String,
    type_id: TypeId,
    columns: Vec<Column>,
    all_columns: Vec<String>,
    insert_columns: Vec<String>,
    replace_columns: Vec<String>,
    batch_prefix: String,
    batch_suffix: String,
}

impl Table {
    /// The cached descriptor for `T`, deriving it on first use.
    pub fn of<T: Record>() -> Arc<Self> {
        let key = TypeId::of::<T>();
        if let Some(table) = TABLES.get(&key) {
            return Arc::clone(table.value());
        }

        // entry() serializes concurrent first-time derivation of the same
        // type, so exactly one descriptor is ever published per type.
        let entry = TABLES.entry(key).or_insert_with(|| Arc::new(Self::build::<T>()));
        Arc::clone(entry.value())
    }

    fn build<T: Record>() -> Self {
        let mut name = column_name(T::NAME);
        let mut columns = Vec::with_capacity(T::fields().len());

        for spec in T::fields() {
            if spec.tag == "-" {
                continue;
            }
            if spec.name == "table" {
                if !spec.tag.is_empty() {
                    name = spec.tag.to_string();
                }
                continue;
            }

            let tags = parse_tag(spec.tag);
            columns.push(Column {
                name: tags
                    .get("column")
                    .filter(|explicit| !explicit.is_empty())
                    .cloned()
                    .unwrap_or_else(|| column_name(spec.name)),
                field: spec.name,
                primary_key: tags.contains_key("primary_key"),
                auto_increment: tags.contains_key("auto_increment"),
                generated_id: tags.contains_key("newid"),
                on_update: tags.contains_key("on_update"),
                tags,
            });
        }

        let mut all_columns = Vec::with_capacity(columns.len());
        let mut insert_columns = Vec::with_capacity(columns.len());
        let mut replace_columns = Vec::new();
        for column in &columns {
            let quoted = format!("`{}`", column.name);
            all_columns.push(quoted.clone());
            if !column.auto_increment {
                insert_columns.push(quoted.clone());
            }
            if column.on_update {
                replace_columns.push(format!("{quoted}=VALUES({quoted})"));
            }
        }

        // Columns and name lists share one ordering: the sorted column order
        // governs both the select list and the row-scan destination order.
        all_columns.sort();
        insert_columns.sort();
        replace_columns.sort();
        columns.sort_by(|a, b| a.name.cmp(&b.name));

        let select_sql = format!("SELECT {} FROM `{name}`", all_columns.join(","));
        let insert_sql = format!(
            "INSERT INTO `{name}` ({}) VALUES {}",
            insert_columns.join(","),
            placeholder_tuple(insert_columns.len()),
        );

        let verb = if replace_columns.is_empty() { "INSERT IGNORE INTO" } else { "INSERT INTO" };
        let batch_prefix = format!("{verb} `{name}` ({}) VALUES ", insert_columns.join(","));
        let batch_suffix = if replace_columns.is_empty() {
            String::new()
        } else {
            format!(" ON DUPLICATE KEY UPDATE {}", replace_columns.join(","))
        };

        Self {
            name,
            type_name: type_name::<T>(),
            select_sql,
            insert_sql,
            type_id: TypeId::of::<T>(),
            columns,
            all_columns,
            insert_columns,
            replace_columns,
            batch_prefix,
            batch_suffix,
        }
    }

    /// Column descriptors, sorted by column name.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// All quoted column names, sorted. Same order as [`columns`](Self::columns).
    #[must_use]
    pub fn all_columns(&self) -> &[String] {
        &self.all_columns
    }

    /// Quoted column names participating in inserts (auto-increment columns
    /// excluded), sorted.
    #[must_use]
    pub fn insert_columns(&self) -> &[String] {
        &self.insert_columns
    }

    /// Upsert assignment fragments (`` `c`=VALUES(`c`) ``), sorted. Non-empty
    /// exactly when the batch template is the upsert form.
    #[must_use]
    pub fn replace_columns(&self) -> &[String] {
        &self.replace_columns
    }

    /// Renders the batch-insert statement for `rows` value tuples.
    #[must_use]
    pub fn batch_insert_sql(&self, rows: usize) -> String {
        let tuple = placeholder_tuple(self.insert_columns.len());
        let mut values = String::with_capacity(rows * (tuple.len() + 1));
        for i in 0..rows {
            if i > 0 {
                values.push(',');
            }
            values.push_str(&tuple);
        }
        format!("{}{values}{}", self.batch_prefix, self.batch_suffix)
    }

    /// Materializes a record from one row: allocates a zero-valued instance
    /// and binds each value to its field, in sorted column order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedShape`] when `T` is not the descriptor's
    /// record type or the row width does not match, and [`Error::Binding`]
    /// when a value cannot be converted to its destination field.
    pub fn scan<T: Record>(&self, row: Vec<Value>) -> Result<T, Error> {
        if TypeId::of::<T>() != self.type_id {
            return Err(Error::UnsupportedShape(format!(
                "descriptor for `{}` cannot materialize `{}`",
                self.type_name,
                type_name::<T>(),
            )));
        }
        if row.len() != self.columns.len() {
            return Err(Error::UnsupportedShape(format!(
                "row has {} values but table `{}` has {} columns",
                row.len(),
                self.name,
                self.columns.len(),
            )));
        }

        let mut record = T::default();
        for (column, value) in self.columns.iter().zip(row) {
            record.write(column.field, value).map_err(|source| Error::Binding {
                column: column.name.clone(),
                source,
            })?;
        }
        Ok(record)
    }
}

fn placeholder_tuple(width: usize) -> String {
    let mut tuple = String::with_capacity(2 * width + 1);
    tuple.push('(');
    for i in 0..width {
        if i > 0 {
            tuple.push(',');
        }
        tuple.push('?');
    }
    tuple.push(')');
    tuple
}

fn parse_tag(tag: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for token in tag.split(';') {
        if token.is_empty() {
            continue;
        }
        match token.split_once(':') {
            Some((key, value)) => {
                map.insert(key.trim().to_string(), value.to_string());
            }
            // Bare keys are boolean flags.
            None => {
                map.insert(token.to_string(), "true".to_string());
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_tokens_parse_as_flags_and_pairs() {
        let tags = parse_tag("primary_key;column:user_id;newid");
        assert_eq!(tags.get("primary_key").map(String::as_str), Some("true"));
        assert_eq!(tags.get("column").map(String::as_str), Some("user_id"));
        assert_eq!(tags.get("newid").map(String::as_str), Some("true"));
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn empty_tag_yields_no_tokens() {
        assert!(parse_tag("").is_empty());
    }

    #[test]
    fn placeholder_tuples() {
        assert_eq!(placeholder_tuple(0), "()");
        assert_eq!(placeholder_tuple(1), "(?)");
        assert_eq!(placeholder_tuple(3), "(?,?,?)");
    }
}
