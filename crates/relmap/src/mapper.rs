use std::sync::Arc;

use crate::ids::{IdSource, RandomIds};
use crate::record::{Record, RecordObject};

/// The mapper facade. Stateless apart from its identifier source; cheap to
/// clone and safe to share across threads.
///
/// All operations render SQL text with `?` placeholders and hand it to the
/// caller-supplied driver together with positional arguments.
#[derive(Clone)]
pub struct Mapper {
    pub(crate) ids: Arc<dyn IdSource>,
}

impl Mapper {
    /// A mapper with the default random identifier source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: Arc::new(RandomIds),
        }
    }

    /// A mapper drawing generated identifiers from `ids`.
    #[must_use]
    pub fn with_ids(ids: Arc<dyn IdSource>) -> Self {
        Self { ids }
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper").finish_non_exhaustive()
    }
}

/// Target table of an update or delete: either a literal table name, or a
/// record whose descriptor resolves the name.
#[derive(Clone, Copy)]
pub enum TableRef<'a> {
    /// A literal table name, used verbatim.
    Name(&'a str),
    /// A record; its table descriptor supplies the name.
    Record(&'a dyn RecordObject),
}

impl<'a> TableRef<'a> {
    /// A reference resolving through `record`'s table descriptor.
    pub fn record<T: Record>(record: &'a T) -> Self {
        Self::Record(record)
    }

    pub(crate) fn resolve(&self) -> String {
        match self {
            Self::Name(name) => (*name).to_string(),
            Self::Record(record) => record.table().name.clone(),
        }
    }
}

impl<'a> From<&'a str> for TableRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

/// Appends a caller-supplied filter clause to `sql`, prefixing `WHERE `
/// unless the clause already starts with the keyword (case-insensitively).
/// Returns whether anything was appended; blank clauses are ignored.
pub(crate) fn append_where(sql: &mut String, clause: &str) -> bool {
    let clause = clause.trim();
    if clause.is_empty() {
        return false;
    }
    sql.push(' ');
    let has_keyword = clause
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("where"));
    if !has_keyword {
        sql.push_str("WHERE ");
    }
    sql.push_str(clause);
    true
}
