//! Lightweight data mapper for relational records.
//!
//! `relmap` derives relational table metadata from record type definitions,
//! generates SQL text for select / insert / batch-insert / update / delete
//! operations, and reconstructs records from query result rows. It is not a
//! query builder and not a migration tool: callers keep writing their own
//! `WHERE` clauses, and the library keeps the per-type bookkeeping.
//!
//! # Quick Start
//!
//! ## Define a record
//!
//! ```ignore
//! use relmap::record;
//!
//! record! {
//!     #[derive(Debug, Clone, Default)]
//!     pub struct User {
//!         pub id: i64 => "primary_key;newid",
//!         pub user_name: String => "column:name",
//!         pub created_at: i64,
//!         pub updated_at: i64 => "on_update",
//!     }
//! }
//! ```
//!
//! Field annotations are semicolon-separated `key` or `key:value` tokens.
//! Recognized keys: `column`, `primary_key`, `auto_increment`, `newid`
//! (generated-identifier field) and `on_update` (participates in the upsert
//! assignment list). The literal value `-` excludes a field entirely, and a
//! `table = "name"` header overrides the table name derived from the type.
//!
//! ## CRUD operations
//!
//! ```ignore
//! use relmap::{Context, Mapper, Value};
//!
//! let mapper = Mapper::new();
//! let cx = Context::background();
//!
//! // Insert one or many records; blank ids and timestamps are filled in.
//! mapper.insert(&cx, &db, &[user_a, user_b])?;
//!
//! // Select into a single record or a collection.
//! let mut found: Option<User> = None;
//! mapper.select(&cx, &db, &mut found, "id=?", &[Value::from(42_i64)])?;
//!
//! let mut all: Vec<User> = Vec::new();
//! mapper.select(&cx, &db, &mut all, "age>?", &[Value::from(21_i64)])?;
//!
//! // Update and delete take a table name or a record to derive one from.
//! mapper.update(&cx, &db, "user".into(), &[("name", "bob".into())], "id=?", &[Value::from(42_i64)])?;
//! mapper.delete(&cx, &db, "user".into(), "id=?", &[Value::from(42_i64)])?;
//! ```
//!
//! Table descriptors are derived once per record type and cached for the
//! lifetime of the process; concurrent first-time derivation publishes
//! exactly one descriptor.

mod delete;
mod driver;
mod error;
mod ids;
mod insert;
mod mapper;
mod name;
mod record;
mod select;
mod table;
mod update;

pub use driver::{Context, DriverError, Executor, Querier, Rows};
pub use error::Error;
pub use ids::{IdSource, RandomIds};
pub use insert::Batch;
pub use mapper::{Mapper, TableRef};
pub use name::column_name;
pub use record::{FieldSpec, FromValue, Record, RecordObject};
// Re-export the bind-parameter value type so callers never import sea-query.
pub use sea_query::Value;
pub use select::Destination;
pub use table::{Column, Table};

// Re-exports for ``record!`` macro use only.
#[doc(hidden)]
pub mod __private {
    pub use anyhow;
}
