use std::any::TypeId;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use sea_query::Value;

use crate::table::Table;

/// One declared field of a record type: its identifier-style name and its
/// raw annotation string (semicolon-separated `key` / `key:value` tokens).
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Declared field name.
    pub name: &'static str,
    /// Raw annotation string; empty when the field carries none.
    pub tag: &'static str,
}

/// A mappable record type. The declaration-order binding table returned by
/// [`fields`](Record::fields) replaces runtime reflection: the descriptor
/// builder derives column metadata from it once, and [`read`](Record::read) /
/// [`write`](Record::write) move values across the field boundary by name.
///
/// Typically implemented via the [`record!`](crate::record!) macro rather
/// than manually.
pub trait Record: Default + 'static {
    /// Short type name; the table name falls back to its normalized form.
    const NAME: &'static str;

    /// Declared fields, in declaration order.
    fn fields() -> &'static [FieldSpec];

    /// Reads one field's value, or `None` if no such field exists.
    fn read(&self, field: &str) -> Option<Value>;

    /// Writes a row value into one field.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be converted to the field's
    /// type, or the field does not exist.
    fn write(&mut self, field: &str, value: Value) -> Result<()>;
}

/// Object-safe record capability, auto-implemented for every [`Record`].
/// This is the element type of polymorphic batches: mixed inputs are grouped
/// by [`record_type`](RecordObject::record_type) and resolved to descriptors
/// through [`table`](RecordObject::table).
pub trait RecordObject {
    /// Identity of the concrete record type.
    fn record_type(&self) -> TypeId;

    /// The cached table descriptor for the concrete record type.
    fn table(&self) -> Arc<Table>;

    /// Reads one field's value by declared field name.
    fn read_field(&self, field: &str) -> Option<Value>;
}

impl<T: Record> RecordObject for T {
    fn record_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn table(&self) -> Arc<Table> {
        Table::of::<T>()
    }

    fn read_field(&self, field: &str) -> Option<Value> {
        self.read(field)
    }
}

/// Declares a record struct with an automatic [`Record`] implementation.
///
/// Each field may carry an annotation literal after `=>`; an optional
/// `table = "…"` header overrides the derived table name. Field types must
/// implement `Default`, `Clone`, `Into<Value>` and [`FromValue`].
///
/// # Examples
///
/// ```ignore
/// record! {
///     table = "accounts",
///     #[derive(Debug, Clone, Default)]
///     pub struct Account {
///         pub id: i64 => "primary_key;newid",
///         pub owner: String,
///         pub created_at: i64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(table = $table:literal,)?
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty
            ),*
        }

        impl $crate::Record for $name {
            const NAME: &'static str = stringify!($name);

            fn fields() -> &'static [$crate::FieldSpec] {
                const FIELDS: &[$crate::FieldSpec] = &[
                    $($crate::FieldSpec { name: "table", tag: $table },)?
                    $($crate::FieldSpec {
                        name: stringify!($field),
                        tag: $crate::record!(@tag $($tag)?),
                    }),*
                ];
                FIELDS
            }

            fn read(&self, field: &str) -> Option<$crate::Value> {
                match field {
                    $(stringify!($field) => Some(self.$field.clone().into()),)*
                    _ => None,
                }
            }

            fn write(
                &mut self, field: &str, value: $crate::Value,
            ) -> $crate::__private::anyhow::Result<()> {
                match field {
                    $(stringify!($field) => {
                        self.$field = $crate::FromValue::from_value(value)?;
                        Ok(())
                    })*
                    _ => $crate::__private::anyhow::bail!("unknown field `{field}`"),
                }
            }
        }
    };

    (@tag) => { "" };
    (@tag $tag:literal) => { $tag };
}

/// Trait for types that can be extracted from row values.
///
/// Implemented for the standard column types (`i64`, `String`,
/// `DateTime<Utc>`, …); custom field types implement it to participate in
/// row scanning.
pub trait FromValue: Sized {
    /// Converts a row value into the target type.
    ///
    /// # Errors
    ///
    /// Returns an error if the value's kind does not match.
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(Some(v)) => Ok(v),
            other => bail!("expected boolean value, got {other:?}"),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(Some(v)) => Ok(v),
            Value::SmallInt(Some(v)) => Ok(Self::from(v)),
            Value::TinyInt(Some(v)) => Ok(Self::from(v)),
            other => bail!("expected int32 value, got {other:?}"),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::BigInt(Some(v)) => Ok(v),
            Value::Int(Some(v)) => Ok(Self::from(v)),
            Value::SmallInt(Some(v)) => Ok(Self::from(v)),
            Value::TinyInt(Some(v)) => Ok(Self::from(v)),
            other => bail!("expected int64 value, got {other:?}"),
        }
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Unsigned(Some(v)) => Ok(v),
            Value::SmallUnsigned(Some(v)) => Ok(Self::from(v)),
            Value::TinyUnsigned(Some(v)) => Ok(Self::from(v)),
            other => bail!("expected uint32 value, got {other:?}"),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::BigUnsigned(Some(v)) => Ok(v),
            Value::Unsigned(Some(v)) => Ok(Self::from(v)),
            other => bail!("expected uint64 value, got {other:?}"),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(Some(v)) => Ok(v),
            other => bail!("expected float value, got {other:?}"),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Double(Some(v)) => Ok(v),
            Value::Float(Some(v)) => Ok(Self::from(v)),
            other => bail!("expected double value, got {other:?}"),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(Some(v)) => Ok(*v),
            Value::Char(Some(ch)) => Ok(ch.to_string()),
            other => bail!("expected string value, got {other:?}"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(Some(v)) => Ok(*v),
            other => bail!("expected binary value, got {other:?}"),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::ChronoDateTimeUtc(Some(v)) => Ok(*v),
            Value::ChronoDateTime(Some(v)) => Ok(Self::from_naive_utc_and_offset(*v, Utc)),
            other => bail!("expected timestamp value, got {other:?}"),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::ChronoDate(Some(v)) => Ok(*v),
            other => bail!("expected date value, got {other:?}"),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(Some(v)) => Ok(*v),
            Value::String(Some(raw)) => Ok(serde_json::from_str(&raw)?),
            Value::Bytes(Some(raw)) => Ok(serde_json::from_slice(&raw)?),
            other => bail!("expected json value, got {other:?}"),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        if is_null(&value) {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

fn is_null(value: &Value) -> bool {
    match value {
        Value::Bool(v) => v.is_none(),
        Value::TinyInt(v) => v.is_none(),
        Value::SmallInt(v) => v.is_none(),
        Value::Int(v) => v.is_none(),
        Value::BigInt(v) => v.is_none(),
        Value::TinyUnsigned(v) => v.is_none(),
        Value::SmallUnsigned(v) => v.is_none(),
        Value::Unsigned(v) => v.is_none(),
        Value::BigUnsigned(v) => v.is_none(),
        Value::Float(v) => v.is_none(),
        Value::Double(v) => v.is_none(),
        Value::Char(v) => v.is_none(),
        Value::String(v) => v.is_none(),
        Value::Bytes(v) => v.is_none(),
        Value::Json(v) => v.is_none(),
        Value::ChronoDate(v) => v.is_none(),
        Value::ChronoTime(v) => v.is_none(),
        Value::ChronoDateTime(v) => v.is_none(),
        Value::ChronoDateTimeUtc(v) => v.is_none(),
        Value::ChronoDateTimeLocal(v) => v.is_none(),
        Value::ChronoDateTimeWithTimeZone(v) => v.is_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_conversions() {
        assert!(bool::from_value(Value::Bool(Some(true))).unwrap());
        assert_eq!(i64::from_value(Value::BigInt(Some(7))).unwrap(), 7);
        assert_eq!(i64::from_value(Value::Int(Some(7))).unwrap(), 7);
        assert_eq!(String::from_value(Value::from("abc")).unwrap(), "abc");
        assert_eq!(Vec::<u8>::from_value(Value::from(vec![1_u8, 2])).unwrap(), vec![1, 2]);
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        i64::from_value(Value::from("not a number")).unwrap_err();
        String::from_value(Value::BigInt(Some(1))).unwrap_err();
        bool::from_value(Value::Int(Some(1))).unwrap_err();
    }

    #[test]
    fn null_maps_to_none() {
        assert_eq!(Option::<i64>::from_value(Value::BigInt(None)).unwrap(), None);
        assert_eq!(Option::<String>::from_value(Value::String(None)).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(Value::BigInt(Some(3))).unwrap(), Some(3));
    }

    #[test]
    fn json_from_string_and_bytes() {
        let from_str = serde_json::Value::from_value(Value::from(r#"{"k":1}"#)).unwrap();
        assert_eq!(from_str["k"], 1);

        let from_bytes = serde_json::Value::from_value(Value::from(br#"{"k":2}"#.to_vec())).unwrap();
        assert_eq!(from_bytes["k"], 2);

        serde_json::Value::from_value(Value::from("not json")).unwrap_err();
    }
}
