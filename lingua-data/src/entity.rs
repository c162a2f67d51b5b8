use crate::error::DataError;
use crate::naming;
use crate::value::{Record, Value};

/// Trait representing a primary database entity.
///
/// Keys are auto-increment `i64` surrogate keys; `id()` is `None` until the
/// entity has been inserted.
///
/// [`Value`] carries no SQL type for `NULL`. On PostgreSQL an untyped `NULL`
/// is bound as `text`, so [`Entity::values`] may only return [`Value::Null`]
/// for text columns there; a nullable column of another type needs a
/// non-null default or its own statement.
///
/// # Example
///
/// ```ignore
/// impl Entity for Post {
///     fn type_name() -> &'static str { "Post" }
///     fn table_name() -> &'static str { "posts" }
///     fn columns() -> &'static [&'static str] { &["published"] }
///     fn id(&self) -> Option<i64> { self.id }
///     fn set_id(&mut self, id: Option<i64>) { self.id = id }
///     fn values(&self) -> Vec<Value> { vec![self.published.into()] }
///     fn from_record(record: &Record) -> Result<Self, DataError> { ... }
/// }
/// ```
pub trait Entity: Send + Sync + Sized + 'static {
    /// Type name the naming conventions derive from (`Post`).
    fn type_name() -> &'static str;
    fn table_name() -> &'static str;
    fn id_column() -> &'static str {
        "id"
    }
    /// Non-key columns, in the order [`Entity::values`] returns them.
    fn columns() -> &'static [&'static str];
    fn id(&self) -> Option<i64>;
    /// Assign the key after an insert; `None` when a failed save is undone.
    fn set_id(&mut self, id: Option<i64>);
    fn values(&self) -> Vec<Value>;
    fn from_record(record: &Record) -> Result<Self, DataError>;
}

/// An entity whose translatable fields live in a per-locale translation table.
pub trait Translatable: Entity {
    /// Field names stored in the translation table rather than the primary table.
    fn translatable_fields() -> &'static [&'static str];

    fn translation_table() -> String {
        naming::translation_table(Self::type_name())
    }

    /// Column of the translation table referencing the primary key.
    fn translation_foreign_key() -> String {
        naming::translation_foreign_key(Self::type_name(), Self::id_column())
    }
}

/// Read a required integer column.
pub fn require_i64(record: &Record, column: &str) -> Result<i64, DataError> {
    record
        .get(column)
        .and_then(Value::as_i64)
        .ok_or_else(|| DataError::decode(column, "integer"))
}

/// Read a required boolean column.
pub fn require_bool(record: &Record, column: &str) -> Result<bool, DataError> {
    record
        .get(column)
        .and_then(Value::as_bool)
        .ok_or_else(|| DataError::decode(column, "bool"))
}

/// Read a required text column.
pub fn require_text(record: &Record, column: &str) -> Result<String, DataError> {
    record
        .get(column)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DataError::decode(column, "text"))
}
