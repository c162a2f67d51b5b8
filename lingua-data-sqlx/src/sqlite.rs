//! SQLite backend.

use lingua_data::{DataError, Dialect, Record, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use crate::error::SqlxErrorExt;

pub type SqliteStorage = crate::storage::SqlxStorage<Sqlite>;
pub type SqliteSession = crate::storage::SqlxSession<Sqlite>;

fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::Real(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
    }
}

/// SQLite values carry their storage class, so columns are decoded by the
/// class of each value rather than the declared column type.
fn decode_row(row: &SqliteRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx).map_err(SqlxErrorExt::into_data_error)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::Integer(
                    row.try_get::<i64, _>(idx)
                        .map_err(SqlxErrorExt::into_data_error)?,
                ),
                "REAL" => Value::Real(
                    row.try_get::<f64, _>(idx)
                        .map_err(SqlxErrorExt::into_data_error)?,
                ),
                "TEXT" => Value::Text(
                    row.try_get::<String, _>(idx)
                        .map_err(SqlxErrorExt::into_data_error)?,
                ),
                _ => return Err(DataError::decode(column.name(), "integer, real or text")),
            }
        };
        record.insert(column.name(), value);
    }
    Ok(record)
}

crate::storage::impl_backend!(Sqlite, Dialect::Sqlite);
