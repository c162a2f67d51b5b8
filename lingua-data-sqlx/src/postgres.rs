//! PostgreSQL backend.

use lingua_data::{DataError, Dialect, Record, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};

use crate::error::SqlxErrorExt;

pub type PgStorage = crate::storage::SqlxStorage<Postgres>;
pub type PgSession = crate::storage::SqlxSession<Postgres>;

/// `NULL` is bound as text; untyped nulls are only written to translation fields.
fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::Real(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
    }
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Result<T, DataError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<T, _>(idx).map_err(SqlxErrorExt::into_data_error)
}

fn decode_row(row: &PgRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx).map_err(SqlxErrorExt::into_data_error)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match column.type_info().name() {
                "BOOL" => Value::Bool(get::<bool>(row, idx)?),
                "INT2" => Value::Integer(get::<i16>(row, idx)?.into()),
                "INT4" => Value::Integer(get::<i32>(row, idx)?.into()),
                "INT8" => Value::Integer(get::<i64>(row, idx)?),
                "FLOAT4" => Value::Real(get::<f32>(row, idx)?.into()),
                "FLOAT8" => Value::Real(get::<f64>(row, idx)?),
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Value::Text(get::<String>(row, idx)?),
                _ => return Err(DataError::decode(column.name(), "bool, integer, float or text")),
            }
        };
        record.insert(column.name(), value);
    }
    Ok(record)
}

crate::storage::impl_backend!(Postgres, Dialect::Postgres);
