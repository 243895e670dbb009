//! PostgreSQL binding through `tokio-postgres`.
//!
//! - [`Value`] implements [`ToSql`], narrowing integers and floats to the
//!   parameter type the server inferred and rejecting types a variant cannot
//!   represent.
//! - [`Connection`] is implemented for `tokio_postgres::Client` and
//!   `tokio_postgres::Transaction`.
//! - Result columns are decoded into [`Value`] by their Postgres type.

use crate::connection::{Connection, RawRow};
use crate::error::{RelqError, RelqResult};
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    /// Every variant checks `ty` itself; a value the parameter type cannot
    /// hold is an error, never a reinterpretation of its bytes.
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) if <bool as ToSql>::accepts(ty) => v.to_sql(ty, out),
            Value::Int(v) => {
                if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT8 {
                    v.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*v as f64).to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    v.to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            Value::Text(v) => {
                if *ty == Type::UUID {
                    Uuid::parse_str(v)?.to_sql(ty, out)
                } else if *ty == Type::DATE {
                    NaiveDate::parse_from_str(v, "%Y-%m-%d")?.to_sql(ty, out)
                } else if <&str as ToSql>::accepts(ty) {
                    v.as_str().to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            Value::Bytes(v) if <Vec<u8> as ToSql>::accepts(ty) => v.to_sql(ty, out),
            Value::Date(v) if <NaiveDate as ToSql>::accepts(ty) => v.to_sql(ty, out),
            Value::DateTime(v) => {
                if *ty == Type::TIMESTAMPTZ {
                    DateTime::<Utc>::from_naive_utc_and_offset(*v, Utc).to_sql(ty, out)
                } else if <NaiveDateTime as ToSql>::accepts(ty) {
                    v.to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            Value::Uuid(v) if <Uuid as ToSql>::accepts(ty) => v.to_sql(ty, out),
            Value::Json(v) if <serde_json::Value as ToSql>::accepts(ty) => v.to_sql(ty, out),
            // Elements are checked against the member type by the same rules.
            Value::Array(items) if matches!(ty.kind(), Kind::Array(_)) => items.to_sql(ty, out),
            _ => Err(mismatch(self, ty)),
        }
    }

    /// `Null` binds to any parameter type, so the check lives in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot bind a {} value to a {ty} parameter", value.type_name()).into()
}

fn params(bound: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    bound.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// Decode every column of `row` into a [`RawRow`].
pub fn decode_row(row: &Row) -> RelqResult<RawRow> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = decode_cell(row, idx, column.type_())
                .map_err(|e| RelqError::decode(column.name(), e.to_string()))?;
            Ok((column.name().to_string(), value))
        })
        .collect()
}

fn decode_cell(row: &Row, idx: usize, ty: &Type) -> Result<Value, BoxError> {
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.map(Value::from)
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.map(Value::from)
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.map(Value::Int)
    } else if *ty == Type::OID {
        row.try_get::<_, Option<u32>>(idx)?.map(Value::from)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?.map(Value::from)
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?.map(Value::Float)
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes)
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<NaiveDate>>(idx)?.map(Value::Date)
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)?.map(Value::DateTime)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(idx)?.map(Value::from)
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<Uuid>>(idx)?.map(Value::Uuid)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(idx)?.map(Value::Json)
    } else if *ty == Type::INT4_ARRAY {
        row.try_get::<_, Option<Vec<Option<i32>>>>(idx)?.map(Value::array)
    } else if *ty == Type::INT8_ARRAY {
        row.try_get::<_, Option<Vec<Option<i64>>>>(idx)?.map(Value::array)
    } else if *ty == Type::TEXT_ARRAY || *ty == Type::VARCHAR_ARRAY {
        row.try_get::<_, Option<Vec<Option<String>>>>(idx)?.map(Value::array)
    } else if *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
        || *ty == Type::UNKNOWN
    {
        row.try_get::<_, Option<String>>(idx)?.map(Value::Text)
    } else {
        return Err(format!("unsupported column type {ty}").into());
    };
    Ok(value.unwrap_or(Value::Null))
}

impl Connection for tokio_postgres::Client {
    async fn send(&self, sql: &str, bound: &[Value]) -> RelqResult<Vec<RawRow>> {
        let rows = tokio_postgres::Client::query(self, sql, &params(bound))
            .await
            .map_err(RelqError::from_db_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, bound: &[Value]) -> RelqResult<u64> {
        tokio_postgres::Client::execute(self, sql, &params(bound))
            .await
            .map_err(RelqError::from_db_error)
    }
}

impl Connection for tokio_postgres::Transaction<'_> {
    async fn send(&self, sql: &str, bound: &[Value]) -> RelqResult<Vec<RawRow>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &params(bound))
            .await
            .map_err(RelqError::from_db_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, bound: &[Value]) -> RelqResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, &params(bound))
            .await
            .map_err(RelqError::from_db_error)
    }
}
