use std::error::Error;

use bytes::BytesMut;
use chrono::{TimeZone, Utc};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use super::numeric;
use crate::types::SqlValue;

/// Borrowed Postgres parameters, in placeholder order.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    #[must_use]
    pub fn convert(params: &'a [SqlValue]) -> Params<'a> {
        let mut references = Vec::with_capacity(params.len());
        for p in params {
            references.push(p as &(dyn ToSql + Sync));
        }
        Params { references }
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

fn kind(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null => "null",
        SqlValue::Bool(_) => "boolean",
        SqlValue::Int(_) => "integer",
        SqlValue::Float(_) => "float",
        SqlValue::Text(_) => "text",
        SqlValue::Decimal(_) => "decimal",
        SqlValue::Date(_) => "date",
        SqlValue::Timestamp(_) => "timestamp",
        SqlValue::Json(_) => "json",
        SqlValue::Blob(_) => "blob",
    }
}

fn mismatch(value: &SqlValue, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot bind a {} parameter to Postgres type `{ty}`", kind(value)).into()
}

fn is_text_type(ty: &Type) -> bool {
    <String as ToSql>::accepts(ty)
}

// The server trusts the binary encoding to match the parameter type, so each
// value is only written in a form that type decodes to the same value.
impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(b) if *ty == Type::BOOL => b.to_sql(ty, out),
            SqlValue::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => i.to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::NUMERIC => {
                    numeric::encode(&i.to_string(), out)?;
                    Ok(IsNull::No)
                }
                _ => Err(mismatch(self, ty)),
            },
            SqlValue::Float(f) => match *ty {
                #[allow(clippy::cast_possible_truncation)]
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                Type::NUMERIC => {
                    let text = match (f.is_infinite(), f.is_sign_positive()) {
                        (true, true) => "Infinity".to_owned(),
                        (true, false) => "-Infinity".to_owned(),
                        (false, _) => f.to_string(),
                    };
                    numeric::encode(&text, out)?;
                    Ok(IsNull::No)
                }
                _ => Err(mismatch(self, ty)),
            },
            SqlValue::Text(s) | SqlValue::Decimal(s) if *ty == Type::NUMERIC => {
                numeric::encode(s, out)?;
                Ok(IsNull::No)
            }
            SqlValue::Text(s) | SqlValue::Decimal(s) if is_text_type(ty) => s.to_sql(ty, out),
            SqlValue::Date(d) if *ty == Type::DATE => d.to_sql(ty, out),
            SqlValue::Timestamp(dt) if *ty == Type::TIMESTAMP => dt.to_sql(ty, out),
            SqlValue::Timestamp(dt) if *ty == Type::TIMESTAMPTZ => {
                Utc.from_utc_datetime(dt).to_sql(ty, out)
            }
            SqlValue::Json(json) if matches!(*ty, Type::JSON | Type::JSONB) => json.to_sql(ty, out),
            SqlValue::Blob(bytes) if *ty == Type::BYTEA => bytes.to_sql(ty, out),
            _ => Err(mismatch(self, ty)),
        }
    }

    fn accepts(ty: &Type) -> bool {
        is_text_type(ty)
            || matches!(
                *ty,
                Type::INT2
                    | Type::INT4
                    | Type::INT8
                    | Type::FLOAT4
                    | Type::FLOAT8
                    | Type::NUMERIC
                    | Type::BOOL
                    | Type::DATE
                    | Type::TIMESTAMP
                    | Type::TIMESTAMPTZ
                    | Type::JSON
                    | Type::JSONB
                    | Type::BYTEA
            )
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate};
    use tokio_postgres::types::FromSql;

    use super::*;
    use crate::postgres::numeric::NumericText;

    fn bind(value: &SqlValue, ty: &Type) -> Result<BytesMut, Box<dyn Error + Sync + Send>> {
        let mut buf = BytesMut::new();
        value.to_sql_checked(ty, &mut buf)?;
        Ok(buf)
    }

    #[test]
    fn int_widens_into_float_columns() {
        let buf = bind(&SqlValue::Int(100), &Type::FLOAT8).unwrap();
        assert_eq!(f64::from_sql(&Type::FLOAT8, &buf).unwrap(), 100.0);

        let buf = bind(&SqlValue::Int(-3), &Type::FLOAT4).unwrap();
        assert_eq!(f32::from_sql(&Type::FLOAT4, &buf).unwrap(), -3.0);
    }

    #[test]
    fn int_narrows_to_column_width() {
        let buf = bind(&SqlValue::Int(7), &Type::INT2).unwrap();
        assert_eq!(i16::from_sql(&Type::INT2, &buf).unwrap(), 7);
        let buf = bind(&SqlValue::Int(70_000), &Type::INT4).unwrap();
        assert_eq!(i32::from_sql(&Type::INT4, &buf).unwrap(), 70_000);
        let buf = bind(&SqlValue::Int(i64::MAX), &Type::INT8).unwrap();
        assert_eq!(i64::from_sql(&Type::INT8, &buf).unwrap(), i64::MAX);

        assert!(bind(&SqlValue::Int(70_000), &Type::INT2).is_err());
    }

    #[test]
    fn float_into_integer_column_is_rejected() {
        for ty in [Type::INT2, Type::INT4, Type::INT8] {
            assert!(bind(&SqlValue::Float(2.5), &ty).is_err(), "{ty}");
        }
        let buf = bind(&SqlValue::Float(2.5), &Type::FLOAT4).unwrap();
        assert_eq!(f32::from_sql(&Type::FLOAT4, &buf).unwrap(), 2.5);
    }

    #[test]
    fn mismatched_kinds_are_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let cases = [
            (SqlValue::Text("12".into()), Type::INT4),
            (SqlValue::Bool(true), Type::INT8),
            (SqlValue::Int(1), Type::BOOL),
            (SqlValue::Int(1), Type::TEXT),
            (SqlValue::Date(date), Type::TIMESTAMP),
            (SqlValue::Json(serde_json::json!({"a": 1})), Type::TEXT),
            (SqlValue::Blob(vec![1, 2]), Type::TEXT),
            (SqlValue::Text("not a number".into()), Type::NUMERIC),
        ];
        for (value, ty) in cases {
            let err = bind(&value, &ty).unwrap_err();
            assert!(err.to_string().contains(ty.name()) || ty == Type::NUMERIC, "{err}");
        }
    }

    #[test]
    fn exact_values_into_numeric_columns() {
        let decoded = |value: SqlValue| {
            let buf = bind(&value, &Type::NUMERIC).unwrap();
            NumericText::from_sql(&Type::NUMERIC, &buf).unwrap().0
        };
        assert_eq!(decoded(SqlValue::Decimal("-1234.5600".into())), "-1234.5600");
        assert_eq!(decoded(SqlValue::Text("0.25".into())), "0.25");
        assert_eq!(decoded(SqlValue::Int(42)), "42");
        assert_eq!(decoded(SqlValue::Float(2.5)), "2.5");
    }

    #[test]
    fn timestamp_binds_to_timestamptz_as_utc() {
        let ts = NaiveDate::from_ymd_opt(2023, 7, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let buf = bind(&SqlValue::Timestamp(ts), &Type::TIMESTAMPTZ).unwrap();
        let back = DateTime::<Utc>::from_sql(&Type::TIMESTAMPTZ, &buf).unwrap();
        assert_eq!(back.naive_utc(), ts);
    }

    #[test]
    fn text_and_null_bind_to_their_columns() {
        let buf = bind(&SqlValue::Text("Ada".into()), &Type::VARCHAR).unwrap();
        assert_eq!(String::from_sql(&Type::VARCHAR, &buf).unwrap(), "Ada");

        let mut buf = BytesMut::new();
        assert!(matches!(
            SqlValue::Null.to_sql_checked(&Type::INT4, &mut buf),
            Ok(IsNull::Yes)
        ));
    }
}
