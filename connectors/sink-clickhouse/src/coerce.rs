//! Column type coercion for Coinbase feed messages.
//!
//! The feed sends most numbers as strings (`"price": "101496.91"`) and
//! timestamps in RFC 3339. ClickHouse's `JSONEachRow` input accepts numbers
//! for numeric columns and `YYYY-MM-DD hh:mm:ss[.ffffff]` for `DateTime64`,
//! so known fields are rewritten before the insert.

use chrono::{DateTime, NaiveDateTime, Utc};
use relay_connect_core::{ConnectorError, ConnectorResult};
use serde_json::{Map, Number, Value};

/// Target column type of a known field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Timestamp,
    Text,
}

/// Fields with a known column type. Anything else passes through unchanged.
pub const FIELD_KINDS: &[(&str, FieldKind)] = &[
    ("sequence", FieldKind::Integer),
    ("trade_id", FieldKind::Integer),
    ("price", FieldKind::Float),
    ("last_size", FieldKind::Float),
    ("time", FieldKind::Timestamp),
    ("product_id", FieldKind::Text),
    ("side", FieldKind::Text),
    ("open_24h", FieldKind::Float),
    ("volume_24h", FieldKind::Float),
    ("low_24h", FieldKind::Float),
    ("high_24h", FieldKind::Float),
    ("volume_30d", FieldKind::Float),
    ("best_bid", FieldKind::Float),
    ("best_bid_size", FieldKind::Float),
    ("best_ask", FieldKind::Float),
    ("best_ask_size", FieldKind::Float),
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn kind_of(field: &str) -> Option<FieldKind> {
    FIELD_KINDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, kind)| *kind)
}

/// Coerce every known field of `row` in place
///
/// Fails with `InvalidData` naming the first field that cannot be converted.
pub fn coerce_row(row: &mut Map<String, Value>) -> ConnectorResult<()> {
    for (field, value) in row.iter_mut() {
        let Some(kind) = kind_of(field) else {
            continue;
        };
        let coerced = coerce_value(kind, value).ok_or_else(|| {
            ConnectorError::invalid_data(
                format!("Field '{}' cannot be converted to {:?}", field, kind),
                value.to_string(),
            )
        })?;
        *value = coerced;
    }
    Ok(())
}

fn coerce_value(kind: FieldKind, value: &Value) -> Option<Value> {
    match kind {
        FieldKind::Integer => to_integer(value).map(Value::from),
        FieldKind::Float => to_float(value)
            .and_then(Number::from_f64)
            .map(Value::Number),
        FieldKind::Timestamp => value
            .as_str()
            .and_then(parse_timestamp)
            .map(|ts| Value::String(ts.format(TIMESTAMP_FORMAT).to_string())),
        FieldKind::Text => Some(match value {
            Value::String(_) => value.clone(),
            other => Value::String(other.to_string()),
        }),
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// RFC 3339 with an offset, or a naive ISO timestamp taken as UTC
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_ticker_fields() {
        let mut ticker = row(json!({
            "sequence": 98545870695u64,
            "product_id": "BTC-USD",
            "price": "101496.91",
            "open_24h": "93394.63",
            "volume_24h": "27200.49989262",
            "low_24h": "91178.01",
            "high_24h": "102599.85",
            "volume_30d": "390095.33178020",
            "best_bid": "101496.91",
            "best_bid_size": "0.00011127",
            "best_ask": "101496.92",
            "best_ask_size": "0.01060955",
            "side": "sell",
            "time": "2025-02-04T02:00:06.419368Z",
            "trade_id": 774546408,
            "last_size": "0.00001635",
        }));

        coerce_row(&mut ticker).unwrap();

        assert_eq!(ticker["sequence"], json!(98545870695i64));
        assert_eq!(ticker["trade_id"], json!(774546408));
        assert_eq!(ticker["price"], json!(101496.91));
        assert_eq!(ticker["best_ask_size"], json!(0.01060955));
        assert_eq!(ticker["last_size"], json!(0.00001635));
        assert_eq!(ticker["product_id"], json!("BTC-USD"));
        assert_eq!(ticker["side"], json!("sell"));
        assert_eq!(ticker["time"], json!("2025-02-04 02:00:06.419368"));
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let mut data = row(json!({"channel": "ticker", "extra": {"nested": true}}));
        let before = data.clone();
        coerce_row(&mut data).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn test_integer_from_string() {
        let mut data = row(json!({"sequence": "42", "trade_id": 7.0}));
        coerce_row(&mut data).unwrap();
        assert_eq!(data["sequence"], json!(42));
        assert_eq!(data["trade_id"], json!(7));
    }

    #[test]
    fn test_offset_timestamp_converted_to_utc() {
        let mut data = row(json!({"time": "2025-02-04T04:00:06.5+02:00"}));
        coerce_row(&mut data).unwrap();
        assert_eq!(data["time"], json!("2025-02-04 02:00:06.500000"));

        let mut naive = row(json!({"time": "2025-02-04T02:00:06"}));
        coerce_row(&mut naive).unwrap();
        assert_eq!(naive["time"], json!("2025-02-04 02:00:06.000000"));
    }

    #[test]
    fn test_invalid_field_is_named() {
        let mut data = row(json!({"price": "not-a-number"}));
        let err = coerce_row(&mut data).unwrap_err();
        assert!(err.to_string().contains("price"), "{}", err);
        assert!(err.is_stream_failure());

        let mut data = row(json!({"sequence": "1.5"}));
        assert!(coerce_row(&mut data).is_err());

        let mut data = row(json!({"time": "yesterday"}));
        assert!(coerce_row(&mut data).unwrap_err().to_string().contains("time"));
    }

    #[test]
    fn test_text_fields_stringified() {
        let mut data = row(json!({"side": 1}));
        coerce_row(&mut data).unwrap();
        assert_eq!(data["side"], json!("1"));
    }
}
