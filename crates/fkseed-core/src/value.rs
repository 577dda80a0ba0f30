use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::schema::DeclaredType;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_PARSE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A typed value for a single column, either supplied by a rule, inherited
/// from a parent row or freshly generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl SeedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SeedValue::Null)
    }

    /// Convert a JSON literal (as found in seed files) into a value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Null => Ok(SeedValue::Null),
            serde_json::Value::Bool(value) => Ok(SeedValue::Bool(*value)),
            serde_json::Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Ok(SeedValue::Int(value))
                } else if number.is_u64() {
                    Err(format!("integer {number} exceeds the signed 64-bit range"))
                } else {
                    number
                        .as_f64()
                        .map(SeedValue::Float)
                        .ok_or_else(|| format!("unsupported number {number}"))
                }
            }
            serde_json::Value::String(value) => Ok(SeedValue::Text(value.clone())),
            other => Err(format!("expected a scalar literal, found {other}")),
        }
    }

    /// Text rendering handed to the database driver; `None` means SQL NULL.
    pub fn to_sql_text(&self) -> Option<String> {
        match self {
            SeedValue::Null => None,
            SeedValue::Bool(value) => Some(value.to_string()),
            SeedValue::Int(value) => Some(value.to_string()),
            SeedValue::Float(value) => Some(value.to_string()),
            SeedValue::Text(value) => Some(value.clone()),
            SeedValue::Uuid(value) => Some(value.hyphenated().to_string()),
            SeedValue::Date(value) => Some(value.format("%Y-%m-%d").to_string()),
            SeedValue::Timestamp(value) => Some(value.format(TIMESTAMP_FORMAT).to_string()),
            SeedValue::TimestampTz(value) => {
                Some(format!("{}+00", value.format(TIMESTAMP_FORMAT)))
            }
        }
    }

    /// Convert this value to the shape expected by a column of `declared`
    /// type, rejecting values the column could never hold.
    pub fn assign(&self, declared: &DeclaredType) -> Result<SeedValue, String> {
        if self.is_null() {
            return Ok(SeedValue::Null);
        }

        match declared {
            DeclaredType::SmallInt => self.to_int(i16::MIN as i64, i16::MAX as i64),
            DeclaredType::Integer => self.to_int(i32::MIN as i64, i32::MAX as i64),
            DeclaredType::BigInt => self.to_int(i64::MIN, i64::MAX),
            DeclaredType::Numeric { .. } | DeclaredType::Float => self.to_float(),
            DeclaredType::Text { max_len } => {
                let text = self.to_sql_text().unwrap_or_default();
                if let Some(max_len) = max_len {
                    let len = text.chars().count();
                    if len > *max_len {
                        return Err(format!("text of length {len} exceeds limit {max_len}"));
                    }
                }
                Ok(SeedValue::Text(text))
            }
            DeclaredType::Boolean => self.to_bool(),
            DeclaredType::Date => match self {
                SeedValue::Date(value) => Ok(SeedValue::Date(*value)),
                SeedValue::Text(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                    .map(SeedValue::Date)
                    .map_err(|err| format!("'{text}' is not a date: {err}")),
                other => Err(format!("cannot use {other} as a date")),
            },
            DeclaredType::Timestamp | DeclaredType::TimestampNoTz => {
                self.to_naive_timestamp().map(SeedValue::Timestamp)
            }
            DeclaredType::TimestampTz => match self {
                SeedValue::TimestampTz(value) => Ok(SeedValue::TimestampTz(*value)),
                SeedValue::Text(text) => match DateTime::parse_from_rfc3339(text.trim()) {
                    Ok(value) => Ok(SeedValue::TimestampTz(value.with_timezone(&Utc))),
                    Err(_) => self
                        .to_naive_timestamp()
                        .map(|value| SeedValue::TimestampTz(value.and_utc())),
                },
                _ => self
                    .to_naive_timestamp()
                    .map(|value| SeedValue::TimestampTz(value.and_utc())),
            },
            DeclaredType::Uuid => match self {
                SeedValue::Uuid(value) => Ok(SeedValue::Uuid(*value)),
                SeedValue::Text(text) => Uuid::parse_str(text.trim())
                    .map(SeedValue::Uuid)
                    .map_err(|err| format!("'{text}' is not a uuid: {err}")),
                other => Err(format!("cannot use {other} as a uuid")),
            },
            DeclaredType::Other(_) => Ok(self.clone()),
        }
    }

    fn to_int(&self, min: i64, max: i64) -> Result<SeedValue, String> {
        let value = match self {
            SeedValue::Int(value) => *value,
            SeedValue::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                if *value < i64::MIN as f64 || *value >= i64::MAX as f64 {
                    return Err(format!("{value} is out of range"));
                }
                *value as i64
            }
            SeedValue::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|err| format!("'{text}' is not an integer: {err}"))?,
            other => return Err(format!("cannot use {other} as an integer")),
        };

        if value < min || value > max {
            return Err(format!("{value} is outside [{min}, {max}]"));
        }
        Ok(SeedValue::Int(value))
    }

    fn to_float(&self) -> Result<SeedValue, String> {
        let value = match self {
            SeedValue::Int(value) => *value as f64,
            SeedValue::Float(value) => *value,
            SeedValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|err| format!("'{text}' is not a number: {err}"))?,
            other => return Err(format!("cannot use {other} as a number")),
        };
        if !value.is_finite() {
            return Err(format!("{value} is not a finite number"));
        }
        Ok(SeedValue::Float(value))
    }

    fn to_bool(&self) -> Result<SeedValue, String> {
        match self {
            SeedValue::Bool(value) => Ok(SeedValue::Bool(*value)),
            SeedValue::Int(0) => Ok(SeedValue::Bool(false)),
            SeedValue::Int(1) => Ok(SeedValue::Bool(true)),
            SeedValue::Text(text) => match text.trim().to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "on" | "1" => Ok(SeedValue::Bool(true)),
                "false" | "f" | "no" | "n" | "off" | "0" => Ok(SeedValue::Bool(false)),
                _ => Err(format!("'{text}' is not a boolean")),
            },
            other => Err(format!("cannot use {other} as a boolean")),
        }
    }

    fn to_naive_timestamp(&self) -> Result<NaiveDateTime, String> {
        match self {
            SeedValue::Timestamp(value) => Ok(*value),
            SeedValue::TimestampTz(value) => Ok(value.naive_utc()),
            SeedValue::Date(value) => value
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| format!("cannot extend {value} to a timestamp")),
            SeedValue::Text(text) => {
                let trimmed = text.trim();
                TIMESTAMP_PARSE_FORMATS
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                    .ok_or_else(|| format!("'{text}' is not a timestamp"))
            }
            other => Err(format!("cannot use {other} as a timestamp")),
        }
    }
}

impl fmt::Display for SeedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_sql_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

impl From<&str> for SeedValue {
    fn from(value: &str) -> Self {
        SeedValue::Text(value.to_string())
    }
}

impl From<String> for SeedValue {
    fn from(value: String) -> Self {
        SeedValue::Text(value)
    }
}

impl From<i64> for SeedValue {
    fn from(value: i64) -> Self {
        SeedValue::Int(value)
    }
}

impl From<f64> for SeedValue {
    fn from(value: f64) -> Self {
        SeedValue::Float(value)
    }
}

impl From<bool> for SeedValue {
    fn from(value: bool) -> Self {
        SeedValue::Bool(value)
    }
}

impl From<Uuid> for SeedValue {
    fn from(value: Uuid) -> Self {
        SeedValue::Uuid(value)
    }
}
