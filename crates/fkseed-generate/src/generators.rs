use chrono::{Duration, NaiveDateTime};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fkseed_core::{DeclaredType, SeedValue};

const TEXT_LEN: usize = 10;
const FLOAT_MIN: f64 = 0.0;
const FLOAT_MAX: f64 = 10000.0;
const PAST_SECONDS: i64 = 365 * 24 * 60 * 60;
const RECENT_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Seeded value source for a single table.
#[derive(Debug, Clone)]
pub struct ValueGenerator {
    rng: ChaCha8Rng,
    now: NaiveDateTime,
}

impl ValueGenerator {
    /// Generator whose stream depends only on `seed` and `table`.
    pub fn for_table(seed: u64, table: &str, now: NaiveDateTime) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(hash_seed(seed, table)),
            now,
        }
    }

    pub fn generate(&mut self, declared: &DeclaredType) -> SeedValue {
        generate_value(declared, self.now, &mut self.rng)
    }
}

pub(crate) fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Generate one value for a column of `declared` type. Temporal values are
/// placed before `now`.
pub fn generate_value(declared: &DeclaredType, now: NaiveDateTime, rng: &mut impl Rng) -> SeedValue {
    match declared {
        DeclaredType::SmallInt => {
            SeedValue::Int(rng.random_range(i16::MIN as i64..=i16::MAX as i64))
        }
        DeclaredType::Integer => {
            SeedValue::Int(rng.random_range(i32::MIN as i64..=i32::MAX as i64))
        }
        DeclaredType::BigInt => SeedValue::Int(rng.random::<i64>()),
        DeclaredType::Numeric { precision, scale } => {
            let max = numeric_max(*precision, *scale);
            let value = rng.random_range(FLOAT_MIN..=max);
            match scale {
                Some(scale) => {
                    let factor = 10_f64.powi(*scale as i32);
                    SeedValue::Float((value * factor).round() / factor)
                }
                None => SeedValue::Float(value),
            }
        }
        DeclaredType::Float => SeedValue::Float(rng.random_range(FLOAT_MIN..=FLOAT_MAX)),
        DeclaredType::Text { max_len } => {
            let len = max_len.map_or(TEXT_LEN, |max_len| max_len.min(TEXT_LEN));
            SeedValue::Text(alphanumeric(len, rng))
        }
        DeclaredType::Boolean => SeedValue::Bool(rng.random_bool(0.5)),
        DeclaredType::Date => SeedValue::Date(past(now, PAST_SECONDS, rng).date()),
        DeclaredType::Timestamp => SeedValue::Timestamp(past(now, PAST_SECONDS, rng)),
        DeclaredType::TimestampNoTz => SeedValue::Timestamp(past(now, RECENT_SECONDS, rng)),
        DeclaredType::TimestampTz => SeedValue::TimestampTz(past(now, PAST_SECONDS, rng).and_utc()),
        DeclaredType::Uuid => {
            let bytes: [u8; 16] = rng.random();
            SeedValue::Uuid(uuid::Builder::from_random_bytes(bytes).into_uuid())
        }
        DeclaredType::Other(_) => SeedValue::Text(alphanumeric(TEXT_LEN, rng)),
    }
}

/// Largest value a `numeric(precision, scale)` column holds, capped at the
/// generator's upper bound.
fn numeric_max(precision: Option<u32>, scale: Option<u32>) -> f64 {
    let Some(precision) = precision else {
        return FLOAT_MAX;
    };
    let scale = scale.unwrap_or(0).min(precision);
    let step = 10_f64.powi(-(scale as i32));
    let limit = 10_f64.powi((precision - scale) as i32) - step;
    limit.clamp(FLOAT_MIN, FLOAT_MAX)
}

fn alphanumeric(len: usize, rng: &mut impl Rng) -> String {
    let mut value = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.random_range(0..DEFAULT_CHARSET.len());
        value.push(DEFAULT_CHARSET[idx] as char);
    }
    value
}

fn past(now: NaiveDateTime, window_seconds: i64, rng: &mut impl Rng) -> NaiveDateTime {
    now - Duration::seconds(rng.random_range(1..=window_seconds))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid timestamp")
    }

    fn sample(declared: &DeclaredType, count: usize) -> Vec<SeedValue> {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        (0..count)
            .map(|_| generate_value(declared, now(), &mut rng))
            .collect()
    }

    #[test]
    fn integers_respect_type_ranges() {
        for value in sample(&DeclaredType::SmallInt, 500) {
            let SeedValue::Int(value) = value else {
                panic!("expected int, got {value:?}");
            };
            assert!((-32768..=32767).contains(&value));
        }
        for value in sample(&DeclaredType::Integer, 500) {
            let SeedValue::Int(value) = value else {
                panic!("expected int, got {value:?}");
            };
            assert!((i32::MIN as i64..=i32::MAX as i64).contains(&value));
        }
    }

    #[test]
    fn numeric_is_bounded_and_rounded_to_scale() {
        let declared = DeclaredType::Numeric {
            precision: Some(10),
            scale: Some(2),
        };
        for value in sample(&declared, 200) {
            let SeedValue::Float(value) = value else {
                panic!("expected float, got {value:?}");
            };
            assert!((0.0..=10000.0).contains(&value));
            assert!(((value * 100.0).round() - value * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn numeric_respects_declared_precision() {
        let declared = DeclaredType::Numeric {
            precision: Some(5),
            scale: Some(2),
        };
        for value in sample(&declared, 500) {
            let SeedValue::Float(value) = value else {
                panic!("expected float, got {value:?}");
            };
            assert!((0.0..=999.99).contains(&value), "{value} overflows numeric(5,2)");
        }

        let declared = DeclaredType::Numeric {
            precision: Some(2),
            scale: Some(2),
        };
        for value in sample(&declared, 200) {
            let SeedValue::Float(value) = value else {
                panic!("expected float, got {value:?}");
            };
            assert!(value < 1.0, "{value} overflows numeric(2,2)");
        }
    }

    #[test]
    fn text_is_ten_alphanumeric_chars() {
        for value in sample(&DeclaredType::Text { max_len: None }, 50) {
            let SeedValue::Text(value) = value else {
                panic!("expected text, got {value:?}");
            };
            assert_eq!(value.len(), 10);
            assert!(value.chars().all(|ch| ch.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn text_is_truncated_to_declared_length() {
        let values = sample(&DeclaredType::Text { max_len: Some(4) }, 5);
        assert!(
            values
                .iter()
                .all(|value| matches!(value, SeedValue::Text(text) if text.len() == 4))
        );
    }

    #[test]
    fn unknown_types_fall_back_to_text() {
        let values = sample(&DeclaredType::Other("app.status".to_string()), 5);
        assert!(
            values
                .iter()
                .all(|value| matches!(value, SeedValue::Text(text) if text.len() == 10))
        );
    }

    #[test]
    fn uuids_are_canonical_v4() {
        for value in sample(&DeclaredType::Uuid, 20) {
            let SeedValue::Uuid(value) = value else {
                panic!("expected uuid, got {value:?}");
            };
            assert_eq!(value.get_version_num(), 4);
            let text = value.to_string();
            assert_eq!(text.len(), 36);
            assert!(uuid::Uuid::parse_str(&text).is_ok());
        }
    }

    #[test]
    fn timestamps_are_in_the_past() {
        for value in sample(&DeclaredType::TimestampNoTz, 50) {
            let SeedValue::Timestamp(value) = value else {
                panic!("expected timestamp, got {value:?}");
            };
            assert!(value < now());
            assert!(now() - value <= Duration::days(1));
        }
        for value in sample(&DeclaredType::Date, 50) {
            let SeedValue::Date(value) = value else {
                panic!("expected date, got {value:?}");
            };
            assert!(value <= now().date());
        }
    }

    #[test]
    fn timestamp_without_timezone_renders_plain() {
        let value = sample(&DeclaredType::TimestampNoTz, 1).remove(0);
        let text = value.to_sql_text().expect("non-null");
        assert_eq!(text.len(), "YYYY-MM-DD HH:MM:SS".len());
        assert!(NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn table_streams_are_independent_and_repeatable() {
        let mut orders = ValueGenerator::for_table(42, "orders", now());
        let mut again = ValueGenerator::for_table(42, "orders", now());
        let mut customers = ValueGenerator::for_table(42, "customers", now());

        let first = orders.generate(&DeclaredType::BigInt);
        assert_eq!(first, again.generate(&DeclaredType::BigInt));
        assert_ne!(first, customers.generate(&DeclaredType::BigInt));
        assert_ne!(hash_seed(42, "orders"), hash_seed(43, "orders"));
    }

    #[test]
    fn same_seed_same_values() {
        assert_eq!(
            sample(&DeclaredType::BigInt, 10),
            sample(&DeclaredType::BigInt, 10)
        );
    }
}
