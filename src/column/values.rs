//! Typed column storage.
//!
//! [`ColumnValues`] holds the values of one column in a vector matching its
//! [`ColumnMode`]. Numeric conversions widen to `f64`; unparsable or missing
//! numeric values become [`MISSING_VALUE`] in `Double` storage and `0` in
//! integer storage, missing date-times are `None`.

use crate::types::{ColumnMode, MISSING_VALUE};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Default date-time format used for text conversion.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Double(Vec<f64>),
    Integer(Vec<i32>),
    BigInt(Vec<i64>),
    Text(Vec<String>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl Default for ColumnValues {
    fn default() -> Self {
        ColumnValues::Double(Vec::new())
    }
}

impl ColumnValues {
    /// Create storage for `rows` values of the given mode, each set to the
    /// mode's empty value.
    pub fn new(mode: ColumnMode, rows: usize) -> Self {
        match mode {
            ColumnMode::Double => ColumnValues::Double(vec![MISSING_VALUE; rows]),
            ColumnMode::Integer => ColumnValues::Integer(vec![0; rows]),
            ColumnMode::BigInt => ColumnValues::BigInt(vec![0; rows]),
            ColumnMode::Text => ColumnValues::Text(vec![String::new(); rows]),
            ColumnMode::DateTime => ColumnValues::DateTime(vec![None; rows]),
        }
    }

    pub fn mode(&self) -> ColumnMode {
        match self {
            ColumnValues::Double(_) => ColumnMode::Double,
            ColumnValues::Integer(_) => ColumnMode::Integer,
            ColumnValues::BigInt(_) => ColumnMode::BigInt,
            ColumnValues::Text(_) => ColumnMode::Text,
            ColumnValues::DateTime(_) => ColumnMode::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Double(v) => v.len(),
            ColumnValues::Integer(v) => v.len(),
            ColumnValues::BigInt(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow or shrink to `rows`, filling new rows with the empty value.
    pub fn resize(&mut self, rows: usize) {
        match self {
            ColumnValues::Double(v) => v.resize(rows, MISSING_VALUE),
            ColumnValues::Integer(v) => v.resize(rows, 0),
            ColumnValues::BigInt(v) => v.resize(rows, 0),
            ColumnValues::Text(v) => v.resize(rows, String::new()),
            ColumnValues::DateTime(v) => v.resize(rows, None),
        }
    }

    /// Insert `count` empty rows before row `before` (clamped to the end).
    pub fn insert_rows(&mut self, before: usize, count: usize) {
        let at = before.min(self.len());
        match self {
            ColumnValues::Double(v) => {
                v.splice(at..at, std::iter::repeat(MISSING_VALUE).take(count));
            }
            ColumnValues::Integer(v) => {
                v.splice(at..at, std::iter::repeat(0).take(count));
            }
            ColumnValues::BigInt(v) => {
                v.splice(at..at, std::iter::repeat(0).take(count));
            }
            ColumnValues::Text(v) => {
                v.splice(at..at, std::iter::repeat(String::new()).take(count));
            }
            ColumnValues::DateTime(v) => {
                v.splice(at..at, std::iter::repeat(None).take(count));
            }
        }
    }

    /// Remove up to `count` rows starting at `first`.
    pub fn remove_rows(&mut self, first: usize, count: usize) {
        let len = self.len();
        let start = first.min(len);
        let end = first.saturating_add(count).min(len);
        match self {
            ColumnValues::Double(v) => {
                v.drain(start..end);
            }
            ColumnValues::Integer(v) => {
                v.drain(start..end);
            }
            ColumnValues::BigInt(v) => {
                v.drain(start..end);
            }
            ColumnValues::Text(v) => {
                v.drain(start..end);
            }
            ColumnValues::DateTime(v) => {
                v.drain(start..end);
            }
        }
    }

    /// Numeric value at `row`; `NaN` when out of range or not a number.
    pub fn value_at(&self, row: usize) -> f64 {
        match self {
            ColumnValues::Double(v) => v.get(row).copied().unwrap_or(MISSING_VALUE),
            ColumnValues::Integer(v) => v.get(row).map(|&x| x as f64).unwrap_or(MISSING_VALUE),
            ColumnValues::BigInt(v) => v.get(row).map(|&x| x as f64).unwrap_or(MISSING_VALUE),
            ColumnValues::Text(v) => v
                .get(row)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(MISSING_VALUE),
            ColumnValues::DateTime(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|dt| dt.and_utc().timestamp_millis() as f64)
                .unwrap_or(MISSING_VALUE),
        }
    }

    /// Text representation of the value at `row`; empty when out of range
    /// or missing.
    pub fn text_at(&self, row: usize) -> String {
        match self {
            ColumnValues::Double(v) => match v.get(row) {
                Some(x) if !x.is_nan() => x.to_string(),
                _ => String::new(),
            },
            ColumnValues::Integer(v) => v.get(row).map(|x| x.to_string()).unwrap_or_default(),
            ColumnValues::BigInt(v) => v.get(row).map(|x| x.to_string()).unwrap_or_default(),
            ColumnValues::Text(v) => v.get(row).cloned().unwrap_or_default(),
            ColumnValues::DateTime(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|dt| dt.format(DEFAULT_DATETIME_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    /// Store a numeric value at `row`, growing the storage if needed.
    ///
    /// Integer storage rounds and saturates; `NaN` becomes `0`.
    pub fn set_value_at(&mut self, row: usize, value: f64) {
        if row >= self.len() {
            self.resize(row + 1);
        }
        match self {
            ColumnValues::Double(v) => v[row] = value,
            ColumnValues::Integer(v) => v[row] = round_to_i32(value),
            ColumnValues::BigInt(v) => v[row] = round_to_i64(value),
            ColumnValues::Text(v) => {
                v[row] = if value.is_nan() {
                    String::new()
                } else {
                    value.to_string()
                }
            }
            ColumnValues::DateTime(v) => v[row] = millis_to_datetime(value),
        }
    }

    /// Convert to another mode, keeping the row count.
    pub fn convert(&self, mode: ColumnMode) -> ColumnValues {
        if mode == self.mode() {
            return self.clone();
        }
        let rows = self.len();
        match mode {
            ColumnMode::Double => {
                ColumnValues::Double((0..rows).map(|r| self.value_at(r)).collect())
            }
            ColumnMode::Integer => ColumnValues::Integer(
                (0..rows).map(|r| round_to_i32(self.value_at(r))).collect(),
            ),
            ColumnMode::BigInt => ColumnValues::BigInt(
                (0..rows).map(|r| round_to_i64(self.value_at(r))).collect(),
            ),
            ColumnMode::Text => ColumnValues::Text((0..rows).map(|r| self.text_at(r)).collect()),
            ColumnMode::DateTime => match self {
                ColumnValues::Text(v) => ColumnValues::DateTime(
                    v.iter()
                        .map(|s| {
                            NaiveDateTime::parse_from_str(s.trim(), DEFAULT_DATETIME_FORMAT).ok()
                        })
                        .collect(),
                ),
                _ => ColumnValues::DateTime(
                    (0..rows)
                        .map(|r| millis_to_datetime(self.value_at(r)))
                        .collect(),
                ),
            },
        }
    }
}

/// Round half away from zero and saturate to the `i32` range; `NaN` is `0`.
pub fn round_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        0
    } else {
        // `as` saturates for out-of-range floats
        value.round() as i32
    }
}

/// Round half away from zero and saturate to the `i64` range; `NaN` is `0`.
pub fn round_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        0
    } else {
        value.round() as i64
    }
}

fn millis_to_datetime(value: f64) -> Option<NaiveDateTime> {
    if value.is_nan() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(value as i64).map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fills_empty_values() {
        let v = ColumnValues::new(ColumnMode::Double, 3);
        assert_eq!(v.len(), 3);
        assert!(v.value_at(0).is_nan());

        let v = ColumnValues::new(ColumnMode::Integer, 2);
        assert_eq!(v, ColumnValues::Integer(vec![0, 0]));
    }

    #[test]
    fn test_insert_and_remove_rows() {
        let mut v = ColumnValues::Integer(vec![1, 2, 3]);
        v.insert_rows(1, 2);
        assert_eq!(v, ColumnValues::Integer(vec![1, 0, 0, 2, 3]));
        v.remove_rows(0, 3);
        assert_eq!(v, ColumnValues::Integer(vec![2, 3]));
        v.remove_rows(1, 100);
        assert_eq!(v, ColumnValues::Integer(vec![2]));
    }

    #[test]
    fn test_convert_double_to_integer() {
        let v = ColumnValues::Double(vec![1.4, 1.5, -2.5, f64::NAN, 1e12]);
        assert_eq!(
            v.convert(ColumnMode::Integer),
            ColumnValues::Integer(vec![1, 2, -3, 0, i32::MAX])
        );
    }

    #[test]
    fn test_convert_text_round_trip() {
        let v = ColumnValues::Text(vec!["1.5".into(), "abc".into(), " 7 ".into()]);
        let d = v.convert(ColumnMode::Double);
        assert_eq!(d.value_at(0), 1.5);
        assert!(d.value_at(1).is_nan());
        assert_eq!(d.value_at(2), 7.0);
        assert_eq!(d.convert(ColumnMode::Text).text_at(1), "");
    }

    #[test]
    fn test_datetime_text_conversion() {
        let v = ColumnValues::Text(vec!["2024-03-01 12:30:00.000".into(), "nope".into()]);
        let dt = v.convert(ColumnMode::DateTime);
        assert_eq!(dt.mode(), ColumnMode::DateTime);
        assert_eq!(dt.text_at(0), "2024-03-01 12:30:00.000");
        assert_eq!(dt.text_at(1), "");
    }

    #[test]
    fn test_set_value_grows_storage() {
        let mut v = ColumnValues::Double(Vec::new());
        v.set_value_at(2, 4.0);
        assert_eq!(v.len(), 3);
        assert!(v.value_at(0).is_nan());
        assert_eq!(v.value_at(2), 4.0);
    }
}
