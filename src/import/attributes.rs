//! Flat attribute sets used to persist filter settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// String-keyed, string-valued settings record.
///
/// Readers never fail: a missing, empty or unparsable attribute yields the
/// caller's default and appends a warning to the supplied list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, String>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Display) {
        self.0.insert(key.to_string(), value.to_string());
    }

    /// Store a flag as `0`/`1`.
    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.set(key, u8::from(value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse `key`, falling back to `default`.
    pub fn read<T>(&self, key: &str, default: T, warnings: &mut Vec<String>) -> T
    where
        T: FromStr + Display,
    {
        match self.get(key).map(str::trim) {
            None | Some("") => {
                Self::warn(warnings, format!("Attribute '{}' missing, using default {}", key, default));
                default
            }
            Some(raw) => match raw.parse() {
                Ok(v) => v,
                Err(_) => {
                    Self::warn(
                        warnings,
                        format!("Attribute '{}' has invalid value '{}', using default {}", key, raw, default),
                    );
                    default
                }
            },
        }
    }

    /// Parse a `0`/`1` flag (`true`/`false` are accepted as well).
    pub fn read_flag(&self, key: &str, default: bool, warnings: &mut Vec<String>) -> bool {
        match self.get(key).map(str::trim) {
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            _ => self.read::<u8>(key, u8::from(default), warnings) != 0,
        }
    }

    /// Read a string attribute; empty counts as missing.
    pub fn read_string(&self, key: &str, default: &str, warnings: &mut Vec<String>) -> String {
        match self.get(key) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => {
                Self::warn(warnings, format!("Attribute '{}' missing, using default '{}'", key, default));
                default.to_string()
            }
        }
    }

    /// Parse with a custom conversion, e.g. for enum ordinals.
    pub fn read_with<T, F>(&self, key: &str, default: T, warnings: &mut Vec<String>, convert: F) -> T
    where
        T: Display,
        F: FnOnce(i64) -> Option<T>,
    {
        let Some(raw) = self.get(key).map(str::trim).filter(|s| !s.is_empty()) else {
            Self::warn(warnings, format!("Attribute '{}' missing, using default {}", key, default));
            return default;
        };
        match raw.parse::<i64>().ok().and_then(convert) {
            Some(v) => v,
            None => {
                Self::warn(
                    warnings,
                    format!("Attribute '{}' has invalid value '{}', using default {}", key, raw, default),
                );
                default
            }
        }
    }

    fn warn(warnings: &mut Vec<String>, message: String) {
        tracing::warn!("{}", message);
        warnings.push(message);
    }
}

impl FromIterator<(String, String)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
