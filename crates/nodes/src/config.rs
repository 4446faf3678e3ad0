//! Per-instance step configuration.
//!
//! Hosts hand configuration over as strings; each step parses what it needs.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::StepError;

/// Key used for the optional instrument a step drives.
pub const INSTRUMENT_ID: &str = "instrument_id";

/// String key/value configuration of one step instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepConfig {
    values: BTreeMap<String, String>,
}

impl StepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Best-effort parse: a missing, blank, or unparsable value is `None`.
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse().ok())
    }

    /// Strict numeric parse for values a step cannot run without.
    pub fn require<T: FromStr>(&self, key: &str) -> Result<T, StepError> {
        self.parse(key).ok_or_else(|| StepError::InvalidConfig {
            key: key.to_owned(),
            value: self.get(key).unwrap_or_default().to_owned(),
            expected: "a number",
        })
    }

    pub fn instrument_id(&self) -> Option<i32> {
        self.parse(INSTRUMENT_ID)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StepConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
