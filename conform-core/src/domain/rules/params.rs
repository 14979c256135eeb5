// conform-core/src/domain/rules/params.rs

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

use super::error::RuleError;

/// Rule parameters exactly as declared in the analytic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleParams(BTreeMap<String, Value>);

impl RuleParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn with_list(mut self, key: &str, items: &[&str]) -> Self {
        let seq = items.iter().map(|s| Value::String(s.to_string())).collect();
        self.0.insert(key.to_string(), Value::Sequence(seq));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn require_str(&self, key: &str) -> Result<&str, RuleError> {
        match self.get(key) {
            None => Err(RuleError::MissingParameter(key.to_string())),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
            Some(Value::String(_)) => Err(RuleError::invalid(key, "must not be empty")),
            Some(_) => Err(RuleError::invalid(key, "expected a string")),
        }
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&str>, RuleError> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.require_str(key).map(Some),
        }
    }

    /// A single string is accepted as a one-item list.
    pub fn require_str_list(&self, key: &str) -> Result<Vec<String>, RuleError> {
        match self.get(key) {
            None => Err(RuleError::MissingParameter(key.to_string())),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(vec![s.trim().to_string()]),
            Some(Value::Sequence(items)) if !items.is_empty() => items
                .iter()
                .map(|item| {
                    scalar_text(item)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .ok_or_else(|| RuleError::invalid(key, "list items must be non-empty scalars"))
                })
                .collect(),
            Some(_) => Err(RuleError::invalid(key, "expected a non-empty list of strings")),
        }
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, RuleError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(RuleError::invalid(key, "expected true or false")),
        }
    }

    /// Strings, numbers and booleans, rendered as text.
    pub fn require_scalar_text(&self, key: &str) -> Result<String, RuleError> {
        let value = self
            .get(key)
            .ok_or_else(|| RuleError::MissingParameter(key.to_string()))?;
        scalar_text(value).ok_or_else(|| RuleError::invalid(key, "expected a scalar value"))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
