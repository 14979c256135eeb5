// conform-core/src/domain/rules/registry.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use super::ConformanceRule;
use super::builtin;
use super::error::RuleError;

/// Rule name -> implementation, populated once at startup.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: BTreeMap<&'static str, Arc<dyn ConformanceRule>>,
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::empty();
        for rule in builtin::all() {
            registry.register(rule);
        }
        registry
    }

    /// Registers `rule`, replacing any rule with the same name.
    pub fn register(&mut self, rule: Arc<dyn ConformanceRule>) {
        self.rules.insert(rule.name(), rule);
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn ConformanceRule>, RuleError> {
        self.rules
            .get(name)
            .ok_or_else(|| RuleError::Unknown(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ConformanceRule>> {
        self.rules.values()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rules.keys()).finish()
    }
}
