//! Key to validator mapping.

use super::{builtin, Validator};
use crate::error::{ParamError, Result};
use std::collections::BTreeMap;

/// Registry of validators by key.
///
/// The process-wide instance lives behind the free functions in
/// [`validators`](super); a standalone registry is useful when a caller wants
/// its own isolated set of keys.
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    entries: BTreeMap<String, Validator>,
}

impl ValidatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in validators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for validator in builtin::all() {
            registry
                .entries
                .insert(validator.name().to_string(), validator);
        }
        registry
    }

    /// Register `validator` under `key`, returning it unchanged.
    pub fn register(&mut self, key: impl Into<String>, validator: Validator) -> Result<Validator> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(ParamError::DuplicateKey(key));
        }
        tracing::debug!(key = %key, validator = %validator.name(), "registered validator");
        self.entries.insert(key, validator.clone());
        Ok(validator)
    }

    /// Register `validator` under `key`, returning the entry it displaced.
    pub fn replace(&mut self, key: impl Into<String>, validator: Validator) -> Option<Validator> {
        let key = key.into();
        let previous = self.entries.insert(key.clone(), validator);
        if previous.is_some() {
            tracing::warn!(key = %key, "replaced registered validator");
        }
        previous
    }

    pub fn resolve(&self, key: &str) -> Result<Validator> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| ParamError::UnknownValidatorKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
