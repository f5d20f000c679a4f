//! # Validators
//!
//! A [`Validator`] turns the raw value handed to [`Parameter::set`] into the
//! value that gets stored. It is called as `validator(owner, parameter, value)`:
//! the owner comes first so validators can read sibling values already set on
//! it, and the parameter second so they can read its unit and equivalencies.
//!
//! ## Selecting a validator
//!
//! Parameters take a [`ValidatorSpec`]: either a registry key or a validator
//! function. Keys are resolved when the parameter is built, never lazily.
//!
//! ## The registry
//!
//! A process-wide registry maps keys to validators. It starts with the
//! built-ins:
//!
//! | Key | Behavior |
//! |-----|----------|
//! | `default` | Convert to the parameter's unit, if it has one |
//! | `float` | `default`, then coerce to floating point |
//! | `scalar` | `default`, then reject arrays |
//! | `non-negative` | `float`, then reject negative elements |
//!
//! Registering is meant to happen at startup. Keys can't be registered twice;
//! [`replace`] is the explicit override.
//!
//! ```ignore
//! let positive = validators::register_fn("positive", |owner, param, value| {
//!     let value = validators::builtin::validate_to_float(owner, param, value)?;
//!     ...
//! })?;
//! let param = Parameter::builder().unit("K").fvalidate("positive").build()?;
//! ```
//!
//! [`Parameter::set`]: crate::Parameter::set

use crate::error::{ParamError, Result, ValidationError};
use crate::owner::ParamOwner;
use crate::parameter::Parameter;
use crate::value::ParamValue;
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod builtin;
mod registry;

pub use registry::ValidatorRegistry;

/// Key of the validator parameters use when none is given.
pub const DEFAULT_KEY: &str = "default";

/// Signature shared by all validator functions.
pub type ValidateFn = dyn Fn(&dyn ParamOwner, &Parameter, ParamValue) -> std::result::Result<ParamValue, ValidationError>
    + Send
    + Sync;

/// A named, shareable validator function.
///
/// Two validators are equal when they share the same function allocation,
/// so a validator registered and then resolved compares equal to itself.
#[derive(Clone)]
pub struct Validator {
    name: Cow<'static, str>,
    func: Arc<ValidateFn>,
}

impl Validator {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&dyn ParamOwner, &Parameter, ParamValue) -> std::result::Result<ParamValue, ValidationError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(
        &self,
        owner: &dyn ParamOwner,
        param: &Parameter,
        value: ParamValue,
    ) -> std::result::Result<ParamValue, ValidationError> {
        (self.func)(owner, param, value)
    }

    /// Whether both handles point at the same function.
    pub fn ptr_eq(&self, other: &Validator) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

/// How a parameter's validator was specified: by key or by function.
///
/// Parameters keep this input form next to the resolved [`Validator`] so
/// clones and the textual representation reproduce what was written.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorSpec {
    Key(String),
    Func(Validator),
}

impl ValidatorSpec {
    /// Resolve against the process-wide registry.
    pub fn resolve(&self) -> Result<Validator> {
        self.resolve_in(&read())
    }

    /// Resolve against a specific registry.
    pub fn resolve_in(&self, registry: &ValidatorRegistry) -> Result<Validator> {
        match self {
            ValidatorSpec::Func(validator) => Ok(validator.clone()),
            ValidatorSpec::Key(key) => {
                registry
                    .resolve(key)
                    .map_err(|_| ParamError::InvalidValidatorSpec {
                        key: key.clone(),
                        known: registry.keys(),
                    })
            }
        }
    }
}

impl Default for ValidatorSpec {
    fn default() -> Self {
        ValidatorSpec::Key(DEFAULT_KEY.to_string())
    }
}

impl fmt::Display for ValidatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorSpec::Key(key) => write!(f, "{key:?}"),
            ValidatorSpec::Func(validator) => write!(f, "{validator}"),
        }
    }
}

impl From<&str> for ValidatorSpec {
    fn from(key: &str) -> Self {
        ValidatorSpec::Key(key.to_string())
    }
}

impl From<String> for ValidatorSpec {
    fn from(key: String) -> Self {
        ValidatorSpec::Key(key)
    }
}

impl From<Validator> for ValidatorSpec {
    fn from(validator: Validator) -> Self {
        ValidatorSpec::Func(validator)
    }
}

static REGISTRY: Lazy<RwLock<ValidatorRegistry>> =
    Lazy::new(|| RwLock::new(ValidatorRegistry::with_builtins()));

fn read() -> RwLockReadGuard<'static, ValidatorRegistry> {
    REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
}

fn write() -> RwLockWriteGuard<'static, ValidatorRegistry> {
    REGISTRY.write().unwrap_or_else(PoisonError::into_inner)
}

/// Register `validator` under `key`, returning it unchanged.
pub fn register(key: impl Into<String>, validator: Validator) -> Result<Validator> {
    write().register(key, validator)
}

/// Wrap `func` in a [`Validator`] named after `key` and register it.
pub fn register_fn<F>(key: impl Into<String>, func: F) -> Result<Validator>
where
    F: Fn(&dyn ParamOwner, &Parameter, ParamValue) -> std::result::Result<ParamValue, ValidationError>
        + Send
        + Sync
        + 'static,
{
    let key = key.into();
    let validator = Validator::new(key.clone(), func);
    register(key, validator)
}

/// Decorator-style registration: returns a function that registers the
/// validator it is given under `key` and hands it back.
pub fn registering(key: impl Into<String>) -> impl FnOnce(Validator) -> Result<Validator> {
    let key = key.into();
    move |validator| register(key, validator)
}

/// Register `validator` under `key`, overriding any existing entry.
pub fn replace(key: impl Into<String>, validator: Validator) -> Option<Validator> {
    write().replace(key, validator)
}

pub fn resolve(key: &str) -> Result<Validator> {
    read().resolve(key)
}

pub fn contains(key: &str) -> bool {
    read().contains(key)
}

/// All registered keys, sorted.
pub fn keys() -> Vec<String> {
    read().keys()
}
