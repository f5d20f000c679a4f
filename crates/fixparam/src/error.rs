//! Error types.
//!
//! [`ParamError`] is what the public API returns. Validator failures are
//! carried as [`ValidationError`] and unit-system failures as [`UnitError`];
//! both pass through `ParamError` unchanged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParamError {
    #[error("`fvalidate`, if a key, must be one of {known:?}; got {key:?}")]
    InvalidValidatorSpec { key: String, known: Vec<String> },

    #[error("Unknown validator key: {0}")]
    UnknownValidatorKey(String),

    #[error("Validator key already registered: {0}")]
    DuplicateKey(String),

    #[error("can't set attribute {0} again")]
    AttributeAlreadySet(String),

    #[error("attribute {0} has not been set")]
    UnboundAttribute(String),

    #[error("parameter is not attached to an owner type")]
    NotAttached,

    #[error("{owner} has no parameter named {name}")]
    UnknownAttribute { owner: String, name: String },

    #[error("array is read-only")]
    ReadOnly,

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

/// Errors raised by validator functions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("{name} must be numeric, got {kind}")]
    NotNumeric { name: String, kind: &'static str },

    #[error("{0} is a non-scalar quantity")]
    NonScalar(String),

    #[error("{0} cannot be negative.")]
    Negative(String),

    #[error("{0}")]
    Custom(String),
}

/// Errors raised by a [`UnitSystem`](crate::units::UnitSystem).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("'{0}' did not parse as unit: unknown unit")]
    UnknownUnit(String),

    #[error("'{spec}' did not parse as unit: {reason}")]
    Malformed { spec: String, reason: String },

    #[error("'{from}' and '{to}' are not convertible")]
    Incompatible { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, ParamError>;
