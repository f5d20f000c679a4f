//! # Fixparam Architecture
//!
//! Fixparam provides **validated, write-once attributes**. An owner type declares
//! one [`Parameter`] per attribute; every instance then sets each attribute once,
//! through the parameter's validator, and can never change it afterwards.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Owner Types (owner.rs)                                     │
//! │  - OwnerType declares and attaches parameters               │
//! │  - Instance / ParamOwner hold the per-instance Slots        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Parameters (parameter.rs)                                  │
//! │  - Declared fields, attachment, write-once get/set          │
//! │  - Cloning with overrides, textual representation           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Validators (validators/)                                   │
//! │  - Process-wide key -> validator registry                   │
//! │  - Built-ins: default, float, scalar, non-negative          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Values & Units (value.rs, units/)                          │
//! │  - ParamValue: numbers, text, arrays, quantities            │
//! │  - UnitSystem trait, UnitTable implementation               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Set Protocol
//!
//! `Parameter::set(owner, raw)`:
//!
//! 1. Fails with [`ParamError::AttributeAlreadySet`] if the slot is taken.
//! 2. Calls the validator as `fvalidate(owner, parameter, value)`.
//! 3. Freezes arrays in the result.
//! 4. Stores it under the parameter's private name (`"_" + name`).
//!
//! The raw value is taken by value, so the caller keeps no handle on what is
//! stored.
//!
//! ## Logging
//!
//! The library emits [`tracing`] events and never installs a subscriber.
//!
//! ## Module Overview
//!
//! - [`parameter`]: `Parameter`, its builder and the get/set protocol
//! - [`owner`]: `Slots`, `ParamOwner`, `OwnerType`, `Instance`
//! - [`validators`]: `Validator`, the registry and built-in validators
//! - [`value`]: the dynamic value model
//! - [`units`]: `Unit`, `Equivalency`, `UnitSystem`, `UnitTable`
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod owner;
pub mod parameter;
pub mod units;
pub mod validators;
pub mod value;

pub use config::{FixparamConfig, UnitDef};
pub use error::{ParamError, Result, UnitError, ValidationError};
pub use owner::{Instance, OwnerType, ParamOwner, Slots};
pub use parameter::{Access, Parameter, ParameterBuilder, UnitSpec};
pub use units::{standard_system, Equivalency, Unit, UnitSystem, UnitTable};
pub use validators::{Validator, ValidatorRegistry, ValidatorSpec};
pub use value::{Array, Magnitude, ParamValue, Quantity};
