//! Built-in validators.
//!
//! Each is a plain function with the validator signature so custom
//! validators can build on them.

use super::Validator;
use crate::error::ValidationError;
use crate::owner::ParamOwner;
use crate::parameter::Parameter;
use crate::value::ParamValue;

type Outcome = Result<ParamValue, ValidationError>;

pub(super) fn all() -> Vec<Validator> {
    vec![
        Validator::new("default", validate_with_unit),
        Validator::new("float", validate_to_float),
        Validator::new("scalar", validate_to_scalar),
        Validator::new("non-negative", validate_non_negative),
    ]
}

/// Convert to the parameter's unit using its equivalencies.
///
/// Unitless parameters get the value back unchanged.
pub fn validate_with_unit(_owner: &dyn ParamOwner, param: &Parameter, value: ParamValue) -> Outcome {
    match param.unit() {
        Some(unit) => value.with_unit(
            param.unit_system(),
            unit,
            param.equivalencies(),
            param.display_name(),
        ),
        None => Ok(value),
    }
}

/// [`validate_with_unit`], then coerce the magnitude to floating point.
pub fn validate_to_float(owner: &dyn ParamOwner, param: &Parameter, value: ParamValue) -> Outcome {
    let value = validate_with_unit(owner, param, value)?;
    match value {
        ParamValue::Bool(v) => Ok(ParamValue::Float(if v { 1.0 } else { 0.0 })),
        ParamValue::Int(v) => Ok(ParamValue::Float(v as f64)),
        ParamValue::Text(_) => Err(ValidationError::NotNumeric {
            name: param.display_name().to_string(),
            kind: "text",
        }),
        other => Ok(other),
    }
}

/// [`validate_with_unit`], then reject anything that is not a scalar.
pub fn validate_to_scalar(owner: &dyn ParamOwner, param: &Parameter, value: ParamValue) -> Outcome {
    let value = validate_with_unit(owner, param, value)?;
    if !value.is_scalar() {
        return Err(ValidationError::NonScalar(param.display_name().to_string()));
    }
    Ok(value)
}

/// [`validate_to_float`], then reject negative elements.
pub fn validate_non_negative(owner: &dyn ParamOwner, param: &Parameter, value: ParamValue) -> Outcome {
    let value = validate_to_float(owner, param, value)?;
    let negative = value
        .numbers()
        .is_some_and(|numbers| numbers.iter().any(|v| *v < 0.0));
    if negative {
        return Err(ValidationError::Negative(param.display_name().to_string()));
    }
    Ok(value)
}
