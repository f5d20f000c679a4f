//! Parameter value types.
//!
//! This module defines the runtime representation of the values that flow
//! through validation and end up stored on owner instances.

use crate::error::{ParamError, Result, ValidationError};
use crate::units::{Equivalency, Unit, UnitSystem};
use std::fmt;

/// Runtime representation of a parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Boolean flag (e.g., a `flat` switch)
    Bool(bool),

    /// Integer count (e.g., number of neutrino species as an integer)
    Int(i64),

    /// Plain floating point number without a unit
    Float(f64),

    /// Free text
    Text(String),

    /// Unitless float array
    Array(Array),

    /// Magnitude tagged with a unit
    Quantity(Quantity),
}

/// A float array that can be frozen.
///
/// Arrays stored on an owner are made read-only; [`Array::set`] then fails
/// with [`ParamError::ReadOnly`].
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    data: Vec<f64>,
    writeable: bool,
}

impl Array {
    pub fn new(data: Vec<f64>) -> Self {
        Self {
            data,
            writeable: true,
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_writeable(&self) -> bool {
        self.writeable
    }

    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        if !self.writeable {
            return Err(ParamError::ReadOnly);
        }
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(ParamError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    fn freeze(&mut self) {
        self.writeable = false;
    }

    fn map<F>(&self, f: F) -> std::result::Result<Self, ValidationError>
    where
        F: Fn(f64) -> std::result::Result<f64, ValidationError>,
    {
        let data = self
            .data
            .iter()
            .map(|v| f(*v))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(data))
    }
}

impl From<Vec<f64>> for Array {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

/// Numeric part of a [`Quantity`].
#[derive(Debug, Clone, PartialEq)]
pub enum Magnitude {
    Scalar(f64),
    Array(Array),
}

impl Magnitude {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Magnitude::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Magnitude::Scalar(v) => Some(*v),
            Magnitude::Array(_) => None,
        }
    }

    /// All elements, a scalar counting as one.
    pub fn values(&self) -> &[f64] {
        match self {
            Magnitude::Scalar(v) => std::slice::from_ref(v),
            Magnitude::Array(a) => a.as_slice(),
        }
    }
}

/// A magnitude tagged with a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    magnitude: Magnitude,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: Magnitude, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    pub fn scalar(value: f64, unit: Unit) -> Self {
        Self::new(Magnitude::Scalar(value), unit)
    }

    pub fn array(values: Vec<f64>, unit: Unit) -> Self {
        Self::new(Magnitude::Array(Array::new(values)), unit)
    }

    pub fn magnitude(&self) -> &Magnitude {
        &self.magnitude
    }

    pub fn value(&self) -> Option<f64> {
        self.magnitude.as_scalar()
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Express this quantity in `unit`.
    pub fn to(
        &self,
        units: &dyn UnitSystem,
        unit: &Unit,
        equivalencies: &[Equivalency],
    ) -> std::result::Result<Quantity, ValidationError> {
        let convert = |v: f64| {
            units
                .convert(v, &self.unit, unit, equivalencies)
                .map_err(ValidationError::from)
        };
        let magnitude = match &self.magnitude {
            Magnitude::Scalar(v) => Magnitude::Scalar(convert(*v)?),
            Magnitude::Array(a) => Magnitude::Array(a.map(convert)?),
        };
        Ok(Quantity::new(magnitude, unit.clone()))
    }
}

impl ParamValue {
    /// Create a scalar quantity value.
    pub fn quantity(value: f64, unit: Unit) -> Self {
        ParamValue::Quantity(Quantity::scalar(value, unit))
    }

    /// Name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
            ParamValue::Array(_) => "array",
            ParamValue::Quantity(_) => "quantity",
        }
    }

    /// Whether this value holds a single number (or is not numeric at all).
    pub fn is_scalar(&self) -> bool {
        match self {
            ParamValue::Array(_) => false,
            ParamValue::Quantity(q) => q.magnitude.is_scalar(),
            _ => true,
        }
    }

    /// Get the number if this is a numeric scalar.
    ///
    /// - Bool: 0.0 or 1.0
    /// - Int / Float: the number
    /// - Quantity: the scalar magnitude
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Quantity(q) => q.value(),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            ParamValue::Quantity(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            ParamValue::Array(a) => Some(a),
            ParamValue::Quantity(Quantity {
                magnitude: Magnitude::Array(a),
                ..
            }) => Some(a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric elements of this value, if it has any.
    pub fn numbers(&self) -> Option<Vec<f64>> {
        match self {
            ParamValue::Array(a) => Some(a.as_slice().to_vec()),
            ParamValue::Quantity(q) => Some(q.magnitude.values().to_vec()),
            other => other.as_f64().map(|v| vec![v]),
        }
    }

    /// Mark any array inside this value read-only.
    pub fn freeze(&mut self) {
        match self {
            ParamValue::Array(a) => a.freeze(),
            ParamValue::Quantity(Quantity {
                magnitude: Magnitude::Array(a),
                ..
            }) => a.freeze(),
            _ => {}
        }
    }

    /// Mutable access to an inner array, for in-place edits before storage.
    pub fn array_mut(&mut self) -> Option<&mut Array> {
        match self {
            ParamValue::Array(a) => Some(a),
            ParamValue::Quantity(Quantity {
                magnitude: Magnitude::Array(a),
                ..
            }) => Some(a),
            _ => None,
        }
    }

    /// Tag this value with `unit`, converting it if it already carries one.
    pub fn with_unit(
        self,
        units: &dyn UnitSystem,
        unit: &Unit,
        equivalencies: &[Equivalency],
        name: &str,
    ) -> std::result::Result<ParamValue, ValidationError> {
        let quantity = match self {
            ParamValue::Quantity(q) => q.to(units, unit, equivalencies)?,
            ParamValue::Array(a) => Quantity::new(Magnitude::Array(a), unit.clone()),
            ParamValue::Int(v) => Quantity::scalar(v as f64, unit.clone()),
            ParamValue::Float(v) => Quantity::scalar(v, unit.clone()),
            ParamValue::Bool(v) => Quantity::scalar(if v { 1.0 } else { 0.0 }, unit.clone()),
            ParamValue::Text(_) => {
                return Err(ValidationError::NotNumeric {
                    name: name.to_string(),
                    kind: "text",
                })
            }
        };
        Ok(ParamValue::Quantity(quantity))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(v: Vec<f64>) -> Self {
        ParamValue::Array(Array::new(v))
    }
}

impl From<Array> for ParamValue {
    fn from(v: Array) -> Self {
        ParamValue::Array(v)
    }
}

impl From<Quantity> for ParamValue {
    fn from(v: Quantity) -> Self {
        ParamValue::Quantity(v)
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.data.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}]", items.join(", "))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.magnitude {
            Magnitude::Scalar(v) => write!(f, "{v}")?,
            Magnitude::Array(a) => write!(f, "{a}")?,
        }
        if !self.unit.symbol().is_empty() {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "{v:?}"),
            ParamValue::Array(a) => write!(f, "{a}"),
            ParamValue::Quantity(q) => write!(f, "{q}"),
        }
    }
}
