//! # Unit System
//!
//! Parameters never do unit algebra themselves. They consume the two
//! capabilities of the [`UnitSystem`] trait:
//!
//! - `parse_unit`: turn a specifier such as `"km/s/Mpc"` into a canonical [`Unit`]
//! - `convert`: move a magnitude from one unit to another, optionally through
//!   an ordered list of [`Equivalency`] rules
//!
//! ## Implementations
//!
//! - [`UnitTable`]: table of named units with scale factors and dimension
//!   exponents. [`UnitTable::standard()`] carries SI and astronomical units.
//!
//! The standard table is shared process-wide through [`standard_system()`],
//! which is what a [`Parameter`](crate::Parameter) uses unless a builder is
//! given another system.

use crate::error::UnitError;
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

mod table;

pub use table::UnitTable;

/// Dimension exponents keyed by base dimension name (`"length"`, `"time"`, ...).
///
/// Zero exponents are never stored, so two units are convertible without
/// equivalencies exactly when their maps are equal.
pub type Dimensions = BTreeMap<String, i32>;

/// Speed of light in m/s.
const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// A canonical unit: its symbol, scale to base units and dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    symbol: String,
    scale: f64,
    dims: Dimensions,
}

impl Unit {
    pub(crate) fn from_parts(symbol: impl Into<String>, scale: f64, dims: Dimensions) -> Self {
        Self {
            symbol: symbol.into(),
            scale,
            dims,
        }
    }

    /// The dimensionless, unscaled unit.
    pub fn dimensionless() -> Self {
        Self::from_parts("", 1.0, Dimensions::new())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Factor that converts one of this unit into base units.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dims
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dims.is_empty()
    }

    /// Whether the two units measure the same dimensions.
    pub fn is_equivalent(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

impl PartialEq<str> for Unit {
    fn eq(&self, other: &str) -> bool {
        self.symbol == other
    }
}

impl PartialEq<&str> for Unit {
    fn eq(&self, other: &&str) -> bool {
        self.symbol == *other
    }
}

/// A conversion rule between two dimensions that linear scaling can't bridge.
///
/// `forward` maps a magnitude expressed in `from` to one expressed in `to`;
/// `backward` is its inverse.
#[derive(Clone)]
pub struct Equivalency {
    name: Cow<'static, str>,
    from: Unit,
    to: Unit,
    forward: fn(f64) -> f64,
    backward: fn(f64) -> f64,
}

impl Equivalency {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        from: Unit,
        to: Unit,
        forward: fn(f64) -> f64,
        backward: fn(f64) -> f64,
    ) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            forward,
            backward,
        }
    }

    /// Wavelength (m) to frequency (Hz).
    pub fn spectral() -> Self {
        Self::new(
            "spectral",
            Unit::from_parts("m", 1.0, dims(&[("length", 1)])),
            Unit::from_parts("Hz", 1.0, dims(&[("time", -1)])),
            |wavelength| SPEED_OF_LIGHT / wavelength,
            |frequency| SPEED_OF_LIGHT / frequency,
        )
    }

    /// Mass (kg) to rest energy (J).
    pub fn mass_energy() -> Self {
        Self::new(
            "mass_energy",
            Unit::from_parts("kg", 1.0, dims(&[("mass", 1)])),
            Unit::from_parts("J", 1.0, dims(&[("mass", 1), ("length", 2), ("time", -2)])),
            |mass| mass * SPEED_OF_LIGHT * SPEED_OF_LIGHT,
            |energy| energy / (SPEED_OF_LIGHT * SPEED_OF_LIGHT),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convert `value` from `from` to `to` if this rule bridges their
    /// dimensions in either direction.
    pub fn apply(&self, value: f64, from: &Unit, to: &Unit) -> Option<f64> {
        if from.is_equivalent(&self.from) && to.is_equivalent(&self.to) {
            let bridged = (self.forward)(value * from.scale / self.from.scale);
            return Some(bridged * self.to.scale / to.scale);
        }
        if from.is_equivalent(&self.to) && to.is_equivalent(&self.from) {
            let bridged = (self.backward)(value * from.scale / self.to.scale);
            return Some(bridged * self.from.scale / to.scale);
        }
        None
    }
}

impl fmt::Debug for Equivalency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equivalency")
            .field("name", &self.name)
            .field("from", &self.from.symbol)
            .field("to", &self.to.symbol)
            .finish()
    }
}

impl fmt::Display for Equivalency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for Equivalency {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.from == other.from && self.to == other.to
    }
}

/// Unit parsing and conversion, as consumed by parameters and validators.
pub trait UnitSystem: fmt::Debug + Send + Sync {
    /// Parse a unit specifier into its canonical form.
    fn parse_unit(&self, spec: &str) -> Result<Unit, UnitError>;

    /// Convert a magnitude expressed in `from` into `to`.
    ///
    /// Equivalencies are tried in order when the dimensions differ.
    fn convert(
        &self,
        value: f64,
        from: &Unit,
        to: &Unit,
        equivalencies: &[Equivalency],
    ) -> Result<f64, UnitError>;
}

static STANDARD: Lazy<Arc<UnitTable>> = Lazy::new(|| Arc::new(UnitTable::standard()));

/// The process-wide standard unit table.
pub fn standard_system() -> Arc<dyn UnitSystem> {
    let table: Arc<UnitTable> = Arc::clone(&STANDARD);
    table
}

pub(crate) fn dims(pairs: &[(&str, i32)]) -> Dimensions {
    pairs
        .iter()
        .filter(|(_, power)| *power != 0)
        .map(|(name, power)| (name.to_string(), *power))
        .collect()
}
