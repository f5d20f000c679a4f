//! # Parameters
//!
//! A [`Parameter`] describes one validated, write-once attribute of an owner
//! type. The owner type holds the parameter; each instance holds the value.
//!
//! ## Lifecycle
//!
//! 1. Build: [`Parameter::builder()`] collects the declared fields. The unit
//!    specifier is normalized and the validator key is resolved here, so a
//!    bad key or unit fails at declaration rather than at first use.
//! 2. Attach: the owner type calls [`Parameter::attach`] with the attribute
//!    name. The value is stored under the private name `"_" + name`.
//! 3. Set, once per instance: validate, freeze, store.
//! 4. Get: read the stored value back.
//!
//! ## Declared fields
//!
//! | Field | Default | Meaning |
//! |-------|---------|---------|
//! | `derived` | `false` | Attribute is computed from others |
//! | `unit` | none | Canonical unit values are converted to |
//! | `equivalencies` | `[]` | Ordered extra conversion rules |
//! | `fvalidate` | `"default"` | Registry key or validator function |
//! | `doc` | none | Free text |
//!
//! Parameters are immutable once built. To change a field, derive a new
//! parameter with [`Parameter::clone_with`].

use crate::config::FixparamConfig;
use crate::error::{ParamError, Result};
use crate::owner::{private_key, ParamOwner};
use crate::units::{standard_system, Equivalency, Unit, UnitSystem};
use crate::validators::{self, builtin, Validator, ValidatorSpec, DEFAULT_KEY};
use crate::value::ParamValue;
use std::fmt;
use std::sync::Arc;

/// A unit as written in a declaration.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UnitSpec {
    #[default]
    None,
    Text(String),
    Unit(Unit),
}

impl From<&str> for UnitSpec {
    fn from(spec: &str) -> Self {
        UnitSpec::Text(spec.to_string())
    }
}

impl From<String> for UnitSpec {
    fn from(spec: String) -> Self {
        UnitSpec::Text(spec)
    }
}

impl From<Unit> for UnitSpec {
    fn from(unit: Unit) -> Self {
        UnitSpec::Unit(unit)
    }
}

impl From<Option<Unit>> for UnitSpec {
    fn from(unit: Option<Unit>) -> Self {
        unit.map_or(UnitSpec::None, UnitSpec::Unit)
    }
}

/// What reading a parameter through [`Parameter::access`] yields.
#[derive(Debug)]
pub enum Access<'a> {
    /// Read through the owner type: the parameter itself.
    Parameter(&'a Parameter),
    /// Read through an instance: the stored value.
    Value(&'a ParamValue),
}

/// Builder for [`Parameter`].
#[derive(Debug, Clone)]
pub struct ParameterBuilder {
    derived: bool,
    unit: UnitSpec,
    equivalencies: Vec<Equivalency>,
    fvalidate: ValidatorSpec,
    doc: Option<String>,
    units: Arc<dyn UnitSystem>,
}

impl Default for ParameterBuilder {
    fn default() -> Self {
        Self {
            derived: false,
            unit: UnitSpec::None,
            equivalencies: Vec::new(),
            fvalidate: ValidatorSpec::default(),
            doc: None,
            units: standard_system(),
        }
    }
}

impl ParameterBuilder {
    pub fn derived(mut self, derived: bool) -> Self {
        self.derived = derived;
        self
    }

    /// Unit specifier: text such as `"km/s/Mpc"`, a [`Unit`], or `None`.
    pub fn unit(mut self, unit: impl Into<UnitSpec>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn no_unit(mut self) -> Self {
        self.unit = UnitSpec::None;
        self
    }

    pub fn equivalencies(mut self, equivalencies: Vec<Equivalency>) -> Self {
        self.equivalencies = equivalencies;
        self
    }

    pub fn equivalency(mut self, equivalency: Equivalency) -> Self {
        self.equivalencies.push(equivalency);
        self
    }

    /// Registry key or validator function.
    pub fn fvalidate(mut self, fvalidate: impl Into<ValidatorSpec>) -> Self {
        self.fvalidate = fvalidate.into();
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn no_doc(mut self) -> Self {
        self.doc = None;
        self
    }

    /// Unit system used to normalize the unit and by unit-aware validators.
    pub fn unit_system(mut self, units: Arc<dyn UnitSystem>) -> Self {
        self.units = units;
        self
    }

    /// Resolve the validator, normalize the unit and build.
    pub fn build(self) -> Result<Parameter> {
        let fvalidate = self.fvalidate.resolve()?;
        let unit = match &self.unit {
            UnitSpec::None => None,
            UnitSpec::Text(spec) => Some(self.units.parse_unit(spec)?),
            UnitSpec::Unit(unit) => Some(self.units.parse_unit(unit.symbol())?),
        };

        Ok(Parameter {
            derived: self.derived,
            unit,
            equivalencies: self.equivalencies,
            fvalidate_in: self.fvalidate,
            fvalidate,
            doc: self.doc,
            name: None,
            private_name: None,
            units: self.units,
        })
    }
}

/// A validated, write-once attribute declared on an owner type.
#[derive(Debug)]
pub struct Parameter {
    derived: bool,
    unit: Option<Unit>,
    equivalencies: Vec<Equivalency>,
    fvalidate_in: ValidatorSpec,
    fvalidate: Validator,
    doc: Option<String>,
    name: Option<String>,
    private_name: Option<String>,
    units: Arc<dyn UnitSystem>,
}

impl Parameter {
    pub fn builder() -> ParameterBuilder {
        ParameterBuilder::default()
    }

    /// A builder whose validator is the configured default.
    pub fn builder_from(config: &FixparamConfig) -> ParameterBuilder {
        ParameterBuilder::default().fvalidate(config.default_validator.as_str())
    }

    /// A parameter with every field at its default.
    pub fn new() -> Self {
        let fvalidate = validators::resolve(DEFAULT_KEY)
            .unwrap_or_else(|_| Validator::new(DEFAULT_KEY, builtin::validate_with_unit));
        Self {
            derived: false,
            unit: None,
            equivalencies: Vec::new(),
            fvalidate_in: ValidatorSpec::default(),
            fvalidate,
            doc: None,
            name: None,
            private_name: None,
            units: standard_system(),
        }
    }

    /// Bind to `name` on `owner_type`. Attaching again rebinds.
    pub fn attach(&mut self, owner_type: &str, name: &str) {
        tracing::debug!(owner = %owner_type, name = %name, "attached parameter");
        self.private_name = Some(private_key(name));
        self.name = Some(name.to_string());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn private_name(&self) -> Option<&str> {
        self.private_name.as_deref()
    }

    /// The attribute name, or `"<unattached>"`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unattached>")
    }

    pub fn derived(&self) -> bool {
        self.derived
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    pub fn equivalencies(&self) -> &[Equivalency] {
        &self.equivalencies
    }

    /// The resolved validator.
    pub fn fvalidate(&self) -> &Validator {
        &self.fvalidate
    }

    /// The validator as it was declared.
    pub fn fvalidate_spec(&self) -> &ValidatorSpec {
        &self.fvalidate_in
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn unit_system(&self) -> &dyn UnitSystem {
        self.units.as_ref()
    }

    /// The parameter itself without an owner, the stored value with one.
    pub fn access<'a>(&'a self, owner: Option<&'a dyn ParamOwner>) -> Result<Access<'a>> {
        match owner {
            None => Ok(Access::Parameter(self)),
            Some(owner) => self.get(owner).map(Access::Value),
        }
    }

    /// The value stored on `owner`.
    pub fn get<'o>(&self, owner: &'o dyn ParamOwner) -> Result<&'o ParamValue> {
        let key = self.private_name.as_deref().ok_or(ParamError::NotAttached)?;
        owner
            .slots()
            .get(key)
            .ok_or_else(|| ParamError::UnboundAttribute(self.display_name().to_string()))
    }

    /// Validate `raw` and store it on `owner`. Fails if a value is already set.
    pub fn set(&self, owner: &dyn ParamOwner, raw: impl Into<ParamValue>) -> Result<()> {
        let key = self.private_name.as_deref().ok_or(ParamError::NotAttached)?;
        let slots = owner.slots();
        if !slots.has_slot(key) {
            return Err(ParamError::UnknownAttribute {
                owner: owner.owner_name().to_string(),
                name: self.display_name().to_string(),
            });
        }
        if slots.contains(key) {
            return Err(self.already_set());
        }

        let mut value = self.validate(owner, raw.into())?;
        value.freeze();

        // a concurrent set may have filled the cell while validating
        slots.fill(key, value).map_err(|_| self.already_set())?;
        tracing::debug!(
            owner = %owner.owner_name(),
            name = %self.display_name(),
            "stored parameter value"
        );
        Ok(())
    }

    fn already_set(&self) -> ParamError {
        ParamError::AttributeAlreadySet(self.display_name().to_string())
    }

    /// Run the validator on `value`, as `fvalidate(owner, self, value)`.
    pub fn validate(&self, owner: &dyn ParamOwner, value: ParamValue) -> Result<ParamValue> {
        tracing::trace!(
            name = %self.display_name(),
            validator = %self.fvalidate.name(),
            kind = value.kind(),
            "validating"
        );
        Ok(self.fvalidate.call(owner, self, value)?)
    }

    /// Builder preloaded with this parameter's declared fields.
    pub fn to_builder(&self) -> ParameterBuilder {
        ParameterBuilder {
            derived: self.derived,
            unit: self.unit.clone().into(),
            equivalencies: self.equivalencies.clone(),
            fvalidate: self.fvalidate_in.clone(),
            doc: self.doc.clone(),
            units: Arc::clone(&self.units),
        }
    }

    /// A copy with `overrides` applied to the declared fields.
    ///
    /// The attachment name carries over.
    pub fn clone_with<F>(&self, overrides: F) -> Result<Parameter>
    where
        F: FnOnce(ParameterBuilder) -> ParameterBuilder,
    {
        let mut cloned = overrides(self.to_builder()).build()?;
        cloned.name = self.name.clone();
        cloned.private_name = self.private_name.clone();
        Ok(cloned)
    }

    /// A copy with nothing overridden.
    pub fn duplicate(&self) -> Result<Parameter> {
        self.clone_with(|builder| builder)
    }

    /// A copy that validates with `validator`.
    pub fn validator(&self, validator: Validator) -> Result<Parameter> {
        self.clone_with(|builder| builder.fvalidate(validator))
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.derived == other.derived
            && self.unit == other.unit
            && self.equivalencies == other.equivalencies
            && self.fvalidate_in == other.fvalidate_in
            && self.doc == other.doc
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter(derived={}, unit=", self.derived)?;
        match &self.unit {
            None => write!(f, "None")?,
            Some(unit) if unit.is_dimensionless() && unit.symbol().is_empty() => {
                write!(f, "Unit(dimensionless)")?
            }
            Some(unit) => write!(f, "Unit({:?})", unit.symbol())?,
        }
        let equivalencies: Vec<&str> = self.equivalencies.iter().map(Equivalency::name).collect();
        write!(
            f,
            ", equivalencies=[{}], fvalidate={}, doc=",
            equivalencies.join(", "),
            self.fvalidate_in
        )?;
        match &self.doc {
            None => write!(f, "None")?,
            Some(doc) => write!(f, "{doc:?}")?,
        }
        write!(f, ")")
    }
}
