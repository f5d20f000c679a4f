//! # Owner Types
//!
//! Parameters are declared on an owner type and store their validated values
//! on the owner's instances.
//!
//! - [`Slots`]: per-instance storage, one write-once cell per declared
//!   attribute, keyed by the parameter's private name
//! - [`ParamOwner`]: what a parameter (and every validator) sees of an instance
//! - [`OwnerType`]: the declaration hook. Declaring a parameter attaches it
//!   under the attribute name, in declaration order
//! - [`Instance`]: a ready-made owner with `get`/`set` by attribute name
//!
//! ```ignore
//! let cosmo = Arc::new(
//!     OwnerType::new("Cosmo")
//!         .declare("H0", Parameter::builder().unit("km/s/Mpc").build()?)
//!         .declare("Om0", Parameter::builder().fvalidate("non-negative").build()?),
//! );
//! let c = Instance::new(cosmo);
//! c.set("H0", 70.0)?;
//! ```
//!
//! Any type can own parameters by embedding [`Slots`] and implementing
//! [`ParamOwner`]; `OwnerType`/`Instance` are only needed when the schema is
//! built at runtime.
//!
//! Slots only hand out shared references. A cell is filled at most once and
//! there is no way to empty, overwrite or replace it, so write-once holds
//! even when several threads set the same attribute.

use crate::error::{ParamError, Result};
use crate::parameter::Parameter;
use crate::value::ParamValue;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Slot key for the attribute `name`.
pub fn private_key(name: &str) -> String {
    format!("_{name}")
}

/// Write-once value storage for one owner instance.
///
/// The set of cells is fixed at construction. Values only enter through
/// [`Parameter::set`], which fills an empty cell and never overwrites.
#[derive(Debug, Default)]
pub struct Slots {
    cells: BTreeMap<String, OnceCell<ParamValue>>,
}

impl Slots {
    /// Slots with no cells, for owners without parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// One empty cell per attribute name.
    pub fn with_attributes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cells = names
            .into_iter()
            .map(|name| (private_key(name.as_ref()), OnceCell::new()))
            .collect();
        Self { cells }
    }

    /// Whether there is a cell for the slot key, filled or not.
    pub fn has_slot(&self, key: &str) -> bool {
        self.cells.contains_key(key)
    }

    /// Whether the cell for the slot key holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Value stored under a slot key.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.cells.get(key).and_then(OnceCell::get)
    }

    /// Value stored for an attribute name, e.g. `value_of("Om0")`.
    pub fn value_of(&self, name: &str) -> Option<&ParamValue> {
        self.get(&private_key(name))
    }

    /// Number of filled cells.
    pub fn len(&self) -> usize {
        self.cells.values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill the cell for `key`. Hands the value back if there is no such
    /// cell or it is already filled.
    pub(crate) fn fill(&self, key: &str, value: ParamValue) -> std::result::Result<(), ParamValue> {
        match self.cells.get(key) {
            Some(cell) => cell.set(value),
            None => Err(value),
        }
    }
}

/// An instance that parameters can store values on.
pub trait ParamOwner {
    fn slots(&self) -> &Slots;

    /// Name of the owner type, for logs and errors.
    fn owner_name(&self) -> &str {
        "<anonymous>"
    }
}

impl ParamOwner for Slots {
    fn slots(&self) -> &Slots {
        self
    }
}

/// A named owner type and the parameters declared on it.
#[derive(Debug)]
pub struct OwnerType {
    name: String,
    params: Vec<Parameter>,
}

impl OwnerType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Declare `param` as the attribute `attr`, attaching it.
    ///
    /// Declaring an existing attribute again replaces the earlier parameter.
    pub fn declare(mut self, attr: &str, mut param: Parameter) -> Self {
        param.attach(&self.name, attr);
        match self.params.iter_mut().find(|p| p.name() == Some(attr)) {
            Some(existing) => *existing = param,
            None => self.params.push(param),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter declared as `attr`.
    pub fn parameter(&self, attr: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == Some(attr))
    }

    /// Empty slots for every declared attribute.
    pub fn new_slots(&self) -> Slots {
        Slots::with_attributes(self.params.iter().filter_map(Parameter::name))
    }

    fn require(&self, attr: &str) -> Result<&Parameter> {
        self.parameter(attr)
            .ok_or_else(|| ParamError::UnknownAttribute {
                owner: self.name.clone(),
                name: attr.to_string(),
            })
    }
}

/// An instance of an [`OwnerType`].
#[derive(Debug)]
pub struct Instance {
    owner_type: Arc<OwnerType>,
    slots: Slots,
}

impl Instance {
    pub fn new(owner_type: Arc<OwnerType>) -> Self {
        let slots = owner_type.new_slots();
        Self { owner_type, slots }
    }

    pub fn owner_type(&self) -> &OwnerType {
        &self.owner_type
    }

    /// Validate and store `value` for `attr`. Works once per attribute.
    pub fn set(&self, attr: &str, value: impl Into<ParamValue>) -> Result<()> {
        self.owner_type.require(attr)?.set(self, value)
    }

    pub fn get(&self, attr: &str) -> Result<&ParamValue> {
        self.owner_type.require(attr)?.get(self)
    }
}

impl ParamOwner for Instance {
    fn slots(&self) -> &Slots {
        &self.slots
    }

    fn owner_name(&self) -> &str {
        self.owner_type.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosmo() -> Arc<OwnerType> {
        Arc::new(
            OwnerType::new("Cosmo")
                .declare("Om0", Parameter::new())
                .declare("Ode0", Parameter::builder().derived(true).build().unwrap()),
        )
    }

    #[test]
    fn private_key_prefixes_underscore() {
        assert_eq!(private_key("H0"), "_H0");
    }

    #[test]
    fn declare_attaches_in_order() {
        let owner = cosmo();
        let om0 = owner.parameter("Om0").unwrap();
        assert_eq!(om0.name(), Some("Om0"));
        assert_eq!(om0.private_name(), Some("_Om0"));
        assert!(owner.parameter("Ode0").unwrap().derived());
    }

    #[test]
    fn redeclaring_replaces_parameter() {
        let owner = OwnerType::new("Cosmo")
            .declare("Om0", Parameter::new())
            .declare("Om0", Parameter::builder().derived(true).build().unwrap());
        assert!(owner.parameter("Om0").unwrap().derived());
    }

    #[test]
    fn instance_set_and_get() {
        let c = Instance::new(cosmo());
        c.set("Om0", 0.3).unwrap();
        assert_eq!(c.get("Om0").unwrap(), &ParamValue::Float(0.3));
        assert_eq!(c.slots().value_of("Om0"), Some(&ParamValue::Float(0.3)));
    }

    #[test]
    fn instance_rejects_unknown_attribute() {
        let c = Instance::new(cosmo());
        let err = c.set("w0", -1.0).unwrap_err();
        assert!(matches!(
            err,
            ParamError::UnknownAttribute { ref owner, ref name } if owner == "Cosmo" && name == "w0"
        ));
        assert!(c.get("w0").is_err());
    }

    #[test]
    fn instances_do_not_share_slots() {
        let owner = cosmo();
        let a = Instance::new(Arc::clone(&owner));
        let b = Instance::new(owner);
        a.set("Om0", 0.3).unwrap();
        assert!(matches!(b.get("Om0"), Err(ParamError::UnboundAttribute(_))));
    }

    #[test]
    fn slots_have_one_cell_per_declared_attribute() {
        let slots = cosmo().new_slots();
        assert!(slots.has_slot("_Om0"));
        assert!(slots.has_slot("_Ode0"));
        assert!(!slots.has_slot("_w0"));
        assert!(slots.is_empty());
    }

    #[test]
    fn fill_never_overwrites() {
        let slots = Slots::with_attributes(["Om0"]);
        assert!(slots.fill("_Om0", ParamValue::Float(0.3)).is_ok());
        assert_eq!(
            slots.fill("_Om0", ParamValue::Float(0.4)),
            Err(ParamValue::Float(0.4))
        );
        assert_eq!(slots.fill("_w0", ParamValue::Float(-1.0)), Err(ParamValue::Float(-1.0)));
        assert_eq!(slots.value_of("Om0"), Some(&ParamValue::Float(0.3)));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn stored_values_survive_every_later_set() {
        let c = Instance::new(cosmo());
        c.set("Om0", 0.3).unwrap();

        // the only handle on the storage is a shared reference
        let slots: &Slots = c.slots();
        let param = c.owner_type().parameter("Om0").unwrap();
        assert!(matches!(param.set(slots, 0.4), Err(ParamError::AttributeAlreadySet(_))));
        assert!(matches!(c.set("Om0", 0.5), Err(ParamError::AttributeAlreadySet(_))));
        assert_eq!(c.get("Om0").unwrap(), &ParamValue::Float(0.3));
    }

    #[test]
    fn concurrent_sets_store_exactly_one_value() {
        let c = Instance::new(cosmo());
        let stored: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let c = &c;
                    scope.spawn(move || c.set("Om0", f64::from(i) / 10.0).is_ok())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(stored.iter().filter(|ok| **ok).count(), 1);
        assert!(c.get("Om0").is_ok());
    }

    #[test]
    fn instance_reports_owner_name() {
        let c = Instance::new(cosmo());
        assert_eq!(c.owner_name(), "Cosmo");
        assert_eq!(Slots::new().owner_name(), "<anonymous>");
    }
}
