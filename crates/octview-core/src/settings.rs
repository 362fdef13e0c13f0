use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{DispatchReport, ListenerId, ListenerResult, ListenerSet};

/// The value of a single named setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// An enumerated mode, stored by its canonical name.
    Enum(String),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Bool(_) => SettingKind::Bool,
            SettingValue::Int(_) => SettingKind::Int,
            SettingValue::Float(_) => SettingKind::Float,
            SettingValue::Enum(_) => SettingKind::Enum,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            SettingValue::Enum(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Int(value as i64)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Enum(value.to_string())
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Int(i) => write!(f, "{}", i),
            SettingValue::Float(v) => write!(f, "{}", v),
            SettingValue::Enum(s) => f.write_str(s),
        }
    }
}

/// Type tag of a [`SettingValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingKind {
    Bool,
    Int,
    Float,
    Enum,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingKind::Bool => "bool",
            SettingKind::Int => "int",
            SettingKind::Float => "float",
            SettingKind::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// One field mutation, as delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub group: String,
    pub field: String,
    pub old: SettingValue,
    pub new: SettingValue,
}

/// Events emitted by a [`SettingGroup`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingEvent {
    FieldChanged(FieldChange),
}

impl SettingEvent {
    /// Name of the field the event refers to.
    pub fn field(&self) -> &str {
        match self {
            SettingEvent::FieldChanged(change) => &change.field,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Unknown setting '{field}' in group '{group}'")]
    InvalidField { group: String, field: String },

    #[error("Setting '{group}.{field}' holds {expected} values, got {got}")]
    TypeMismatch {
        group: String,
        field: String,
        expected: SettingKind,
        got: SettingKind,
    },
}

#[derive(Debug, Clone)]
struct Field {
    default: SettingValue,
    value: SettingValue,
}

/// A fixed set of named, typed, individually observable settings.
///
/// Fields are declared up front with their defaults. Every successful
/// [`set`](Self::set) notifies all listeners synchronously with the old and
/// new value, including when the value did not actually change.
#[derive(Debug)]
pub struct SettingGroup {
    name: String,
    /// Declaration order, used by `field_names` and `reset_to_defaults`.
    order: Vec<String>,
    fields: RefCell<HashMap<String, Field>>,
    listeners: ListenerSet<SettingEvent>,
}

impl SettingGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            order: Vec::new(),
            fields: RefCell::new(HashMap::new()),
            listeners: ListenerSet::new(),
        }
    }

    /// Declare a field with its default value. Redeclaring a field replaces its default.
    pub fn with_field(mut self, field: &str, default: impl Into<SettingValue>) -> Self {
        let default = default.into();
        let previous = self.fields.get_mut().insert(
            field.to_string(),
            Field {
                default: default.clone(),
                value: default,
            },
        );
        if previous.is_none() {
            self.order.push(field.to_string());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.borrow().contains_key(field)
    }

    pub fn get(&self, field: &str) -> Result<SettingValue, SettingsError> {
        self.fields
            .borrow()
            .get(field)
            .map(|f| f.value.clone())
            .ok_or_else(|| self.invalid_field(field))
    }

    pub fn default_value(&self, field: &str) -> Result<SettingValue, SettingsError> {
        self.fields
            .borrow()
            .get(field)
            .map(|f| f.default.clone())
            .ok_or_else(|| self.invalid_field(field))
    }

    pub fn get_bool(&self, field: &str) -> Result<bool, SettingsError> {
        let value = self.get(field)?;
        value
            .as_bool()
            .ok_or_else(|| self.type_mismatch(field, SettingKind::Bool, value.kind()))
    }

    pub fn get_int(&self, field: &str) -> Result<i64, SettingsError> {
        let value = self.get(field)?;
        value
            .as_int()
            .ok_or_else(|| self.type_mismatch(field, SettingKind::Int, value.kind()))
    }

    pub fn get_float(&self, field: &str) -> Result<f64, SettingsError> {
        let value = self.get(field)?;
        value
            .as_float()
            .ok_or_else(|| self.type_mismatch(field, SettingKind::Float, value.kind()))
    }

    pub fn get_enum(&self, field: &str) -> Result<String, SettingsError> {
        let value = self.get(field)?;
        match value {
            SettingValue::Enum(s) => Ok(s),
            other => Err(self.type_mismatch(field, SettingKind::Enum, other.kind())),
        }
    }

    /// Store a new value and notify every listener with `(field, old, new)`.
    ///
    /// Fails with [`SettingsError::InvalidField`] for an undeclared field and
    /// [`SettingsError::TypeMismatch`] when the value kind differs from the
    /// declared default; neither failure touches other fields or listeners.
    /// Listener failures do not undo the store; they are returned in the report.
    pub fn set(
        &self,
        field: &str,
        value: impl Into<SettingValue>,
    ) -> Result<DispatchReport, SettingsError> {
        let value = value.into();
        let old = {
            let mut fields = self.fields.borrow_mut();
            let slot = fields.get_mut(field).ok_or_else(|| self.invalid_field(field))?;
            if slot.default.kind() != value.kind() {
                return Err(self.type_mismatch(field, slot.default.kind(), value.kind()));
            }
            std::mem::replace(&mut slot.value, value.clone())
        };

        debug!("{}.{}: {} -> {}", self.name, field, old, value);
        let event = SettingEvent::FieldChanged(FieldChange {
            group: self.name.clone(),
            field: field.to_string(),
            old,
            new: value,
        });
        Ok(self.listeners.dispatch(&event))
    }

    /// Set every field back to its declared default, one `set` per field.
    pub fn reset_to_defaults(&self) -> DispatchReport {
        let mut report = DispatchReport::default();
        for field in &self.order {
            let default = self.fields.borrow()[field].default.clone();
            // Declared fields always accept their own default.
            if let Ok(r) = self.set(field, default) {
                report.merge(r);
            }
        }
        report
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SettingEvent) -> ListenerResult + 'static,
    {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Current values keyed by field name.
    pub fn snapshot(&self) -> BTreeMap<String, SettingValue> {
        self.fields
            .borrow()
            .iter()
            .map(|(name, f)| (name.clone(), f.value.clone()))
            .collect()
    }

    fn invalid_field(&self, field: &str) -> SettingsError {
        SettingsError::InvalidField {
            group: self.name.clone(),
            field: field.to_string(),
        }
    }

    fn type_mismatch(&self, field: &str, expected: SettingKind, got: SettingKind) -> SettingsError {
        SettingsError::TypeMismatch {
            group: self.name.clone(),
            field: field.to_string(),
            expected,
            got,
        }
    }
}
