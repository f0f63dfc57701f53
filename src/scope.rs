use std::collections::BTreeMap;

use crate::error::EvalError;
use crate::value::{Entity, Objects, Value};

/// A named value produced by a table.
pub type Entry = (String, Value);

/// Read-only view over everything a rule is allowed to see.
///
/// Lookups search the entries of the table being evaluated first (only those computed earlier in
/// the same tick), then the entries of the table it builds on, then the bound objects.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    objects: Option<&'a Objects>,
    outer: &'a [Entry],
    inner: &'a [Entry],
}

fn find<'e>(entries: &'e [Entry], name: &str) -> Option<&'e Value> {
    entries.iter().find(|(entry, _)| entry == name).map(|(_, value)| value)
}

impl<'a> Scope<'a> {
    pub(crate) fn new(objects: Option<&'a Objects>, outer: &'a [Entry], inner: &'a [Entry]) -> Self {
        Self { objects, outer, inner }
    }

    /// A scope that only exposes objects.
    pub fn of_objects(objects: &'a Objects) -> Self {
        Self::new(Some(objects), &[], &[])
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        find(self.inner, name).or_else(|| find(self.outer, name)).copied()
    }

    pub fn value(&self, name: &str) -> Result<Value, EvalError> {
        self.get(name).ok_or_else(|| EvalError::UnknownName(name.to_string()))
    }

    pub fn flag(&self, name: &str) -> Result<bool, EvalError> {
        let value = self.value(name)?;

        value.as_bool().ok_or_else(|| EvalError::TypeMismatch {
            name: name.to_string(),
            expected: "a boolean",
            found: value.type_name(),
        })
    }

    pub fn integer(&self, name: &str) -> Result<i64, EvalError> {
        let value = self.value(name)?;

        value.as_i64().ok_or_else(|| EvalError::TypeMismatch {
            name: name.to_string(),
            expected: "an integer",
            found: value.type_name(),
        })
    }

    /// Numeric value of `name`; booleans count as `0` or `1`.
    pub fn number(&self, name: &str) -> Result<f64, EvalError> {
        self.value(name).map(|value| value.as_f64())
    }

    pub fn object(&self, name: &str) -> Result<&'a dyn Entity, EvalError> {
        self.objects
            .and_then(|objects| objects.get(name))
            .ok_or_else(|| EvalError::UnknownObject(name.to_string()))
    }

    pub fn attribute(&self, object: &str, attribute: &str) -> Result<Value, EvalError> {
        self.object(object)?
            .attribute(attribute)
            .ok_or_else(|| EvalError::UnknownAttribute {
                object: object.to_string(),
                attribute: attribute.to_string(),
            })
    }

    /// Every visible table entry, inner values shadowing outer ones.
    pub fn entries(&self) -> BTreeMap<String, Value> {
        self.outer.iter().chain(self.inner.iter()).cloned().collect()
    }
}
