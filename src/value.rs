use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;

use ordered_float::OrderedFloat;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scalar produced by definitions, propositions and entity attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "a boolean",
            Self::Int(_) => "an integer",
            Self::Float(_) => "a float",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view of the value. Booleans read as `0.0` and `1.0`.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Bool(value) => f64::from(u8::from(*value)),
            Self::Int(value) => *value as f64,
            Self::Float(value) => value.into_inner(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(OrderedFloat(value))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
        }
    }
}

/// A scenario object whose attributes can be read by rules.
///
/// Implementations are read-only views: the driving loop owns the object and mutates it between
/// ticks, while tables only ever look.
pub trait Entity {
    fn attribute(&self, name: &str) -> Option<Value>;
}

impl<T> Entity for &T
where
    T: Entity + ?Sized,
{
    fn attribute(&self, name: &str) -> Option<Value> {
        (**self).attribute(name)
    }
}

impl<T> Entity for Box<T>
where
    T: Entity + ?Sized,
{
    fn attribute(&self, name: &str) -> Option<Value> {
        (**self).attribute(name)
    }
}

impl<T> Entity for Rc<T>
where
    T: Entity + ?Sized,
{
    fn attribute(&self, name: &str) -> Option<Value> {
        (**self).attribute(name)
    }
}

impl<T> Entity for RefCell<T>
where
    T: Entity + ?Sized,
{
    fn attribute(&self, name: &str) -> Option<Value> {
        self.borrow().attribute(name)
    }
}

impl<K, S> Entity for HashMap<K, Value, S>
where
    K: Borrow<str> + Hash + Eq,
    S: BuildHasher,
{
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).copied()
    }
}

impl<K> Entity for BTreeMap<K, Value>
where
    K: Borrow<str> + Ord,
{
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).copied()
    }
}

/// Named entities shared between the driving loop and the rule tables.
#[derive(Clone, Default)]
pub struct Objects {
    entries: BTreeMap<String, Rc<dyn Entity>>,
}

impl Objects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, entity: Rc<dyn Entity>) -> Self {
        self.insert(name, entity);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, entity: Rc<dyn Entity>) -> Option<Rc<dyn Entity>> {
        self.entries.insert(name.into(), entity)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Entity> {
        self.entries.get(name).map(|entity| entity.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Debug for Objects {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// A single named feature of an agent, rendered as `name:value`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    pub name: String,
    pub value: Value,
}

impl Display for Feature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.value)
    }
}

/// Ordered collection of named features describing an agent's state.
///
/// # Example
///
/// ```rust
/// use ltl_rewards::{Entity, Features, Value};
///
/// let mut features = Features::from_iter([("x", Value::from(1.5)), ("v", Value::from(0.0))]);
/// features.set("v", 2.0);
///
/// assert_eq!(features.attribute("v"), Some(Value::from(2.0)));
/// assert_eq!(features.to_string(), "x:1.5, v:2");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    features: Vec<Feature>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.feature(name).map(|feature| feature.value)
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|feature| feature.name == name)
    }

    /// Update a feature in place, appending it if it is not yet present.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();

        match self.features.iter_mut().find(|feature| feature.name == name) {
            Some(feature) => feature.value = value,
            None => self.features.push(Feature {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for Features
where
    N: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut features = Features::new();

        for (name, value) in iter {
            let name: String = name.into();
            features.set(&name, value);
        }

        features
    }
}

impl<'a> IntoIterator for &'a Features {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Features {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, feature) in self.features.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }

            write!(f, "{}", feature)?;
        }

        Ok(())
    }
}

impl Entity for Features {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::{Entity, Features, Objects, Value};

    #[test]
    fn numeric_views() {
        assert_eq!(Value::from(true).as_f64(), 1.0);
        assert_eq!(Value::from(3).as_f64(), 3.0);
        assert_eq!(Value::from(2.5).as_f64(), 2.5);
        assert_eq!(Value::from(3).as_i64(), Some(3));
        assert_eq!(Value::from(2.5).as_i64(), None);
        assert_eq!(Value::from(false).as_bool(), Some(false));
    }

    #[test]
    fn shared_objects_see_updates() {
        let car = Rc::new(RefCell::new(Features::from_iter([("x", 0.0)])));
        let objects = Objects::new().with("ego", car.clone());

        car.borrow_mut().set("x", 4.0);

        let ego = objects.get("ego").map(|entity| entity.attribute("x"));
        assert_eq!(ego, Some(Some(Value::from(4.0))));
        assert!(objects.get("other").is_none());
    }

    #[test]
    fn maps_are_entities() {
        let attributes = HashMap::from([("zz".to_string(), Value::from(20))]);

        assert_eq!(attributes.attribute("zz"), Some(Value::from(20)));
        assert_eq!(attributes.attribute("yy"), None);
    }

    #[test]
    fn features_keep_order() {
        let mut features = Features::from_iter([("x", Value::from(1.2)), ("y", Value::from(3))]);
        features.set("heading", 0.5);
        features.set("x", 1.5);

        let names = features.iter().map(|f| f.name.as_str()).collect::<Vec<_>>();

        assert_eq!(names, vec!["x", "y", "heading"]);
        assert_eq!(features.to_string(), "x:1.5, y:3, heading:0.5");
    }
}
