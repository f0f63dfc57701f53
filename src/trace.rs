use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::{Index, RangeBounds};

use crate::Tick;

/// Sequence of values indexed by the tick at which they were observed.
///
/// Ticks need not be contiguous; iteration always proceeds in increasing tick order.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Trace<T> {
    elements: BTreeMap<Tick, T>,
}

impl<T> Trace<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tick: Tick) -> Option<&T> {
        self.elements.get(&tick)
    }

    pub fn insert(&mut self, tick: Tick, value: T) -> Option<T> {
        self.elements.insert(tick, value)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The latest tick and its value.
    pub fn last(&self) -> Option<(Tick, &T)> {
        self.elements.iter().next_back().map(|(tick, value)| (*tick, value))
    }

    pub fn range<R>(&self, bounds: R) -> Trace<&T>
    where
        R: RangeBounds<Tick>,
    {
        let elements = self
            .elements
            .range(bounds)
            .map(|(tick, value)| (*tick, value))
            .collect();

        Trace { elements }
    }

    /// Apply `f` to every value, keeping the ticks.
    pub fn map<U, F>(self, mut f: F) -> Trace<U>
    where
        F: FnMut(T) -> U,
    {
        let elements = self
            .elements
            .into_iter()
            .map(|(tick, value)| (tick, f(value)))
            .collect();

        Trace { elements }
    }

    pub fn ticks(&self) -> impl DoubleEndedIterator<Item = Tick> + '_ {
        self.elements.keys().copied()
    }

    pub fn values(&self) -> btree_map::Values<'_, Tick, T> {
        self.elements.values()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.into_iter()
    }
}

impl<T> Index<Tick> for Trace<T> {
    type Output = T;

    fn index(&self, index: Tick) -> &Self::Output {
        self.elements.index(&index)
    }
}

pub struct Iter<'a, T> {
    values: btree_map::Iter<'a, Tick, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Tick, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.values.next().map(|(tick, value)| (*tick, value))
    }
}

impl<'a, T> IntoIterator for &'a Trace<T> {
    type Item = (Tick, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            values: self.elements.iter(),
        }
    }
}

impl<T> IntoIterator for Trace<T> {
    type Item = (Tick, T);
    type IntoIter = btree_map::IntoIter<Tick, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<T> FromIterator<(Tick, T)> for Trace<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (Tick, T)>,
    {
        Self {
            elements: BTreeMap::from_iter(iter),
        }
    }
}

impl<T> Extend<(Tick, T)> for Trace<T> {
    fn extend<I: IntoIterator<Item = (Tick, T)>>(&mut self, iter: I) {
        self.elements.extend(iter)
    }
}

impl<T> Default for Trace<T> {
    fn default() -> Self {
        Self {
            elements: BTreeMap::default(),
        }
    }
}
