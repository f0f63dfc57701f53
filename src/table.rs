use std::collections::{BTreeMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::ops::Range;

use log::trace;

use crate::bits::Bits;
use crate::error::{ConfigError, EvalError};
use crate::parser::Alphabet;
use crate::scope::{Entry, Scope};
use crate::trace::Trace;
use crate::value::{Objects, Value};
use crate::Tick;

/// Boxed rule body evaluated once per tick.
pub type RuleFn<T> = Box<dyn Fn(&Scope<'_>, Tick) -> Result<T, EvalError>>;

/// How a named table entry obtains its value at each tick.
pub enum Rule<T> {
    Constant(T),
    Computed(RuleFn<T>),
}

impl<T> Rule<T> {
    pub fn constant(value: impl Into<T>) -> Self {
        Self::Constant(value.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Scope<'_>, Tick) -> Result<T, EvalError> + 'static,
    {
        Self::Computed(Box::new(f))
    }

    pub fn evaluate(&self, scope: &Scope<'_>, tick: Tick) -> Result<T, EvalError>
    where
        T: Clone,
    {
        match self {
            Self::Constant(value) => Ok(value.clone()),
            Self::Computed(f) => f(scope, tick),
        }
    }
}

impl<T> From<T> for Rule<T> {
    fn from(value: T) -> Self {
        Self::Constant(value)
    }
}

impl<T: Debug> Debug for Rule<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Ordered list of uniquely named rules, evaluated front to back.
struct Table<T> {
    kind: &'static str,
    names: Vec<String>,
    rules: Vec<Rule<T>>,
}

impl<T> Table<T>
where
    T: Clone + Into<Value>,
{
    fn new<I, N>(kind: &'static str, rules: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, Rule<T>)>,
        N: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut table = Self {
            kind,
            names: Vec::new(),
            rules: Vec::new(),
        };

        for (name, rule) in rules {
            let name = name.into();

            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateName { table: kind, name });
            }

            table.names.push(name);
            table.rules.push(rule);
        }

        Ok(table)
    }

    fn reject_names<'n>(&self, mut taken: impl Iterator<Item = &'n str>) -> Result<(), ConfigError> {
        match taken.find(|name| self.names.iter().any(|own| own.as_str() == *name)) {
            Some(name) => Err(ConfigError::DuplicateName {
                table: self.kind,
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Evaluate every rule in order. Each rule sees the entries computed before it.
    fn evaluate(&self, objects: &Objects, outer: &[Entry], tick: Tick) -> Result<Vec<(String, T)>, EvalError> {
        let mut entries: Vec<Entry> = Vec::with_capacity(self.rules.len());
        let mut values = Vec::with_capacity(self.rules.len());

        for (name, rule) in self.names.iter().zip(&self.rules) {
            let scope = Scope::new(Some(objects), outer, &entries);
            let value = rule.evaluate(&scope, tick).map_err(|source| EvalError::Rule {
                name: name.clone(),
                tick,
                source: Box::new(source),
            })?;

            entries.push((name.clone(), value.clone().into()));
            values.push((name.clone(), value));
        }

        trace!("evaluated {} {} at tick {}", values.len(), self.kind, tick);
        Ok(values)
    }
}

/// Sequentially evaluated named values recomputed once per tick.
pub struct Definitions {
    table: Table<Value>,
    objects: Objects,
    tick: Tick,
    entries: Vec<Entry>,
}

impl Definitions {
    /// Build the table and evaluate it at tick zero.
    ///
    /// Fails if names repeat, collide with an object, or if any rule references something that is
    /// not declared before it.
    pub fn new<I, N>(definitions: I, objects: Objects) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, Rule<Value>)>,
        N: Into<String>,
    {
        let table = Table::new("definitions", definitions)?;
        table.reject_names(objects.names())?;

        let mut definitions = Self {
            table,
            objects,
            tick: 0,
            entries: Vec::new(),
        };

        definitions.reset().map_err(ConfigError::Initial)?;
        Ok(definitions)
    }

    fn evaluate(&mut self, tick: Tick) -> Result<(), EvalError> {
        self.entries = self.table.evaluate(&self.objects, &[], tick)?;
        self.tick = tick;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), EvalError> {
        self.evaluate(0)
    }

    pub fn step(&mut self) -> Result<(), EvalError> {
        self.evaluate(self.tick + 1)
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.scope().get(name)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.names.iter().map(String::as_str)
    }

    pub fn objects(&self) -> &Objects {
        &self.objects
    }

    pub fn scope(&self) -> Scope<'_> {
        Scope::new(Some(&self.objects), &[], &self.entries)
    }

    /// Snapshot of the current values keyed by name.
    pub fn get_dict(&self) -> BTreeMap<String, Value> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.table.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.names.is_empty()
    }
}

impl Debug for Definitions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Definitions")
            .field("tick", &self.tick)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Named boolean rules whose values at one tick are packed into [`Bits`].
///
/// Each proposition may read the objects, every definition and any proposition declared before
/// it.
pub struct Propositions {
    table: Table<bool>,
    objects: Objects,
    alphabet: Alphabet,
    tick: Tick,
    entries: Vec<Entry>,
    bits: Bits,
}

impl Propositions {
    /// Build the table and evaluate it at tick zero on top of `definitions`.
    pub fn new<I, N>(propositions: I, definitions: &Definitions) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, Rule<bool>)>,
        N: Into<String>,
    {
        let table = Table::new("propositions", propositions)?;

        if table.names.len() > Bits::CAPACITY {
            return Err(ConfigError::TooManyPropositions {
                count: table.names.len(),
                capacity: Bits::CAPACITY,
            });
        }

        table.reject_names(definitions.objects().names())?;
        table.reject_names(definitions.names())?;

        let mut propositions = Self {
            alphabet: table.names.iter().cloned().collect(),
            table,
            objects: definitions.objects().clone(),
            tick: 0,
            entries: Vec::new(),
            bits: Bits::new(),
        };

        propositions.reset(definitions).map_err(ConfigError::Initial)?;
        Ok(propositions)
    }

    fn evaluate(&mut self, tick: Tick, definitions: &Definitions) -> Result<(), EvalError> {
        if definitions.tick() != tick {
            return Err(EvalError::OutOfSync {
                definitions: definitions.tick(),
                propositions: tick,
            });
        }

        let values = self.table.evaluate(&self.objects, definitions.entries(), tick)?;

        self.bits = values.iter().map(|(_, value)| *value).collect();
        self.entries = values.into_iter().map(|(name, value)| (name, Value::from(value))).collect();
        self.tick = tick;
        Ok(())
    }

    /// Re-evaluate at tick zero. `definitions` must already be reset.
    pub fn reset(&mut self, definitions: &Definitions) -> Result<(), EvalError> {
        self.evaluate(0, definitions)
    }

    /// Advance one tick. `definitions` must already have been stepped.
    pub fn step(&mut self, definitions: &Definitions) -> Result<(), EvalError> {
        self.evaluate(self.tick + 1, definitions)
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn bits(&self) -> Bits {
        self.bits
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.alphabet.index_of(name).map(|index| self.bits.get(index))
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get_dict(&self) -> BTreeMap<String, bool> {
        self.alphabet
            .names()
            .zip(self.bits.iter(self.alphabet.len()))
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.alphabet.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphabet.is_empty()
    }
}

impl Debug for Propositions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Propositions")
            .field("tick", &self.tick)
            .field("values", &self.get_dict())
            .finish()
    }
}

/// Boxed clock rule: the truth of a proposition as a function of the tick alone.
pub type ClockFn = Box<dyn Fn(Tick) -> bool>;

/// Propositions driven only by the tick counter.
///
/// Useful for replaying scripted scenarios where no objects or definitions exist.
pub struct ClockedPropositions {
    alphabet: Alphabet,
    rules: Vec<ClockFn>,
    tick: Tick,
    bits: Bits,
    entries: Vec<Entry>,
}

impl ClockedPropositions {
    pub fn new<I, N, F>(propositions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, F)>,
        N: Into<String>,
        F: Fn(Tick) -> bool + 'static,
    {
        let mut alphabet = Alphabet::new();
        let mut rules: Vec<ClockFn> = Vec::new();

        for (name, rule) in propositions {
            let name = name.into();

            if alphabet.index_of(&name).is_some() {
                return Err(ConfigError::DuplicateName {
                    table: "propositions",
                    name,
                });
            }

            alphabet.push(name);
            rules.push(Box::new(rule));
        }

        if rules.len() > Bits::CAPACITY {
            return Err(ConfigError::TooManyPropositions {
                count: rules.len(),
                capacity: Bits::CAPACITY,
            });
        }

        let mut clocked = Self {
            alphabet,
            rules,
            tick: 0,
            bits: Bits::new(),
            entries: Vec::new(),
        };

        clocked.reset();
        Ok(clocked)
    }

    fn sample(&self, tick: Tick) -> Bits {
        self.rules.iter().map(|rule| rule(tick)).collect()
    }

    fn evaluate(&mut self, tick: Tick) {
        self.bits = self.sample(tick);
        self.entries = self
            .alphabet
            .names()
            .zip(self.bits.iter(self.rules.len()))
            .map(|(name, value)| (name.to_string(), Value::from(value)))
            .collect();
        self.tick = tick;
    }

    pub fn reset(&mut self) {
        self.evaluate(0);
    }

    pub fn step(&mut self) {
        self.evaluate(self.tick + 1);
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn bits(&self) -> Bits {
        self.bits
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.alphabet.index_of(name).map(|index| self.bits.get(index))
    }

    pub fn get_dict(&self) -> BTreeMap<String, bool> {
        self.alphabet
            .names()
            .zip(self.bits.iter(self.rules.len()))
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// Observations for every tick in `ticks`, leaving the current state untouched.
    pub fn trace(&self, ticks: Range<Tick>) -> Trace<Bits> {
        ticks.map(|tick| (tick, self.sample(tick))).collect()
    }
}

impl Debug for ClockedPropositions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockedPropositions")
            .field("alphabet", &self.alphabet)
            .field("tick", &self.tick)
            .field("bits", &self.bits)
            .finish()
    }
}

/// Definitions and propositions sharing one set of objects, advanced together.
#[derive(Debug)]
pub struct Pipeline {
    definitions: Definitions,
    propositions: Propositions,
}

impl Pipeline {
    pub fn new<D, P, N, M>(definitions: D, propositions: P, objects: Objects) -> Result<Self, ConfigError>
    where
        D: IntoIterator<Item = (N, Rule<Value>)>,
        P: IntoIterator<Item = (M, Rule<bool>)>,
        N: Into<String>,
        M: Into<String>,
    {
        let definitions = Definitions::new(definitions, objects)?;
        let propositions = Propositions::new(propositions, &definitions)?;

        Ok(Self {
            definitions,
            propositions,
        })
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn propositions(&self) -> &Propositions {
        &self.propositions
    }

    pub fn objects(&self) -> &Objects {
        self.definitions.objects()
    }
}

/// A source of per-tick observations that reward checkers can be driven by.
pub trait Evaluator {
    /// Return to tick zero and recompute every value.
    fn reset(&mut self) -> Result<(), EvalError>;

    /// Advance exactly one tick.
    fn step(&mut self) -> Result<(), EvalError>;

    fn tick(&self) -> Tick;

    /// Truth values of every proposition at the current tick.
    fn bits(&self) -> Bits;

    fn alphabet(&self) -> &Alphabet;

    /// Everything reward rules may read at the current tick.
    fn scope(&self) -> Scope<'_>;
}

impl Evaluator for Pipeline {
    fn reset(&mut self) -> Result<(), EvalError> {
        self.definitions.reset()?;
        self.propositions.reset(&self.definitions)
    }

    fn step(&mut self) -> Result<(), EvalError> {
        self.definitions.step()?;
        self.propositions.step(&self.definitions)
    }

    fn tick(&self) -> Tick {
        self.propositions.tick()
    }

    fn bits(&self) -> Bits {
        self.propositions.bits()
    }

    fn alphabet(&self) -> &Alphabet {
        self.propositions.alphabet()
    }

    fn scope(&self) -> Scope<'_> {
        Scope::new(
            Some(self.definitions.objects()),
            self.definitions.entries(),
            self.propositions.entries(),
        )
    }
}

impl Evaluator for ClockedPropositions {
    fn reset(&mut self) -> Result<(), EvalError> {
        ClockedPropositions::reset(self);
        Ok(())
    }

    fn step(&mut self) -> Result<(), EvalError> {
        ClockedPropositions::step(self);
        Ok(())
    }

    fn tick(&self) -> Tick {
        self.tick
    }

    fn bits(&self) -> Bits {
        self.bits
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn scope(&self) -> Scope<'_> {
        Scope::new(None, &[], &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::error::Error;
    use std::rc::Rc;

    use super::{ClockedPropositions, Definitions, Evaluator, Pipeline, Rule};
    use crate::error::{ConfigError, EvalError};
    use crate::value::{Objects, Value};
    use crate::Tick;

    fn objects() -> Objects {
        let z = HashMap::from([("zz".to_string(), Value::from(20))]);
        Objects::new().with("z", Rc::new(z))
    }

    fn sequential_pipeline() -> Result<Pipeline, ConfigError> {
        let definitions = vec![
            ("a", Rule::computed(|scope, _| scope.attribute("z", "zz"))),
            (
                "b",
                Rule::computed(|scope, t| Ok(Value::from(scope.integer("a")? + i64::from(t)))),
            ),
        ];
        let propositions = vec![
            ("c", Rule::computed(|scope, _| Ok(scope.attribute("z", "zz")? == Value::from(20)))),
            ("d", Rule::computed(|scope, _| Ok(scope.integer("b")? == 21))),
        ];

        Pipeline::new(definitions, propositions, objects())
    }

    #[test]
    fn sequential_definitions_and_propositions() -> Result<(), Box<dyn Error>> {
        let mut pipeline = sequential_pipeline()?;

        let definitions = pipeline.definitions().get_dict();
        let propositions = pipeline.propositions().get_dict();

        assert_eq!(
            definitions,
            BTreeMap::from([("a".to_string(), Value::from(20)), ("b".to_string(), Value::from(20))])
        );
        assert_eq!(
            propositions,
            BTreeMap::from([("c".to_string(), true), ("d".to_string(), false)])
        );

        pipeline.step()?;

        assert_eq!(pipeline.tick(), 1);
        assert_eq!(pipeline.definitions().get("b"), Some(Value::from(21)));
        assert_eq!(pipeline.propositions().get("d"), Some(true));
        assert_eq!(u64::from(pipeline.bits()), 0b11);

        pipeline.reset()?;
        assert_eq!(pipeline.tick(), 0);
        assert_eq!(pipeline.propositions().get("d"), Some(false));

        Ok(())
    }

    #[test]
    fn forward_references_fail_at_construction() {
        let definitions = vec![
            ("b", Rule::computed(|scope, _| scope.value("a"))),
            ("a", Rule::constant(1)),
        ];

        let error = Definitions::new(definitions, Objects::new()).map(|_| ());

        assert_eq!(
            error,
            Err(ConfigError::Initial(EvalError::Rule {
                name: "b".to_string(),
                tick: 0,
                source: Box::new(EvalError::UnknownName("a".to_string())),
            }))
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let error = Definitions::new(vec![("a", Rule::constant(1)), ("a", Rule::constant(2))], Objects::new());
        assert!(matches!(error, Err(ConfigError::DuplicateName { .. })));

        let error = Pipeline::new(
            vec![("a", Rule::constant(1))],
            vec![("a", Rule::constant(true))],
            Objects::new(),
        );
        assert!(matches!(error, Err(ConfigError::DuplicateName { table: "propositions", .. })));

        let error = Definitions::new(vec![("z", Rule::constant(1))], objects());
        assert!(matches!(error, Err(ConfigError::DuplicateName { table: "definitions", .. })));
    }

    #[test]
    fn too_many_propositions() {
        let propositions = (0..65).map(|index| (format!("p{}", index), |_: Tick| true));
        let error = ClockedPropositions::new(propositions);

        assert!(matches!(
            error,
            Err(ConfigError::TooManyPropositions { count: 65, capacity: 64 })
        ));
    }

    #[test]
    fn clocked_propositions() -> Result<(), Box<dyn Error>> {
        let rules: [(&str, fn(Tick) -> bool); 2] = [("early", |t| t < 2), ("late", |t| t >= 2)];
        let mut clocked = ClockedPropositions::new(rules)?;

        assert_eq!(clocked.get("early"), Some(true));
        assert_eq!(clocked.scope().flag("late"), Ok(false));

        clocked.step();
        clocked.step();

        assert_eq!(clocked.tick(), 2);
        assert_eq!(clocked.get("early"), Some(false));
        assert_eq!(clocked.get("late"), Some(true));
        assert_eq!(
            clocked.get_dict(),
            BTreeMap::from([("early".to_string(), false), ("late".to_string(), true)])
        );

        let trace = clocked.trace(0..4);
        let observed = trace.values().map(|bits| u64::from(*bits)).collect::<Vec<_>>();

        assert_eq!(observed, vec![0b01, 0b01, 0b10, 0b10]);
        assert_eq!(clocked.tick(), 2);

        Ok(())
    }
}
