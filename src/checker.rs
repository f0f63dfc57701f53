use std::fmt::{Debug, Formatter};

use log::debug;
use nonempty::NonEmpty;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};
use crate::parser::Alphabet;
use crate::property::{Mode, Property, PropertySpec};
use crate::structure::Outcome;
use crate::table::Evaluator;
use crate::Tick;

/// Binary operator folding the rewards of every property that fired in one tick.
pub type Combine = Box<dyn Fn(f64, f64) -> f64>;

/// Which properties fired in one tick, grouped by mode, plus the arbitration outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Info {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub violations: Vec<String>,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub satisfactions: Vec<String>,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub mode: Option<Outcome>,
}

impl Info {
    /// Whether any property fired.
    pub fn fired(&self) -> bool {
        !self.violations.is_empty() || !self.satisfactions.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.fired() && self.mode.is_none()
    }

    fn record(&mut self, property: &Property) {
        let bucket = match property.mode() {
            Mode::Violation => &mut self.violations,
            Mode::Satisfaction => &mut self.satisfactions,
        };

        bucket.push(property.formula().to_string());
    }
}

/// The reward emitted for one tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Signal {
    pub reward: f64,
    pub info: Info,
    pub tick: Tick,
}

/// A group of properties whose fired rewards are combined into one signal per tick.
///
/// # Example
///
/// ```rust
/// use ltl_rewards::{ClockedPropositions, PropertySpec, RewardChecker, Tick};
///
/// let clock: [(&str, fn(Tick) -> bool); 1] = [("late", |t| t >= 2)];
/// let mut propositions = ClockedPropositions::new(clock).unwrap();
/// let properties = [PropertySpec::satisfaction("late", 1.0)];
/// let mut checker = RewardChecker::new(properties, propositions.alphabet()).unwrap();
///
/// assert_eq!(checker.reset(&mut propositions).unwrap().reward, 0.0);
/// assert_eq!(checker.step(&mut propositions).unwrap().reward, 0.0);
/// assert_eq!(checker.step(&mut propositions).unwrap().reward, 1.0);
/// ```
pub struct RewardChecker {
    properties: Vec<Property>,
    combine: Combine,
}

impl RewardChecker {
    /// Compile every property against `alphabet`. Fired rewards are summed.
    pub fn new<I, P>(properties: I, alphabet: &Alphabet) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertySpec>,
    {
        let properties = properties
            .into_iter()
            .map(|spec| Property::new(spec.into(), alphabet))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            properties,
            combine: Box::new(|left, right| left + right),
        })
    }

    /// Replace the operator used to fold fired rewards.
    pub fn with_combine<F>(mut self, combine: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + 'static,
    {
        self.combine = Box::new(combine);
        self
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn property_mut(&mut self, formula: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|property| property.formula() == formula)
    }

    pub(crate) fn rewind(&mut self) {
        for property in &mut self.properties {
            property.reset();
        }
    }

    /// Reset `evaluator` and every monitor, then report the signal for tick zero.
    pub fn reset<E>(&mut self, evaluator: &mut E) -> Result<Signal, Error>
    where
        E: Evaluator + ?Sized,
    {
        evaluator.reset()?;
        self.rewind();
        self.check(evaluator)
    }

    /// Advance `evaluator` by one tick and report the resulting signal.
    pub fn step<E>(&mut self, evaluator: &mut E) -> Result<Signal, Error>
    where
        E: Evaluator + ?Sized,
    {
        evaluator.step()?;
        self.check(evaluator)
    }

    /// Evaluate every property against the current state of `evaluator` without advancing it.
    pub fn check<E>(&mut self, evaluator: &E) -> Result<Signal, Error>
    where
        E: Evaluator + ?Sized,
    {
        let tick = evaluator.tick();
        let bits = evaluator.bits();
        let scope = evaluator.scope();
        let mut info = Info::default();
        let mut fired = Vec::new();

        for property in &mut self.properties {
            if property.evaluate(tick, bits)? {
                fired.push(property.reward().evaluate(&scope, tick)?);
                info.record(property);
            }
        }

        let reward = match NonEmpty::from_vec(fired) {
            Some(NonEmpty { head, tail }) => tail.into_iter().fold(head, |acc, next| (self.combine)(acc, next)),
            None => 0.0,
        };

        if info.fired() {
            debug!("tick {}: reward {} from {:?}", tick, reward, info);
        }

        Ok(Signal { reward, info, tick })
    }
}

impl Debug for RewardChecker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardChecker")
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::error::Error;
    use std::rc::Rc;

    use approx::assert_relative_eq;

    use super::{Info, RewardChecker, Signal};
    use crate::property::{PropertySpec, Reward};
    use crate::table::{Evaluator, Pipeline, Rule};
    use crate::value::{Objects, Value};

    fn pipeline() -> Result<Pipeline, Box<dyn Error>> {
        let z = HashMap::from([("zz".to_string(), Value::from(20))]);
        let objects = Objects::new().with("z", Rc::new(z));
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

        Ok(Pipeline::new(definitions, propositions, objects)?)
    }

    #[test]
    fn reward_of_computed_property() -> Result<(), Box<dyn Error>> {
        let mut pipeline = pipeline()?;
        let reward = Reward::computed(|scope, t| Ok(scope.attribute("z", "zz")?.as_f64() + f64::from(t)));
        let mut checker = RewardChecker::new([PropertySpec::satisfaction("c and d", reward)], pipeline.alphabet())?;

        let signal = checker.reset(&mut pipeline)?;
        assert_eq!(signal, Signal { reward: 0.0, info: Info::default(), tick: 0 });

        let signal = checker.step(&mut pipeline)?;
        assert_relative_eq!(signal.reward, 21.0);
        assert_eq!(signal.info.satisfactions, vec!["c and d".to_string()]);
        assert!(signal.info.violations.is_empty());
        assert_eq!(signal.tick, 1);

        Ok(())
    }

    #[test]
    fn fired_rewards_are_combined() -> Result<(), Box<dyn Error>> {
        let mut pipeline = pipeline()?;
        let properties = vec![
            PropertySpec::satisfaction("c", 3.0),
            PropertySpec::violation("d", 2.0),
            PropertySpec::satisfaction("d", 100.0),
        ];

        let mut checker = RewardChecker::new(properties, pipeline.alphabet())?;
        let signal = checker.reset(&mut pipeline)?;

        assert_relative_eq!(signal.reward, 5.0);
        assert_eq!(signal.info.satisfactions, vec!["c".to_string()]);
        assert_eq!(signal.info.violations, vec!["d".to_string()]);

        let mut checker = checker.with_combine(f64::max);
        let signal = checker.reset(&mut pipeline)?;

        assert_relative_eq!(signal.reward, 3.0);
        Ok(())
    }

    #[test]
    fn deactivated_property_is_skipped() -> Result<(), Box<dyn Error>> {
        let mut pipeline = pipeline()?;
        let mut checker = RewardChecker::new([PropertySpec::satisfaction("c", 1.0)], pipeline.alphabet())?;

        if let Some(property) = checker.property_mut("c") {
            property.deactivate();
        }

        let signal = checker.reset(&mut pipeline)?;

        assert_eq!(signal.reward, 0.0);
        assert!(signal.info.is_empty());
        Ok(())
    }
}
