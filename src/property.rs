use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use log::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

use crate::bits::Bits;
use crate::error::{ConfigError, EvalError, MonitorError};
use crate::monitor::Monitor;
use crate::parser::Alphabet;
use crate::scope::Scope;
use crate::verdict::Verdict;
use crate::Tick;

/// Which verdict of a property fires its reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Fire when the property is false.
    Violation,
    /// Fire when the property is true.
    Satisfaction,
}

impl Mode {
    /// Whether `verdict` fires a property in this mode. Inconclusive verdicts never fire.
    pub fn triggers(self, verdict: Verdict) -> bool {
        match self {
            Mode::Violation => verdict == Verdict::False,
            Mode::Satisfaction => verdict == Verdict::True,
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "violation" => Ok(Mode::Violation),
            "satisfaction" => Ok(Mode::Satisfaction),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Violation => write!(f, "violation"),
            Mode::Satisfaction => write!(f, "satisfaction"),
        }
    }
}

/// Boxed reward body evaluated at the tick its property fires.
pub type RewardFn = Box<dyn Fn(&Scope<'_>, Tick) -> Result<f64, EvalError>>;

/// Reward granted when a property fires.
pub enum Reward {
    Constant(f64),
    Computed(RewardFn),
}

impl Reward {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Scope<'_>, Tick) -> Result<f64, EvalError> + 'static,
    {
        Self::Computed(Box::new(f))
    }

    pub fn evaluate(&self, scope: &Scope<'_>, tick: Tick) -> Result<f64, EvalError> {
        match self {
            Self::Constant(value) => Ok(*value),
            Self::Computed(f) => f(scope, tick),
        }
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl From<i32> for Reward {
    fn from(value: i32) -> Self {
        Self::Constant(f64::from(value))
    }
}

impl Debug for Reward {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Reward {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        f64::deserialize(deserializer).map(Reward::Constant)
    }
}

/// Declarative description of a property: formula text, reward and firing mode.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct PropertySpec {
    pub formula: String,
    pub reward: Reward,
    pub mode: Mode,
}

impl PropertySpec {
    pub fn new(formula: impl Into<String>, reward: impl Into<Reward>, mode: Mode) -> Self {
        Self {
            formula: formula.into(),
            reward: reward.into(),
            mode,
        }
    }

    pub fn violation(formula: impl Into<String>, reward: impl Into<Reward>) -> Self {
        Self::new(formula, reward, Mode::Violation)
    }

    pub fn satisfaction(formula: impl Into<String>, reward: impl Into<Reward>) -> Self {
        Self::new(formula, reward, Mode::Satisfaction)
    }
}

impl<S, R> From<(S, R, Mode)> for PropertySpec
where
    S: Into<String>,
    R: Into<Reward>,
{
    fn from((formula, reward, mode): (S, R, Mode)) -> Self {
        Self::new(formula, reward, mode)
    }
}

/// A compiled formula with its reward, its firing mode and an activation switch.
///
/// Inactive properties keep their monitor frozen and never fire.
#[derive(Debug)]
pub struct Property {
    formula: String,
    monitor: Monitor,
    reward: Reward,
    mode: Mode,
    active: bool,
    status: bool,
}

impl Property {
    pub fn new(spec: PropertySpec, alphabet: &Alphabet) -> Result<Self, ConfigError> {
        let PropertySpec { formula, reward, mode } = spec;
        let monitor = Monitor::compile(&formula, alphabet).map_err(|source| ConfigError::Formula {
            formula: formula.clone(),
            source,
        })?;

        Ok(Self {
            formula,
            monitor,
            reward,
            mode,
            active: true,
            status: false,
        })
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn reward(&self) -> &Reward {
        &self.reward
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn verdict(&self) -> Verdict {
        self.monitor.verdict()
    }

    /// Whether the property fired at the last evaluation.
    pub fn status(&self) -> bool {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.status = false;
    }

    pub fn reset(&mut self) {
        self.monitor.reset();
        self.status = false;
    }

    /// Feed one observation to the monitor without deciding whether the property fires.
    pub fn check(&mut self, tick: Tick, bits: Bits) -> Result<Verdict, MonitorError> {
        self.monitor.observe(tick, bits)
    }

    /// Observe `bits` at `tick` and report whether the property fires.
    pub fn evaluate(&mut self, tick: Tick, bits: Bits) -> Result<bool, MonitorError> {
        self.status = if self.active {
            let verdict = self.check(tick, bits)?;
            self.mode.triggers(verdict)
        } else {
            false
        };

        trace!("property \"{}\" ({}) fired: {}", self.formula, self.mode, self.status);
        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{Mode, Property, PropertySpec, Reward};
    use crate::bits::Bits;
    use crate::error::ConfigError;
    use crate::parser::{Alphabet, ParseError};
    use crate::scope::Scope;
    use crate::value::Objects;
    use crate::verdict::Verdict;

    fn alphabet() -> Alphabet {
        Alphabet::from_iter(["a", "b"])
    }

    #[test]
    fn modes_trigger_on_settled_values_only() {
        assert!(Mode::Violation.triggers(Verdict::False));
        assert!(!Mode::Violation.triggers(Verdict::Inconclusive));
        assert!(Mode::Satisfaction.triggers(Verdict::True));
        assert!(!Mode::Satisfaction.triggers(Verdict::False));
        assert_eq!("violation".parse::<Mode>(), Ok(Mode::Violation));
        assert!(matches!("sometimes".parse::<Mode>(), Err(ConfigError::UnknownMode(_))));
    }

    #[test]
    fn violation_property_fires_on_false() -> Result<(), Box<dyn Error>> {
        let mut property = Property::new(PropertySpec::violation("a => b", -1.0), &alphabet())?;

        assert!(!property.evaluate(0, Bits::from(0b11u64))?);
        assert!(property.evaluate(1, Bits::from(0b01u64))?);
        assert!(property.status());
        assert_eq!(property.verdict(), Verdict::False);

        Ok(())
    }

    #[test]
    fn inactive_properties_do_not_fire() -> Result<(), Box<dyn Error>> {
        let mut property = Property::new(("G a", 1, Mode::Violation).into(), &alphabet())?;

        property.deactivate();
        assert!(!property.evaluate(0, Bits::new())?);
        assert_eq!(property.monitor().last_tick(), None);

        property.activate();
        assert!(property.evaluate(1, Bits::new())?);

        Ok(())
    }

    #[test]
    fn bad_formula_is_a_config_error() {
        let error = Property::new(PropertySpec::satisfaction("a and c", 1.0), &alphabet());

        assert!(matches!(
            error,
            Err(ConfigError::Formula {
                source: ParseError::UnknownProposition { .. },
                ..
            })
        ));
    }

    #[test]
    fn computed_rewards_read_the_scope() -> Result<(), Box<dyn Error>> {
        let reward = Reward::computed(|_, tick| Ok(f64::from(tick) * 0.5));
        let objects = Objects::new();

        assert_eq!(reward.evaluate(&Scope::of_objects(&objects), 4)?, 2.0);
        assert_eq!(Reward::from(3).evaluate(&Scope::of_objects(&objects), 0)?, 3.0);

        Ok(())
    }
}
