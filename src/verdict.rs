use std::fmt::{Display, Formatter};
use std::ops::Not;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trait representing a type with a global maximum.
///
/// The value returned by the `top` method should be greater than all other values in the type.
pub trait Top {
    /// Compute the global maximum for the type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ltl_rewards::{Top, Verdict};
    /// assert_eq!(Verdict::top(), Verdict::True);
    /// ```
    fn top() -> Self;
}

/// Trait representing a type with a global minimum.
pub trait Bottom {
    /// Compute the global minimum for the type.
    fn bottom() -> Self;
}

/// Trait representing a type that can compute the [infimum] of two values.
///
/// For types with a total ordering this is the smaller of the two values. Conjunction of verdicts
/// is the infimum under the ordering `False < Inconclusive < True`.
///
/// [infimum]: https://en.wikipedia.org/wiki/Infimum_and_supremum
pub trait Meet: PartialOrd {
    /// This method returns the infimum of two values.
    fn min(&self, other: &Self) -> Self;
}

/// Trait representing a type that can compute the [supremum] of two values.
///
/// Disjunction of verdicts is the supremum under the ordering `False < Inconclusive < True`.
///
/// [supremum]: https://en.wikipedia.org/wiki/Infimum_and_supremum
pub trait Join: PartialOrd {
    /// This method returns the supremum of two values.
    fn max(&self, other: &Self) -> Self;
}

impl Top for bool {
    fn top() -> Self {
        true
    }
}

impl Bottom for bool {
    fn bottom() -> Self {
        false
    }
}

impl Meet for bool {
    fn min(&self, other: &Self) -> Self {
        *self && *other
    }
}

impl Join for bool {
    fn max(&self, other: &Self) -> Self {
        *self || *other
    }
}

/// Three-valued outcome of monitoring a formula over the trace observed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum Verdict {
    False,
    Inconclusive,
    True,
}

impl Verdict {
    pub fn is_true(self) -> bool {
        self == Verdict::True
    }

    pub fn is_false(self) -> bool {
        self == Verdict::False
    }

    pub fn is_inconclusive(self) -> bool {
        self == Verdict::Inconclusive
    }
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        if value {
            Verdict::True
        } else {
            Verdict::False
        }
    }
}

impl Not for Verdict {
    type Output = Verdict;

    fn not(self) -> Self::Output {
        match self {
            Verdict::False => Verdict::True,
            Verdict::Inconclusive => Verdict::Inconclusive,
            Verdict::True => Verdict::False,
        }
    }
}

impl Top for Verdict {
    fn top() -> Self {
        Verdict::True
    }
}

impl Bottom for Verdict {
    fn bottom() -> Self {
        Verdict::False
    }
}

impl Meet for Verdict {
    fn min(&self, other: &Self) -> Self {
        if self <= other {
            *self
        } else {
            *other
        }
    }
}

impl Join for Verdict {
    fn max(&self, other: &Self) -> Self {
        if self >= other {
            *self
        } else {
            *other
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Verdict::False => "false",
            Verdict::Inconclusive => "inconclusive",
            Verdict::True => "true",
        };

        write!(f, "{}", text)
    }
}
