use either::Either;
use log::{debug, trace};

use crate::bits::Bits;
use crate::error::MonitorError;
use crate::formula::Formula;
use crate::parser::{parse_formula, Alphabet, ParseError};
use crate::trace::Trace;
use crate::verdict::{Bottom, Join, Meet, Top, Verdict};
use crate::Tick;

/// Incremental runtime monitor for a single formula.
///
/// Formulas without temporal operators are memoryless: each observation is judged on its own.
/// Temporal formulas are progressed through every observation since the last reset, leaving a
/// residual obligation. Once the residual collapses to a constant the verdict is settled and no
/// later observation changes it.
///
/// While an obligation is still open, `U` and `G` are presumed to hold and `F` and `X` are
/// inconclusive; these presumptions are combined with the Kleene connectives of [`Verdict`].
/// A presumption is never negated into a proven verdict: an open `U` or `G` under `not`, or in
/// the antecedent of `=>`, is inconclusive.
///
/// # Example
///
/// ```rust
/// use ltl_rewards::parser::Alphabet;
/// use ltl_rewards::{Bits, Monitor, Verdict};
///
/// let alphabet = Alphabet::from_iter(["a", "b"]);
/// let mut monitor = Monitor::compile("F b", &alphabet).unwrap();
///
/// assert_eq!(monitor.observe(0, Bits::from(0b01u64)).unwrap(), Verdict::Inconclusive);
/// assert_eq!(monitor.observe(1, Bits::from(0b10u64)).unwrap(), Verdict::True);
/// assert!(monitor.is_settled());
/// ```
#[derive(Debug, Clone)]
pub struct Monitor {
    formula: Formula,
    temporal: bool,
    base: Formula,
    residual: Formula,
    last_tick: Option<Tick>,
    verdict: Verdict,
}

impl Monitor {
    pub fn new(formula: Formula) -> Self {
        let formula = formula.simplify();
        let temporal = formula.is_temporal();
        let verdict = presume(&formula);

        Self {
            base: formula.clone(),
            residual: formula.clone(),
            formula,
            temporal,
            last_tick: None,
            verdict,
        }
    }

    /// Parse `input` against `alphabet` and build a monitor for it.
    pub fn compile(input: &str, alphabet: &Alphabet) -> Result<Self, ParseError> {
        parse_formula(input, alphabet).map(Monitor::new)
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// The obligation left after the observations seen since the last reset.
    pub fn residual(&self) -> &Formula {
        &self.residual
    }

    pub fn is_temporal(&self) -> bool {
        self.temporal
    }

    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    /// Verdict after the most recent observation.
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Either the settled truth value or the open obligation.
    pub fn outcome(&self) -> Either<bool, &Formula> {
        match (&self.residual, self.temporal) {
            (Formula::True, true) => Either::Left(true),
            (Formula::False, true) => Either::Left(false),
            (residual, _) => Either::Right(residual),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.outcome().is_left()
    }

    pub fn reset(&mut self) {
        self.base = self.formula.clone();
        self.residual = self.formula.clone();
        self.last_tick = None;
        self.verdict = presume(&self.formula);
    }

    /// Fold the observation for `tick` into the monitor and return the updated verdict.
    ///
    /// Observing the latest tick again replaces the previous observation for that tick instead of
    /// advancing the trace.
    pub fn observe(&mut self, tick: Tick, bits: Bits) -> Result<Verdict, MonitorError> {
        let advancing = match self.last_tick {
            Some(last) if tick < last => return Err(MonitorError::StaleTick { tick, last }),
            Some(last) => tick > last,
            None => false,
        };

        if advancing && self.temporal {
            self.base = self.residual.clone();
        }

        let was_settled = self.is_settled();

        self.residual = self.base.progress(bits);
        self.last_tick = Some(tick);
        self.verdict = presume(&self.residual);

        if !was_settled && self.is_settled() {
            debug!("formula {} settled to {} at tick {}", self.formula, self.verdict, tick);
        } else {
            trace!("formula {} is {} at tick {}", self.formula, self.verdict, tick);
        }

        Ok(self.verdict)
    }

    /// Reset the monitor and replay every observation in `trace`, returning the verdict after each.
    pub fn check_trace(&mut self, trace: &Trace<Bits>) -> Result<Trace<Verdict>, MonitorError> {
        self.reset();

        trace
            .iter()
            .map(|(tick, bits)| self.observe(tick, *bits).map(|verdict| (tick, verdict)))
            .collect()
    }
}

/// Verdict implied by an obligation that may still be open.
fn presume(residual: &Formula) -> Verdict {
    presume_with(residual, true)
}

/// `positive` is false below an odd number of negations, where open obligations are not presumed.
fn presume_with(residual: &Formula, positive: bool) -> Verdict {
    match residual {
        Formula::True => Verdict::True,
        Formula::False => Verdict::False,
        Formula::Atom(_) | Formula::Next(_) | Formula::Eventually(_) => Verdict::Inconclusive,
        Formula::Always(_) | Formula::Until(_) if positive => Verdict::True,
        Formula::Always(_) | Formula::Until(_) => Verdict::Inconclusive,
        Formula::Not(inner) => !presume_with(inner, !positive),
        Formula::And(operands) => operands
            .iter()
            .fold(Verdict::top(), |acc, operand| Meet::min(&acc, &presume_with(operand, positive))),
        Formula::Or(operands) => operands
            .iter()
            .fold(Verdict::bottom(), |acc, operand| Join::max(&acc, &presume_with(operand, positive))),
        Formula::Implies(operands) => Join::max(
            &!presume_with(&operands.0, !positive),
            &presume_with(&operands.1, positive),
        ),
    }
}
