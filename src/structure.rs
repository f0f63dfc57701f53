use std::fmt::{Display, Formatter};

use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::checker::{RewardChecker, Signal};
use crate::error::{ConfigError, Error};
use crate::property::PropertySpec;
use crate::table::{Evaluator, Pipeline};
use crate::Tick;

/// Which checker produced the signal of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum Outcome {
    Reward,
    Termination,
    Success,
}

impl Outcome {
    /// Whether the outcome ends the episode.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Reward)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Reward => write!(f, "reward"),
            Outcome::Termination => write!(f, "termination"),
            Outcome::Success => write!(f, "success"),
        }
    }
}

/// Three reward checkers over one shared pipeline, arbitrated each tick.
///
/// Every checker sees every tick so that temporal monitors stay in step with the trace. If any
/// success property fired the success signal wins, otherwise any fired termination property wins,
/// otherwise the ordinary reward signal is used.
#[derive(Debug)]
pub struct RewardStructure {
    pipeline: Pipeline,
    reward: RewardChecker,
    termination: RewardChecker,
    success: RewardChecker,
}

impl RewardStructure {
    pub fn new<R, T, S>(pipeline: Pipeline, rewards: R, terminations: T, successes: S) -> Result<Self, ConfigError>
    where
        R: IntoIterator,
        R::Item: Into<PropertySpec>,
        T: IntoIterator,
        T::Item: Into<PropertySpec>,
        S: IntoIterator,
        S::Item: Into<PropertySpec>,
    {
        let alphabet = pipeline.alphabet();
        let reward = RewardChecker::new(rewards, alphabet)?;
        let termination = RewardChecker::new(terminations, alphabet)?;
        let success = RewardChecker::new(successes, alphabet)?;

        info!(
            "reward structure with {} reward, {} termination and {} success properties over {} propositions",
            reward.properties().len(),
            termination.properties().len(),
            success.properties().len(),
            alphabet.len()
        );

        Ok(Self {
            pipeline,
            reward,
            termination,
            success,
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn tick(&self) -> Tick {
        self.pipeline.tick()
    }

    pub fn checker(&self, outcome: Outcome) -> &RewardChecker {
        match outcome {
            Outcome::Reward => &self.reward,
            Outcome::Termination => &self.termination,
            Outcome::Success => &self.success,
        }
    }

    pub fn checker_mut(&mut self, outcome: Outcome) -> &mut RewardChecker {
        match outcome {
            Outcome::Reward => &mut self.reward,
            Outcome::Termination => &mut self.termination,
            Outcome::Success => &mut self.success,
        }
    }

    /// Return every table and monitor to tick zero and report the arbitrated signal.
    pub fn reset(&mut self) -> Result<Signal, Error> {
        self.pipeline.reset()?;
        self.success.rewind();
        self.termination.rewind();
        self.reward.rewind();
        self.arbitrate()
    }

    /// Advance the tables by one tick and report the arbitrated signal.
    pub fn step(&mut self) -> Result<Signal, Error> {
        self.pipeline.step()?;
        self.arbitrate()
    }

    fn arbitrate(&mut self) -> Result<Signal, Error> {
        let success = self.success.check(&self.pipeline)?;
        let termination = self.termination.check(&self.pipeline)?;
        let reward = self.reward.check(&self.pipeline)?;

        let (outcome, mut signal) = if success.info.fired() {
            (Outcome::Success, success)
        } else if termination.info.fired() {
            (Outcome::Termination, termination)
        } else {
            (Outcome::Reward, reward)
        };

        signal.info.mode = Some(outcome);

        if outcome.is_terminal() {
            debug!("tick {}: {} with reward {}", signal.tick, outcome, signal.reward);
        }

        Ok(signal)
    }
}
