#![deny(clippy::all)]

//! Runtime monitoring of linear temporal logic properties and reward arbitration for
//! driving-scenario reinforcement learning.
//!
//! Per-tick values flow through a [`Pipeline`] of [`table::Definitions`] and
//! [`table::Propositions`], whose boolean results are packed into [`Bits`]. Each [`Property`]
//! compiles a formula into an incremental [`Monitor`]; a [`RewardChecker`] turns the properties
//! that fire into a scalar reward, and a [`RewardStructure`] arbitrates between reward,
//! termination and success checkers.

pub mod bits;
pub mod checker;
pub mod episode;
pub mod error;
pub mod formula;
pub mod monitor;
pub mod parser;
pub mod priority;
pub mod property;
pub mod scope;
pub mod structure;
pub mod table;
pub mod trace;
pub mod value;
pub mod verdict;

/// Discrete time step of an episode, starting at zero on reset.
pub type Tick = u32;

pub use crate::bits::Bits;
pub use crate::checker::{Info, RewardChecker, Signal};
pub use crate::episode::{Agent, Episode, EpisodeEnd, EpisodeStep, WorldBounds};
pub use crate::error::{ConfigError, Error, EvalError, MonitorError};
pub use crate::formula::Formula;
pub use crate::monitor::Monitor;
pub use crate::priority::{PriorityArbiter, PriorityManager};
pub use crate::property::{Mode, Property, PropertySpec, Reward};
pub use crate::scope::Scope;
pub use crate::structure::{Outcome, RewardStructure};
pub use crate::table::{ClockedPropositions, Evaluator, Pipeline, Rule};
pub use crate::trace::Trace;
pub use crate::value::{Entity, Feature, Features, Objects, Value};
pub use crate::verdict::{Bottom, Join, Meet, Top, Verdict};
