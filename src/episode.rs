use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use log::info;

use crate::bits::Bits;
use crate::checker::{Info, Signal};
use crate::error::{ConfigError, Error};
use crate::structure::{Outcome, RewardStructure};
use crate::value::Entity;
use crate::Tick;

/// Largest number of agents a single episode tracks.
pub const MAX_AGENTS: usize = 32;

/// A participant of the scenario, read through its [`Entity`] attributes.
#[derive(Clone)]
pub struct Agent {
    name: String,
    ego: bool,
    entity: Rc<dyn Entity>,
}

impl Agent {
    pub fn new(name: impl Into<String>, entity: Rc<dyn Entity>) -> Self {
        Self {
            name: name.into(),
            ego: false,
            entity,
        }
    }

    /// The agent driven by the learner.
    pub fn ego(name: impl Into<String>, entity: Rc<dyn Entity>) -> Self {
        Self {
            ego: true,
            ..Self::new(name, entity)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ego(&self) -> bool {
        self.ego
    }

    pub fn entity(&self) -> &Rc<dyn Entity> {
        &self.entity
    }

    /// The `x` and `y` attributes, if the entity exposes both.
    pub fn position(&self) -> Option<(f64, f64)> {
        let x = self.entity.attribute("x")?.as_f64();
        let y = self.entity.attribute("y")?.as_f64();

        Some((x, y))
    }
}

impl Debug for Agent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("ego", &self.ego)
            .finish_non_exhaustive()
    }
}

/// Axis-aligned extent of the world, inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl WorldBounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEnd {
    Success,
    Termination,
    /// No agent is left inside the world bounds.
    OutOfBounds,
}

impl Display for EpisodeEnd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeEnd::Success => write!(f, "success"),
            EpisodeEnd::Termination => write!(f, "termination"),
            EpisodeEnd::OutOfBounds => write!(f, "out of bounds"),
        }
    }
}

/// Result of advancing an episode by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStep {
    pub signal: Signal,
    pub end: Option<EpisodeEnd>,
    pub total_reward: f64,
}

impl EpisodeStep {
    pub fn is_done(&self) -> bool {
        self.end.is_some()
    }
}

/// Drives a group of agents and, optionally, a reward structure through one episode.
///
/// Frozen agents are skipped by the update callback but still count towards the bounds check.
/// Rewards are clipped so the running total stays inside the configured range and then rounded.
pub struct Episode {
    agents: Vec<Agent>,
    bounds: WorldBounds,
    unfrozen: Bits,
    rewards: Option<RewardStructure>,
    clip: (f64, f64),
    decimals: i32,
    total_reward: f64,
    tick: Tick,
}

impl Episode {
    pub fn new(agents: Vec<Agent>, bounds: WorldBounds) -> Result<Self, ConfigError> {
        let egos = agents.iter().filter(|agent| agent.is_ego()).count();

        if egos > 1 {
            return Err(ConfigError::MultipleEgos(egos));
        }

        if agents.len() > MAX_AGENTS {
            return Err(ConfigError::TooManyAgents {
                count: agents.len(),
                capacity: MAX_AGENTS,
            });
        }

        let unfrozen = (0..agents.len()).map(|_| true).collect();

        Ok(Self {
            agents,
            bounds,
            unfrozen,
            rewards: None,
            clip: (f64::NEG_INFINITY, f64::INFINITY),
            decimals: 3,
            total_reward: 0.0,
            tick: 0,
        })
    }

    pub fn with_rewards(mut self, rewards: RewardStructure) -> Self {
        self.rewards = Some(rewards);
        self
    }

    /// Keep the cumulative reward within `min..=max`.
    pub fn with_clip(mut self, min: f64, max: f64) -> Self {
        self.clip = (min.min(max), max.max(min));
        self
    }

    /// Round every emitted reward to `decimals` decimal places.
    pub fn with_rounding(mut self, decimals: i32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn ego(&self) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.is_ego())
    }

    pub fn rewards(&self) -> Option<&RewardStructure> {
        self.rewards.as_ref()
    }

    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn is_frozen(&self, index: usize) -> bool {
        index < self.agents.len() && !self.unfrozen.get(index)
    }

    /// Stop updating the agent at `index`. Returns false if there is no such agent.
    pub fn freeze(&mut self, index: usize) -> bool {
        self.set_frozen(index, true)
    }

    pub fn unfreeze(&mut self, index: usize) -> bool {
        self.set_frozen(index, false)
    }

    fn set_frozen(&mut self, index: usize, frozen: bool) -> bool {
        if index >= self.agents.len() {
            return false;
        }

        self.unfrozen.set(index, !frozen);
        true
    }

    pub fn freeze_all(&mut self) {
        self.unfrozen = Bits::new();
    }

    pub fn unfreeze_all(&mut self) {
        self.unfrozen = (0..self.agents.len()).map(|_| true).collect();
    }

    /// Indices of the agents that are updated each tick.
    pub fn unfrozen(&self) -> Vec<usize> {
        (0..self.agents.len()).filter(|index| self.unfrozen.get(*index)).collect()
    }

    pub fn is_agent_in_bounds(&self, agent: &Agent) -> bool {
        agent
            .position()
            .map_or(false, |(x, y)| self.bounds.contains(x, y))
    }

    pub fn agents_in_bounds(&self) -> usize {
        self.agents.iter().filter(|agent| self.is_agent_in_bounds(agent)).count()
    }

    /// Start a new episode at tick zero.
    pub fn reset(&mut self) -> Result<EpisodeStep, Error> {
        self.total_reward = 0.0;
        self.tick = 0;

        let signal = match self.rewards.as_mut() {
            Some(rewards) => rewards.reset()?,
            None => idle(0),
        };

        Ok(self.account(signal))
    }

    /// Update every unfrozen agent through `update`, the ego first, then evaluate the tick.
    pub fn step<F>(&mut self, mut update: F) -> Result<EpisodeStep, Error>
    where
        F: FnMut(usize, &Agent),
    {
        let ego = self.agents.iter().position(Agent::is_ego);
        let order = ego.into_iter().chain((0..self.agents.len()).filter(|index| Some(*index) != ego));

        for index in order {
            if self.unfrozen.get(index) {
                update(index, &self.agents[index]);
            }
        }

        self.tick += 1;

        let signal = match self.rewards.as_mut() {
            Some(rewards) => rewards.step()?,
            None => idle(self.tick),
        };

        Ok(self.account(signal))
    }

    fn account(&mut self, mut signal: Signal) -> EpisodeStep {
        let (min, max) = self.clip;
        let mut reward = signal.reward;

        if self.total_reward + reward > max {
            reward = if max.is_finite() { max - self.total_reward } else { 0.0 };
        }

        if self.total_reward + reward < min {
            reward = if min.is_finite() { min - self.total_reward } else { 0.0 };
        }

        let scale = 10f64.powi(self.decimals);
        reward = (reward * scale).round() / scale;

        self.total_reward += reward;
        signal.reward = reward;

        let end = match signal.info.mode {
            Some(Outcome::Success) => Some(EpisodeEnd::Success),
            Some(Outcome::Termination) => Some(EpisodeEnd::Termination),
            _ if self.agents_in_bounds() == 0 => Some(EpisodeEnd::OutOfBounds),
            _ => None,
        };

        if let Some(end) = end {
            info!(
                "episode ended by {} at tick {} with total reward {}",
                end, signal.tick, self.total_reward
            );
        }

        EpisodeStep {
            signal,
            end,
            total_reward: self.total_reward,
        }
    }
}

fn idle(tick: Tick) -> Signal {
    Signal {
        reward: 0.0,
        info: Info::default(),
        tick,
    }
}

impl Debug for Episode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Episode")
            .field("agents", &self.agents)
            .field("bounds", &self.bounds)
            .field("tick", &self.tick)
            .field("total_reward", &self.total_reward)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::error::Error;
    use std::rc::Rc;

    use super::{Agent, Episode, EpisodeEnd, WorldBounds, MAX_AGENTS};
    use crate::error::ConfigError;
    use crate::value::Features;

    fn car(x: f64, y: f64) -> Rc<RefCell<Features>> {
        Rc::new(RefCell::new(Features::from_iter([("x", x), ("y", y)])))
    }

    fn bounds() -> WorldBounds {
        WorldBounds::new(-10.0, 10.0, -10.0, 10.0)
    }

    #[test]
    fn at_most_one_ego() {
        let agents = vec![Agent::ego("a", car(0.0, 0.0)), Agent::ego("b", car(1.0, 1.0))];

        assert!(matches!(Episode::new(agents, bounds()), Err(ConfigError::MultipleEgos(2))));
    }

    #[test]
    fn at_most_thirty_two_agents() {
        let agents = (0..=MAX_AGENTS)
            .map(|index| Agent::new(format!("car{}", index), car(0.0, 0.0)))
            .collect();

        assert!(matches!(
            Episode::new(agents, bounds()),
            Err(ConfigError::TooManyAgents { count: 33, capacity: 32 })
        ));
    }

    #[test]
    fn frozen_agents_are_not_updated() -> Result<(), Box<dyn Error>> {
        let ego = car(0.0, 0.0);
        let other = car(1.0, 0.0);
        let mut episode = Episode::new(vec![Agent::new("other", other.clone()), Agent::ego("ego", ego.clone())], bounds())?;

        assert!(episode.freeze(0));
        assert!(!episode.freeze(5));
        assert!(episode.is_frozen(0));
        assert_eq!(episode.unfrozen(), vec![1]);

        let mut updated = Vec::new();
        let step = episode.step(|index, agent| updated.push((index, agent.name().to_string())))?;

        assert_eq!(updated, vec![(1, "ego".to_string())]);
        assert!(!step.is_done());

        episode.unfreeze_all();
        updated.clear();
        episode.step(|index, _| updated.push((index, String::new())))?;

        assert_eq!(updated.iter().map(|(index, _)| *index).collect::<Vec<_>>(), vec![1, 0]);
        Ok(())
    }

    #[test]
    fn leaving_the_world_ends_the_episode() -> Result<(), Box<dyn Error>> {
        let ego = car(9.0, 0.0);
        let mut episode = Episode::new(vec![Agent::ego("ego", ego.clone())], bounds())?;

        episode.reset()?;

        let step = episode.step(|_, _| ego.borrow_mut().set("x", 9.5))?;
        assert!(!step.is_done());

        let step = episode.step(|_, _| ego.borrow_mut().set("x", 10.5))?;
        assert_eq!(step.end, Some(EpisodeEnd::OutOfBounds));
        assert_eq!(step.signal.tick, 2);

        Ok(())
    }
}
