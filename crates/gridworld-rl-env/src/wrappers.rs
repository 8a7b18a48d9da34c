//! Environment wrappers applied by the registry

use async_trait::async_trait;

use gridworld_rl_core::{
    ActionSpace, Environment, Episode, ObservationSpace, RLError, State, StateSpace, Step, StepInfo,
};

/// Time limit wrapper.
///
/// Marks a step as truncated once `max_steps` steps have been taken since
/// the last reset, unless that step already terminated the episode.
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }

    /// Steps taken since the last reset
    #[must_use]
    pub fn elapsed_steps(&self) -> usize {
        self.steps
    }
}

#[async_trait]
impl<E> Environment for TimeLimit<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;
    type State = E::State;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        self.env.observation_space()
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        self.env.action_space()
    }

    fn state_space(&self) -> Option<Box<dyn StateSpace<State = Self::State>>> {
        self.env.state_space()
    }

    fn render_modes(&self) -> &'static [&'static str] {
        self.env.render_modes()
    }

    async fn reset(&mut self) -> gridworld_rl_core::Result<(Self::Observation, StepInfo)> {
        self.steps = 0;
        self.env.reset().await
    }

    async fn step(&mut self, action: Self::Action) -> gridworld_rl_core::Result<Step<Self::Observation, Self::State>> {
        let mut step = self.env.step(action).await?;
        self.steps += 1;

        if self.steps >= self.max_steps && !step.done {
            tracing::trace!(steps = self.steps, "time limit reached");
            step.truncated = true;
            if let Some(state) = step.state.as_mut() {
                state.mark_truncated();
            }
        }

        Ok(step)
    }

    async fn render(&self) -> gridworld_rl_core::Result<()> {
        self.env.render().await
    }

    async fn close(&mut self) -> gridworld_rl_core::Result<()> {
        self.env.close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        self.env.episode_info()
    }
}

/// Rejects `step` and `render` until the environment has been reset
pub struct OrderEnforcing<E> {
    /// Inner environment
    pub env: E,
    has_reset: bool,
}

impl<E> OrderEnforcing<E> {
    /// Create a new order-enforcing wrapper
    pub fn new(env: E) -> Self {
        Self {
            env,
            has_reset: false,
        }
    }

    /// Whether `reset` has been called
    #[must_use]
    pub fn has_reset(&self) -> bool {
        self.has_reset
    }
}

#[async_trait]
impl<E> Environment for OrderEnforcing<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;
    type State = E::State;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        self.env.observation_space()
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        self.env.action_space()
    }

    fn state_space(&self) -> Option<Box<dyn StateSpace<State = Self::State>>> {
        self.env.state_space()
    }

    fn render_modes(&self) -> &'static [&'static str] {
        self.env.render_modes()
    }

    async fn reset(&mut self) -> gridworld_rl_core::Result<(Self::Observation, StepInfo)> {
        let result = self.env.reset().await?;
        self.has_reset = true;
        Ok(result)
    }

    async fn step(&mut self, action: Self::Action) -> gridworld_rl_core::Result<Step<Self::Observation, Self::State>> {
        if !self.has_reset {
            return Err(RLError::ResetNeeded("step"));
        }
        self.env.step(action).await
    }

    async fn render(&self) -> gridworld_rl_core::Result<()> {
        if !self.has_reset {
            return Err(RLError::ResetNeeded("render"));
        }
        self.env.render().await
    }

    async fn close(&mut self) -> gridworld_rl_core::Result<()> {
        self.env.close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        self.env.episode_info()
    }
}
