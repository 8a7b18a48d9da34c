//! Environment traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Action, ActionSpace, Observation, ObservationSpace, Reward, State, StateSpace};

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step<O, S> {
    /// Observation from the environment
    pub observation: O,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode reached a terminal state
    pub done: bool,
    /// Whether the episode was cut short (e.g., time limit)
    pub truncated: bool,
    /// Additional info from the environment
    pub info: StepInfo,
    /// Internal state (if available)
    pub state: Option<S>,
}

impl<O, S> Step<O, S> {
    /// Whether the episode is over for either reason
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.done || self.truncated
    }
}

/// Additional information from a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Custom fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl StepInfo {
    /// Set a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Get a field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

/// Episode information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Episode ID
    pub id: String,
    /// Total reward
    pub total_reward: f64,
    /// Number of steps
    pub steps: usize,
    /// Whether episode was truncated
    pub truncated: bool,
    /// Start time
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// End time
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Configuration passed to environment constructors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Random seed
    #[serde(default)]
    pub seed: Option<u64>,
    /// Maximum episode steps, overriding the registered limit
    #[serde(default)]
    pub max_steps: Option<usize>,
    /// Render mode
    #[serde(default)]
    pub render_mode: Option<String>,
    /// Additional parameters
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl EnvironmentConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the random seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the episode step limit
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Set the render mode
    #[must_use]
    pub fn with_render_mode(mut self, mode: impl Into<String>) -> Self {
        self.render_mode = Some(mode.into());
        self
    }

    /// Set an extra constructor parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Fill in parameters from `defaults` that are not already set
    #[must_use]
    pub fn merged_with(mut self, defaults: &serde_json::Map<String, serde_json::Value>) -> Self {
        for (key, value) in defaults {
            self.params.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self
    }

    /// Read an unsigned integer parameter, falling back to `default` when absent
    pub fn param_usize(&self, key: &str, default: usize) -> crate::Result<usize> {
        match self.params.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .ok_or_else(|| {
                    crate::RLError::InvalidConfig(format!(
                        "parameter `{key}` must be a non-negative integer, got {value}"
                    ))
                }),
        }
    }
}

/// Core environment trait
#[async_trait]
pub trait Environment: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;
    /// State type
    type State: State;

    /// Get the observation space
    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>>;

    /// Get the action space
    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>>;

    /// Get the state space (if available)
    fn state_space(&self) -> Option<Box<dyn StateSpace<State = Self::State>>> {
        None
    }

    /// Render modes this environment supports
    fn render_modes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Reset the environment
    async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)>;

    /// Take a step in the environment
    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation, Self::State>>;

    /// Render the environment (optional)
    async fn render(&self) -> crate::Result<()> {
        Ok(())
    }

    /// Close the environment
    async fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }

    /// Get current episode info
    fn episode_info(&self) -> Option<Episode> {
        None
    }
}

#[async_trait]
impl<E> Environment for Box<E>
where
    E: Environment + ?Sized,
{
    type Observation = E::Observation;
    type Action = E::Action;
    type State = E::State;

    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        (**self).observation_space()
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        (**self).action_space()
    }

    fn state_space(&self) -> Option<Box<dyn StateSpace<State = Self::State>>> {
        (**self).state_space()
    }

    fn render_modes(&self) -> &'static [&'static str] {
        (**self).render_modes()
    }

    async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)> {
        (**self).reset().await
    }

    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation, Self::State>> {
        (**self).step(action).await
    }

    async fn render(&self) -> crate::Result<()> {
        (**self).render().await
    }

    async fn close(&mut self) -> crate::Result<()> {
        (**self).close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        (**self).episode_info()
    }
}

/// Wrapper for environments that tracks episodes
pub struct TrackedEnvironment<E> {
    /// Inner environment
    pub env: E,
    /// Current episode
    pub episode: Option<Episode>,
    /// Step counter
    pub step_count: usize,
}

impl<E> TrackedEnvironment<E> {
    /// Create a new tracked environment
    pub fn new(env: E) -> Self {
        Self {
            env,
            episode: None,
            step_count: 0,
        }
    }
}

#[async_trait]
impl<E> Environment for TrackedEnvironment<E>
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

    async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)> {
        // End current episode if exists
        if let Some(ref mut episode) = self.episode {
            if episode.end_time.is_none() {
                episode.end_time = Some(chrono::Utc::now());
            }
        }

        let result = self.env.reset().await?;

        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(episode = %id, "starting episode");
        self.episode = Some(Episode {
            id,
            total_reward: 0.0,
            steps: 0,
            truncated: false,
            start_time: chrono::Utc::now(),
            end_time: None,
        });
        self.step_count = 0;

        Ok(result)
    }

    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation, Self::State>> {
        let step = self.env.step(action).await?;

        self.step_count += 1;
        if let Some(ref mut episode) = self.episode {
            episode.total_reward += f64::from(step.reward);
            episode.steps = self.step_count;

            if step.is_last() {
                episode.truncated = step.truncated;
                episode.end_time = Some(chrono::Utc::now());
                tracing::debug!(
                    episode = %episode.id,
                    steps = episode.steps,
                    total_reward = episode.total_reward,
                    truncated = episode.truncated,
                    "episode finished"
                );
            }
        }

        Ok(step)
    }

    async fn render(&self) -> crate::Result<()> {
        self.env.render().await
    }

    async fn close(&mut self) -> crate::Result<()> {
        self.env.close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        self.episode.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiscreteAction, DiscreteSpace, VectorObservation, VectorState, Terminal};
    use crate::observation::BoxObservationSpace;

    /// Counts down from `start`; each step pays 1.0 and the episode ends at zero.
    struct Countdown {
        start: usize,
        left: usize,
    }

    #[async_trait]
    impl Environment for Countdown {
        type Observation = VectorObservation;
        type Action = DiscreteAction;
        type State = VectorState;

        fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
            let high = self.start as f64;
            Box::new(BoxObservationSpace::new(vec![0.0], vec![high], vec![1]).unwrap())
        }

        fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
            Box::new(DiscreteSpace::new(1))
        }

        async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)> {
            self.left = self.start;
            Ok((VectorObservation::new(vec![self.left as f64]), StepInfo::default()))
        }

        async fn step(&mut self, _action: Self::Action) -> crate::Result<Step<Self::Observation, Self::State>> {
            self.left -= 1;
            let done = self.left == 0;
            let data = vec![self.left as f64];
            Ok(Step {
                observation: VectorObservation::new(data.clone()),
                reward: Reward(1.0),
                done,
                truncated: false,
                info: StepInfo::default(),
                state: Some(VectorState {
                    data,
                    terminal: if done { Terminal::Yes } else { Terminal::No },
                }),
            })
        }
    }

    #[test]
    fn test_config_from_json_collects_params() {
        let config = EnvironmentConfig::from_json(r#"{"seed": 7, "size": 8, "render_mode": "ansi"}"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_steps, None);
        assert_eq!(config.render_mode.as_deref(), Some("ansi"));
        assert_eq!(config.param_usize("size", 5).unwrap(), 8);
        assert_eq!(config.param_usize("missing", 5).unwrap(), 5);
    }

    #[test]
    fn test_param_usize_rejects_non_integers() {
        let config = EnvironmentConfig::default().with_param("size", "big");
        assert!(matches!(
            config.param_usize("size", 5),
            Err(crate::RLError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_merged_with_keeps_caller_values() {
        let mut defaults = serde_json::Map::new();
        defaults.insert("size".to_string(), 5.into());
        defaults.insert("walls".to_string(), false.into());

        let config = EnvironmentConfig::default()
            .with_param("size", 9)
            .merged_with(&defaults);

        assert_eq!(config.param_usize("size", 0).unwrap(), 9);
        assert_eq!(config.params.get("walls"), Some(&serde_json::Value::Bool(false)));
    }

    #[tokio::test]
    async fn test_tracked_environment_records_episode() {
        let mut env = TrackedEnvironment::new(Countdown { start: 3, left: 0 });
        assert!(env.episode_info().is_none());

        env.reset().await.unwrap();
        let mut last = None;
        for _ in 0..3 {
            last = Some(env.step(DiscreteAction(0)).await.unwrap());
        }
        assert!(last.unwrap().done);

        let episode = env.episode_info().unwrap();
        assert_eq!(episode.steps, 3);
        assert!((episode.total_reward - 3.0).abs() < f64::EPSILON);
        assert!(!episode.truncated);
        assert!(episode.end_time.is_some());
    }

    #[test]
    fn test_boxed_environment_delegates() {
        tokio_test::block_on(async {
            let mut env: Box<dyn Environment<
                Observation = VectorObservation,
                Action = DiscreteAction,
                State = VectorState,
            >> = Box::new(Countdown { start: 2, left: 0 });

            let (obs, _) = env.reset().await.unwrap();
            assert_eq!(obs.data, vec![2.0]);
            assert!(env.observation_space().contains(&obs));
            assert_eq!(env.action_space().dim(), Some(1));
            assert!(env.render_modes().is_empty());

            let step = env.step(DiscreteAction(0)).await.unwrap();
            assert_eq!(step.observation.data, vec![1.0]);
            assert!(!step.is_last());
        });
    }
}
