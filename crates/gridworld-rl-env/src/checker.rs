//! Sanity checks for environment implementations

use gridworld_rl_core::{Environment, RLError, Result, State};

/// Run one reset and one step, checking both against the declared spaces.
///
/// Fails with [`RLError::InvalidState`] when an observation falls outside the
/// observation space, or [`RLError::InvalidAction`] when the action space
/// samples an action it does not contain. A reported state must be terminal
/// exactly when the step ends the episode.
pub async fn check_env<E>(env: &mut E) -> Result<()>
where
    E: Environment + ?Sized,
{
    let observation_space = env.observation_space();
    let action_space = env.action_space();

    let (observation, _info) = env.reset().await?;
    if !observation_space.contains(&observation) {
        return Err(RLError::InvalidState(format!(
            "reset observation {observation:?} is outside the observation space"
        )));
    }

    let action = action_space.sample();
    if !action_space.contains(&action) {
        return Err(RLError::InvalidAction(format!(
            "sampled action {action:?} is outside the action space"
        )));
    }

    let step = env.step(action).await?;
    if !observation_space.contains(&step.observation) {
        return Err(RLError::InvalidState(format!(
            "step observation {:?} is outside the observation space",
            step.observation
        )));
    }
    if let Some(state) = &step.state {
        if state.is_terminal() != step.is_last() {
            return Err(RLError::InvalidState(format!(
                "state {state:?} disagrees with done={} truncated={}",
                step.done, step.truncated
            )));
        }
    }

    tracing::debug!(
        observation_shape = ?observation_space.shape(),
        action_dim = ?action_space.dim(),
        "environment passed checks"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gridworld_rl_core::{
        ActionSpace, BoxObservationSpace, DiscreteAction, DiscreteSpace, EnvironmentConfig,
        ObservationSpace, Reward, Step, StepInfo, Terminal, VectorObservation, VectorState,
    };

    use crate::envs::GridWorldEnv;

    /// Reports observations of 2.0 from a space bounded by 1.0
    struct OutOfBounds;

    #[async_trait]
    impl Environment for OutOfBounds {
        type Observation = VectorObservation;
        type Action = DiscreteAction;
        type State = VectorState;

        fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
            Box::new(BoxObservationSpace::new(vec![0.0], vec![1.0], vec![1]).unwrap())
        }

        fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
            Box::new(DiscreteSpace::new(2))
        }

        async fn reset(&mut self) -> Result<(Self::Observation, StepInfo)> {
            Ok((VectorObservation::new(vec![2.0]), StepInfo::default()))
        }

        async fn step(&mut self, _action: Self::Action) -> Result<Step<Self::Observation, Self::State>> {
            Ok(Step {
                observation: VectorObservation::new(vec![2.0]),
                reward: Reward(0.0),
                done: false,
                truncated: false,
                info: StepInfo::default(),
                state: None,
            })
        }
    }

    /// Reports a terminal state on a step that does not end the episode
    struct EarlyTerminal;

    #[async_trait]
    impl Environment for EarlyTerminal {
        type Observation = VectorObservation;
        type Action = DiscreteAction;
        type State = VectorState;

        fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
            Box::new(BoxObservationSpace::new(vec![0.0], vec![1.0], vec![1]).unwrap())
        }

        fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
            Box::new(DiscreteSpace::new(2))
        }

        async fn reset(&mut self) -> Result<(Self::Observation, StepInfo)> {
            Ok((VectorObservation::new(vec![0.0]), StepInfo::default()))
        }

        async fn step(&mut self, _action: Self::Action) -> Result<Step<Self::Observation, Self::State>> {
            Ok(Step {
                observation: VectorObservation::new(vec![1.0]),
                reward: Reward(0.0),
                done: false,
                truncated: false,
                info: StepInfo::default(),
                state: Some(VectorState {
                    data: vec![1.0],
                    terminal: Terminal::Yes,
                }),
            })
        }
    }

    #[tokio::test]
    async fn test_grid_world_passes() {
        let mut env = GridWorldEnv::new(EnvironmentConfig::default().with_seed(5)).unwrap();
        check_env(&mut env).await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_bounds_observation_fails() {
        let err = check_env(&mut OutOfBounds).await.unwrap_err();
        assert!(matches!(err, RLError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_terminal_state_must_end_episode() {
        let err = check_env(&mut EarlyTerminal).await.unwrap_err();
        assert!(matches!(err, RLError::InvalidState(_)));
    }
}
