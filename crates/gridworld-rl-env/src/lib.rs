//! GridWorld reinforcement learning environment and environment registry
//!
//! Environments are constructed by id through an [`EnvRegistry`]:
//!
//! ```no_run
//! use gridworld_rl_env::{make_env, EnvironmentConfig, GRID_WORLD_ID};
//!
//! # fn main() -> gridworld_rl_env::Result<()> {
//! let _env = make_env(GRID_WORLD_ID, EnvironmentConfig::default().with_seed(0))?;
//! # Ok(())
//! # }
//! ```
//!
//! The process-wide registry already holds `src/GridWorld-v0`; build an
//! [`EnvRegistry`] and call [`register_envs`] for an isolated one.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod checker;
pub mod envs;
pub mod registry;
pub mod wrappers;

// Re-export environments
pub use envs::{
    register_envs, GridWorldEnv, Move, Position, GRID_WORLD_ENTRY_POINT, GRID_WORLD_ID,
    GRID_WORLD_MAX_EPISODE_STEPS,
};
pub use checker::check_env;
pub use registry::{
    env_spec, list_envs, make_env, pprint_registry, register_entry_point, register_env, BoxedEnv,
    ConflictPolicy, EntryPoint, EnvConstructor, EnvId, EnvRegistry, EnvSpec, RegistryConfig,
};
pub use wrappers::{OrderEnforcing, TimeLimit};

// Re-export core types
pub use gridworld_rl_core::{
    Action, ActionSpace, DiscreteAction, Environment, EnvironmentConfig, Episode, Observation,
    ObservationSpace, RLError, Result, Reward, State, Step, StepInfo, TrackedEnvironment,
    VectorObservation, VectorState,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        make_env, register_envs, EntryPoint, EnvRegistry, EnvSpec, GridWorldEnv, TimeLimit,
        GRID_WORLD_ID,
    };
    pub use gridworld_rl_core::prelude::*;
}
