//! Built-in environments and their registration

pub mod grid_world;

pub use grid_world::{GridWorldEnv, Move, Position};

use gridworld_rl_core::Result;

use crate::registry::{EntryPoint, EnvRegistry, EnvSpec};

/// Registered id of [`GridWorldEnv`]
pub const GRID_WORLD_ID: &str = "src/GridWorld-v0";

/// Entry-point path [`GridWorldEnv`] is registered under
pub const GRID_WORLD_ENTRY_POINT: &str = "gridworld_rl_env::envs::grid_world:GridWorldEnv";

/// Episode step limit for [`GRID_WORLD_ID`]
pub const GRID_WORLD_MAX_EPISODE_STEPS: usize = 300;

/// Register this crate's environments.
///
/// The process-wide registry runs this once when first used; call it on
/// your own [`EnvRegistry`] to get an isolated copy.
pub fn register_envs(registry: &mut EnvRegistry) -> Result<()> {
    registry.register_entry_point(GRID_WORLD_ENTRY_POINT, GridWorldEnv::boxed);
    registry.register(
        EnvSpec::new(GRID_WORLD_ID, EntryPoint::path(GRID_WORLD_ENTRY_POINT))?
            .with_max_episode_steps(GRID_WORLD_MAX_EPISODE_STEPS),
    )
}
