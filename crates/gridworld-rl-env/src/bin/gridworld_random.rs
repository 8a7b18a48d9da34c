//! Random agent playing a registered environment

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gridworld_rl_env::{
    list_envs, make_env, pprint_registry, Environment, EnvironmentConfig, TrackedEnvironment,
    GRID_WORLD_ID,
};

#[derive(Parser)]
#[command(name = "gridworld-random")]
#[command(about = "Run a uniformly random policy in a registered environment", version)]
struct Cli {
    /// Environment id to make
    #[arg(long, default_value = GRID_WORLD_ID)]
    env_id: String,

    /// Number of episodes
    #[arg(short, long, default_value = "10")]
    episodes: usize,

    /// Random seed for the environment
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grid side length
    #[arg(long)]
    size: Option<usize>,

    /// Override the registered episode step limit
    #[arg(long)]
    max_steps: Option<usize>,

    /// Render mode (`human` or `ansi`)
    #[arg(long)]
    render: Option<String>,

    /// List registered environments and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.list {
        print!("{}", pprint_registry());
        return Ok(());
    }

    let mut config = EnvironmentConfig::default();
    config.seed = cli.seed;
    config.max_steps = cli.max_steps;
    config.render_mode = cli.render;
    if let Some(size) = cli.size {
        config = config.with_param("size", size);
    }

    let env = make_env(&cli.env_id, config).with_context(|| {
        format!(
            "failed to make `{}` (registered: {})",
            cli.env_id,
            list_envs().join(", ")
        )
    })?;
    let mut env = TrackedEnvironment::new(env);
    let action_space = env.action_space();

    let mut episode_rewards = Vec::with_capacity(cli.episodes);
    for episode in 0..cli.episodes {
        env.reset().await?;

        loop {
            let step = env.step(action_space.sample()).await?;
            if step.is_last() {
                break;
            }
        }

        let summary = env.episode_info().context("episode was not tracked")?;
        info!(
            episode = episode + 1,
            total_reward = summary.total_reward,
            steps = summary.steps,
            truncated = summary.truncated,
            "episode finished"
        );
        episode_rewards.push(summary.total_reward);
    }

    if !episode_rewards.is_empty() {
        #[allow(clippy::cast_precision_loss)]
        let avg_reward = episode_rewards.iter().sum::<f64>() / episode_rewards.len() as f64;
        info!(episodes = cli.episodes, avg_reward, "done");
    }

    env.close().await?;
    Ok(())
}
