use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridworld_rl_env::{
    register_envs, EnvRegistry, Environment, EnvironmentConfig, GRID_WORLD_ID,
};

fn bench_make(c: &mut Criterion) {
    let mut registry = EnvRegistry::new();
    register_envs(&mut registry).unwrap();

    c.bench_function("make_grid_world", |b| {
        b.iter(|| {
            registry
                .make(black_box(GRID_WORLD_ID), EnvironmentConfig::default().with_seed(0))
                .unwrap()
        });
    });
}

fn bench_episode(c: &mut Criterion) {
    let mut registry = EnvRegistry::new();
    register_envs(&mut registry).unwrap();
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("grid_world_random_episode", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut env = registry
                    .make(GRID_WORLD_ID, EnvironmentConfig::default().with_seed(0))
                    .unwrap();
                let actions = env.action_space();
                env.reset().await.unwrap();
                loop {
                    let step = env.step(actions.sample()).await.unwrap();
                    if step.is_last() {
                        break black_box(step.reward);
                    }
                }
            })
        });
    });
}

criterion_group!(benches, bench_make, bench_episode);
criterion_main!(benches);
