//! GridWorld: walk an agent to a target on a square grid

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gridworld_rl_core::{
    ActionSpace, BoxObservationSpace, DiscreteAction, DiscreteSpace, Environment,
    EnvironmentConfig, ObservationSpace, RLError, Result, Reward, Step, StepInfo, Terminal,
    VectorObservation, VectorState,
};

use crate::registry::BoxedEnv;

/// Render modes accepted by [`GridWorldEnv`]
pub const RENDER_MODES: &[&str] = &["human", "ansi"];

/// Grid side length when no `size` parameter is given
pub const DEFAULT_SIZE: usize = 5;

/// Cell coordinates; `x` grows rightwards, `y` grows upwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
}

impl Position {
    /// Create a position
    #[must_use]
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Neighbouring cell in `direction`, clipped to a `size`×`size` grid
    #[must_use]
    pub fn step(self, direction: Move, size: usize) -> Self {
        let last = size.saturating_sub(1);
        match direction {
            Move::Right => Self::new((self.x + 1).min(last), self.y),
            Move::Up => Self::new(self.x, (self.y + 1).min(last)),
            Move::Left => Self::new(self.x.saturating_sub(1), self.y),
            Move::Down => Self::new(self.x, self.y.saturating_sub(1)),
        }
    }

    /// Manhattan distance
    #[must_use]
    pub fn distance(self, other: Self) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// The four moves, indexed as the discrete actions 0..4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// `+x`
    Right = 0,
    /// `+y`
    Up = 1,
    /// `-x`
    Left = 2,
    /// `-y`
    Down = 3,
}

impl Move {
    /// All moves in action-index order
    pub const ALL: [Move; 4] = [Move::Right, Move::Up, Move::Left, Move::Down];
}

impl TryFrom<DiscreteAction> for Move {
    type Error = RLError;

    fn try_from(action: DiscreteAction) -> Result<Self> {
        Self::ALL
            .get(action.0)
            .copied()
            .ok_or_else(|| RLError::InvalidAction(format!("GridWorld action must be in 0..4, got {}", action.0)))
    }
}

impl From<Move> for DiscreteAction {
    fn from(direction: Move) -> Self {
        DiscreteAction(direction as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderMode {
    Human,
    Ansi,
}

impl FromStr for RenderMode {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "human" => Ok(Self::Human),
            "ansi" => Ok(Self::Ansi),
            other => Err(RLError::InvalidConfig(format!(
                "unsupported render mode `{other}` (supported: {RENDER_MODES:?})"
            ))),
        }
    }
}

/// Square grid with one agent and one target.
///
/// Each episode places both uniformly at random on distinct cells. Moving
/// onto the target ends the episode with reward 1; every other step pays 0.
/// Moves into a wall leave the agent in place. The environment never
/// truncates by itself; register it with a step limit for that.
pub struct GridWorldEnv {
    size: usize,
    agent: Position,
    target: Position,
    rng: StdRng,
    render_mode: Option<RenderMode>,
}

impl GridWorldEnv {
    /// Create a GridWorld environment.
    ///
    /// Reads `size` from `config.params` (default [`DEFAULT_SIZE`], at
    /// least 2), seeds from `config.seed` and accepts the render modes in
    /// [`RENDER_MODES`].
    pub fn new(config: EnvironmentConfig) -> Result<Self> {
        let size = config.param_usize("size", DEFAULT_SIZE)?;
        let render_mode = config
            .render_mode
            .as_deref()
            .map(RenderMode::from_str)
            .transpose()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            size: DEFAULT_SIZE,
            agent: Position::new(0, 0),
            target: Position::new(DEFAULT_SIZE - 1, DEFAULT_SIZE - 1),
            rng,
            render_mode,
        }
        .with_size(size)
    }

    /// Entry-point constructor for the registry
    pub fn boxed(config: EnvironmentConfig) -> Result<BoxedEnv> {
        Ok(Box::new(Self::new(config)?))
    }

    /// Resize the grid; positions move to opposite corners until the next reset
    pub fn with_size(mut self, size: usize) -> Result<Self> {
        if size < 2 {
            return Err(RLError::InvalidConfig(format!(
                "GridWorld size must be at least 2, got {size}"
            )));
        }
        self.size = size;
        self.agent = Position::new(0, 0);
        self.target = Position::new(size - 1, size - 1);
        Ok(self)
    }

    /// Grid side length
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Agent position
    #[must_use]
    pub fn agent(&self) -> Position {
        self.agent
    }

    /// Target position
    #[must_use]
    pub fn target(&self) -> Position {
        self.target
    }

    /// Put the agent and target on specific cells
    pub fn place(&mut self, agent: Position, target: Position) -> Result<()> {
        for (what, p) in [("agent", agent), ("target", target)] {
            if p.x >= self.size || p.y >= self.size {
                return Err(RLError::InvalidState(format!(
                    "{what} position ({}, {}) is outside a {}x{} grid",
                    p.x, p.y, self.size, self.size
                )));
            }
        }
        self.agent = agent;
        self.target = target;
        Ok(())
    }

    /// Text picture of the grid, top row first: `A` agent, `T` target
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::with_capacity((self.size + 1) * self.size);
        for y in (0..self.size).rev() {
            for x in 0..self.size {
                let cell = Position::new(x, y);
                out.push(if cell == self.agent {
                    'A'
                } else if cell == self.target {
                    'T'
                } else {
                    '.'
                });
            }
            out.push('\n');
        }
        out
    }

    #[allow(clippy::cast_precision_loss)]
    fn features(&self) -> Vec<f64> {
        vec![
            self.agent.x as f64,
            self.agent.y as f64,
            self.target.x as f64,
            self.target.y as f64,
        ]
    }

    fn info(&self) -> StepInfo {
        let mut info = StepInfo::default();
        info.insert("distance", self.agent.distance(self.target));
        info
    }

    fn random_cell(&mut self) -> Position {
        Position::new(self.rng.gen_range(0..self.size), self.rng.gen_range(0..self.size))
    }
}

impl fmt::Display for GridWorldEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}

#[async_trait]
impl Environment for GridWorldEnv {
    type Observation = VectorObservation;
    type Action = DiscreteAction;
    type State = VectorState;

    #[allow(clippy::cast_precision_loss)]
    fn observation_space(&self) -> Box<dyn ObservationSpace<Observation = Self::Observation>> {
        let high = (self.size - 1) as f64;
        Box::new(BoxObservationSpace {
            low: vec![0.0; 4],
            high: vec![high; 4],
            shape: vec![4],
            integral: true,
        })
    }

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        Box::new(DiscreteSpace::new(Move::ALL.len()))
    }

    fn render_modes(&self) -> &'static [&'static str] {
        RENDER_MODES
    }

    async fn reset(&mut self) -> Result<(Self::Observation, StepInfo)> {
        self.agent = self.random_cell();
        self.target = self.random_cell();
        while self.target == self.agent {
            self.target = self.random_cell();
        }

        if self.render_mode == Some(RenderMode::Human) {
            self.render().await?;
        }

        Ok((VectorObservation::new(self.features()), self.info()))
    }

    async fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation, Self::State>> {
        let direction = Move::try_from(action)?;
        self.agent = self.agent.step(direction, self.size);

        let done = self.agent == self.target;
        let reward = if done { 1.0 } else { 0.0 };

        if self.render_mode == Some(RenderMode::Human) {
            self.render().await?;
        }

        let data = self.features();
        Ok(Step {
            observation: VectorObservation::new(data.clone()),
            reward: Reward(reward),
            done,
            truncated: false,
            info: self.info(),
            state: Some(VectorState {
                data,
                terminal: if done { Terminal::Yes } else { Terminal::No },
            }),
        })
    }

    async fn render(&self) -> Result<()> {
        if self.render_mode == Some(RenderMode::Human) {
            println!("{}", self.render_text());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(seed: u64) -> GridWorldEnv {
        GridWorldEnv::new(EnvironmentConfig::default().with_seed(seed)).unwrap()
    }

    #[test]
    fn test_position_step_clips_to_grid() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.step(Move::Left, 5), corner);
        assert_eq!(corner.step(Move::Down, 5), corner);
        assert_eq!(corner.step(Move::Right, 5), Position::new(1, 0));
        assert_eq!(corner.step(Move::Up, 5), Position::new(0, 1));

        let far = Position::new(4, 4);
        assert_eq!(far.step(Move::Right, 5), far);
        assert_eq!(far.step(Move::Up, 5), far);
        assert_eq!(Position::new(1, 3).distance(Position::new(4, 0)), 6);
    }

    #[test]
    fn test_move_action_mapping() {
        for (i, m) in Move::ALL.iter().enumerate() {
            assert_eq!(DiscreteAction::from(*m), DiscreteAction(i));
            assert_eq!(Move::try_from(DiscreteAction(i)).unwrap(), *m);
        }
        assert!(matches!(
            Move::try_from(DiscreteAction(4)),
            Err(RLError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = EnvironmentConfig::default().with_param("size", 1);
        assert!(matches!(GridWorldEnv::new(config), Err(RLError::InvalidConfig(_))));

        let config = EnvironmentConfig::default().with_render_mode("rgb_array");
        assert!(matches!(GridWorldEnv::new(config), Err(RLError::InvalidConfig(_))));

        let env = GridWorldEnv::new(EnvironmentConfig::default().with_param("size", 8)).unwrap();
        assert_eq!(env.size(), 8);
        assert_eq!(env.observation_space().shape(), vec![4]);
    }

    #[tokio::test]
    async fn test_reset_places_distinct_cells() {
        let mut env = env(42);
        for _ in 0..50 {
            let (obs, info) = env.reset().await.unwrap();
            assert!(env.observation_space().contains(&obs));
            assert_ne!(env.agent(), env.target());
            assert_eq!(
                info.get("distance").and_then(serde_json::Value::as_u64),
                Some(env.agent().distance(env.target()) as u64)
            );
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_layouts() {
        let mut a = env(7);
        let mut b = env(7);
        for _ in 0..10 {
            assert_eq!(a.reset().await.unwrap().0, b.reset().await.unwrap().0);
        }
    }

    #[tokio::test]
    async fn test_step_reward_and_termination() {
        let mut env = env(0);
        env.reset().await.unwrap();
        env.place(Position::new(2, 2), Position::new(2, 4)).unwrap();

        let step = env.step(Move::Up.into()).await.unwrap();
        assert_eq!(step.observation.data, vec![2.0, 3.0, 2.0, 4.0]);
        assert_eq!(step.reward, Reward(0.0));
        assert!(!step.done);
        assert!(!step.truncated);
        assert_eq!(step.info.get("distance"), Some(&serde_json::json!(1)));

        let step = env.step(Move::Up.into()).await.unwrap();
        assert_eq!(step.reward, Reward(1.0));
        assert!(step.done);
        assert_eq!(step.state.unwrap().terminal, Terminal::Yes);
    }

    #[tokio::test]
    async fn test_invalid_action_leaves_agent() {
        let mut env = env(0);
        env.reset().await.unwrap();
        let before = env.agent();
        assert!(matches!(
            env.step(DiscreteAction(9)).await,
            Err(RLError::InvalidAction(_))
        ));
        assert_eq!(env.agent(), before);
    }

    #[test]
    fn test_place_and_render_text() {
        let mut env = env(0);
        assert!(env.place(Position::new(5, 0), Position::new(0, 0)).is_err());

        env.place(Position::new(0, 0), Position::new(4, 4)).unwrap();
        assert_eq!(
            env.render_text(),
            "....T\n.....\n.....\n.....\nA....\n"
        );
        assert_eq!(env.to_string(), env.render_text());
    }
}
