//! Environment registry for creating environments by id
//!
//! An [`EnvRegistry`] maps environment ids such as `src/GridWorld-v0` to an
//! [`EnvSpec`]: how to construct the environment (its [`EntryPoint`]) and how
//! to wrap it (step limit, order enforcement). Construction is deferred until
//! [`EnvRegistry::make`]; registering never builds an environment.
//!
//! Registries are plain values so tests can build isolated ones. A
//! process-wide registry preloaded with the crate's own environments backs
//! [`register_env`], [`make_env`] and friends.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, error, info, warn};

use gridworld_rl_core::{
    DiscreteAction, Environment, EnvironmentConfig, RLError, Result, VectorObservation, VectorState,
};

use crate::wrappers::{OrderEnforcing, TimeLimit};

/// Type-erased environment handed out by the registry
pub type BoxedEnv = Box<
    dyn Environment<Observation = VectorObservation, Action = DiscreteAction, State = VectorState>,
>;

/// Constructor stored behind an entry point
pub type EnvConstructor = Arc<dyn Fn(EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync>;

lazy_static::lazy_static! {
    static ref ENV_ID_RE: regex::Regex = regex::Regex::new(
        r"^(?:(?P<namespace>[\w:.-]+)/)?(?:(?P<name>[\w:.-]+?))(?:-v(?P<version>\d+))?$"
    ).expect("environment id pattern is valid");

    static ref REGISTRY: RwLock<EnvRegistry> = RwLock::new(EnvRegistry::with_builtins());
}

/// Parsed environment id: `[namespace/]name[-v(version)]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvId {
    /// Optional namespace, e.g. `src`
    pub namespace: Option<String>,
    /// Environment name, e.g. `GridWorld`
    pub name: String,
    /// Optional version number
    pub version: Option<u32>,
}

impl EnvId {
    /// Parse an id string
    pub fn parse(id: &str) -> Result<Self> {
        let caps = ENV_ID_RE
            .captures(id)
            .ok_or_else(|| RLError::InvalidEnvId(id.to_string()))?;

        let version = caps
            .name("version")
            .map(|v| v.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| RLError::InvalidEnvId(id.to_string()))?;

        Ok(Self {
            namespace: caps.name("namespace").map(|m| m.as_str().to_string()),
            name: caps["name"].to_string(),
            version,
        })
    }

    /// Namespace and name without the version, e.g. `src/GridWorld`
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}/{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Whether `other` names the same environment, ignoring version
    #[must_use]
    pub fn same_name(&self, other: &EnvId) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }
}

impl FromStr for EnvId {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())?;
        if let Some(version) = self.version {
            write!(f, "-v{version}")?;
        }
        Ok(())
    }
}

/// How to construct an environment
#[derive(Clone)]
pub enum EntryPoint {
    /// A constructor closure
    Factory(EnvConstructor),
    /// A `module:Name` path resolved against the registry's entry-point table
    /// when the environment is made
    Path(String),
}

impl EntryPoint {
    /// Entry point from a constructor function
    pub fn factory<F>(constructor: F) -> Self
    where
        F: Fn(EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(constructor))
    }

    /// Entry point from a `module:Name` path
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory(_) => f.write_str("<factory>"),
            Self::Path(path) => f.write_str(path),
        }
    }
}

impl Serialize for EntryPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Registration record for one environment
#[derive(Debug, Clone, Serialize)]
pub struct EnvSpec {
    /// Full environment id
    pub id: String,
    /// Parsed id
    #[serde(flatten)]
    pub env_id: EnvId,
    /// How to construct the environment
    pub entry_point: EntryPoint,
    /// Return at which the task counts as solved
    pub reward_threshold: Option<f64>,
    /// Whether the environment is nondeterministic even after seeding
    pub nondeterministic: bool,
    /// Episode step limit enforced by a [`TimeLimit`] wrapper
    pub max_episode_steps: Option<usize>,
    /// Whether to wrap with [`OrderEnforcing`]
    pub order_enforce: bool,
    /// Default constructor parameters
    pub kwargs: serde_json::Map<String, serde_json::Value>,
}

impl EnvSpec {
    /// Create a spec, rejecting malformed ids
    pub fn new(id: impl Into<String>, entry_point: EntryPoint) -> Result<Self> {
        let id = id.into();
        let env_id = EnvId::parse(&id)?;
        Ok(Self {
            id,
            env_id,
            entry_point,
            reward_threshold: None,
            nondeterministic: false,
            max_episode_steps: None,
            order_enforce: true,
            kwargs: serde_json::Map::new(),
        })
    }

    /// Set the episode step limit
    #[must_use]
    pub fn with_max_episode_steps(mut self, steps: usize) -> Self {
        self.max_episode_steps = Some(steps);
        self
    }

    /// Set the reward threshold
    #[must_use]
    pub fn with_reward_threshold(mut self, threshold: f64) -> Self {
        self.reward_threshold = Some(threshold);
        self
    }

    /// Mark the environment as nondeterministic
    #[must_use]
    pub fn nondeterministic(mut self, nondeterministic: bool) -> Self {
        self.nondeterministic = nondeterministic;
        self
    }

    /// Enable or disable the order-enforcing wrapper
    #[must_use]
    pub fn with_order_enforce(mut self, enforce: bool) -> Self {
        self.order_enforce = enforce;
        self
    }

    /// Add a default constructor parameter
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if EnvId::parse(&self.id)? != self.env_id {
            return Err(RLError::InvalidEnvId(format!(
                "`{}` does not match its parsed id `{}`",
                self.id, self.env_id
            )));
        }
        if self.max_episode_steps == Some(0) {
            return Err(RLError::InvalidConfig(format!(
                "`max_episode_steps` for `{}` must be positive",
                self.id
            )));
        }
        if let EntryPoint::Path(path) = &self.entry_point {
            if path.trim().is_empty() {
                return Err(RLError::InvalidConfig(format!(
                    "entry point for `{}` is empty",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

/// What `register` does when the id is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Replace the existing entry and log a warning
    #[default]
    Overwrite,
    /// Fail with [`RLError::DuplicateEnvId`]
    Reject,
}

/// Registry settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Duplicate-id handling
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

/// Mapping from environment ids to their specs
pub struct EnvRegistry {
    config: RegistryConfig,
    /// Registered environments, ordered by id
    specs: BTreeMap<String, EnvSpec>,
    /// Constructors reachable through [`EntryPoint::Path`]
    entry_points: HashMap<String, EnvConstructor>,
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvRegistry")
            .field("config", &self.config)
            .field("specs", &self.specs.keys().collect::<Vec<_>>())
            .field("entry_points", &self.entry_points.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EnvRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given settings
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            specs: BTreeMap::new(),
            entry_points: HashMap::new(),
        }
    }

    /// Create a registry holding this crate's environments
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        if let Err(e) = crate::envs::register_envs(&mut registry) {
            error!("Failed to register built-in environments: {}", e);
        }
        registry
    }

    /// Registry settings
    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Make a constructor reachable through an [`EntryPoint::Path`]
    pub fn register_entry_point<F>(&mut self, path: impl Into<String>, constructor: F)
    where
        F: Fn(EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync + 'static,
    {
        let path = path.into();
        debug!(entry_point = %path, "Registered entry point");
        self.entry_points.insert(path, Arc::new(constructor));
    }

    /// Register an environment.
    ///
    /// The entry point is only stored; an unknown path surfaces as
    /// [`RLError::EntryPointNotFound`] from [`EnvRegistry::make`].
    pub fn register(&mut self, spec: EnvSpec) -> Result<()> {
        spec.validate()?;
        self.check_version_conflict(&spec)?;

        if self.specs.contains_key(&spec.id) {
            match self.config.conflict_policy {
                ConflictPolicy::Reject => return Err(RLError::DuplicateEnvId(spec.id)),
                ConflictPolicy::Overwrite => {
                    warn!("Overriding environment {} already in registry", spec.id);
                }
            }
        }

        info!(
            env_id = %spec.id,
            entry_point = %spec.entry_point,
            max_episode_steps = ?spec.max_episode_steps,
            "Registered environment"
        );
        self.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    /// Versioned and unversioned ids of the same name are mutually exclusive
    fn check_version_conflict(&self, spec: &EnvSpec) -> Result<()> {
        let siblings = || {
            self.specs
                .values()
                .filter(|s| s.env_id.same_name(&spec.env_id) && s.id != spec.id)
        };

        let existing = if spec.env_id.version.is_some() {
            siblings().find(|s| s.env_id.version.is_none())
        } else {
            siblings()
                .filter(|s| s.env_id.version.is_some())
                .max_by_key(|s| s.env_id.version)
        };

        match existing {
            Some(existing) => Err(RLError::VersionConflict {
                new: spec.id.clone(),
                existing: existing.id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Construct an environment by id.
    ///
    /// Parameters in `config` take precedence over the spec's `kwargs`.
    /// The result is wrapped in [`OrderEnforcing`] (unless disabled in the
    /// spec) and in [`TimeLimit`] when `config.max_steps` or the spec's
    /// `max_episode_steps` is set.
    pub fn make(&self, id: &str, config: EnvironmentConfig) -> Result<BoxedEnv> {
        let spec = self.specs.get(id).ok_or_else(|| self.missing_env_error(id))?;

        let max_steps = config.max_steps.or(spec.max_episode_steps);
        if max_steps == Some(0) {
            return Err(RLError::InvalidConfig("`max_steps` must be positive".to_string()));
        }

        let constructor = self.resolve(&spec.entry_point)?;
        let config = config.merged_with(&spec.kwargs);
        let render_mode = config.render_mode.clone();

        let mut env = constructor(config)?;

        if let Some(mode) = render_mode {
            if !env.render_modes().contains(&mode.as_str()) {
                return Err(RLError::InvalidConfig(format!(
                    "render mode `{mode}` is not supported by `{id}` (supported: {:?})",
                    env.render_modes()
                )));
            }
        }

        if spec.order_enforce {
            env = Box::new(OrderEnforcing::new(env));
        }
        if let Some(max_steps) = max_steps {
            env = Box::new(TimeLimit::new(env, max_steps));
        }

        debug!(env_id = %id, max_steps = ?max_steps, "Made environment");
        Ok(env)
    }

    fn resolve(&self, entry_point: &EntryPoint) -> Result<EnvConstructor> {
        match entry_point {
            EntryPoint::Factory(constructor) => Ok(Arc::clone(constructor)),
            EntryPoint::Path(path) => self
                .entry_points
                .get(path)
                .cloned()
                .ok_or_else(|| RLError::EntryPointNotFound(path.clone())),
        }
    }

    /// Explain why `id` is not registered
    fn missing_env_error(&self, id: &str) -> RLError {
        let env_id = match EnvId::parse(id) {
            Ok(env_id) => env_id,
            Err(e) => return e,
        };

        if let Some(ns) = &env_id.namespace {
            if !self.specs.values().any(|s| s.env_id.namespace.as_ref() == Some(ns)) {
                return RLError::NamespaceNotFound(ns.clone());
            }
        }

        let mut versions: Vec<&EnvSpec> = self
            .specs
            .values()
            .filter(|s| s.env_id.same_name(&env_id))
            .collect();

        if versions.is_empty() {
            return RLError::NameNotFound {
                name: env_id.full_name(),
                suggestion: self.closest_name(&env_id),
            };
        }

        versions.sort_by_key(|s| s.env_id.version);
        let available = versions
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let Some(version) = env_id.version else {
            return RLError::Environment(format!(
                "No unversioned environment `{id}`; registered versions: {available}"
            ));
        };

        // Versioned and unversioned ids never coexist, so no latest version
        // means the name is only registered as its unversioned default.
        let latest = versions.last();
        let deprecated = latest
            .and_then(|s| s.env_id.version)
            .map_or(true, |latest| version < latest);
        if deprecated {
            RLError::DeprecatedEnv {
                name: env_id.full_name(),
                version,
                latest: latest.map(|s| s.id.clone()).unwrap_or_default(),
            }
        } else {
            RLError::VersionNotFound {
                name: env_id.full_name(),
                version,
                available,
            }
        }
    }

    /// Registered name closest to `env_id`, if any is close enough
    fn closest_name(&self, env_id: &EnvId) -> Option<String> {
        let wanted = env_id.full_name().to_lowercase();
        let max_distance = (wanted.chars().count() / 3).max(1);

        self.specs
            .values()
            .map(|s| s.env_id.full_name())
            .map(|name| (edit_distance(&wanted, &name.to_lowercase()), name))
            .filter(|(distance, _)| *distance <= max_distance)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }

    /// Look up a spec
    #[must_use]
    pub fn spec(&self, id: &str) -> Option<&EnvSpec> {
        self.specs.get(id)
    }

    /// Whether `id` is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.specs.contains_key(id)
    }

    /// Number of registered environments
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Registered ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.specs.keys().cloned().collect()
    }

    /// Iterate over registered specs in id order
    pub fn iter(&self) -> impl Iterator<Item = &EnvSpec> {
        self.specs.values()
    }

    /// Remove an environment
    pub fn remove(&mut self, id: &str) -> Option<EnvSpec> {
        let removed = self.specs.remove(id);
        if removed.is_some() {
            debug!(env_id = %id, "Removed environment");
        }
        removed
    }

    /// Remove every environment and entry point
    pub fn clear(&mut self) {
        self.specs.clear();
        self.entry_points.clear();
    }

    /// Human-readable listing grouped by namespace
    #[must_use]
    pub fn pretty_print(&self) -> String {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for spec in self.specs.values() {
            groups
                .entry(spec.env_id.namespace.as_deref().unwrap_or("<default>"))
                .or_default()
                .push(spec.id.as_str());
        }

        let mut out = String::new();
        for (namespace, ids) in groups {
            out.push_str(&format!("===== {namespace} =====\n"));
            for id in ids {
                out.push_str(id);
                out.push('\n');
            }
        }
        out
    }
}

/// Levenshtein distance over chars
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[b.len()]
}

/// Register an environment in the process-wide registry
pub fn register_env(spec: EnvSpec) -> Result<()> {
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(spec)
}

/// Make a constructor reachable through an [`EntryPoint::Path`] in the
/// process-wide registry
pub fn register_entry_point<F>(path: impl Into<String>, constructor: F)
where
    F: Fn(EnvironmentConfig) -> Result<BoxedEnv> + Send + Sync + 'static,
{
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register_entry_point(path, constructor);
}

/// Create an environment from the process-wide registry
pub fn make_env(id: &str, config: EnvironmentConfig) -> Result<BoxedEnv> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .make(id, config)
}

/// Look up a spec in the process-wide registry
#[must_use]
pub fn env_spec(id: &str) -> Option<EnvSpec> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .spec(id)
        .cloned()
}

/// List all environments in the process-wide registry
#[must_use]
pub fn list_envs() -> Vec<String> {
    REGISTRY.read().unwrap_or_else(PoisonError::into_inner).ids()
}

/// Listing of the process-wide registry grouped by namespace
#[must_use]
pub fn pprint_registry() -> String {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .pretty_print()
}
