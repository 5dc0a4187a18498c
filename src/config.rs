use crate::geometry::Rect;
use crate::model::{Counts, State};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file. See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Parameters of the epidemic model.
    pub model: ModelConfig,
    /// Initial condition.
    pub init: InitConfig,
    /// Settings of the simulation driver.
    pub run: RunConfig,
}

/// Parameters of the epidemic model.
///
/// These are never rejected: out-of-range values are normalized when the
/// population is built so the simulation always starts in a valid state.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Arena the agents move in.
    #[serde(default)]
    pub bounds: Rect,
    /// Collision and drawing radius of an agent.
    pub radius: f64,
    /// Maximum magnitude of each initial velocity component.
    pub speed: f64,

    /// Transmission probability per second of contact.
    pub prob_trans: f64,
    /// Death probability per second while touched.
    pub prob_death: f64,
    /// Cure probability per second while touched.
    pub prob_cure: f64,

    /// What happens when two agents touch.
    #[serde(default)]
    pub contact: ContactRule,
    /// When the simulation stops by itself.
    #[serde(default)]
    pub stop: StopPolicy,
}

/// Collision handler used by the population.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRule {
    /// A touched agent may infect a live one.
    #[default]
    Transmit,
    /// Contacts have no effect.
    Ignore,
}

/// Initial condition of the population.
///
/// Counts are signed so that negative values reach the clamp in
/// [`InitConfig::counts`] instead of failing to parse.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Number of agents.
    pub n_agents: i64,
    /// Number of agents touched at start (lowest ids first).
    pub n_touched: i64,
}

impl InitConfig {
    /// Agent and touched counts, negative values clamped to zero.
    pub fn counts(&self) -> (usize, usize) {
        (
            non_negative_count(self.n_agents, "initial number of agents"),
            non_negative_count(self.n_touched, "initial touched count"),
        )
    }
}

fn non_negative_count(val: i64, name: &str) -> usize {
    match usize::try_from(val) {
        Ok(val) => val,
        Err(_) => {
            log::warn!("clamped {name} {val} to 0");
            0
        }
    }
}

/// Settings of the simulation driver.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed of the random number generator; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Fixed frame duration in seconds; the wall clock is used when absent.
    pub frame_dt: Option<f64>,
    /// Frame rate cap when running on the wall clock.
    #[serde(default = "default_max_fps")]
    pub max_fps: u32,
    /// Simulated seconds after which the run ends regardless of the stop policy.
    pub max_seconds: u64,
}

fn default_max_fps() -> u32 {
    60
}

/// Predicate deciding when the epidemic is over.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    /// Run until the driver gives up.
    Never,
    /// Stop once every agent has been touched.
    NoLive,
    /// Stop once nobody is touched anymore.
    #[default]
    NoTouched,
}

impl StopPolicy {
    pub fn holds(self, counts: &Counts) -> bool {
        match self {
            StopPolicy::Never => false,
            StopPolicy::NoLive => counts[State::Live] == 0,
            StopPolicy::NoTouched => counts[State::Touched] == 0,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed,
    /// or if the run settings are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(frame_dt) = self.run.frame_dt {
            check_num(frame_dt, 1e-6..=1.0).context("invalid frame duration")?;
        }
        check_num(self.run.max_fps, 1..=1000).context("invalid frame rate cap")?;
        check_num(self.run.max_seconds, 1..=1_000_000).context("invalid maximum duration")?;
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const EXAMPLE: &str = r#"
[model]
bounds = { min = { x = 0.0, y = 0.0 }, max = { x = 600.0, y = 400.0 } }
radius = 10.0
speed = 80.0
prob_trans = 2.0
prob_death = 0.004
prob_cure = 0.096
stop = "no_live"

[init]
n_agents = 200
n_touched = 1

[run]
seed = 42
frame_dt = 0.02
max_seconds = 30
"#;

    #[test]
    fn parses_example() {
        let cfg = Config::from_toml(EXAMPLE).unwrap();
        assert_eq!(cfg.model.bounds.max.x, 600.0);
        assert_eq!(cfg.model.stop, StopPolicy::NoLive);
        assert_eq!(cfg.model.contact, ContactRule::Transmit);
        assert_eq!(cfg.init.n_agents, 200);
        assert_eq!(cfg.run.seed, Some(42));
        assert_eq!(cfg.run.frame_dt, Some(0.02));
        assert_eq!(cfg.run.max_fps, 60);
    }

    #[test]
    fn defaults_apply() {
        let contents = EXAMPLE
            .replace("bounds = { min = { x = 0.0, y = 0.0 }, max = { x = 600.0, y = 400.0 } }\n", "")
            .replace("stop = \"no_live\"\n", "");
        let cfg = Config::from_toml(&contents).unwrap();
        assert_eq!(cfg.model.bounds, Rect::default());
        assert_eq!(cfg.model.stop, StopPolicy::NoTouched);
    }

    #[test]
    fn negative_counts_are_clamped() {
        let contents = EXAMPLE.replace("n_touched = 1", "n_touched = -1");
        let cfg = Config::from_toml(&contents).unwrap();
        assert_eq!(cfg.init.counts(), (200, 0));

        let contents = EXAMPLE.replace("n_agents = 200", "n_agents = -5");
        let cfg = Config::from_toml(&contents).unwrap();
        assert_eq!(cfg.init.counts(), (0, 1));
    }

    #[test]
    fn rejects_bad_run_settings() {
        let contents = EXAMPLE.replace("frame_dt = 0.02", "frame_dt = -1.0");
        assert!(Config::from_toml(&contents).is_err());

        let contents = EXAMPLE.replace("max_seconds = 30", "max_seconds = 0");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn stop_policies() {
        let mut counts = Counts::default();
        counts[State::Live] = 3;
        assert!(!StopPolicy::NoLive.holds(&counts));
        assert!(StopPolicy::NoTouched.holds(&counts));
        assert!(!StopPolicy::Never.holds(&counts));

        counts.shift(State::Live, State::Touched);
        assert!(!StopPolicy::NoTouched.holds(&counts));
    }
}
