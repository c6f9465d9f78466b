//! Runtime configuration: size hints, shrink strategy, and the flag surface.

use std::str::FromStr;

use crate::error::PropertyError;

/// Scale hint handed to generators.
///
/// Meaning is generator-specific: for integers the fields are the sampled
/// range directly (`min <= x <= max`, negative bounds are legal); for
/// strings and slices they are length bounds and get clamped to be
/// non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub min: i64,
    pub max: i64,
}

impl Size {
    /// The canonical smallest size.
    pub const ZERO: Size = Size { min: 0, max: 0 };

    /// Create a size, normalizing an inverted pair.
    pub fn new(min: i64, max: i64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Length bounds for strings and slices: the fields clamped to `>= 0`.
    pub fn len_bounds(&self) -> (usize, usize) {
        let lo = self.min.max(0) as usize;
        let hi = self.max.max(0) as usize;
        (lo, hi.max(lo))
    }
}

impl Default for Size {
    /// The engine's default sampling size.
    fn default() -> Self {
        Size { min: 0, max: 100 }
    }
}

/// Traversal order over the shrink tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShrinkStrategy {
    /// Breadth-first: accepted candidates are expanded after the current
    /// level's remaining siblings.
    #[default]
    Bfs,
    /// Depth-first: accepted candidates are expanded immediately.
    Dfs,
}

impl FromStr for ShrinkStrategy {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" => Ok(ShrinkStrategy::Bfs),
            "dfs" => Ok(ShrinkStrategy::Dfs),
            other => Err(PropertyError::config_error(
                format!("unknown shrink strategy {:?} (expected \"bfs\" or \"dfs\")", other),
                Some("shrink_strategy"),
            )),
        }
    }
}

/// Configuration for a `for_all` run.
///
/// A plain value: build one with [`Config::default`] (or [`Config::from_env`]
/// to honor the `-propx.*` runtime flags) and override fields as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Seeds all PRNG derivation. `0` means "pick one and report it".
    pub seed: u64,
    /// Number of samples to draw before declaring success.
    pub examples: u32,
    /// Hard cap on shrink steps (property re-evaluations during shrinking).
    pub max_shrink: u32,
    /// Traversal order over the shrink tree.
    pub shrink_strategy: ShrinkStrategy,
    /// Request per-example subtest isolation from the host.
    pub use_subtests: bool,
    /// Worker count; `1` means sequential.
    pub parallelism: u32,
    /// In parallel mode, cancel peers once any worker fails.
    pub stop_on_first_failure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 0,
            examples: 100,
            max_shrink: 400,
            shrink_strategy: ShrinkStrategy::Bfs,
            use_subtests: true,
            parallelism: 1,
            stop_on_first_failure: true,
        }
    }
}

/// The recognized flag keys, without the leading dashes.
const FLAG_SEED: &str = "propx.seed";
const FLAG_EXAMPLES: &str = "propx.examples";
const FLAG_MAX_SHRINK: &str = "propx.maxshrink";
const FLAG_STRATEGY: &str = "propx.shrink.strategy";
const FLAG_SUBTESTS: &str = "propx.shrink.subtests";
const FLAG_PARALLEL: &str = "propx.shrink.parallel";

impl Config {
    /// Defaults overridden by any `-propx.*=value` tokens in the process
    /// arguments. Tokens that do not start with `-propx.` are ignored, so
    /// this coexists with the host test runner's own flags.
    pub fn from_env() -> Result<Self, PropertyError> {
        Self::from_args(std::env::args().skip(1))
    }

    /// Defaults overridden by `-propx.*=value` tokens from `args`.
    /// A leading `--` is accepted as well.
    pub fn from_args<I, S>(args: I) -> Result<Self, PropertyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cfg = Config::default();
        for arg in args {
            let arg = arg.as_ref();
            let trimmed = arg.trim_start_matches('-');
            if trimmed.len() == arg.len() || !trimmed.starts_with("propx.") {
                continue;
            }
            let (key, value) = trimmed.split_once('=').ok_or_else(|| {
                PropertyError::config_error(
                    format!("flag {:?} is missing \"=<value>\"", arg),
                    Some(trimmed),
                )
            })?;
            match key {
                FLAG_SEED => cfg.seed = parse_flag(key, value)?,
                FLAG_EXAMPLES => cfg.examples = parse_flag(key, value)?,
                FLAG_MAX_SHRINK => cfg.max_shrink = parse_flag(key, value)?,
                FLAG_STRATEGY => cfg.shrink_strategy = value.parse()?,
                FLAG_SUBTESTS => cfg.use_subtests = parse_bool(key, value)?,
                FLAG_PARALLEL => cfg.parallelism = parse_flag(key, value)?,
                other => {
                    return Err(PropertyError::config_error(
                        format!("unknown flag -{}", other),
                        Some(other),
                    ));
                }
            }
        }
        Ok(cfg)
    }

    /// The effective worker count: at least one.
    pub fn workers(&self) -> u32 {
        self.parallelism.max(1)
    }

    /// Defaults with one sampling worker per available core.
    pub fn parallel() -> Self {
        Self {
            parallelism: num_cpus::get() as u32,
            ..Self::default()
        }
    }
}

fn parse_flag<T: FromStr>(key: &str, value: &str) -> Result<T, PropertyError> {
    value.parse().map_err(|_| {
        PropertyError::config_error(format!("invalid value {:?}", value), Some(key))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, PropertyError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(PropertyError::config_error(
            format!("invalid boolean {:?}", value),
            Some(key),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.seed, 0);
        assert_eq!(cfg.examples, 100);
        assert_eq!(cfg.max_shrink, 400);
        assert_eq!(cfg.shrink_strategy, ShrinkStrategy::Bfs);
        assert!(cfg.use_subtests);
        assert_eq!(cfg.parallelism, 1);
        assert!(cfg.stop_on_first_failure);
    }

    #[test]
    fn test_from_args_overrides() {
        let cfg = Config::from_args([
            "-propx.seed=42",
            "-propx.examples=10",
            "-propx.maxshrink=50",
            "-propx.shrink.strategy=dfs",
            "-propx.shrink.subtests=false",
            "-propx.shrink.parallel=4",
        ])
        .unwrap();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.examples, 10);
        assert_eq!(cfg.max_shrink, 50);
        assert_eq!(cfg.shrink_strategy, ShrinkStrategy::Dfs);
        assert!(!cfg.use_subtests);
        assert_eq!(cfg.parallelism, 4);
    }

    #[test]
    fn test_from_args_ignores_foreign_flags() {
        let cfg = Config::from_args(["--nocapture", "my_test_filter", "-q"]).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_from_args_double_dash_and_case() {
        let cfg = Config::from_args(["--propx.shrink.strategy=DFS"]).unwrap();
        assert_eq!(cfg.shrink_strategy, ShrinkStrategy::Dfs);
    }

    #[test]
    fn test_from_args_rejects_unknown_propx_key() {
        let err = Config::from_args(["-propx.bogus=1"]).unwrap_err();
        assert!(matches!(err, PropertyError::ConfigError { .. }));
    }

    #[test]
    fn test_from_args_rejects_bad_value() {
        let err = Config::from_args(["-propx.examples=lots"]).unwrap_err();
        assert!(matches!(err, PropertyError::ConfigError { .. }));
    }

    #[test]
    fn test_size_len_bounds_clamp_negative() {
        let size = Size::new(-5, 3);
        assert_eq!(size.len_bounds(), (0, 3));
        assert_eq!(Size::ZERO.len_bounds(), (0, 0));
    }

    #[test]
    fn test_size_new_normalizes() {
        assert_eq!(Size::new(9, 2), Size { min: 2, max: 9 });
    }
}
