use std::env::{self, VarError};

use anyhow::{anyhow, Context, Result};

pub const MAX_CALL_DEPTH_VAR: &str = "JIDO_MAX_CALL_DEPTH";
pub const NO_NATIVES_VAR: &str = "JIDO_NO_NATIVES";

const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Knobs for a single interpreter session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nested user function calls allowed before the run is aborted
    pub max_call_depth: usize,
    /// Whether `clock` and friends are bound in the global environment
    pub install_natives: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            install_natives: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key))
    }

    // Split out so tests don't have to mutate the process environment
    fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let mut config = Config::default();

        match lookup(MAX_CALL_DEPTH_VAR) {
            Ok(raw) => {
                let depth = raw
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("{} is not a number: {:?}", MAX_CALL_DEPTH_VAR, raw))?;
                if depth == 0 {
                    return Err(anyhow!("{} must be at least 1", MAX_CALL_DEPTH_VAR));
                }
                config.max_call_depth = depth;
            }
            Err(VarError::NotPresent) => {}
            Err(err) => {
                return Err(err).with_context(|| format!("unable to read {}", MAX_CALL_DEPTH_VAR))
            }
        }

        if lookup(NO_NATIVES_VAR).is_ok() {
            config.install_natives = false;
        }

        Ok(config)
    }
}
