use crate::logging::{LOGGER_NAME, Severity};
use crate::processor::Value;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Environment variable naming the configuration file read by [`Config::load`].
pub const CONFIG_ENV_VAR: &str = "AVERAGER_CONFIG";

/// Runtime configuration.
///
/// Every field has a default, so a configuration file only needs the entries
/// it overrides.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logger settings.
    pub log: LogConfig,

    /// Values averaged by the binary.
    pub sample: Vec<Value>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Logger name written into every line.
    pub name: String,
    /// File the file sink appends to.
    pub file: PathBuf,
    /// Minimum severity delivered to both sinks.
    pub level: Severity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            sample: [10, 20, 30, 40, 50].into_iter().map(Value::Int).collect(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: LOGGER_NAME.to_owned(),
            file: PathBuf::from("logs/aplicacao.log"),
            level: Severity::Debug,
        }
    }
}

impl Config {
    /// Load the file named by [`CONFIG_ENV_VAR`], or the defaults if it is unset.
    pub fn load() -> Result<Self> {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(file) => Self::from_file(file),
            None => Ok(Self::default()),
        }
    }

    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let name = &self.log.name;
        if name.trim().is_empty() {
            bail!("logger name must not be empty");
        }
        if name.contains(['\n', '\r']) {
            bail!("logger name must be a single line, but is {name:?}");
        }
        if name.contains(" - ") {
            bail!("logger name must not contain the field separator \" - \", but is {name:?}");
        }
        if self.log.file.as_os_str().is_empty() {
            bail!("log file path must not be empty");
        }
        Ok(())
    }
}
