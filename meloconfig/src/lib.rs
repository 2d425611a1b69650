//! Layered YAML configuration shared by the Melo crates
//!
//! A [`Config`] is built from three layers, later ones winning:
//!
//! 1. the defaults compiled in from `melo.yaml`
//! 2. `config.yaml` in the configuration directory
//! 3. `MELO_CONFIG__SECTION__KEY=value` environment variables
//!
//! The merged document is written back to `config.yaml` on load and after
//! each setter, so the file always shows every effective setting. Keys are
//! case-insensitive.
//!
//! Crates layer typed accessors on top through extension traits
//! (`ApiConfigExt` in `meloapi`, `SessionConfigExt` in `melosession`,
//! `ViewConfigExt` in `meloview`).
//!
//! ```no_run
//! use meloconfig::get_config;
//!
//! let config = get_config();
//! let level = config.get_log_min_level()?;
//! config.set_log_enable_console(false)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use serde_yaml::{Number, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, info, warn};

mod yaml;

const EMBEDDED_DEFAULTS: &str = include_str!("melo.yaml");
const CONFIG_FILE: &str = "config.yaml";
const DIR_ENV: &str = "MELO_CONFIG";
const OVERRIDE_PREFIX: &str = "MELO_CONFIG__";
const DIR_NAME: &str = ".melo";

const LOGGER_MIN_LEVEL: &[&str] = &["host", "logger", "min_level"];
const LOGGER_CONSOLE: &[&str] = &["host", "logger", "enable_console"];

lazy_static! {
    static ref GLOBAL: Arc<Config> =
        Arc::new(Config::load_config("").expect("cannot load the Melo configuration"));
}

/// Process-wide configuration, loaded on first use from the default location
pub fn get_config() -> Arc<Config> {
    GLOBAL.clone()
}

/// In-memory configuration document backed by `config.yaml`
#[derive(Debug)]
pub struct Config {
    dir: String,
    file: PathBuf,
    tree: Mutex<Value>,
}

impl Config {
    /// Resolve the configuration directory, creating it when missing
    ///
    /// An explicit `directory` wins. Otherwise `$MELO_CONFIG`, then an
    /// existing `./.melo`, then an existing `~/.melo`, and finally `./.melo`
    /// is created. The directory must be writable.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = locate_dir(directory);
        ensure_writable_dir(Path::new(&dir))
            .with_context(|| format!("unusable configuration directory {}", dir))?;
        Ok(dir)
    }

    /// Build the configuration for `directory` (see [`Config::config_dir`])
    pub fn load_config(directory: &str) -> Result<Self> {
        let dir = Self::config_dir(directory)?;
        let file = Path::new(&dir).join(CONFIG_FILE);
        info!(config_dir = %dir, "Using config directory");

        let mut tree: Value = serde_yaml::from_str(EMBEDDED_DEFAULTS)?;
        match fs::read_to_string(&file) {
            Ok(text) => {
                let user: Value = serde_yaml::from_str(&text)
                    .with_context(|| format!("invalid YAML in {}", file.display()))?;
                // an empty file parses as null
                if !user.is_null() {
                    yaml::merge(&mut tree, &yaml::lower_keys(user));
                }
                info!(config_file = %file.display(), "Loaded config file");
            }
            Err(_) => {
                info!(config_file = %file.display(), "No config file, starting from defaults")
            }
        }
        let mut tree = yaml::lower_keys(tree);

        for (name, raw) in env::vars() {
            let Some(rest) = name.strip_prefix(OVERRIDE_PREFIX) else {
                continue;
            };
            let path: Vec<&str> = rest.split("__").collect();
            match yaml::assign(&mut tree, &path, yaml::parse_env_value(&raw)) {
                Ok(()) => debug!(variable = %name, "Applied environment override"),
                Err(e) => warn!(variable = %name, error = %e, "Ignoring environment override"),
            }
        }

        let config = Config {
            dir,
            file,
            tree: Mutex::new(tree),
        };
        config.save()?;
        Ok(config)
    }

    fn tree(&self) -> Result<MutexGuard<'_, Value>> {
        match self.tree.lock() {
            Ok(guard) => Ok(guard),
            Err(_) => bail!("configuration lock poisoned"),
        }
    }

    /// Directory holding `config.yaml`; relative paths resolve against it
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Write the current document to `config.yaml`
    pub fn save(&self) -> Result<()> {
        let text = serde_yaml::to_string(&*self.tree()?)?;
        fs::write(&self.file, text)
            .with_context(|| format!("cannot write {}", self.file.display()))
    }

    /// Raw value at `path`; an error when any segment is missing
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        yaml::lookup(&*self.tree()?, path).cloned()
    }

    /// Store `value` at `path` and persist the document
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        yaml::assign(&mut *self.tree()?, path, value)?;
        self.save()
    }

    /// Non-empty string at `path`, else `default`
    pub fn get_string(&self, path: &[&str], default: &str) -> String {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => default.to_string(),
        }
    }

    pub fn get_u64(&self, path: &[&str], default: u64) -> u64 {
        match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Ok(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                warn!(path = %path.join("."), value = %s, "Not an integer, using {}", default);
                default
            }),
            _ => default,
        }
    }

    pub fn get_f64(&self, path: &[&str], default: f64) -> f64 {
        match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_f64().unwrap_or(default),
            Ok(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                warn!(path = %path.join("."), value = %s, "Not a number, using {}", default);
                default
            }),
            _ => default,
        }
    }

    pub fn set_string(&self, path: &[&str], value: impl Into<String>) -> Result<()> {
        self.set_value(path, Value::String(value.into()))
    }

    pub fn set_u64(&self, path: &[&str], value: u64) -> Result<()> {
        self.set_value(path, Value::Number(Number::from(value)))
    }

    pub fn set_f64(&self, path: &[&str], value: f64) -> Result<()> {
        self.set_value(path, Value::Number(Number::from(value)))
    }

    /// `path` itself when absolute, else joined onto [`Config::dir`]
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            Path::new(&self.dir).join(candidate)
        }
    }

    pub fn get_log_min_level(&self) -> Result<String> {
        Ok(self.get_string(LOGGER_MIN_LEVEL, "INFO"))
    }

    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_string(LOGGER_MIN_LEVEL, level)
    }

    pub fn get_log_enable_console(&self) -> Result<bool> {
        Ok(match self.get_value(LOGGER_CONSOLE) {
            Ok(Value::Bool(enabled)) => enabled,
            _ => true,
        })
    }

    pub fn set_log_enable_console(&self, enabled: bool) -> Result<()> {
        self.set_value(LOGGER_CONSOLE, Value::Bool(enabled))
    }
}

fn locate_dir(explicit: &str) -> String {
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    if let Ok(from_env) = env::var(DIR_ENV) {
        info!(env_var = DIR_ENV, path = %from_env, "Config directory taken from environment");
        return from_env;
    }
    let home = dirs::home_dir().map(|home| home.join(DIR_NAME));
    [Some(PathBuf::from(DIR_NAME)), home]
        .into_iter()
        .flatten()
        .find(|candidate| candidate.is_dir())
        .map(|found| found.to_string_lossy().into_owned())
        .unwrap_or_else(|| DIR_NAME.to_string())
}

fn ensure_writable_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let probe = dir.join(".melo-write-probe");
    fs::write(&probe, b"")?;
    fs::remove_file(&probe)?;
    Ok(())
}
