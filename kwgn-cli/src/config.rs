use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use kwgn_core::ExtractionStrategy;
use kwgn_ingest::KwgnCli;

use crate::state::ensure_kwgn_home;

/// Overrides `engine.config_path` when set
pub const CONFIG_PATH_ENV: &str = "KWGN_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Extraction binary, looked up on PATH when not absolute
    pub command: String,
    /// Passed to the engine as `--config`
    pub config_path: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Fallback order, by statement type key
    pub strategies: Vec<String>,
    /// Where uploads are staged; system temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            command: "kwgn".to_string(),
            config_path: None,
            timeout_secs: kwgn_ingest::DEFAULT_TIMEOUT.as_secs(),
            strategies: ExtractionStrategy::ALL
                .iter()
                .map(|s| s.key().to_string())
                .collect(),
            scratch_dir: None,
        }
    }
}

impl EngineSection {
    pub fn strategies(&self) -> Result<Vec<ExtractionStrategy>> {
        ExtractionStrategy::parse_list(&self.strategies).context("engine.strategies")
    }

    /// Engine config file, with the environment taking precedence.
    pub fn resolved_config_path(&self) -> Option<PathBuf> {
        resolve_config_path(std::env::var_os(CONFIG_PATH_ENV), self.config_path.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn build_engine(&self) -> KwgnCli {
        KwgnCli::new(&self.command)
            .with_config(self.resolved_config_path())
            .with_timeout(self.timeout())
    }
}

fn resolve_config_path(
    env: Option<std::ffi::OsString>,
    configured: Option<PathBuf>,
) -> Option<PathBuf> {
    env.filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or(configured)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_kwgn_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        debug!(path = %p.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    debug!(path = %p.display(), "loading config");
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    let source = if p.exists() { "file" } else { "defaults" };
    println!("# {} ({source})", p.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    if let Some(resolved) = cfg.engine.resolved_config_path() {
        println!("# engine config in effect: {}", resolved.display());
    }
    Ok(())
}
