use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR_NAME: &str = "yuko";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverPolicy {
    pub acceptance_threshold: f64,
    pub min_main_exe_bytes: u64,
    pub min_real_exe_bytes: u64,
    pub min_walk_exe_bytes: u64,
    pub max_walk_inspected: usize,
    pub containment_word_score: f64,
    pub min_containment_token_chars: usize,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.3,
            min_main_exe_bytes: 200 * 1024,
            min_real_exe_bytes: 5_000_000,
            min_walk_exe_bytes: 10_000,
            max_walk_inspected: 5_000,
            containment_word_score: 0.3,
            min_containment_token_chars: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,
    pub catalog_path: PathBuf,
    pub aliases_path: PathBuf,
    pub cache_path: PathBuf,
    pub logs_dir: PathBuf,
    pub start_menu_roots: Vec<PathBuf>,
    pub program_roots: Vec<PathBuf>,
    pub search_roots: Vec<PathBuf>,
    pub policy: ResolverPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            config_path: base.join(CONFIG_FILE_NAME),
            catalog_path: base.join("app_index.json"),
            aliases_path: base.join("aliases.json"),
            cache_path: base.join("apps.json"),
            logs_dir: base.join("logs"),
            start_menu_roots: default_start_menu_roots(),
            program_roots: default_program_roots(),
            search_roots: default_search_roots(),
            policy: ResolverPolicy::default(),
        }
    }
}

impl Config {
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            config_path: base.join(CONFIG_FILE_NAME),
            catalog_path: base.join("app_index.json"),
            aliases_path: base.join("aliases.json"),
            cache_path: base.join("apps.json"),
            logs_dir: base.join("logs"),
            ..Self::default()
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    stable_app_data_dir().join(CONFIG_FILE_NAME)
}

pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(Config {
            config_path: path,
            ..Config::default()
        });
    }

    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let mut config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    config.config_path = path;
    validate(&config)?;
    Ok(config)
}

pub fn save(config: &Config) -> Result<(), ConfigError> {
    let path = &config.config_path;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
    }
    let raw = toml::to_string_pretty(config)?;
    std::fs::write(path, raw).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let threshold = cfg.policy.acceptance_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(ConfigError::Invalid(
            "acceptance_threshold must be within (0, 1]".into(),
        ));
    }

    if cfg.policy.max_walk_inspected == 0 {
        return Err(ConfigError::Invalid(
            "max_walk_inspected must be positive".into(),
        ));
    }

    for (label, path) in [
        ("catalog_path", &cfg.catalog_path),
        ("aliases_path", &cfg.aliases_path),
        ("cache_path", &cfg.cache_path),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(format!("{label} is required")));
        }
    }

    Ok(())
}

pub fn default_start_menu_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(appdata) = env_dir("APPDATA") {
        roots.push(start_menu_programs(&appdata));
    }
    if let Some(program_data) = env_dir("ProgramData").or_else(|| windows_fallback(r"C:\ProgramData"))
    {
        roots.push(start_menu_programs(&program_data));
    }
    roots
}

pub fn default_program_roots() -> Vec<PathBuf> {
    [
        env_dir("ProgramFiles").or_else(|| windows_fallback(r"C:\Program Files")),
        env_dir("ProgramFiles(x86)").or_else(|| windows_fallback(r"C:\Program Files (x86)")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn default_search_roots() -> Vec<PathBuf> {
    let mut roots = default_program_roots();
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("AppData").join("Local").join("Programs"));
        roots.push(home.join("AppData").join("Roaming"));
    }
    roots
}

fn start_menu_programs(base: &Path) -> PathBuf {
    base.join("Microsoft")
        .join("Windows")
        .join("Start Menu")
        .join("Programs")
}

fn env_dir(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(target_os = "windows")]
fn windows_fallback(path: &str) -> Option<PathBuf> {
    Some(PathBuf::from(path))
}

#[cfg(not(target_os = "windows"))]
fn windows_fallback(_path: &str) -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    use super::{validate, Config, ResolverPolicy};

    #[test]
    fn default_policy_keeps_documented_thresholds() {
        let policy = ResolverPolicy::default();
        assert_eq!(policy.acceptance_threshold, 0.3);
        assert_eq!(policy.min_main_exe_bytes, 204_800);
        assert_eq!(policy.min_real_exe_bytes, 5_000_000);
        assert_eq!(policy.max_walk_inspected, 5_000);
    }

    #[test]
    fn rejects_zero_threshold() {
        let mut cfg = Config::default();
        cfg.policy.acceptance_threshold = 0.0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_empty_store_path() {
        let mut cfg = Config::default();
        cfg.aliases_path = Default::default();
        let error = validate(&cfg).expect_err("empty path should be rejected");
        assert!(error.to_string().contains("aliases_path"));
    }
}
