use crate::callbacks::CallbackSpec;
use crate::errors::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".compose-fixture.yml";

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub compose: ComposeConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub callbacks: Vec<CallbackSpec>,
}

/// Which orchestration CLI to invoke
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProgramSetting {
    /// `docker-compose`
    #[default]
    DockerCompose,
    /// `docker compose`
    DockerComposePlugin,
    /// Probe for `docker compose`, fall back to `docker-compose`
    Auto,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ComposeConfig {
    #[serde(default)]
    pub program: ProgramSetting,
    #[serde(default = "default_docker")]
    pub docker: String,
    #[serde(default = "default_network_env_var")]
    pub network_env_var: String,
    #[serde(default = "default_warning_marker")]
    pub warning_marker: String,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            program: ProgramSetting::default(),
            docker: default_docker(),
            network_env_var: default_network_env_var(),
            warning_marker: default_warning_marker(),
        }
    }
}

fn default_docker() -> String {
    "docker".to_string()
}

fn default_network_env_var() -> String {
    "CORE_PEER_NETWORKID".to_string()
}

fn default_warning_marker() -> String {
    "WARNING".to_string()
}

/// When container logs are saved after a scenario
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogPolicy {
    #[default]
    Never,
    OnFailure,
    Force,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LogsConfig {
    #[serde(default)]
    pub policy: LogPolicy,
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Name filter for containers spawned outside the compose files
    #[serde(default = "default_sibling_filter")]
    pub sibling_filter: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            policy: LogPolicy::default(),
            dir: default_log_dir(),
            sibling_filter: default_sibling_filter(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_sibling_filter() -> String {
    "dev-".to_string()
}

impl Config {
    /// Load config from .compose-fixture.yml in `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            // No config file, return defaults
            return Ok(Config::default());
        }

        Self::load_file(&config_path)
    }

    /// Load config from an explicit file path
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_yml::from_str(&content).map_err(|e| {
            FixtureError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Find the nearest .compose-fixture.yml walking up from `start_path`,
    /// then the user-level config, then defaults
    pub fn discover(start_path: &Path) -> Result<Self> {
        if let Some(path) = Self::find_config_file(start_path) {
            return Self::load_file(&path);
        }

        match Self::user_config_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => Ok(Config::default()),
        }
    }

    fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// ~/.config/compose-fixture/config.yml (platform equivalent)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("compose-fixture").join("config.yml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.compose.program, ProgramSetting::DockerCompose);
        assert_eq!(config.compose.docker, "docker");
        assert_eq!(config.compose.network_env_var, "CORE_PEER_NETWORKID");
        assert_eq!(config.compose.warning_marker, "WARNING");
        assert_eq!(config.logs.policy, LogPolicy::Never);
        assert!(config.callbacks.is_empty());
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path()).unwrap();
        assert!(config.callbacks.is_empty());
        assert_eq!(config.logs.dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let yaml = r#"
compose:
  program: docker-compose-plugin
  network_env_var: NETWORK_ID

logs:
  policy: on_failure
  dir: target/logs

callbacks:
  - name: genesis
    composing: "mkdir -p volumes/$FIXTURE_PROJECT_NAME"
    decomposing: "rm -rf volumes/$FIXTURE_PROJECT_NAME"
    env:
      ORDERER_GENERAL_GENESISMETHOD: file
"#;

        let mut file = fs::File::create(&config_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = Config::load(temp_dir.path()).unwrap();
        assert_eq!(config.compose.program, ProgramSetting::DockerComposePlugin);
        assert_eq!(config.compose.network_env_var, "NETWORK_ID");
        // Unspecified keys keep their defaults
        assert_eq!(config.compose.warning_marker, "WARNING");
        assert_eq!(config.logs.policy, LogPolicy::OnFailure);
        assert_eq!(config.logs.dir, PathBuf::from("target/logs"));
        assert_eq!(config.logs.sibling_filter, "dev-");
        assert_eq!(config.callbacks.len(), 1);
        assert_eq!(config.callbacks[0].name, "genesis");
        assert!(config.callbacks[0].env.is_some());
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "logs:\n  policy: sometimes\n",
        )
        .unwrap();

        match Config::load(temp_dir.path()) {
            Err(FixtureError::ConfigError(msg)) => assert!(msg.contains(CONFIG_FILE_NAME)),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_walks_parents() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "compose:\n  program: auto\n",
        )
        .unwrap();
        let nested = temp_dir.path().join("features").join("steps");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover(&nested).unwrap();
        assert_eq!(config.compose.program, ProgramSetting::Auto);
    }
}
