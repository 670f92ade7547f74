//! Configuration file loader with multi-source merging

use super::file_config::{ConfigError, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file name
pub const PROJECT_CONFIG_FILE: &str = "vigil.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "VIGIL_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `VIGIL_*` environment variables (`VIGIL_AGENT__MAX_RETRIES=5`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./vigil.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/vigil/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        Self::figment(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path,
        )?
        .extract()
        .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    fn figment(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<Figment, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(path) = global
            && path.exists()
        {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/vigil/config.toml`, or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vigil").join("config.toml"))
    }

    /// The project-level config file, if present
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_CONFIG_FILE);
        path.exists().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.agent.max_retries, 3);
        assert!(config.tools.custom.is_empty());
    }

    #[test]
    fn test_global_config_path() {
        if let Some(path) = ConfigLoader::global_config_path() {
            assert!(path.ends_with("vigil/config.toml"));
        }
    }

    #[test]
    fn test_later_files_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("vigil.toml");
        fs::write(&global, "[agent]\nmax_retries = 1\nparallel = true\n").unwrap();
        fs::write(&project, "[agent]\nmax_retries = 5\n").unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&global), Some(&project), None)
            .unwrap()
            .extract()
            .unwrap();
        assert_eq!(config.agent.max_retries, 5);
        assert!(config.agent.parallel);
        assert_eq!(config.agent.max_plan_attempts, 3);
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("vigil.toml");
        let explicit = dir.path().join("run.toml");
        fs::write(&project, "[safety]\nmax_steps = 10\n").unwrap();
        fs::write(&explicit, "[safety]\nmax_steps = 3\n").unwrap();

        let config: FileConfig = ConfigLoader::figment(None, Some(&project), Some(&explicit))
            .unwrap()
            .extract()
            .unwrap();
        assert_eq!(config.safety.max_steps, 3);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            ConfigLoader::figment(None, None, Some(&missing)),
            Err(ConfigError::Missing(path)) if path == missing
        ));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("bad.toml");
        fs::write(&explicit, "[agent]\nmax_retries = \"many\"\n").unwrap();
        let result: Result<FileConfig, _> =
            ConfigLoader::figment(None, None, Some(&explicit)).unwrap().extract();
        assert!(result.is_err());
    }
}
