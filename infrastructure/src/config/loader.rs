//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Name of the project-level config file
pub const PROJECT_CONFIG_FILE: &str = "council.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "COUNCIL_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./council.toml`
    /// 3. XDG config: `$XDG_CONFIG_HOME/policy-council/config.toml`
    /// 4. `COUNCIL_*` environment variables
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, ENV_PREFIX)
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: Option<&Path>, env_prefix: &str) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Env::prefixed(env_prefix).split("__"));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/policy-council/config.toml if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("policy-council").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_CONFIG_FILE);
        path.exists().then_some(path)
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");

        if let Some(path) = config_path {
            let found = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:<7}] Explicit: {}", found, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND  ] Project:  {}", path.display());
        } else {
            println!("  [       ] Project:  ./{}", PROJECT_CONFIG_FILE);
        }

        if let Some(path) = Self::global_config_path() {
            let found = if path.exists() { "FOUND" } else { "" };
            println!("  [{:<7}] Global:   {}", found, path.display());
        }

        println!("  [       ] Env:      {}*", ENV_PREFIX);
        println!("  [       ] Default:  built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::GateMode;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.workflow.max_rounds, 5);
        assert_eq!(config.llm.default_model, "qwen-plus");
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("policy-council"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[workflow]
max_rounds = 3
seed = 11
gate_mode = "advisory"

[llm]
decider_model = "qwen-turbo"
"#
        )
        .unwrap();

        let config = ConfigLoader::figment(Some(&path), "COUNCIL_LOADER_TEST_")
            .extract::<FileConfig>()
            .unwrap();

        assert_eq!(config.workflow.max_rounds, 3);
        assert_eq!(config.workflow.seed, Some(11));
        assert_eq!(config.workflow.gate_mode, GateMode::Advisory);
        assert_eq!(config.llm.decider_model, "qwen-turbo");
        // untouched keys keep their defaults
        assert_eq!(config.workflow.memo_concurrency, 6);
        assert_eq!(config.llm.default_model, "qwen-plus");
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[workflow]\nmax_rounds = \"many\"\n").unwrap();

        let result = ConfigLoader::figment(Some(&path), "COUNCIL_LOADER_TEST_").extract::<FileConfig>();
        assert!(result.is_err());
    }
}
