use crate::cli::{Cli, VerbosityLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub schema: SchemaConfig,
    pub output: OutputConfig,
}

/// How the input stream is decoded before parsing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct InputConfig {
    /// Input is gzip-compressed
    pub gunzip: bool,
    /// Replace malformed UTF-8 with U+FFFD instead of failing the parse
    pub replace_malformed: bool,
}

/// Schema selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SchemaConfig {
    /// XSD file to validate against; the bundled MARC 21 slim schema when unset
    pub path: Option<PathBuf>,
}

/// Diagnostic output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Verbose logging
    pub verbose: bool,
    /// Quiet mode (errors only)
    pub quiet: bool,
}

impl Config {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.output.quiet {
            VerbosityLevel::Quiet
        } else if self.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: file -> environment -> CLI
    pub fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli)
    }

    /// Load configuration, reading environment overrides from `env`
    pub fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path)?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file()? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;

        // CLI arguments have the highest precedence
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "marc-validate.toml",
            "marc-validate.json",
            ".marc-validate.toml",
            ".marc-validate.json",
        ];

        // Check current directory first
        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path)?));
            }
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("marc-validate");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path)?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(schema) = env.get("MARC_VALIDATE_SCHEMA")
            && !schema.is_empty()
        {
            config.schema.path = Some(PathBuf::from(schema));
        }

        if let Some(value) = parse_flag(env, "MARC_VALIDATE_GUNZIP")? {
            config.input.gunzip = value;
        }
        if let Some(value) = parse_flag(env, "MARC_VALIDATE_REPLACE_MALFORMED")? {
            config.input.replace_malformed = value;
        }
        if let Some(value) = parse_flag(env, "MARC_VALIDATE_VERBOSE")? {
            config.output.verbose = value;
        }
        if let Some(value) = parse_flag(env, "MARC_VALIDATE_QUIET")? {
            config.output.quiet = value;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence).
    ///
    /// Flags can only switch a setting on; an absent flag keeps the
    /// configured value.
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if cli.gunzip {
            config.input.gunzip = true;
        }
        if cli.replace_malformed {
            config.input.replace_malformed = true;
        }

        if let Some(schema) = &cli.schema {
            config.schema.path = Some(schema.clone());
        }

        // Verbosity flags conflict on the command line, so one replaces the other
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        config
    }

    /// Merge two configurations (second takes precedence for set values)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        base.input.gunzip = override_config.input.gunzip;
        base.input.replace_malformed = override_config.input.replace_malformed;

        if override_config.schema.path.is_some() {
            base.schema.path = override_config.schema.path;
        }

        base.output.verbose = override_config.output.verbose;
        base.output.quiet = override_config.output.quiet;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if let Some(schema) = &config.schema.path
            && !schema.is_file()
        {
            return Err(ConfigError::Validation(format!(
                "Schema file does not exist: {}",
                schema.display()
            )));
        }

        Ok(())
    }
}

fn parse_flag(env: &impl EnvProvider, key: &str) -> Result<Option<bool>> {
    let Some(raw) = env.get(key) else {
        return Ok(None);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::Environment(format!(
            "Invalid {} value: {}",
            key, raw
        ))),
    }
}
