//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/cql/config.toml.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use contactql::Environment;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# cql - contact query configuration

# Config schema version (do not modify)
version = 1

# Fields, groups and flows that queries are resolved against.
# Relative paths are relative to this file.
# assets = "assets.json"

[environment]
# default_country = "RW"          # ISO-3166 alpha-2, for local phone numbers
# timezone = "UTC"                # IANA name, for date literals
# date_format = "YYYY-MM-DD"      # or "DD-MM-YYYY", "MM-DD-YYYY"
# redaction_policy = "none"       # or "urns"
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Assets file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<PathBuf>,

    /// Settings queries are parsed against.
    #[serde(default)]
    pub environment: Environment,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            assets: None,
            environment: Environment::default(),
        }
    }
}

impl Config {
    /// Parses a config file's contents.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;
        config.version = CONFIG_VERSION;
        Ok(config)
    }
}

/// Gets the config file path.
///
/// Uses the `--config` flag (or `CQL_CONFIG`) if given, then
/// `$XDG_CONFIG_HOME/cql/config.toml`, then `~/.config/cql/config.toml`.
pub fn get_config_path(ctx: &CommandContext) -> Result<PathBuf> {
    if let Some(path) = &ctx.config_path {
        return Ok(path.clone());
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("cql").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("cql").join("config.toml"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from disk. A missing file gives the defaults.
pub fn load_config(ctx: &CommandContext) -> Result<Config> {
    let path = get_config_path(ctx)?;
    load_config_from(&path)
}

fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let mut config = Config::from_toml_str(&content)?;

    // assets paths in the file are relative to it
    if let (Some(assets), Some(dir)) = (&config.assets, path.parent()) {
        if assets.is_relative() {
            config.assets = Some(dir.join(assets));
        }
    }

    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config(ctx)?;
    let path = get_config_path(ctx)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        match &config.assets {
            Some(assets) => println!("assets: {}", assets.display()),
            None => println!("assets: (none)"),
        }

        let env = &config.environment;
        println!("\n[environment]");
        println!(
            "  default_country: {}",
            env.default_country.as_deref().unwrap_or("(none)")
        );
        println!("  timezone: {}", env.timezone);
        println!("  date_format: {}", serde_label(&env.date_format)?);
        println!("  redaction_policy: {}", serde_label(&env.redaction_policy)?);

        if !path.exists() {
            println!("\n(No config file exists. Run 'cql config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path(ctx)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path(ctx)?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created config at: {}", path.display());
    }

    Ok(())
}

/// Renders a unit enum the way it's written in the config file.
fn serde_label<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}
