use std::path::Path;

use serde::Deserialize;

use arena::{ArenaSettings, CatalogConfig};
use session::{Position, SessionOptions};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistSection {
    pub enabled: bool,
    pub save_dir: String,
}

impl Default for PersistSection {
    fn default() -> Self {
        Self {
            enabled: true,
            save_dir: "data/arena_snapshots".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArenaSection {
    /// Where entering players are sent. Unset disables entry.
    pub spawn_point: Option<[f32; 3]>,
    pub default_loadout: String,
    pub name_prefix: String,
    pub rollback_failed_entry: bool,
    pub unlock_all_bosses: bool,
}

impl Default for ArenaSection {
    fn default() -> Self {
        Self {
            spawn_point: None,
            default_loadout: "default".to_string(),
            name_prefix: "[Arena] ".to_string(),
            rollback_failed_entry: true,
            unlock_all_bosses: false,
        }
    }
}

/// Top-level arena server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub logging: LoggingSection,
    pub persistence: PersistSection,
    pub arena: ArenaSection,
    pub catalog: CatalogConfig,
}

impl ServerConfig {
    /// Load configuration from an optional TOML file path.
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        Ok(config)
    }

    pub fn to_session_options(&self) -> SessionOptions {
        SessionOptions {
            name_prefix: self.arena.name_prefix.clone(),
            rollback_failed_entry: self.arena.rollback_failed_entry,
            unlock_all_bosses: self.arena.unlock_all_bosses,
        }
    }

    pub fn to_arena_settings(&self) -> ArenaSettings {
        ArenaSettings {
            spawn_point: self.arena.spawn_point.map(Position::from),
            default_loadout: self.arena.default_loadout.clone(),
            options: self.to_session_options(),
        }
    }
}

/// Parse CLI arguments and load config.
/// Supports: --config <path>
pub fn parse_cli_args() -> ServerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(val) = args.get(i + 1) {
                    config_path = Some(val.as_str());
                    i += 2;
                } else {
                    eprintln!("--config requires a path argument");
                    std::process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    match ServerConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}
