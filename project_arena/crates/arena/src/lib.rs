pub mod catalog;
pub mod commands;
pub mod components;
pub mod parser;
pub mod world;

pub use catalog::{CatalogConfig, ConfigLoadoutCatalog};
pub use commands::{ArenaService, ArenaSettings, ArenaStatus, CommandReply};
pub use parser::{parse_command, ArenaCommand};
pub use world::CharacterWorld;
