use std::io::{self, BufRead, Write};

use arena::{parse_command, ArenaCommand, CharacterWorld};
use project_arena::app::build_service;
use project_arena::config::parse_cli_args;
use session::{PlayerId, Position};

const PROMPT_HELP: &str =
    "input: <player id> <command>, 'spawn <player id> <name>', or 'quit'. Try '1 help'.";

fn main() {
    let config = parse_cli_args();
    observability::init_logging(&config.logging.filter);
    tracing::info!("Arena console starting...");

    let (service, report) = match build_service(&config) {
        Ok(built) => built,
        Err(e) => {
            tracing::error!("Failed to open snapshot store: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        loaded = report.loaded,
        dropped = report.dropped.len(),
        "snapshot store ready"
    );

    let mut world = CharacterWorld::new();
    println!("{PROMPT_HELP}");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!("stdin read failed: {}", e);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" {
            break;
        }

        let reply = handle_line(&service, &mut world, trimmed);
        if writeln!(stdout, "{reply}").is_err() {
            break;
        }
    }

    if let Err(e) = service.shutdown() {
        tracing::error!("Failed to flush snapshots: {}", e);
    }
    tracing::info!("Arena console stopped.");
}

fn handle_line(service: &arena::ArenaService, world: &mut CharacterWorld, line: &str) -> String {
    let mut parts = line.splitn(2, ' ');
    let head = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    if head == "spawn" {
        let mut args = rest.splitn(2, ' ');
        let id = args.next().and_then(|s| s.parse::<u64>().ok());
        let name = args.next().map(str::trim).filter(|n| !n.is_empty());
        return match (id, name) {
            (Some(id), Some(name)) => {
                let player = PlayerId(id);
                if world.find_character(player).is_some() {
                    format!("player {player} already has a character")
                } else {
                    world.spawn_character(player, name, Position::default());
                    format!("spawned {name} for player {player}")
                }
            }
            _ => "usage: spawn <player id> <name>".to_string(),
        };
    }

    let Ok(id) = head.parse::<u64>() else {
        return PROMPT_HELP.to_string();
    };
    let command = parse_command(rest);
    if let ArenaCommand::Unknown(input) = &command {
        tracing::debug!(input = %input, "unrecognized command");
    }
    service.execute(world, PlayerId(id), &command).to_string()
}
