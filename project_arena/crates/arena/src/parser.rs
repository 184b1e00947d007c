use session::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaCommand {
    /// Optional loadout name; the configured default otherwise.
    Enter(Option<String>),
    Exit,
    Status,
    ReturnToOrigin,
    Loadouts,
    Count,
    ClearAll,
    Delete(PlayerId),
    Help,
    /// A known command with a bad argument; carries its usage line.
    Usage(&'static str),
    Unknown(String),
}

/// Parse one line of console or chat input.
pub fn parse_command(input: &str) -> ArenaCommand {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "enter" | "join" => {
            ArenaCommand::Enter((!arg.is_empty()).then(|| arg.to_string()))
        }
        "exit" | "leave" => ArenaCommand::Exit,
        "status" | "st" => ArenaCommand::Status,
        "return" | "home" => ArenaCommand::ReturnToOrigin,
        "loadouts" => ArenaCommand::Loadouts,
        "count" => ArenaCommand::Count,
        "clear" | "clearall" => ArenaCommand::ClearAll,
        "delete" | "del" => match arg.parse::<u64>() {
            Ok(id) => ArenaCommand::Delete(PlayerId(id)),
            Err(_) => ArenaCommand::Usage("delete <player id>"),
        },
        "help" | "?" => ArenaCommand::Help,
        _ => ArenaCommand::Unknown(trimmed.to_string()),
    }
}
