// Chat command parsing.

use thiserror::Error;

use fifadraft_core::chat::RosterDetail;
use fifadraft_core::orchestrator::DEFAULT_UNPICKED_LIMIT;

const START_DRAFT: &str = "SD";
const SHOW_BIG_TEAM: &str = "SBT";
const SHOW_SMALL_TEAM: &str = "SST";
const UNPICKED: &str = "Unpicked";
const HELP: &str = "PlsHelp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartDraft,
    ShowTeam { name: String, detail: RosterDetail },
    Unpicked { limit: usize },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: {prefix}{command} <player_name>")]
    MissingName { prefix: String, command: String },

    #[error("`{0}` is not a number of players to list")]
    InvalidLimit(String),
}

/// Parse one chat line. `None` when the line is not a known command.
///
/// Command names match case-insensitively. A leading `@` on a name argument
/// is dropped so mentions work.
pub fn parse(text: &str, prefix: &str) -> Option<Result<Command, CommandError>> {
    let rest = text.trim().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    let arg = parts.collect::<Vec<_>>().join(" ");

    let command = if name.eq_ignore_ascii_case(START_DRAFT) {
        Ok(Command::StartDraft)
    } else if name.eq_ignore_ascii_case(SHOW_BIG_TEAM) {
        team(prefix, SHOW_BIG_TEAM, &arg, RosterDetail::Full)
    } else if name.eq_ignore_ascii_case(SHOW_SMALL_TEAM) {
        team(prefix, SHOW_SMALL_TEAM, &arg, RosterDetail::Brief)
    } else if name.eq_ignore_ascii_case(UNPICKED) {
        unpicked(&arg)
    } else if name.eq_ignore_ascii_case(HELP) {
        Ok(Command::Help)
    } else {
        return None;
    };
    Some(command)
}

fn team(prefix: &str, command: &str, arg: &str, detail: RosterDetail) -> Result<Command, CommandError> {
    let name = arg.trim_start_matches('@').trim();
    if name.is_empty() {
        return Err(CommandError::MissingName {
            prefix: prefix.to_string(),
            command: command.to_string(),
        });
    }
    Ok(Command::ShowTeam {
        name: name.to_string(),
        detail,
    })
}

fn unpicked(arg: &str) -> Result<Command, CommandError> {
    if arg.is_empty() {
        return Ok(Command::Unpicked {
            limit: DEFAULT_UNPICKED_LIMIT,
        });
    }
    arg.parse::<usize>()
        .map(|limit| Command::Unpicked { limit })
        .map_err(|_| CommandError::InvalidLimit(arg.to_string()))
}
