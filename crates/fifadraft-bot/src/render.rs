// Chat text for every announcement.
//
// Markdown-flavoured plain text: `#` headings, fenced blocks for picks, and
// `[View Stats](url)` links.

use std::fmt::Write;

use fifadraft_core::chat::{Announcement, RosterDetail};
use fifadraft_core::draft::pick::PlayerRecord;

const RULE: &str = "-------------------";

/// Render one announcement. `prefix` is the command prefix shown in help.
pub fn announcement(announcement: &Announcement, prefix: &str) -> String {
    match announcement {
        Announcement::Welcome => "# Welcome to the FIFA Draft! How many players are playing?".into(),
        Announcement::JoinRequest { count } => {
            format!("Can the {count} players send any message one at a time?")
        }
        Announcement::SetupTimedOut => "Timed out. Please restart the draft.".into(),
        Announcement::NoParticipants => "Nobody to draft for. Please restart the draft.".into(),
        Announcement::TooManyParticipants { max } => {
            format!("At most {max} players can draft. Please restart the draft.")
        }
        Announcement::ParticipantsJoined { names } => {
            format!("```Players joined: {}```", names.join(", "))
        }
        Announcement::PositionPhaseStarted => "# Starting position-based draft...".into(),
        Announcement::PositionRound { position } => format!("## Drafting for {position} position"),
        Announcement::FreePickPhaseStarted { rounds } => {
            format!("# Free Pick Rounds: {rounds} rounds to pick any players")
        }
        Announcement::FreePickRound { number } => format!("## Free Pick Round {number}"),
        Announcement::NoPlayersAvailable {
            participant,
            position,
        } => match position {
            Some(position) => {
                format!("No more players available for the {position} position. Skipping {participant}.")
            }
            None => format!("No more players available for selection. Skipping {participant}."),
        },
        Announcement::Picked {
            participant,
            player,
        } => format!("```{participant} picked {player}```"),
        Announcement::MissedPick { participant } => format!("{participant} missed their pick!"),
        Announcement::DraftComplete => "# Draft Complete! Here are the teams.".into(),
        Announcement::Roster {
            participant,
            players,
            detail,
        } => roster(participant, players, *detail),
        Announcement::NoRoster { participant } => format!("No team found for **{participant}**."),
        Announcement::Unpicked { players, total } => unpicked(players, *total),
        Announcement::Help => help(prefix),
        Announcement::Notice { text, .. } => text.clone(),
    }
}

/// The enumerated choice prompt shown to `participant`.
pub fn choice_prompt(participant: &str, choices: &[PlayerRecord]) -> String {
    let mut out = format!(
        "**{participant}**, pick a player by sending its number (1-{}):\n{RULE}",
        choices.len()
    );
    for (idx, p) in choices.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. {}\n({}) - {}\n[View Stats]({})\n{RULE}",
            idx + 1,
            p.name,
            p.position,
            p.ovr,
            p.url
        );
    }
    out
}

fn roster(participant: &str, players: &[PlayerRecord], detail: RosterDetail) -> String {
    let mut out = format!(
        "**{participant}'s Team**\nHere are the players ({}) drafted:\n{RULE}",
        players.len()
    );
    for p in players {
        match detail {
            RosterDetail::Full => {
                let _ = write!(
                    out,
                    "\n{}\n{} - {}\n[View Stats]({})\n{RULE}",
                    p.name, p.position, p.ovr, p.url
                );
            }
            RosterDetail::Brief => {
                let _ = write!(out, "\n{}: {} - {}", p.name, p.position, p.ovr);
            }
        }
    }
    out
}

fn unpicked(players: &[PlayerRecord], total: usize) -> String {
    if total == 0 {
        return "Every player in the pool has been drafted.".into();
    }
    let mut out = format!("```Unpicked players ({} of {total}):", players.len());
    for (idx, p) in players.iter().enumerate() {
        let _ = write!(out, "\n{}. {p}", idx + 1);
    }
    out.push_str("```");
    out
}

fn help(prefix: &str) -> String {
    format!(
        "```{prefix}SD - Starts the drafting mode\n\
         {prefix}SBT <player_name> - Expanded view on player's squad\n\
         {prefix}SST <player_name> - Brief view on player's squad\n\
         {prefix}Unpicked [count] - Players nobody has drafted yet\n\
         {prefix}PlsHelp - Shows this list```"
    )
}
