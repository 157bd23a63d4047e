// Draft state: which participant owns which players.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::pick::PlayerRecord;
use super::roster::Roster;

/// The persisted game record: participant name -> roster.
///
/// Serialized as a bare JSON object. Keys are kept sorted so the save file
/// diffs cleanly between picks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftState {
    teams: BTreeMap<String, Roster>,
}

impl DraftState {
    /// A state with one empty roster per name. Duplicate names collapse
    /// into a single roster.
    pub fn with_participants<S: AsRef<str>>(names: &[S]) -> Self {
        let teams = names
            .iter()
            .map(|n| (n.as_ref().to_string(), Roster::new()))
            .collect();
        DraftState { teams }
    }

    pub fn is_participant(&self, name: &str) -> bool {
        self.teams.contains_key(name)
    }

    /// Append `player` to `participant`'s roster. Returns `false` (and
    /// changes nothing) when the participant is unknown.
    pub fn append(&mut self, participant: &str, player: PlayerRecord) -> bool {
        match self.teams.get_mut(participant) {
            Some(roster) => {
                roster.push(player);
                true
            }
            None => false,
        }
    }

    /// Roster for a participant, or an empty one when unknown.
    pub fn roster(&self, participant: &str) -> Roster {
        self.teams.get(participant).cloned().unwrap_or_default()
    }

    /// Participant names in key order.
    pub fn participants(&self) -> Vec<String> {
        self.teams.keys().cloned().collect()
    }

    pub fn teams(&self) -> impl Iterator<Item = (&String, &Roster)> {
        self.teams.iter()
    }

    /// Every player identity on any roster.
    pub fn allocated(&self) -> HashSet<String> {
        self.teams
            .values()
            .flat_map(|r| r.players().iter().map(|p| p.name.clone()))
            .collect()
    }

    /// Total number of players on all rosters, duplicates included.
    pub fn total_picks(&self) -> usize {
        self.teams.values().map(|r| r.len()).sum()
    }
}
