// A participant's drafted players, in pick order.

use serde::{Deserialize, Serialize};

use super::pick::PlayerRecord;

/// Append-only list of cards owned by one participant.
///
/// Serialized as a bare JSON array so the save file stays a plain
/// `name -> [player, ...]` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<PlayerRecord>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    pub fn push(&mut self, player: PlayerRecord) {
        self.players.push(player);
    }

    /// Players in the order they were picked.
    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name == name)
    }

    pub fn last(&self) -> Option<&PlayerRecord> {
        self.players.last()
    }

    /// Players sorted for a team sheet: goalkeeper, defence, midfield, attack.
    /// Players at the same position keep their pick order.
    pub fn sorted_for_display(&self) -> Vec<PlayerRecord> {
        let mut sorted = self.players.clone();
        sorted.sort_by_key(|p| p.position.display_order());
        sorted
    }
}

impl From<Vec<PlayerRecord>> for Roster {
    fn from(players: Vec<PlayerRecord>) -> Self {
        Roster { players }
    }
}
