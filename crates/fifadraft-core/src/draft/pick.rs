// Player cards and the positions they are drafted for.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football positions a card can be drafted for.
///
/// Serialized with the short codes used by the pool CSV and the save file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "LB")]
    LeftBack,
    #[serde(rename = "CB")]
    CenterBack,
    #[serde(rename = "RB")]
    RightBack,
    #[serde(rename = "CDM")]
    DefensiveMidfield,
    #[serde(rename = "CM")]
    CentralMidfield,
    #[serde(rename = "LM")]
    LeftMidfield,
    #[serde(rename = "RM")]
    RightMidfield,
    #[serde(rename = "CAM")]
    AttackingMidfield,
    #[serde(rename = "LW")]
    LeftWing,
    #[serde(rename = "RW")]
    RightWing,
    #[serde(rename = "ST")]
    Striker,
}

impl Position {
    /// Every position, one entry each.
    pub const ALL: [Position; 12] = [
        Position::LeftWing,
        Position::Striker,
        Position::RightWing,
        Position::LeftMidfield,
        Position::RightMidfield,
        Position::AttackingMidfield,
        Position::DefensiveMidfield,
        Position::CentralMidfield,
        Position::LeftBack,
        Position::RightBack,
        Position::CenterBack,
        Position::Goalkeeper,
    ];

    /// Parse a position code ("GK", "cdm", " ST ") into a Position.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" => Some(Position::Goalkeeper),
            "LB" => Some(Position::LeftBack),
            "CB" => Some(Position::CenterBack),
            "RB" => Some(Position::RightBack),
            "CDM" => Some(Position::DefensiveMidfield),
            "CM" => Some(Position::CentralMidfield),
            "LM" => Some(Position::LeftMidfield),
            "RM" => Some(Position::RightMidfield),
            "CAM" => Some(Position::AttackingMidfield),
            "LW" => Some(Position::LeftWing),
            "RW" => Some(Position::RightWing),
            "ST" => Some(Position::Striker),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::LeftBack => "LB",
            Position::CenterBack => "CB",
            Position::RightBack => "RB",
            Position::DefensiveMidfield => "CDM",
            Position::CentralMidfield => "CM",
            Position::LeftMidfield => "LM",
            Position::RightMidfield => "RM",
            Position::AttackingMidfield => "CAM",
            Position::LeftWing => "LW",
            Position::RightWing => "RW",
            Position::Striker => "ST",
        }
    }

    /// Team sheet order: goalkeeper, defence, midfield, attack.
    pub fn display_order(&self) -> u8 {
        match self {
            Position::Goalkeeper => 0,
            Position::LeftBack => 1,
            Position::CenterBack => 2,
            Position::RightBack => 3,
            Position::DefensiveMidfield => 4,
            Position::LeftMidfield => 5,
            Position::CentralMidfield => 6,
            Position::RightMidfield => 7,
            Position::AttackingMidfield => 8,
            Position::LeftWing => 9,
            Position::Striker => 10,
            Position::RightWing => 11,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A draftable player card. Field names match the save-file keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Unique identity within the pool.
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Position")]
    pub position: Position,
    #[serde(rename = "OVR")]
    pub ovr: u32,
    #[serde(rename = "url")]
    pub url: String,
}

impl PlayerRecord {
    pub fn new(name: &str, position: Position, ovr: u32, url: &str) -> Self {
        PlayerRecord {
            name: name.to_string(),
            position,
            ovr,
            url: url.to_string(),
        }
    }
}

impl fmt::Display for PlayerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.name, self.position, self.ovr)
    }
}
