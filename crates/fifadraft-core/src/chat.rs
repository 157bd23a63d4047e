// Boundary between the draft core and a chat platform.
//
// The core never formats text. It hands structured `Announcement`s to the
// adapter and asks it to wait for replies; how those look on the wire, and
// how long each wait may take, is up to the adapter.

use async_trait::async_trait;

use crate::draft::pick::{PlayerRecord, Position};

/// Logical channel an announcement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Setup chatter and command replies.
    Lobby,
    /// Rounds, prompts, picks and misses.
    Draft,
    /// Roster displays.
    Teams,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Lobby => "lobby",
            Channel::Draft => "draft",
            Channel::Teams => "teams",
        }
    }
}

/// How much of each player a roster display shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterDetail {
    /// Name, position, OVR and reference link.
    Full,
    /// Name, position and OVR.
    Brief,
}

/// Everything the core may tell the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Announcement {
    /// Session opened; asks the starter for the player count.
    Welcome,
    /// Asks `count` players to send one message each.
    JoinRequest { count: u32 },
    /// Player count or join collection timed out.
    SetupTimedOut,
    /// Player count was zero.
    NoParticipants,
    /// Player count was above the session limit.
    TooManyParticipants { max: usize },
    ParticipantsJoined { names: Vec<String> },
    PositionPhaseStarted,
    PositionRound { position: Position },
    FreePickPhaseStarted { rounds: usize },
    FreePickRound { number: usize },
    /// The filtered pool is empty for this participant's turn.
    NoPlayersAvailable {
        participant: String,
        position: Option<Position>,
    },
    Picked {
        participant: String,
        player: PlayerRecord,
    },
    MissedPick { participant: String },
    DraftComplete,
    Roster {
        participant: String,
        players: Vec<PlayerRecord>,
        detail: RosterDetail,
    },
    /// Nothing on record for this name.
    NoRoster { participant: String },
    Unpicked {
        players: Vec<PlayerRecord>,
        total: usize,
    },
    Help,
    /// Free text, for transport-level notices.
    Notice { text: String, channel: Channel },
}

impl Announcement {
    /// The channel this announcement is posted to.
    pub fn channel(&self) -> Channel {
        match self {
            Announcement::Welcome
            | Announcement::JoinRequest { .. }
            | Announcement::SetupTimedOut
            | Announcement::NoParticipants
            | Announcement::TooManyParticipants { .. }
            | Announcement::ParticipantsJoined { .. }
            | Announcement::Unpicked { .. }
            | Announcement::Help => Channel::Lobby,
            Announcement::PositionPhaseStarted
            | Announcement::PositionRound { .. }
            | Announcement::FreePickPhaseStarted { .. }
            | Announcement::FreePickRound { .. }
            | Announcement::NoPlayersAvailable { .. }
            | Announcement::Picked { .. }
            | Announcement::MissedPick { .. }
            | Announcement::DraftComplete => Channel::Draft,
            Announcement::Roster { .. } | Announcement::NoRoster { .. } => Channel::Teams,
            Announcement::Notice { channel, .. } => *channel,
        }
    }
}

/// A participant's answer to an enumerated choice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceReply {
    /// The 1-based index the participant chose, as given. Range checking is
    /// the caller's job.
    Selected(usize),
    /// The reply could not be read as a choice.
    Invalid(String),
    TimedOut,
}

/// A chat platform as seen by the draft.
///
/// Every wait is bounded by the adapter; `None` / [`ChoiceReply::TimedOut`]
/// means the bound expired. Errors are transport failures only.
#[async_trait]
pub trait ChatAdapter: Send {
    /// Wait for `asker` to send a number.
    async fn prompt_number(&mut self, asker: &str) -> anyhow::Result<Option<u32>>;

    /// Accept the next `n` distinct message senders, in arrival order.
    async fn collect_distinct_senders(&mut self, n: usize) -> anyhow::Result<Option<Vec<String>>>;

    /// Show `choices` numbered from 1 to `participant` and wait for one.
    async fn present_choices(
        &mut self,
        participant: &str,
        choices: &[PlayerRecord],
    ) -> anyhow::Result<ChoiceReply>;

    async fn announce(&mut self, announcement: Announcement) -> anyhow::Result<()>;
}
