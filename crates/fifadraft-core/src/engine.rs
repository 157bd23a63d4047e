// Round execution: one pick attempt per participant, in a fresh random order.
//
// Per turn: sample candidates -> prompt -> wait -> record or miss. Only one
// prompt is ever outstanding; the next participant is prompted after the
// previous turn has resolved and, if it was a pick, been saved.

use anyhow::Context;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::chat::{Announcement, ChatAdapter, ChoiceReply};
use crate::draft::pick::{PlayerRecord, Position};
use crate::draft::session::DraftSession;
use crate::draft::store::StateStore;
use crate::pool::PlayerPool;

/// Number of candidates offered per turn unless configured otherwise.
pub const DEFAULT_CHOICES_PER_PICK: usize = 5;

/// What a round offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundSpec {
    /// Candidates restricted to one position.
    Position(Position),
    /// Unrestricted round, numbered from 1.
    FreePick(usize),
}

impl RoundSpec {
    pub fn position_filter(&self) -> Option<Position> {
        match self {
            RoundSpec::Position(pos) => Some(*pos),
            RoundSpec::FreePick(_) => None,
        }
    }

    fn header(&self) -> Announcement {
        match self {
            RoundSpec::Position(position) => Announcement::PositionRound {
                position: *position,
            },
            RoundSpec::FreePick(number) => Announcement::FreePickRound { number: *number },
        }
    }
}

/// Why a turn ended without a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    TimeoutNoResponse,
    InvalidSelection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Picked(PlayerRecord),
    Missed(MissReason),
    /// Nothing left to offer; the participant was skipped.
    PoolExhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub participant: String,
    pub outcome: TurnOutcome,
}

/// Result of one round, turns in the order they were played.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub round: RoundSpec,
    pub turns: Vec<Turn>,
}

impl RoundSummary {
    pub fn turn_order(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.participant.as_str()).collect()
    }

    pub fn picks(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t.outcome, TurnOutcome::Picked(_)))
            .count()
    }

    pub fn misses(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t.outcome, TurnOutcome::Missed(_)))
            .count()
    }

    pub fn exhausted(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.outcome == TurnOutcome::PoolExhausted)
            .count()
    }
}

/// Drives rounds. Owns the session's randomness.
pub struct DraftEngine {
    rng: StdRng,
    choices_per_pick: usize,
}

impl DraftEngine {
    /// `seed` makes every shuffle and sample reproducible; `None` seeds
    /// from OS entropy.
    pub fn new(choices_per_pick: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        DraftEngine {
            rng,
            choices_per_pick: choices_per_pick.max(1),
        }
    }

    /// A uniformly shuffled copy of `participants`.
    pub fn turn_order(&mut self, participants: &[String]) -> Vec<String> {
        let mut order = participants.to_vec();
        order.shuffle(&mut self.rng);
        order
    }

    /// A uniformly shuffled copy of the position round list.
    pub fn position_order(&mut self, positions: &[Position]) -> Vec<Position> {
        let mut order = positions.to_vec();
        order.shuffle(&mut self.rng);
        order
    }

    /// Play one round: every participant gets exactly one prompt, or is
    /// skipped when the pool has nothing left for them.
    pub async fn run_round<S, C>(
        &mut self,
        round: RoundSpec,
        pool: &PlayerPool,
        session: &mut DraftSession<S>,
        chat: &mut C,
    ) -> anyhow::Result<RoundSummary>
    where
        S: StateStore,
        C: ChatAdapter + ?Sized,
    {
        chat.announce(round.header()).await?;

        let order = self.turn_order(session.participants());
        info!("{:?}: turn order {}", round, order.join(", "));

        let mut turns = Vec::with_capacity(order.len());
        for participant in order {
            let outcome = self
                .run_turn(round.position_filter(), &participant, pool, session, chat)
                .await?;
            turns.push(Turn {
                participant,
                outcome,
            });
        }

        let summary = RoundSummary { round, turns };
        info!(
            "{:?} complete: {} picked, {} missed, {} skipped",
            round,
            summary.picks(),
            summary.misses(),
            summary.exhausted()
        );
        Ok(summary)
    }

    async fn run_turn<S, C>(
        &mut self,
        position: Option<Position>,
        participant: &str,
        pool: &PlayerPool,
        session: &mut DraftSession<S>,
        chat: &mut C,
    ) -> anyhow::Result<TurnOutcome>
    where
        S: StateStore,
        C: ChatAdapter + ?Sized,
    {
        let choices = pool.sample(position, self.choices_per_pick, session.picked(), &mut self.rng);
        if choices.is_empty() {
            info!("no players left for {participant} ({position:?})");
            chat.announce(Announcement::NoPlayersAvailable {
                participant: participant.to_string(),
                position,
            })
            .await?;
            return Ok(TurnOutcome::PoolExhausted);
        }

        debug!("prompting {participant} with {} choices", choices.len());
        let reply = chat.present_choices(participant, &choices).await?;

        let chosen = match reply {
            ChoiceReply::Selected(index) if (1..=choices.len()).contains(&index) => {
                choices[index - 1].clone()
            }
            ChoiceReply::Selected(index) => {
                warn!("{participant} chose {index}, outside 1..={}", choices.len());
                return self.miss(participant, MissReason::InvalidSelection, chat).await;
            }
            ChoiceReply::Invalid(raw) => {
                warn!("{participant} replied {raw:?}, not a choice");
                return self.miss(participant, MissReason::InvalidSelection, chat).await;
            }
            ChoiceReply::TimedOut => {
                return self.miss(participant, MissReason::TimeoutNoResponse, chat).await;
            }
        };

        session
            .record_pick(participant, chosen.clone())
            .with_context(|| format!("failed to record {participant}'s pick of {}", chosen.name))?;
        info!("{participant} picked {chosen}");

        chat.announce(Announcement::Picked {
            participant: participant.to_string(),
            player: chosen.clone(),
        })
        .await?;

        Ok(TurnOutcome::Picked(chosen))
    }

    async fn miss<C>(
        &self,
        participant: &str,
        reason: MissReason,
        chat: &mut C,
    ) -> anyhow::Result<TurnOutcome>
    where
        C: ChatAdapter + ?Sized,
    {
        info!("{participant} missed their pick ({reason:?})");
        chat.announce(Announcement::MissedPick {
            participant: participant.to_string(),
        })
        .await?;
        Ok(TurnOutcome::Missed(reason))
    }
}
