// The live ledger of one draft session.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};

use super::pick::PlayerRecord;
use super::roster::Roster;
use super::state::DraftState;
use super::store::{self, StateStore, StoreError};

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("`{0}` is not part of this draft")]
    UnknownParticipant(String),

    #[error("{0} has already been picked")]
    AlreadyPicked(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rosters, picked set and participant order for the running session,
/// backed by a [`StateStore`].
///
/// Every mutation is saved before it becomes visible in memory, so a pick
/// that returned `Ok` is durable.
pub struct DraftSession<S> {
    store: S,
    state: DraftState,
    /// Join order, duplicates removed.
    participants: Vec<String>,
    picked: HashSet<String>,
}

impl<S: StateStore> DraftSession<S> {
    /// A session with no participants. Does not touch the store.
    pub fn new(store: S) -> Self {
        DraftSession {
            store,
            state: DraftState::default(),
            participants: Vec::new(),
            picked: HashSet::new(),
        }
    }

    /// Reset to one empty roster per name and persist immediately. The
    /// picked set starts over.
    pub fn initialize<T: AsRef<str>>(&mut self, names: &[T]) -> Result<(), DraftError> {
        let mut participants: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !participants.iter().any(|p| p == name) {
                participants.push(name.to_string());
            }
        }

        let state = DraftState::with_participants(&participants);
        self.store.save(&state)?;

        info!("draft initialized for {}", participants.join(", "));
        self.state = state;
        self.participants = participants;
        self.picked.clear();
        Ok(())
    }

    /// Append `player` to `participant`'s roster and persist the whole
    /// mapping. On error nothing changes.
    pub fn record_pick(&mut self, participant: &str, player: PlayerRecord) -> Result<(), DraftError> {
        if !self.state.is_participant(participant) {
            return Err(DraftError::UnknownParticipant(participant.to_string()));
        }
        if self.picked.contains(&player.name) {
            return Err(DraftError::AlreadyPicked(player.name));
        }

        let mut next = self.state.clone();
        let name = player.name.clone();
        next.append(participant, player);
        self.store.save(&next)?;

        debug!("{participant} now owns {name}");
        self.state = next;
        self.picked.insert(name);
        Ok(())
    }

    /// Reload from the store and return the participant's roster. Unknown
    /// participants get an empty roster.
    pub fn roster_for(&self, participant: &str) -> Result<Roster, DraftError> {
        Ok(store::roster_for(&self.store, participant)?)
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn picked(&self) -> &HashSet<String> {
        &self.picked
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
