// One complete draft game, from the player-count prompt to the final team
// sheets, plus the read-only queries the command surface answers from the
// persisted state.

use anyhow::Context;
use tracing::{info, warn};

use crate::chat::{Announcement, ChatAdapter, RosterDetail};
use crate::config::RoundsConfig;
use crate::draft::roster::Roster;
use crate::draft::session::DraftSession;
use crate::draft::store::{self, StateStore, StoreError};
use crate::engine::{DraftEngine, RoundSpec, RoundSummary};
use crate::pool::PlayerPool;

/// Players listed by the unpicked report when no limit is given.
pub const DEFAULT_UNPICKED_LIMIT: usize = 20;

/// Player count cap when config does not set one.
pub const DEFAULT_MAX_PARTICIPANTS: usize = 16;

/// Why a session ended before the first round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    CountTimedOut,
    NamesTimedOut,
    NoParticipants,
    /// The count was above the configured `max_participants`.
    TooManyParticipants,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    /// Join order.
    pub participants: Vec<String>,
    /// Position rounds first, then free-pick rounds.
    pub rounds: Vec<RoundSummary>,
    /// Final rosters in join order, as persisted.
    pub rosters: Vec<(String, Roster)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(SessionReport),
    Aborted(AbortReason),
}

/// Runs one session over a pool, a round layout and a state store.
pub struct SessionOrchestrator<'a, S> {
    pool: &'a PlayerPool,
    rounds: &'a RoundsConfig,
    session: DraftSession<S>,
    engine: DraftEngine,
}

impl<'a, S: StateStore> SessionOrchestrator<'a, S> {
    pub fn new(pool: &'a PlayerPool, rounds: &'a RoundsConfig, store: S) -> Self {
        SessionOrchestrator {
            pool,
            rounds,
            session: DraftSession::new(store),
            engine: DraftEngine::new(rounds.choices_per_pick, rounds.seed),
        }
    }

    pub fn session(&self) -> &DraftSession<S> {
        &self.session
    }

    /// Play a whole session started by `starter`.
    ///
    /// Setup timeouts and a count of zero or above `max_participants` abort
    /// before the store is touched.
    /// Errors are transport or persistence failures; the session is over
    /// either way.
    pub async fn run<C>(&mut self, starter: &str, chat: &mut C) -> anyhow::Result<SessionOutcome>
    where
        C: ChatAdapter + ?Sized,
    {
        info!("{starter} started a draft");
        chat.announce(Announcement::Welcome).await?;

        let Some(count) = chat.prompt_number(starter).await? else {
            return self.abort(AbortReason::CountTimedOut, chat).await;
        };
        if count == 0 {
            return self.abort(AbortReason::NoParticipants, chat).await;
        }
        let wanted = usize::try_from(count).unwrap_or(usize::MAX);
        if wanted > self.rounds.max_participants {
            return self.abort(AbortReason::TooManyParticipants, chat).await;
        }

        chat.announce(Announcement::JoinRequest { count }).await?;
        let Some(names) = chat.collect_distinct_senders(wanted).await? else {
            return self.abort(AbortReason::NamesTimedOut, chat).await;
        };

        chat.announce(Announcement::ParticipantsJoined {
            names: names.clone(),
        })
        .await?;
        self.session
            .initialize(&names)
            .context("failed to initialize draft state")?;

        let mut rounds = Vec::with_capacity(self.rounds.positions.len() + self.rounds.free_picks);

        chat.announce(Announcement::PositionPhaseStarted).await?;
        for position in self.engine.position_order(&self.rounds.positions) {
            let summary = self
                .engine
                .run_round(RoundSpec::Position(position), self.pool, &mut self.session, chat)
                .await?;
            rounds.push(summary);
        }

        chat.announce(Announcement::FreePickPhaseStarted {
            rounds: self.rounds.free_picks,
        })
        .await?;
        for number in 1..=self.rounds.free_picks {
            let summary = self
                .engine
                .run_round(RoundSpec::FreePick(number), self.pool, &mut self.session, chat)
                .await?;
            rounds.push(summary);
        }

        chat.announce(Announcement::DraftComplete).await?;
        let mut rosters = Vec::with_capacity(self.session.participants().len());
        for participant in self.session.participants() {
            let roster = self
                .session
                .roster_for(participant)
                .with_context(|| format!("failed to reload roster for {participant}"))?;
            chat.announce(roster_announcement(participant, &roster, RosterDetail::Brief))
                .await?;
            rosters.push((participant.clone(), roster));
        }

        info!(
            "draft complete: {} participants, {} picks",
            rosters.len(),
            self.session.picked().len()
        );
        Ok(SessionOutcome::Completed(SessionReport {
            participants: self.session.participants().to_vec(),
            rounds,
            rosters,
        }))
    }

    async fn abort<C>(&self, reason: AbortReason, chat: &mut C) -> anyhow::Result<SessionOutcome>
    where
        C: ChatAdapter + ?Sized,
    {
        warn!("draft aborted: {reason:?}");
        let notice = match reason {
            AbortReason::NoParticipants => Announcement::NoParticipants,
            AbortReason::TooManyParticipants => Announcement::TooManyParticipants {
                max: self.rounds.max_participants,
            },
            AbortReason::CountTimedOut | AbortReason::NamesTimedOut => Announcement::SetupTimedOut,
        };
        chat.announce(notice).await?;
        Ok(SessionOutcome::Aborted(reason))
    }
}

fn roster_announcement(participant: &str, roster: &Roster, detail: RosterDetail) -> Announcement {
    if roster.is_empty() {
        Announcement::NoRoster {
            participant: participant.to_string(),
        }
    } else {
        Announcement::Roster {
            participant: participant.to_string(),
            players: roster.sorted_for_display(),
            detail,
        }
    }
}

/// A participant's team sheet as currently persisted.
pub fn roster_view<S: StateStore + ?Sized>(
    store: &S,
    participant: &str,
    detail: RosterDetail,
) -> Result<Announcement, StoreError> {
    let roster = store::roster_for(store, participant)?;
    Ok(roster_announcement(participant, &roster, detail))
}

/// The first `limit` pool players that are on no persisted roster, with the
/// total number left.
pub fn unpicked_view<S: StateStore + ?Sized>(
    pool: &PlayerPool,
    store: &S,
    limit: usize,
) -> Result<Announcement, StoreError> {
    let allocated = store.load()?.allocated();
    let total = pool.available(None, &allocated);
    let players = pool
        .unpicked(&allocated, limit)
        .into_iter()
        .cloned()
        .collect();
    Ok(Announcement::Unpicked { players, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use crate::chat::ChoiceReply;
    use crate::draft::pick::{PlayerRecord, Position};
    use crate::draft::state::DraftState;
    use crate::draft::store::MemoryStore;

    #[derive(Default)]
    struct ScriptedChat {
        count: Option<u32>,
        names: Option<Vec<String>>,
        picks: VecDeque<ChoiceReply>,
        announced: Vec<Announcement>,
    }

    #[async_trait]
    impl ChatAdapter for ScriptedChat {
        async fn prompt_number(&mut self, _asker: &str) -> anyhow::Result<Option<u32>> {
            Ok(self.count)
        }

        async fn collect_distinct_senders(
            &mut self,
            _n: usize,
        ) -> anyhow::Result<Option<Vec<String>>> {
            Ok(self.names.clone())
        }

        async fn present_choices(
            &mut self,
            _participant: &str,
            _choices: &[PlayerRecord],
        ) -> anyhow::Result<ChoiceReply> {
            Ok(self.picks.pop_front().unwrap_or(ChoiceReply::Selected(1)))
        }

        async fn announce(&mut self, announcement: Announcement) -> anyhow::Result<()> {
            self.announced.push(announcement);
            Ok(())
        }
    }

    fn rounds(positions: Vec<Position>, free_picks: usize) -> RoundsConfig {
        RoundsConfig {
            positions,
            free_picks,
            choices_per_pick: 5,
            max_participants: 4,
            seed: Some(17),
        }
    }

    fn pool() -> PlayerPool {
        PlayerPool::from_players(vec![
            PlayerRecord::new("S1", Position::Striker, 88, "u"),
            PlayerRecord::new("S2", Position::Striker, 87, "u"),
            PlayerRecord::new("G1", Position::Goalkeeper, 86, "u"),
            PlayerRecord::new("G2", Position::Goalkeeper, 85, "u"),
            PlayerRecord::new("M1", Position::CentralMidfield, 84, "u"),
            PlayerRecord::new("M2", Position::CentralMidfield, 83, "u"),
        ])
    }

    #[tokio::test]
    async fn count_timeout_aborts_without_touching_store() {
        let pool = pool();
        let rounds = rounds(vec![Position::Striker], 1);
        let mut orchestrator = SessionOrchestrator::new(&pool, &rounds, MemoryStore::new());
        let mut chat = ScriptedChat::default();

        let outcome = orchestrator.run("host", &mut chat).await.unwrap();

        assert_eq!(outcome, SessionOutcome::Aborted(AbortReason::CountTimedOut));
        assert_eq!(orchestrator.session().store().save_count(), 0);
        assert_eq!(
            chat.announced,
            vec![Announcement::Welcome, Announcement::SetupTimedOut]
        );
    }

    #[tokio::test]
    async fn names_timeout_aborts_without_touching_store() {
        let pool = pool();
        let rounds = rounds(vec![Position::Striker], 1);
        let mut orchestrator = SessionOrchestrator::new(&pool, &rounds, MemoryStore::new());
        let mut chat = ScriptedChat {
            count: Some(2),
            ..Default::default()
        };

        let outcome = orchestrator.run("host", &mut chat).await.unwrap();

        assert_eq!(outcome, SessionOutcome::Aborted(AbortReason::NamesTimedOut));
        assert_eq!(orchestrator.session().store().save_count(), 0);
        assert!(chat.announced.contains(&Announcement::JoinRequest { count: 2 }));
    }

    #[tokio::test]
    async fn zero_count_aborts() {
        let pool = pool();
        let rounds = rounds(vec![Position::Striker], 1);
        let mut orchestrator = SessionOrchestrator::new(&pool, &rounds, MemoryStore::new());
        let mut chat = ScriptedChat {
            count: Some(0),
            ..Default::default()
        };

        let outcome = orchestrator.run("host", &mut chat).await.unwrap();

        assert_eq!(outcome, SessionOutcome::Aborted(AbortReason::NoParticipants));
        assert_eq!(chat.announced.last(), Some(&Announcement::NoParticipants));
    }

    #[tokio::test]
    async fn count_above_limit_aborts_before_joining() {
        let pool = pool();
        let rounds = rounds(vec![Position::Striker], 1);
        let mut orchestrator = SessionOrchestrator::new(&pool, &rounds, MemoryStore::new());
        let mut chat = ScriptedChat {
            count: Some(4_000_000_000),
            names: Some(vec!["A".into()]),
            ..Default::default()
        };

        let outcome = orchestrator.run("host", &mut chat).await.unwrap();

        assert_eq!(outcome, SessionOutcome::Aborted(AbortReason::TooManyParticipants));
        assert_eq!(orchestrator.session().store().save_count(), 0);
        assert_eq!(
            chat.announced,
            vec![
                Announcement::Welcome,
                Announcement::TooManyParticipants { max: 4 }
            ]
        );
    }

    #[tokio::test]
    async fn count_at_limit_is_accepted() {
        let pool = pool();
        let rounds = rounds(vec![Position::Striker], 0);
        let mut orchestrator = SessionOrchestrator::new(&pool, &rounds, MemoryStore::new());
        let mut chat = ScriptedChat {
            count: Some(4),
            names: Some(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
            ..Default::default()
        };

        let outcome = orchestrator.run("A", &mut chat).await.unwrap();

        assert!(matches!(outcome, SessionOutcome::Completed(_)));
        assert!(chat.announced.contains(&Announcement::JoinRequest { count: 4 }));
    }

    #[tokio::test]
    async fn completed_session_reports_every_round() {
        let pool = pool();
        let rounds = rounds(vec![Position::Striker, Position::Goalkeeper], 1);
        let mut orchestrator = SessionOrchestrator::new(&pool, &rounds, MemoryStore::new());
        let mut chat = ScriptedChat {
            count: Some(2),
            names: Some(vec!["A".into(), "B".into()]),
            ..Default::default()
        };

        let SessionOutcome::Completed(report) = orchestrator.run("A", &mut chat).await.unwrap()
        else {
            panic!("session should complete");
        };

        assert_eq!(report.participants, vec!["A", "B"]);
        assert_eq!(report.rounds.len(), 3);
        assert_eq!(report.rounds[2].round, RoundSpec::FreePick(1));
        // Two strikers, two keepers, two midfielders for the free round.
        for (_, roster) in &report.rosters {
            assert_eq!(roster.len(), 3);
        }
        assert_eq!(orchestrator.session().picked().len(), 6);
        assert!(chat.announced.contains(&Announcement::DraftComplete));
        assert!(chat
            .announced
            .contains(&Announcement::FreePickPhaseStarted { rounds: 1 }));
    }

    #[tokio::test]
    async fn final_rosters_are_brief_and_sorted() {
        let pool = pool();
        let rounds = rounds(vec![Position::Striker, Position::Goalkeeper], 0);
        let mut orchestrator = SessionOrchestrator::new(&pool, &rounds, MemoryStore::new());
        let mut chat = ScriptedChat {
            count: Some(1),
            names: Some(vec!["A".into()]),
            ..Default::default()
        };

        orchestrator.run("A", &mut chat).await.unwrap();

        let Some(Announcement::Roster {
            participant,
            players,
            detail,
        }) = chat.announced.last()
        else {
            panic!("last announcement should be a roster");
        };
        assert_eq!(participant, "A");
        assert_eq!(*detail, RosterDetail::Brief);
        assert_eq!(players[0].position, Position::Goalkeeper);
        assert_eq!(players[1].position, Position::Striker);
    }

    #[tokio::test]
    async fn participant_without_picks_gets_no_roster_notice() {
        let pool = pool();
        let rounds = rounds(vec![Position::Striker], 0);
        let mut orchestrator = SessionOrchestrator::new(&pool, &rounds, MemoryStore::new());
        let mut chat = ScriptedChat {
            count: Some(1),
            names: Some(vec!["A".into()]),
            picks: vec![ChoiceReply::TimedOut].into(),
            ..Default::default()
        };

        orchestrator.run("A", &mut chat).await.unwrap();

        assert_eq!(
            chat.announced.last(),
            Some(&Announcement::NoRoster {
                participant: "A".into()
            })
        );
    }

    #[test]
    fn roster_view_reads_persisted_state() {
        let store = MemoryStore::new();
        let mut state = DraftState::with_participants(&["A"]);
        state.append("A", PlayerRecord::new("S1", Position::Striker, 88, "u"));
        store.save(&state).unwrap();

        match roster_view(&store, "A", RosterDetail::Full).unwrap() {
            Announcement::Roster { players, detail, .. } => {
                assert_eq!(players.len(), 1);
                assert_eq!(detail, RosterDetail::Full);
            }
            other => panic!("expected roster, got {other:?}"),
        }
        assert_eq!(
            roster_view(&store, "Z", RosterDetail::Brief).unwrap(),
            Announcement::NoRoster {
                participant: "Z".into()
            }
        );
    }

    #[test]
    fn unpicked_view_skips_allocated_players() {
        let pool = pool();
        let store = MemoryStore::new();
        let mut state = DraftState::with_participants(&["A"]);
        state.append("A", PlayerRecord::new("S1", Position::Striker, 88, "u"));
        store.save(&state).unwrap();

        match unpicked_view(&pool, &store, 2).unwrap() {
            Announcement::Unpicked { players, total } => {
                let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["S2", "G1"]);
                assert_eq!(total, 5);
            }
            other => panic!("expected unpicked report, got {other:?}"),
        }
    }
}
