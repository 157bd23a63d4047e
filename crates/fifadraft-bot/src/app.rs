// Command loop: one draft at a time, roster and pool queries in between.

use anyhow::Context;
use tracing::{debug, error, info};

use fifadraft_core::chat::{Announcement, ChatAdapter, Channel};
use fifadraft_core::config::Config;
use fifadraft_core::draft::store::JsonFileStore;
use fifadraft_core::orchestrator::{self, SessionOrchestrator, SessionOutcome};
use fifadraft_core::pool::PlayerPool;

use crate::commands::{self, Command};
use crate::hub::InboundMessage;
use crate::hub_chat::HubChat;

/// Everything the loop needs between sessions.
pub struct AppState {
    pub config: Config,
    pub pool: PlayerPool,
    pub store: JsonFileStore,
}

impl AppState {
    pub fn new(config: Config, pool: PlayerPool) -> Self {
        let store = JsonFileStore::new(&config.save_file);
        AppState {
            config,
            pool,
            store,
        }
    }
}

/// Serve chat commands until the hub shuts down.
///
/// While a draft runs, the session owns the chat; commands sent meanwhile
/// are read as draft replies, not executed.
pub async fn run(mut chat: HubChat, state: AppState) -> anyhow::Result<()> {
    info!("command loop started (prefix `{}`)", chat.prefix());

    while let Some(msg) = chat.next_message().await {
        let Some(parsed) = commands::parse(&msg.text, chat.prefix()) else {
            continue;
        };
        let command = match parsed {
            Ok(command) => command,
            Err(e) => {
                debug!("bad command from {}: {e}", msg.user);
                chat.announce(Announcement::Notice {
                    text: e.to_string(),
                    channel: Channel::Lobby,
                })
                .await?;
                continue;
            }
        };

        if let Err(e) = handle(&mut chat, &state, &msg, command).await {
            error!("command from {} failed: {e:#}", msg.user);
            chat.announce(Announcement::Notice {
                text: "Something went wrong, see the bot log.".into(),
                channel: Channel::Lobby,
            })
            .await?;
        }
    }

    info!("chat hub closed, command loop exiting");
    Ok(())
}

async fn handle(
    chat: &mut HubChat,
    state: &AppState,
    msg: &InboundMessage,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::StartDraft => {
            let mut orchestrator =
                SessionOrchestrator::new(&state.pool, &state.config.rounds, state.store.clone());
            match orchestrator.run(&msg.user, chat).await.context("draft session failed")? {
                SessionOutcome::Completed(report) => info!(
                    "draft finished: {} participants over {} rounds",
                    report.participants.len(),
                    report.rounds.len()
                ),
                SessionOutcome::Aborted(reason) => info!("draft aborted: {reason:?}"),
            }
        }
        Command::ShowTeam { name, detail } => {
            let view = orchestrator::roster_view(&state.store, &name, detail)
                .with_context(|| format!("failed to read roster for {name}"))?;
            chat.announce(view).await?;
        }
        Command::Unpicked { limit } => {
            let view = orchestrator::unpicked_view(&state.pool, &state.store, limit)
                .context("failed to compute unpicked players")?;
            chat.announce(view).await?;
        }
        Command::Help => chat.announce(Announcement::Help).await?,
    }
    Ok(())
}
