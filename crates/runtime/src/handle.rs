//! Cloneable client facade for the combat runtime.

use tokio::sync::{broadcast, mpsc, oneshot};

use combat_core::ability::AbilityKey;
use combat_core::types::{ActorRef, CharacterId, EncounterId, GroupId, SpawnId, TargetRef};

use crate::error::{Result, RuntimeError};
use crate::events::{CombatEvent, EventBus};
use crate::store::{CharacterRow, CombatEncounter, CombatResult};

/// One ability execution request, from any actor kind.
#[derive(Clone, Debug)]
pub struct AbilityAction {
    pub actor: ActorRef,
    pub ability: AbilityKey,
    pub target: Option<TargetRef>,
}

/// Commands processed by the combat worker.
pub(crate) enum Command {
    InsertCharacter {
        row: Box<CharacterRow>,
        reply: oneshot::Sender<()>,
    },
    StartCombat {
        leader: CharacterId,
        spawn: SpawnId,
        participants: Vec<CharacterId>,
        group: Option<GroupId>,
        reply: oneshot::Sender<Result<EncounterId>>,
    },
    ExecuteAbility {
        action: AbilityAction,
        reply: oneshot::Sender<Result<()>>,
    },
    Flee {
        character: CharacterId,
        reply: oneshot::Sender<Result<()>>,
    },
    EndCombat {
        character: CharacterId,
        reply: oneshot::Sender<Result<()>>,
    },
    QueryCharacter {
        character: CharacterId,
        reply: oneshot::Sender<Option<CharacterRow>>,
    },
    QueryEncounter {
        encounter: EncounterId,
        reply: oneshot::Sender<Option<CombatEncounter>>,
    },
    QueryResults {
        encounter: EncounterId,
        reply: oneshot::Sender<Vec<CombatResult>>,
    },
}

/// Cloneable handle shared across clients and async tasks.
#[derive(Clone)]
pub struct RuntimeHandle {
    pub(crate) tx: mpsc::Sender<Command>,
    pub(crate) events: EventBus,
}

impl RuntimeHandle {
    /// Subscribe to the combat event stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CombatEvent> {
        self.events.subscribe()
    }

    /// Load (or replace) a character sheet into the combat store.
    pub async fn insert_character(&self, row: CharacterRow) -> Result<()> {
        self.request(|reply| Command::InsertCharacter {
            row: Box::new(row),
            reply,
        })
        .await
    }

    /// Open an encounter between a party and a spawn's creatures.
    pub async fn start_combat(
        &self,
        leader: CharacterId,
        spawn: SpawnId,
        participants: Vec<CharacterId>,
        group: Option<GroupId>,
    ) -> Result<EncounterId> {
        self.request(|reply| Command::StartCombat {
            leader,
            spawn,
            participants,
            group,
            reply,
        })
        .await?
    }

    /// Execute an ability for a character, creature, or pet.
    pub async fn execute_ability(&self, action: AbilityAction) -> Result<()> {
        self.request(|reply| Command::ExecuteAbility { action, reply })
            .await?
    }

    /// Best-effort flee; honored on the encounter's next check.
    pub async fn flee(&self, character: CharacterId) -> Result<()> {
        self.request(|reply| Command::Flee { character, reply }).await?
    }

    /// End a finished fight (or flee from an unfinished one).
    pub async fn end_combat(&self, character: CharacterId) -> Result<()> {
        self.request(|reply| Command::EndCombat { character, reply })
            .await?
    }

    /// Read one character sheet.
    pub async fn character(&self, character: CharacterId) -> Result<Option<CharacterRow>> {
        self.request(|reply| Command::QueryCharacter { character, reply })
            .await
    }

    /// Read one encounter row.
    pub async fn encounter(&self, encounter: EncounterId) -> Result<Option<CombatEncounter>> {
        self.request(|reply| Command::QueryEncounter { encounter, reply })
            .await
    }

    /// Read the result summaries of an encounter.
    pub async fn results(&self, encounter: EncounterId) -> Result<Vec<CombatResult>> {
        self.request(|reply| Command::QueryResults { encounter, reply })
            .await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}
