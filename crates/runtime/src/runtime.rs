//! High-level runtime orchestrator.
//!
//! [`CombatRuntime`] owns the background worker, wires up the command and
//! event channels, and exposes a builder-based API. Every encounter
//! advances as an independently scheduled unit of work executed inside a
//! store transaction; the single worker loop drains due tasks and sleeps
//! until the next deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use combat_core::config::EngineConfig;
use combat_core::env::{AbilityOracle, CreatureOracle, EventSink, GearOracle, RewardSink};
use combat_core::error::AbilityError;
use combat_core::rng::{PcgRoll, RollOracle};
use combat_core::types::{ActorRef, CharacterId, SimTime, TargetRef, ThreatTarget};

use crate::ai::EnemyAiSelector;
use crate::content::{FixedGearOracle, StaticContent};
use crate::encounter::{EncounterEngine, TickOutcome};
use crate::error::{Result, RuntimeError};
use crate::events::{CombatEvent, EventBus};
use crate::executor::AbilityExecutor;
use crate::handle::{AbilityAction, Command, RuntimeHandle};
use crate::resolution::StandardRewardDispatcher;
use crate::scheduler::{TaskKind, TaskQueue};
use crate::store::{CastTarget, CombatStore, EnemyCast, StoreError};

/// Runtime configuration shared across the orchestrator and worker.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub engine: EngineConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            event_buffer_size: 256,
            command_buffer_size: 32,
        }
    }
}

/// Main runtime orchestrating the combat simulation.
///
/// [`RuntimeHandle`] provides a cloneable facade for clients.
pub struct CombatRuntime {
    handle: RuntimeHandle,
    worker: JoinHandle<()>,
}

impl CombatRuntime {
    pub fn builder() -> CombatRuntimeBuilder {
        CombatRuntimeBuilder::new()
    }

    /// Start with default configuration and built-in content.
    pub fn start() -> Self {
        Self::builder().build()
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CombatEvent> {
        self.handle.subscribe_events()
    }

    /// Shut down gracefully: drop the command channel and join the worker.
    pub async fn shutdown(self) -> Result<()> {
        let CombatRuntime { handle, worker } = self;
        drop(handle);
        worker.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`CombatRuntime`] with pluggable collaborators.
pub struct CombatRuntimeBuilder {
    config: RuntimeConfig,
    store: Option<Arc<CombatStore>>,
    content: Option<Arc<StaticContent>>,
    catalog: Option<Arc<dyn AbilityOracle>>,
    creatures: Option<Arc<dyn CreatureOracle>>,
    gear: Option<Arc<dyn GearOracle>>,
    rewards: Option<Arc<dyn RewardSink>>,
    rolls: Option<Arc<dyn RollOracle>>,
}

impl CombatRuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            store: None,
            content: None,
            catalog: None,
            creatures: None,
            gear: None,
            rewards: None,
            rolls: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<CombatStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use one [`StaticContent`] instance as both ability catalog and
    /// creature oracle.
    pub fn content(mut self, content: Arc<StaticContent>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn AbilityOracle>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn creatures(mut self, creatures: Arc<dyn CreatureOracle>) -> Self {
        self.creatures = Some(creatures);
        self
    }

    pub fn gear(mut self, gear: Arc<dyn GearOracle>) -> Self {
        self.gear = Some(gear);
        self
    }

    pub fn rewards(mut self, rewards: Arc<dyn RewardSink>) -> Self {
        self.rewards = Some(rewards);
        self
    }

    pub fn rolls(mut self, rolls: Arc<dyn RollOracle>) -> Self {
        self.rolls = Some(rolls);
        self
    }

    pub fn build(self) -> CombatRuntime {
        let config = self.config;
        let store = self.store.unwrap_or_default();
        let content = self
            .content
            .unwrap_or_else(|| Arc::new(StaticContent::standard()));
        let catalog: Arc<dyn AbilityOracle> = self.catalog.unwrap_or_else(|| content.clone());
        let creatures: Arc<dyn CreatureOracle> = self.creatures.unwrap_or_else(|| content.clone());
        let gear: Arc<dyn GearOracle> = self
            .gear
            .unwrap_or_else(|| Arc::new(FixedGearOracle::default()));
        let rewards: Arc<dyn RewardSink> = self
            .rewards
            .unwrap_or_else(|| Arc::new(combat_core::env::NullRewardSink));
        let rolls: Arc<dyn RollOracle> = self.rolls.unwrap_or_else(|| Arc::new(PcgRoll));

        let events = EventBus::new(config.event_buffer_size);
        let sink: Arc<dyn EventSink> = Arc::new(events.clone());

        let executor = AbilityExecutor::new(
            catalog.clone(),
            gear.clone(),
            sink.clone(),
            rolls.clone(),
            config.engine.clone(),
        );
        let ai = EnemyAiSelector::new(catalog, rolls.clone());
        let dispatcher = Arc::new(StandardRewardDispatcher::new(rewards, config.engine.clone()));
        let engine = EncounterEngine::new(
            executor,
            ai,
            dispatcher,
            creatures,
            gear,
            sink,
            rolls,
            events.clone(),
            config.engine.clone(),
        );

        let (tx, rx) = mpsc::channel(config.command_buffer_size);
        let handle = RuntimeHandle {
            tx,
            events: events.clone(),
        };

        let worker = CombatWorker {
            store,
            engine,
            queue: TaskQueue::new(),
            rx,
            events,
            started: Instant::now(),
            config,
        };
        let worker = tokio::spawn(worker.run());

        CombatRuntime { handle, worker }
    }
}

impl Default for CombatRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Background task that owns the task queue and drives all combat.
struct CombatWorker {
    store: Arc<CombatStore>,
    engine: EncounterEngine,
    queue: TaskQueue,
    rx: mpsc::Receiver<Command>,
    events: EventBus,
    started: Instant,
    config: RuntimeConfig,
}

impl CombatWorker {
    fn now(&self) -> SimTime {
        SimTime::from_millis(self.started.elapsed().as_millis() as u64)
    }

    async fn run(mut self) {
        // Bootstrap the two global cadences.
        let now = self.now();
        self.queue.schedule(
            now.plus_millis(self.config.engine.fast_effect_tick_ms),
            TaskKind::FastEffects,
        );
        self.queue.schedule(
            now.plus_millis(self.config.engine.slow_effect_tick_ms),
            TaskKind::SlowEffects,
        );

        loop {
            let deadline = self.queue.next_deadline();
            tokio::select! {
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => break,
                    }
                }
                _ = Self::sleep_until(self.started, deadline) => {
                    self.run_due();
                }
            }
        }
        tracing::debug!("combat worker stopped");
    }

    async fn sleep_until(started: Instant, deadline: Option<SimTime>) {
        match deadline {
            Some(at) => {
                tokio::time::sleep_until(started + Duration::from_millis(at.millis())).await
            }
            None => std::future::pending().await,
        }
    }

    fn run_due(&mut self) {
        let now = self.now();
        while let Some(task) = self.queue.pop_due(now) {
            match task {
                TaskKind::EncounterTick(encounter) => {
                    let outcome = self
                        .store
                        .transaction::<_, StoreError>(|state| {
                            Ok(self.engine.tick(state, now, encounter))
                        });
                    match outcome {
                        Ok(TickOutcome::Continue { next_at }) => {
                            self.queue.schedule(next_at, TaskKind::EncounterTick(encounter));
                        }
                        Ok(TickOutcome::Resolved) => {}
                        Err(error) => {
                            // The transaction rolled back; the watchdog
                            // will reschedule this encounter.
                            tracing::error!(%encounter, %error, "encounter tick failed");
                        }
                    }
                }
                TaskKind::FastEffects => {
                    if let Err(error) = self
                        .store
                        .transaction::<_, StoreError>(|state| {
                            self.engine.fast_tick(state, now);
                            Ok(())
                        })
                    {
                        tracing::error!(%error, "fast effect tick failed");
                    }
                    self.queue.schedule(
                        now.plus_millis(self.config.engine.fast_effect_tick_ms),
                        TaskKind::FastEffects,
                    );
                }
                TaskKind::SlowEffects => {
                    if let Err(error) = self
                        .store
                        .transaction::<_, StoreError>(|state| {
                            self.engine.slow_tick(state, now);
                            Ok(())
                        })
                    {
                        tracing::error!(%error, "slow effect tick failed");
                    }
                    self.watchdog(now);
                    self.queue.schedule(
                        now.plus_millis(self.config.engine.slow_effect_tick_ms),
                        TaskKind::SlowEffects,
                    );
                }
            }
        }
    }

    /// Re-create a tick for any active encounter with none pending, so a
    /// dropped schedule entry cannot stall a fight forever.
    fn watchdog(&mut self, now: SimTime) {
        let active = self
            .store
            .read(|state| state.active_encounters().map(|e| e.id).collect::<Vec<_>>())
            .unwrap_or_default();
        for encounter in active {
            if !self.queue.has_encounter_tick(encounter) {
                tracing::warn!(%encounter, "watchdog repaired missing tick");
                self.queue.schedule(now, TaskKind::EncounterTick(encounter));
            }
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        let now = self.now();
        match cmd {
            Command::InsertCharacter { row, reply } => {
                let _ = self.store.transaction::<_, StoreError>(|state| {
                    state.insert_character(*row);
                    Ok(())
                });
                let _ = reply.send(());
            }
            Command::StartCombat {
                leader,
                spawn,
                participants,
                group,
                reply,
            } => {
                let result = self.store.transaction(|state| {
                    self.engine
                        .start_combat(state, now, leader, spawn, &participants, group)
                });
                if let Ok(encounter) = &result {
                    self.queue.schedule(
                        now.plus_millis(self.config.engine.encounter_tick_ms),
                        TaskKind::EncounterTick(*encounter),
                    );
                }
                let _ = reply.send(result);
            }
            Command::ExecuteAbility { action, reply } => {
                let _ = reply.send(self.execute_ability(now, action));
            }
            Command::Flee { character, reply } => {
                let result = self
                    .store
                    .transaction(|state| self.engine.flee(state, character));
                let _ = reply.send(result);
            }
            Command::EndCombat { character, reply } => {
                let result = self
                    .store
                    .transaction(|state| self.engine.end_combat(state, now, character));
                let _ = reply.send(result);
            }
            Command::QueryCharacter { character, reply } => {
                let row = self
                    .store
                    .read(|state| state.character(character).cloned())
                    .unwrap_or(None);
                let _ = reply.send(row);
            }
            Command::QueryEncounter { encounter, reply } => {
                let row = self
                    .store
                    .read(|state| state.encounter(encounter).cloned())
                    .unwrap_or(None);
                let _ = reply.send(row);
            }
            Command::QueryResults { encounter, reply } => {
                let rows = self
                    .store
                    .read(|state| {
                        state
                            .results_of(encounter)
                            .into_iter()
                            .cloned()
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                let _ = reply.send(rows);
            }
        }
    }

    /// Route one ability action by actor kind.
    ///
    /// A validation rejection rolls the transaction back, then surfaces
    /// as a private message to the actor, which is the no-side-effect
    /// contract of the execution engine.
    fn execute_ability(&mut self, now: SimTime, action: AbilityAction) -> Result<()> {
        match action.actor {
            ActorRef::Character(character) => {
                let result = self.store.transaction(|state| {
                    self.engine
                        .executor()
                        .execute_character(state, now, character, &action.ability, action.target)
                        .map_err(RuntimeError::from)
                });
                if let Err(RuntimeError::Ability(error)) = &result {
                    self.surface_rejection(character, error);
                }
                result
            }
            ActorRef::Pet(pet) => self
                .store
                .transaction::<_, RuntimeError>(|state| {
                    self.engine.executor().execute_pet_ability(state, now, pet);
                    Ok(())
                }),
            ActorRef::Creature(creature) => self
                .store
                .transaction::<_, RuntimeError>(|state| {
                    let Some(enemy) = state.enemy(creature).cloned() else {
                        return Ok(());
                    };
                    let target = match action.target {
                        Some(TargetRef::Character(ch)) => CastTarget::Character(ch),
                        _ => match state.threat(enemy.encounter).and_then(|t| t.top(creature)) {
                            Some(ThreatTarget::Character(ch)) => CastTarget::Character(ch),
                            Some(ThreatTarget::Pet(pet)) => match state.pet(pet) {
                                Some(p) => CastTarget::Character(p.owner),
                                None => return Ok(()),
                            },
                            None => CastTarget::SelfCast(creature),
                        },
                    };
                    let cast = EnemyCast {
                        encounter: enemy.encounter,
                        creature,
                        ability: action.ability.clone(),
                        resolves_at: now,
                        target,
                    };
                    self.engine.executor().execute_creature_cast(state, now, &cast);
                    Ok(())
                }),
        }
    }

    fn surface_rejection(&self, character: CharacterId, error: &AbilityError) {
        use combat_core::env::EventSink;
        self.events.append_private(character, &error.to_string());
    }
}
