//! End-to-end combat flows driven synchronously through the store.

use std::sync::{Arc, Mutex};

use combat_core::ability::{AbilityKey, AbilitySpec, PeriodicSplit};
use combat_core::config::EngineConfig;
use combat_core::effect::{EffectDuration, EffectKind, EffectRecord};
use combat_core::env::{EventSink, GearBonus, GearOracle, RewardSink};
use combat_core::error::AbilityError;
use combat_core::rng::{PcgRoll, RollOracle};
use combat_core::stats::{CharacterClass, Race, StatBlock};
use combat_core::types::{
    CharacterId, CreatureId, EncounterId, LocationId, SimTime, SpawnId, TargetRef, ThreatSource,
};
use combat_core::DamageKind;

use combat_runtime::{
    AbilityExecutor, CharacterRow, CombatStore, EncounterEngine, EncounterState, EnemyAiSelector,
    EventBus, FixedGearOracle, ParticipantStatus, RuntimeError, StandardRewardDispatcher,
    StaticContent, StoreError, TickOutcome,
};

const MAGE: CharacterId = CharacterId(1);
const WARRIOR: CharacterId = CharacterId(2);
const SUMMONER: CharacterId = CharacterId(3);
const LOCATION: LocationId = LocationId(1);

/// Four inert dummies for AoE scenarios.
const QUAD_SPAWN: SpawnId = SpawnId(40);
/// One inert dummy.
const DUMMY_SPAWN: SpawnId = SpawnId(9);

#[derive(Default)]
struct RecordingRewards {
    corpses: Mutex<Vec<CharacterId>>,
    loot: Mutex<Vec<(CharacterId, String)>>,
}

impl RewardSink for RecordingRewards {
    fn create_corpse(&self, character: CharacterId) {
        self.corpses.lock().unwrap().push(character);
    }

    fn roll_loot(&self, character: CharacterId, creature_key: &str) {
        self.loot
            .lock()
            .unwrap()
            .push((character, creature_key.to_owned()));
    }

    fn adjust_faction(&self, _character: CharacterId, _creature_key: &str) {}
}

struct Harness {
    engine: EncounterEngine,
    store: Arc<CombatStore>,
    content: Arc<StaticContent>,
    rewards: Arc<RecordingRewards>,
}

fn harness_with_gear(bonus: GearBonus) -> Harness {
    let mut content = StaticContent::standard();

    // Deterministic calibration abilities: zero scaling, zero dex casters.
    let mut spec = AbilitySpec::direct("test_bolt", "Test Bolt", CharacterClass::Mage, 10);
    spec.damage_kind = DamageKind::Magic;
    content.add_ability(spec);

    let mut spec = AbilitySpec::direct("test_rend", "Test Rend", CharacterClass::Mage, 20);
    spec.damage_kind = DamageKind::Magic;
    spec.periodic = Some(PeriodicSplit {
        power_percent: 50,
        duration_ticks: 3,
    });
    content.add_ability(spec);

    let mut spec = AbilitySpec::direct("test_nova", "Test Nova", CharacterClass::Mage, 10);
    spec.damage_kind = DamageKind::Magic;
    spec.aoe = true;
    content.add_ability(spec);

    content.add_spawn(
        QUAD_SPAWN,
        &[
            "training_dummy",
            "training_dummy",
            "training_dummy",
            "training_dummy",
        ],
    );

    let content = Arc::new(content);
    let config = EngineConfig::default();
    let events = EventBus::new(64);
    let sink: Arc<dyn EventSink> = Arc::new(events.clone());
    let gear: Arc<dyn GearOracle> = Arc::new(FixedGearOracle::new(bonus));
    let rolls: Arc<dyn RollOracle> = Arc::new(PcgRoll);
    let rewards = Arc::new(RecordingRewards::default());

    let executor = AbilityExecutor::new(
        content.clone(),
        gear.clone(),
        sink.clone(),
        rolls.clone(),
        config.clone(),
    );
    let ai = EnemyAiSelector::new(content.clone(), rolls.clone());
    let dispatcher = Arc::new(StandardRewardDispatcher::new(rewards.clone(), config.clone()));
    let engine = EncounterEngine::new(
        executor,
        ai,
        dispatcher,
        content.clone(),
        gear,
        sink,
        rolls,
        events,
        config,
    );

    Harness {
        engine,
        store: Arc::new(CombatStore::new()),
        content,
        rewards,
    }
}

fn harness() -> Harness {
    harness_with_gear(GearBonus {
        hit_bonus_permille: 1000,
        ..GearBonus::default()
    })
}

impl Harness {
    fn insert(&self, id: CharacterId, class: CharacterClass, stats: StatBlock) {
        self.store
            .transaction::<_, StoreError>(|state| {
                state.insert_character(CharacterRow::new(
                    id,
                    format!("hero_{}", id.0),
                    class,
                    Race::Elf,
                    5,
                    stats,
                    LOCATION,
                ));
                Ok(())
            })
            .unwrap();
    }

    fn start(&self, leader: CharacterId, spawn: SpawnId, others: &[CharacterId]) -> EncounterId {
        self.store
            .transaction(|state| {
                self.engine
                    .start_combat(state, SimTime::ZERO, leader, spawn, others, None)
            })
            .unwrap()
    }

    fn tick(&self, encounter: EncounterId, now: SimTime) -> TickOutcome {
        self.store
            .transaction::<_, StoreError>(|state| Ok(self.engine.tick(state, now, encounter)))
            .unwrap()
    }

    fn fast_tick(&self, now: SimTime) {
        self.store
            .transaction::<_, StoreError>(|state| {
                self.engine.fast_tick(state, now);
                Ok(())
            })
            .unwrap()
    }

    fn cast(
        &self,
        now: SimTime,
        caster: CharacterId,
        key: &str,
        target: Option<TargetRef>,
    ) -> Result<(), RuntimeError> {
        self.store.transaction(|state| {
            self.engine
                .executor()
                .execute_character(state, now, caster, &AbilityKey::new(key), target)
                .map_err(RuntimeError::from)
        })
    }

    fn enemy_hp(&self, creature: CreatureId) -> i64 {
        self.store
            .read(|state| state.enemy(creature).map(|e| e.hp).unwrap_or(-1))
            .unwrap()
    }

    fn threat_of(&self, encounter: EncounterId, creature: CreatureId, ch: CharacterId) -> i64 {
        self.store
            .read(|state| {
                state
                    .threat(encounter)
                    .map(|t| t.value(creature, ThreatSource::Character(ch)))
                    .unwrap_or(0)
            })
            .unwrap()
    }
}

// ============================================================================
// Scenario A: single direct cast
// ============================================================================

#[test]
fn direct_cast_lands_once_within_variance_band_with_matching_threat() {
    let h = harness();
    h.insert(MAGE, CharacterClass::Mage, StatBlock::default());
    let encounter = h.start(MAGE, DUMMY_SPAWN, &[]);

    let creature = h
        .store
        .read(|state| state.living_enemies(encounter)[0])
        .unwrap();
    let hp_before = h.enemy_hp(creature);
    let threat_before = h.threat_of(encounter, creature, MAGE);

    h.cast(SimTime::ZERO, MAGE, "test_bolt", None).unwrap();

    let damage = hp_before - h.enemy_hp(creature);
    // power 10, zero scaling, zero resist: band is ceil(8.5)..floor(11.5)
    assert!((9..=11).contains(&damage), "damage {damage} outside band");

    // Applied exactly once, with a matching threat increment.
    let threat_gain = h.threat_of(encounter, creature, MAGE) - threat_before;
    assert_eq!(threat_gain, damage);
}

// ============================================================================
// Scenario B: DoT lifecycle
// ============================================================================

#[test]
fn dot_ticks_once_at_cast_then_three_times_then_expires() {
    let h = harness();
    h.insert(MAGE, CharacterClass::Mage, StatBlock::default());
    let encounter = h.start(MAGE, DUMMY_SPAWN, &[]);
    let creature = h
        .store
        .read(|state| state.living_enemies(encounter)[0])
        .unwrap();

    let hp_before = h.enemy_hp(creature);
    h.cast(SimTime::ZERO, MAGE, "test_rend", None).unwrap();

    // Direct half (band 9..=11) plus one immediate partial tick of 3.
    let initial = hp_before - h.enemy_hp(creature);
    assert!((12..=14).contains(&initial), "initial damage {initial}");
    let has_dot = h
        .store
        .read(|state| {
            state
                .enemy_effects
                .has_from(creature, EffectKind::Dot, &AbilityKey::new("test_rend"))
        })
        .unwrap();
    assert!(has_dot);

    // Exactly three further cadence ticks of 3 damage each.
    let mut hp = h.enemy_hp(creature);
    for round in 1..=3 {
        h.fast_tick(SimTime::from_secs(3 * round));
        let after = h.enemy_hp(creature);
        assert_eq!(hp - after, 3, "cadence tick {round}");
        hp = after;
    }

    // Row deleted; no further damage.
    let has_dot = h
        .store
        .read(|state| state.enemy_effects.has(creature, EffectKind::Dot))
        .unwrap();
    assert!(!has_dot);
    h.fast_tick(SimTime::from_secs(12));
    assert_eq!(h.enemy_hp(creature), hp);
}

// ============================================================================
// Scenario C: total party kill in one tick
// ============================================================================

#[test]
fn party_wipe_resolves_in_a_single_tick() {
    let h = harness();
    h.insert(WARRIOR, CharacterClass::Warrior, StatBlock::default());
    h.insert(MAGE, CharacterClass::Mage, StatBlock::default());
    let encounter = h.start(WARRIOR, SpawnId(3), &[MAGE]);

    // Both participants hit zero HP within the same tick window.
    h.store
        .transaction::<_, StoreError>(|state| {
            for ch in [WARRIOR, MAGE] {
                if let Some(row) = state.character_mut(ch) {
                    row.hp = 0;
                }
            }
            Ok(())
        })
        .unwrap();

    let outcome = h.tick(encounter, SimTime::from_secs(3));
    assert_eq!(outcome, TickOutcome::Resolved);

    // One defeat summary per participant, one corpse each, spawn released,
    // all inside that tick's transaction.
    let results = h
        .store
        .read(|state| {
            state
                .results_of(encounter)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.summary.contains("Defeat")));

    let corpses = h.rewards.corpses.lock().unwrap();
    assert_eq!(corpses.len(), 2);

    let released = h.content.released_spawns();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].0, SpawnId(3));

    // Survivor pools floored at the partial-restore fraction.
    let hp = h
        .store
        .read(|state| state.character(WARRIOR).map(|r| r.hp).unwrap_or(0))
        .unwrap();
    assert!(hp > 0);

    let resolved = h
        .store
        .read(|state| state.encounter(encounter).map(|e| e.state))
        .unwrap();
    assert_eq!(resolved, Some(EncounterState::Resolved));
}

// ============================================================================
// Scenario E: AoE skips the dead
// ============================================================================

#[test]
fn aoe_strikes_each_living_creature_independently_and_skips_dead() {
    let h = harness();
    h.insert(MAGE, CharacterClass::Mage, StatBlock::default());
    let encounter = h.start(MAGE, QUAD_SPAWN, &[]);

    let enemies = h.store.read(|state| state.enemies_of(encounter)).unwrap();
    assert_eq!(enemies.len(), 4);
    let dead = enemies[0];
    h.store
        .transaction::<_, StoreError>(|state| {
            if let Some(enemy) = state.enemy_mut(dead) {
                enemy.hp = 0;
            }
            Ok(())
        })
        .unwrap();
    let max_hp = h
        .store
        .read(|state| state.enemy(enemies[1]).map(|e| e.max_hp).unwrap_or(0))
        .unwrap();

    h.cast(SimTime::ZERO, MAGE, "test_nova", None).unwrap();

    // Three independent rolls: power 10 at the 65% AoE penalty is 6 after
    // mitigation, and the band collapses to exactly 6 for every target.
    for &creature in &enemies[1..] {
        assert_eq!(h.enemy_hp(creature), max_hp - 6);
        assert_eq!(h.threat_of(encounter, creature, MAGE), 1 + 6);
    }

    // Zero applications against the dead creature: seeded threat only.
    assert_eq!(h.enemy_hp(dead), 0);
    assert_eq!(h.threat_of(encounter, dead, MAGE), 1);
}

// ============================================================================
// Resource gating
// ============================================================================

#[test]
fn starved_cast_is_rejected_without_side_effects() {
    let h = harness();
    h.insert(MAGE, CharacterClass::Mage, StatBlock::default());
    let encounter = h.start(MAGE, DUMMY_SPAWN, &[]);
    let creature = h
        .store
        .read(|state| state.living_enemies(encounter)[0])
        .unwrap();
    let hp_before = h.enemy_hp(creature);

    h.store
        .transaction::<_, StoreError>(|state| {
            if let Some(row) = state.character_mut(MAGE) {
                row.mana = 0;
            }
            Ok(())
        })
        .unwrap();

    let result = h.cast(SimTime::ZERO, MAGE, "firebolt", None);
    assert!(matches!(
        result,
        Err(RuntimeError::Ability(AbilityError::InsufficientResource(_)))
    ));

    // Pool unchanged, target untouched.
    let mana = h
        .store
        .read(|state| state.character(MAGE).map(|r| r.mana).unwrap_or(-1))
        .unwrap();
    assert_eq!(mana, 0);
    assert_eq!(h.enemy_hp(creature), hp_before);
}

#[test]
fn free_cast_effect_is_consumed_exactly_once_on_success() {
    let h = harness();
    h.insert(MAGE, CharacterClass::Mage, StatBlock::default());
    let encounter = h.start(MAGE, DUMMY_SPAWN, &[]);
    let creature = h
        .store
        .read(|state| state.living_enemies(encounter)[0])
        .unwrap();

    h.store
        .transaction::<_, StoreError>(|state| {
            if let Some(row) = state.character_mut(MAGE) {
                row.mana = 0;
            }
            state.character_effects.apply(EffectRecord {
                owner: MAGE,
                kind: EffectKind::ResourceFree,
                magnitude: 0,
                duration: EffectDuration::Rounds(5),
                source: AbilityKey::new("clarity"),
                attributed_to: None,
            });
            Ok(())
        })
        .unwrap();

    h.cast(SimTime::ZERO, MAGE, "firebolt", None).unwrap();

    let (mana, still_free) = h
        .store
        .read(|state| {
            (
                state.character(MAGE).map(|r| r.mana).unwrap_or(-1),
                state.character_effects.has(MAGE, EffectKind::ResourceFree),
            )
        })
        .unwrap();
    assert_eq!(mana, 0, "free cast must not touch the pool");
    assert!(!still_free, "free-cast effect consumed by the success");
    assert!(h.enemy_hp(creature) < 120);

    // A second starved cast now fails.
    let result = h.cast(SimTime::from_secs(1), MAGE, "firebolt", None);
    assert!(matches!(
        result,
        Err(RuntimeError::Ability(AbilityError::InsufficientResource(_)))
    ));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn victory_awards_experience_and_releases_the_spawn() {
    let h = harness_with_gear(GearBonus {
        weapon_damage: 150,
        hit_bonus_permille: 1000,
        ..GearBonus::default()
    });
    h.insert(WARRIOR, CharacterClass::Warrior, StatBlock {
        strength: 10,
        ..StatBlock::default()
    });
    let encounter = h.start(WARRIOR, DUMMY_SPAWN, &[]);
    let xp_before = h
        .store
        .read(|state| state.character(WARRIOR).map(|r| r.xp).unwrap_or(0))
        .unwrap();

    // First auto-attack matures at the flat interval and one-shots the
    // dummy; the same tick distributes victory.
    let outcome = h.tick(encounter, SimTime::from_secs(6));
    assert_eq!(outcome, TickOutcome::Resolved);

    let results = h
        .store
        .read(|state| {
            state
                .results_of(encounter)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
        })
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].summary.contains("Victory"));

    let xp_after = h
        .store
        .read(|state| state.character(WARRIOR).map(|r| r.xp).unwrap_or(0))
        .unwrap();
    assert!(xp_after > xp_before);

    assert_eq!(h.content.released_spawns().len(), 1);
    assert!(!h.rewards.loot.lock().unwrap().is_empty());
}

#[test]
fn encounter_state_transitions_exactly_once() {
    let h = harness_with_gear(GearBonus {
        weapon_damage: 150,
        hit_bonus_permille: 1000,
        ..GearBonus::default()
    });
    h.insert(WARRIOR, CharacterClass::Warrior, StatBlock::default());
    let encounter = h.start(WARRIOR, DUMMY_SPAWN, &[]);

    assert_eq!(h.tick(encounter, SimTime::from_secs(6)), TickOutcome::Resolved);
    let results_before = h
        .store
        .read(|state| state.results_of(encounter).len())
        .unwrap();

    // A tick against a resolved encounter is a no-op.
    assert_eq!(h.tick(encounter, SimTime::from_secs(9)), TickOutcome::Resolved);
    let results_after = h
        .store
        .read(|state| state.results_of(encounter).len())
        .unwrap();
    assert_eq!(results_before, results_after);
}

#[test]
fn fleeing_is_honored_on_the_next_tick() {
    let h = harness();
    h.insert(WARRIOR, CharacterClass::Warrior, StatBlock::default());
    let encounter = h.start(WARRIOR, DUMMY_SPAWN, &[]);

    h.store
        .transaction(|state| h.engine.flee(state, WARRIOR))
        .unwrap();

    let status = h
        .store
        .read(|state| state.participant(encounter, WARRIOR).map(|p| p.status))
        .unwrap();
    assert_eq!(status, Some(ParticipantStatus::Fled));

    // Next tick finds nobody active and quietly closes the fight.
    assert_eq!(h.tick(encounter, SimTime::from_secs(3)), TickOutcome::Resolved);
    assert!(h.store.read(|state| state.results_of(encounter).is_empty()).unwrap());
    assert_eq!(h.content.released_spawns().len(), 1);
}

#[test]
fn stunned_participants_skip_auto_attacks_until_the_window_closes() {
    let h = harness_with_gear(GearBonus {
        weapon_damage: 20,
        hit_bonus_permille: 1000,
        ..GearBonus::default()
    });
    h.insert(WARRIOR, CharacterClass::Warrior, StatBlock::default());
    let encounter = h.start(WARRIOR, DUMMY_SPAWN, &[]);
    let creature = h
        .store
        .read(|state| state.living_enemies(encounter)[0])
        .unwrap();
    let hp_before = h.enemy_hp(creature);

    h.store
        .transaction::<_, StoreError>(|state| {
            state.character_effects.apply(EffectRecord {
                owner: WARRIOR,
                kind: EffectKind::Stun,
                magnitude: 0,
                duration: EffectDuration::Until(SimTime::from_secs(10)),
                source: AbilityKey::new("terrifying_howl"),
                attributed_to: None,
            });
            Ok(())
        })
        .unwrap();

    // Auto-attack timer has matured, but the stun window is still open.
    h.tick(encounter, SimTime::from_secs(6));
    assert_eq!(h.enemy_hp(creature), hp_before);

    // Window closed: the swing lands.
    h.tick(encounter, SimTime::from_secs(12));
    assert!(h.enemy_hp(creature) < hp_before);
}

// ============================================================================
// Pets
// ============================================================================

#[test]
fn guardian_summon_seeds_aggro_and_reclaim_folds_it_back() {
    let h = harness();
    h.insert(SUMMONER, CharacterClass::Summoner, StatBlock {
        intelligence: 10,
        ..StatBlock::default()
    });
    let encounter = h.start(SUMMONER, DUMMY_SPAWN, &[]);
    let creature = h
        .store
        .read(|state| state.living_enemies(encounter)[0])
        .unwrap();

    h.cast(SimTime::ZERO, SUMMONER, "summon_guardian", None)
        .unwrap();

    let (pet, pet_threat) = h
        .store
        .read(|state| {
            let pet = state.pet_of_owner(SUMMONER).map(|p| p.id).unwrap();
            let threat = state
                .threat(encounter)
                .map(|t| {
                    t.value(
                        creature,
                        ThreatSource::Pet {
                            pet,
                            owner: SUMMONER,
                        },
                    )
                })
                .unwrap_or(0);
            (pet, threat)
        })
        .unwrap();
    assert_eq!(pet_threat, 50, "guardian seeds aggro on every living creature");

    h.cast(SimTime::from_secs(1), SUMMONER, "reclaim", None)
        .unwrap();
    let owner_threat = h.threat_of(encounter, creature, SUMMONER);
    assert_eq!(owner_threat, 1 + 50, "pet threat folded onto the owner");

    let pet_threat = h
        .store
        .read(|state| {
            state
                .threat(encounter)
                .map(|t| {
                    t.value(
                        creature,
                        ThreatSource::Pet {
                            pet,
                            owner: SUMMONER,
                        },
                    )
                })
                .unwrap_or(0)
        })
        .unwrap();
    assert_eq!(pet_threat, 0);
}

#[test]
fn summoning_twice_retires_the_first_pet() {
    let h = harness();
    h.insert(SUMMONER, CharacterClass::Summoner, StatBlock {
        intelligence: 10,
        ..StatBlock::default()
    });
    h.start(SUMMONER, DUMMY_SPAWN, &[]);

    h.cast(SimTime::ZERO, SUMMONER, "summon_guardian", None)
        .unwrap();
    let first = h
        .store
        .read(|state| state.pet_of_owner(SUMMONER).map(|p| p.id))
        .unwrap()
        .unwrap();

    h.cast(SimTime::from_secs(1), SUMMONER, "summon_imp", None)
        .unwrap();
    let (count, second) = h
        .store
        .read(|state| {
            (
                state.pets.len(),
                state.pet_of_owner(SUMMONER).map(|p| p.id),
            )
        })
        .unwrap();
    assert_eq!(count, 1, "one live pet per character");
    assert_ne!(second, Some(first));
}

// ============================================================================
// Validation taxonomy
// ============================================================================

#[test]
fn wrong_class_and_unknown_abilities_are_distinct_rejections() {
    let h = harness();
    h.insert(MAGE, CharacterClass::Mage, StatBlock::default());
    h.start(MAGE, DUMMY_SPAWN, &[]);

    let unknown = h.cast(SimTime::ZERO, MAGE, "no_such_spell", None);
    assert!(matches!(
        unknown,
        Err(RuntimeError::Ability(AbilityError::UnknownAbility(_)))
    ));

    let wrong_class = h.cast(SimTime::ZERO, MAGE, "savage_strike", None);
    assert!(matches!(
        wrong_class,
        Err(RuntimeError::Ability(AbilityError::WrongClass))
    ));
}

#[test]
fn out_of_combat_damage_cast_is_rejected() {
    let h = harness();
    h.insert(MAGE, CharacterClass::Mage, StatBlock::default());

    let result = h.cast(SimTime::ZERO, MAGE, "firebolt", None);
    assert!(matches!(
        result,
        Err(RuntimeError::Ability(AbilityError::NotInCombat))
    ));
}
