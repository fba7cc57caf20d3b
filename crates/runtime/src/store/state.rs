//! The combat working set.
//!
//! [`CombatState`] is the full mutable state one transaction operates on.
//! Collections are `BTreeMap`/ordered `Vec`s so iteration order, and
//! therefore every tie-break in the engine, is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use combat_core::ability::AbilityKey;
use combat_core::effect::EffectLedger;
use combat_core::threat::ThreatTable;
use combat_core::types::{
    CharacterId, CreatureId, EncounterId, GroupId, LocationId, PetId, SimTime,
};

use super::types::{
    ActivePet, CharacterCooldown, CharacterRow, CombatEncounter, CombatEnemy, CombatParticipant,
    CombatResult, EncounterState, EnemyCast, EnemyCooldown, ParticipantStatus,
};

/// All combat rows, as one cloneable working set.
///
/// A transaction clones this, mutates the copy, and commits it back on
/// success; see [`super::CombatStore`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CombatState {
    pub encounters: BTreeMap<EncounterId, CombatEncounter>,
    pub participants: Vec<CombatParticipant>,
    pub enemies: BTreeMap<CreatureId, CombatEnemy>,
    pub threat: BTreeMap<EncounterId, ThreatTable>,
    pub character_effects: EffectLedger<CharacterId>,
    pub enemy_effects: EffectLedger<CreatureId>,
    pub pets: BTreeMap<PetId, ActivePet>,
    pub casts: Vec<EnemyCast>,
    pub enemy_cooldowns: Vec<EnemyCooldown>,
    pub character_cooldowns: Vec<CharacterCooldown>,
    pub results: Vec<CombatResult>,
    pub characters: BTreeMap<CharacterId, CharacterRow>,

    next_encounter: u64,
    next_creature: u64,
    next_pet: u64,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Characters
    // ========================================================================

    pub fn insert_character(&mut self, row: CharacterRow) {
        self.characters.insert(row.id, row);
    }

    pub fn character(&self, id: CharacterId) -> Option<&CharacterRow> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut CharacterRow> {
        self.characters.get_mut(&id)
    }

    // ========================================================================
    // Encounters
    // ========================================================================

    pub fn create_encounter(
        &mut self,
        location: LocationId,
        group: Option<GroupId>,
        now: SimTime,
    ) -> EncounterId {
        self.next_encounter += 1;
        let id = EncounterId(self.next_encounter);
        self.encounters.insert(
            id,
            CombatEncounter {
                id,
                location,
                group,
                state: EncounterState::Active,
                created_at: now,
            },
        );
        id
    }

    pub fn encounter(&self, id: EncounterId) -> Option<&CombatEncounter> {
        self.encounters.get(&id)
    }

    pub fn encounter_mut(&mut self, id: EncounterId) -> Option<&mut CombatEncounter> {
        self.encounters.get_mut(&id)
    }

    pub fn active_encounters(&self) -> impl Iterator<Item = &CombatEncounter> {
        self.encounters
            .values()
            .filter(|e| e.state == EncounterState::Active)
    }

    // ========================================================================
    // Participants
    // ========================================================================

    pub fn add_participant(
        &mut self,
        encounter: EncounterId,
        character: CharacterId,
        first_attack_at: SimTime,
    ) {
        self.participants.push(CombatParticipant {
            encounter,
            character,
            status: ParticipantStatus::Active,
            next_auto_attack_at: first_attack_at,
        });
    }

    pub fn participant(
        &self,
        encounter: EncounterId,
        character: CharacterId,
    ) -> Option<&CombatParticipant> {
        self.participants
            .iter()
            .find(|p| p.encounter == encounter && p.character == character)
    }

    pub fn participant_mut(
        &mut self,
        encounter: EncounterId,
        character: CharacterId,
    ) -> Option<&mut CombatParticipant> {
        self.participants
            .iter_mut()
            .find(|p| p.encounter == encounter && p.character == character)
    }

    pub fn participants_of(&self, encounter: EncounterId) -> Vec<CombatParticipant> {
        self.participants
            .iter()
            .filter(|p| p.encounter == encounter)
            .cloned()
            .collect()
    }

    pub fn active_participants(&self, encounter: EncounterId) -> Vec<CharacterId> {
        self.participants
            .iter()
            .filter(|p| p.encounter == encounter && p.status == ParticipantStatus::Active)
            .map(|p| p.character)
            .collect()
    }

    /// The active encounter a character is currently fighting in.
    ///
    /// Consulted before group/character switches: a character may be a
    /// participant in at most one active encounter at a time.
    pub fn encounter_of_character(&self, character: CharacterId) -> Option<EncounterId> {
        self.participants
            .iter()
            .filter(|p| p.character == character && p.status != ParticipantStatus::Fled)
            .map(|p| p.encounter)
            .find(|id| {
                self.encounters
                    .get(id)
                    .is_some_and(|e| e.state == EncounterState::Active)
            })
    }

    pub fn in_combat(&self, character: CharacterId) -> bool {
        self.encounter_of_character(character).is_some()
    }

    // ========================================================================
    // Enemies
    // ========================================================================

    /// Insert a creature instance, assigning its id.
    pub fn spawn_enemy(&mut self, mut enemy: CombatEnemy) -> CreatureId {
        self.next_creature += 1;
        let id = CreatureId(self.next_creature);
        enemy.id = id;
        self.enemies.insert(id, enemy);
        id
    }

    pub fn enemy(&self, id: CreatureId) -> Option<&CombatEnemy> {
        self.enemies.get(&id)
    }

    pub fn enemy_mut(&mut self, id: CreatureId) -> Option<&mut CombatEnemy> {
        self.enemies.get_mut(&id)
    }

    pub fn enemies_of(&self, encounter: EncounterId) -> Vec<CreatureId> {
        self.enemies
            .values()
            .filter(|e| e.encounter == encounter)
            .map(|e| e.id)
            .collect()
    }

    pub fn living_enemies(&self, encounter: EncounterId) -> Vec<CreatureId> {
        self.enemies
            .values()
            .filter(|e| e.encounter == encounter && e.is_alive())
            .map(|e| e.id)
            .collect()
    }

    // ========================================================================
    // Threat
    // ========================================================================

    pub fn threat(&self, encounter: EncounterId) -> Option<&ThreatTable> {
        self.threat.get(&encounter)
    }

    pub fn threat_mut(&mut self, encounter: EncounterId) -> &mut ThreatTable {
        self.threat.entry(encounter).or_default()
    }

    // ========================================================================
    // Pets
    // ========================================================================

    /// Insert a pet row, assigning its id.
    pub fn summon_pet(&mut self, mut pet: ActivePet) -> PetId {
        self.next_pet += 1;
        let id = PetId(self.next_pet);
        pet.id = id;
        self.pets.insert(id, pet);
        id
    }

    pub fn pet(&self, id: PetId) -> Option<&ActivePet> {
        self.pets.get(&id)
    }

    pub fn pet_mut(&mut self, id: PetId) -> Option<&mut ActivePet> {
        self.pets.get_mut(&id)
    }

    /// A character's live pet, if any. At most one exists.
    pub fn pet_of_owner(&self, owner: CharacterId) -> Option<&ActivePet> {
        self.pets.values().find(|p| p.owner == owner)
    }

    pub fn remove_pet(&mut self, id: PetId) -> Option<ActivePet> {
        self.pets.remove(&id)
    }

    pub fn pets_of_encounter(&self, encounter: EncounterId) -> Vec<PetId> {
        self.pets
            .values()
            .filter(|p| p.encounter == Some(encounter))
            .map(|p| p.id)
            .collect()
    }

    // ========================================================================
    // Creature Casts & Cooldowns
    // ========================================================================

    pub fn begin_cast(&mut self, cast: EnemyCast) {
        self.casts.push(cast);
    }

    pub fn cast_of(&self, creature: CreatureId) -> Option<&EnemyCast> {
        self.casts.iter().find(|c| c.creature == creature)
    }

    /// Remove and return every cast of this encounter whose timer elapsed.
    pub fn take_matured_casts(&mut self, encounter: EncounterId, now: SimTime) -> Vec<EnemyCast> {
        let (matured, pending) = self
            .casts
            .drain(..)
            .partition(|c| c.encounter == encounter && c.resolves_at <= now);
        self.casts = pending;
        matured
    }

    pub fn enemy_cooldown_ready(
        &self,
        encounter: EncounterId,
        ability: &AbilityKey,
        now: SimTime,
    ) -> bool {
        self.enemy_cooldowns
            .iter()
            .find(|c| c.encounter == encounter && c.ability == *ability)
            .is_none_or(|c| c.ready_at <= now)
    }

    pub fn set_enemy_cooldown(
        &mut self,
        encounter: EncounterId,
        ability: AbilityKey,
        ready_at: SimTime,
    ) {
        if let Some(cooldown) = self
            .enemy_cooldowns
            .iter_mut()
            .find(|c| c.encounter == encounter && c.ability == ability)
        {
            cooldown.ready_at = ready_at;
            return;
        }
        self.enemy_cooldowns.push(EnemyCooldown {
            encounter,
            ability,
            ready_at,
        });
    }

    pub fn character_cooldown_ready(
        &self,
        character: CharacterId,
        ability: &AbilityKey,
        now: SimTime,
    ) -> bool {
        self.character_cooldowns
            .iter()
            .find(|c| c.character == character && c.ability == *ability)
            .is_none_or(|c| c.ready_at <= now)
    }

    pub fn set_character_cooldown(
        &mut self,
        character: CharacterId,
        ability: AbilityKey,
        ready_at: SimTime,
    ) {
        if let Some(cooldown) = self
            .character_cooldowns
            .iter_mut()
            .find(|c| c.character == character && c.ability == ability)
        {
            cooldown.ready_at = ready_at;
            return;
        }
        self.character_cooldowns.push(CharacterCooldown {
            character,
            ability,
            ready_at,
        });
    }

    // ========================================================================
    // Death & Reversion
    // ========================================================================

    /// Remove every temporary max-HP grant on a character and revert the
    /// granted maximum, clamping current HP into the restored range.
    pub fn revert_max_hp_grants(&mut self, character: CharacterId) {
        let removed = self
            .character_effects
            .remove_kind(character, combat_core::effect::EffectKind::MaxHpBonus);
        if removed.is_empty() {
            return;
        }
        if let Some(row) = self.characters.get_mut(&character) {
            for record in removed {
                row.max_hp = (row.max_hp - record.magnitude).max(1);
            }
            row.hp = row.hp.clamp(0, row.max_hp);
        }
    }

    /// Flip a participant to `Dead`, reverting max-HP grants first.
    ///
    /// Returns true when the participant was newly marked.
    pub fn mark_participant_dead(
        &mut self,
        encounter: EncounterId,
        character: CharacterId,
    ) -> bool {
        self.revert_max_hp_grants(character);
        if let Some(row) = self.characters.get_mut(&character) {
            row.hp = 0;
        }
        match self.participant_mut(encounter, character) {
            Some(p) if p.status == ParticipantStatus::Active => {
                p.status = ParticipantStatus::Dead;
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Results
    // ========================================================================

    pub fn push_result(&mut self, result: CombatResult) {
        self.results.push(result);
    }

    pub fn results_of(&self, encounter: EncounterId) -> Vec<&CombatResult> {
        self.results
            .iter()
            .filter(|r| r.encounter == encounter)
            .collect()
    }
}
