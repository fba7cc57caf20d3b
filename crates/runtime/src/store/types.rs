//! Combat store rows.
//!
//! Every entity is plain data behind the store; mutation happens through
//! update-by-id accessors on [`super::CombatState`], never through a live
//! object graph shared across components.

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use combat_core::ability::AbilityKey;
use combat_core::config::EngineConfig;
use combat_core::mitigation::DefenseProfile;
use combat_core::stats::{CharacterClass, CreatureRole, Race, StatBlock};
use combat_core::types::{
    CharacterId, CreatureId, EncounterId, GroupId, LocationId, PetId, SimTime, SpawnId,
    ThreatTarget,
};
use combat_core::ResourceKind;

// ============================================================================
// Encounter
// ============================================================================

/// Lifecycle of an encounter. Terminal once resolved; a resolved
/// encounter is never reactivated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EncounterState {
    Active,
    Resolved,
}

/// One fight instance between a party and a spawned creature group.
///
/// Created on combat start, mutated only by the tick handler and explicit
/// end/flee actions, never deleted: resolved rows remain as a historical
/// record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEncounter {
    pub id: EncounterId,
    pub location: LocationId,
    pub group: Option<GroupId>,
    pub state: EncounterState,
    pub created_at: SimTime,
}

// ============================================================================
// Participants
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ParticipantStatus {
    Active,
    Dead,
    Fled,
}

/// Membership of one character in one encounter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatParticipant {
    pub encounter: EncounterId,
    pub character: CharacterId,
    pub status: ParticipantStatus,
    /// Next auto-attack allowed at this time.
    pub next_auto_attack_at: SimTime,
}

// ============================================================================
// Enemies
// ============================================================================

/// One hostile creature instance inside an encounter.
///
/// Derived once from its template plus role-based scaling; mutated every
/// tick; removed when the encounter's artifacts are cleared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEnemy {
    pub id: CreatureId,
    pub encounter: EncounterId,
    pub spawn: SpawnId,
    pub template_key: String,
    pub name: String,
    pub level: u32,
    pub role: CreatureRole,
    pub hp: i64,
    pub max_hp: i64,
    pub attack_damage: i64,
    pub armor_class: i64,
    pub magic_resist: i64,
    pub abilities: ArrayVec<AbilityKey, { EngineConfig::MAX_CREATURE_ABILITIES }>,
    /// Current aggro target; refreshed from the threat table each turn.
    pub target: Option<ThreatTarget>,
    pub next_auto_attack_at: SimTime,
    /// Base experience override carried from the template.
    pub base_xp: u64,
}

impl CombatEnemy {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Apply damage, clamping HP to `[0, max]`.
    pub fn damage(&mut self, amount: i64) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    /// Apply healing, clamping HP to `[0, max]`.
    pub fn heal(&mut self, amount: i64) {
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
    }

    /// Creatures dodge a little and neither parry nor block.
    pub fn defense_profile(&self) -> DefenseProfile {
        DefenseProfile {
            dodge_permille: 30,
            parry_permille: 0,
            block_permille: 0,
            can_parry: false,
            can_block: false,
        }
    }
}

// ============================================================================
// Pets
// ============================================================================

/// A summoned combat helper bound to one character.
///
/// At most one live pet per character; summoning a new one retires the
/// old one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePet {
    pub id: PetId,
    pub owner: CharacterId,
    pub encounter: Option<EncounterId>,
    pub name: String,
    pub hp: i64,
    pub max_hp: i64,
    pub attack_damage: i64,
    /// Granted special ability, rolled against its own cooldown.
    pub ability: Option<AbilityKey>,
    pub ability_ready_at: SimTime,
    pub target: Option<CreatureId>,
    pub next_auto_attack_at: SimTime,
    /// Lifetime cap; `None` lasts until dismissed or killed.
    pub expires_at: Option<SimTime>,
}

impl ActivePet {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn damage(&mut self, amount: i64) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }
}

// ============================================================================
// Creature Casts & Cooldowns
// ============================================================================

/// Resolved target recorded when a creature cast begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastTarget {
    Character(CharacterId),
    SelfCast(CreatureId),
}

/// An in-flight creature ability cast.
///
/// Casting is state, not a suspended execution: the tick handler checks
/// `resolves_at` against the current time on each entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyCast {
    pub encounter: EncounterId,
    pub creature: CreatureId,
    pub ability: AbilityKey,
    pub resolves_at: SimTime,
    pub target: CastTarget,
}

/// Per-(encounter, ability) cooldown-ready timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyCooldown {
    pub encounter: EncounterId,
    pub ability: AbilityKey,
    pub ready_at: SimTime,
}

/// Per-(character, ability) cooldown-ready timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCooldown {
    pub character: CharacterId,
    pub ability: AbilityKey,
    pub ready_at: SimTime,
}

// ============================================================================
// Results
// ============================================================================

/// Immutable post-hoc summary row, one per participant. Never mutated
/// once inserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    pub encounter: EncounterId,
    pub character: CharacterId,
    pub summary: String,
    pub recorded_at: SimTime,
}

// ============================================================================
// Characters
// ============================================================================

/// The engine's view of one character sheet.
///
/// Sourced from the character collaborator at login; the combat engine
/// owns HP/resource mutation while a character is in play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRow {
    pub id: CharacterId,
    pub name: String,
    pub class: CharacterClass,
    pub race: Race,
    pub level: u32,
    pub stats: StatBlock,
    pub hp: i64,
    pub max_hp: i64,
    pub mana: i64,
    pub max_mana: i64,
    pub stamina: i64,
    pub max_stamina: i64,
    pub xp: u64,
    pub location: LocationId,
    pub group: Option<GroupId>,
}

impl CharacterRow {
    /// Fresh character with pools derived from level and stats.
    pub fn new(
        id: CharacterId,
        name: impl Into<String>,
        class: CharacterClass,
        race: Race,
        level: u32,
        stats: StatBlock,
        location: LocationId,
    ) -> Self {
        let mut row = Self {
            id,
            name: name.into(),
            class,
            race,
            level,
            stats,
            hp: 0,
            max_hp: 0,
            mana: 0,
            max_mana: 0,
            stamina: 0,
            max_stamina: 0,
            xp: 0,
            location,
            group: None,
        };
        row.recompute_pools();
        row.hp = row.max_hp;
        row.mana = row.max_mana;
        row.stamina = row.max_stamina;
        row
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Recompute pool maximums from level and stats.
    ///
    /// # Formula
    ///
    /// ```text
    /// max_hp      = 20 + level * 10 + strength * 2
    /// max_mana    = 10 + level * 5  + max(intelligence, wisdom) * 3
    /// max_stamina = 10 + level * 5  + dexterity * 2
    /// ```
    ///
    /// Current values are clamped into the new ranges; the caller decides
    /// whether a level-up also refills them.
    pub fn recompute_pools(&mut self) {
        let level = i64::from(self.level);
        self.max_hp = 20 + level * 10 + self.stats.strength * 2;
        self.max_mana = 10 + level * 5 + self.stats.intelligence.max(self.stats.wisdom) * 3;
        self.max_stamina = 10 + level * 5 + self.stats.dexterity * 2;
        self.hp = self.hp.clamp(0, self.max_hp);
        self.mana = self.mana.clamp(0, self.max_mana);
        self.stamina = self.stamina.clamp(0, self.max_stamina);
    }

    /// Apply damage, clamping HP to `[0, max]`.
    pub fn damage(&mut self, amount: i64) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    /// Apply healing, clamping HP to `[0, max]`. Returns the amount
    /// actually restored.
    pub fn heal(&mut self, amount: i64) -> i64 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    pub fn resource(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Mana => self.mana,
            ResourceKind::Stamina => self.stamina,
        }
    }

    /// Spend from a pool, clamping at zero.
    pub fn spend_resource(&mut self, kind: ResourceKind, amount: i64) {
        match kind {
            ResourceKind::Mana => self.mana = (self.mana - amount.max(0)).max(0),
            ResourceKind::Stamina => self.stamina = (self.stamina - amount.max(0)).max(0),
        }
    }

    /// Restore a pool toward its max.
    pub fn restore_resource(&mut self, kind: ResourceKind, amount: i64) {
        match kind {
            ResourceKind::Mana => self.mana = (self.mana + amount.max(0)).min(self.max_mana),
            ResourceKind::Stamina => {
                self.stamina = (self.stamina + amount.max(0)).min(self.max_stamina)
            }
        }
    }

    /// Class-capability-driven defense profile for the outcome roll.
    pub fn defense_profile(&self) -> DefenseProfile {
        let caps = self.class.capabilities();
        DefenseProfile {
            dodge_permille: (self.stats.dexterity.max(0) as u32).saturating_mul(2).min(200),
            parry_permille: if caps.can_parry { 50 } else { 0 },
            block_permille: if caps.can_block { 50 } else { 0 },
            can_parry: caps.can_parry,
            can_block: caps.can_block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::types::LocationId;

    fn character() -> CharacterRow {
        CharacterRow::new(
            CharacterId(1),
            "Ana",
            CharacterClass::Warrior,
            Race::Human,
            5,
            StatBlock {
                strength: 10,
                dexterity: 8,
                intelligence: 2,
                wisdom: 2,
            },
            LocationId(1),
        )
    }

    #[test]
    fn pools_start_full() {
        let row = character();
        assert_eq!(row.hp, row.max_hp);
        assert_eq!(row.mana, row.max_mana);
        assert_eq!(row.stamina, row.max_stamina);
    }

    #[test]
    fn damage_and_heal_clamp() {
        let mut row = character();
        row.damage(row.max_hp + 100);
        assert_eq!(row.hp, 0);
        assert!(!row.is_alive());

        row.heal(row.max_hp + 500);
        assert_eq!(row.hp, row.max_hp);
    }

    #[test]
    fn resources_never_go_negative() {
        let mut row = character();
        row.spend_resource(ResourceKind::Mana, row.max_mana + 50);
        assert_eq!(row.mana, 0);
    }

    #[test]
    fn warrior_defense_allows_parry_and_block() {
        let profile = character().defense_profile();
        assert!(profile.can_parry);
        assert!(profile.can_block);
        assert_eq!(profile.dodge_permille, 16);
    }
}
