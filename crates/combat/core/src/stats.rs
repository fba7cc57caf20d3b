//! Character classes, races, creature roles, and stat derivation.
//!
//! The class-capability table here is the single source of truth for
//! which classes can parry/block and how each class generates threat.

use crate::config::EngineConfig;

// ============================================================================
// Stat Block
// ============================================================================

/// Core attribute block shared by characters and gear bonuses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatBlock {
    pub strength: i64,
    pub dexterity: i64,
    pub intelligence: i64,
    pub wisdom: i64,
}

impl StatBlock {
    pub fn plus(self, other: StatBlock) -> StatBlock {
        StatBlock {
            strength: self.strength + other.strength,
            dexterity: self.dexterity + other.dexterity,
            intelligence: self.intelligence + other.intelligence,
            wisdom: self.wisdom + other.wisdom,
        }
    }

    pub fn get(self, stat: PrimaryStat) -> i64 {
        match stat {
            PrimaryStat::Strength => self.strength,
            PrimaryStat::Dexterity => self.dexterity,
            PrimaryStat::Intelligence => self.intelligence,
            PrimaryStat::Wisdom => self.wisdom,
        }
    }
}

/// The attribute an ability's stat scaling reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimaryStat {
    Strength,
    Dexterity,
    Intelligence,
    Wisdom,
}

// ============================================================================
// Character Classes
// ============================================================================

/// Playable character classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharacterClass {
    Warrior,
    Rogue,
    Cleric,
    Mage,
    Ranger,
    Summoner,
}

/// How a class converts its output into threat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThreatPolicy {
    /// Threat proportional to damage dealt.
    Damage,
    /// Larger multiplier on damage dealt.
    Tank,
    /// A percentage of healing done, split across all living creatures.
    Healer,
    /// Dedicated factor for pet-summoning classes.
    PetMaster,
}

impl ThreatPolicy {
    /// Threat factor in percent for damage-based threat.
    pub fn damage_percent(self, config: &EngineConfig) -> i64 {
        match self {
            ThreatPolicy::Damage => config.damage_threat_percent,
            ThreatPolicy::Tank => config.tank_threat_percent,
            ThreatPolicy::Healer => config.damage_threat_percent,
            ThreatPolicy::PetMaster => config.pet_class_threat_percent,
        }
    }
}

/// Per-class combat capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassCapabilities {
    pub can_parry: bool,
    pub can_block: bool,
    pub threat: ThreatPolicy,
    pub primary_stat: PrimaryStat,
}

impl CharacterClass {
    /// Class-capability table: the one place these sets are defined.
    pub fn capabilities(self) -> ClassCapabilities {
        match self {
            CharacterClass::Warrior => ClassCapabilities {
                can_parry: true,
                can_block: true,
                threat: ThreatPolicy::Tank,
                primary_stat: PrimaryStat::Strength,
            },
            CharacterClass::Rogue => ClassCapabilities {
                can_parry: true,
                can_block: false,
                threat: ThreatPolicy::Damage,
                primary_stat: PrimaryStat::Dexterity,
            },
            CharacterClass::Cleric => ClassCapabilities {
                can_parry: false,
                can_block: true,
                threat: ThreatPolicy::Healer,
                primary_stat: PrimaryStat::Wisdom,
            },
            CharacterClass::Mage => ClassCapabilities {
                can_parry: false,
                can_block: false,
                threat: ThreatPolicy::Damage,
                primary_stat: PrimaryStat::Intelligence,
            },
            CharacterClass::Ranger => ClassCapabilities {
                can_parry: true,
                can_block: false,
                threat: ThreatPolicy::Damage,
                primary_stat: PrimaryStat::Dexterity,
            },
            CharacterClass::Summoner => ClassCapabilities {
                can_parry: false,
                can_block: false,
                threat: ThreatPolicy::PetMaster,
                primary_stat: PrimaryStat::Intelligence,
            },
        }
    }
}

// ============================================================================
// Races
// ============================================================================

/// Playable races. Only combat-relevant bonuses live here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Race {
    Human,
    Orc,
    Elf,
    Dwarf,
}

impl Race {
    /// Flat racial damage bonus added to ability damage.
    pub fn damage_bonus(self) -> i64 {
        match self {
            Race::Human => 0,
            Race::Orc => 2,
            Race::Elf => 0,
            Race::Dwarf => 1,
        }
    }
}

// ============================================================================
// Creature Roles
// ============================================================================

/// Role assigned to a creature instance on spawn.
///
/// One creature template yields differently-tuned instances purely from
/// role assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CreatureRole {
    Damage,
    Tank,
    Healer,
    Support,
}

/// Role-based scaling applied on top of a creature template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleTemplate {
    pub base_hp: i64,
    pub hp_per_level: i64,
    pub base_damage: i64,
    pub damage_per_level: i64,
    pub base_armor: i64,
    pub armor_per_level: i64,
}

/// Stats of one creature instance after role scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivedEnemyStats {
    pub max_hp: i64,
    pub attack_damage: i64,
    pub armor_class: i64,
}

/// Derive a creature instance's stats from its template plus role scaling.
///
/// # Formula
///
/// ```text
/// max_hp        = template_hp    + role.base_hp     + role.hp_per_level * level
/// attack_damage =                  role.base_damage + role.damage_per_level * level
/// armor_class   = template_armor + role.base_armor  + role.armor_per_level * level
/// ```
pub fn derive_enemy_stats(
    template_hp: i64,
    template_armor: i64,
    role: &RoleTemplate,
    level: u32,
) -> DerivedEnemyStats {
    let level = i64::from(level);
    DerivedEnemyStats {
        max_hp: (template_hp + role.base_hp + role.hp_per_level * level).max(1),
        attack_damage: (role.base_damage + role.damage_per_level * level).max(0),
        armor_class: (template_armor + role.base_armor + role.armor_per_level * level).max(0),
    }
}

// ============================================================================
// Level Difference Scaling
// ============================================================================

/// Damage multiplier in percent for a creature attacking a character,
/// scaled by the level difference and clamped to a sane band.
pub fn level_difference_percent(attacker_level: u32, target_level: u32) -> i64 {
    let diff = i64::from(attacker_level) - i64::from(target_level);
    (100 + diff * 10).clamp(50, 150)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_scaling_uses_level_slopes() {
        let role = RoleTemplate {
            base_hp: 20,
            hp_per_level: 5,
            base_damage: 4,
            damage_per_level: 2,
            base_armor: 10,
            armor_per_level: 1,
        };
        let derived = derive_enemy_stats(100, 30, &role, 6);
        assert_eq!(derived.max_hp, 100 + 20 + 30);
        assert_eq!(derived.attack_damage, 4 + 12);
        assert_eq!(derived.armor_class, 30 + 10 + 6);
    }

    #[test]
    fn same_template_differs_by_role() {
        let tank = RoleTemplate {
            base_hp: 50,
            hp_per_level: 10,
            ..RoleTemplate::default()
        };
        let damage = RoleTemplate {
            base_damage: 10,
            damage_per_level: 3,
            ..RoleTemplate::default()
        };
        let a = derive_enemy_stats(80, 0, &tank, 4);
        let b = derive_enemy_stats(80, 0, &damage, 4);
        assert!(a.max_hp > b.max_hp);
        assert!(b.attack_damage > a.attack_damage);
    }

    #[test]
    fn level_difference_clamps() {
        assert_eq!(level_difference_percent(10, 10), 100);
        assert_eq!(level_difference_percent(12, 10), 120);
        assert_eq!(level_difference_percent(30, 1), 150);
        assert_eq!(level_difference_percent(1, 30), 50);
    }

    #[test]
    fn parry_capability_comes_from_one_table() {
        assert!(CharacterClass::Warrior.capabilities().can_parry);
        assert!(CharacterClass::Rogue.capabilities().can_parry);
        assert!(!CharacterClass::Mage.capabilities().can_parry);
        assert!(!CharacterClass::Cleric.capabilities().can_parry);
    }
}
