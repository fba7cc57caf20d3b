//! Built-in content oracles.
//!
//! A small static catalog (abilities, creature abilities, pet and
//! creature templates, role scaling, spawn membership) so the runtime
//! works end-to-end without an external content pipeline. Production
//! deployments replace these with database-backed oracles implementing
//! the same traits.

use std::collections::BTreeMap;
use std::sync::Mutex;

use arrayvec::ArrayVec;

use combat_core::ability::{
    AbilityKey, AbilitySpec, CreatureAbilityEffect, CreatureAbilitySpec, DebuffSpec,
    PeriodicSplit, PetArchetype, PetTemplate, SpecialMechanic, TargetRule,
};
use combat_core::effect::EffectKind;
use combat_core::env::{AbilityOracle, CreatureOracle, CreatureTemplate, GearBonus, GearOracle};
use combat_core::stats::{CharacterClass, CreatureRole, RoleTemplate};
use combat_core::types::{CharacterId, SimTime, SpawnId};
use combat_core::{DamageKind, ResourceKind};

/// Gear oracle returning the same bonus block for every character.
///
/// Stands in for the inventory collaborator in tests and local runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedGearOracle {
    pub bonus: GearBonus,
}

impl FixedGearOracle {
    pub fn new(bonus: GearBonus) -> Self {
        Self { bonus }
    }
}

impl GearOracle for FixedGearOracle {
    fn bonuses(&self, _character: CharacterId) -> GearBonus {
        self.bonus
    }
}

/// Static content catalog.
pub struct StaticContent {
    abilities: BTreeMap<String, AbilitySpec>,
    creature_abilities: BTreeMap<String, CreatureAbilitySpec>,
    pets: BTreeMap<String, PetTemplate>,
    creatures: BTreeMap<String, CreatureTemplate>,
    spawns: BTreeMap<SpawnId, Vec<String>>,
    /// Spawn slots released by resolved encounters, for world bookkeeping
    /// (and for tests to assert against).
    released: Mutex<Vec<(SpawnId, SimTime)>>,
}

impl StaticContent {
    /// The standard built-in catalog.
    pub fn standard() -> Self {
        let mut content = Self {
            abilities: BTreeMap::new(),
            creature_abilities: BTreeMap::new(),
            pets: BTreeMap::new(),
            creatures: BTreeMap::new(),
            spawns: BTreeMap::new(),
            released: Mutex::new(Vec::new()),
        };
        content.install_abilities();
        content.install_creature_abilities();
        content.install_pets();
        content.install_creatures();
        content
    }

    pub fn add_ability(&mut self, spec: AbilitySpec) -> &mut Self {
        self.abilities.insert(spec.key.as_str().to_owned(), spec);
        self
    }

    pub fn add_creature_ability(&mut self, spec: CreatureAbilitySpec) -> &mut Self {
        self.creature_abilities
            .insert(spec.key.as_str().to_owned(), spec);
        self
    }

    pub fn add_creature(&mut self, template: CreatureTemplate) -> &mut Self {
        self.creatures.insert(template.key.clone(), template);
        self
    }

    /// Register a spawn slot holding the given creature templates.
    pub fn add_spawn(&mut self, spawn: SpawnId, members: &[&str]) -> &mut Self {
        self.spawns
            .insert(spawn, members.iter().map(|k| (*k).to_owned()).collect());
        self
    }

    /// Spawn slots released since startup.
    pub fn released_spawns(&self) -> Vec<(SpawnId, SimTime)> {
        self.released.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn install_abilities(&mut self) {
        // Warrior
        let mut spec = AbilitySpec::direct("savage_strike", "Savage Strike", CharacterClass::Warrior, 8);
        spec.resource = ResourceKind::Stamina;
        spec.cost = 5;
        spec.weapon_percent = 100;
        spec.stat_scaling_permille = 250;
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("sunder", "Sunder Armor", CharacterClass::Warrior, 6);
        spec.resource = ResourceKind::Stamina;
        spec.cost = 10;
        spec.cooldown_ms = 12_000;
        spec.debuff = Some(DebuffSpec {
            kind: EffectKind::AcBonus,
            magnitude: -10,
            rounds: 3,
        });
        self.add_ability(spec);

        // Rogue
        let mut spec = AbilitySpec::direct("twin_fangs", "Twin Fangs", CharacterClass::Rogue, 5);
        spec.resource = ResourceKind::Stamina;
        spec.cost = 8;
        spec.weapon_percent = 60;
        spec.stat_scaling_permille = 400;
        spec.hits = 2;
        self.add_ability(spec);

        // Mage
        let mut spec = AbilitySpec::direct("firebolt", "Firebolt", CharacterClass::Mage, 12);
        spec.cost = 8;
        spec.cast_time_ms = 1_500;
        spec.damage_kind = DamageKind::Magic;
        spec.stat_scaling_permille = 500;
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("flamestrike", "Flamestrike", CharacterClass::Mage, 16);
        spec.cost = 20;
        spec.cast_time_ms = 3_000;
        spec.cooldown_ms = 10_000;
        spec.damage_kind = DamageKind::Magic;
        spec.stat_scaling_permille = 400;
        spec.aoe = true;
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("immolate", "Immolate", CharacterClass::Mage, 14);
        spec.cost = 12;
        spec.damage_kind = DamageKind::Magic;
        spec.stat_scaling_permille = 400;
        spec.periodic = Some(PeriodicSplit {
            power_percent: 50,
            duration_ticks: 3,
        });
        self.add_ability(spec);

        // Cleric
        let mut spec = AbilitySpec::direct("mend", "Mend Wounds", CharacterClass::Cleric, 10);
        spec.cost = 8;
        spec.cast_time_ms = 2_000;
        spec.damage_kind = DamageKind::Healing;
        spec.stat_scaling_permille = 500;
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("renew", "Renew", CharacterClass::Cleric, 12);
        spec.cost = 10;
        spec.damage_kind = DamageKind::Healing;
        spec.stat_scaling_permille = 300;
        spec.periodic = Some(PeriodicSplit {
            power_percent: 100,
            duration_ticks: 3,
        });
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("clarity", "Clarity", CharacterClass::Cleric, 0);
        spec.cost = 5;
        spec.cooldown_ms = 45_000;
        spec.buff = Some(DebuffSpec {
            kind: EffectKind::ResourceFree,
            magnitude: 0,
            rounds: 2,
        });
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("meditation", "Meditation", CharacterClass::Cleric, 0);
        spec.cost = 0;
        spec.buff = Some(DebuffSpec {
            kind: EffectKind::Stance,
            magnitude: 0,
            rounds: 6,
        });
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("revive", "Revive", CharacterClass::Cleric, 0);
        spec.required_level = 6;
        spec.cost = 30;
        spec.cooldown_ms = 60_000;
        spec.special = Some(SpecialMechanic::Resurrect { restore_percent: 50 });
        self.add_ability(spec);

        // Ranger
        let mut spec = AbilitySpec::direct("piercing_shot", "Piercing Shot", CharacterClass::Ranger, 7);
        spec.resource = ResourceKind::Stamina;
        spec.cost = 6;
        spec.weapon_percent = 80;
        spec.stat_scaling_permille = 300;
        self.add_ability(spec);

        // Summoner
        let mut spec = AbilitySpec::direct("siphon_life", "Siphon Life", CharacterClass::Summoner, 10);
        spec.cost = 10;
        spec.damage_kind = DamageKind::Magic;
        spec.stat_scaling_permille = 300;
        spec.periodic = Some(PeriodicSplit {
            power_percent: 60,
            duration_ticks: 4,
        });
        spec.life_drain = true;
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("blood_pact", "Blood Pact", CharacterClass::Summoner, 0);
        spec.cost = 15;
        spec.cooldown_ms = 30_000;
        spec.buff = Some(DebuffSpec {
            kind: EffectKind::MaxHpBonus,
            magnitude: 25,
            rounds: 5,
        });
        self.add_ability(spec);

        let mut spec =
            AbilitySpec::direct("summon_guardian", "Summon Stone Guardian", CharacterClass::Summoner, 0);
        spec.required_level = 4;
        spec.cost = 25;
        spec.cooldown_ms = 30_000;
        spec.special = Some(SpecialMechanic::SummonPet(AbilityKey::new("stone_guardian")));
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("summon_imp", "Summon Fire Imp", CharacterClass::Summoner, 0);
        spec.cost = 20;
        spec.cooldown_ms = 30_000;
        spec.special = Some(SpecialMechanic::SummonPet(AbilityKey::new("fire_imp")));
        self.add_ability(spec);

        let mut spec = AbilitySpec::direct("reclaim", "Reclaim", CharacterClass::Summoner, 0);
        spec.cost = 5;
        spec.special = Some(SpecialMechanic::RedirectPetThreat);
        self.add_ability(spec);
    }

    fn install_creature_abilities(&mut self) {
        self.add_creature_ability(CreatureAbilitySpec {
            key: AbilityKey::new("rending_bite"),
            name: "Rending Bite".to_owned(),
            power: 6,
            damage_kind: DamageKind::Physical,
            effect: CreatureAbilityEffect::Dot { rounds: 3 },
            target_rule: TargetRule::Aggro,
            cast_time_ms: 0,
            cooldown_ms: 9_000,
            base_weight: 40,
            randomness: 10,
            base_chance_percent: 80,
        });

        self.add_creature_ability(CreatureAbilitySpec {
            key: AbilityKey::new("crushing_blow"),
            name: "Crushing Blow".to_owned(),
            power: 14,
            damage_kind: DamageKind::Physical,
            effect: CreatureAbilityEffect::Direct,
            target_rule: TargetRule::Aggro,
            cast_time_ms: 3_000,
            cooldown_ms: 12_000,
            base_weight: 35,
            randomness: 8,
            base_chance_percent: 70,
        });

        self.add_creature_ability(CreatureAbilitySpec {
            key: AbilityKey::new("terrifying_howl"),
            name: "Terrifying Howl".to_owned(),
            power: 0,
            damage_kind: DamageKind::Physical,
            effect: CreatureAbilityEffect::Stun { duration_ms: 4_000 },
            target_rule: TargetRule::Random,
            cast_time_ms: 2_000,
            cooldown_ms: 20_000,
            base_weight: 25,
            randomness: 6,
            base_chance_percent: 50,
        });

        self.add_creature_ability(CreatureAbilitySpec {
            key: AbilityKey::new("dark_mending"),
            name: "Dark Mending".to_owned(),
            power: 12,
            damage_kind: DamageKind::Healing,
            effect: CreatureAbilityEffect::Heal,
            target_rule: TargetRule::SelfCast,
            cast_time_ms: 2_000,
            cooldown_ms: 15_000,
            base_weight: 30,
            randomness: 5,
            base_chance_percent: 60,
        });

        self.add_creature_ability(CreatureAbilitySpec {
            key: AbilityKey::new("imp_spark"),
            name: "Spark".to_owned(),
            power: 5,
            damage_kind: DamageKind::Magic,
            effect: CreatureAbilityEffect::Direct,
            target_rule: TargetRule::Aggro,
            cast_time_ms: 0,
            cooldown_ms: 8_000,
            base_weight: 20,
            randomness: 4,
            base_chance_percent: 100,
        });
    }

    fn install_pets(&mut self) {
        self.pets.insert(
            "stone_guardian".to_owned(),
            PetTemplate {
                key: AbilityKey::new("stone_guardian"),
                name: "Stone Guardian".to_owned(),
                archetype: PetArchetype::Guardian,
                hp_base: 30,
                hp_per_level: 6,
                damage_base: 2,
                damage_per_level: 1,
                ability: None,
                ability_cooldown_ms: 0,
                duration_ms: None,
                taunt_threat: 50,
            },
        );

        self.pets.insert(
            "fire_imp".to_owned(),
            PetTemplate {
                key: AbilityKey::new("fire_imp"),
                name: "Fire Imp".to_owned(),
                archetype: PetArchetype::Striker,
                hp_base: 15,
                hp_per_level: 3,
                damage_base: 4,
                damage_per_level: 2,
                ability: Some(AbilityKey::new("imp_spark")),
                ability_cooldown_ms: 8_000,
                duration_ms: Some(120_000),
                taunt_threat: 0,
            },
        );
    }

    fn install_creatures(&mut self) {
        self.add_creature(CreatureTemplate {
            key: "gray_wolf".to_owned(),
            name: "Gray Wolf".to_owned(),
            level: 3,
            hp: 60,
            armor: 10,
            magic_resist: 0,
            role: CreatureRole::Damage,
            abilities: [AbilityKey::new("rending_bite")].into_iter().collect(),
            base_xp: 0,
        });

        self.add_creature(CreatureTemplate {
            key: "bandit_enforcer".to_owned(),
            name: "Bandit Enforcer".to_owned(),
            level: 5,
            hp: 90,
            armor: 25,
            magic_resist: 5,
            role: CreatureRole::Tank,
            abilities: [AbilityKey::new("crushing_blow")].into_iter().collect(),
            base_xp: 0,
        });

        self.add_creature(CreatureTemplate {
            key: "marsh_witch".to_owned(),
            name: "Marsh Witch".to_owned(),
            level: 6,
            hp: 70,
            armor: 5,
            magic_resist: 20,
            role: CreatureRole::Healer,
            abilities: [
                AbilityKey::new("dark_mending"),
                AbilityKey::new("terrifying_howl"),
            ]
            .into_iter()
            .collect(),
            base_xp: 0,
        });

        // Inert target for calibration and tests
        self.add_creature(CreatureTemplate {
            key: "training_dummy".to_owned(),
            name: "Training Dummy".to_owned(),
            level: 1,
            hp: 100,
            armor: 0,
            magic_resist: 0,
            role: CreatureRole::Support,
            abilities: ArrayVec::new(),
            base_xp: 5,
        });

        self.add_spawn(SpawnId(1), &["gray_wolf"]);
        self.add_spawn(SpawnId(2), &["gray_wolf", "gray_wolf"]);
        self.add_spawn(SpawnId(3), &["bandit_enforcer", "marsh_witch"]);
        self.add_spawn(SpawnId(9), &["training_dummy"]);
    }
}

impl AbilityOracle for StaticContent {
    fn ability(&self, key: &AbilityKey) -> Option<AbilitySpec> {
        self.abilities.get(key.as_str()).cloned()
    }

    fn creature_ability(&self, key: &AbilityKey) -> Option<CreatureAbilitySpec> {
        self.creature_abilities.get(key.as_str()).cloned()
    }

    fn pet_template(&self, key: &AbilityKey) -> Option<PetTemplate> {
        self.pets.get(key.as_str()).cloned()
    }
}

impl CreatureOracle for StaticContent {
    fn template(&self, key: &str) -> Option<CreatureTemplate> {
        self.creatures.get(key).cloned()
    }

    fn role_template(&self, role: CreatureRole) -> RoleTemplate {
        match role {
            CreatureRole::Damage => RoleTemplate {
                base_hp: 10,
                hp_per_level: 4,
                base_damage: 4,
                damage_per_level: 2,
                base_armor: 0,
                armor_per_level: 1,
            },
            CreatureRole::Tank => RoleTemplate {
                base_hp: 40,
                hp_per_level: 10,
                base_damage: 2,
                damage_per_level: 1,
                base_armor: 15,
                armor_per_level: 2,
            },
            CreatureRole::Healer => RoleTemplate {
                base_hp: 20,
                hp_per_level: 6,
                base_damage: 2,
                damage_per_level: 1,
                base_armor: 5,
                armor_per_level: 1,
            },
            CreatureRole::Support => RoleTemplate {
                base_hp: 15,
                hp_per_level: 5,
                base_damage: 1,
                damage_per_level: 1,
                base_armor: 0,
                armor_per_level: 0,
            },
        }
    }

    fn spawn_members(&self, spawn: SpawnId) -> Vec<String> {
        self.spawns.get(&spawn).cloned().unwrap_or_default()
    }

    fn release(&self, spawn: SpawnId, now: SimTime) {
        if let Ok(mut released) = self.released.lock() {
            released.push((spawn, now));
        }
        tracing::debug!(spawn = spawn.0, at = %now, "spawn released");
    }
}
