/// Engine configuration constants and tunable parameters.
///
/// Every formula in the engine reads its knobs from here rather than from
/// scattered literals, so one config instance fully determines the numeric
/// behavior of a simulation run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    // ===== cadences =====
    /// Interval between two scheduled ticks of one encounter.
    pub encounter_tick_ms: u64,
    /// Flat auto-attack interval for participants and pets
    /// (weapon-speed-independent).
    pub auto_attack_interval_ms: u64,
    /// Fast cadence: one tick of every regen/DoT effect.
    pub fast_effect_tick_ms: u64,
    /// Slow cadence: buff/debuff decay, plus the encounter watchdog pass.
    pub slow_effect_tick_ms: u64,

    // ===== damage & healing =====
    /// Global damage multiplier in percent applied inside mitigation.
    pub global_damage_percent: i64,
    /// Flat damage-multiplier penalty applied per target by AoE abilities.
    pub aoe_damage_percent: i64,
    /// Fraction of direct stat scaling that periodic components keep.
    pub periodic_scaling_percent: i64,
    /// Direct-damage cost of carrying an attached debuff.
    pub debuff_cost_percent: i64,
    /// Crit chance gained per point of dexterity, in per-mille.
    pub crit_per_dex_permille: u32,
    /// Upper bound on crit chance, in per-mille.
    pub crit_cap_permille: u32,

    // ===== threat =====
    /// Threat factor for damage-dealing classes, in percent of damage dealt.
    pub damage_threat_percent: i64,
    /// Threat factor for tank-role classes.
    pub tank_threat_percent: i64,
    /// Healing threat, as a percent of healing done, split evenly across
    /// all living creatures in the encounter.
    pub heal_threat_percent: i64,
    /// Threat factor for pet-summoning classes.
    pub pet_class_threat_percent: i64,

    // ===== rewards =====
    /// Base experience granted per creature level when the template does
    /// not override it.
    pub base_xp_per_level: u64,
    /// Experience bonus in percent per living party member beyond the first.
    pub party_xp_bonus_percent: u64,
    /// Experience share, in percent, for participants who died.
    pub dead_xp_percent: u64,
    /// Characters below this level never pay a death penalty.
    pub death_penalty_min_level: u32,
    /// Fraction of progress past the current level floor lost on death.
    pub death_penalty_percent: u64,
    /// On defeat, surviving pools are floored at this fraction of max.
    pub defeat_restore_percent: i64,
    /// Out-of-combat HP/resource regeneration per slow cadence, in
    /// percent of max.
    pub out_of_combat_regen_percent: i64,
    /// Delay before an exhausted spawn group is repopulated.
    pub respawn_delay_ms: u64,
}

impl EngineConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum simultaneous effects tracked per owner.
    pub const MAX_EFFECTS_PER_OWNER: usize = 16;
    /// Maximum special abilities one creature template can carry.
    pub const MAX_CREATURE_ABILITIES: usize = 8;

    // ===== variance band (fixed contract, not tunable) =====
    /// Lower edge of the variance band, in percent.
    pub const VARIANCE_FLOOR_PERCENT: i64 = 85;
    /// Width of the variance band: `seed % SPAN` percent above the floor.
    pub const VARIANCE_SPAN: u64 = 31;

    pub fn new() -> Self {
        Self {
            encounter_tick_ms: 3_000,
            auto_attack_interval_ms: 6_000,
            fast_effect_tick_ms: 3_000,
            slow_effect_tick_ms: 10_000,
            global_damage_percent: 100,
            aoe_damage_percent: 65,
            periodic_scaling_percent: 50,
            debuff_cost_percent: 20,
            crit_per_dex_permille: 2,
            crit_cap_permille: 300,
            damage_threat_percent: 100,
            tank_threat_percent: 150,
            heal_threat_percent: 50,
            pet_class_threat_percent: 90,
            base_xp_per_level: 15,
            party_xp_bonus_percent: 10,
            dead_xp_percent: 50,
            death_penalty_min_level: 5,
            death_penalty_percent: 10,
            defeat_restore_percent: 50,
            out_of_combat_regen_percent: 5,
            respawn_delay_ms: 120_000,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
