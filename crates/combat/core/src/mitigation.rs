//! Mitigation and variance math.
//!
//! Pure functions converting raw damage/healing plus armor/resist values
//! into final amounts. No state, no clock: callers supply seeds.
//!
//! Tuning anchor for the armor curve: 50 armor ≈ 33% reduction,
//! 100 armor ≈ 50% reduction.

use crate::config::EngineConfig;

// ============================================================================
// Mitigation
// ============================================================================

/// Mitigate physical damage through armor.
///
/// # Formula
///
/// ```text
/// mitigated = damage * 100 / (100 + armor) * global_damage_percent / 100
/// ```
///
/// Result is floored at 1 when the input was positive; non-positive input
/// passes through as 0.
pub fn mitigate_physical(damage: i64, armor: i64, config: &EngineConfig) -> i64 {
    mitigate(damage, armor, config)
}

/// Mitigate magic damage through magic resistance.
///
/// Magic uses the same diminishing-returns curve against resistance and
/// bypasses physical armor entirely.
pub fn mitigate_magic(damage: i64, magic_resist: i64, config: &EngineConfig) -> i64 {
    mitigate(damage, magic_resist, config)
}

fn mitigate(damage: i64, defense: i64, config: &EngineConfig) -> i64 {
    if damage <= 0 {
        return 0;
    }
    let defense = defense.max(0);
    let reduced = damage * 100 / (100 + defense) * config.global_damage_percent / 100;
    reduced.max(1)
}

// ============================================================================
// Variance
// ============================================================================

/// Apply the deterministic ±15% variance band to a damage/heal amount.
///
/// # Formula
///
/// ```text
/// varied = value * (85 + seed % 31) / 100
/// ```
///
/// Returns at least 1 for positive inputs; non-positive inputs pass
/// through as 0. The seed is derived from simulation time plus actor
/// identity so the result is reproducible.
pub fn apply_variance(value: i64, seed: u64) -> i64 {
    if value <= 0 {
        return 0;
    }
    let percent = EngineConfig::VARIANCE_FLOOR_PERCENT + (seed % EngineConfig::VARIANCE_SPAN) as i64;
    let varied = value * percent / 100;
    // The band is closed on both edges under integer math: the low edge
    // rounds up, the high edge rounds down.
    let band_floor = ((value * EngineConfig::VARIANCE_FLOOR_PERCENT) as u64).div_ceil(100) as i64;
    varied.max(band_floor).max(1)
}

/// Crit chance in per-mille, proportional to dexterity and capped.
pub fn crit_chance_permille(dexterity: i64, config: &EngineConfig) -> u32 {
    let chance = dexterity.max(0) as u32 * config.crit_per_dex_permille;
    chance.min(config.crit_cap_permille)
}

// ============================================================================
// Attack Outcome
// ============================================================================

/// Outcome of one attack-outcome roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackOutcome {
    Dodge,
    Parry,
    Block,
    Critical,
    Hit,
}

impl AttackOutcome {
    /// True when the swing connected (critically or not).
    pub fn landed(self) -> bool {
        matches!(self, AttackOutcome::Critical | AttackOutcome::Hit)
    }
}

/// Defensive avoidance chances of the target, in per-mille.
///
/// `can_parry`/`can_block` come from the class-capability table; creatures
/// set them from their template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefenseProfile {
    pub dodge_permille: u32,
    pub parry_permille: u32,
    pub block_permille: u32,
    pub can_parry: bool,
    pub can_block: bool,
}

/// Resolve an attack-outcome roll.
///
/// A single `roll ∈ [0, 1000)` is consumed against a cursor that
/// accumulates dodge, then parry, then block chance (dodge and parry each
/// net of the attacker's hit bonus, floored at 0), followed by the crit
/// check. The ordering, dodge before parry before block before crit,
/// is a contract of the combat rules.
pub fn roll_attack_outcome(
    roll: u32,
    attacker_hit_bonus_permille: u32,
    defense: &DefenseProfile,
    crit_permille: u32,
) -> AttackOutcome {
    let mut cursor = defense
        .dodge_permille
        .saturating_sub(attacker_hit_bonus_permille);
    if roll < cursor {
        return AttackOutcome::Dodge;
    }

    if defense.can_parry {
        cursor += defense
            .parry_permille
            .saturating_sub(attacker_hit_bonus_permille);
        if roll < cursor {
            return AttackOutcome::Parry;
        }
    }

    if defense.can_block {
        cursor += defense.block_permille;
        if roll < cursor {
            return AttackOutcome::Block;
        }
    }

    cursor += crit_permille;
    if roll < cursor {
        return AttackOutcome::Critical;
    }

    AttackOutcome::Hit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn armor_curve_anchor_points() {
        let cfg = config();
        // 50 armor ≈ 33% reduction, 100 armor ≈ 50% reduction
        assert_eq!(mitigate_physical(300, 50, &cfg), 200);
        assert_eq!(mitigate_physical(300, 100, &cfg), 150);
    }

    #[test]
    fn mitigation_monotonically_non_increasing_in_armor() {
        let cfg = config();
        let mut previous = i64::MAX;
        for armor in 0..200 {
            let mitigated = mitigate_physical(250, armor, &cfg);
            assert!(mitigated <= previous);
            assert!(mitigated >= 1);
            previous = mitigated;
        }
    }

    #[test]
    fn positive_damage_never_mitigates_below_one() {
        let cfg = config();
        assert_eq!(mitigate_physical(1, 10_000, &cfg), 1);
        assert_eq!(mitigate_magic(1, 10_000, &cfg), 1);
    }

    #[test]
    fn non_positive_damage_passes_through_as_zero() {
        let cfg = config();
        assert_eq!(mitigate_physical(0, 50, &cfg), 0);
        assert_eq!(mitigate_physical(-7, 50, &cfg), 0);
        assert_eq!(apply_variance(0, 17), 0);
        assert_eq!(apply_variance(-3, 17), 0);
    }

    #[test]
    fn variance_stays_in_band() {
        for value in [1i64, 10, 37, 500, 12_345] {
            for seed in 0..200u64 {
                let varied = apply_variance(value, seed);
                assert!(varied >= ((value * 85) as u64).div_ceil(100).max(1) as i64, "low for {value}/{seed}");
                assert!(varied <= value * 115 / 100, "high for {value}/{seed}");
                assert!(varied >= 1);
            }
        }
    }

    #[test]
    fn crit_chance_scales_with_dex_and_caps() {
        let cfg = config();
        assert_eq!(crit_chance_permille(0, &cfg), 0);
        assert_eq!(crit_chance_permille(50, &cfg), 100);
        assert_eq!(crit_chance_permille(1_000_000, &cfg), cfg.crit_cap_permille);
    }

    #[test]
    fn outcome_order_is_dodge_parry_block_crit() {
        let defense = DefenseProfile {
            dodge_permille: 100,
            parry_permille: 100,
            block_permille: 100,
            can_parry: true,
            can_block: true,
        };
        assert_eq!(roll_attack_outcome(50, 0, &defense, 100), AttackOutcome::Dodge);
        assert_eq!(roll_attack_outcome(150, 0, &defense, 100), AttackOutcome::Parry);
        assert_eq!(roll_attack_outcome(250, 0, &defense, 100), AttackOutcome::Block);
        assert_eq!(roll_attack_outcome(350, 0, &defense, 100), AttackOutcome::Critical);
        assert_eq!(roll_attack_outcome(450, 0, &defense, 100), AttackOutcome::Hit);
    }

    #[test]
    fn hit_bonus_floors_avoidance_at_zero() {
        let defense = DefenseProfile {
            dodge_permille: 50,
            parry_permille: 50,
            block_permille: 0,
            can_parry: true,
            can_block: false,
        };
        // Bonus larger than both chances: only crit/hit remain possible.
        assert_eq!(roll_attack_outcome(0, 200, &defense, 0), AttackOutcome::Hit);
    }

    #[test]
    fn incapable_classes_never_parry_or_block() {
        let defense = DefenseProfile {
            dodge_permille: 0,
            parry_permille: 500,
            block_permille: 500,
            can_parry: false,
            can_block: false,
        };
        assert_eq!(roll_attack_outcome(10, 0, &defense, 0), AttackOutcome::Hit);
    }
}
