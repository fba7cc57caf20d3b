//! Ability damage/healing composition.
//!
//! Pure math turning an [`AbilitySpec`] plus a caster's profile into a
//! direct component and an optional periodic component. Mitigation and
//! variance are applied later, per target and per hit.

use super::spec::AbilitySpec;
use crate::config::EngineConfig;
use crate::effect::EffectKind;

/// Caster-side inputs to damage composition.
///
/// The runtime assembles this from the character row, gear bonuses, and
/// the persistent damage buffs/debuffs currently on the caster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CasterProfile {
    /// Value of the class's primary stat, gear included.
    pub primary_stat: i64,
    /// Equipped weapon base damage.
    pub weapon_damage: i64,
    /// Flat bonuses from gear and passives.
    pub flat_bonus: i64,
    /// Racial damage bonus.
    pub racial_bonus: i64,
    /// Net persistent damage modifier: `DamageUp` sum minus `DamageDown`
    /// sum on the caster.
    pub damage_buff: i64,
}

/// Periodic part of a composed ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicComponent {
    /// Magnitude of each cadence tick.
    pub per_tick: i64,
    pub ticks: u32,
    /// `Dot` for damage abilities, `Regen` for healing abilities.
    pub kind: EffectKind,
}

/// Result of composing one ability cast, before mitigation and variance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageBreakdown {
    pub direct: i64,
    pub periodic: Option<PeriodicComponent>,
}

/// Compose an ability's direct and periodic components.
///
/// # Formula
///
/// ```text
/// scaling     = primary_stat * stat_scaling_permille / 1000
/// direct_base = (power_kept + scaling) * time_multiplier_percent / 100
///   where power_kept = power minus the periodic power budget
///
/// budget      = power * periodic.power_percent / 100
///               * time_multiplier_percent / 100
/// per_tick    = (budget + scaling * periodic_scaling_percent / 100)
///               / duration_ticks              (min 1)
/// ```
///
/// Periodic stat scaling runs at a reduced rate
/// (`config.periodic_scaling_percent`) so split abilities cannot
/// double-dip on scaling. An attached debuff is paid for by shaving
/// `config.debuff_cost_percent` off the direct component. The weapon
/// component, flat bonuses, racial bonus, and persistent damage buffs are
/// then added to the direct part only.
pub fn compose_ability_damage(
    spec: &AbilitySpec,
    caster: &CasterProfile,
    config: &EngineConfig,
) -> DamageBreakdown {
    let scaling = caster.primary_stat.max(0) * spec.stat_scaling_permille / 1000;

    let (power_kept, periodic) = match spec.periodic {
        Some(split) if split.duration_ticks > 0 => {
            let diverted = spec.power * split.power_percent / 100;
            let budget = diverted * spec.time_multiplier_percent / 100;
            let periodic_scaling = scaling * config.periodic_scaling_percent / 100;
            let per_tick =
                ((budget + periodic_scaling) / i64::from(split.duration_ticks)).max(1);
            let kind = if spec.damage_kind.is_healing() {
                EffectKind::Regen
            } else {
                EffectKind::Dot
            };
            (
                spec.power - diverted,
                Some(PeriodicComponent {
                    per_tick,
                    ticks: split.duration_ticks,
                    kind,
                }),
            )
        }
        _ => (spec.power, None),
    };

    let mut direct = (power_kept + scaling) * spec.time_multiplier_percent / 100;

    if spec.debuff.is_some() {
        direct -= direct * config.debuff_cost_percent / 100;
    }

    let weapon_component = caster.weapon_damage * spec.weapon_percent / 100;

    direct += weapon_component + caster.flat_bonus + caster.racial_bonus + caster.damage_buff;

    DamageBreakdown {
        direct: direct.max(0),
        periodic,
    }
}

impl super::DamageKind {
    pub fn is_healing(self) -> bool {
        matches!(self, super::DamageKind::Healing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::spec::{DebuffSpec, PeriodicSplit};
    use crate::ability::DamageKind;
    use crate::stats::CharacterClass;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn plain_power_passes_straight_through() {
        let spec = AbilitySpec::direct("strike", "Strike", CharacterClass::Warrior, 10);
        let out = compose_ability_damage(&spec, &CasterProfile::default(), &config());
        assert_eq!(out.direct, 10);
        assert!(out.periodic.is_none());
    }

    #[test]
    fn stat_scaling_and_time_multiplier_apply() {
        let mut spec = AbilitySpec::direct("strike", "Strike", CharacterClass::Warrior, 10);
        spec.stat_scaling_permille = 500;
        spec.time_multiplier_percent = 200;
        let caster = CasterProfile {
            primary_stat: 20,
            ..CasterProfile::default()
        };
        // (10 + 20*0.5) * 2 = 40
        let out = compose_ability_damage(&spec, &caster, &config());
        assert_eq!(out.direct, 40);
    }

    #[test]
    fn periodic_split_moves_power_out_of_direct() {
        let mut spec = AbilitySpec::direct("rend", "Rend", CharacterClass::Warrior, 20);
        spec.periodic = Some(PeriodicSplit {
            power_percent: 50,
            duration_ticks: 5,
        });
        let out = compose_ability_damage(&spec, &CasterProfile::default(), &config());

        // Half the power stays direct, half becomes 5 ticks of 2
        assert_eq!(out.direct, 10);
        let periodic = out.periodic.unwrap();
        assert_eq!(periodic.per_tick, 2);
        assert_eq!(periodic.ticks, 5);
        assert_eq!(periodic.kind, EffectKind::Dot);
    }

    #[test]
    fn periodic_scaling_is_reduced_rate() {
        let mut spec = AbilitySpec::direct("rend", "Rend", CharacterClass::Warrior, 20);
        spec.stat_scaling_permille = 1000;
        spec.periodic = Some(PeriodicSplit {
            power_percent: 50,
            duration_ticks: 2,
        });
        let caster = CasterProfile {
            primary_stat: 10,
            ..CasterProfile::default()
        };
        let out = compose_ability_damage(&spec, &caster, &config());

        // Direct keeps full scaling: (10 + 10) = 20
        assert_eq!(out.direct, 20);
        // Periodic gets half-rate scaling: (10 + 5) / 2 = 7
        assert_eq!(out.periodic.unwrap().per_tick, 7);
    }

    #[test]
    fn healing_split_produces_regen() {
        let mut spec = AbilitySpec::direct("renew", "Renew", CharacterClass::Cleric, 12);
        spec.damage_kind = DamageKind::Healing;
        spec.periodic = Some(PeriodicSplit {
            power_percent: 100,
            duration_ticks: 3,
        });
        let out = compose_ability_damage(&spec, &CasterProfile::default(), &config());
        assert_eq!(out.direct, 0);
        assert_eq!(out.periodic.unwrap().kind, EffectKind::Regen);
    }

    #[test]
    fn debuff_taxes_direct_damage() {
        let mut spec = AbilitySpec::direct("sunder", "Sunder", CharacterClass::Warrior, 100);
        spec.debuff = Some(DebuffSpec {
            kind: EffectKind::AcBonus,
            magnitude: -10,
            rounds: 3,
        });
        let out = compose_ability_damage(&spec, &CasterProfile::default(), &config());
        // 20% tax from the default config
        assert_eq!(out.direct, 80);
    }

    #[test]
    fn weapon_and_flat_bonuses_add_to_direct_only() {
        let mut spec = AbilitySpec::direct("strike", "Strike", CharacterClass::Warrior, 10);
        spec.weapon_percent = 100;
        spec.periodic = Some(PeriodicSplit {
            power_percent: 50,
            duration_ticks: 5,
        });
        let caster = CasterProfile {
            weapon_damage: 8,
            flat_bonus: 2,
            racial_bonus: 1,
            damage_buff: 3,
            ..CasterProfile::default()
        };
        let out = compose_ability_damage(&spec, &caster, &config());
        assert_eq!(out.direct, 5 + 8 + 2 + 1 + 3);
        // Periodic part unaffected by weapon/flat bonuses
        assert_eq!(out.periodic.unwrap().per_tick, 1);
    }
}
