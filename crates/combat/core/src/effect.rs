//! Status effect ledger.
//!
//! Typed, time-bounded magnitude entries keyed by
//! `(owner, kind, source ability)`. Re-triggering the same ability's
//! effect on the same owner refreshes the existing row instead of
//! stacking a duplicate.
//!
//! # Duration model
//!
//! Most effects carry a `rounds_remaining` counter decremented by the
//! cadence drivers. Stuns are the exception: they are time-windowed with
//! an absolute expiry, and re-application extends the window to
//! `max(existing, new)` rather than stacking.

use crate::ability::AbilityKey;
use crate::config::EngineConfig;
use crate::types::{CharacterId, SimTime};

// ============================================================================
// Effect Kinds
// ============================================================================

/// Types of status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    /// HP recovery over time (heal-over-time).
    Regen,
    /// Damage over time.
    Dot,
    /// Armor class bonus (negative magnitude = sunder debuff).
    AcBonus,
    /// Flat damage added to every outgoing ability/attack.
    DamageUp,
    /// Flat damage removed from every outgoing attack.
    DamageDown,
    /// Temporary max-HP grant, reverted when the effect expires.
    MaxHpBonus,
    /// Next cast costs no resource.
    ResourceFree,
    /// Cannot act. Time-windowed, not round-counted.
    Stun,
    /// Ability-specific stance marker; magnitude meaning is per ability.
    Stance,
}

impl EffectKind {
    /// Effects ticked by the fast cadence.
    pub fn is_periodic(self) -> bool {
        matches!(self, EffectKind::Regen | EffectKind::Dot)
    }
}

/// How long an effect lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectDuration {
    /// Decremented by the owning cadence; removed at zero.
    Rounds(u32),
    /// Absolute expiry, checked against the current tick time.
    Until(SimTime),
}

/// One status effect row.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRecord<O> {
    pub owner: O,
    pub kind: EffectKind,
    /// Per-tick amount for periodic effects, flat bonus otherwise.
    pub magnitude: i64,
    pub duration: EffectDuration,
    /// Ability that created the row; part of the identity key.
    pub source: AbilityKey,
    /// Life-drain attribution: the character healed by each DoT tick.
    pub attributed_to: Option<CharacterId>,
}

/// One matured tick of a periodic effect.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicTick<O> {
    pub owner: O,
    pub kind: EffectKind,
    pub amount: i64,
    pub source: AbilityKey,
    pub attributed_to: Option<CharacterId>,
    /// True when this was the effect's final tick and the row was removed.
    pub expired: bool,
}

// ============================================================================
// Effect Ledger
// ============================================================================

/// Status effect store for one side of the fight.
///
/// The engine keeps two parallel ledgers: one with [`CharacterId`] owners
/// and one with creature owners.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectLedger<O> {
    effects: Vec<EffectRecord<O>>,
}

impl<O> Default for EffectLedger<O> {
    fn default() -> Self {
        Self {
            effects: Vec::new(),
        }
    }
}

impl<O: Copy + Eq> EffectLedger<O> {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Upsert an effect row.
    ///
    /// Identity is `(owner, kind, source)`. Stuns extend the stored window
    /// to `max(existing, new)`; everything else refreshes magnitude and
    /// duration in place.
    pub fn apply(&mut self, record: EffectRecord<O>) {
        if let Some(existing) = self.effects.iter_mut().find(|e| {
            e.owner == record.owner && e.kind == record.kind && e.source == record.source
        }) {
            if record.kind == EffectKind::Stun {
                if let (EffectDuration::Until(old), EffectDuration::Until(new)) =
                    (existing.duration, record.duration)
                {
                    existing.duration = EffectDuration::Until(old.max(new));
                    return;
                }
            }
            existing.magnitude = record.magnitude;
            existing.duration = record.duration;
            existing.attributed_to = record.attributed_to;
            return;
        }

        // New rows past the per-owner cap are dropped, matching the
        // bounded-store behavior of the rest of the engine.
        let owned = self
            .effects
            .iter()
            .filter(|e| e.owner == record.owner)
            .count();
        if owned < EngineConfig::MAX_EFFECTS_PER_OWNER {
            self.effects.push(record);
        }
    }

    /// True while any stun window on `owner` is still open.
    pub fn is_stunned(&self, owner: O, now: SimTime) -> bool {
        self.effects.iter().any(|e| {
            e.owner == owner
                && e.kind == EffectKind::Stun
                && matches!(e.duration, EffectDuration::Until(expiry) if now < expiry)
        })
    }

    /// True if the owner has any effect of this kind.
    pub fn has(&self, owner: O, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.owner == owner && e.kind == kind)
    }

    /// True if this exact `(owner, kind, source)` row exists.
    pub fn has_from(&self, owner: O, kind: EffectKind, source: &AbilityKey) -> bool {
        self.effects
            .iter()
            .any(|e| e.owner == owner && e.kind == kind && e.source == *source)
    }

    /// Sum of magnitudes of all rows of `kind` on `owner`.
    pub fn magnitude_sum(&self, owner: O, kind: EffectKind) -> i64 {
        self.effects
            .iter()
            .filter(|e| e.owner == owner && e.kind == kind)
            .map(|e| e.magnitude)
            .sum()
    }

    /// Remove one exact row.
    pub fn remove(&mut self, owner: O, kind: EffectKind, source: &AbilityKey) {
        self.effects
            .retain(|e| !(e.owner == owner && e.kind == kind && e.source == *source));
    }

    /// Remove and return every row of `kind` on `owner`.
    ///
    /// Callers use the returned records to revert reversible grants
    /// (e.g. temporary max HP) before discarding them.
    pub fn remove_kind(&mut self, owner: O, kind: EffectKind) -> Vec<EffectRecord<O>> {
        let (removed, kept) = self
            .effects
            .drain(..)
            .partition(|e| e.owner == owner && e.kind == kind);
        self.effects = kept;
        removed
    }

    /// Remove and return every row on `owner`.
    pub fn clear_owner(&mut self, owner: O) -> Vec<EffectRecord<O>> {
        let (removed, kept) = self.effects.drain(..).partition(|e| e.owner == owner);
        self.effects = kept;
        removed
    }

    /// Fast cadence: emit one tick of every periodic effect, then
    /// decrement. Rows reaching zero rounds are removed and marked
    /// `expired` in the output.
    pub fn tick_periodic(&mut self) -> Vec<PeriodicTick<O>> {
        let mut ticks = Vec::new();

        for effect in &mut self.effects {
            if !effect.kind.is_periodic() {
                continue;
            }
            if let EffectDuration::Rounds(rounds) = effect.duration {
                let remaining = rounds.saturating_sub(1);
                effect.duration = EffectDuration::Rounds(remaining);
                ticks.push(PeriodicTick {
                    owner: effect.owner,
                    kind: effect.kind,
                    amount: effect.magnitude,
                    source: effect.source.clone(),
                    attributed_to: effect.attributed_to,
                    expired: remaining == 0,
                });
            }
        }

        self.effects.retain(|e| {
            !(e.kind.is_periodic() && matches!(e.duration, EffectDuration::Rounds(0)))
        });

        ticks
    }

    /// Slow cadence: decrement non-periodic round counters and drop
    /// expired stun windows. Returns the removed rows.
    pub fn decay_round(&mut self, now: SimTime) -> Vec<EffectRecord<O>> {
        let mut removed = Vec::new();

        for effect in &mut self.effects {
            if effect.kind.is_periodic() {
                continue;
            }
            if let EffectDuration::Rounds(rounds) = effect.duration {
                effect.duration = EffectDuration::Rounds(rounds.saturating_sub(1));
            }
        }

        self.effects.retain(|e| {
            if e.kind.is_periodic() {
                return true;
            }
            let expired = match e.duration {
                EffectDuration::Rounds(0) => true,
                EffectDuration::Rounds(_) => false,
                EffectDuration::Until(expiry) => now >= expiry,
            };
            if expired {
                removed.push(e.clone());
            }
            !expired
        });

        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectRecord<O>> {
        self.effects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CharacterId;

    const ANA: CharacterId = CharacterId(1);
    const BORIS: CharacterId = CharacterId(2);

    fn dot(owner: CharacterId, source: &str, magnitude: i64, rounds: u32) -> EffectRecord<CharacterId> {
        EffectRecord {
            owner,
            kind: EffectKind::Dot,
            magnitude,
            duration: EffectDuration::Rounds(rounds),
            source: AbilityKey::new(source),
            attributed_to: None,
        }
    }

    #[test]
    fn reapplying_refreshes_instead_of_stacking() {
        let mut ledger = EffectLedger::new();
        ledger.apply(dot(ANA, "rend", 5, 3));
        ledger.apply(dot(ANA, "rend", 9, 4));

        assert_eq!(ledger.iter().count(), 1);
        assert_eq!(ledger.magnitude_sum(ANA, EffectKind::Dot), 9);
    }

    #[test]
    fn different_sources_coexist() {
        let mut ledger = EffectLedger::new();
        ledger.apply(dot(ANA, "rend", 5, 3));
        ledger.apply(dot(ANA, "ignite", 4, 2));
        assert_eq!(ledger.iter().count(), 2);
    }

    #[test]
    fn stun_windows_extend_to_max_not_sum() {
        let mut ledger = EffectLedger::new();
        let stun = |expiry: u64| EffectRecord {
            owner: ANA,
            kind: EffectKind::Stun,
            magnitude: 0,
            duration: EffectDuration::Until(SimTime::from_secs(expiry)),
            source: AbilityKey::new("skull_crack"),
            attributed_to: None,
        };
        ledger.apply(stun(4));
        ledger.apply(stun(2));

        assert!(ledger.is_stunned(ANA, SimTime::from_secs(3)));
        assert!(!ledger.is_stunned(ANA, SimTime::from_secs(4)));
    }

    #[test]
    fn periodic_ticks_count_matches_duration() {
        let mut ledger = EffectLedger::new();
        ledger.apply(dot(ANA, "rend", 6, 3));

        let first = ledger.tick_periodic();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].amount, 6);
        assert!(!first[0].expired);

        let second = ledger.tick_periodic();
        assert!(!second[0].expired);

        let third = ledger.tick_periodic();
        assert!(third[0].expired);
        assert!(ledger.is_empty());

        // No further damage after the row is deleted
        assert!(ledger.tick_periodic().is_empty());
    }

    #[test]
    fn decay_ignores_periodic_rows() {
        let mut ledger = EffectLedger::new();
        ledger.apply(dot(ANA, "rend", 6, 2));
        ledger.apply(EffectRecord {
            owner: ANA,
            kind: EffectKind::DamageUp,
            magnitude: 3,
            duration: EffectDuration::Rounds(1),
            source: AbilityKey::new("war_cry"),
            attributed_to: None,
        });

        let removed = ledger.decay_round(SimTime::ZERO);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].kind, EffectKind::DamageUp);
        assert!(ledger.has(ANA, EffectKind::Dot));
    }

    #[test]
    fn remove_kind_returns_rows_for_reversion() {
        let mut ledger = EffectLedger::new();
        ledger.apply(EffectRecord {
            owner: BORIS,
            kind: EffectKind::MaxHpBonus,
            magnitude: 25,
            duration: EffectDuration::Rounds(5),
            source: AbilityKey::new("blood_pact"),
            attributed_to: None,
        });

        let removed = ledger.remove_kind(BORIS, EffectKind::MaxHpBonus);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].magnitude, 25);
        assert!(ledger.is_empty());
    }
}
