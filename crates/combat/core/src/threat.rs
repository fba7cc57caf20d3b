//! Per-encounter threat ledger.
//!
//! One [`AggroEntry`] per (creature, threat-source) pair, created lazily,
//! updated additively, never negative. The only threat-decreasing
//! mutation is [`ThreatTable::redirect_to_owner`].

use crate::types::{CharacterId, CreatureId, PetId, ThreatSource, ThreatTarget};

/// Accumulated threat of one source against one creature.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggroEntry {
    pub creature: CreatureId,
    pub character: CharacterId,
    /// Set when the threat was generated by a pet rather than the
    /// character directly.
    pub pet: Option<PetId>,
    pub value: i64,
}

/// Threat table for a single encounter.
///
/// Insertion order is preserved; top-threat ties resolve to the
/// first-seen entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatTable {
    entries: Vec<AggroEntry>,
}

impl ThreatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one aggro entry, adding `amount`.
    ///
    /// Values saturate at zero: no entry ever goes negative, regardless
    /// of the sign of `amount`.
    pub fn add(&mut self, creature: CreatureId, source: ThreatSource, amount: i64) {
        let character = source.owner();
        let pet = source.pet();

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.creature == creature && e.character == character && e.pet == pet)
        {
            entry.value = (entry.value + amount).max(0);
            return;
        }

        self.entries.push(AggroEntry {
            creature,
            character,
            pet,
            value: amount.max(0),
        });
    }

    /// Highest-threat target for a creature.
    ///
    /// Pet rows are skipped when a plain character row for the same owner
    /// exists (the character equivalent takes precedence); ties resolve
    /// by first insertion.
    pub fn top(&self, creature: CreatureId) -> Option<ThreatTarget> {
        let mut best: Option<&AggroEntry> = None;

        for entry in self.entries.iter().filter(|e| e.creature == creature) {
            if entry.pet.is_some()
                && self
                    .entries
                    .iter()
                    .any(|e| e.creature == creature && e.character == entry.character && e.pet.is_none())
            {
                continue;
            }
            match best {
                Some(current) if current.value >= entry.value => {}
                _ => best = Some(entry),
            }
        }

        best.map(|entry| match entry.pet {
            Some(pet) => ThreatTarget::Pet(pet),
            None => ThreatTarget::Character(entry.character),
        })
    }

    /// Current threat value of one source against one creature.
    pub fn value(&self, creature: CreatureId, source: ThreatSource) -> i64 {
        let character = source.owner();
        let pet = source.pet();
        self.entries
            .iter()
            .find(|e| e.creature == creature && e.character == character && e.pet == pet)
            .map(|e| e.value)
            .unwrap_or(0)
    }

    /// Transfer a pet's accumulated threat onto its owner, per creature.
    ///
    /// This is the only operation that lowers an entry: each pet row is
    /// zeroed into a matching character row. Returns the creatures whose
    /// pet rows were folded, so the caller can repoint their targets.
    pub fn redirect_to_owner(&mut self, pet: PetId) -> Vec<CreatureId> {
        let mut affected = Vec::new();

        let folded: Vec<(CreatureId, CharacterId, i64)> = self
            .entries
            .iter()
            .filter(|e| e.pet == Some(pet) && e.value > 0)
            .map(|e| (e.creature, e.character, e.value))
            .collect();

        self.entries.retain(|e| e.pet != Some(pet));

        for (creature, character, value) in folded {
            self.add(creature, ThreatSource::Character(character), value);
            affected.push(creature);
        }

        affected
    }

    /// Drop all entries belonging to a creature (it died or despawned).
    pub fn remove_creature(&mut self, creature: CreatureId) {
        self.entries.retain(|e| e.creature != creature);
    }

    /// Drop all entries generated by a pet (it died; nothing to inherit).
    pub fn remove_pet(&mut self, pet: PetId) {
        self.entries.retain(|e| e.pet != Some(pet));
    }

    pub fn entries(&self) -> &[AggroEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-creature share of diffuse healing threat.
///
/// Healing threat is a fixed percentage of healing done, split evenly
/// across all living creatures in the encounter. The asymmetry with
/// per-target damage threat is intentional.
pub fn diffuse_heal_threat(healed: i64, heal_threat_percent: i64, living_creatures: usize) -> i64 {
    if healed <= 0 || living_creatures == 0 {
        return 0;
    }
    (healed * heal_threat_percent / 100 / living_creatures as i64).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WOLF: CreatureId = CreatureId(1);
    const BEAR: CreatureId = CreatureId(2);
    const ANA: CharacterId = CharacterId(10);
    const BORIS: CharacterId = CharacterId(11);

    #[test]
    fn add_is_order_independent() {
        let mut forward = ThreatTable::new();
        forward.add(WOLF, ThreatSource::Character(ANA), 5);
        forward.add(WOLF, ThreatSource::Character(ANA), 12);
        forward.add(WOLF, ThreatSource::Character(ANA), 3);

        let mut reverse = ThreatTable::new();
        reverse.add(WOLF, ThreatSource::Character(ANA), 3);
        reverse.add(WOLF, ThreatSource::Character(ANA), 12);
        reverse.add(WOLF, ThreatSource::Character(ANA), 5);

        assert_eq!(forward.value(WOLF, ThreatSource::Character(ANA)), 20);
        assert_eq!(
            forward.value(WOLF, ThreatSource::Character(ANA)),
            reverse.value(WOLF, ThreatSource::Character(ANA))
        );
    }

    #[test]
    fn values_never_go_negative() {
        let mut table = ThreatTable::new();
        table.add(WOLF, ThreatSource::Character(ANA), 10);
        table.add(WOLF, ThreatSource::Character(ANA), -50);
        assert_eq!(table.value(WOLF, ThreatSource::Character(ANA)), 0);
    }

    #[test]
    fn top_picks_highest_and_breaks_ties_first_seen() {
        let mut table = ThreatTable::new();
        table.add(WOLF, ThreatSource::Character(ANA), 10);
        table.add(WOLF, ThreatSource::Character(BORIS), 25);
        assert_eq!(table.top(WOLF), Some(ThreatTarget::Character(BORIS)));

        table.add(WOLF, ThreatSource::Character(ANA), 15);
        // Tie at 25: Ana was seen first
        assert_eq!(table.top(WOLF), Some(ThreatTarget::Character(ANA)));
    }

    #[test]
    fn pet_row_skipped_when_character_row_exists() {
        let pet = PetId(99);
        let mut table = ThreatTable::new();
        table.add(WOLF, ThreatSource::Pet { pet, owner: ANA }, 100);
        table.add(WOLF, ThreatSource::Character(ANA), 1);
        assert_eq!(table.top(WOLF), Some(ThreatTarget::Character(ANA)));
    }

    #[test]
    fn lone_pet_row_is_a_valid_target() {
        let pet = PetId(99);
        let mut table = ThreatTable::new();
        table.add(WOLF, ThreatSource::Pet { pet, owner: ANA }, 40);
        assert_eq!(table.top(WOLF), Some(ThreatTarget::Pet(pet)));
    }

    #[test]
    fn redirect_folds_pet_threat_into_owner() {
        let pet = PetId(99);
        let mut table = ThreatTable::new();
        table.add(WOLF, ThreatSource::Pet { pet, owner: ANA }, 40);
        table.add(BEAR, ThreatSource::Pet { pet, owner: ANA }, 7);
        table.add(WOLF, ThreatSource::Character(ANA), 5);

        let affected = table.redirect_to_owner(pet);
        assert_eq!(affected.len(), 2);
        assert_eq!(table.value(WOLF, ThreatSource::Character(ANA)), 45);
        assert_eq!(table.value(BEAR, ThreatSource::Character(ANA)), 7);
        assert_eq!(table.value(WOLF, ThreatSource::Pet { pet, owner: ANA }), 0);
    }

    #[test]
    fn heal_threat_splits_across_living_creatures() {
        assert_eq!(diffuse_heal_threat(120, 50, 3), 20);
        assert_eq!(diffuse_heal_threat(120, 50, 0), 0);
        assert_eq!(diffuse_heal_threat(0, 50, 3), 0);
    }
}
