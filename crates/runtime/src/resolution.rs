//! Resolution and reward dispatch.
//!
//! The encounter state machine reports outcomes here; this boundary owns
//! experience math, death penalties, and the pass-throughs to the
//! loot/faction/corpse collaborators. It knows nothing about loot tables
//! or item templates.

use std::sync::Arc;

use combat_core::config::EngineConfig;
use combat_core::env::RewardSink;
use combat_core::types::CharacterId;

use crate::store::CharacterRow;

/// Outcome of one experience award.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XpAward {
    pub gained: u64,
    pub leveled_up: bool,
}

/// Reward boundary consumed by the encounter state machine.
pub trait RewardDispatcher: Send + Sync {
    /// Grant experience for a defeated creature, scaled by level
    /// difference. Recomputes stats/pools on level-up.
    fn award_experience(
        &self,
        character: &mut CharacterRow,
        creature_level: u32,
        base_xp: u64,
    ) -> XpAward;

    /// Deduct the death experience penalty. Returns the amount lost.
    fn apply_death_penalty(&self, character: &mut CharacterRow) -> u64;

    /// Create a corpse for a character that died in combat.
    fn create_corpse(&self, character: CharacterId);

    /// Pass-through loot roll for a defeated creature.
    fn roll_loot(&self, character: CharacterId, creature_key: &str);

    /// Pass-through faction adjustment for a creature kill.
    fn adjust_faction(&self, character: CharacterId, creature_key: &str);
}

/// Experience required to reach a level (triangular curve).
///
/// Level 1 starts at 0; each step costs 100 more than the one before.
pub fn xp_to_reach(level: u32) -> u64 {
    let level = u64::from(level);
    level.saturating_sub(1) * level * 50
}

/// Standard reward dispatcher used by the runtime.
pub struct StandardRewardDispatcher {
    sink: Arc<dyn RewardSink>,
    config: EngineConfig,
}

impl StandardRewardDispatcher {
    pub fn new(sink: Arc<dyn RewardSink>, config: EngineConfig) -> Self {
        Self { sink, config }
    }

    /// Level-difference experience multiplier in percent.
    ///
    /// Gray kills (far below the character) bottom out at 25%, red kills
    /// cap at 150%.
    fn level_scale_percent(character_level: u32, creature_level: u32) -> u64 {
        let diff = i64::from(creature_level) - i64::from(character_level);
        (100 + diff * 10).clamp(25, 150) as u64
    }
}

impl RewardDispatcher for StandardRewardDispatcher {
    fn award_experience(
        &self,
        character: &mut CharacterRow,
        creature_level: u32,
        base_xp: u64,
    ) -> XpAward {
        let scale = Self::level_scale_percent(character.level, creature_level);
        let gained = base_xp * scale / 100;
        character.xp += gained;

        let mut leveled_up = false;
        while character.xp >= xp_to_reach(character.level + 1) {
            character.level += 1;
            leveled_up = true;
        }
        if leveled_up {
            // Level-up refills the pools after the recompute.
            character.recompute_pools();
            character.hp = character.max_hp;
            character.mana = character.max_mana;
            character.stamina = character.max_stamina;
            tracing::info!(character = %character.id, level = character.level, "level up");
        }

        XpAward { gained, leveled_up }
    }

    fn apply_death_penalty(&self, character: &mut CharacterRow) -> u64 {
        if character.level < self.config.death_penalty_min_level {
            return 0;
        }
        // Proportional to progress past the current level floor; a death
        // can never de-level.
        let floor = xp_to_reach(character.level);
        let progress = character.xp.saturating_sub(floor);
        let lost = progress * self.config.death_penalty_percent / 100;
        character.xp -= lost;
        lost
    }

    fn create_corpse(&self, character: CharacterId) {
        self.sink.create_corpse(character);
    }

    fn roll_loot(&self, character: CharacterId, creature_key: &str) {
        self.sink.roll_loot(character, creature_key);
    }

    fn adjust_faction(&self, character: CharacterId, creature_key: &str) {
        self.sink.adjust_faction(character, creature_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::env::NullRewardSink;
    use combat_core::stats::{CharacterClass, Race, StatBlock};
    use combat_core::types::LocationId;

    fn dispatcher() -> StandardRewardDispatcher {
        StandardRewardDispatcher::new(Arc::new(NullRewardSink), EngineConfig::default())
    }

    fn character(level: u32) -> CharacterRow {
        let mut row = CharacterRow::new(
            CharacterId(1),
            "Ana",
            CharacterClass::Warrior,
            Race::Human,
            level,
            StatBlock::default(),
            LocationId(1),
        );
        row.xp = xp_to_reach(level);
        row
    }

    #[test]
    fn even_level_kill_awards_base_xp() {
        let mut row = character(5);
        let award = dispatcher().award_experience(&mut row, 5, 60);
        assert_eq!(award.gained, 60);
        assert!(!award.leveled_up);
    }

    #[test]
    fn gray_kills_bottom_out() {
        let mut row = character(20);
        let award = dispatcher().award_experience(&mut row, 2, 100);
        assert_eq!(award.gained, 25);
    }

    #[test]
    fn level_up_refills_pools() {
        let mut row = character(2);
        row.hp = 1;
        let needed = xp_to_reach(3) - row.xp;
        let award = dispatcher().award_experience(&mut row, 10, needed);
        assert!(award.leveled_up);
        assert_eq!(row.level, 3);
        assert_eq!(row.hp, row.max_hp);
    }

    #[test]
    fn death_penalty_skips_low_levels() {
        let mut row = character(3);
        row.xp += 100;
        assert_eq!(dispatcher().apply_death_penalty(&mut row), 0);
    }

    #[test]
    fn death_penalty_never_delevels() {
        let mut row = character(6);
        row.xp += 200;
        let lost = dispatcher().apply_death_penalty(&mut row);
        assert_eq!(lost, 20);
        assert!(row.xp >= xp_to_reach(6));
    }
}
