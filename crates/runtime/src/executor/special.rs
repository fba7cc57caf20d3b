//! Bespoke ability handlers.
//!
//! The irregular 20%: mechanics the data-driven executor cannot express.
//! Each handler owns one [`SpecialMechanic`] variant.

use combat_core::ability::{AbilityKey, AbilitySpec, PetArchetype};
use combat_core::error::AbilityError;
use combat_core::types::{CharacterId, SimTime, TargetRef, ThreatSource, ThreatTarget};

use crate::store::{ActivePet, CombatState, ParticipantStatus};

use super::AbilityExecutor;

/// Summon a combat pet for the caster.
///
/// Dismisses any existing pet first (one live pet per character), derives
/// the pet's stats from the caster's level and the stat template, and
/// for taunting archetypes seeds aggro entries so creatures have a
/// reason to turn around.
pub(super) fn summon_pet(
    exec: &AbilityExecutor,
    state: &mut CombatState,
    now: SimTime,
    caster: CharacterId,
    spec: &AbilitySpec,
    pet_key: &AbilityKey,
) -> Result<(), AbilityError> {
    let template = exec
        .catalog()
        .pet_template(pet_key)
        .ok_or_else(|| AbilityError::MissingContent(pet_key.clone()))?;
    let level = state
        .character(caster)
        .map(|r| r.level)
        .ok_or(AbilityError::ActorMissing)?;

    // One-pet-per-character invariant: retire the old one, folding its
    // threat onto the caster so the table stays consistent.
    if let Some(old) = state.pet_of_owner(caster).map(|p| (p.id, p.encounter, p.name.clone())) {
        let (old_id, old_encounter, old_name) = old;
        if let Some(encounter) = old_encounter {
            let affected = state.threat_mut(encounter).redirect_to_owner(old_id);
            for creature in affected {
                if let Some(enemy) = state.enemy_mut(creature) {
                    enemy.target = Some(ThreatTarget::Character(caster));
                }
            }
        }
        state.remove_pet(old_id);
        exec.sink()
            .append_private(caster, &format!("{} departs.", old_name));
    }

    let encounter = state.encounter_of_character(caster);
    let level_i = i64::from(level);
    let max_hp = template.hp_base + template.hp_per_level * level_i;
    let attack_damage = template.damage_base + template.damage_per_level * level_i;
    let target = encounter.and_then(|e| state.living_enemies(e).first().copied());

    let pet = state.summon_pet(ActivePet {
        id: combat_core::types::PetId(0), // assigned by the store
        owner: caster,
        encounter,
        name: template.name.clone(),
        hp: max_hp,
        max_hp,
        attack_damage,
        ability: template.ability.clone(),
        ability_ready_at: now,
        target,
        next_auto_attack_at: now.plus_millis(exec.config().auto_attack_interval_ms),
        expires_at: template.duration_ms.map(|d| now.plus_millis(d)),
    });

    if let Some(encounter) = encounter {
        let source = ThreatSource::Pet { pet, owner: caster };
        match template.archetype {
            PetArchetype::Striker => {}
            // Single-target taunt against the current target
            PetArchetype::Taunter => {
                if let Some(creature) = target {
                    state
                        .threat_mut(encounter)
                        .add(creature, source, template.taunt_threat);
                }
            }
            // AoE aggro against every living creature
            PetArchetype::Guardian => {
                for creature in state.living_enemies(encounter) {
                    state
                        .threat_mut(encounter)
                        .add(creature, source, template.taunt_threat);
                }
            }
        }
    }

    exec.sink()
        .append_private(caster, &format!("{} answers your call.", template.name));
    tracing::debug!(caster = %caster, pet = %pet, ability = %spec.key, "pet summoned");
    Ok(())
}

/// Bring a dead character back to partial strength.
///
/// Resurrection targets a (possibly dead) character directly, bypassing
/// the usual live-member target resolution.
pub(super) fn resurrect(
    exec: &AbilityExecutor,
    state: &mut CombatState,
    caster: CharacterId,
    spec: &AbilitySpec,
    restore_percent: i64,
    target: Option<TargetRef>,
) -> Result<(), AbilityError> {
    let Some(TargetRef::Character(target)) = target else {
        return Err(AbilityError::InvalidTarget);
    };
    let row = state.character(target).ok_or(AbilityError::InvalidTarget)?;
    if row.is_alive() {
        return Err(AbilityError::TargetNotDead);
    }

    if let Some(row) = state.character_mut(target) {
        row.hp = (row.max_hp * restore_percent / 100).max(1);
        row.mana = row.max_mana * restore_percent / 100;
        row.stamina = row.max_stamina * restore_percent / 100;
    }

    // A dead participant in a still-active encounter rejoins the fight.
    if let Some(encounter) = state
        .participants
        .iter()
        .find(|p| p.character == target && p.status == ParticipantStatus::Dead)
        .map(|p| p.encounter)
        && state
            .encounter(encounter)
            .is_some_and(|e| e.state == crate::store::EncounterState::Active)
        && let Some(participant) = state.participant_mut(encounter, target)
    {
        participant.status = ParticipantStatus::Active;
    }

    let name = state
        .character(target)
        .map(|r| r.name.clone())
        .unwrap_or_default();
    exec.sink()
        .append_private(caster, &format!("Your {} returns {} to life.", spec.name, name));
    exec.sink()
        .append_private(target, "Life floods back into your body.");
    Ok(())
}

/// Fold the caster's pet threat back onto the caster and repoint every
/// affected creature. This is the only threat-decreasing mutation in
/// the game.
pub(super) fn redirect_pet_threat(
    exec: &AbilityExecutor,
    state: &mut CombatState,
    caster: CharacterId,
    spec: &AbilitySpec,
) -> Result<(), AbilityError> {
    let pet = state
        .pet_of_owner(caster)
        .map(|p| (p.id, p.encounter))
        .ok_or(AbilityError::NoActivePet)?;
    let (pet_id, encounter) = pet;
    let encounter = encounter.ok_or(AbilityError::NotInCombat)?;

    let affected = state.threat_mut(encounter).redirect_to_owner(pet_id);
    for creature in &affected {
        if let Some(enemy) = state.enemy_mut(*creature) {
            enemy.target = Some(ThreatTarget::Character(caster));
        }
    }

    exec.sink().append_private(
        caster,
        &format!("Your {} draws {} foes onto you.", spec.name, affected.len()),
    );
    Ok(())
}
