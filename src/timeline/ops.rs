//! Timeline editing operations.
//!
//! Every operation borrows the current snapshot and returns a new owned one,
//! so earlier snapshots stay valid. Invalid input never panics: it comes back
//! as a [`Rejection`] and the caller keeps the snapshot it already has.

use std::collections::{BTreeMap, HashMap};

use crate::catalog::Catalog;
use crate::error::Rejection;
use crate::timeline::ids::{self, is_summon_id};
use crate::timeline::model::{
    KeyTriple, MAX_STEP_ORDER, PHASE_COUNT, Position, Step, Summon, Timeline, Turn,
};
use crate::timeline::sanitize;

/// Fields of an equipment edit. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentPatch {
    pub limit_break: Option<u8>,
    pub weapon: Option<String>,
    pub unique_key_set: Option<KeyTriple>,
    pub common_key_set: Option<KeyTriple>,
}

/// Fields of a step edit. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepPatch {
    pub actor_id: Option<String>,
    pub skill: Option<String>,
    pub note: Option<String>,
}

/// Result of a roster change: the new snapshot and the selection after the
/// summon ids were renumbered.
#[derive(Debug, Clone, PartialEq)]
pub struct SummonEdit {
    pub timeline: Timeline,
    pub active_actor: Option<String>,
}

fn check_phase(phase: u8) -> Result<(), Rejection> {
    if phase < PHASE_COUNT {
        Ok(())
    } else {
        Err(Rejection::InvalidPhase(phase))
    }
}

fn turn_mut(tl: &mut Timeline, phase: u8) -> Result<&mut Turn, Rejection> {
    tl.phase_mut(phase).ok_or(Rejection::InvalidPhase(phase))
}

// ── Characters ─────────────────────────────────────────────────────

/// Select a catalog character for a roster slot.
///
/// Alias and category are re-resolved, the weapon is re-derived for the new
/// category and both key triples are re-checked against the catalog.
pub fn set_character_name(
    tl: &Timeline,
    catalog: &Catalog,
    char_id: &str,
    name: &str,
) -> Result<Timeline, Rejection> {
    let mut next = tl.clone();
    let c = next
        .characters
        .iter_mut()
        .find(|c| c.id == char_id)
        .ok_or_else(|| Rejection::UnknownCharacter(char_id.to_string()))?;

    c.name = name.to_string();
    c.alias = catalog.character_alias(name);
    c.ctype = catalog.character_type(name);
    c.equipment.weapon =
        sanitize::derive_weapon(catalog, c.ctype.as_deref(), &c.equipment.weapon);
    c.equipment.unique_key_set =
        sanitize::sanitize_unique_keys(catalog, name, &c.equipment.unique_key_set);
    c.equipment.common_key_set =
        sanitize::sanitize_common_keys(catalog, &c.equipment.common_key_set);

    log::debug!("character {} set to {:?}", char_id, name);
    Ok(next)
}

/// Merge an equipment edit. Key triples are taken as given; callers run them
/// through the sanitizers first.
pub fn set_character_equipment(
    tl: &Timeline,
    char_id: &str,
    patch: EquipmentPatch,
) -> Result<Timeline, Rejection> {
    let mut next = tl.clone();
    let c = next
        .characters
        .iter_mut()
        .find(|c| c.id == char_id)
        .ok_or_else(|| Rejection::UnknownCharacter(char_id.to_string()))?;
    let equipment = &mut c.equipment;

    if let Some(level) = patch.limit_break {
        equipment.limit_break = sanitize::clamp_limit_break(level);
    }
    if let Some(weapon) = patch.weapon {
        equipment.weapon = weapon;
    }
    if let Some(keys) = patch.unique_key_set {
        equipment.unique_key_set = keys;
    }
    if let Some(keys) = patch.common_key_set {
        equipment.common_key_set = keys;
    }
    Ok(next)
}

// ── Summons ────────────────────────────────────────────────────────

/// Reassign summon ids to `s1..sN` in roster order and carry every placement
/// and the selection over to the new ids. Returns the remapped selection.
pub fn renumber_summons(tl: &mut Timeline, active: Option<&str>) -> Option<String> {
    let id_map: HashMap<String, String> = tl
        .summons
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.clone(), ids::summon_id(i)))
        .filter(|(old, new)| old != new)
        .collect();

    if !id_map.is_empty() {
        for s in tl.summons.iter_mut() {
            if let Some(new) = id_map.get(&s.id) {
                s.id = new.clone();
            }
        }
        for turn in tl.phases_mut() {
            let old = std::mem::take(&mut turn.placements);
            let (moved, kept): (Vec<_>, Vec<_>) =
                old.into_iter().partition(|(k, _)| id_map.contains_key(k));
            turn.placements.extend(kept);
            // Remapped entries win over any stale entry already holding the new id.
            for (k, pos) in moved {
                if let Some(new) = id_map.get(&k) {
                    turn.placements.insert(new.clone(), pos);
                }
            }
        }
        log::debug!("renumbered {} summons", id_map.len());
    }

    active.map(|a| {
        if is_summon_id(a) {
            id_map.get(a).cloned().unwrap_or_else(|| a.to_string())
        } else {
            a.to_string()
        }
    })
}

/// Append a summon named after the catalog's first entry. `capacity` never
/// exceeds [`ids::MAX_SUMMONS`].
pub fn add_summon(
    tl: &Timeline,
    catalog: &Catalog,
    capacity: usize,
    active: Option<&str>,
) -> Result<SummonEdit, Rejection> {
    let capacity = capacity.min(ids::MAX_SUMMONS);
    if tl.summons.len() >= capacity {
        return Err(Rejection::SummonCapacity(capacity));
    }
    let mut next = tl.clone();
    let name = catalog.default_summon_name();
    next.summons.push(Summon {
        id: ids::summon_id(next.summons.len()),
        alias: catalog.summon_alias(&name),
        name,
    });
    let active_actor = renumber_summons(&mut next, active);
    Ok(SummonEdit {
        timeline: next,
        active_actor,
    })
}

/// Delete a summon and every placement it holds, then renumber the rest.
/// Removing the selected summon clears the selection.
pub fn remove_summon(
    tl: &Timeline,
    id: &str,
    active: Option<&str>,
) -> Result<SummonEdit, Rejection> {
    if tl.summon(id).is_none() {
        return Err(Rejection::UnknownSummon(id.to_string()));
    }
    let mut next = tl.clone();
    for turn in next.phases_mut() {
        turn.placements.remove(id);
    }
    next.summons.retain(|s| s.id != id);
    let mut next = prune_orphans(&next);

    let active = active.filter(|a| *a != id);
    let active_actor = renumber_summons(&mut next, active);
    log::debug!("summon {} removed, {} left", id, next.summons.len());
    Ok(SummonEdit {
        timeline: next,
        active_actor,
    })
}

pub fn set_summon_name(
    tl: &Timeline,
    catalog: &Catalog,
    id: &str,
    name: &str,
) -> Result<Timeline, Rejection> {
    if catalog.summon(name).is_none() {
        return Err(Rejection::UnknownSummonName(name.to_string()));
    }
    let mut next = tl.clone();
    let s = next
        .summons
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| Rejection::UnknownSummon(id.to_string()))?;
    s.name = name.to_string();
    s.alias = catalog.summon_alias(name);
    Ok(next)
}

// ── Placements ─────────────────────────────────────────────────────

/// Move an actor to a cell in one phase.
///
/// Rejected for boss-area and off-grid cells, a missing or unknown actor,
/// and cells another actor already holds in that phase.
pub fn place_actor(
    tl: &Timeline,
    phase: u8,
    actor_id: Option<&str>,
    x: i32,
    y: i32,
) -> Result<Timeline, Rejection> {
    check_phase(phase)?;
    if ids::is_boss_cell(x, y) {
        return Err(Rejection::BossArea { x, y });
    }
    if !tl.grid.contains(x, y) {
        return Err(Rejection::OutOfGrid { x, y });
    }
    let actor = actor_id.filter(|a| !a.is_empty()).ok_or(Rejection::NoActor)?;
    if !tl.has_actor(actor) {
        return Err(Rejection::UnknownActor(actor.to_string()));
    }

    let mut next = tl.clone();
    let turn = turn_mut(&mut next, phase)?;
    let target = Position { x, y };
    if let Some((occupant, _)) = turn
        .placements
        .iter()
        .find(|(id, pos)| id.as_str() != actor && **pos == target)
    {
        return Err(Rejection::CellOccupied {
            x,
            y,
            occupant: occupant.clone(),
        });
    }
    turn.placements.insert(actor.to_string(), target);
    log::debug!("phase {}: {} placed at {}", phase, actor, ids::cell_key(x, y));
    Ok(next)
}

pub fn remove_placement(tl: &Timeline, phase: u8, actor_id: &str) -> Result<Timeline, Rejection> {
    let mut next = tl.clone();
    turn_mut(&mut next, phase)?.placements.remove(actor_id);
    Ok(next)
}

/// Cell key → actors honored at that cell. Unknown actors, boss-area and
/// off-grid positions are skipped. Several ids on one key only happen with
/// hand-edited links; they are reported, not deleted.
pub fn occupancy(tl: &Timeline, phase: u8) -> Result<BTreeMap<String, Vec<String>>, Rejection> {
    let turn = tl.phase(phase).ok_or(Rejection::InvalidPhase(phase))?;
    let mut cells: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (id, pos) in &turn.placements {
        if !tl.has_actor(id) || !tl.grid.is_placeable(pos.x, pos.y) {
            continue;
        }
        cells
            .entry(ids::cell_key(pos.x, pos.y))
            .or_default()
            .push(id.clone());
    }
    Ok(cells)
}

// ── Phases ─────────────────────────────────────────────────────────

/// Replace `to` with a copy of the placements and steps of `from`.
pub fn copy_phase(tl: &Timeline, from: u8, to: u8) -> Result<Timeline, Rejection> {
    let source = tl.phase(from).ok_or(Rejection::InvalidPhase(from))?;
    let (placements, steps) = (source.placements.clone(), source.steps.clone());
    let mut next = tl.clone();
    let dest = turn_mut(&mut next, to)?;
    dest.placements = placements;
    dest.steps = steps;
    log::debug!("phase {} copied into {}", from, to);
    Ok(next)
}

/// Source phase for "copy from previous": turn 1 copies from preparation.
pub fn previous_phase(active: u8) -> Result<u8, Rejection> {
    check_phase(active)?;
    match active {
        0 => Err(Rejection::NoPreviousPhase),
        n => Ok(n - 1),
    }
}

pub fn copy_from_previous(tl: &Timeline, active: u8) -> Result<Timeline, Rejection> {
    copy_phase(tl, previous_phase(active)?, active)
}

// ── Steps ──────────────────────────────────────────────────────────

/// Create or update the step at `order`. New steps start with the first
/// roster character and an empty skill.
pub fn set_step(
    tl: &Timeline,
    phase: u8,
    order: u8,
    patch: StepPatch,
) -> Result<Timeline, Rejection> {
    check_phase(phase)?;
    if !(1..=MAX_STEP_ORDER).contains(&order) {
        return Err(Rejection::InvalidOrder(order));
    }
    if let Some(actor) = patch.actor_id.as_deref() {
        if !tl.has_actor(actor) {
            return Err(Rejection::UnknownActor(actor.to_string()));
        }
    }

    let default_actor = tl
        .characters
        .first()
        .map(|c| c.id.clone())
        .unwrap_or_else(|| "c1".to_string());
    let mut next = tl.clone();
    let turn = turn_mut(&mut next, phase)?;
    let idx = match turn.steps.iter().position(|s| s.order == order) {
        Some(i) => i,
        None => {
            turn.steps.push(Step {
                order,
                actor_id: default_actor,
                skill: String::new(),
                note: None,
            });
            turn.steps.len() - 1
        }
    };

    let step = &mut turn.steps[idx];
    if let Some(actor) = patch.actor_id {
        step.actor_id = actor;
    }
    if let Some(skill) = patch.skill {
        step.skill = skill;
    }
    if let Some(note) = patch.note {
        step.note = Some(note).filter(|n| !n.is_empty());
    }
    turn.steps.sort_by_key(|s| s.order);
    Ok(next)
}

/// Remove the step at `order` entirely.
pub fn clear_step(tl: &Timeline, phase: u8, order: u8) -> Result<Timeline, Rejection> {
    let mut next = tl.clone();
    turn_mut(&mut next, phase)?.steps.retain(|s| s.order != order);
    Ok(next)
}

pub fn set_title(tl: &Timeline, title: &str) -> Timeline {
    let mut next = tl.clone();
    next.title = Some(title.to_string()).filter(|t| !t.is_empty());
    next
}

// ── Healing passes ─────────────────────────────────────────────────

/// Drop placements whose actor is on neither roster.
pub fn prune_orphans(tl: &Timeline) -> Timeline {
    let mut next = tl.clone();
    let known: Vec<String> = tl.actor_ids().into_iter().map(String::from).collect();
    for turn in next.phases_mut() {
        turn.placements.retain(|id, _| known.contains(id));
    }
    next
}

/// Re-check every character's key selections and weapon against the catalog.
pub fn sanitize_all_equipment(tl: &Timeline, catalog: &Catalog) -> Timeline {
    let mut next = tl.clone();
    for c in next.characters.iter_mut() {
        c.equipment = sanitize::sanitize_equipment(catalog, &c.name, &c.equipment);
        c.equipment.weapon =
            sanitize::sanitize_weapon(catalog, c.ctype.as_deref(), &c.equipment.weapon);
    }
    next
}

/// Healing passes run on every load: summon ids back to `s1..sN` with their
/// placements, orphaned placements dropped, equipment re-checked.
pub fn heal(tl: &Timeline, catalog: &Catalog) -> Timeline {
    let mut next = tl.clone();
    renumber_summons(&mut next, None);
    let next = sanitize_all_equipment(&prune_orphans(&next), catalog);
    if next != *tl {
        log::debug!("timeline healed on load");
    }
    next
}
