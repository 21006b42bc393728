//! `/api/timeline/*` routes: every edit the page makes to the live timeline.
//!
//! Each handler parses its form body, runs one operation against the session
//! and answers with the full session state, so the page can re-render from a
//! single response. A rejected operation answers with the rejection code and
//! leaves the session as it was.

use serde_json::{Value, json};

use crate::catalog;
use crate::config;
use crate::error::Rejection;
use crate::routes::util::{
    get_num, get_param, missing_param, ok_json, parse_form_body, parse_query, rejection_json,
};
use crate::session::{self, Session};
use crate::timeline::model::KeyTriple;
use crate::timeline::ops::{self, EquipmentPatch, StepPatch};
use crate::timeline::sanitize;

/// Session fields shared by every successful response.
pub fn session_fields(s: &Session) -> Value {
    json!({
        "timeline": s.timeline,
        "activeActor": s.active_actor,
        "activePhase": s.active_phase,
        "link": s.link(),
    })
}

fn respond(result: Result<(), Rejection>) -> String {
    match result {
        Ok(()) => session::with_session(|s| ok_json(session_fields(s))),
        Err(r) => {
            log::debug!("rejected: {}", r);
            rejection_json(&r)
        }
    }
}

/// Phase from the form, or the session's active phase.
fn phase_param(params: &[(String, String)]) -> u8 {
    get_num(params, "phase").unwrap_or_else(|| session::with_session(|s| s.active_phase))
}

// ── GET /api/timeline ──────────────────────────────────────────────

pub fn handle_state_get(_query: &str) -> String {
    respond(Ok(()))
}

// ── POST /api/timeline/load ────────────────────────────────────────

/// Body: `hash={location.hash}` (or the raw hash). Falls back to a default
/// timeline when the hash carries nothing decodable.
pub fn handle_load_post(body: &str) -> String {
    let params = parse_form_body(body);
    let hash = get_param(&params, "hash").unwrap_or(body.trim());
    let restored = session::load_from_fragment(hash);
    session::with_session(|s| {
        let mut fields = session_fields(s);
        fields["restored"] = Value::Bool(restored);
        ok_json(fields)
    })
}

// ── POST /api/timeline/reset ───────────────────────────────────────

pub fn handle_reset_post(_body: &str) -> String {
    session::reset_session();
    respond(Ok(()))
}

// ── POST /api/timeline/title ───────────────────────────────────────

pub fn handle_title_post(body: &str) -> String {
    let params = parse_form_body(body);
    let title = get_param(&params, "title").unwrap_or("");
    respond(session::with_session_mut(|s| {
        s.apply(|tl| Ok(ops::set_title(tl, title)))
    }))
}

// ── POST /api/timeline/character ───────────────────────────────────

/// Body: `id={c1..c5}&name={catalog name}`.
pub fn handle_character_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(id) = get_param(&params, "id").filter(|v| !v.is_empty()) else {
        return missing_param("id");
    };
    let name = get_param(&params, "name").unwrap_or("");
    respond(catalog::with_catalog(|cat| {
        session::with_session_mut(|s| s.apply(|tl| ops::set_character_name(tl, cat, id, name)))
    }))
}

// ── POST /api/timeline/equipment ───────────────────────────────────

/// Override the slots present in the form (`{prefix}0..2`) and re-check the
/// triple against what the catalog allows.
fn key_triple_from_form<F>(
    params: &[(String, String)],
    prefix: &str,
    current: &KeyTriple,
    check: F,
) -> Option<KeyTriple>
where
    F: FnOnce(&KeyTriple) -> KeyTriple,
{
    let mut keys = current.clone();
    let mut touched = false;
    for (i, slot) in keys.iter_mut().enumerate() {
        if let Some(v) = get_param(params, &format!("{}{}", prefix, i)) {
            *slot = Some(v.to_string()).filter(|v| !v.is_empty());
            touched = true;
        }
    }
    touched.then(|| check(&keys))
}

/// Body: `id=&limit_break=&weapon=&unique0..2=&common0..2=`; every field but
/// `id` is optional. Key slots and the weapon are sanitized here before the
/// merge, since the merge itself does not re-check them.
pub fn handle_equipment_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(id) = get_param(&params, "id").filter(|v| !v.is_empty()) else {
        return missing_param("id");
    };
    let result = catalog::with_catalog(|cat| {
        session::with_session_mut(|s| {
            let Some(c) = s.timeline.character(id) else {
                return Err(Rejection::UnknownCharacter(id.to_string()));
            };
            let patch = EquipmentPatch {
                limit_break: get_num(&params, "limit_break"),
                weapon: get_param(&params, "weapon").map(|w| {
                    let legal = cat.weapons_for(c.ctype.as_deref());
                    if legal.contains(&w) { w.to_string() } else { String::new() }
                }),
                unique_key_set: key_triple_from_form(
                    &params,
                    "unique",
                    &c.equipment.unique_key_set,
                    |k| sanitize::sanitize_unique_keys(cat, &c.name, k),
                ),
                common_key_set: key_triple_from_form(
                    &params,
                    "common",
                    &c.equipment.common_key_set,
                    |k| sanitize::sanitize_common_keys(cat, k),
                ),
            };
            s.apply(|tl| ops::set_character_equipment(tl, id, patch))
        })
    });
    respond(result)
}

// ── POST /api/timeline/summon/* ────────────────────────────────────

pub fn handle_summon_add_post(_body: &str) -> String {
    let capacity = config::current().summon_capacity;
    respond(catalog::with_catalog(|cat| {
        session::with_session_mut(|s| {
            s.apply_summon_edit(|tl, active| ops::add_summon(tl, cat, capacity, active))
        })
    }))
}

/// Body: `id={s1..s10}`.
pub fn handle_summon_remove_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(id) = get_param(&params, "id").filter(|v| !v.is_empty()) else {
        return missing_param("id");
    };
    respond(session::with_session_mut(|s| {
        s.apply_summon_edit(|tl, active| ops::remove_summon(tl, id, active))
    }))
}

/// Body: `id={s1..s10}&name={catalog name}`.
pub fn handle_summon_name_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(id) = get_param(&params, "id").filter(|v| !v.is_empty()) else {
        return missing_param("id");
    };
    let name = get_param(&params, "name").unwrap_or("");
    respond(catalog::with_catalog(|cat| {
        session::with_session_mut(|s| s.apply(|tl| ops::set_summon_name(tl, cat, id, name)))
    }))
}

// ── POST /api/timeline/select, /api/timeline/phase ─────────────────

/// Body: `id={actor}`. Empty id, or the selected actor again, deselects.
pub fn handle_select_post(body: &str) -> String {
    let params = parse_form_body(body);
    let id = get_param(&params, "id").unwrap_or("");
    respond(session::with_session_mut(|s| s.select_actor(id)))
}

pub fn handle_phase_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(phase) = get_num::<u8>(&params, "phase") else {
        return missing_param("phase");
    };
    respond(session::with_session_mut(|s| s.set_active_phase(phase)))
}

// ── POST /api/timeline/place, /api/timeline/unplace ────────────────

/// Body: `x=&y=`, optionally `phase=` and `actor=`; defaults are the active
/// phase and the selected actor.
pub fn handle_place_post(body: &str) -> String {
    let params = parse_form_body(body);
    let (Some(x), Some(y)) = (get_num::<i32>(&params, "x"), get_num::<i32>(&params, "y")) else {
        return missing_param("x/y");
    };
    let phase = phase_param(&params);
    let actor = get_param(&params, "actor").map(str::to_string);
    respond(session::with_session_mut(|s| {
        let actor = actor.or_else(|| s.active_actor.clone());
        s.apply(|tl| ops::place_actor(tl, phase, actor.as_deref(), x, y))
    }))
}

pub fn handle_unplace_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(actor) = get_param(&params, "actor").filter(|v| !v.is_empty()) else {
        return missing_param("actor");
    };
    let phase = phase_param(&params);
    respond(session::with_session_mut(|s| {
        s.apply(|tl| ops::remove_placement(tl, phase, actor))
    }))
}

// ── POST /api/timeline/copy ────────────────────────────────────────

/// Copy placements and steps into the active phase from the one before it.
pub fn handle_copy_post(_body: &str) -> String {
    respond(session::with_session_mut(|s| s.copy_from_previous()))
}

// ── POST /api/timeline/step, /api/timeline/step/clear ──────────────

/// Body: `order={1..5}`, optionally `actor=`, `skill=`, `note=`, `phase=`.
pub fn handle_step_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(order) = get_num::<u8>(&params, "order") else {
        return missing_param("order");
    };
    let phase = phase_param(&params);
    let patch = StepPatch {
        actor_id: get_param(&params, "actor").map(str::to_string),
        skill: get_param(&params, "skill").map(str::to_string),
        note: get_param(&params, "note").map(str::to_string),
    };
    respond(session::with_session_mut(|s| {
        s.apply(|tl| ops::set_step(tl, phase, order, patch))
    }))
}

pub fn handle_step_clear_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(order) = get_num::<u8>(&params, "order") else {
        return missing_param("order");
    };
    let phase = phase_param(&params);
    respond(session::with_session_mut(|s| {
        s.apply(|tl| ops::clear_step(tl, phase, order))
    }))
}

// ── GET /api/timeline/occupancy ────────────────────────────────────

/// `?phase=`: cell key → actor ids honored at that cell.
pub fn handle_occupancy_get(query: &str) -> String {
    let params = parse_query(query);
    let phase = phase_param(&params);
    session::with_session(|s| match ops::occupancy(&s.timeline, phase) {
        Ok(cells) => ok_json(json!({ "phase": phase, "cells": cells })),
        Err(r) => rejection_json(&r),
    })
}
