//! `/api/cache/*` routes: locally saved timelines.
//!
//! The worker cannot reach localStorage, so the host hands over the stored
//! blob once (`restore`) and writes back whatever `persist` returns after each
//! save or delete.

use serde_json::{Value, json};

use crate::cache::{self, CachedTimeline};
use crate::config;
use crate::routes::util::{error_json, get_num, get_param, missing_param, ok_json, parse_form_body};
use crate::session;

fn summary(item: &CachedTimeline) -> Value {
    json!({ "id": item.id, "title": item.title, "savedAt": item.saved_at })
}

fn list_json() -> Value {
    let items: Vec<Value> = cache::with_cache_mut(|c| c.list().iter().map(summary).collect());
    Value::Array(items)
}

// ── GET /api/cache ─────────────────────────────────────────────────

pub fn handle_list_get(_query: &str) -> String {
    ok_json(json!({ "items": list_json() }))
}

// ── POST /api/cache/restore ────────────────────────────────────────

/// Body: the raw value stored under the cache key (may be empty).
pub fn handle_restore_post(body: &str) -> String {
    cache::restore_blob(body);
    ok_json(json!({ "items": list_json() }))
}

// ── POST /api/cache/save ───────────────────────────────────────────

/// Body: `saved_at={Date.now()}`. Saves the live timeline under its title.
pub fn handle_save_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(saved_at) = get_num::<u64>(&params, "saved_at") else {
        return missing_param("saved_at");
    };
    let tl = session::with_session(|s| s.timeline.clone());
    match cache::with_cache_mut(|c| c.save(&tl, saved_at)) {
        Ok(item) => ok_json(json!({
            "saved": summary(&item),
            "items": list_json(),
            "blob": cache::export_blob(),
        })),
        Err(e) => error_json(e.code(), &e.to_string()),
    }
}

// ── POST /api/cache/load ───────────────────────────────────────────

pub fn handle_load_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(id) = get_param(&params, "id").filter(|v| !v.is_empty()) else {
        return missing_param("id");
    };
    match session::load_cached(id) {
        Ok(_) => session::with_session(|s| ok_json(crate::routes::timeline::session_fields(s))),
        Err(e) => error_json(e.code(), &e.to_string()),
    }
}

// ── POST /api/cache/delete ─────────────────────────────────────────

pub fn handle_delete_post(body: &str) -> String {
    let params = parse_form_body(body);
    let Some(id) = get_param(&params, "id").filter(|v| !v.is_empty()) else {
        return missing_param("id");
    };
    cache::with_cache_mut(|c| c.remove(id));
    ok_json(json!({ "items": list_json(), "blob": cache::export_blob() }))
}

// ── GET /api/cache/persist ─────────────────────────────────────────

/// What the host writes to localStorage: `localStorage.setItem(key, blob)`.
pub fn handle_persist_get(_query: &str) -> String {
    ok_json(json!({
        "key": config::current().cache_key,
        "blob": cache::export_blob(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::ops;

    fn reset() {
        session::reset_session();
        cache::restore_blob("");
    }

    fn parse(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn save_list_load_delete() {
        reset();
        session::with_session_mut(|s| s.apply(|tl| Ok(ops::set_title(tl, "boss rush")))).unwrap();
        let v = parse(&handle_save_post("saved_at=1700000000000"));
        assert_eq!(v["ok"], true);
        let id = v["saved"]["id"].as_str().unwrap().to_string();
        assert_eq!(v["saved"]["savedAt"], 1_700_000_000_000u64);

        session::reset_session();
        let v = parse(&handle_load_post(&format!("id={}", id)));
        assert_eq!(v["timeline"]["title"], "boss rush");

        let v = parse(&handle_list_get(""));
        assert_eq!(v["items"][0]["title"], "boss rush");

        let v = parse(&handle_delete_post(&format!("id={}", id)));
        assert!(v["items"].as_array().unwrap().is_empty());
        assert_eq!(v["blob"], "[]");
        reset();
    }

    #[test]
    fn save_without_title_is_refused() {
        reset();
        session::with_session_mut(|s| s.apply(|tl| Ok(ops::set_title(tl, "")))).unwrap();
        assert_eq!(parse(&handle_save_post("saved_at=1"))["error"], "missing_title");
        assert_eq!(parse(&handle_save_post(""))["error"], "missing_param");
        reset();
    }

    #[test]
    fn unknown_id_is_not_found() {
        reset();
        assert_eq!(parse(&handle_load_post("id=zzzzzzzz"))["error"], "not_found");
        reset();
    }

    #[test]
    fn restore_then_persist() {
        reset();
        handle_save_post("saved_at=5");
        let blob = parse(&handle_persist_get(""))["blob"].as_str().unwrap().to_string();
        reset();
        let v = parse(&handle_restore_post(&blob));
        assert_eq!(v["items"].as_array().unwrap().len(), 1);

        let v = parse(&handle_persist_get(""));
        assert_eq!(v["key"], "dlf2_tl_cache_v1");
        assert_eq!(v["blob"], blob);
        reset();
    }
}
