//! Tactical timeline planner, run as an in-browser WASM server.
//!
//! Exports `handle_request(method, path, query, body)` for the Web Worker
//! bridge to call. Uses `matchit` for URL routing, the same router engine
//! that powers Axum. Every route answers a JSON string.
//!
//! The planner core (timeline model, editing operations, link codec and
//! snapshot cache) has no wasm dependency and is usable from plain Rust.

use wasm_bindgen::prelude::*;

pub mod cache;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod timeline;

/// Process an HTTP-like request and return a JSON body.
///
/// # Arguments
/// * `method`: HTTP method ("GET" or "POST")
/// * `path`:   URL path (e.g., "/api/timeline/place")
/// * `query`:  Query string (e.g., "?phase=3")
/// * `body`:   Form-encoded POST body. Empty string for GET requests.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    // Timeline editing
    router.insert("/api/timeline", "timeline").ok();
    router.insert("/api/timeline/load", "timeline_load").ok();
    router.insert("/api/timeline/reset", "timeline_reset").ok();
    router.insert("/api/timeline/title", "timeline_title").ok();
    router.insert("/api/timeline/character", "timeline_character").ok();
    router.insert("/api/timeline/equipment", "timeline_equipment").ok();
    router.insert("/api/timeline/summon/add", "summon_add").ok();
    router.insert("/api/timeline/summon/remove", "summon_remove").ok();
    router.insert("/api/timeline/summon/name", "summon_name").ok();
    router.insert("/api/timeline/select", "timeline_select").ok();
    router.insert("/api/timeline/phase", "timeline_phase").ok();
    router.insert("/api/timeline/place", "timeline_place").ok();
    router.insert("/api/timeline/unplace", "timeline_unplace").ok();
    router.insert("/api/timeline/copy", "timeline_copy").ok();
    router.insert("/api/timeline/step", "timeline_step").ok();
    router.insert("/api/timeline/step/clear", "timeline_step_clear").ok();
    router.insert("/api/timeline/occupancy", "timeline_occupancy").ok();

    // Sharing and local cache
    router.insert("/api/share", "share").ok();
    router.insert("/api/cache", "cache").ok();
    router.insert("/api/cache/restore", "cache_restore").ok();
    router.insert("/api/cache/save", "cache_save").ok();
    router.insert("/api/cache/load", "cache_load").ok();
    router.insert("/api/cache/delete", "cache_delete").ok();
    router.insert("/api/cache/persist", "cache_persist").ok();

    router.insert("/api/catalog", "catalog").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            // GET routes
            ("timeline", "GET") => routes::timeline::handle_state_get(query),
            ("timeline_occupancy", "GET") => routes::timeline::handle_occupancy_get(query),
            ("share", "GET") => routes::share::handle_get(query),
            ("cache", "GET") => routes::cache::handle_list_get(query),
            ("cache_persist", "GET") => routes::cache::handle_persist_get(query),
            ("catalog", "GET") => routes::catalog::handle_get(query),

            // POST routes
            ("timeline_load", "POST") => routes::timeline::handle_load_post(body),
            ("timeline_reset", "POST") => routes::timeline::handle_reset_post(body),
            ("timeline_title", "POST") => routes::timeline::handle_title_post(body),
            ("timeline_character", "POST") => routes::timeline::handle_character_post(body),
            ("timeline_equipment", "POST") => routes::timeline::handle_equipment_post(body),
            ("summon_add", "POST") => routes::timeline::handle_summon_add_post(body),
            ("summon_remove", "POST") => routes::timeline::handle_summon_remove_post(body),
            ("summon_name", "POST") => routes::timeline::handle_summon_name_post(body),
            ("timeline_select", "POST") => routes::timeline::handle_select_post(body),
            ("timeline_phase", "POST") => routes::timeline::handle_phase_post(body),
            ("timeline_place", "POST") => routes::timeline::handle_place_post(body),
            ("timeline_unplace", "POST") => routes::timeline::handle_unplace_post(body),
            ("timeline_copy", "POST") => routes::timeline::handle_copy_post(body),
            ("timeline_step", "POST") => routes::timeline::handle_step_post(body),
            ("timeline_step_clear", "POST") => routes::timeline::handle_step_clear_post(body),
            ("cache_restore", "POST") => routes::cache::handle_restore_post(body),
            ("cache_save", "POST") => routes::cache::handle_save_post(body),
            ("cache_load", "POST") => routes::cache::handle_load_post(body),
            ("cache_delete", "POST") => routes::cache::handle_delete_post(body),
            ("catalog", "POST") => routes::catalog::handle_post(body),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    routes::util::error_json("not_found", "404: route not found")
}

fn method_not_allowed() -> String {
    routes::util::error_json("method_not_allowed", "405: method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn reset() {
        catalog::install(catalog::test_catalog());
        config::install(config::PlannerConfig::default());
        session::reset_session();
        cache::restore_blob("");
    }

    fn request(method: &str, path: &str, query: &str, body: &str) -> Value {
        serde_json::from_str(&handle_request(method, path, query, body)).unwrap()
    }

    #[test]
    fn returns_404_for_unknown_route() {
        let v = request("GET", "/api/nonexistent", "", "");
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"], "not_found");
    }

    #[test]
    fn returns_405_for_wrong_method() {
        let v = request("POST", "/api/timeline", "", "");
        assert_eq!(v["error"], "method_not_allowed");
        let v = request("GET", "/api/timeline/place", "", "");
        assert_eq!(v["error"], "method_not_allowed");
    }

    #[test]
    fn routes_timeline_get() {
        reset();
        let v = request("GET", "/api/timeline", "", "");
        assert_eq!(v["ok"], true);
        assert_eq!(v["timeline"]["grid"], serde_json::json!({"cols": 19, "rows": 19}));
        assert_eq!(v["timeline"]["characters"].as_array().unwrap().len(), 5);
        reset();
    }

    #[test]
    fn summon_scenario_leaves_no_summon_placements() {
        reset();
        request("POST", "/api/timeline/summon/add", "", "");
        request("POST", "/api/timeline/place", "", "x=0&y=0&phase=0&actor=s1");
        let v = request("POST", "/api/timeline/summon/remove", "", "id=s1");
        assert!(v["timeline"]["summons"].as_array().unwrap().is_empty());
        let prep = v["timeline"]["prep"]["placements"].as_object().unwrap();
        assert!(prep.keys().all(|k| !k.starts_with('s')));
        reset();
    }

    #[test]
    fn rejected_request_leaves_the_session_unchanged() {
        reset();
        request("POST", "/api/timeline/place", "", "x=2&y=3&actor=c1");
        let before = request("GET", "/api/timeline", "", "");
        let v = request("POST", "/api/timeline/place", "", "x=2&y=3&actor=c4");
        assert_eq!(v["error"], "cell_occupied");
        let v = request("POST", "/api/timeline/place", "", "x=8&y=8&actor=c4");
        assert_eq!(v["error"], "boss_area");
        let v = request("POST", "/api/timeline/place", "", "x=19&y=0&actor=c4");
        assert_eq!(v["error"], "out_of_grid");
        assert_eq!(request("GET", "/api/timeline", "", ""), before);
        reset();
    }

    #[test]
    fn share_then_load_roundtrip() {
        reset();
        request("POST", "/api/timeline/character", "", "id=c1&name=Nikita+Full");
        request("POST", "/api/timeline/step", "", "order=1&actor=c1&skill=S3");
        let v = request("GET", "/api/share", "?base=https%3A%2F%2Fexample.org%2F", "");
        let url = v["url"].as_str().unwrap().to_string();
        let hash = &url[url.find('#').unwrap()..];

        request("POST", "/api/timeline/reset", "", "");
        let v = request("POST", "/api/timeline/load", "", hash);
        assert_eq!(v["restored"], true);
        assert_eq!(v["timeline"]["characters"][0]["alias"], "Nikita");
        assert_eq!(v["timeline"]["prep"]["steps"][0]["skill"], "S3");
        reset();
    }

    #[test]
    fn cache_routes_roundtrip() {
        reset();
        request("POST", "/api/timeline/title", "", "title=Stage+7");
        let v = request("POST", "/api/cache/save", "", "saved_at=1000");
        let id = v["saved"]["id"].as_str().unwrap().to_string();
        request("POST", "/api/timeline/reset", "", "");
        let v = request("POST", "/api/cache/load", "", &format!("id={}", id));
        assert_eq!(v["timeline"]["title"], "Stage 7");
        let v = request("GET", "/api/cache/persist", "", "");
        assert!(v["blob"].as_str().unwrap().contains("Stage 7"));
        reset();
    }

    #[test]
    fn catalog_routes() {
        reset();
        let v = request("GET", "/api/catalog", "", "");
        assert_eq!(v["summons"][0]["alias"], "Guardian");
        let v = request("POST", "/api/catalog", "", "not json");
        assert_eq!(v["error"], "invalid_catalog");
        reset();
    }
}
