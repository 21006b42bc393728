//! `/api/catalog`: install or read the option catalog.

use crate::catalog;
use crate::routes::util::{error_json, ok_json};
use crate::session;

/// Body: catalog JSON, optionally with a `config` object. The live timeline is
/// healed against the new catalog; selection and phase are kept.
pub fn handle_post(body: &str) -> String {
    match catalog::install_json(body) {
        Ok(()) => {
            catalog::with_catalog(|cat| session::with_session_mut(|s| s.heal_against(cat)));
            let counts = catalog::with_catalog(|c| {
                serde_json::json!({
                    "characters": c.characters.len(),
                    "weapons": c.weapons.len(),
                    "commonKeys": c.common_keys.len(),
                    "summons": c.summons.len(),
                })
            });
            ok_json(serde_json::json!({ "installed": counts }))
        }
        Err(e) => {
            log::warn!("catalog rejected: {}", e);
            error_json("invalid_catalog", &e.to_string())
        }
    }
}

/// The installed catalog as JSON (not wrapped in `ok`).
pub fn handle_get(_query: &str) -> String {
    catalog::export_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use serde_json::Value;

    fn reset() {
        catalog::install(catalog::Catalog::builtin());
        config::install(config::PlannerConfig::default());
        session::reset_session();
    }

    #[test]
    fn install_counts_and_config() {
        reset();
        let body = r#"{
            "characters": [{"name": "Groza Long", "alias": "Groza", "type": "AR",
                            "uniqueKeyOptions": ["Stalwart"]}],
            "weapons": [{"name": "Alpha", "type": "AR"}],
            "commonKeys": ["Precision"],
            "summons": [],
            "config": {"summon_capacity": 3}
        }"#;
        let v: Value = serde_json::from_str(&handle_post(body)).unwrap();
        assert_eq!(v["installed"]["characters"], 1);
        assert_eq!(v["installed"]["weapons"], 1);
        assert_eq!(config::current().summon_capacity, 3);

        let exported: Value = serde_json::from_str(&handle_get("")).unwrap();
        assert_eq!(exported["commonKeys"][0], "Precision");
        reset();
    }

    #[test]
    fn invalid_json_keeps_previous_catalog() {
        reset();
        let before = handle_get("");
        let v: Value = serde_json::from_str(&handle_post("{broken")).unwrap();
        assert_eq!(v["error"], "invalid_catalog");
        assert_eq!(handle_get(""), before);
        reset();
    }

    #[test]
    fn install_heals_the_live_timeline() {
        reset();
        catalog::install(catalog::test_catalog());
        session::with_session_mut(|s| {
            s.apply(|tl| {
                let cat = catalog::test_catalog();
                let tl = crate::timeline::ops::set_character_name(tl, &cat, "c1", "Groza Long")?;
                let patch = crate::timeline::ops::EquipmentPatch {
                    unique_key_set: Some([Some("Vanguard".to_string()), None, None]),
                    ..Default::default()
                };
                crate::timeline::ops::set_character_equipment(&tl, "c1", patch)
            })
        })
        .unwrap();
        handle_post(
            r#"{"characters": [
                {"name": "Groza Long", "type": "AR", "uniqueKeyOptions": ["Stalwart"]}
            ]}"#,
        );
        session::with_session(|s| {
            assert_eq!(s.timeline.characters[0].equipment.unique_key_set[0], None);
        });
        reset();
    }

    #[test]
    fn install_keeps_the_selection() {
        reset();
        session::with_session_mut(|s| {
            s.select_actor("c3").unwrap();
            s.set_active_phase(5).unwrap();
        });
        handle_post(r#"{"commonKeys": ["Precision"]}"#);
        session::with_session(|s| {
            assert_eq!(s.active_actor.as_deref(), Some("c3"));
            assert_eq!(s.active_phase, 5);
        });
        reset();
    }
}
