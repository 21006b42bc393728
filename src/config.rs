//! Planner configuration: limits and host-facing keys.
//!
//! Installed once at startup alongside the option catalog. Every field has a
//! default, so the host only sends what it wants to override.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Title given to a fresh timeline.
pub const DEFAULT_TITLE: &str = "新規TL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub default_title: String,
    /// Maximum number of summons on the roster, never above ten.
    pub summon_capacity: usize,
    /// Maximum number of locally cached snapshots.
    pub cache_capacity: usize,
    /// localStorage key the host stores the cache blob under.
    pub cache_key: String,
    /// Upper bound on the inflated size of a shared link payload.
    pub max_inflated_bytes: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            summon_capacity: 10,
            cache_capacity: 50,
            cache_key: "dlf2_tl_cache_v1".to_string(),
            max_inflated_bytes: 1 << 20,
        }
    }
}

thread_local! {
    static CONFIG: RefCell<PlannerConfig> = RefCell::new(PlannerConfig::default());
}

/// Read a copy of the installed configuration.
pub fn current() -> PlannerConfig {
    CONFIG.with(|c| c.borrow().clone())
}

/// Replace the installed configuration.
pub fn install(config: PlannerConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: PlannerConfig = serde_json::from_str(r#"{"cache_capacity": 5}"#).unwrap();
        assert_eq!(cfg.cache_capacity, 5);
        assert_eq!(cfg.summon_capacity, 10);
        assert_eq!(cfg.default_title, DEFAULT_TITLE);
    }

    #[test]
    fn install_replaces_current() {
        install(PlannerConfig {
            summon_capacity: 3,
            ..PlannerConfig::default()
        });
        assert_eq!(current().summon_capacity, 3);
        install(PlannerConfig::default());
        assert_eq!(current().summon_capacity, 10);
    }
}
