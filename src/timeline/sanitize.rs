//! Catalog membership sanitizers.
//!
//! Each takes the allowed set explicitly. Slot positions are preserved: a
//! value that is not allowed becomes an empty slot instead of shifting the
//! remaining ones.

use crate::catalog::Catalog;
use crate::timeline::model::{Equipment, KeyTriple, MAX_LIMIT_BREAK};

/// Keep only the values present in `allowed`.
pub fn sanitize_keys<S: AsRef<str>>(keys: &KeyTriple, allowed: &[S]) -> KeyTriple {
    std::array::from_fn(|i| {
        keys[i]
            .as_ref()
            .filter(|v| !v.is_empty() && allowed.iter().any(|a| a.as_ref() == v.as_str()))
            .cloned()
    })
}

pub fn sanitize_unique_keys(catalog: &Catalog, name: &str, keys: &KeyTriple) -> KeyTriple {
    sanitize_keys(keys, catalog.unique_key_options(name))
}

pub fn sanitize_common_keys(catalog: &Catalog, keys: &KeyTriple) -> KeyTriple {
    sanitize_keys(keys, &catalog.common_keys)
}

/// Weapon to keep for a category: the current one when still legal, else the
/// category's first option, else none.
pub fn derive_weapon(catalog: &Catalog, ctype: Option<&str>, current: &str) -> String {
    let allowed = catalog.weapons_for(ctype);
    if !current.is_empty() && allowed.contains(&current) {
        return current.to_string();
    }
    allowed.first().map(|w| w.to_string()).unwrap_or_default()
}

/// Weapon check used when healing: an empty weapon stays empty, a weapon
/// the category no longer offers is re-derived.
pub fn sanitize_weapon(catalog: &Catalog, ctype: Option<&str>, current: &str) -> String {
    if current.is_empty() {
        return String::new();
    }
    derive_weapon(catalog, ctype, current)
}

pub fn clamp_limit_break(level: u8) -> u8 {
    level.min(MAX_LIMIT_BREAK)
}

/// Equipment with both key triples re-checked against the catalog entry for
/// `name`. The weapon is left alone here, see [`sanitize_weapon`].
pub fn sanitize_equipment(catalog: &Catalog, name: &str, equipment: &Equipment) -> Equipment {
    Equipment {
        limit_break: clamp_limit_break(equipment.limit_break),
        weapon: equipment.weapon.clone(),
        unique_key_set: sanitize_unique_keys(catalog, name, &equipment.unique_key_set),
        common_key_set: sanitize_common_keys(catalog, &equipment.common_key_set),
    }
}
