//! Option catalogs: the static tables every membership check runs against.
//!
//! Characters, weapons, common keys and summons are supplied once at startup
//! and never mutated by the planner. The crate ships a built-in catalog
//! (`data/catalog.json`, weapons and summons only); the host installs the full
//! one through `POST /api/catalog`.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::config::{self, PlannerConfig};
use crate::error::CatalogError;

/// Name given to a new summon when the summon catalog is empty.
pub const FALLBACK_SUMMON_NAME: &str = "召喚物";

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterOption {
    pub name: String,
    /// Short name shown on the grid. Falls back to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Reading used as the sort key. Falls back to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yomi: Option<String>,
    /// Weapon category (e.g. "AR", "SMG"). Restricts the weapon choices.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ctype: Option<String>,
    #[serde(default)]
    pub unique_key_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yomi: Option<String>,
    #[serde(rename = "type")]
    pub ctype: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummonOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Catalog {
    pub characters: Vec<CharacterOption>,
    pub weapons: Vec<WeaponOption>,
    pub common_keys: Vec<String>,
    pub summons: Vec<SummonOption>,
}

/// What the host posts at startup: a catalog plus optional config overrides.
#[derive(Debug, Deserialize)]
pub struct CatalogBundle {
    #[serde(flatten)]
    pub catalog: Catalog,
    #[serde(default)]
    pub config: Option<PlannerConfig>,
}

impl Catalog {
    /// The catalog compiled into the crate.
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_CATALOG).unwrap_or_else(|e| {
            log::warn!("built-in catalog is unreadable: {}", e);
            Catalog::default()
        })
    }

    pub fn character(&self, name: &str) -> Option<&CharacterOption> {
        self.characters.iter().find(|c| c.name == name)
    }

    /// Grid alias for a character name. Empty when no character is selected.
    pub fn character_alias(&self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        self.character(name)
            .and_then(|c| c.alias.clone())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn character_type(&self, name: &str) -> Option<String> {
        self.character(name).and_then(|c| c.ctype.clone())
    }

    pub fn unique_key_options(&self, name: &str) -> &[String] {
        self.character(name)
            .map(|c| c.unique_key_options.as_slice())
            .unwrap_or(&[])
    }

    /// Weapons legal for a category, sorted by reading. With no category
    /// every weapon is legal.
    pub fn weapons_for(&self, ctype: Option<&str>) -> Vec<&str> {
        let mut items: Vec<&WeaponOption> = self
            .weapons
            .iter()
            .filter(|w| ctype.is_none_or(|t| w.ctype == t))
            .collect();
        items.sort_by(|a, b| sort_key(a).cmp(sort_key(b)));
        items.into_iter().map(|w| w.name.as_str()).collect()
    }

    pub fn summon(&self, name: &str) -> Option<&SummonOption> {
        self.summons.iter().find(|s| s.name == name)
    }

    pub fn summon_alias(&self, name: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        self.summon(name)
            .and_then(|s| s.alias.clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// First summon in the catalog, used for newly added summons.
    pub fn default_summon_name(&self) -> String {
        self.summons
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| FALLBACK_SUMMON_NAME.to_string())
    }
}

fn sort_key(w: &WeaponOption) -> &str {
    w.yomi.as_deref().unwrap_or(&w.name)
}

thread_local! {
    static CATALOG: RefCell<Catalog> = RefCell::new(Catalog::builtin());
}

/// Execute a closure with read access to the installed catalog.
pub fn with_catalog<F, R>(f: F) -> R
where
    F: FnOnce(&Catalog) -> R,
{
    CATALOG.with(|c| f(&c.borrow()))
}

/// Replace the installed catalog.
pub fn install(catalog: Catalog) {
    CATALOG.with(|c| {
        *c.borrow_mut() = catalog;
    });
}

/// Install a catalog bundle posted by the host. The previous catalog and
/// config stay in place when the JSON is invalid.
pub fn install_json(json: &str) -> Result<(), CatalogError> {
    let bundle: CatalogBundle = serde_json::from_str(json)?;
    log::info!(
        "catalog installed: {} characters, {} weapons, {} common keys, {} summons",
        bundle.catalog.characters.len(),
        bundle.catalog.weapons.len(),
        bundle.catalog.common_keys.len(),
        bundle.catalog.summons.len()
    );
    install(bundle.catalog);
    if let Some(cfg) = bundle.config {
        config::install(cfg);
    }
    Ok(())
}

/// Export the installed catalog as JSON.
pub fn export_json() -> String {
    with_catalog(|c| serde_json::to_string(c).unwrap_or_else(|_| "{}".to_string()))
}

/// Small catalog shared by the unit tests of every module.
#[cfg(test)]
pub(crate) fn test_catalog() -> Catalog {
    let character = |name: &str, alias: &str, ctype: &str, keys: &[&str]| CharacterOption {
        name: name.to_string(),
        alias: Some(alias.to_string()),
        yomi: None,
        ctype: Some(ctype.to_string()),
        unique_key_options: keys.iter().map(|k| k.to_string()).collect(),
    };
    let weapon = |name: &str, yomi: &str, ctype: &str| WeaponOption {
        name: name.to_string(),
        yomi: Some(yomi.to_string()),
        ctype: ctype.to_string(),
    };
    Catalog {
        characters: vec![
            character("Groza Long", "Groza", "AR", &["Stalwart", "Overdrive", "Vanguard"]),
            character("Nikita Full", "Nikita", "MG", &["Turret Bond", "Overdrive"]),
            character("Qiongjiu Long", "Qiongjiu", "SMG", &["Flurry"]),
        ],
        weapons: vec![
            weapon("Zeta", "zeta", "AR"),
            weapon("Alpha", "alpha", "AR"),
            weapon("Mirage", "mirage", "MG"),
            weapon("Bolt", "bolt", "SMG"),
        ],
        common_keys: vec!["Precision".to_string(), "Fortitude".to_string(), "Celerity".to_string()],
        summons: vec![
            SummonOption {
                name: "Guardian (PPSh)".to_string(),
                alias: Some("Guardian".to_string()),
            },
            SummonOption {
                name: "Turret (Andoris)".to_string(),
                alias: Some("Turret".to_string()),
            },
        ],
    }
}
