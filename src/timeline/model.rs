//! Timeline data model.
//!
//! Field names follow the JSON shape of shared links (`limitBreak`,
//! `actorId`, ...) so links produced by earlier versions of the tool keep
//! decoding. Placement maps are `BTreeMap`s so the encoded form is canonical.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::DEFAULT_TITLE;
use crate::timeline::ids;

/// The only format version this crate reads and writes.
pub const VERSION: u32 = 1;
/// Preparation phase plus 7 numbered turns.
pub const PHASE_COUNT: u8 = 8;
pub const TURN_COUNT: usize = 7;
/// Step orders are the addressable slots 1..=MAX_STEP_ORDER.
pub const MAX_STEP_ORDER: u8 = 5;
pub const MAX_LIMIT_BREAK: u8 = 6;

/// Three optional key choices. Empty slots serialize as `null`.
pub type KeyTriple = [Option<String>; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub cols: u32,
    pub rows: u32,
}

impl Default for Grid {
    fn default() -> Self {
        Self { cols: 19, rows: 19 }
    }
}

impl Grid {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.cols && (y as u32) < self.rows
    }

    /// A cell that may hold a placement: inside the grid and outside the boss area.
    pub fn is_placeable(&self, x: i32, y: i32) -> bool {
        self.contains(x, y) && !ids::is_boss_cell(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(default)]
    pub limit_break: u8,
    /// Empty string means no weapon.
    #[serde(default)]
    pub weapon: String,
    #[serde(default)]
    pub unique_key_set: KeyTriple,
    #[serde(default)]
    pub common_key_set: KeyTriple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    /// Catalog name, empty while unselected.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctype: Option<String>,
    pub color: String,
    #[serde(default)]
    pub equipment: Equipment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summon {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub order: u8,
    pub actor_id: String,
    #[serde(default)]
    pub skill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub index: u8,
    #[serde(default)]
    pub placements: BTreeMap<String, Position>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Turn {
    pub fn new(index: u8) -> Self {
        Self {
            index,
            placements: BTreeMap::new(),
            steps: Vec::new(),
        }
    }

    pub fn step(&self, order: u8) -> Option<&Step> {
        self.steps.iter().find(|s| s.order == order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub v: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub grid: Grid,
    pub characters: Vec<Character>,
    #[serde(default)]
    pub summons: Vec<Summon>,
    pub prep: Turn,
    pub turns: [Turn; TURN_COUNT],
}

impl Default for Timeline {
    fn default() -> Self {
        Self::with_title(DEFAULT_TITLE)
    }
}

impl Timeline {
    /// Fresh timeline: five empty character slots, no summons, empty phases.
    pub fn with_title(title: &str) -> Self {
        let characters = ids::character_slots()
            .map(|(id, color)| Character {
                id: id.to_string(),
                name: String::new(),
                alias: String::new(),
                ctype: None,
                color: color.to_string(),
                equipment: Equipment::default(),
            })
            .collect();
        Self {
            v: VERSION,
            title: Some(title.to_string()),
            grid: Grid::default(),
            characters,
            summons: Vec::new(),
            prep: Turn::new(0),
            turns: std::array::from_fn(|i| Turn::new(i as u8 + 1)),
        }
    }

    /// Phase 0 is preparation, 1..=7 the numbered turns.
    pub fn phase(&self, index: u8) -> Option<&Turn> {
        match index {
            0 => Some(&self.prep),
            n => self.turns.get(n as usize - 1),
        }
    }

    pub fn phase_mut(&mut self, index: u8) -> Option<&mut Turn> {
        match index {
            0 => Some(&mut self.prep),
            n => self.turns.get_mut(n as usize - 1),
        }
    }

    pub fn phases(&self) -> impl Iterator<Item = &Turn> {
        std::iter::once(&self.prep).chain(self.turns.iter())
    }

    pub fn phases_mut(&mut self) -> impl Iterator<Item = &mut Turn> {
        std::iter::once(&mut self.prep).chain(self.turns.iter_mut())
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn summon(&self, id: &str) -> Option<&Summon> {
        self.summons.iter().find(|s| s.id == id)
    }

    /// Every id that may appear in a placement map.
    pub fn actor_ids(&self) -> BTreeSet<&str> {
        self.characters
            .iter()
            .map(|c| c.id.as_str())
            .chain(self.summons.iter().map(|s| s.id.as_str()))
            .collect()
    }

    pub fn has_actor(&self, id: &str) -> bool {
        match ids::ActorKind::of(id) {
            ids::ActorKind::Summon => self.summon(id).is_some(),
            ids::ActorKind::Character => self.character(id).is_some(),
        }
    }

    /// Structural checks a decoded timeline must pass before it is accepted.
    pub fn check_shape(&self) -> Result<(), &'static str> {
        if self.grid.cols == 0 || self.grid.rows == 0 {
            return Err("empty grid");
        }
        if self.prep.index != 0 {
            return Err("preparation phase index is not 0");
        }
        if self
            .turns
            .iter()
            .enumerate()
            .any(|(i, t)| t.index as usize != i + 1)
        {
            return Err("turn indices are not 1..=7");
        }
        if !self
            .characters
            .iter()
            .map(|c| c.id.as_str())
            .eq(ids::character_slots().map(|(id, _)| id))
        {
            return Err("character roster is not c1..c5");
        }
        if self.summons.len() > ids::MAX_SUMMONS {
            return Err("too many summons");
        }
        let summon_ids: BTreeSet<&str> = self.summons.iter().map(|s| s.id.as_str()).collect();
        if summon_ids.len() != self.summons.len() {
            return Err("duplicate summon id");
        }
        if summon_ids.iter().any(|id| ids::summon_number(id).is_none()) {
            return Err("malformed summon id");
        }
        for turn in self.phases() {
            if turn.steps.iter().any(|s| !(1..=MAX_STEP_ORDER).contains(&s.order)) {
                return Err("step order outside 1..=5");
            }
            let orders: BTreeSet<u8> = turn.steps.iter().map(|s| s.order).collect();
            if orders.len() != turn.steps.len() {
                return Err("duplicate step order");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeline_shape() {
        let tl = Timeline::default();
        assert_eq!(tl.v, VERSION);
        assert_eq!(tl.title.as_deref(), Some(DEFAULT_TITLE));
        assert_eq!(tl.grid, Grid { cols: 19, rows: 19 });
        let ids: Vec<&str> = tl.characters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3", "c4", "c5"]);
        assert_eq!(tl.characters[1].color, "#3b82f6");
        assert!(tl.summons.is_empty());
        assert_eq!(tl.phases().count(), PHASE_COUNT as usize);
        for (i, turn) in tl.phases().enumerate() {
            assert_eq!(turn.index as usize, i);
            assert!(turn.placements.is_empty());
            assert!(turn.steps.is_empty());
        }
        assert!(tl.check_shape().is_ok());
    }

    #[test]
    fn phase_lookup() {
        let tl = Timeline::default();
        assert_eq!(tl.phase(0).map(|t| t.index), Some(0));
        assert_eq!(tl.phase(7).map(|t| t.index), Some(7));
        assert!(tl.phase(8).is_none());
    }

    #[test]
    fn json_uses_link_field_names() {
        let json = serde_json::to_string(&Timeline::default()).unwrap();
        assert!(json.contains(r#""limitBreak":0"#));
        assert!(json.contains(r#""uniqueKeySet":[null,null,null]"#));
        assert!(json.contains(r#""prep":{"index":0"#));
        assert!(!json.contains("ctype"));
    }

    #[test]
    fn reads_link_json_with_missing_optional_fields() {
        let mut tl = Timeline::default();
        tl.prep.placements.insert("c1".to_string(), Position { x: 1, y: 2 });
        let mut value = serde_json::to_value(&tl).unwrap();
        let c1 = &mut value["characters"][0];
        c1.as_object_mut().unwrap().remove("alias");
        c1["equipment"].as_object_mut().unwrap().remove("weapon");
        let back: Timeline = serde_json::from_value(value).unwrap();
        assert_eq!(back, tl);
    }

    #[test]
    fn check_shape_catches_bad_indices() {
        let mut tl = Timeline::default();
        tl.turns[2].index = 9;
        assert!(tl.check_shape().is_err());

        let mut tl = Timeline::default();
        let step = Step {
            order: 1,
            actor_id: "c1".to_string(),
            skill: String::new(),
            note: None,
        };
        tl.prep.steps = vec![step.clone(), step.clone()];
        assert!(tl.check_shape().is_err());

        let mut tl = Timeline::default();
        tl.turns[0].steps = vec![Step { order: 6, ..step.clone() }];
        assert_eq!(tl.check_shape(), Err("step order outside 1..=5"));
        tl.turns[0].steps[0].order = 0;
        assert!(tl.check_shape().is_err());
    }

    fn summon(id: &str) -> Summon {
        Summon {
            id: id.to_string(),
            name: "Guardian (PPSh)".to_string(),
            alias: "Guardian".to_string(),
        }
    }

    #[test]
    fn check_shape_catches_bad_rosters() {
        let mut tl = Timeline::default();
        tl.characters.pop();
        assert_eq!(tl.check_shape(), Err("character roster is not c1..c5"));

        let mut tl = Timeline::default();
        tl.characters.swap(0, 1);
        assert!(tl.check_shape().is_err());

        let mut tl = Timeline::default();
        tl.summons = vec![summon("s1"), summon("s1")];
        assert_eq!(tl.check_shape(), Err("duplicate summon id"));

        tl.summons = vec![summon("s1"), summon("c9")];
        assert_eq!(tl.check_shape(), Err("malformed summon id"));

        tl.summons = (1..=11).map(|n| summon(&format!("s{}", n))).collect();
        assert_eq!(tl.check_shape(), Err("too many summons"));

        // Out of order but well formed: accepted, renumbered when healed.
        tl.summons = vec![summon("s3"), summon("s1")];
        assert!(tl.check_shape().is_ok());
    }

    #[test]
    fn grid_placeable_cells() {
        let g = Grid::default();
        assert!(g.is_placeable(0, 0));
        assert!(g.is_placeable(18, 18));
        assert!(!g.is_placeable(19, 0));
        assert!(!g.is_placeable(-1, 3));
        assert!(!g.is_placeable(9, 9));
    }
}
