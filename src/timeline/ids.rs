//! Actor ids, grid cells and display colors.
//!
//! Character ids (`c1`..`c5`) are stable. Summon ids are always `s1..sN` in
//! roster order, so the `s` prefix alone tells the two kinds apart.

pub const SUMMON_PREFIX: char = 's';
/// Hard cap on the summon roster, one palette color per summon.
pub const MAX_SUMMONS: usize = SUMMON_COLORS.len();

/// Inclusive bounds of the boss area on both axes.
pub const BOSS_MIN: i32 = 8;
pub const BOSS_MAX: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Character,
    Summon,
}

impl ActorKind {
    pub fn of(id: &str) -> Self {
        if is_summon_id(id) {
            ActorKind::Summon
        } else {
            ActorKind::Character
        }
    }
}

pub fn is_summon_id(id: &str) -> bool {
    id.starts_with(SUMMON_PREFIX)
}

/// Summon id for a 0-based roster position.
pub fn summon_id(index: usize) -> String {
    format!("{}{}", SUMMON_PREFIX, index + 1)
}

/// 1-based number of a well-formed summon id (`s3` → 3).
pub fn summon_number(id: &str) -> Option<usize> {
    let digits = id.strip_prefix(SUMMON_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n| *n > 0)
}

/// Map key for a cell, `"x,y"`.
pub fn cell_key(x: i32, y: i32) -> String {
    format!("{},{}", x, y)
}

pub fn is_boss_cell(x: i32, y: i32) -> bool {
    (BOSS_MIN..=BOSS_MAX).contains(&x) && (BOSS_MIN..=BOSS_MAX).contains(&y)
}

// ── Colors ─────────────────────────────────────────────────────────

const CHARACTER_COLORS: [(&str, &str); 5] = [
    ("c1", "#ef4444"), // red
    ("c2", "#3b82f6"), // blue
    ("c3", "#10b981"), // green
    ("c4", "#f59e0b"), // orange
    ("c5", "#8b5cf6"), // purple
];

const SUMMON_COLORS: [&str; 10] = [
    "#06b6d4", "#14b8a6", "#eab308", "#f97316", "#a855f7", "#22c55e", "#f43f5e", "#0ea5e9",
    "#84cc16", "#d946ef",
];

const FALLBACK_CHARACTER_COLOR: &str = "#6b7280";
const FALLBACK_SUMMON_COLOR: &str = "#64748b";

/// Fixed character ids of the roster, in slot order.
pub fn character_slots() -> impl Iterator<Item = (&'static str, &'static str)> {
    CHARACTER_COLORS.iter().copied()
}

pub fn character_color(id: &str) -> &'static str {
    CHARACTER_COLORS
        .iter()
        .find(|(cid, _)| *cid == id)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_CHARACTER_COLOR)
}

pub fn summon_color(id: &str) -> &'static str {
    match summon_number(id) {
        Some(n) => SUMMON_COLORS[(n - 1) % SUMMON_COLORS.len()],
        None => FALLBACK_SUMMON_COLOR,
    }
}

pub fn actor_color(id: &str) -> &'static str {
    match ActorKind::of(id) {
        ActorKind::Character => character_color(id),
        ActorKind::Summon => summon_color(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boss_area_is_the_center_square() {
        for x in 0..19 {
            for y in 0..19 {
                let expected = (8..=10).contains(&x) && (8..=10).contains(&y);
                assert_eq!(is_boss_cell(x, y), expected, "cell {},{}", x, y);
            }
        }
    }

    #[test]
    fn id_namespaces() {
        assert_eq!(ActorKind::of("s1"), ActorKind::Summon);
        assert_eq!(ActorKind::of("c1"), ActorKind::Character);
        assert_eq!(summon_id(0), "s1");
        assert_eq!(summon_number("s10"), Some(10));
        assert_eq!(summon_number("s"), None);
        assert_eq!(summon_number("s0"), None);
        assert_eq!(summon_number("sx"), None);
    }

    #[test]
    fn cell_key_format() {
        assert_eq!(cell_key(3, 14), "3,14");
    }

    #[test]
    fn summon_colors_cycle() {
        assert_eq!(summon_color("s1"), "#06b6d4");
        assert_eq!(summon_color("s11"), "#06b6d4");
        assert_eq!(summon_color("sz"), FALLBACK_SUMMON_COLOR);
        assert_eq!(actor_color("c3"), "#10b981");
        assert_eq!(actor_color("c9"), FALLBACK_CHARACTER_COLOR);
    }
}
