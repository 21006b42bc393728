//! Editing session: the live snapshot plus what the editor has selected.
//!
//! Uses `thread_local!` + `RefCell` like the other worker state. The selected
//! actor lives here rather than in the page so summon renumbering can carry it
//! along explicitly.

use std::cell::RefCell;

use crate::cache;
use crate::catalog;
use crate::codec;
use crate::config;
use crate::error::{CacheError, Rejection};
use crate::timeline::model::PHASE_COUNT;
use crate::timeline::ops::{self, SummonEdit};
use crate::timeline::Timeline;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub timeline: Timeline,
    /// Actor that grid clicks place. `None` when nothing is selected.
    pub active_actor: Option<String>,
    /// Phase shown in the editor, 0 = preparation.
    pub active_phase: u8,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(default_timeline())
    }
}

impl Session {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            active_actor: None,
            active_phase: 0,
        }
    }

    /// Publish the snapshot an operation produced. On rejection the current
    /// snapshot stays.
    pub fn apply<F>(&mut self, op: F) -> Result<(), Rejection>
    where
        F: FnOnce(&Timeline) -> Result<Timeline, Rejection>,
    {
        self.timeline = op(&self.timeline)?;
        Ok(())
    }

    /// Like [`Session::apply`] for roster changes that renumber summons.
    pub fn apply_summon_edit<F>(&mut self, op: F) -> Result<(), Rejection>
    where
        F: FnOnce(&Timeline, Option<&str>) -> Result<SummonEdit, Rejection>,
    {
        let edit = op(&self.timeline, self.active_actor.as_deref())?;
        self.timeline = edit.timeline;
        self.active_actor = edit.active_actor;
        Ok(())
    }

    /// Select an actor. Selecting the selected actor again, or an empty id,
    /// clears the selection.
    pub fn select_actor(&mut self, id: &str) -> Result<(), Rejection> {
        if id.is_empty() || self.active_actor.as_deref() == Some(id) {
            self.active_actor = None;
            return Ok(());
        }
        if !self.timeline.has_actor(id) {
            return Err(Rejection::UnknownActor(id.to_string()));
        }
        self.active_actor = Some(id.to_string());
        Ok(())
    }

    pub fn set_active_phase(&mut self, phase: u8) -> Result<(), Rejection> {
        if phase >= PHASE_COUNT {
            return Err(Rejection::InvalidPhase(phase));
        }
        self.active_phase = phase;
        Ok(())
    }

    /// Place the selected actor in the active phase.
    pub fn place_selected(&mut self, x: i32, y: i32) -> Result<(), Rejection> {
        let (phase, actor) = (self.active_phase, self.active_actor.clone());
        self.apply(|tl| ops::place_actor(tl, phase, actor.as_deref(), x, y))
    }

    pub fn copy_from_previous(&mut self) -> Result<(), Rejection> {
        let phase = self.active_phase;
        self.apply(|tl| ops::copy_from_previous(tl, phase))
    }

    /// Heal the live timeline against `catalog`, keeping the selection and
    /// phase. A selected actor that no longer exists is deselected.
    pub fn heal_against(&mut self, catalog: &catalog::Catalog) {
        self.timeline = ops::heal(&self.timeline, catalog);
        if let Some(active) = self.active_actor.as_deref() {
            if !self.timeline.has_actor(active) {
                self.active_actor = None;
            }
        }
    }

    /// Current shareable link payload (`v1:...`).
    pub fn link(&self) -> Option<String> {
        codec::encode(&self.timeline)
            .map_err(|e| log::warn!("could not encode timeline: {}", e))
            .ok()
    }
}

/// Fresh timeline titled with the configured placeholder.
pub fn default_timeline() -> Timeline {
    Timeline::with_title(&config::current().default_title)
}

thread_local! {
    static SESSION: RefCell<Session> = RefCell::new(Session::default());
}

/// Execute a closure with read access to the session.
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&Session) -> R,
{
    SESSION.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the session.
pub fn with_session_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Session) -> R,
{
    SESSION.with(|s| f(&mut s.borrow_mut()))
}

/// Replace the entire session.
pub fn replace_session(new_session: Session) {
    SESSION.with(|s| {
        *s.borrow_mut() = new_session;
    });
}

/// Start over from a default timeline.
pub fn reset_session() {
    replace_session(Session::default());
}

/// Heal a timeline against the installed catalog and make it the live one.
/// Selection and phase are reset.
pub fn load_timeline(tl: &Timeline) {
    let healed = catalog::with_catalog(|c| ops::heal(tl, c));
    replace_session(Session::new(healed));
}

/// Load the timeline carried by a `location.hash`, or a default one when the
/// hash carries nothing decodable. Returns whether a shared timeline was found.
pub fn load_from_fragment(hash: &str) -> bool {
    match codec::decode_fragment(hash) {
        Some(tl) => {
            log::info!("loaded shared timeline {:?}", tl.title);
            load_timeline(&tl);
            true
        }
        None => {
            reset_session();
            false
        }
    }
}

/// Load a locally cached snapshot and return its new link.
pub fn load_cached(id: &str) -> Result<Option<String>, CacheError> {
    let item = cache::with_cache_mut(|c| c.get(id))
        .ok_or_else(|| CacheError::NotFound(id.to_string()))?;
    log::info!("loaded cached timeline {:?}", item.title);
    load_timeline(&item.data);
    Ok(with_session(Session::link))
}
