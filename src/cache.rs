//! Local snapshot cache: named timelines saved in the browser.
//!
//! The persistence medium belongs to the host (localStorage). The cache only
//! needs a get-list/set-list contract, expressed as [`SnapshotStore`].
//! [`BlobStore`] keeps the list as the JSON string the host stores under
//! `cache_key`, so reading and writing localStorage is one string each way.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::config;
use crate::error::CacheError;
use crate::timeline::Timeline;

/// One saved timeline. Field names match the stored blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedTimeline {
    pub id: String,
    pub title: String,
    pub data: Timeline,
    /// Milliseconds since the Unix epoch, supplied by the host.
    pub saved_at: u64,
}

/// Get-list/set-list persistence contract. Last writer wins.
pub trait SnapshotStore {
    fn get_list(&self) -> Vec<CachedTimeline>;
    fn set_list(&mut self, list: Vec<CachedTimeline>);
}

/// Store backed by the serialized list.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    blob: String,
}

impl BlobStore {
    pub fn from_blob(blob: &str) -> Self {
        Self {
            blob: blob.to_string(),
        }
    }

    pub fn blob(&self) -> &str {
        if self.blob.is_empty() { "[]" } else { &self.blob }
    }
}

impl SnapshotStore for BlobStore {
    /// A missing or unreadable blob reads as an empty list.
    fn get_list(&self) -> Vec<CachedTimeline> {
        if self.blob.is_empty() {
            return Vec::new();
        }
        serde_json::from_str(&self.blob).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable snapshot cache: {}", e);
            Vec::new()
        })
    }

    fn set_list(&mut self, list: Vec<CachedTimeline>) {
        self.blob = serde_json::to_string(&list).unwrap_or_else(|_| "[]".to_string());
    }
}

/// Most-recent-first list of saved timelines, capped at `capacity`.
#[derive(Debug)]
pub struct SnapshotCache<S: SnapshotStore> {
    store: S,
    capacity: usize,
    seq: u64,
}

impl<S: SnapshotStore> SnapshotCache<S> {
    pub fn new(store: S, capacity: usize) -> Self {
        Self {
            store,
            capacity,
            seq: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn list(&self) -> Vec<CachedTimeline> {
        self.store.get_list()
    }

    pub fn get(&self, id: &str) -> Option<CachedTimeline> {
        self.store.get_list().into_iter().find(|c| c.id == id)
    }

    /// Save a snapshot under its (trimmed) title. Blank titles are refused.
    pub fn save(&mut self, tl: &Timeline, saved_at: u64) -> Result<CachedTimeline, CacheError> {
        let title = tl.title.as_deref().unwrap_or("").trim().to_string();
        if title.is_empty() {
            return Err(CacheError::MissingTitle);
        }
        let mut list = self.store.get_list();
        let id = self.fresh_id(saved_at, &list);
        let item = CachedTimeline {
            id,
            title,
            data: tl.clone(),
            saved_at,
        };
        list.insert(0, item.clone());
        list.truncate(self.capacity);
        self.store.set_list(list);
        log::info!("saved timeline {:?} as {}", item.title, item.id);
        Ok(item)
    }

    /// Delete a snapshot. Unknown ids leave the list as it is.
    pub fn remove(&mut self, id: &str) {
        let mut list = self.store.get_list();
        let before = list.len();
        list.retain(|c| c.id != id);
        if list.len() != before {
            self.store.set_list(list);
        }
    }

    fn fresh_id(&mut self, saved_at: u64, existing: &[CachedTimeline]) -> String {
        loop {
            self.seq += 1;
            let id = snapshot_id(saved_at, self.seq);
            if !existing.iter().any(|c| c.id == id) {
                return id;
            }
        }
    }
}

/// Eight base-36 characters mixed from the timestamp and a sequence number.
fn snapshot_id(saved_at: u64, seq: u64) -> String {
    // splitmix64 finalizer
    let mut z = saved_at ^ seq.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;

    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..8)
        .map(|_| {
            let d = DIGITS[(z % 36) as usize] as char;
            z /= 36;
            d
        })
        .collect()
}

thread_local! {
    static CACHE: RefCell<SnapshotCache<BlobStore>> = RefCell::new(
        SnapshotCache::new(BlobStore::default(), config::current().cache_capacity),
    );
}

/// Execute a closure with mutable access to the session's snapshot cache.
pub fn with_cache_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut SnapshotCache<BlobStore>) -> R,
{
    CACHE.with(|c| f(&mut c.borrow_mut()))
}

/// Load the blob the host read from localStorage.
pub fn restore_blob(blob: &str) {
    let capacity = config::current().cache_capacity;
    CACHE.with(|c| {
        *c.borrow_mut() = SnapshotCache::new(BlobStore::from_blob(blob.trim()), capacity);
    });
}

/// The blob the host should write back to localStorage.
pub fn export_blob() -> String {
    CACHE.with(|c| c.borrow().store().blob().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::ops;

    fn titled(title: &str) -> Timeline {
        ops::set_title(&Timeline::default(), title)
    }

    #[test]
    fn save_prepends_and_caps() {
        let mut cache = SnapshotCache::new(BlobStore::default(), 3);
        for i in 0..5 {
            cache.save(&titled(&format!("plan {}", i)), 1_700_000_000_000 + i).unwrap();
        }
        let titles: Vec<String> = cache.list().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, ["plan 4", "plan 3", "plan 2"]);
    }

    #[test]
    fn blank_title_is_refused() {
        let mut cache = SnapshotCache::new(BlobStore::default(), 50);
        assert_eq!(cache.save(&titled("   "), 1).unwrap_err(), CacheError::MissingTitle);
        let mut untitled = Timeline::default();
        untitled.title = None;
        assert_eq!(cache.save(&untitled, 1).unwrap_err(), CacheError::MissingTitle);
        assert!(cache.list().is_empty());
    }

    #[test]
    fn title_is_trimmed_and_data_kept() {
        let mut cache = SnapshotCache::new(BlobStore::default(), 50);
        let tl = ops::place_actor(&titled("  raid  "), 0, Some("c1"), 1, 1).unwrap();
        let item = cache.save(&tl, 42).unwrap();
        assert_eq!(item.title, "raid");
        assert_eq!(item.saved_at, 42);
        assert_eq!(cache.get(&item.id).unwrap().data, tl);
    }

    #[test]
    fn ids_are_unique_and_base36() {
        let mut cache = SnapshotCache::new(BlobStore::default(), 50);
        let a = cache.save(&titled("a"), 7).unwrap();
        let b = cache.save(&titled("b"), 7).unwrap();
        assert_ne!(a.id, b.id);
        for id in [&a.id, &b.id] {
            assert_eq!(id.len(), 8);
            assert!(id.bytes().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn remove_deletes_only_the_match() {
        let mut cache = SnapshotCache::new(BlobStore::default(), 50);
        let a = cache.save(&titled("a"), 1).unwrap();
        let b = cache.save(&titled("b"), 2).unwrap();
        cache.remove(&a.id);
        cache.remove("missing");
        let ids: Vec<String> = cache.list().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, [b.id]);
    }

    #[test]
    fn blob_roundtrip_and_garbage() {
        let mut cache = SnapshotCache::new(BlobStore::default(), 50);
        cache.save(&titled("kept"), 5).unwrap();
        let blob = cache.store().blob().to_string();
        assert!(blob.contains(r#""savedAt":5"#));

        let reloaded = SnapshotCache::new(BlobStore::from_blob(&blob), 50);
        assert_eq!(reloaded.list().len(), 1);

        let broken = SnapshotCache::new(BlobStore::from_blob("{oops"), 50);
        assert!(broken.list().is_empty());
        assert_eq!(BlobStore::default().blob(), "[]");
    }

    #[test]
    fn thread_local_cache_restore_and_export() {
        restore_blob("");
        with_cache_mut(|c| c.save(&titled("x"), 9)).unwrap();
        let blob = export_blob();
        restore_blob("");
        with_cache_mut(|c| assert!(c.list().is_empty()));
        restore_blob(&blob);
        with_cache_mut(|c| assert_eq!(c.list()[0].title, "x"));
        restore_blob("");
    }
}
