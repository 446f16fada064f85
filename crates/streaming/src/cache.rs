use std::collections::BTreeMap;

use foundation::time::{Time, TimeSpan};
use foundation::Handle;
use tracing::{debug, warn};

use crate::request::FetchError;
use crate::residency::ResidencyState;

/// One cached tile.
#[derive(Debug)]
pub struct TileEntry<I> {
    identifier: String,
    state: ResidencyState,
    image: Option<I>,
    fade: Option<TimeSpan>,
    error: Option<FetchError>,
}

impl<I> TileEntry<I> {
    fn requested(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_owned(),
            state: ResidencyState::Requested,
            image: None,
            fade: None,
            error: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> ResidencyState {
        self.state
    }

    pub fn image(&self) -> Option<&I> {
        self.image.as_ref()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.state == ResidencyState::Resident
    }

    /// Opacity for a fade-in that started when the tile arrived.
    pub fn alpha_at(&self, now: Time) -> f64 {
        self.fade.map_or(1.0, |span| span.progress(now))
    }

    pub fn is_fading(&self, now: Time) -> bool {
        self.fade.is_some_and(|span| !span.is_finished(now))
    }
}

#[derive(Debug)]
struct Slot<I> {
    generation: u32,
    entry: Option<TileEntry<I>>,
}

/// What [`TileCache::complete`] did with a finished download.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Loaded,
    Failed,
    /// The handle's slot was reused; nothing changed.
    Stale,
}

/// Fixed-capacity ring of tile slots keyed by identifier.
///
/// Inserting a new identifier takes the slot at the ring pointer and advances it,
/// evicting whatever lived there. Eviction bumps the slot generation so handles issued
/// for the old entry stop resolving.
#[derive(Debug)]
pub struct TileCache<I> {
    slots: Vec<Slot<I>>,
    next: usize,
    index: BTreeMap<String, usize>,
}

impl<I> TileCache<I> {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity.max(1))
            .map(|_| Slot {
                generation: 0,
                entry: None,
            })
            .collect();
        Self {
            slots,
            next: 0,
            index: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the existing handle if `identifier` is cached, otherwise claims the next
    /// ring slot for it in the `Requested` state.
    pub fn insert(&mut self, identifier: &str) -> Handle {
        if let Some(handle) = self.lookup(identifier) {
            return handle;
        }
        let slot_index = self.next;
        self.next = (self.next + 1) % self.slots.len();

        let slot = &mut self.slots[slot_index];
        if let Some(old) = slot.entry.take() {
            self.index.remove(&old.identifier);
            slot.generation = slot.generation.wrapping_add(1);
            debug!(evicted = %old.identifier, slot = slot_index, "tile cache slot reused");
        }
        slot.entry = Some(TileEntry::requested(identifier));
        self.index.insert(identifier.to_owned(), slot_index);
        Handle::new(slot_index as u32, slot.generation)
    }

    pub fn lookup(&self, identifier: &str) -> Option<Handle> {
        let &slot_index = self.index.get(identifier)?;
        let slot = &self.slots[slot_index];
        Some(Handle::new(slot_index as u32, slot.generation))
    }

    pub fn is_current(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&TileEntry<I>> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.entry.as_ref()
    }

    fn get_mut(&mut self, handle: Handle) -> Option<&mut TileEntry<I>> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn entry(&self, identifier: &str) -> Option<&TileEntry<I>> {
        self.get(self.lookup(identifier)?)
    }

    /// Stores a finished download. A success starts a fade of `fade_ms` at `now`.
    pub fn complete(
        &mut self,
        handle: Handle,
        result: Result<I, FetchError>,
        now: Time,
        fade_ms: f64,
    ) -> CompletionOutcome {
        let Some(entry) = self.get_mut(handle) else {
            return CompletionOutcome::Stale;
        };
        match result {
            Ok(image) => {
                entry.image = Some(image);
                entry.error = None;
                entry.state = ResidencyState::Resident;
                entry.fade = (fade_ms > 0.0).then(|| TimeSpan::starting_at(now, fade_ms));
                CompletionOutcome::Loaded
            }
            Err(err) => {
                warn!(identifier = %entry.identifier, error = %err, "tile fetch failed");
                entry.image = None;
                entry.error = Some(err);
                entry.state = ResidencyState::Failed;
                CompletionOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_is_idempotent() {
        let mut cache: TileCache<u32> = TileCache::new(4);
        let a = cache.insert("a");
        assert_eq!(cache.insert("a"), a);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("a"), Some(a));
        assert_eq!(cache.entry("a").unwrap().state(), ResidencyState::Requested);
    }

    #[test]
    fn overflow_evicts_oldest_insertion() {
        let capacity = 800;
        let mut cache: TileCache<u32> = TileCache::new(capacity);
        let first = cache.insert("tile-0");
        for i in 1..capacity {
            cache.insert(&format!("tile-{i}"));
        }
        assert_eq!(cache.len(), capacity);
        assert!(cache.lookup("tile-0").is_some());

        cache.insert("tile-800");
        assert_eq!(cache.len(), capacity);
        assert!(cache.lookup("tile-0").is_none());
        assert!(cache.lookup("tile-1").is_some());
        assert!(cache.lookup("tile-800").is_some());
        // The evicted entry's handle no longer resolves.
        assert!(cache.get(first).is_none());
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut cache: TileCache<u32> = TileCache::new(1);
        let old = cache.insert("old");
        let new = cache.insert("new");
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);

        let outcome = cache.complete(old, Ok(7), Time(0.0), 700.0);
        assert_eq!(outcome, CompletionOutcome::Stale);
        assert_eq!(cache.entry("new").unwrap().state(), ResidencyState::Requested);
        assert!(cache.entry("new").unwrap().image().is_none());
    }

    #[test]
    fn completion_starts_fade() {
        let mut cache: TileCache<&str> = TileCache::new(2);
        let h = cache.insert("t");
        assert_eq!(
            cache.complete(h, Ok("pixels"), Time(1.0), 700.0),
            CompletionOutcome::Loaded
        );
        let entry = cache.get(h).unwrap();
        assert!(entry.is_ready());
        assert_eq!(entry.image(), Some(&"pixels"));
        assert_eq!(entry.alpha_at(Time(1.0)), 0.0);
        assert!((entry.alpha_at(Time(1.35)) - 0.5).abs() < 1e-9);
        assert_eq!(entry.alpha_at(Time(2.0)), 1.0);
        assert!(entry.is_fading(Time(1.5)));
        assert!(!entry.is_fading(Time(1.7)));
    }

    #[test]
    fn failure_is_retained() {
        let mut cache: TileCache<u32> = TileCache::new(2);
        let h = cache.insert("missing");
        let outcome = cache.complete(
            h,
            Err(FetchError::NotFound("missing".into())),
            Time(0.0),
            700.0,
        );
        assert_eq!(outcome, CompletionOutcome::Failed);
        let entry = cache.entry("missing").unwrap();
        assert_eq!(entry.state(), ResidencyState::Failed);
        assert!(entry.error().is_some());
        assert_eq!(cache.insert("missing"), h);
    }
}
