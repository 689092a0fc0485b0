//! Trigger volume that reports when it becomes occupied and when it empties.
//!
//! The zone only tracks identities; the caller feeds it enter and exit
//! notifications, or a full overlap set per step through [`DetectionZone::sync`].

use std::hash::Hash;

use rustc_hash::FxHashSet;
use tracing::debug;

type ZoneCallback = Box<dyn FnMut() + Send + Sync>;

/// Set of colliders inside a trigger with first-enter and last-exit hooks.
///
/// The zone is enabled only while occupied, which is when
/// [`prune`](Self::prune) has work to do.
pub struct DetectionZone<K> {
    inside: FxHashSet<K>,
    enabled: bool,
    on_first_enter: Option<ZoneCallback>,
    on_last_exit: Option<ZoneCallback>,
}

impl<K> std::fmt::Debug for DetectionZone<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionZone")
            .field("occupants", &self.inside.len())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash> Default for DetectionZone<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> DetectionZone<K> {
    pub fn new() -> Self {
        Self {
            inside: FxHashSet::default(),
            enabled: false,
            on_first_enter: None,
            on_last_exit: None,
        }
    }

    pub fn on_first_enter(mut self, callback: impl FnMut() + Send + Sync + 'static) -> Self {
        self.on_first_enter = Some(Box::new(callback));
        self
    }

    pub fn on_last_exit(mut self, callback: impl FnMut() + Send + Sync + 'static) -> Self {
        self.on_last_exit = Some(Box::new(callback));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_occupied(&self) -> bool {
        !self.inside.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inside.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inside.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.inside.contains(&key)
    }

    /// Records `key` entering. Fires first-enter when the zone was empty.
    pub fn enter(&mut self, key: K) {
        if self.inside.is_empty() {
            self.fire_first_enter();
        }
        self.inside.insert(key);
    }

    /// Records `key` leaving. Fires last-exit when it was the final occupant.
    pub fn exit(&mut self, key: K) {
        if self.inside.remove(&key) && self.inside.is_empty() {
            self.fire_last_exit();
        }
    }

    /// Replaces the occupants with `current`, emitting enters before exits.
    pub fn sync(&mut self, current: impl IntoIterator<Item = K>) {
        let current: FxHashSet<K> = current.into_iter().collect();
        for &key in &current {
            if !self.inside.contains(&key) {
                self.enter(key);
            }
        }
        let gone: Vec<K> = self
            .inside
            .iter()
            .copied()
            .filter(|key| !current.contains(key))
            .collect();
        for key in gone {
            self.exit(key);
        }
    }

    /// Drops occupants for which `is_alive` is false, such as despawned or
    /// deactivated colliders that never reported an exit.
    pub fn prune(&mut self, mut is_alive: impl FnMut(K) -> bool) {
        if !self.enabled {
            return;
        }
        let before = self.inside.len();
        self.inside.retain(|&key| is_alive(key));
        if before > 0 && self.inside.is_empty() {
            self.fire_last_exit();
        }
    }

    /// Clears the zone, firing last-exit if anything was inside.
    pub fn disable(&mut self) {
        if !self.inside.is_empty() {
            self.inside.clear();
            self.fire_last_exit();
        }
        self.enabled = false;
    }

    fn fire_first_enter(&mut self) {
        debug!("Detection zone occupied");
        self.enabled = true;
        if let Some(callback) = self.on_first_enter.as_mut() {
            callback();
        }
    }

    fn fire_last_exit(&mut self) {
        debug!("Detection zone emptied");
        self.enabled = false;
        if let Some(callback) = self.on_last_exit.as_mut() {
            callback();
        }
    }
}
