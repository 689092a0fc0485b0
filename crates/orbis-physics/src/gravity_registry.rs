//! Registry of active gravity sources.
//!
//! The [`GravityRegistry`] resource owns every active [`GravitySource`] and sums
//! their contributions per query. It is an explicitly owned value: the scene
//! creates one, sources register on activation and unregister on deactivation,
//! and dropping or clearing it resets the scene's gravity.
//!
//! Registering an id twice or unregistering an unknown id is a lifecycle bug.
//! Debug builds panic, release builds log a warning and ignore the call.

use std::ops::{Deref, DerefMut};

use bevy_ecs::prelude::*;
use glam::Vec3;
use tracing::{debug, warn};

use crate::gravity_source::GravitySource;

/// Handle to a source in a [`GravityRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u32);

impl SourceId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Ordered set of active gravity sources.
#[derive(Resource, Debug, Default)]
pub struct GravityRegistry {
    sources: Vec<(SourceId, GravitySource)>,
    next_id: u32,
}

impl GravityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id without registering anything under it.
    pub fn reserve_id(&mut self) -> SourceId {
        let id = SourceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Registers a source under a fresh id.
    pub fn register(&mut self, source: impl Into<GravitySource>) -> SourceId {
        let id = self.reserve_id();
        self.register_with_id(id, source);
        id
    }

    /// Registers a source under a previously reserved id.
    pub fn register_with_id(&mut self, id: SourceId, source: impl Into<GravitySource>) {
        if self.contains(id) {
            debug_assert!(false, "gravity source {id:?} registered twice");
            warn!("Ignoring duplicate registration of gravity source {:?}", id);
            return;
        }
        let source = source.into();
        debug!("Registered {} gravity source {:?}", source.kind(), id);
        self.sources.push((id, source));
    }

    /// Registers a source for the lifetime of the returned guard.
    pub fn register_scoped(&mut self, source: impl Into<GravitySource>) -> ScopedSource<'_> {
        let id = self.register(source);
        ScopedSource { registry: self, id }
    }

    /// Removes a source, preserving the order of the remaining ones.
    pub fn unregister(&mut self, id: SourceId) -> Option<GravitySource> {
        let Some(index) = self.sources.iter().position(|(sid, _)| *sid == id) else {
            debug_assert!(false, "gravity source {id:?} was never registered");
            warn!("Ignoring unregistration of unknown gravity source {:?}", id);
            return None;
        };
        let (_, source) = self.sources.remove(index);
        debug!("Unregistered {} gravity source {:?}", source.kind(), id);
        Some(source)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.sources.iter().any(|(sid, _)| *sid == id)
    }

    pub fn get(&self, id: SourceId) -> Option<&GravitySource> {
        self.sources
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, source)| source)
    }

    /// Mutable access for editing a registered source in place.
    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut GravitySource> {
        self.sources
            .iter_mut()
            .find(|(sid, _)| *sid == id)
            .map(|(_, source)| source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &GravitySource)> {
        self.sources.iter().map(|(id, source)| (*id, source))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Removes every source and returns how many there were. Used between
    /// scene loads.
    pub fn clear(&mut self) -> usize {
        let removed = self.sources.len();
        self.sources.clear();
        debug!("Cleared gravity registry ({} sources removed)", removed);
        removed
    }

    /// Net gravity at `position`: the sum of every source's contribution.
    pub fn gravity(&self, position: Vec3) -> Vec3 {
        self.sources
            .iter()
            .fold(Vec3::ZERO, |acc, (_, source)| acc + source.gravity_at(position))
    }

    /// Net gravity and the up axis opposing it.
    pub fn gravity_and_up(&self, position: Vec3) -> (Vec3, Vec3) {
        let gravity = self.gravity(position);
        (gravity, -gravity.normalize_or_zero())
    }

    /// Up axis at `position`, or zero where the net gravity vanishes.
    pub fn up_axis(&self, position: Vec3) -> Vec3 {
        -self.gravity(position).normalize_or_zero()
    }

    /// Up axis at `position`, or `fallback` where the net gravity vanishes.
    pub fn up_axis_or(&self, position: Vec3, fallback: Vec3) -> Vec3 {
        let up = self.up_axis(position);
        if up == Vec3::ZERO { fallback } else { up }
    }
}

/// Registration that lasts until the guard is dropped.
///
/// Derefs to the registry so queries can run while the source is active.
pub struct ScopedSource<'a> {
    registry: &'a mut GravityRegistry,
    id: SourceId,
}

impl ScopedSource<'_> {
    pub fn id(&self) -> SourceId {
        self.id
    }
}

impl Deref for ScopedSource<'_> {
    type Target = GravityRegistry;

    fn deref(&self) -> &GravityRegistry {
        self.registry
    }
}

impl DerefMut for ScopedSource<'_> {
    fn deref_mut(&mut self) -> &mut GravityRegistry {
        self.registry
    }
}

impl Drop for ScopedSource<'_> {
    fn drop(&mut self) {
        if self.registry.contains(self.id) {
            self.registry.unregister(self.id);
        }
    }
}

/// A source that can be switched on and off, keeping the same id.
///
/// Enabling registers the source, disabling unregisters it. Parameter edits
/// made through [`GravityEmitter::edit`] reach the registry immediately while
/// the emitter is active.
#[derive(Component, Clone, Debug)]
pub struct GravityEmitter {
    id: SourceId,
    source: GravitySource,
    active: bool,
}

impl GravityEmitter {
    /// Creates an inactive emitter with an id reserved in `registry`.
    pub fn new(registry: &mut GravityRegistry, source: impl Into<GravitySource>) -> Self {
        Self {
            id: registry.reserve_id(),
            source: source.into(),
            active: false,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn source(&self) -> &GravitySource {
        &self.source
    }

    pub fn enable(&mut self, registry: &mut GravityRegistry) {
        registry.register_with_id(self.id, self.source.clone());
        self.active = true;
    }

    pub fn disable(&mut self, registry: &mut GravityRegistry) {
        registry.unregister(self.id);
        self.active = false;
    }

    /// Applies `edit` to the source and mirrors it into the registry.
    pub fn edit(&mut self, registry: &mut GravityRegistry, edit: impl FnOnce(&mut GravitySource)) {
        edit(&mut self.source);
        if self.active
            && let Some(registered) = registry.get_mut(self.id)
        {
            *registered = self.source.clone();
        }
    }
}
