//! The object heap: allocation, rooting and mark-and-sweep.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::handle::{Gc, InScopeRoots, RawGc, Scoped};
use super::trace::{Managed, Trace, Tracer};

/// Collector tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcConfig {
    /// Allocations between automatic collections. Zero disables automatic collection.
    pub threshold: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self { threshold: 1024 }
    }
}

/// GC statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    pub collections: u64,
    pub allocated: u64,
    pub freed: u64,
    pub compactions: u64,
    /// Objects alive after the last allocation or sweep.
    pub live: usize,
}

struct Entry<O> {
    marked: bool,
    object: O,
}

struct Slot<O> {
    generation: u32,
    entry: Option<Entry<O>>,
}

/// Arena of traced objects with permanent and in-scope roots.
pub struct Heap<O> {
    slots: Vec<Slot<O>>,
    free: Vec<u32>,
    roots: FxHashSet<RawGc>,
    in_scope: InScopeRoots,
    since_collection: usize,
    next_generation: u32,
    config: GcConfig,
    stats: GcStats,
}

impl<O: Trace> Default for Heap<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Trace> Heap<O> {
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    pub fn with_config(config: GcConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            roots: FxHashSet::default(),
            in_scope: Rc::new(RefCell::new(FxHashMap::default())),
            since_collection: 0,
            next_generation: 0,
            config,
            stats: GcStats::default(),
        }
    }

    pub fn config(&self) -> GcConfig {
        self.config
    }

    pub fn stats(&self) -> GcStats {
        self.stats
    }

    /// Number of objects currently in the heap, reachable or not.
    pub fn live_count(&self) -> usize {
        self.stats.live
    }

    /// Allocate an object and return it wrapped in a scoped handle.
    ///
    /// May run a full collection before returning; the new object is rooted
    /// by the returned handle, every other object must be reachable from a
    /// root or a live [`Scoped`] to survive.
    pub fn alloc<T: Managed<O>>(&mut self, value: T) -> Scoped<T> {
        let raw = self.insert(value.into_object());
        let scoped = Scoped::new(raw, &self.in_scope);
        self.since_collection += 1;
        if self.config.threshold > 0 && self.since_collection >= self.config.threshold {
            self.collect();
        }
        scoped
    }

    /// Allocate an object and register it as a permanent root.
    pub fn alloc_root<T: Managed<O>>(&mut self, value: T) -> Gc<T> {
        let scoped = self.alloc(value);
        self.add_root(scoped.get());
        scoped.get()
    }

    fn insert(&mut self, object: O) -> RawGc {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let entry = Entry {
            marked: false,
            object,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Slot {
                    generation,
                    entry: Some(entry),
                };
                index
            }
            None => {
                self.slots.push(Slot {
                    generation,
                    entry: Some(entry),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.stats.allocated += 1;
        self.stats.live += 1;
        RawGc { index, generation }
    }

    fn entry(&self, raw: RawGc) -> Option<&Entry<O>> {
        self.slots
            .get(raw.index as usize)
            .filter(|slot| slot.generation == raw.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, raw: RawGc) -> Option<&mut Entry<O>> {
        self.slots
            .get_mut(raw.index as usize)
            .filter(|slot| slot.generation == raw.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Whether the handle still refers to a live object.
    pub fn contains<T>(&self, gc: Gc<T>) -> bool {
        self.entry(gc.raw()).is_some()
    }

    pub fn try_get<T: Managed<O>>(&self, gc: Gc<T>) -> Option<&T> {
        self.entry(gc.raw()).and_then(|entry| T::downcast(&entry.object))
    }

    pub fn try_get_mut<T: Managed<O>>(&mut self, gc: Gc<T>) -> Option<&mut T> {
        self.entry_mut(gc.raw())
            .and_then(|entry| T::downcast_mut(&mut entry.object))
    }

    /// Resolve a handle.
    ///
    /// # Panics
    ///
    /// Panics if the object was swept or the handle's type does not match the
    /// stored object; both mean a missing root in the caller.
    pub fn get<T: Managed<O>>(&self, gc: Gc<T>) -> &T {
        match self.try_get(gc) {
            Some(object) => object,
            None => panic!("dangling heap reference {:?}", gc.raw()),
        }
    }

    /// Mutable variant of [`Heap::get`].
    pub fn get_mut<T: Managed<O>>(&mut self, gc: Gc<T>) -> &mut T {
        match self.try_get_mut(gc) {
            Some(object) => object,
            None => panic!("dangling heap reference {:?}", gc.raw()),
        }
    }

    /// Wrap an existing handle in a new scope.
    pub fn scoped<T>(&self, gc: Gc<T>) -> Scoped<T> {
        Scoped::new(gc.raw(), &self.in_scope)
    }

    pub fn add_root<T>(&mut self, gc: Gc<T>) {
        self.roots.insert(gc.raw());
    }

    pub fn remove_root<T>(&mut self, gc: Gc<T>) {
        self.roots.remove(&gc.raw());
    }

    pub fn is_root<T>(&self, gc: Gc<T>) -> bool {
        self.roots.contains(&gc.raw())
    }

    /// Whether a live scoped handle currently roots the object.
    pub fn is_in_scope<T>(&self, gc: Gc<T>) -> bool {
        self.in_scope.borrow().contains_key(&gc.raw())
    }

    /// Run a full mark-and-sweep. Returns the number of freed objects.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn collect(&mut self) -> usize {
        self.since_collection = 0;
        self.stats.collections += 1;
        self.mark();
        let freed = self.sweep();
        self.stats.freed += freed as u64;
        if !self.slots.is_empty() && (self.slots.len() - self.stats.live) * 2 > self.slots.len() {
            self.compact();
        }
        tracing::debug!(freed, live = self.stats.live, "gc: collection finished");
        freed
    }

    fn mark(&mut self) {
        for entry in self.slots.iter_mut().filter_map(|slot| slot.entry.as_mut()) {
            entry.marked = false;
        }

        let mut pending: Vec<RawGc> = self.roots.iter().copied().collect();
        pending.extend(self.in_scope.borrow().keys().copied());

        while let Some(raw) = pending.pop() {
            let Some(entry) = self
                .slots
                .get_mut(raw.index as usize)
                .filter(|slot| slot.generation == raw.generation)
                .and_then(|slot| slot.entry.as_mut())
            else {
                continue;
            };
            if entry.marked {
                continue;
            }
            entry.marked = true;
            entry.object.trace(&mut Tracer::new(&mut pending));
        }
    }

    fn sweep(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.as_ref().is_some_and(|entry| !entry.marked) {
                slot.entry = None;
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.stats.live -= freed;
        freed
    }

    /// Drop trailing vacant slots and release spare storage.
    fn compact(&mut self) {
        while self.slots.last().is_some_and(|slot| slot.entry.is_none()) {
            self.slots.pop();
        }
        let len = self.slots.len() as u32;
        self.free.retain(|&index| index < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
        self.stats.compactions += 1;
    }
}
