//! Handles into the heap.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;

use rustc_hash::FxHashMap;

/// Untyped identity of a heap slot.
///
/// The generation is drawn from a heap-wide counter, so an index that gets
/// reused after a sweep never compares equal to a handle of the old object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawGc {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl RawGc {
    /// Slot index of the object.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Allocation generation of the object.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for RawGc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Typed, copyable, non-owning handle to a heap object.
pub struct Gc<T> {
    raw: RawGc,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Gc<T> {
    pub(crate) fn from_raw(raw: RawGc) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Untyped identity of this handle.
    #[inline]
    pub fn raw(self) -> RawGc {
        self.raw
    }
}

impl<T> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Gc<T> {}

impl<T> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Gc<T> {}

impl<T> PartialOrd for Gc<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Gc<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Gc<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gc({:?})", self.raw)
    }
}

/// Shared table of in-scope roots: slot identity to number of live scopes.
pub(crate) type InScopeRoots = Rc<RefCell<FxHashMap<RawGc, usize>>>;

struct ScopeGuard {
    raw: RawGc,
    roots: InScopeRoots,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let mut roots = self.roots.borrow_mut();
        if let Some(count) = roots.get_mut(&self.raw) {
            *count -= 1;
            if *count == 0 {
                roots.remove(&self.raw);
            }
        }
    }
}

/// Reference-counted handle that keeps its target in the in-scope root set.
///
/// Cloning shares the same rooting. Dropping the last clone removes the
/// target from the in-scope set; the object itself lives on until a
/// collection finds it unreachable.
pub struct Scoped<T> {
    guard: Rc<ScopeGuard>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Scoped<T> {
    pub(crate) fn new(raw: RawGc, roots: &InScopeRoots) -> Self {
        *roots.borrow_mut().entry(raw).or_insert(0) += 1;
        Self {
            guard: Rc::new(ScopeGuard {
                raw,
                roots: Rc::clone(roots),
            }),
            _marker: PhantomData,
        }
    }

    /// The handle this scope keeps alive.
    #[inline]
    pub fn get(&self) -> Gc<T> {
        Gc::from_raw(self.guard.raw)
    }
}

impl<T> Clone for Scoped<T> {
    fn clone(&self) -> Self {
        Self {
            guard: Rc::clone(&self.guard),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Scoped<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scoped({:?})", self.guard.raw)
    }
}

impl<T> From<&Scoped<T>> for Gc<T> {
    fn from(scoped: &Scoped<T>) -> Self {
        scoped.get()
    }
}
