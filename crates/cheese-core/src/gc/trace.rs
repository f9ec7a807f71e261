//! Reachability reporting.

use super::handle::{Gc, RawGc};

/// Collects the outgoing references of an object during marking.
pub struct Tracer<'a> {
    pending: &'a mut Vec<RawGc>,
}

impl<'a> Tracer<'a> {
    pub(crate) fn new(pending: &'a mut Vec<RawGc>) -> Self {
        Self { pending }
    }

    /// Report a reference to `target`.
    #[inline]
    pub fn mark<T>(&mut self, target: Gc<T>) {
        self.pending.push(target.raw());
    }

    #[inline]
    pub fn mark_raw(&mut self, target: RawGc) {
        self.pending.push(target);
    }
}

/// An object that can report the heap objects it references.
pub trait Trace {
    fn trace(&self, tracer: &mut Tracer<'_>);
}

impl<T> Trace for Gc<T> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark(*self);
    }
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        if let Some(inner) = self {
            inner.trace(tracer);
        }
    }
}

impl<T: Trace> Trace for [T] {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        for item in self {
            item.trace(tracer);
        }
    }
}

impl<T: Trace> Trace for Vec<T> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        self.as_slice().trace(tracer);
    }
}

impl<A: Trace, B: Trace> Trace for (A, B) {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        self.0.trace(tracer);
        self.1.trace(tracer);
    }
}

/// Conversion between a concrete object kind and the heap's object type.
///
/// A heap stores one object enum `O`; each variant payload implements
/// `Managed<O>` so that typed handles can be resolved safely.
pub trait Managed<O>: Sized {
    fn into_object(self) -> O;
    fn downcast(object: &O) -> Option<&Self>;
    fn downcast_mut(object: &mut O) -> Option<&mut Self>;
}
