//! Tracing garbage collector that owns every semantic object.
//!
//! # Architecture
//!
//! Mark-and-sweep over an arena of generation-tagged slots:
//!
//! - **Handles**: [`Gc<T>`] is a copyable typed index into the [`Heap`]. It
//!   never owns anything; a handle to a swept object simply stops resolving.
//!
//! - **Two root classes**: permanent roots (type singletons, the root
//!   structure, import tables) registered with [`Heap::add_root`], and
//!   transient in-scope roots held by live [`Scoped`] handles. Releasing the
//!   last copy of a scoped handle removes the rooting, it never frees.
//!
//! - **Synchronous collection**: every allocation bumps a counter; once it
//!   passes [`GcConfig::threshold`] a full mark-and-sweep runs before the
//!   allocation returns. The freshly allocated object is already scoped at
//!   that point, so it always survives its own allocation.
//!
//! - **Precise tracing**: objects implement [`Trace`] and report their
//!   outgoing handles to a [`Tracer`]. Marking uses an explicit worklist, and
//!   the mark bit doubles as a cycle guard.
//!
//! # Example
//!
//! ```
//! use cheese_core::gc::{Gc, Heap, Managed, Trace, Tracer};
//!
//! struct Cell(Option<Gc<Cell>>);
//!
//! impl Trace for Cell {
//!     fn trace(&self, tracer: &mut Tracer<'_>) {
//!         self.0.trace(tracer);
//!     }
//! }
//!
//! impl Managed<Cell> for Cell {
//!     fn into_object(self) -> Cell { self }
//!     fn downcast(object: &Cell) -> Option<&Cell> { Some(object) }
//!     fn downcast_mut(object: &mut Cell) -> Option<&mut Cell> { Some(object) }
//! }
//!
//! let mut heap: Heap<Cell> = Heap::new();
//! let kept = heap.alloc(Cell(None));
//! let dropped = heap.alloc(Cell(None)).get();
//! heap.collect();
//! assert!(heap.contains(kept.get()));
//! assert!(!heap.contains(dropped));
//! ```

mod handle;
mod heap;
mod trace;

pub use handle::{Gc, RawGc, Scoped};
pub use heap::{GcConfig, GcStats, Heap};
pub use trace::{Managed, Trace, Tracer};
