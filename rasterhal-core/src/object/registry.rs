//! Shared object-index allocator.
//!
//! One `ObjectRegistry` belongs to a rasterizer and is shared by every
//! context created under any of its drivers. Each slot of the table holds
//! the OR of the [`ObjectType`] bits currently allocated there, so different
//! resource kinds can reuse the same slot number.
//!
//! Contexts keep private descriptor tables that must stay index-congruent
//! with the shared table. They register themselves as [`SlotObserver`]s and
//! the registry pushes every growth and release to them synchronously.
//! An observer that is borrowed when a broadcast arrives gets the event
//! queued instead; [`ObjectRegistry::deliver_pending`] hands it over once the
//! borrow ends, in arrival order.
//! Registries of sibling rasterizers can be linked so that the same logical
//! resource gets the same slot number in every backend.

use super::types::{ObjectKind, ObjectType, Slot};
use crate::error::{RasterError, Result};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Registry handle shared by a rasterizer and its contexts.
pub type SharedRegistry = Rc<RefCell<ObjectRegistry>>;

/// Receiver of registry broadcasts.
pub trait SlotObserver {
    /// The shared table now holds `len` slots.
    fn on_resize(&mut self, len: usize);

    /// `kind` was released at `slot`; any descriptor there must be dropped.
    fn on_release(&mut self, slot: Slot, kind: ObjectKind);
}

/// Registry broadcast to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotEvent {
    Resize(usize),
    Release(Slot, ObjectKind),
}

impl SlotEvent {
    fn apply(self, observer: &mut dyn SlotObserver) {
        match self {
            SlotEvent::Resize(len) => observer.on_resize(len),
            SlotEvent::Release(slot, kind) => observer.on_release(slot, kind),
        }
    }
}

/// Operation replayed on a linked registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkedOp {
    Acquire(ObjectKind, Slot),
    Release(Slot, ObjectKind),
}

impl LinkedOp {
    fn apply(self, other: &mut ObjectRegistry) {
        match self {
            LinkedOp::Acquire(kind, slot) => match other.acquire(kind, false) {
                Ok(theirs) if theirs != slot => log::warn!(
                    "Linked registry allocated {:?} at {} instead of {}",
                    kind,
                    theirs,
                    slot
                ),
                Ok(_) => {}
                Err(e) => log::warn!("Linked registry failed to mirror allocation: {}", e),
            },
            LinkedOp::Release(slot, kind) => {
                other.release(slot, kind, false);
            }
        }
    }
}

/// Weak broadcast target plus the events it could not take yet.
struct Subscriber<T: ?Sized, E> {
    target: Weak<RefCell<T>>,
    pending: Vec<E>,
}

impl<T: ?Sized, E> Subscriber<T, E> {
    fn new(target: Weak<RefCell<T>>) -> Self {
        Self {
            target,
            pending: Vec::new(),
        }
    }

    fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Queue `event`, then hand over the whole queue if the target is not
    /// borrowed. Returns `false` once the target is gone.
    fn deliver(&mut self, event: Option<E>, mut apply: impl FnMut(&mut T, E)) -> bool {
        let Some(strong) = self.target.upgrade() else {
            return false;
        };
        self.pending.extend(event);
        if self.pending.is_empty() {
            return true;
        }
        match strong.try_borrow_mut() {
            Ok(mut target) => {
                for event in self.pending.drain(..) {
                    apply(&mut *target, event);
                }
            }
            Err(_) => log::debug!(
                "Broadcast target busy, {} event(s) queued",
                self.pending.len()
            ),
        }
        true
    }
}

pub struct ObjectRegistry {
    table: Vec<ObjectType>,
    /// Per kind: no free slot of that kind exists below this index.
    first_free: [usize; ObjectKind::COUNT],
    observers: Vec<Subscriber<dyn SlotObserver, SlotEvent>>,
    linked: Vec<Subscriber<ObjectRegistry, LinkedOp>>,
    scratch: Vec<u8>,
    reserved_vertex_buffers: usize,
}

impl ObjectRegistry {
    /// Create a table of `initial_slots` entries.
    ///
    /// The first `reserved_vertex_buffers` slots are pre-marked as vertex
    /// buffers: they form the address space of the dynamic vertex-buffer
    /// pool and are never handed out by [`acquire`](Self::acquire).
    pub fn new(initial_slots: usize, reserved_vertex_buffers: usize) -> Self {
        let len = initial_slots.max(reserved_vertex_buffers + 1).max(2);
        let mut table = vec![ObjectType::empty(); len];
        for entry in &mut table[..reserved_vertex_buffers] {
            *entry = ObjectType::VERTEX_BUFFER;
        }

        let mut first_free = [1; ObjectKind::COUNT];
        first_free[ObjectKind::VertexBuffer.index()] = reserved_vertex_buffers.max(1);

        Self {
            table,
            first_free,
            observers: Vec::new(),
            linked: Vec::new(),
            scratch: Vec::new(),
            reserved_vertex_buffers,
        }
    }

    pub fn into_shared(self) -> SharedRegistry {
        Rc::new(RefCell::new(self))
    }

    /// Number of slots in the shared table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Occupancy bits of `slot`, `None` when out of range.
    pub fn entry(&self, slot: Slot) -> Option<ObjectType> {
        self.table.get(slot.index()).copied()
    }

    pub fn is_occupied(&self, slot: Slot, kind: ObjectKind) -> bool {
        self.entry(slot).is_some_and(|e| e.contains(kind.bit()))
    }

    /// Current first-free hint of `kind`.
    pub fn first_free(&self, kind: ObjectKind) -> usize {
        self.first_free[kind.index()]
    }

    /// Upper bound (exclusive) of the dynamic vertex-buffer range.
    pub fn reserved_vertex_buffers(&self) -> usize {
        self.reserved_vertex_buffers
    }

    /// Register a context (or anything else) to receive resize and release
    /// broadcasts. Dead observers are pruned on the next broadcast.
    pub fn register_observer(&mut self, observer: Weak<RefCell<dyn SlotObserver>>) {
        self.observers.push(Subscriber::new(observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.iter().filter(|o| o.is_alive()).count()
    }

    /// Number of broadcasts still queued for borrowed observers or linked
    /// registries.
    pub fn pending_count(&self) -> usize {
        let observers: usize = self.observers.iter().map(|o| o.pending.len()).sum();
        let linked: usize = self.linked.iter().map(|l| l.pending.len()).sum();
        observers + linked
    }

    /// Hand queued broadcasts to every observer and linked registry that is
    /// no longer borrowed. Returns `true` when nothing stays queued.
    pub fn deliver_pending(&mut self) -> bool {
        self.observers
            .retain_mut(|o| o.deliver(None, |observer, event| event.apply(observer)));
        self.linked
            .retain_mut(|l| l.deliver(None, |other, op| op.apply(other)));
        self.pending_count() == 0
    }

    /// Allocate the lowest free slot for `kind`.
    ///
    /// Grows the table when no free slot exists. With `warn_others`, the
    /// allocation is replayed on every linked registry.
    pub fn acquire(&mut self, kind: ObjectKind, warn_others: bool) -> Result<Slot> {
        let bit = kind.bit();
        let len = self.table.len();
        let start = self.first_free[kind.index()];

        let probe = (start..len)
            .find(|&i| !self.table[i].contains(bit))
            .unwrap_or_else(|| start.max(len));

        if probe >= len {
            self.grow(probe, kind)?;
        }

        self.table[probe] |= bit;
        self.first_free[kind.index()] = probe + 1;
        let slot = Slot::from(probe);

        if warn_others {
            self.broadcast_linked(LinkedOp::Acquire(kind, slot));
        }

        Ok(slot)
    }

    /// Release `kind` at `slot`.
    ///
    /// Returns `false` without side effects when the slot is out of range or
    /// does not hold `kind`.
    pub fn release(&mut self, slot: Slot, kind: ObjectKind, warn_others: bool) -> bool {
        let bit = kind.bit();
        match self.table.get_mut(slot.index()) {
            Some(entry) if entry.contains(bit) => entry.remove(bit),
            _ => return false,
        }

        self.notify(SlotEvent::Release(slot, kind));

        let hint = &mut self.first_free[kind.index()];
        if slot.index() < *hint {
            *hint = slot.index();
        }

        if warn_others {
            self.broadcast_linked(LinkedOp::Release(slot, kind));
        }

        true
    }

    /// Link a sibling registry. Linking twice is a no-op.
    pub fn link(&mut self, other: &SharedRegistry) {
        let weak = Rc::downgrade(other);
        if std::ptr::eq(other.as_ptr(), self as *const Self) {
            return;
        }
        if self.linked.iter().any(|l| l.target.ptr_eq(&weak)) {
            return;
        }
        self.linked.push(Subscriber::new(weak));
    }

    pub fn unlink(&mut self, other: &SharedRegistry) {
        let weak = Rc::downgrade(other);
        self.linked.retain(|l| !l.target.ptr_eq(&weak) && l.is_alive());
    }

    pub fn linked_count(&self) -> usize {
        self.linked.iter().filter(|l| l.is_alive()).count()
    }

    /// Scratch buffer of at least `size` bytes.
    ///
    /// The same storage is handed out on every call: its contents are
    /// overwritten by the next request.
    pub fn allocate_scratch(&mut self, size: usize) -> &mut [u8] {
        if self.scratch.len() < size {
            self.scratch.resize(size, 0);
        }
        &mut self.scratch[..size]
    }

    fn grow(&mut self, probe: usize, kind: ObjectKind) -> Result<()> {
        let old_len = self.table.len();
        let new_len = probe
            .checked_mul(2)
            .map(|l| l.max(old_len + 1))
            .ok_or(RasterError::SlotTableExhausted { kind, len: old_len })?;

        if u32::try_from(new_len).is_err() || self.table.try_reserve(new_len - old_len).is_err() {
            log::warn!("Object table exhausted at {} slots", old_len);
            return Err(RasterError::SlotTableExhausted { kind, len: old_len });
        }
        self.table.resize(new_len, ObjectType::empty());

        log::debug!("Object table grown from {} to {} slots", old_len, new_len);
        self.notify(SlotEvent::Resize(new_len));
        Ok(())
    }

    fn notify(&mut self, event: SlotEvent) {
        self.observers
            .retain_mut(|o| o.deliver(Some(event), |observer, event| event.apply(observer)));
    }

    fn broadcast_linked(&mut self, op: LinkedOp) {
        self.linked
            .retain_mut(|l| l.deliver(Some(op), |other, op| op.apply(other)));
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("len", &self.table.len())
            .field("first_free", &self.first_free)
            .field("observers", &self.observers.len())
            .field("linked", &self.linked.len())
            .field("pending", &self.pending_count())
            .finish()
    }
}
