use alloc::vec;
use alloc::vec::Vec;
use core::ops::Index;
use core::ops::IndexMut;

use crate::error::Error;
use crate::error::Result;

/// Index of an entry slot, standing in for a node pointer.
///
/// Bucket heads, chain links and order links all store `Ptr`s, so splicing a
/// node in or out only rewrites indices and never moves the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Ptr(usize);

impl Ptr {
    #[inline(always)]
    pub(crate) const fn null() -> Self {
        Ptr(usize::MAX)
    }

    #[inline(always)]
    pub(crate) const fn is_null(self) -> bool {
        self.0 == usize::MAX
    }
}

impl Default for Ptr {
    fn default() -> Self {
        Ptr::null()
    }
}

/// A live table entry.
///
/// `next` is the bucket chain link. `links` is extra per-entry state owned by
/// the wrapping set (`()` for the plain set, order links for the linked set).
#[derive(Debug)]
pub(crate) struct Node<V, L> {
    pub(crate) hash: u64,
    pub(crate) value: V,
    pub(crate) next: Ptr,
    pub(crate) links: L,
}

#[derive(Debug)]
enum Slot<V, L> {
    Occupied(Node<V, L>),
    Vacant { next_free: Ptr },
}

/// Slot storage with an intrusive free list.
///
/// Freed slots are reused before the backing vector grows, so a `Ptr` stays
/// valid exactly as long as the node it was handed out for.
#[derive(Debug)]
pub(crate) struct Arena<V, L> {
    slots: Vec<Slot<V, L>>,
    free: Ptr,
    len: usize,
}

impl<V, L> Arena<V, L> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Ptr::null(),
            len: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Makes sure the next [`insert`](Self::insert) will not allocate.
    pub(crate) fn try_reserve_one(&mut self) -> Result<()> {
        if !self.free.is_null() {
            return Ok(());
        }
        self.slots
            .try_reserve(1)
            .map_err(|_| Error::alloc::<Slot<V, L>>(self.slots.len() + 1))
    }

    /// Stores `node`, reusing a freed slot if one exists.
    pub(crate) fn insert(&mut self, node: Node<V, L>) -> Ptr {
        self.len += 1;
        if self.free.is_null() {
            self.slots.push(Slot::Occupied(node));
            return Ptr(self.slots.len() - 1);
        }

        let ptr = self.free;
        match core::mem::replace(&mut self.slots[ptr.0], Slot::Occupied(node)) {
            Slot::Vacant { next_free } => self.free = next_free,
            Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
        }
        ptr
    }

    /// Releases the slot at `ptr` and returns its node.
    pub(crate) fn remove(&mut self, ptr: Ptr) -> Node<V, L> {
        let vacant = Slot::Vacant {
            next_free: self.free,
        };
        match core::mem::replace(&mut self.slots[ptr.0], vacant) {
            Slot::Occupied(node) => {
                self.free = ptr;
                self.len -= 1;
                node
            }
            Slot::Vacant { .. } => panic!("removed a vacant arena slot"),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free = Ptr::null();
        self.len = 0;
    }

    /// Empties the arena, yielding its values in slot order.
    ///
    /// The arena is already empty when this returns; values not yet yielded
    /// are dropped with the iterator.
    pub(crate) fn drain(&mut self) -> DrainValues<'_, V, L> {
        let remaining = self.len;
        self.free = Ptr::null();
        self.len = 0;
        DrainValues {
            slots: self.slots.drain(..),
            remaining,
        }
    }

    /// Consumes the arena, yielding its values in slot order.
    pub(crate) fn into_values(self) -> IntoValues<V, L> {
        IntoValues {
            remaining: self.len,
            slots: self.slots.into_iter(),
        }
    }
}

impl<V, L> Slot<V, L> {
    fn into_value(self) -> Option<V> {
        match self {
            Slot::Occupied(node) => Some(node.value),
            Slot::Vacant { .. } => None,
        }
    }
}

/// Draining iterator returned by [`Arena::drain`].
pub(crate) struct DrainValues<'a, V, L> {
    slots: vec::Drain<'a, Slot<V, L>>,
    remaining: usize,
}

impl<V, L> Iterator for DrainValues<'_, V, L> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.slots.find_map(Slot::into_value)?;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Owning iterator returned by [`Arena::into_values`].
pub(crate) struct IntoValues<V, L> {
    slots: vec::IntoIter<Slot<V, L>>,
    remaining: usize,
}

impl<V, L> Iterator for IntoValues<V, L> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.slots.find_map(Slot::into_value)?;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, L> Index<Ptr> for Arena<V, L> {
    type Output = Node<V, L>;

    #[inline]
    fn index(&self, ptr: Ptr) -> &Self::Output {
        match &self.slots[ptr.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("dangling arena pointer"),
        }
    }
}

impl<V, L> IndexMut<Ptr> for Arena<V, L> {
    #[inline]
    fn index_mut(&mut self, ptr: Ptr) -> &mut Self::Output {
        match &mut self.slots[ptr.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("dangling arena pointer"),
        }
    }
}
