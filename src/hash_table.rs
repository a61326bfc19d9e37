use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;

use crate::arena::Arena;
use crate::arena::DrainValues;
use crate::arena::IntoValues;
use crate::arena::Node;
use crate::arena::Ptr;
use crate::config::TableConfig;
use crate::error::Error;
use crate::error::Result;

/// Folds the upper bits of a hash into the lower bits.
///
/// Bucket indices only look at the low bits, so without this, hashes that
/// differ only above the mask would all land in the same chain.
#[inline(always)]
pub(crate) fn spread(hash: u64) -> u64 {
    hash ^ (hash >> 16)
}

fn alloc_buckets(count: usize) -> Result<Vec<Ptr>> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(count)
        .map_err(|_| Error::alloc::<Ptr>(count))?;
    buckets.resize(count, Ptr::null());
    Ok(buckets)
}

/// A separately-chained hash table.
///
/// Each bucket heads a singly-linked chain of nodes. Nodes live in an
/// [`Arena`] and are linked by [`Ptr`], so the bucket array can be rebuilt
/// without moving any value. New nodes are appended to the tail of their
/// chain, which keeps each chain in insertion order.
///
/// The table only sees hashes and equality predicates. Callers hash their
/// values however they like; the table spreads that hash once and stores the
/// result alongside the value, so it is never recomputed.
///
/// `L` is per-node state owned by the caller. The linked set stores its order
/// links there; the plain set uses `()`.
pub(crate) struct HashTable<V, L = ()> {
    buckets: Vec<Ptr>,
    nodes: Arena<V, L>,
    config: TableConfig,
    max_buckets: usize,
    grow_at: usize,
}

impl<V, L> Debug for HashTable<V, L>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Chain<'a, V, L>(&'a HashTable<V, L>, Ptr);

        impl<V: Debug, L> Debug for Chain<'_, V, L> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_list()
                    .entries(self.0.chain(self.1).map(|ptr| &self.0.nodes[ptr].value))
                    .finish()
            }
        }

        f.debug_struct("HashTable")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("grow_at", &self.grow_at)
            .field(
                "buckets",
                &self
                    .buckets
                    .iter()
                    .filter(|head| !head.is_null())
                    .map(|&head| Chain(self, head))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<V, L> HashTable<V, L> {
    /// Creates an empty table sized and bounded by `config`.
    pub(crate) fn try_with_config(config: TableConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.bucket_count()?;

        Ok(Self {
            buckets: alloc_buckets(capacity)?,
            nodes: Arena::new(),
            max_buckets: config.bucket_limit(),
            grow_at: config.grow_threshold(capacity),
            config,
        })
    }

    /// The policy this table was created with.
    pub(crate) fn config(&self) -> TableConfig {
        self.config
    }

    /// Number of live entries.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    /// Number of buckets. Always a power of two.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u64) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    /// Walks the chain starting at `head`.
    fn chain(&self, head: Ptr) -> impl Iterator<Item = Ptr> + '_ {
        core::iter::successors(Some(head).filter(|p| !p.is_null()), |&ptr| {
            Some(self.nodes[ptr].next).filter(|p| !p.is_null())
        })
    }

    #[inline]
    pub(crate) fn value(&self, ptr: Ptr) -> &V {
        &self.nodes[ptr].value
    }

    #[inline]
    pub(crate) fn links(&self, ptr: Ptr) -> &L {
        &self.nodes[ptr].links
    }

    #[inline]
    pub(crate) fn links_mut(&mut self, ptr: Ptr) -> &mut L {
        &mut self.nodes[ptr].links
    }

    /// Finds the node for `hash` that satisfies `eq`.
    pub(crate) fn find_ptr(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<Ptr> {
        let hash = spread(hash);
        self.chain(self.buckets[self.bucket_index(hash)])
            .find(|&ptr| {
                let node = &self.nodes[ptr];
                node.hash == hash && eq(&node.value)
            })
    }

    pub(crate) fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        self.find_ptr(hash, eq).map(|ptr| self.value(ptr))
    }

    /// Looks up `hash`/`eq`, returning either the matching node or the place a
    /// new node would be appended.
    pub(crate) fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V, L> {
        let hash = spread(hash);
        let bucket = self.bucket_index(hash);

        let mut prev = Ptr::null();
        let mut cursor = self.buckets[bucket];
        while !cursor.is_null() {
            let node = &self.nodes[cursor];
            if node.hash == hash && eq(&node.value) {
                return Entry::Occupied(OccupiedEntry {
                    table: self,
                    bucket,
                    prev,
                    ptr: cursor,
                });
            }
            prev = cursor;
            cursor = node.next;
        }

        Entry::Vacant(VacantEntry {
            table: self,
            hash,
            bucket,
            tail: prev,
        })
    }

    /// Removes and returns the node matching `hash`/`eq`.
    pub(crate) fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<(V, L)> {
        match self.entry(hash, eq) {
            Entry::Occupied(entry) => Some(entry.remove()),
            Entry::Vacant(_) => None,
        }
    }

    /// Removes the node at `ptr`, which must be live.
    pub(crate) fn remove_ptr(&mut self, ptr: Ptr) -> (V, L) {
        let bucket = self.bucket_index(self.nodes[ptr].hash);
        let mut prev = Ptr::null();
        for candidate in self.chain(self.buckets[bucket]) {
            if candidate == ptr {
                break;
            }
            prev = candidate;
        }
        self.splice_out(bucket, prev, ptr)
    }

    fn splice_out(&mut self, bucket: usize, prev: Ptr, ptr: Ptr) -> (V, L) {
        let node = self.nodes.remove(ptr);
        if prev.is_null() {
            self.buckets[bucket] = node.next;
        } else {
            self.nodes[prev].next = node.next;
        }
        (node.value, node.links)
    }

    /// Drops every entry. The bucket count is kept.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.buckets.fill(Ptr::null());
    }

    /// Allocates the doubled bucket array without touching the table.
    fn prepare_grow(&self) -> Result<Vec<Ptr>> {
        let new_capacity = self
            .capacity()
            .checked_mul(2)
            .filter(|&capacity| capacity <= self.max_buckets)
            .ok_or(Error::CapacityOverflow)?;
        alloc_buckets(new_capacity)
    }

    /// Moves every chain into `new_buckets`, which must be exactly twice the
    /// current bucket count.
    ///
    /// Each old chain `i` splits into two: nodes whose hash has the
    /// `old_capacity` bit clear stay at `i`, the rest go to `i + old_capacity`.
    /// Both halves are built by appending, so relative order inside every chain
    /// survives the split.
    fn split_into(&mut self, new_buckets: Vec<Ptr>) {
        debug_assert_eq!(new_buckets.len(), self.buckets.len() * 2);

        let old_buckets = core::mem::replace(&mut self.buckets, new_buckets);
        let old_capacity = old_buckets.len();
        let new_mask = self.buckets.len() - 1;

        for (index, head) in old_buckets.into_iter().enumerate() {
            if head.is_null() {
                continue;
            }

            let first = &self.nodes[head];
            if first.next.is_null() {
                self.buckets[first.hash as usize & new_mask] = head;
                continue;
            }

            let mut low_head = Ptr::null();
            let mut low_tail = Ptr::null();
            let mut high_head = Ptr::null();
            let mut high_tail = Ptr::null();

            let mut cursor = head;
            while !cursor.is_null() {
                let node = &self.nodes[cursor];
                let next = node.next;
                if (node.hash as usize & old_capacity) == 0 {
                    if low_tail.is_null() {
                        low_head = cursor;
                    } else {
                        self.nodes[low_tail].next = cursor;
                    }
                    low_tail = cursor;
                } else {
                    if high_tail.is_null() {
                        high_head = cursor;
                    } else {
                        self.nodes[high_tail].next = cursor;
                    }
                    high_tail = cursor;
                }
                cursor = next;
            }

            if !low_tail.is_null() {
                self.nodes[low_tail].next = Ptr::null();
                self.buckets[index] = low_head;
            }
            if !high_tail.is_null() {
                self.nodes[high_tail].next = Ptr::null();
                self.buckets[index + old_capacity] = high_head;
            }
        }

        self.grow_at = self.config.grow_threshold(self.buckets.len());
        log::trace!(
            "split resize: {} -> {} buckets, {} entries, next growth at {}",
            old_capacity,
            self.buckets.len(),
            self.len(),
            self.grow_at
        );
    }

    /// Doubles the bucket array until `additional` more entries fit without
    /// triggering growth.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len()
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow)?;
        while required >= self.grow_at {
            let new_buckets = self.prepare_grow()?;
            self.split_into(new_buckets);
        }
        Ok(())
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&V) -> bool) {
        for bucket in 0..self.buckets.len() {
            let mut prev = Ptr::null();
            let mut cursor = self.buckets[bucket];
            while !cursor.is_null() {
                let node = &self.nodes[cursor];
                let next = node.next;
                if keep(&node.value) {
                    prev = cursor;
                } else {
                    self.splice_out(bucket, prev, cursor);
                }
                cursor = next;
            }
        }
    }

    /// Iterates values in bucket order, then chain order within a bucket.
    pub(crate) fn iter(&self) -> Iter<'_, V, L> {
        Iter {
            table: self,
            bucket: 0,
            cursor: Ptr::null(),
            remaining: self.len(),
        }
    }

    /// Removes every entry, yielding the values in an arbitrary order.
    pub(crate) fn drain(&mut self) -> DrainValues<'_, V, L> {
        self.buckets.fill(Ptr::null());
        self.nodes.drain()
    }

    /// Consumes the table, yielding the values in an arbitrary order.
    pub(crate) fn into_values(self) -> IntoValues<V, L> {
        self.nodes.into_values()
    }

    /// Length of every chain, indexed by bucket.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn chain_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().map(|&head| self.chain(head).count())
    }

    /// Histogram of chain lengths: `hist[n]` is the number of buckets holding
    /// exactly `n` entries.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn chain_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; 1];
        for length in self.chain_lengths() {
            if length >= hist.len() {
                hist.resize(length + 1, 0);
            }
            hist[length] += 1;
        }
        hist
    }

    /// Summary statistics about table occupancy.
    #[cfg(any(test, feature = "stats"))]
    pub(crate) fn stats(&self) -> TableStats {
        let hist = self.chain_histogram();
        let occupied_buckets = self.capacity() - hist[0];
        TableStats {
            len: self.len(),
            capacity: self.capacity(),
            grow_at: self.grow_at,
            occupied_buckets,
            longest_chain: hist.len() - 1,
            load_factor: self.len() as f64 / self.capacity() as f64,
            mean_chain: if occupied_buckets == 0 {
                0.0
            } else {
                self.len() as f64 / occupied_buckets as f64
            },
        }
    }
}

impl<V, L> HashTable<V, L> {
    /// Inserts through the vacant path, growing if the trigger fires.
    ///
    /// Every fallible step happens before the table is modified: the node slot
    /// is reserved and, if this insertion reaches the growth threshold, the
    /// doubled bucket array is allocated up front.
    fn insert_vacant(
        &mut self,
        hash: u64,
        bucket: usize,
        tail: Ptr,
        value: V,
        links: L,
    ) -> Result<Ptr> {
        let prepared = self.nodes.try_reserve_one().and_then(|()| {
            if self.len() + 1 >= self.grow_at {
                self.prepare_grow().map(Some)
            } else {
                Ok(None)
            }
        });
        let grown = match prepared {
            Ok(grown) => grown,
            Err(err) => {
                log::debug!(
                    "insert refused at {} entries / {} buckets: {}",
                    self.len(),
                    self.capacity(),
                    err
                );
                return Err(err);
            }
        };

        let ptr = self.nodes.insert(Node {
            hash,
            value,
            next: Ptr::null(),
            links,
        });
        if tail.is_null() {
            self.buckets[bucket] = ptr;
        } else {
            self.nodes[tail].next = ptr;
        }

        if let Some(new_buckets) = grown {
            self.split_into(new_buckets);
        }

        Ok(ptr)
    }
}

/// Result of [`HashTable::entry`].
pub(crate) enum Entry<'a, V, L> {
    /// A node matched.
    Occupied(OccupiedEntry<'a, V, L>),
    /// No node matched.
    Vacant(VacantEntry<'a, V, L>),
}

/// The tail of the chain a new node for this hash would be appended to.
pub(crate) struct VacantEntry<'a, V, L> {
    table: &'a mut HashTable<V, L>,
    hash: u64,
    bucket: usize,
    tail: Ptr,
}

impl<V, L> VacantEntry<'_, V, L> {
    /// Appends `value` to the chain, growing the table if this insertion hits
    /// the load factor. On error the table is unchanged and `value` is dropped.
    pub(crate) fn try_insert(self, value: V, links: L) -> Result<Ptr> {
        self.table
            .insert_vacant(self.hash, self.bucket, self.tail, value, links)
    }
}

/// A live node together with its chain predecessor.
pub(crate) struct OccupiedEntry<'a, V, L> {
    table: &'a mut HashTable<V, L>,
    bucket: usize,
    prev: Ptr,
    ptr: Ptr,
}

impl<V, L> OccupiedEntry<'_, V, L> {
    pub(crate) fn get_mut(&mut self) -> &mut V {
        &mut self.table.nodes[self.ptr].value
    }

    /// Splices the node out of its chain and returns its contents.
    pub(crate) fn remove(self) -> (V, L) {
        self.table.splice_out(self.bucket, self.prev, self.ptr)
    }
}

/// Bucket-order iterator over a [`HashTable`].
pub(crate) struct Iter<'a, V, L> {
    table: &'a HashTable<V, L>,
    bucket: usize,
    cursor: Ptr,
    remaining: usize,
}

impl<V, L> Clone for Iter<'_, V, L> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, V, L> Iterator for Iter<'a, V, L> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        while self.cursor.is_null() {
            self.cursor = *self.table.buckets.get(self.bucket)?;
            self.bucket += 1;
        }

        let node = &self.table.nodes[self.cursor];
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, L> ExactSizeIterator for Iter<'_, V, L> {}

impl<V, L> FusedIterator for Iter<'_, V, L> {}

/// Occupancy summary returned by the `stats` accessors.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    /// Live entries.
    pub len: usize,
    /// Bucket count.
    pub capacity: usize,
    /// Entry count that triggers the next doubling.
    pub grow_at: usize,
    /// Buckets holding at least one entry.
    pub occupied_buckets: usize,
    /// Length of the longest chain.
    pub longest_chain: usize,
    /// `len / capacity`.
    pub load_factor: f64,
    /// Average chain length over non-empty buckets.
    pub mean_chain: f64,
}

#[cfg(all(feature = "stats", feature = "std"))]
impl TableStats {
    /// Prints the summary to stdout.
    pub fn print(&self) {
        println!("entries:          {}", self.len);
        println!("buckets:          {}", self.capacity);
        println!("next growth at:   {}", self.grow_at);
        println!("occupied buckets: {}", self.occupied_buckets);
        println!("longest chain:    {}", self.longest_chain);
        println!("load factor:      {:.3}", self.load_factor);
        println!("mean chain:       {:.3}", self.mean_chain);
    }
}
