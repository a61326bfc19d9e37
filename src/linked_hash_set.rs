use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use crate::DefaultHashBuilder;
use crate::arena::Ptr;
use crate::config::TableConfig;
use crate::error::Result;
use crate::hash_set::HashSet;
use crate::hash_table::Entry;
use crate::hash_table::HashTable;
use crate::set::Set;
use crate::set::set_eq;

/// Neighbours in insertion order, stored inside every table node.
#[derive(Debug, Clone, Copy)]
struct OrderLinks {
    prev: Ptr,
    next: Ptr,
}

/// A hash set that remembers insertion order.
///
/// `LinkedHashSet` uses exactly the same chained table as
/// [`HashSet`](crate::HashSet), and additionally threads a doubly-linked list
/// through its nodes. Both structures are updated in the same call, so
/// iteration always yields the live values oldest first, no matter how many
/// times the bucket array has grown.
///
/// Re-inserting a value that is already present does not move it.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use chain_hash::LinkedHashSet;
///
/// let mut set: LinkedHashSet<&str> = LinkedHashSet::new();
/// set.insert("c");
/// set.insert("a");
/// set.insert("b");
/// set.insert("c");
///
/// let order: Vec<_> = set.iter().copied().collect();
/// assert_eq!(order, ["c", "a", "b"]);
/// # }
/// ```
pub struct LinkedHashSet<T, S = DefaultHashBuilder> {
    table: HashTable<T, OrderLinks>,
    head: Ptr,
    tail: Ptr,
    hash_builder: S,
}

impl<T, S> Clone for LinkedHashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Builds an independent copy by re-inserting every value, oldest first,
    /// into a fresh table with the same configuration.
    fn clone(&self) -> Self {
        let mut set = Self::build(self.table.config(), self.hash_builder.clone());
        set.extend(self.iter().cloned());
        set
    }
}

impl<T, S, S2> PartialEq<LinkedHashSet<T, S2>> for LinkedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &LinkedHashSet<T, S2>) -> bool {
        set_eq(self, other)
    }
}

impl<T, S, S2> PartialEq<HashSet<T, S2>> for LinkedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &HashSet<T, S2>) -> bool {
        set_eq(self, other)
    }
}

impl<T, S> Eq for LinkedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

impl<T, S> Debug for LinkedHashSet<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> LinkedHashSet<T, S> {
    fn build(config: TableConfig, hash_builder: S) -> Self {
        match Self::try_with_config_and_hasher(config, hash_builder) {
            Ok(set) => set,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a new linked hash set with the given hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::build(TableConfig::new(), hash_builder)
    }

    /// Creates a new linked hash set with at least `capacity` buckets and the
    /// given hasher builder.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::build(TableConfig::with_initial_capacity(capacity), hash_builder)
    }

    /// Creates a new linked hash set with an explicit sizing and growth
    /// policy.
    ///
    /// Returns an error if `config` fails [`TableConfig::validate`] or the
    /// initial bucket array cannot be allocated.
    pub fn try_with_config_and_hasher(config: TableConfig, hash_builder: S) -> Result<Self> {
        Ok(Self {
            table: HashTable::try_with_config(config)?,
            head: Ptr::null(),
            tail: Ptr::null(),
            hash_builder,
        })
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current number of buckets. See
    /// [`HashSet::capacity`](crate::HashSet::capacity).
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the load factor this set grows at.
    pub fn load_factor(&self) -> f32 {
        self.table.config().load_factor
    }

    /// Returns the sizing and growth policy this set was created with.
    pub fn config(&self) -> TableConfig {
        self.table.config()
    }

    /// Returns a reference to the set's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all elements from the set, keeping its bucket count.
    pub fn clear(&mut self) {
        self.table.clear();
        self.head = Ptr::null();
        self.tail = Ptr::null();
    }

    /// Returns an iterator over the values in insertion order.
    ///
    /// The iterator is double-ended, so `iter().rev()` walks newest first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            table: &self.table,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    /// Returns the oldest value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::LinkedHashSet;
    ///
    /// let mut set: LinkedHashSet<i32> = LinkedHashSet::new();
    /// assert_eq!(set.front(), None);
    /// set.insert(3);
    /// set.insert(1);
    /// assert_eq!(set.front(), Some(&3));
    /// assert_eq!(set.back(), Some(&1));
    /// # }
    /// ```
    pub fn front(&self) -> Option<&T> {
        (!self.head.is_null()).then(|| self.table.value(self.head))
    }

    /// Returns the newest value.
    pub fn back(&self) -> Option<&T> {
        (!self.tail.is_null()).then(|| self.table.value(self.tail))
    }

    /// Removes and returns the oldest value.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.head.is_null() {
            return None;
        }
        Some(self.remove_ptr(self.head))
    }

    /// Removes and returns the newest value.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.tail.is_null() {
            return None;
        }
        Some(self.remove_ptr(self.tail))
    }

    /// Returns a cursor positioned at the oldest value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::LinkedHashSet;
    ///
    /// let mut set: LinkedHashSet<i32> = (1..=5).collect();
    /// let mut cursor = set.cursor_front_mut();
    /// while let Some(&v) = cursor.current() {
    ///     if v % 2 == 0 {
    ///         cursor.remove_current();
    ///     } else {
    ///         cursor.move_next();
    ///     }
    /// }
    /// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 3, 5]);
    /// # }
    /// ```
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, S> {
        CursorMut {
            current: self.head,
            set: self,
        }
    }

    /// Returns an iterator that removes and yields all values, oldest first.
    ///
    /// Values not yet yielded are removed when the iterator is dropped.
    pub fn drain(&mut self) -> Drain<'_, T, S> {
        Drain { set: self }
    }

    /// Retains only the elements specified by the predicate, visiting them
    /// in insertion order. The survivors keep their relative order.
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        let mut cursor = self.cursor_front_mut();
        while let Some(value) = cursor.current() {
            if f(value) {
                cursor.move_next();
            } else {
                cursor.remove_current();
            }
        }
    }

    /// Returns the chain-length histogram of the underlying table.
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> alloc::vec::Vec<usize> {
        self.table.chain_histogram()
    }

    /// Returns occupancy statistics for the underlying table.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> crate::TableStats {
        self.table.stats()
    }

    fn link_last(&mut self, ptr: Ptr) {
        if self.tail.is_null() {
            self.head = ptr;
        } else {
            self.table.links_mut(self.tail).next = ptr;
        }
        self.tail = ptr;
    }

    /// Joins the neighbours of an entry the table has already spliced out.
    fn unlink(&mut self, links: OrderLinks) {
        if links.prev.is_null() {
            self.head = links.next;
        } else {
            self.table.links_mut(links.prev).next = links.next;
        }
        if links.next.is_null() {
            self.tail = links.prev;
        } else {
            self.table.links_mut(links.next).prev = links.prev;
        }
    }

    fn remove_ptr(&mut self, ptr: Ptr) -> T {
        let (value, links) = self.table.remove_ptr(ptr);
        self.unlink(links);
        value
    }
}

impl<T, S> LinkedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Adds a value at the back of the order if it is not already present.
    ///
    /// Returns whether the value was newly inserted. An existing equal value
    /// keeps both its contents and its position.
    ///
    /// # Panics
    ///
    /// Panics if the insertion needs the bucket array to grow past the
    /// configured maximum.
    pub fn insert(&mut self, value: T) -> bool {
        match self.try_insert(value) {
            Ok(inserted) => inserted,
            Err(err) => panic!("{err}"),
        }
    }

    /// Adds a value, reporting growth failures instead of panicking.
    ///
    /// On `Err` the set, including its order, is unchanged and `value` has
    /// been dropped.
    pub fn try_insert(&mut self, value: T) -> Result<bool> {
        let hash = self.hash_builder.hash_one(&value);
        let links = OrderLinks {
            prev: self.tail,
            next: Ptr::null(),
        };
        match self.table.entry(hash, |v| v == &value) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                let ptr = entry.try_insert(value, links)?;
                self.link_last(ptr);
                Ok(true)
            }
        }
    }

    /// Adds a value, replacing an equal one in place if present. Returns the
    /// replaced value.
    ///
    /// A replaced value keeps its position in the order; a new value goes to
    /// the back.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`insert`](Self::insert).
    pub fn replace(&mut self, value: T) -> Option<T> {
        let hash = self.hash_builder.hash_one(&value);
        let links = OrderLinks {
            prev: self.tail,
            next: Ptr::null(),
        };
        match self.table.entry(hash, |v| v == &value) {
            Entry::Occupied(mut entry) => Some(core::mem::replace(entry.get_mut(), value)),
            Entry::Vacant(entry) => match entry.try_insert(value, links) {
                Ok(ptr) => {
                    self.link_last(ptr);
                    None
                }
                Err(err) => panic!("{err}"),
            },
        }
    }

    /// Returns `true` if the set contains a value.
    pub fn contains(&self, value: &T) -> bool {
        let hash = self.hash_builder.hash_one(value);
        self.table.find_ptr(hash, |v| v == value).is_some()
    }

    /// Returns a reference to the value in the set, if any, that is equal to
    /// the given value.
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value)
    }

    /// Removes a value from the set. Returns whether the value was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Removes and returns the value in the set, if any, that is equal to the
    /// given one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::LinkedHashSet;
    ///
    /// let mut set: LinkedHashSet<i32> = [1, 2, 3].into_iter().collect();
    /// assert_eq!(set.take(&2), Some(2));
    /// assert_eq!(set.take(&2), None);
    /// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 3]);
    /// # }
    /// ```
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_builder.hash_one(value);
        let (value, links) = self.table.remove(hash, |v| v == value)?;
        self.unlink(links);
        Some(value)
    }

    /// Grows the bucket array ahead of time so that `additional` more values
    /// can be inserted without triggering growth.
    ///
    /// # Panics
    ///
    /// Panics if that would exceed the configured maximum capacity.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve(additional) {
            panic!("{err}");
        }
    }

    /// Fallible version of [`reserve`](Self::reserve).
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.table.try_reserve(additional)
    }

    /// Returns `true` if the set contains no elements in common with `other`.
    pub fn is_disjoint(&self, other: &LinkedHashSet<T, S>) -> bool {
        if self.len() <= other.len() {
            self.iter().all(|v| !other.contains(v))
        } else {
            other.iter().all(|v| !self.contains(v))
        }
    }

    /// Returns `true` if every element of `self` is in `other`.
    pub fn is_subset(&self, other: &LinkedHashSet<T, S>) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every element of `other` is in `self`.
    pub fn is_superset(&self, other: &LinkedHashSet<T, S>) -> bool {
        other.is_subset(self)
    }

    /// Returns an iterator over the union of `self` and `other`: all of
    /// `self` in order, then the values only `other` has, in `other`'s order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::LinkedHashSet;
    ///
    /// let a: LinkedHashSet<i32> = [3, 1].into_iter().collect();
    /// let b: LinkedHashSet<i32> = [2, 1, 4].into_iter().collect();
    /// let union: Vec<_> = a.union(&b).copied().collect();
    /// assert_eq!(union, [3, 1, 2, 4]);
    /// # }
    /// ```
    pub fn union<'a>(&'a self, other: &'a LinkedHashSet<T, S>) -> Union<'a, T, S> {
        Union {
            iter: self.iter(),
            rest: other.difference(self),
        }
    }

    /// Returns an iterator over the values of `self`, in order, that are also
    /// in `other`.
    pub fn intersection<'a>(&'a self, other: &'a LinkedHashSet<T, S>) -> Intersection<'a, T, S> {
        Intersection {
            iter: self.iter(),
            other,
        }
    }

    /// Returns an iterator over the values of `self`, in order, that are not
    /// in `other`.
    pub fn difference<'a>(&'a self, other: &'a LinkedHashSet<T, S>) -> Difference<'a, T, S> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Returns an iterator over the values in exactly one of `self` and
    /// `other`: `self`'s first, then `other`'s.
    pub fn symmetric_difference<'a>(
        &'a self,
        other: &'a LinkedHashSet<T, S>,
    ) -> SymmetricDifference<'a, T, S> {
        SymmetricDifference {
            iter: self.difference(other).chain(other.difference(self)),
        }
    }
}

impl<T, S> LinkedHashSet<T, S>
where
    S: Default,
{
    /// Creates a new linked hash set using the default hasher builder.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new linked hash set with at least `capacity` buckets using
    /// the default hasher builder.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }

    /// Creates a new linked hash set with an explicit policy using the
    /// default hasher builder.
    pub fn try_with_config(config: TableConfig) -> Result<Self> {
        Self::try_with_config_and_hasher(config, S::default())
    }
}

impl<T, S> Default for LinkedHashSet<T, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Set<T> for LinkedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Iter<'a>
        = Iter<'a, T>
    where
        Self: 'a,
        T: 'a;

    fn add(&mut self, value: T) -> bool {
        self.insert(value)
    }

    fn remove(&mut self, value: &T) -> bool {
        LinkedHashSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        LinkedHashSet::contains(self, value)
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn clear(&mut self) {
        LinkedHashSet::clear(self);
    }

    fn iterate(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

/// An insertion-order iterator over the values of a `LinkedHashSet`.
pub struct Iter<'a, T> {
    table: &'a HashTable<T, OrderLinks>,
    front: Ptr,
    back: Ptr,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = self.front;
        self.front = self.table.links(ptr).next;
        self.remaining -= 1;
        Some(self.table.value(ptr))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = self.back;
        self.back = self.table.links(ptr).prev;
        self.remaining -= 1;
        Some(self.table.value(ptr))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// A mutable cursor over a `LinkedHashSet` in insertion order.
///
/// Created by [`LinkedHashSet::cursor_front_mut`]. Once the cursor moves past
/// the newest value it stays there and [`current`](Self::current) returns
/// `None`.
pub struct CursorMut<'a, T, S> {
    set: &'a mut LinkedHashSet<T, S>,
    current: Ptr,
}

impl<T, S> CursorMut<'_, T, S> {
    /// The value under the cursor.
    pub fn current(&self) -> Option<&T> {
        (!self.current.is_null()).then(|| self.set.table.value(self.current))
    }

    /// Advances to the next newer value.
    pub fn move_next(&mut self) {
        if !self.current.is_null() {
            self.current = self.set.table.links(self.current).next;
        }
    }

    /// Removes the value under the cursor from the set and advances to its
    /// successor.
    pub fn remove_current(&mut self) -> Option<T> {
        if self.current.is_null() {
            return None;
        }
        let (value, links) = self.set.table.remove_ptr(self.current);
        self.set.unlink(links);
        self.current = links.next;
        Some(value)
    }
}

/// A draining iterator over a `LinkedHashSet`, oldest first.
pub struct Drain<'a, T, S> {
    set: &'a mut LinkedHashSet<T, S>,
}

impl<T, S> Iterator for Drain<'_, T, S> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.set.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<T, S> ExactSizeIterator for Drain<'_, T, S> {}

impl<T, S> FusedIterator for Drain<'_, T, S> {}

impl<T, S> Drop for Drain<'_, T, S> {
    fn drop(&mut self) {
        self.set.clear();
    }
}

/// A consuming iterator over a `LinkedHashSet`, oldest first.
pub struct IntoIter<T, S> {
    set: LinkedHashSet<T, S>,
}

impl<T, S> Iterator for IntoIter<T, S> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.set.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<T, S> DoubleEndedIterator for IntoIter<T, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.set.pop_back()
    }
}

impl<T, S> ExactSizeIterator for IntoIter<T, S> {}

impl<T, S> FusedIterator for IntoIter<T, S> {}

impl<T, S> IntoIterator for LinkedHashSet<T, S> {
    type IntoIter = IntoIter<T, S>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { set: self }
    }
}

impl<'a, T, S> IntoIterator for &'a LinkedHashSet<T, S> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S> FromIterator<T> for LinkedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = LinkedHashSet::new();
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for LinkedHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, S> Extend<&'a T> for LinkedHashSet<T, S>
where
    T: Hash + Eq + Copy + 'a,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

/// An iterator over the union of two linked sets.
pub struct Union<'a, T, S> {
    iter: Iter<'a, T>,
    rest: Difference<'a, T, S>,
}

impl<'a, T, S> Iterator for Union<'a, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().or_else(|| self.rest.next())
    }
}

/// An iterator over the intersection of two linked sets.
pub struct Intersection<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a LinkedHashSet<T, S>,
}

impl<'a, T, S> Iterator for Intersection<'a, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let other = self.other;
        self.iter.find(|v| other.contains(v))
    }
}

/// An iterator over the difference of two linked sets.
pub struct Difference<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a LinkedHashSet<T, S>,
}

impl<'a, T, S> Iterator for Difference<'a, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let other = self.other;
        self.iter.find(|v| !other.contains(v))
    }
}

/// An iterator over the symmetric difference of two linked sets.
pub struct SymmetricDifference<'a, T, S> {
    iter: core::iter::Chain<Difference<'a, T, S>, Difference<'a, T, S>>,
}

impl<'a, T, S> Iterator for SymmetricDifference<'a, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::error::Error;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            Self {
                k1: OsRng.try_next_u64().unwrap_or(0),
                k2: OsRng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Sends every value to one of four buckets so chains stay long.
    #[derive(Clone, Default)]
    struct FourBucketHashBuilder;

    #[derive(Default)]
    struct FourBucketHasher(u64);

    impl Hasher for FourBucketHasher {
        fn finish(&self) -> u64 {
            self.0 % 4
        }

        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = self.0.wrapping_mul(31).wrapping_add(b as u64);
            }
        }
    }

    impl BuildHasher for FourBucketHashBuilder {
        type Hasher = FourBucketHasher;

        fn build_hasher(&self) -> Self::Hasher {
            FourBucketHasher::default()
        }
    }

    type Linked<T> = LinkedHashSet<T, SipHashBuilder>;

    fn order<T: Copy, S>(set: &LinkedHashSet<T, S>) -> Vec<T> {
        set.iter().copied().collect()
    }

    /// Walks the order list both ways and checks it against the table.
    fn assert_consistent<T: Hash + Eq, S: BuildHasher>(set: &LinkedHashSet<T, S>) {
        let forward: Vec<&T> = set.iter().collect();
        let mut backward: Vec<&T> = set.iter().rev().collect();
        backward.reverse();
        assert_eq!(forward.len(), set.len());
        assert!(forward.iter().zip(&backward).all(|(a, b)| core::ptr::eq(*a, *b)));
        for v in forward {
            assert!(set.contains(v));
        }
        assert_eq!(set.head.is_null(), set.is_empty());
        assert_eq!(set.tail.is_null(), set.is_empty());
    }

    #[test]
    fn test_new() {
        let set: Linked<i32> = LinkedHashSet::new();
        assert!(set.is_empty());
        assert_eq!(set.capacity(), 16);
        assert_eq!(set.front(), None);
        assert_eq!(set.back(), None);
        assert_eq!(set.iter().next(), None);

        let set2: Linked<i32> = LinkedHashSet::with_capacity(33);
        assert_eq!(set2.capacity(), 64);
    }

    #[test]
    fn test_insertion_order() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        for v in [5, 3, 9, 1, 7] {
            assert!(set.insert(v));
        }
        assert!(!set.insert(3));
        assert_eq!(order(&set), [5, 3, 9, 1, 7]);
        assert_eq!(set.front(), Some(&5));
        assert_eq!(set.back(), Some(&7));
        assert_eq!(set.iter().rev().copied().collect::<Vec<_>>(), [7, 1, 9, 3, 5]);
        assert_consistent(&set);
    }

    #[test]
    fn test_order_survives_growth() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        let values: Vec<u32> = (0..1000).map(|i| (i * 7919) % 1009).collect();
        for &v in &values {
            set.insert(v);
        }
        assert!(set.capacity() >= 1024);
        assert_eq!(order(&set), values);
        assert_consistent(&set);
    }

    #[test]
    fn test_order_with_long_chains() {
        let mut set = LinkedHashSet::with_hasher(FourBucketHashBuilder);
        for i in (0..200u32).rev() {
            set.insert(i);
        }
        for i in (0..200u32).filter(|i| i % 3 == 0) {
            assert!(set.remove(&i));
        }
        let expected: Vec<u32> = (0..200).rev().filter(|i| i % 3 != 0).collect();
        assert_eq!(order(&set), expected);
        assert_consistent(&set);
    }

    #[test]
    fn test_growth_scenario() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        for i in 0..=11 {
            set.insert(i);
        }
        assert_eq!(set.len(), 12);
        assert_eq!(set.capacity(), 32);
        for i in 0..=9 {
            assert!(set.remove(&i));
        }
        assert_eq!(set.len(), 2);
        assert_eq!(set.capacity(), 32);
        assert_eq!(order(&set), [10, 11]);
        assert!(!set.contains(&0));
    }

    #[test]
    fn test_remove_relinks_neighbours() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.extend(1..=5);

        assert!(set.remove(&3));
        assert_eq!(order(&set), [1, 2, 4, 5]);
        assert!(set.remove(&1));
        assert_eq!(set.front(), Some(&2));
        assert!(set.remove(&5));
        assert_eq!(set.back(), Some(&4));
        assert_eq!(order(&set), [2, 4]);
        assert_consistent(&set);

        // Re-inserting goes to the back.
        set.insert(1);
        assert_eq!(order(&set), [2, 4, 1]);
        assert!(!set.remove(&99));
        assert_consistent(&set);
    }

    #[test]
    fn test_remove_last_element() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.insert("only");
        assert!(set.remove(&"only"));
        assert!(set.is_empty());
        assert_eq!(set.front(), None);
        assert_eq!(set.back(), None);
        assert_consistent(&set);
        set.insert("again");
        assert_eq!(set.front(), Some(&"again"));
    }

    #[test]
    fn test_pop_front_and_back() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.extend([1, 2, 3, 4]);
        assert_eq!(set.pop_front(), Some(1));
        assert_eq!(set.pop_back(), Some(4));
        assert_eq!(order(&set), [2, 3]);
        assert_eq!(set.pop_back(), Some(3));
        assert_eq!(set.pop_back(), Some(2));
        assert_eq!(set.pop_back(), None);
        assert_eq!(set.pop_front(), None);
        assert_consistent(&set);
    }

    #[test]
    fn test_replace_keeps_position() {
        #[derive(Debug, Clone)]
        struct Tagged(u32, &'static str);

        impl PartialEq for Tagged {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }

        impl Eq for Tagged {}

        impl Hash for Tagged {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.insert(Tagged(1, "a"));
        set.insert(Tagged(2, "b"));
        set.insert(Tagged(3, "c"));

        assert!(!set.insert(Tagged(2, "ignored")));
        assert_eq!(set.get(&Tagged(2, "")).map(|t| t.1), Some("b"));

        let old = set.replace(Tagged(2, "B"));
        assert_eq!(old.map(|t| t.1), Some("b"));
        let tags: Vec<&str> = set.iter().map(|t| t.1).collect();
        assert_eq!(tags, ["a", "B", "c"]);

        assert!(set.replace(Tagged(4, "d")).is_none());
        assert_eq!(set.back().map(|t| t.1), Some("d"));
    }

    #[test]
    fn test_cursor_removal() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.extend(0..20);

        let mut cursor = set.cursor_front_mut();
        assert_eq!(cursor.current(), Some(&0));
        assert_eq!(cursor.remove_current(), Some(0));
        assert_eq!(cursor.current(), Some(&1));
        cursor.move_next();
        assert_eq!(cursor.remove_current(), Some(2));
        assert_eq!(cursor.current(), Some(&3));
        while cursor.current().is_some() {
            cursor.move_next();
        }
        assert_eq!(cursor.remove_current(), None);
        cursor.move_next();
        assert_eq!(cursor.current(), None);

        assert_eq!(set.len(), 18);
        assert!(!set.contains(&0));
        assert!(!set.contains(&2));
        assert_eq!(set.front(), Some(&1));
        assert_consistent(&set);
    }

    #[test]
    fn test_cursor_removes_tail() {
        let mut set = LinkedHashSet::with_hasher(FourBucketHashBuilder);
        set.extend([10u32, 20, 30]);
        let mut cursor = set.cursor_front_mut();
        cursor.move_next();
        cursor.move_next();
        assert_eq!(cursor.remove_current(), Some(30));
        assert_eq!(cursor.current(), None);
        assert_eq!(set.back(), Some(&20));
        set.insert(40);
        assert_eq!(order(&set), [10, 20, 40]);
        assert_consistent(&set);
    }

    #[test]
    fn test_retain() {
        let mut set = LinkedHashSet::with_hasher(FourBucketHashBuilder);
        set.extend((0..100u32).rev());
        set.retain(|&v| v % 7 == 0);
        let expected: Vec<u32> = (0..100).rev().filter(|v| v % 7 == 0).collect();
        assert_eq!(order(&set), expected);
        assert_consistent(&set);
    }

    #[test]
    fn test_drain() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.extend([3, 1, 2]);
        let drain = set.drain();
        assert_eq!(drain.len(), 3);
        assert_eq!(drain.collect::<Vec<_>>(), [3, 1, 2]);
        assert!(set.is_empty());

        set.extend([4, 5, 6]);
        {
            let mut partial = set.drain();
            assert_eq!(partial.next(), Some(4));
        }
        assert!(set.is_empty());
        assert_consistent(&set);
        set.insert(7);
        assert_eq!(order(&set), [7]);
    }

    #[test]
    fn test_into_iter() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.extend(["x".to_string(), "y".to_string(), "z".to_string()]);

        let borrowed: Vec<&String> = (&set).into_iter().collect();
        assert_eq!(borrowed, ["x", "y", "z"]);

        let mut owned = set.into_iter();
        assert_eq!(owned.len(), 3);
        assert_eq!(owned.next_back().as_deref(), Some("z"));
        assert_eq!(owned.collect::<Vec<_>>(), ["x", "y"]);
    }

    #[test]
    fn test_clear() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.extend(0..50);
        let capacity = set.capacity();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.capacity(), capacity);
        assert_eq!(set.front(), None);
        assert_consistent(&set);
        set.extend([2, 1]);
        assert_eq!(order(&set), [2, 1]);
    }

    #[test]
    fn test_try_insert_at_max_capacity() {
        let config = TableConfig {
            max_capacity: 16,
            ..TableConfig::default()
        };
        let mut set =
            LinkedHashSet::try_with_config_and_hasher(config, SipHashBuilder::default()).unwrap();
        for i in 0..11 {
            assert_eq!(set.try_insert(i), Ok(true));
        }
        assert_eq!(set.try_insert(11), Err(Error::CapacityOverflow));
        assert_eq!(set.len(), 11);
        assert_eq!(set.capacity(), 16);
        assert_eq!(order(&set), (0..11).collect::<Vec<_>>());
        assert_eq!(set.back(), Some(&10));
        assert_consistent(&set);

        assert!(set.remove(&0));
        assert_eq!(set.try_insert(11), Ok(true));
        assert_eq!(set.back(), Some(&11));
    }

    #[test]
    fn test_clone_is_independent_and_ordered() {
        let mut original = LinkedHashSet::with_hasher(SipHashBuilder::default());
        original.extend([9, 4, 7, 1]);
        let mut cloned = original.clone();
        assert_eq!(order(&cloned), [9, 4, 7, 1]);
        assert_eq!(cloned, original);

        cloned.remove(&4);
        cloned.insert(0);
        assert_eq!(order(&original), [9, 4, 7, 1]);
        assert_eq!(order(&cloned), [9, 7, 1, 0]);
        assert_ne!(cloned, original);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a: Linked<i32> = [1, 2, 3].into_iter().collect();
        let b: Linked<i32> = [3, 2, 1].into_iter().collect();
        assert_eq!(a, b);

        let plain: HashSet<i32, SipHashBuilder> = [2, 3, 1].into_iter().collect();
        assert!(a == plain);
        assert!(plain == a);

        let c: Linked<i32> = [1, 2].into_iter().collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_set_algebra_preserves_order() {
        let hasher = SipHashBuilder::default();
        let mut a = LinkedHashSet::with_hasher(hasher.clone());
        a.extend([5, 1, 4, 2]);
        let mut b = LinkedHashSet::with_hasher(hasher);
        b.extend([2, 6, 5, 3]);

        assert_eq!(a.union(&b).copied().collect::<Vec<_>>(), [5, 1, 4, 2, 6, 3]);
        assert_eq!(a.intersection(&b).copied().collect::<Vec<_>>(), [5, 2]);
        assert_eq!(a.difference(&b).copied().collect::<Vec<_>>(), [1, 4]);
        assert_eq!(
            a.symmetric_difference(&b).copied().collect::<Vec<_>>(),
            [1, 4, 6, 3]
        );

        assert!(!a.is_disjoint(&b));
        assert!(!a.is_subset(&b));
        let small: LinkedHashSet<i32, _> = {
            let mut s = LinkedHashSet::with_hasher(a.hasher().clone());
            s.extend([4, 5]);
            s
        };
        assert!(small.is_subset(&a));
        assert!(a.is_superset(&small));
        assert!(small.is_disjoint(&{
            let mut s = LinkedHashSet::with_hasher(a.hasher().clone());
            s.insert(100);
            s
        }));
    }

    #[test]
    fn test_debug_in_order() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        set.extend([3, 1, 2]);
        assert_eq!(alloc::format!("{:?}", set), "{3, 1, 2}");
    }

    #[test]
    fn test_set_trait() {
        fn exercise<S: Set<u8>>(set: &mut S) -> Vec<u8> {
            for v in [4, 2, 4, 8] {
                set.add(v);
            }
            set.remove(&2);
            set.iterate().copied().collect()
        }

        let mut set: Linked<u8> = LinkedHashSet::new();
        assert_eq!(exercise(&mut set), [4, 8]);
        Set::clear(&mut set);
        assert!(Set::is_empty(&set));
    }

    #[test]
    fn test_string_churn() {
        let mut set = LinkedHashSet::with_hasher(SipHashBuilder::default());
        for round in 0..5 {
            for i in 0..100 {
                set.insert(alloc::format!("{round}-{i}"));
            }
            for i in (0..100).step_by(2) {
                assert!(set.remove(&alloc::format!("{round}-{i}")));
            }
        }
        assert_eq!(set.len(), 250);
        let first: Vec<String> = set.iter().take(3).cloned().collect();
        assert_eq!(first, ["0-1", "0-3", "0-5"]);
        assert_consistent(&set);
    }
}
