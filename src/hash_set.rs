use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;

use crate::DefaultHashBuilder;
use crate::config::TableConfig;
use crate::error::Result;
use crate::hash_table::Entry;
use crate::hash_table::HashTable;
use crate::linked_hash_set::LinkedHashSet;
use crate::set::Set;
use crate::set::set_eq;

/// A hash set implemented on top of a separately-chained table.
///
/// `HashSet<T, S>` stores values of type `T` where `T` implements `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash values. Each bucket
/// holds a chain of values in insertion order; when the number of values
/// reaches the table's load factor the bucket array doubles and every chain is
/// split in place by a single hash bit.
///
/// The bucket array never shrinks. Removing values frees their storage but
/// leaves [`capacity`](HashSet::capacity) where growth last put it.
///
/// Iteration order is bucket order, then insertion order within a bucket. It
/// is stable between mutations but otherwise unspecified; use
/// [`LinkedHashSet`] when insertion order matters.
pub struct HashSet<T, S = DefaultHashBuilder> {
    table: HashTable<T>,
    hash_builder: S,
}

impl<T, S> Clone for HashSet<T, S>
where
    T: Clone + Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Builds an independent copy by re-inserting every value into a fresh
    /// table with the same configuration.
    fn clone(&self) -> Self {
        let mut set = Self::build(self.table.config(), self.hash_builder.clone());
        set.extend(self.iter().cloned());
        set
    }
}

impl<T, S, S2> PartialEq<HashSet<T, S2>> for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &HashSet<T, S2>) -> bool {
        set_eq(self, other)
    }
}

impl<T, S, S2> PartialEq<LinkedHashSet<T, S2>> for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
    S2: BuildHasher,
{
    fn eq(&self, other: &LinkedHashSet<T, S2>) -> bool {
        set_eq(self, other)
    }
}

impl<T, S> Eq for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

impl<T, S> Debug for HashSet<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.table.iter()).finish()
    }
}

impl<T, S> HashSet<T, S> {
    fn build(config: TableConfig, hash_builder: S) -> Self {
        match Self::try_with_config_and_hasher(config, hash_builder) {
            Ok(set) => set,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a new hash set with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use chain_hash::hash_set::HashSet;
    ///
    /// let set: HashSet<i32, _> = HashSet::with_hasher(RandomState::new());
    /// assert!(set.is_empty());
    /// assert_eq!(set.capacity(), 16);
    /// # }
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::build(TableConfig::new(), hash_builder)
    }

    /// Creates a new hash set with at least `capacity` buckets and the given
    /// hasher builder.
    ///
    /// The bucket count is rounded up to a power of two and is never below
    /// [`MIN_CAPACITY`](crate::MIN_CAPACITY).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use chain_hash::hash_set::HashSet;
    ///
    /// let set: HashSet<i32, _> = HashSet::with_capacity_and_hasher(100, RandomState::new());
    /// assert_eq!(set.capacity(), 128);
    /// # }
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::build(TableConfig::with_initial_capacity(capacity), hash_builder)
    }

    /// Creates a new hash set with an explicit sizing and growth policy.
    ///
    /// Returns an error if `config` fails [`TableConfig::validate`] or the
    /// initial bucket array cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use chain_hash::Error;
    /// use chain_hash::TableConfig;
    /// use chain_hash::hash_set::HashSet;
    ///
    /// let config = TableConfig {
    ///     load_factor: 0.5,
    ///     ..TableConfig::default()
    /// };
    /// let mut set = HashSet::try_with_config_and_hasher(config, RandomState::new()).unwrap();
    /// for i in 0..8 {
    ///     set.insert(i);
    /// }
    /// assert_eq!(set.capacity(), 32);
    ///
    /// let bad = TableConfig {
    ///     load_factor: 0.0,
    ///     ..TableConfig::default()
    /// };
    /// assert_eq!(
    ///     HashSet::<i32, _>::try_with_config_and_hasher(bad, RandomState::new()).err(),
    ///     Some(Error::InvalidLoadFactor)
    /// );
    /// # }
    /// ```
    pub fn try_with_config_and_hasher(config: TableConfig, hash_builder: S) -> Result<Self> {
        Ok(Self {
            table: HashTable::try_with_config(config)?,
            hash_builder,
        })
    }

    /// Returns the number of elements in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.len(), 0);
    /// set.insert(1);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current number of buckets.
    ///
    /// This is always a power of two. It doubles when an insertion brings the
    /// element count to `load_factor * capacity`, and it never decreases.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.capacity(), 16);
    /// for i in 0..12 {
    ///     set.insert(i);
    /// }
    /// assert_eq!(set.capacity(), 32);
    ///
    /// for i in 0..12 {
    ///     set.remove(&i);
    /// }
    /// assert_eq!(set.capacity(), 32);
    /// # }
    /// ```
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

    /// Removes all elements from the set.
    ///
    /// This operation preserves the set's bucket count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert!(!set.is_empty());
    /// set.clear();
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the values of the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// for value in set.iter() {
    ///     println!("Value: {}", value);
    /// }
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator that removes and yields all values from the
    /// set.
    ///
    /// The set is empty as soon as `drain` returns, even if the iterator is
    /// leaked; values not yet yielded are dropped with the iterator.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// let values: Vec<_> = set.drain().collect();
    /// assert!(set.is_empty());
    /// assert_eq!(values.len(), 2);
    /// # }
    /// ```
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// In other words, remove all elements `e` for which `f(&e)` returns
    /// `false`. The elements are visited in iteration order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = (1..=4).collect();
    /// set.retain(|&x| x % 2 == 0);
    /// assert_eq!(set.len(), 2);
    /// assert!(set.contains(&2));
    /// assert!(set.contains(&4));
    /// # }
    /// ```
    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.table.retain(f);
    }

    /// Returns the chain-length histogram: `hist[n]` is the number of
    /// buckets holding exactly `n` values.
    #[cfg(feature = "stats")]
    pub fn chain_histogram(&self) -> alloc::vec::Vec<usize> {
        self.table.chain_histogram()
    }

    /// Returns occupancy statistics for the underlying table.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> crate::TableStats {
        self.table.stats()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. That is:
    ///
    /// - If the set did not previously contain this value, `true` is returned.
    /// - If the set already contained this value, `false` is returned and the
    ///   set is not modified.
    ///
    /// # Panics
    ///
    /// Panics if the insertion needs the bucket array to grow past the
    /// configured maximum. Use [`try_insert`](Self::try_insert) to handle that
    /// case instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// assert_eq!(set.insert(37), true);
    /// assert_eq!(set.insert(37), false);
    /// assert_eq!(set.len(), 1);
    /// # }
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        match self.try_insert(value) {
            Ok(inserted) => inserted,
            Err(err) => panic!("{err}"),
        }
    }

    /// Adds a value to the set, reporting growth failures instead of
    /// panicking.
    ///
    /// On `Err` the set is unchanged and `value` has been dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(feature = "std")]
    /// # {
    /// use std::collections::hash_map::RandomState;
    ///
    /// use chain_hash::Error;
    /// use chain_hash::HashSet;
    /// use chain_hash::TableConfig;
    ///
    /// let config = TableConfig {
    ///     max_capacity: 16,
    ///     ..TableConfig::default()
    /// };
    /// let mut set = HashSet::try_with_config_and_hasher(config, RandomState::new()).unwrap();
    /// for i in 0..11 {
    ///     assert_eq!(set.try_insert(i), Ok(true));
    /// }
    /// assert_eq!(set.try_insert(11), Err(Error::CapacityOverflow));
    /// assert_eq!(set.len(), 11);
    /// assert_eq!(set.try_insert(0), Ok(false));
    /// # }
    /// ```
    pub fn try_insert(&mut self, value: T) -> Result<bool> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.try_insert(value, ())?;
                Ok(true)
            }
        }
    }

    /// Returns `true` if the set contains a value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&2));
    /// # }
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        let hash = self.hash_builder.hash_one(value);
        self.table.find_ptr(hash, |v| v == value).is_some()
    }

    /// Removes a value from the set. Returns whether the value was
    /// present in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.remove(&1), true);
    /// assert_eq!(set.remove(&1), false);
    /// # }
    /// ```
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
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.take(&1), Some(1));
    /// assert_eq!(set.take(&1), None);
    /// # }
    /// ```
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |v| v == value).map(|(v, ())| v)
    }

    /// Adds a value to the set, replacing the existing value, if any, that is
    /// equal to the given one. Returns the replaced value.
    ///
    /// The replacement keeps the existing value's position in its chain.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`insert`](Self::insert).
    pub fn replace(&mut self, value: T) -> Option<T> {
        let hash = self.hash_builder.hash_one(&value);
        match self.table.entry(hash, |v| v == &value) {
            Entry::Occupied(mut entry) => Some(core::mem::replace(entry.get_mut(), value)),
            Entry::Vacant(entry) => match entry.try_insert(value, ()) {
                Ok(_) => None,
                Err(err) => panic!("{err}"),
            },
        }
    }

    /// Returns a reference to the value in the set, if any, that is equal to
    /// the given value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let mut set: HashSet<i32> = HashSet::new();
    /// set.insert(1);
    /// assert_eq!(set.get(&1), Some(&1));
    /// assert_eq!(set.get(&2), None);
    /// # }
    /// ```
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |v| v == value)
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
    ///
    /// On error the set may have grown part of the way, but every value is
    /// still present and correctly placed.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.table.try_reserve(additional)
    }

    /// Returns `true` if no value is in both sets.
    ///
    /// Scans the smaller set and probes the larger one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let evens: HashSet<u8> = (0..10).step_by(2).collect();
    /// let odds: HashSet<u8> = (1..10).step_by(2).collect();
    /// assert!(evens.is_disjoint(&odds));
    /// assert!(!evens.is_disjoint(&evens));
    /// # }
    /// ```
    pub fn is_disjoint(&self, other: &HashSet<T, S>) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.intersection(large).next().is_none()
    }

    /// Returns `true` if every value of `self` is also in `other`.
    pub fn is_subset(&self, other: &HashSet<T, S>) -> bool {
        self.len() <= other.len() && self.difference(other).next().is_none()
    }

    /// Returns `true` if every value of `other` is also in `self`.
    pub fn is_superset(&self, other: &HashSet<T, S>) -> bool {
        other.is_subset(self)
    }

    /// Returns an iterator over every value of `self`, followed by the values
    /// only `other` holds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let low: HashSet<u8> = (0..6).collect();
    /// let high: HashSet<u8> = (4..10).collect();
    ///
    /// let mut all: Vec<u8> = low.union(&high).copied().collect();
    /// all.sort_unstable();
    /// assert_eq!(all, (0..10).collect::<Vec<_>>());
    /// # }
    /// ```
    pub fn union<'a>(&'a self, other: &'a HashSet<T, S>) -> Union<'a, T, S> {
        Union {
            iter: self.iter(),
            rest: other.difference(self),
        }
    }

    /// Returns an iterator over the values of `self` that `other` also holds.
    pub fn intersection<'a>(&'a self, other: &'a HashSet<T, S>) -> Intersection<'a, T, S> {
        Intersection {
            iter: self.iter(),
            other,
        }
    }

    /// Returns an iterator over the values of `self` that `other` lacks.
    pub fn difference<'a>(&'a self, other: &'a HashSet<T, S>) -> Difference<'a, T, S> {
        Difference {
            iter: self.iter(),
            other,
        }
    }

    /// Returns an iterator over the values held by exactly one of the two
    /// sets: `self`'s first, then `other`'s.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let low: HashSet<u8> = (0..6).collect();
    /// let high: HashSet<u8> = (4..10).collect();
    ///
    /// let mut edges: Vec<u8> = low.symmetric_difference(&high).copied().collect();
    /// edges.sort_unstable();
    /// assert_eq!(edges, [0, 1, 2, 3, 6, 7, 8, 9]);
    /// # }
    /// ```
    pub fn symmetric_difference<'a>(
        &'a self,
        other: &'a HashSet<T, S>,
    ) -> SymmetricDifference<'a, T, S> {
        SymmetricDifference {
            iter: self.difference(other).chain(other.difference(self)),
        }
    }
}

impl<T, S> HashSet<T, S>
where
    S: Default,
{
    /// Creates a new hash set using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashSet;
    ///
    /// let set: HashSet<i32> = HashSet::new();
    /// assert!(set.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash set with at least `capacity` buckets using the
    /// default hasher builder.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }

    /// Creates a new hash set with an explicit policy using the default
    /// hasher builder.
    pub fn try_with_config(config: TableConfig) -> Result<Self> {
        Self::try_with_config_and_hasher(config, S::default())
    }
}

impl<T, S> Default for HashSet<T, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Set<T> for HashSet<T, S>
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
        HashSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        HashSet::contains(self, value)
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn clear(&mut self) {
        HashSet::clear(self);
    }

    fn iterate(&self) -> Self::Iter<'_> {
        self.iter()
    }
}

/// An iterator over the values of a `HashSet`.
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T, ()>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// A draining iterator over the values of a `HashSet`.
pub struct Drain<'a, T> {
    inner: crate::arena::DrainValues<'a, T, ()>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> FusedIterator for Drain<'_, T> {}

/// A consuming iterator over the values of a `HashSet`.
pub struct IntoIter<T> {
    inner: crate::arena::IntoValues<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T, S> IntoIterator for HashSet<T, S> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_values(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S> FromIterator<T> for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = HashSet::new();
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for HashSet<T, S>
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

impl<'a, T, S> Extend<&'a T> for HashSet<T, S>
where
    T: Hash + Eq + Copy + 'a,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

/// Iterator returned by [`HashSet::union`].
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

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (low, high) = self.rest.size_hint();
        let len = self.iter.len();
        (len + low, high.map(|high| len + high))
    }
}

impl<T, S> FusedIterator for Union<'_, T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
}

/// Iterator returned by [`HashSet::intersection`].
pub struct Intersection<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S>,
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

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.iter.len()))
    }
}

/// Iterator returned by [`HashSet::difference`].
pub struct Difference<'a, T, S> {
    iter: Iter<'a, T>,
    other: &'a HashSet<T, S>,
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

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.iter.len()))
    }
}

/// Iterator returned by [`HashSet::symmetric_difference`].
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
