//! The contract shared by every set in this crate.
//!
//! [`Set`] is deliberately small: it is the surface other collections can
//! rely on without caring which set variant they were handed.

/// Minimal set contract: uniqueness by `Eq`, membership, size and iteration.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use chain_hash::HashSet;
/// use chain_hash::LinkedHashSet;
/// use chain_hash::Set;
///
/// fn fill<S: Set<u32>>(set: &mut S) -> usize {
///     for v in [3, 1, 3, 2] {
///         set.add(v);
///     }
///     set.size()
/// }
///
/// let mut plain: HashSet<u32> = HashSet::new();
/// let mut linked: LinkedHashSet<u32> = LinkedHashSet::new();
/// assert_eq!(fill(&mut plain), 3);
/// assert_eq!(fill(&mut linked), 3);
/// assert!(chain_hash::set::set_eq(&plain, &linked));
/// # }
/// ```
pub trait Set<T> {
    /// Iterator returned by [`iterate`](Set::iterate).
    type Iter<'a>: Iterator<Item = &'a T>
    where
        Self: 'a,
        T: 'a;

    /// Adds `value` if no equal element is present. Returns whether it was
    /// added.
    fn add(&mut self, value: T) -> bool;

    /// Removes the element equal to `value`. Returns whether one was removed.
    fn remove(&mut self, value: &T) -> bool;

    /// Returns `true` if an element equal to `value` is present.
    fn contains(&self, value: &T) -> bool;

    /// Number of elements.
    fn size(&self) -> usize;

    /// Returns `true` if the set holds no elements.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Removes every element.
    fn clear(&mut self);

    /// Iterates the elements. Order is defined by the implementation.
    fn iterate(&self) -> Self::Iter<'_>;
}

/// Two sets are equal when they have the same size and every element of `a`
/// is contained in `b`.
pub fn set_eq<T, A, B>(a: &A, b: &B) -> bool
where
    A: Set<T> + ?Sized,
    B: Set<T> + ?Sized,
{
    a.size() == b.size() && a.iterate().all(|v| b.contains(v))
}
