use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::mem;

use crate::dense_table::DenseTable;
use crate::error::Error;

/// A hash set backed by the dense chained [`DenseTable`].
///
/// `DenseSet<T, S>` stores values of type `T` where `T` implements
/// `Hash + Eq`, using a configurable hasher builder `S`. Values must be
/// default-constructible: the default value is what an empty cell holds.
///
/// Construction takes an explicit cell count of at least 1 and can fail,
/// so there is no `Default` implementation.
///
/// # Examples
///
/// ```rust
/// use std::collections::hash_map::RandomState;
///
/// use dense_hash::DenseSet;
///
/// let mut set: DenseSet<u32, RandomState> = DenseSet::with_capacity(16)?;
/// assert!(set.insert(3));
/// assert!(!set.insert(3));
/// assert!(set.contains(&3));
/// # Ok::<(), dense_hash::Error>(())
/// ```
#[derive(Clone)]
pub struct DenseSet<T, S> {
    table: DenseTable<T>,
    hash_builder: S,
}

impl<T, S> Debug for DenseSet<T, S>
where
    T: Debug + Hash + Eq + Default,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> DenseSet<T, S>
where
    T: Hash + Eq + Default,
    S: BuildHasher,
{
    /// Creates a set with exactly `capacity` cells and the given hasher
    /// builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] for a zero capacity,
    /// [`Error::CapacityOverflow`] for a capacity beyond
    /// [`max_bucket_count`](Self::max_bucket_count), and
    /// [`Error::AllocFailed`] if the allocator refuses.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self, Error> {
        Ok(Self {
            table: DenseTable::with_capacity(capacity)?,
            hash_builder,
        })
    }

    /// Returns the number of values in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the total number of cells.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the largest cell count a set of this value type can be
    /// constructed with.
    pub fn max_bucket_count(&self) -> usize {
        self.table.max_bucket_count()
    }

    /// Returns the current load factor.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Returns the load factor above which an insertion grows the set.
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    /// Sets the maximum load factor, growing the set if the current
    /// population already exceeds the new bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLoadFactor`] unless `0 < factor <= 1`.
    pub fn set_max_load_factor(&mut self, factor: f32) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table
            .set_max_load_factor(factor, |value| hash_builder.hash_one(value))
    }

    /// Returns the capacity multiple applied when the set grows.
    pub fn growth_multiple(&self) -> f32 {
        self.table.growth_multiple()
    }

    /// Sets the growth multiple.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrowthMultiple`] unless `multiple > 1`.
    pub fn set_growth_multiple(&mut self, multiple: f32) -> Result<(), Error> {
        self.table.set_growth_multiple(multiple)
    }

    /// Returns a reference to the hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all values, keeping the allocated cells.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Swaps the complete state of two sets, including their hashers.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was not already present. If it was, the
    /// set is unchanged and the given value is dropped.
    pub fn insert(&mut self, value: T) -> bool {
        let hash = self.hash_builder.hash_one(&value);
        let hash_builder = &self.hash_builder;
        let (_, inserted) = self.table.insert(
            hash,
            value,
            |existing, new| existing == new,
            |stored| hash_builder.hash_one(stored),
        );
        inserted
    }

    /// Returns `true` if the set contains `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use dense_hash::DenseSet;
    ///
    /// let mut set: DenseSet<u32, RandomState> = DenseSet::with_capacity(8)?;
    /// set.insert(1);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&2));
    /// # Ok::<(), dense_hash::Error>(())
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        self.get(value).is_some()
    }

    /// Returns the number of stored values equal to `value` (0 or 1).
    pub fn count(&self, value: &T) -> usize {
        usize::from(self.contains(value))
    }

    /// Returns a reference to the stored value equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.find(hash, |stored| stored == value)
    }

    /// Removes `value` from the set. Returns `true` if it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.take(value).is_some()
    }

    /// Removes and returns the stored value equal to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        let hash = self.hash_builder.hash_one(value);
        self.table.remove(hash, |stored| stored == value)
    }

    /// Retains only the values for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        let hash_builder = &self.hash_builder;
        self.table
            .retain(|value| f(value), |value| hash_builder.hash_one(value));
    }

    /// Inserts every value of `other` that is absent from `self`.
    ///
    /// `other` is unchanged.
    pub fn merge(&mut self, other: &Self)
    where
        T: Clone,
    {
        for value in other.iter() {
            if !self.contains(value) {
                self.insert(value.clone());
            }
        }
    }

    /// Rebuilds the set with at least `count` cells (more if the current
    /// population requires it under the configured load factor). The set
    /// is unchanged when an error is returned.
    ///
    /// # Errors
    ///
    /// As for [`with_capacity_and_hasher`](Self::with_capacity_and_hasher).
    pub fn rehash(&mut self, count: usize) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table
            .rehash(count, |value| hash_builder.hash_one(value))
    }

    /// Grows the set if it cannot hold `count` values within the
    /// configured load factor. A no-op otherwise.
    ///
    /// # Errors
    ///
    /// As for [`rehash`](Self::rehash).
    pub fn reserve(&mut self, count: usize) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table
            .reserve(count, |value| hash_builder.hash_one(value))
    }

    /// Returns an iterator over the values in an arbitrary order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<T, S> DenseSet<T, S>
where
    T: Hash + Eq + Default,
    S: BuildHasher + Default,
{
    /// Creates a set with exactly `capacity` cells and a default hasher
    /// builder.
    ///
    /// # Errors
    ///
    /// As for [`with_capacity_and_hasher`](Self::with_capacity_and_hasher).
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

/// An iterator over the values of a [`DenseSet`].
pub struct Iter<'a, T> {
    inner: crate::dense_table::Iter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// An owning iterator over the values of a [`DenseSet`].
pub struct IntoIter<T> {
    inner: crate::dense_table::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<T, S> IntoIterator for DenseSet<T, S> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a DenseSet<T, S>
where
    T: Hash + Eq + Default,
    S: BuildHasher,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
