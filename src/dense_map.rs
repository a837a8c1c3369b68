use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::mem;

use crate::dense_table::DenseTable;
use crate::error::Error;

/// A hash map backed by the dense chained [`DenseTable`].
///
/// `DenseMap<K, V, S>` stores key-value pairs where keys implement
/// `Hash + Eq` and uses a configurable hasher builder `S`. Keys and values
/// must be default-constructible: the default value is what an empty cell
/// holds.
///
/// Unlike the standard map, [`insert`](DenseMap::insert) never overwrites
/// an existing entry; use [`insert_or_assign`](DenseMap::insert_or_assign)
/// or the [`entry`](DenseMap::entry) API for update-in-place semantics.
///
/// Construction takes an explicit cell count of at least 1 and can fail,
/// so there is no `Default` implementation.
///
/// # Examples
///
/// ```rust
/// use std::collections::hash_map::RandomState;
///
/// use dense_hash::DenseMap;
///
/// let mut map: DenseMap<u32, String, RandomState> = DenseMap::with_capacity(16)?;
/// assert!(map.insert(1, "one".to_string()));
/// assert_eq!(map.get(&1), Some(&"one".to_string()));
/// # Ok::<(), dense_hash::Error>(())
/// ```
#[derive(Clone)]
pub struct DenseMap<K, V, S> {
    table: DenseTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for DenseMap<K, V, S>
where
    K: Debug + Hash + Eq + Default,
    V: Debug + Default,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    /// Creates a map with exactly `capacity` cells and the given hasher
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

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the total number of cells.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the largest cell count a map of this entry type can be
    /// constructed with.
    pub fn max_bucket_count(&self) -> usize {
        self.table.max_bucket_count()
    }

    /// Returns the current load factor.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Returns the load factor above which an insertion grows the map.
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    /// Sets the maximum load factor, growing the map if the current
    /// population already exceeds the new bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLoadFactor`] unless `0 < factor <= 1`.
    pub fn set_max_load_factor(&mut self, factor: f32) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table
            .set_max_load_factor(factor, |entry| hash_builder.hash_one(&entry.0))
    }

    /// Returns the capacity multiple applied when the map grows.
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

    /// Removes all entries, keeping the allocated cells.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Swaps the complete state of two maps, including their hashers.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Inserts a key-value pair if the key is not present.
    ///
    /// Returns `true` if the entry was inserted. If the key is already
    /// present the map is unchanged, the given pair is dropped, and
    /// `false` is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use dense_hash::DenseMap;
    ///
    /// let mut map: DenseMap<u32, &str, RandomState> = DenseMap::with_capacity(8)?;
    /// assert!(map.insert(37, "a"));
    /// assert!(!map.insert(37, "b"));
    /// assert_eq!(map.get(&37), Some(&"a"));
    /// # Ok::<(), dense_hash::Error>(())
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.hash_builder.hash_one(&key);
        let hash_builder = &self.hash_builder;
        let (_, inserted) = self.table.insert(
            hash,
            (key, value),
            |existing, new| existing.0 == new.0,
            |entry| hash_builder.hash_one(&entry.0),
        );
        inserted
    }

    /// Inserts a key-value pair, replacing and returning the previous
    /// value if the key was present.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns a reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use dense_hash::DenseMap;
    ///
    /// let mut map: DenseMap<u32, &str, RandomState> = DenseMap::with_capacity(8)?;
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// # Ok::<(), dense_hash::Error>(())
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |(k, _)| k == key).map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find_mut(hash, |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns a reference to the value for `key`, or
    /// [`Error::KeyNotFound`] if the key is absent.
    ///
    /// This is the checked counterpart of [`get`](Self::get) for callers
    /// that treat a missing key as a failure rather than an ordinary
    /// outcome.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use dense_hash::DenseMap;
    /// use dense_hash::Error;
    ///
    /// let mut map: DenseMap<u32, u32, RandomState> = DenseMap::with_capacity(8)?;
    /// assert_eq!(map.at(&7), Err(Error::KeyNotFound));
    /// map.insert(7, 9);
    /// assert_eq!(map.at(&7), Ok(&9));
    /// # Ok::<(), dense_hash::Error>(())
    /// ```
    pub fn at(&self, key: &K) -> Result<&V, Error> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value for `key`, or
    /// [`Error::KeyNotFound`] if the key is absent.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, Error> {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of entries for `key` (0 or 1).
    pub fn count(&self, key: &K) -> usize {
        usize::from(self.contains_key(key))
    }

    /// Removes `key` from the map, returning its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use dense_hash::DenseMap;
    ///
    /// let mut map: DenseMap<u32, &str, RandomState> = DenseMap::with_capacity(8)?;
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// # Ok::<(), dense_hash::Error>(())
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Removes `key` from the map, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |(k, _)| k == key)
    }

    /// Retains only the entries for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) {
        let hash_builder = &self.hash_builder;
        self.table.retain(
            |(key, value)| f(key, value),
            |entry| hash_builder.hash_one(&entry.0),
        );
    }

    /// Inserts every entry of `other` whose key is absent from `self`.
    ///
    /// `other` is unchanged; colliding keys keep the value already in
    /// `self`.
    pub fn merge(&mut self, other: &Self)
    where
        K: Clone,
        V: Clone,
    {
        for (key, value) in other.iter() {
            if !self.contains_key(key) {
                self.insert(key.clone(), value.clone());
            }
        }
    }

    /// Rebuilds the map with at least `count` cells (more if the current
    /// population requires it under the configured load factor). The map
    /// is unchanged when an error is returned.
    ///
    /// # Errors
    ///
    /// As for [`with_capacity_and_hasher`](Self::with_capacity_and_hasher).
    pub fn rehash(&mut self, count: usize) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table
            .rehash(count, |entry| hash_builder.hash_one(&entry.0))
    }

    /// Grows the map if it cannot hold `count` entries within the
    /// configured load factor. A no-op otherwise.
    ///
    /// # Errors
    ///
    /// As for [`rehash`](Self::rehash).
    pub fn reserve(&mut self, count: usize) -> Result<(), Error> {
        let hash_builder = &self.hash_builder;
        self.table
            .reserve(count, |entry| hash_builder.hash_one(&entry.0))
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// `entry(key).or_default()` is the map's indexed-access operation: it
    /// inserts a default value when the key is absent and hands back a
    /// mutable reference either way.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use dense_hash::DenseMap;
    ///
    /// let mut map: DenseMap<u32, u32, RandomState> = DenseMap::with_capacity(8)?;
    /// *map.entry(7).or_default() = 9;
    /// assert_eq!(map.at(&7), Ok(&9));
    ///
    /// map.entry(7).and_modify(|v| *v += 1).or_insert(0);
    /// assert_eq!(map.at(&7), Ok(&10));
    /// # Ok::<(), dense_hash::Error>(())
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.find_index(hash, |(k, _)| k == &key) {
            Some(index) => Entry::Occupied(OccupiedEntry { map: self, index }),
            None => Entry::Vacant(VacantEntry { map: self, key }),
        }
    }

    /// Returns an iterator over the key-value pairs in an arbitrary order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator yielding mutable references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator yielding mutable references to the values only.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, V, S> DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher + Default,
{
    /// Creates a map with exactly `capacity` cells and a default hasher
    /// builder.
    ///
    /// # Errors
    ///
    /// As for [`with_capacity_and_hasher`](Self::with_capacity_and_hasher).
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

/// A view into a single entry in the map, which may be vacant or occupied.
///
/// Constructed by the [`entry`] method on [`DenseMap`].
///
/// [`entry`]: DenseMap::entry
pub enum Entry<'a, K, V, S> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, S>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, S>),
}

impl<'a, K, V, S> Entry<'a, K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from the closure if the entry is vacant
    /// and returns a mutable reference to the value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Inserts the default value if the entry is vacant and returns a
    /// mutable reference to the value.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential insert.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V, S> {
    map: &'a mut DenseMap<K, V, S>,
    key: K,
}

impl<'a, K, V, S> VacantEntry<'a, K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    /// Gets a reference to the key that would be used when inserting.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to
    /// it.
    pub fn insert(self, value: V) -> &'a mut V {
        let map = self.map;
        let hash = map.hash_builder.hash_one(&self.key);
        let hash_builder = &map.hash_builder;
        let (index, _) = map.table.insert(
            hash,
            (self.key, value),
            |existing, new| existing.0 == new.0,
            |entry| hash_builder.hash_one(&entry.0),
        );
        &mut map.table.entry_mut(index).1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V, S> {
    map: &'a mut DenseMap<K, V, S>,
    index: usize,
}

impl<'a, K, V, S> OccupiedEntry<'a, K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.map.table.entry_ref(self.index).0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.map.table.entry_ref(self.index).1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.map.table.entry_mut(self.index).1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.map.table.entry_mut(self.index).1
    }

    /// Replaces the value in the entry, returning the old value.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        let map = self.map;
        let hash_builder = &map.hash_builder;
        map.table
            .erase_at(self.index, |entry| hash_builder.hash_one(&entry.0))
    }
}

/// An iterator over the key-value pairs of a [`DenseMap`].
pub struct Iter<'a, K, V> {
    inner: crate::dense_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}

/// A mutable iterator over the key-value pairs of a [`DenseMap`].
pub struct IterMut<'a, K, V> {
    inner: crate::dense_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }
}

/// An iterator over the keys of a [`DenseMap`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a [`DenseMap`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// A mutable iterator over the values of a [`DenseMap`].
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// An owning iterator over the key-value pairs of a [`DenseMap`].
pub struct IntoIter<K, V> {
    inner: crate::dense_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<K, V, S> IntoIterator for DenseMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut DenseMap<K, V, S>
where
    K: Hash + Eq + Default,
    V: Default,
    S: BuildHasher,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
