//! A dense hash table storing all entries in one contiguous cell array.
//!
//! The cell array is split into a **hashable prefix** and a **collision
//! suffix**. A 64-bit hash assigns every entry a primary slot inside the
//! prefix. The first entry to claim a primary slot lives there; later
//! entries with the same primary slot are placed in the suffix and linked
//! into a singly linked chain threaded through the per-cell `next` index.
//! Index `0` terminates a chain, so no cell ever names slot `0` as a real
//! successor.
//!
//! ## Design
//!
//! Each cell carries a 64-bit metadata word packing an occupied bit in the
//! least significant position and a 63-bit fingerprint (the hash shifted
//! right by one) above it. Lookups compare fingerprints before touching the
//! caller's equality predicate, which rejects nearly all mismatched keys
//! with a single word comparison.
//!
//! The primary slot for a hash is computed with a mask-and-fold: mask the
//! hash down to the bits covered by the prefix length's highest set bit,
//! then subtract the prefix length once if the result overshoots. This
//! stays on the fast path for any prefix length without a modulo. When the
//! prefix length is not a power of two, the lowest slots receive slightly
//! more traffic, which is an accepted trade.
//!
//! Erased collision cells are recycled through a FIFO free list delimited
//! by a `head`/`tail` pair of watermarks and threaded through the `next`
//! links of the erased cells themselves, so no side allocation is needed.
//! While `head == tail` the free list is empty and fresh collision cells
//! are taken from the bump position at `head`. The array is allocated with
//! one trailing sentinel cell so appending to the free list may write
//! `cells[tail].next` even in the initial state where `tail` sits one past
//! the last real cell.
//!
//! Erasing an entry that heads a chain swaps the first successor into the
//! primary slot and frees the vacated collision cell instead of rewriting
//! the chain, so a primary slot is never left as a dangling chain head.
//!
//! The table grows by a configurable multiple when an insertion would
//! exceed the load factor or when the collision suffix has no cell left.
//! Growth builds a replacement table and re-inserts every entry, then swaps
//! the replacement in; a failed explicit rehash leaves the original intact.
//!
//! [`DenseTable<T>`] stores entries of type `T` and requires the caller to
//! provide hash values and equality predicates for each operation. Prefer
//! the [`DenseMap<K, V, S>`] or [`DenseSet<T, S>`] wrappers unless you are
//! building your own map or set structure on top.
//!
//! ## Invariants
//!
//! The implementation maintains the following invariants:
//!
//! 1. **Population**: `len` equals the number of cells with the occupied
//!    bit set.
//! 2. **Chain heads**: every occupied cell in the hashable prefix is the
//!    head of exactly one chain; an unoccupied prefix cell has `next == 0`
//!    and no predecessor.
//! 3. **Chain membership**: every cell reached over `next` from a chain
//!    head lies in the collision suffix, is occupied, and hashes to the
//!    head's primary slot.
//! 4. **Free list**: with `head != tail`, the cells threaded from
//!    `cells[head].next` through to `tail` are exactly the unoccupied
//!    suffix cells below the bump position `head` that were erased and not
//!    yet reused.
//! 5. **Terminator**: `next == 0` never denotes a real successor.
//!
//! [`DenseMap<K, V, S>`]: crate::dense_map::DenseMap
//! [`DenseSet<T, S>`]: crate::dense_set::DenseSet

use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::mem;

use cfg_if::cfg_if;

use crate::error::Error;

cfg_if! {
    if #[cfg(feature = "ratio-seventy")] {
        const HASHABLE_RATIO: f64 = 0.70;
    } else if #[cfg(feature = "ratio-eighty-two")] {
        const HASHABLE_RATIO: f64 = 0.82;
    } else {
        const HASHABLE_RATIO: f64 = 0.82;
    }
}

const DEFAULT_MAX_LOAD: f32 = 1.0;
const DEFAULT_GROWTH: f32 = 2.0;

/// Least significant metadata bit: set while the cell holds a live entry.
const OCCUPIED: u64 = 1;

/// `next` value terminating a chain. Slot 0 can head a chain but can never
/// be a successor, so the index doubles as the terminator.
const END_OF_CHAIN: usize = 0;

#[derive(Clone, Default)]
struct Cell<T> {
    entry: T,
    meta: u64,
    next: usize,
}

impl<T> Cell<T> {
    #[inline(always)]
    fn is_occupied(&self) -> bool {
        self.meta & OCCUPIED != 0
    }

    #[inline(always)]
    fn fingerprint(&self) -> u64 {
        self.meta >> 1
    }
}

/// A dense hash table with chained collision storage.
///
/// `DenseTable<T>` stores entries of type `T` in one contiguous allocation
/// and provides fast insertion, lookup, and removal. This is a low-level
/// structure: every operation takes the entry's 64-bit hash and an equality
/// predicate, and the mutating operations additionally take a rehash
/// closure used when the table has to grow. Prefer the
/// [`DenseMap`](crate::DenseMap) or [`DenseSet`](crate::DenseSet) wrappers
/// for a keyed interface.
///
/// Entries must be default-constructible; the default value is what an
/// empty cell holds and what an erased entry leaves behind.
///
/// Any mutating operation may move entries between cells, so references and
/// iterators never survive a mutation (the borrow checker enforces this).
#[derive(Clone)]
pub struct DenseTable<T> {
    cells: Vec<Cell<T>>,
    capacity: usize,
    hashable: usize,
    free_head: usize,
    free_tail: usize,
    len: usize,
    max_load: f32,
    growth: f32,
}

impl<T> Debug for DenseTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DenseTable")
            .field("len", &self.len)
            .field("bucket_count", &self.capacity)
            .field("hashable_capacity", &self.hashable)
            .field("free_head", &self.free_head)
            .field("free_tail", &self.free_tail)
            .finish()
    }
}

impl<T> DenseTable<T>
where
    T: Default,
{
    /// Creates a table with exactly `capacity` cells.
    ///
    /// Unlike the standard collections the capacity is taken literally; it
    /// is not rounded up. The hashable prefix is the configured ratio of
    /// the capacity (but at least one slot), and the remaining cells form
    /// the collision suffix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] for a zero capacity,
    /// [`Error::CapacityOverflow`] if `capacity` exceeds
    /// [`max_bucket_count`](Self::max_bucket_count), and
    /// [`Error::AllocFailed`] if the allocator refuses the cell array.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let cells = Self::allocate(capacity)?;
        Ok(Self::from_parts(
            cells,
            capacity,
            DEFAULT_MAX_LOAD,
            DEFAULT_GROWTH,
        ))
    }

    fn allocate(capacity: usize) -> Result<Vec<Cell<T>>, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        if capacity >= Self::max_cells() {
            return Err(Error::CapacityOverflow);
        }
        let mut cells = Vec::new();
        // One extra cell: the free-list tail may point one past the last
        // real cell, and appending writes `cells[tail].next`.
        cells
            .try_reserve_exact(capacity + 1)
            .map_err(|_| Error::AllocFailed)?;
        cells.resize_with(capacity + 1, Cell::default);
        Ok(cells)
    }

    fn from_parts(cells: Vec<Cell<T>>, capacity: usize, max_load: f32, growth: f32) -> Self {
        let hashable = Self::hashable_prefix(capacity);
        Self {
            cells,
            capacity,
            hashable,
            free_head: hashable,
            free_tail: hashable,
            len: 0,
            max_load,
            growth,
        }
    }

    // Clamped to at least one slot so the slot mask is well defined for
    // capacities where the ratio rounds down to zero.
    fn hashable_prefix(capacity: usize) -> usize {
        (((capacity as f64) * HASHABLE_RATIO) as usize).max(1)
    }

    fn max_cells() -> usize {
        isize::MAX as usize / mem::size_of::<Cell<T>>()
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the total number of cells.
    pub fn bucket_count(&self) -> usize {
        self.capacity
    }

    /// Returns the number of primary slots (the hashable prefix length).
    pub fn hashable_capacity(&self) -> usize {
        self.hashable
    }

    /// Returns the largest cell count a table of this entry type can be
    /// constructed with.
    pub fn max_bucket_count(&self) -> usize {
        Self::max_cells() - 1
    }

    /// Returns the current load factor, `len / bucket_count`.
    pub fn load_factor(&self) -> f32 {
        self.len as f32 / self.capacity as f32
    }

    /// Returns the load factor above which an insertion grows the table.
    pub fn max_load_factor(&self) -> f32 {
        self.max_load
    }

    /// Sets the maximum load factor and grows the table if the current
    /// population already exceeds the new bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLoadFactor`] unless `0 < factor <= 1`.
    pub fn set_max_load_factor(
        &mut self,
        factor: f32,
        hasher: impl Fn(&T) -> u64,
    ) -> Result<(), Error> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(Error::InvalidLoadFactor);
        }
        self.max_load = factor;
        self.reserve(self.len, hasher)
    }

    /// Returns the multiple applied to the capacity when the table grows.
    pub fn growth_multiple(&self) -> f32 {
        self.growth
    }

    /// Sets the growth multiple.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrowthMultiple`] unless `multiple > 1`.
    pub fn set_growth_multiple(&mut self, multiple: f32) -> Result<(), Error> {
        if !(multiple > 1.0) {
            return Err(Error::InvalidGrowthMultiple);
        }
        self.growth = multiple;
        Ok(())
    }

    /// Removes all entries, dropping them and keeping the allocation.
    ///
    /// The free list is reset; every cell returns to its default state.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::default();
        }
        self.len = 0;
        self.free_head = self.hashable;
        self.free_tail = self.hashable;
    }

    /// Swaps the complete state of two tables.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    #[inline(always)]
    fn primary_slot(&self, hash: u64) -> usize {
        // Keep the hash bits up to and including the prefix length's
        // highest set bit, then fold a single overshoot back into range.
        // `hashable` is at least 1, so `leading_zeros` is at most 63.
        let mask = u64::MAX >> (self.hashable as u64).leading_zeros();
        let slot = (hash & mask) as usize;
        if slot >= self.hashable {
            slot - self.hashable
        } else {
            slot
        }
    }

    #[inline(always)]
    fn max_entries(&self) -> usize {
        ((self.capacity as f64) * (self.max_load as f64)) as usize
    }

    /// Walks the chain for `hash`, returning `(index, prev)`.
    ///
    /// `index` is the matching cell or `capacity` when absent. `prev` is
    /// the last cell examined before `index`; erase uses it to rewire the
    /// chain without a back pointer, and insert uses it as the splice
    /// point (or, when it is an unoccupied primary slot, as the
    /// destination itself).
    #[inline]
    fn find_slots(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> (usize, usize) {
        let fingerprint = hash >> 1;
        let mut prev = 0;
        let mut index = self.primary_slot(hash);
        loop {
            let cell = &self.cells[index];
            if cell.is_occupied() && cell.fingerprint() == fingerprint && eq(&cell.entry) {
                return (index, prev);
            }
            prev = index;
            index = cell.next;
            if index == END_OF_CHAIN {
                return (self.capacity, prev);
            }
        }
    }

    /// Finds an entry by hash and equality predicate.
    pub fn find(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let (index, _) = self.find_slots(hash, eq);
        if index == self.capacity {
            None
        } else {
            Some(&self.cells[index].entry)
        }
    }

    /// Finds an entry by hash and equality predicate, returning a mutable
    /// reference.
    ///
    /// Mutating state that participates in hashing or equality is a logic
    /// error and leaves the entry unreachable.
    pub fn find_mut(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&mut T> {
        if self.len == 0 {
            return None;
        }
        let (index, _) = self.find_slots(hash, eq);
        if index == self.capacity {
            None
        } else {
            Some(&mut self.cells[index].entry)
        }
    }

    pub(crate) fn find_index(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let (index, _) = self.find_slots(hash, eq);
        (index != self.capacity).then_some(index)
    }

    pub(crate) fn entry_ref(&self, index: usize) -> &T {
        &self.cells[index].entry
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> &mut T {
        &mut self.cells[index].entry
    }

    /// Inserts an entry, returning its cell index and whether it was newly
    /// inserted.
    ///
    /// If an existing entry matches, nothing changes and the index of the
    /// existing entry is returned with `false`; the new entry is dropped.
    /// The equality predicate receives `(existing, new)`. The `hasher`
    /// closure must produce each entry's hash; it is consulted when the
    /// insertion forces the table to grow and every entry is re-slotted.
    ///
    /// Growth aborts the process if the allocator fails, as the standard
    /// collections do; use [`rehash`](Self::rehash) or
    /// [`reserve`](Self::reserve) ahead of time for fallible resizing.
    pub fn insert(
        &mut self,
        hash: u64,
        entry: T,
        eq: impl Fn(&T, &T) -> bool,
        hasher: impl Fn(&T) -> u64,
    ) -> (usize, bool) {
        self.insert_inner(hash, entry, &eq, &hasher)
    }

    fn insert_inner(
        &mut self,
        hash: u64,
        entry: T,
        eq: &dyn Fn(&T, &T) -> bool,
        hasher: &dyn Fn(&T) -> u64,
    ) -> (usize, bool) {
        loop {
            let (index, prev) = self.find_slots(hash, |probe| eq(probe, &entry));
            if index != self.capacity {
                return (index, false);
            }
            if self.len + 1 > self.max_entries() {
                self.grow(hasher);
                continue;
            }
            let slot = if self.cells[prev].is_occupied() {
                // The chain ran off its end at `prev`; splice in a fresh
                // collision cell behind it.
                match self.take_collision_slot() {
                    Some(slot) => {
                        self.cells[prev].next = slot;
                        slot
                    }
                    None => {
                        self.grow(hasher);
                        continue;
                    }
                }
            } else {
                // `prev` is the entry's own unoccupied primary slot.
                prev
            };
            let cell = &mut self.cells[slot];
            cell.entry = entry;
            cell.meta = hash | OCCUPIED;
            cell.next = END_OF_CHAIN;
            self.len += 1;
            return (slot, true);
        }
    }

    /// Takes a collision cell, preferring recycled cells over the bump
    /// position. Returns `None` when the suffix is exhausted.
    fn take_collision_slot(&mut self) -> Option<usize> {
        if self.free_head == self.free_tail {
            if self.free_head >= self.capacity {
                return None;
            }
            let slot = self.free_head;
            self.free_head += 1;
            self.free_tail += 1;
            Some(slot)
        } else {
            let slot = self.cells[self.free_head].next;
            if slot == self.free_tail {
                self.free_tail = self.free_head;
            } else {
                let next = self.cells[slot].next;
                self.cells[self.free_head].next = next;
            }
            Some(slot)
        }
    }

    /// Removes an entry by hash and equality predicate, returning it.
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let (index, prev) = self.find_slots(hash, eq);
        if index == self.capacity {
            return None;
        }
        Some(self.unlink(index, prev))
    }

    fn unlink(&mut self, index: usize, prev: usize) -> T {
        let next = self.cells[index].next;
        let freed = if index < self.hashable {
            if next == END_OF_CHAIN {
                self.cells[index].meta &= !OCCUPIED;
                self.len -= 1;
                return mem::take(&mut self.cells[index].entry);
            }
            // Move the first successor up so the primary slot remains the
            // chain head, then free the vacated collision cell.
            self.cells.swap(index, next);
            next
        } else {
            self.cells[prev].next = next;
            index
        };
        let entry = mem::take(&mut self.cells[freed].entry);
        self.cells[freed].meta &= !OCCUPIED;
        self.cells[freed].next = END_OF_CHAIN;
        // Append to the free-list FIFO. The previous tail is unoccupied
        // (or the sentinel), so its `next` link is free for threading.
        self.cells[self.free_tail].next = freed;
        self.free_tail = freed;
        self.len -= 1;
        entry
    }

    pub(crate) fn erase_at(&mut self, index: usize, hasher: impl Fn(&T) -> u64) -> T {
        let hash = hasher(&self.cells[index].entry);
        let prev = self.chain_prev(hash, index);
        self.unlink(index, prev)
    }

    // Re-walks the chain from the primary slot; cheap because chains are
    // short, and it spares every cell a back pointer.
    fn chain_prev(&self, hash: u64, index: usize) -> usize {
        let mut prev = 0;
        let mut cursor = self.primary_slot(hash);
        while cursor != index {
            prev = cursor;
            cursor = self.cells[cursor].next;
        }
        prev
    }

    /// Retains only the entries for which `keep` returns `true`.
    ///
    /// The closure may mutate entries, but mutating state that participates
    /// in hashing or equality is a logic error.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool, hasher: impl Fn(&T) -> u64) {
        let mut index = 0;
        while index < self.capacity {
            if self.cells[index].is_occupied() && !keep(&mut self.cells[index].entry) {
                // Erasing a chain head swaps its successor into this slot,
                // so the slot is re-tested before advancing.
                self.erase_at(index, &hasher);
            } else {
                index += 1;
            }
        }
    }

    /// Rebuilds the table with at least `count` cells (more if the current
    /// population requires it under the configured load factor).
    ///
    /// Every entry is re-slotted with the `hasher` closure. The replacement
    /// is fully constructed before it is swapped in, so the table is left
    /// untouched when an error is returned.
    ///
    /// # Errors
    ///
    /// As for [`with_capacity`](Self::with_capacity).
    pub fn rehash(&mut self, count: usize, hasher: impl Fn(&T) -> u64) -> Result<(), Error> {
        let min_count = ((self.len as f64) / (self.max_load as f64)) as usize;
        let count = count.max(min_count);
        let cells = Self::allocate(count)?;
        self.rebuild(cells, count, &hasher);
        Ok(())
    }

    /// Grows the table if it cannot hold `count` entries within the
    /// configured load factor. A no-op otherwise.
    ///
    /// # Errors
    ///
    /// As for [`rehash`](Self::rehash).
    pub fn reserve(&mut self, count: usize, hasher: impl Fn(&T) -> u64) -> Result<(), Error> {
        if count > self.max_entries() {
            self.rehash(count, hasher)?;
        }
        Ok(())
    }

    #[cold]
    fn grow(&mut self, hasher: &dyn Fn(&T) -> u64) {
        // The multiple is > 1 but may round down to the current capacity
        // for small tables; growth must always make progress.
        let new_capacity = (((self.capacity as f64) * (self.growth as f64)) as usize)
            .max(self.capacity + 1);
        let mut cells = Vec::new();
        cells.resize_with(new_capacity + 1, Cell::default);
        self.rebuild(cells, new_capacity, hasher);
    }

    fn rebuild(&mut self, cells: Vec<Cell<T>>, capacity: usize, hasher: &dyn Fn(&T) -> u64) {
        let mut replacement = Self::from_parts(cells, capacity, self.max_load, self.growth);
        for index in 0..self.capacity {
            if self.cells[index].is_occupied() {
                let entry = mem::take(&mut self.cells[index].entry);
                let hash = hasher(&entry);
                // Entries are already unique, so the probe never matches.
                replacement.insert_inner(hash, entry, &|_, _| false, hasher);
            }
        }
        mem::swap(self, &mut replacement);
    }

    /// Returns an iterator over the entries in cell-index order.
    ///
    /// The order is unrelated to insertion order. The iterator is stable
    /// only in the absence of mutation.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.cells[..self.capacity].iter(),
            remaining: self.len,
        }
    }

    /// Returns an iterator yielding mutable references to the entries.
    ///
    /// Mutating state that participates in hashing or equality is a logic
    /// error.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            inner: self.cells[..self.capacity].iter_mut(),
            remaining: self.len,
        }
    }
}

#[cfg(feature = "stats")]
impl<T> DenseTable<T>
where
    T: Default,
{
    /// Collects occupancy and chain-length statistics for analysis.
    pub fn chain_stats(&self) -> ChainStats {
        let mut stats = ChainStats {
            entries: self.len,
            bucket_count: self.capacity,
            hashable_capacity: self.hashable,
            occupied_primary: 0,
            occupied_collision: 0,
            free_list_len: 0,
            max_chain_len: 0,
            chain_histogram: [0; CHAIN_HISTOGRAM_BUCKETS],
        };

        for slot in 0..self.hashable {
            if !self.cells[slot].is_occupied() {
                continue;
            }
            stats.occupied_primary += 1;
            let mut length = 1;
            let mut cursor = self.cells[slot].next;
            while cursor != END_OF_CHAIN {
                stats.occupied_collision += 1;
                length += 1;
                cursor = self.cells[cursor].next;
            }
            stats.max_chain_len = stats.max_chain_len.max(length);
            stats.chain_histogram[(length - 1).min(CHAIN_HISTOGRAM_BUCKETS - 1)] += 1;
        }

        if self.free_head != self.free_tail {
            let mut cursor = self.cells[self.free_head].next;
            loop {
                stats.free_list_len += 1;
                if cursor == self.free_tail {
                    break;
                }
                cursor = self.cells[cursor].next;
            }
        }

        stats
    }
}

/// Number of chain-length buckets tracked by [`ChainStats`]; the last
/// bucket collects all longer chains.
#[cfg(feature = "stats")]
pub const CHAIN_HISTOGRAM_BUCKETS: usize = 8;

/// Occupancy and chain-length statistics for a [`DenseTable`].
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct ChainStats {
    /// Number of entries currently in the table.
    pub entries: usize,
    /// Total number of cells.
    pub bucket_count: usize,
    /// Number of primary slots.
    pub hashable_capacity: usize,
    /// Occupied cells in the hashable prefix.
    pub occupied_primary: usize,
    /// Occupied cells in the collision suffix.
    pub occupied_collision: usize,
    /// Erased collision cells waiting on the free list.
    pub free_list_len: usize,
    /// Longest chain, counting the head.
    pub max_chain_len: usize,
    /// Chain count by length; index `i` holds chains of length `i + 1`,
    /// with the final bucket collecting everything longer.
    pub chain_histogram: [usize; CHAIN_HISTOGRAM_BUCKETS],
}

#[cfg(all(feature = "stats", feature = "std"))]
impl ChainStats {
    /// Pretty-prints the statistics to stdout.
    pub fn print(&self) {
        println!("=== Dense Table Chain Statistics ===");
        println!(
            "Population: {}/{} cells ({:.2}% load factor)",
            self.entries,
            self.bucket_count,
            if self.bucket_count == 0 {
                0.0
            } else {
                self.entries as f64 / self.bucket_count as f64 * 100.0
            }
        );
        println!(
            "Primary region: {}/{} slots occupied",
            self.occupied_primary, self.hashable_capacity
        );
        println!(
            "Collision region: {}/{} cells occupied, {} on the free list",
            self.occupied_collision,
            self.bucket_count - self.hashable_capacity,
            self.free_list_len
        );
        println!("Longest chain: {}", self.max_chain_len);

        let max = self.chain_histogram.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }
        let max_bar = 60usize;
        println!("Chains by length:");
        for (i, &count) in self.chain_histogram.iter().enumerate() {
            let label = if i + 1 == CHAIN_HISTOGRAM_BUCKETS {
                alloc::format!("{:>2}+", i + 1)
            } else {
                alloc::format!("{:>3}", i + 1)
            };
            let width = count * max_bar / max;
            println!("{} | {} ({})", label, "█".repeat(width), count);
        }
    }
}

/// An iterator over the entries of a [`DenseTable`].
///
/// Created by [`iter`](DenseTable::iter). Yields `&T` in cell-index order.
pub struct Iter<'a, T> {
    inner: core::slice::Iter<'a, Cell<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for cell in self.inner.by_ref() {
            if cell.is_occupied() {
                self.remaining -= 1;
                return Some(&cell.entry);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// A mutable iterator over the entries of a [`DenseTable`].
///
/// Created by [`iter_mut`](DenseTable::iter_mut).
pub struct IterMut<'a, T> {
    inner: core::slice::IterMut<'a, Cell<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for cell in self.inner.by_ref() {
            if cell.is_occupied() {
                self.remaining -= 1;
                return Some(&mut cell.entry);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// An owning iterator over the entries of a [`DenseTable`].
///
/// Created by the `IntoIterator` implementation.
pub struct IntoIter<T> {
    inner: alloc::vec::IntoIter<Cell<T>>,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for cell in self.inner.by_ref() {
            if cell.is_occupied() {
                self.remaining -= 1;
                return Some(cell.entry);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for DenseTable<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> IntoIter<T> {
        self.cells.truncate(self.capacity);
        IntoIter {
            remaining: self.len,
            inner: self.cells.into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a DenseTable<T>
where
    T: Default,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use core::hash::Hasher;
    use std::collections::HashSet;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    fn identity(entry: &u64) -> u64 {
        *entry
    }

    fn eq(a: &u64, b: &u64) -> bool {
        a == b
    }

    /// Checks the structural invariants of the table: population count,
    /// chain-head and chain-membership rules, and free-list exactness.
    fn check_invariants<T: Default>(table: &DenseTable<T>, hasher: impl Fn(&T) -> u64) {
        let occupied = table.cells[..table.capacity]
            .iter()
            .filter(|cell| cell.is_occupied())
            .count();
        assert_eq!(occupied, table.len, "population does not match len");

        let mut chained = vec![false; table.capacity];
        for slot in 0..table.hashable {
            let cell = &table.cells[slot];
            if !cell.is_occupied() {
                assert_eq!(cell.next, END_OF_CHAIN, "empty primary slot has a chain");
                continue;
            }
            assert_eq!(
                table.primary_slot(hasher(&cell.entry)),
                slot,
                "chain head stored in a foreign slot"
            );
            let mut cursor = cell.next;
            while cursor != END_OF_CHAIN {
                assert!(
                    cursor >= table.hashable && cursor < table.capacity,
                    "chain member outside the collision region"
                );
                assert!(
                    table.cells[cursor].is_occupied(),
                    "chain passes through an empty cell"
                );
                assert!(!chained[cursor], "cell linked into two chains");
                chained[cursor] = true;
                assert_eq!(
                    table.primary_slot(hasher(&table.cells[cursor].entry)),
                    slot,
                    "chain member belongs to a different slot"
                );
                cursor = table.cells[cursor].next;
            }
        }
        for index in table.hashable..table.capacity {
            if table.cells[index].is_occupied() {
                assert!(chained[index], "occupied collision cell not on any chain");
            }
        }

        let mut free = vec![false; table.capacity];
        if table.free_head != table.free_tail {
            let mut cursor = table.cells[table.free_head].next;
            loop {
                assert!(
                    cursor >= table.hashable && cursor < table.capacity,
                    "free list escapes the collision region"
                );
                assert!(
                    !table.cells[cursor].is_occupied(),
                    "occupied cell on the free list"
                );
                assert!(!free[cursor], "free list visits a cell twice");
                free[cursor] = true;
                if cursor == table.free_tail {
                    break;
                }
                cursor = table.cells[cursor].next;
            }
        }
        for index in table.hashable..table.capacity.min(table.free_head) {
            assert_eq!(
                free[index],
                !table.cells[index].is_occupied(),
                "erased cell missing from the free list"
            );
        }
    }

    #[test]
    fn construction_validates_capacity() {
        assert_eq!(
            DenseTable::<u64>::with_capacity(0).unwrap_err(),
            Error::InvalidCapacity
        );
        assert_eq!(
            DenseTable::<u64>::with_capacity(usize::MAX).unwrap_err(),
            Error::CapacityOverflow
        );

        let table = DenseTable::<u64>::with_capacity(8).unwrap();
        assert_eq!(table.bucket_count(), 8);
        assert_eq!(table.hashable_capacity(), 6);
        assert!(table.is_empty());
        assert!(table.max_bucket_count() > 8);
    }

    #[test]
    fn minimal_capacity_has_one_primary_slot() {
        let mut table = DenseTable::<u64>::with_capacity(1).unwrap();
        assert_eq!(table.hashable_capacity(), 1);
        let (_, inserted) = table.insert(7, 7, eq, identity);
        assert!(inserted);
        assert_eq!(table.find(7, |v| *v == 7), Some(&7));
        // A second colliding entry has nowhere to chain and forces growth.
        let (_, inserted) = table.insert(9, 9, eq, identity);
        assert!(inserted);
        assert!(table.bucket_count() > 1);
        assert_eq!(table.find(7, |v| *v == 7), Some(&7));
        assert_eq!(table.find(9, |v| *v == 9), Some(&9));
        check_invariants(&table, identity);
    }

    // With 20 cells the hashable prefix is 16 slots, so the keys 5, 21, 37,
    // 53, and 69 all collapse onto primary slot 5 under an identity hash.
    const COLLIDERS: [u64; 5] = [5, 21, 37, 53, 69];

    #[test]
    fn colliding_keys_share_one_chain() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        assert_eq!(table.hashable_capacity(), 16);

        let mut slots = Vec::new();
        for key in COLLIDERS {
            let (slot, inserted) = table.insert(key, key, eq, identity);
            assert!(inserted);
            slots.push(slot);
        }
        assert_eq!(table.len(), 5);
        // The first key claims the primary slot; the rest take collision
        // cells in bump order.
        assert_eq!(slots, vec![5, 16, 17, 18, 19]);

        for key in COLLIDERS {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);
    }

    #[test]
    fn duplicate_insert_changes_nothing() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in COLLIDERS {
            table.insert(key, key, eq, identity);
        }
        let (slot, inserted) = table.insert(5, 5, eq, identity);
        assert!(!inserted);
        assert_eq!(slot, 5);
        assert_eq!(table.len(), 5);
        check_invariants(&table, identity);
    }

    #[test]
    fn erase_unlinks_collision_cell() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in COLLIDERS {
            table.insert(key, key, eq, identity);
        }

        assert_eq!(table.remove(21, |v| *v == 21), Some(21));
        assert_eq!(table.len(), 4);
        assert!(table.find(21, |v| *v == 21).is_none());
        for key in [5, 37, 53, 69] {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);

        // The freed cell is recycled before the bump position.
        let (slot, inserted) = table.insert(85, 85, eq, identity);
        assert!(inserted);
        assert_eq!(slot, 16);
        check_invariants(&table, identity);
    }

    #[test]
    fn erase_of_chain_head_promotes_successor() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in [5u64, 21, 37] {
            table.insert(key, key, eq, identity);
        }

        assert_eq!(table.remove(5, |v| *v == 5), Some(5));
        assert!(table.find(5, |v| *v == 5).is_none());
        assert_eq!(table.find(21, |v| *v == 21), Some(&21));
        assert_eq!(table.find(37, |v| *v == 37), Some(&37));
        assert_eq!(table.len(), 2);
        check_invariants(&table, identity);
    }

    #[test]
    fn erase_of_lone_primary_leaves_slot_empty() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        table.insert(5, 5, eq, identity);
        assert_eq!(table.remove(5, |v| *v == 5), Some(5));
        assert!(table.is_empty());
        assert!(table.find(5, |v| *v == 5).is_none());
        assert_eq!(table.remove(5, |v| *v == 5), None);
        check_invariants(&table, identity);
    }

    #[test]
    fn erased_keys_can_be_reinserted() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in COLLIDERS {
            table.insert(key, key, eq, identity);
        }
        assert_eq!(table.remove(21, |v| *v == 21), Some(21));
        assert_eq!(table.remove(37, |v| *v == 37), Some(37));
        assert_eq!(table.remove(53, |v| *v == 53), Some(53));

        for key in [53u64, 21, 37] {
            let (_, inserted) = table.insert(key, key, eq, identity);
            assert!(inserted);
        }
        assert_eq!(table.len(), 5);
        for key in COLLIDERS {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);
    }

    #[test]
    fn free_list_is_fifo() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in COLLIDERS {
            table.insert(key, key, eq, identity);
        }
        // 21 sits in cell 16, 69 in cell 19.
        table.remove(21, |v| *v == 21);
        table.remove(69, |v| *v == 69);

        let (first, _) = table.insert(85, 85, eq, identity);
        let (second, _) = table.insert(101, 101, eq, identity);
        assert_eq!(first, 16);
        assert_eq!(second, 19);
        check_invariants(&table, identity);
    }

    #[test]
    fn full_collision_region_forces_growth() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in COLLIDERS {
            table.insert(key, key, eq, identity);
        }
        // The suffix holds four cells and they are all taken; the next
        // collider doubles the table.
        let (_, inserted) = table.insert(85, 85, eq, identity);
        assert!(inserted);
        assert_eq!(table.bucket_count(), 40);
        for key in [5u64, 21, 37, 53, 69, 85] {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);
    }

    #[test]
    fn load_factor_bound_holds_through_growth() {
        let mut table = DenseTable::<u64>::with_capacity(4).unwrap();
        for key in 0..256u64 {
            let (_, inserted) = table.insert(key, key, eq, identity);
            assert!(inserted);
            assert!(table.load_factor() <= table.max_load_factor());
        }
        assert_eq!(table.len(), 256);
        assert_eq!(table.iter().count(), 256);
        for key in 0..256u64 {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);
    }

    #[test]
    fn rehash_preserves_entries() {
        let mut table = DenseTable::<u64>::with_capacity(8).unwrap();
        for key in 0..6u64 {
            table.insert(key, key, eq, identity);
        }

        table.rehash(64, identity).unwrap();
        assert_eq!(table.bucket_count(), 64);
        assert_eq!(table.len(), 6);
        for key in 0..6u64 {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);

        // A hint below the population floor is raised to fit it.
        table.rehash(1, identity).unwrap();
        assert_eq!(table.bucket_count(), 6);
        assert_eq!(table.len(), 6);
        for key in 0..6u64 {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);
    }

    #[test]
    fn rehash_of_empty_table_rejects_zero() {
        let mut table = DenseTable::<u64>::with_capacity(8).unwrap();
        assert_eq!(table.rehash(0, identity).unwrap_err(), Error::InvalidCapacity);
        assert_eq!(table.bucket_count(), 8);
    }

    #[test]
    fn reserve_is_a_hint() {
        let mut table = DenseTable::<u64>::with_capacity(8).unwrap();
        table.reserve(4, identity).unwrap();
        assert_eq!(table.bucket_count(), 8);
        table.reserve(100, identity).unwrap();
        assert_eq!(table.bucket_count(), 100);
    }

    #[test]
    fn load_factor_and_growth_validation() {
        let mut table = DenseTable::<u64>::with_capacity(8).unwrap();
        assert_eq!(
            table.set_max_load_factor(0.0, identity).unwrap_err(),
            Error::InvalidLoadFactor
        );
        assert_eq!(
            table.set_max_load_factor(1.1, identity).unwrap_err(),
            Error::InvalidLoadFactor
        );
        table.set_max_load_factor(0.5, identity).unwrap();
        assert_eq!(table.max_load_factor(), 0.5);

        assert_eq!(
            table.set_growth_multiple(1.0).unwrap_err(),
            Error::InvalidGrowthMultiple
        );
        table.set_growth_multiple(4.0).unwrap();
        assert_eq!(table.growth_multiple(), 4.0);
    }

    #[test]
    fn lowered_load_factor_grows_immediately() {
        let mut table = DenseTable::<u64>::with_capacity(8).unwrap();
        for key in 0..8u64 {
            table.insert(key, key, eq, identity);
        }
        table.set_max_load_factor(0.5, identity).unwrap();
        assert!(table.bucket_count() >= 16);
        for key in 0..8u64 {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);
    }

    #[test]
    fn clear_resets_free_list() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in COLLIDERS {
            table.insert(key, key, eq, identity);
        }
        table.remove(21, |v| *v == 21);
        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.bucket_count(), 20);
        assert!(table.iter().next().is_none());
        check_invariants(&table, identity);

        for key in COLLIDERS {
            let (_, inserted) = table.insert(key, key, eq, identity);
            assert!(inserted);
        }
        assert_eq!(table.len(), 5);
        check_invariants(&table, identity);
    }

    #[test]
    fn retain_keeps_matching_entries() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in [5u64, 21, 37, 53, 2, 9] {
            table.insert(key, key, eq, identity);
        }
        table.retain(|entry| *entry % 2 == 1, identity);
        assert_eq!(table.len(), 5);
        assert!(table.find(2, |v| *v == 2).is_none());
        for key in [5u64, 21, 37, 53, 9] {
            assert_eq!(table.find(key, |v| *v == key), Some(&key));
        }
        check_invariants(&table, identity);

        table.retain(|_| false, identity);
        assert!(table.is_empty());
        check_invariants(&table, identity);
    }

    #[test]
    fn swap_exchanges_state() {
        let mut a = DenseTable::<u64>::with_capacity(8).unwrap();
        let mut b = DenseTable::<u64>::with_capacity(16).unwrap();
        a.insert(1, 1, eq, identity);
        a.swap(&mut b);
        assert!(a.is_empty());
        assert_eq!(a.bucket_count(), 16);
        assert_eq!(b.len(), 1);
        assert_eq!(b.find(1, |v| *v == 1), Some(&1));
    }

    #[test]
    fn iterators_visit_each_entry_once() {
        let mut table = DenseTable::<u64>::with_capacity(32).unwrap();
        for key in 0..20u64 {
            table.insert(key, key, eq, identity);
        }

        let iter = table.iter();
        assert_eq!(iter.len(), 20);
        let seen: HashSet<u64> = iter.copied().collect();
        assert_eq!(seen.len(), 20);

        for entry in table.iter_mut() {
            *entry += 0;
        }

        let owned: HashSet<u64> = table.into_iter().collect();
        assert_eq!(owned, (0..20).collect::<HashSet<u64>>());
    }

    #[test]
    fn find_uses_fingerprint_before_equality() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        table.insert(5, 5, eq, identity);
        // Hash 21 maps to the same slot but carries a different
        // fingerprint; the equality predicate must never run.
        assert!(table
            .find(21, |_| panic!("equality called on fingerprint mismatch"))
            .is_none());
    }

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn random() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn hash(&self, key: u64) -> u64 {
            let mut hasher = SipHasher::new_with_keys(self.k0, self.k1);
            hasher.write_u64(key);
            hasher.finish()
        }
    }

    #[test]
    fn randomized_churn_matches_model() {
        let state = HashState::random();
        let mut rng = OsRng;
        let mut table = DenseTable::<u64>::with_capacity(16).unwrap();
        let mut model: HashSet<u64> = HashSet::new();

        for round in 0..4096 {
            let key = rng.try_next_u64().unwrap() % 512;
            let hash = state.hash(key);
            if rng.try_next_u64().unwrap() % 3 == 0 {
                let removed = table.remove(hash, |v| *v == key);
                assert_eq!(removed.is_some(), model.remove(&key));
            } else {
                let (_, inserted) = table.insert(hash, key, eq, |v| state.hash(*v));
                assert_eq!(inserted, model.insert(key));
            }
            assert_eq!(table.len(), model.len());
            if round % 64 == 0 {
                check_invariants(&table, |v| state.hash(*v));
            }
        }

        check_invariants(&table, |v| state.hash(*v));
        for &key in &model {
            assert_eq!(table.find(state.hash(key), |v| *v == key), Some(&key));
        }
        let drained: HashSet<u64> = table.into_iter().collect();
        assert_eq!(drained, model);
    }

    #[test]
    fn insert_erase_all_leaves_table_empty() {
        let state = HashState::random();
        let mut table = DenseTable::<u64>::with_capacity(8).unwrap();
        let keys: Vec<u64> = (0..300).collect();

        for &key in &keys {
            table.insert(state.hash(key), key, eq, |v| state.hash(*v));
        }
        assert_eq!(table.len(), keys.len());

        for &key in keys.iter().rev() {
            assert_eq!(table.remove(state.hash(key), |v| *v == key), Some(key));
        }
        assert!(table.is_empty());
        assert!(table.iter().next().is_none());
        check_invariants(&table, |v| state.hash(*v));
    }

    #[cfg(feature = "stats")]
    #[test]
    fn chain_stats_counts_regions() {
        let mut table = DenseTable::<u64>::with_capacity(20).unwrap();
        for key in COLLIDERS {
            table.insert(key, key, eq, identity);
        }
        table.insert(2, 2, eq, identity);
        table.remove(21, |v| *v == 21);

        let stats = table.chain_stats();
        assert_eq!(stats.entries, 5);
        assert_eq!(stats.occupied_primary, 2);
        assert_eq!(stats.occupied_collision, 3);
        assert_eq!(stats.free_list_len, 1);
        assert_eq!(stats.max_chain_len, 4);
    }
}
