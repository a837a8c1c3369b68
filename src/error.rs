//! Error types for the dense containers.

/// Errors reported by [`DenseTable`], [`DenseMap`], and [`DenseSet`].
///
/// Construction and the explicit resizing operations validate their
/// arguments up front and surface allocator refusals instead of aborting;
/// [`at`](crate::DenseMap::at) reports a missing key distinctly from the
/// `Option`-returning lookups.
///
/// [`DenseTable`]: crate::DenseTable
/// [`DenseMap`]: crate::DenseMap
/// [`DenseSet`]: crate::DenseSet
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A container was constructed with zero cells.
    #[error("capacity must be at least 1")]
    InvalidCapacity,

    /// A requested or grown capacity exceeds the addressable cell count.
    #[error("capacity exceeds the maximum addressable cell count")]
    CapacityOverflow,

    /// A maximum load factor outside `(0, 1]` was supplied.
    #[error("load factor must be greater than zero and not greater than 1")]
    InvalidLoadFactor,

    /// A growth multiple of 1 or less was supplied.
    #[error("growth multiple must be greater than 1")]
    InvalidGrowthMultiple,

    /// `at` was called with a key that is not present.
    #[error("key not present in the container")]
    KeyNotFound,

    /// The allocator refused the cell-array allocation.
    #[error("allocation of the cell array failed")]
    AllocFailed,
}
