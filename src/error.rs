use core::alloc::Layout;

/// Errors reported by fallible table and set operations.
///
/// Construction errors ([`InvalidCapacity`], [`InvalidLoadFactor`]) are
/// returned by [`TableConfig::validate`] and the `try_with_config`
/// constructors. Growth errors ([`CapacityOverflow`], [`AllocError`]) are
/// returned by `try_insert`; when one is returned the set is exactly as it
/// was before the call.
///
/// [`InvalidCapacity`]: Error::InvalidCapacity
/// [`InvalidLoadFactor`]: Error::InvalidLoadFactor
/// [`CapacityOverflow`]: Error::CapacityOverflow
/// [`AllocError`]: Error::AllocError
/// [`TableConfig::validate`]: crate::TableConfig::validate
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Growing the bucket array would exceed the configured maximum capacity.
    #[error("hash table capacity overflow")]
    CapacityOverflow,

    /// The allocator could not satisfy a bucket array or entry storage request.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocError {
        /// The layout that could not be allocated.
        layout: Layout,
    },

    /// The requested initial capacity is above the configured maximum.
    #[error("initial capacity {requested} exceeds maximum capacity {max}")]
    InvalidCapacity {
        /// The requested initial bucket count.
        requested: usize,
        /// The maximum bucket count it was checked against.
        max: usize,
    },

    /// The load factor is not a finite number in `(0.0, 1.0]`.
    #[error("load factor must be finite and in (0.0, 1.0]")]
    InvalidLoadFactor,
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn alloc<T>(count: usize) -> Self {
        match Layout::array::<T>(count) {
            Ok(layout) => Error::AllocError { layout },
            Err(_) => Error::CapacityOverflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            Error::CapacityOverflow.to_string(),
            "hash table capacity overflow"
        );
        assert_eq!(
            Error::InvalidCapacity {
                requested: 64,
                max: 32
            }
            .to_string(),
            "initial capacity 64 exceeds maximum capacity 32"
        );
        assert_eq!(
            Error::alloc::<u64>(4).to_string(),
            "memory allocation of 32 bytes failed"
        );
    }

    #[test]
    fn alloc_overflow_is_capacity_overflow() {
        assert_eq!(Error::alloc::<u64>(usize::MAX), Error::CapacityOverflow);
    }
}
