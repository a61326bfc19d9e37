use crate::error::Error;
use crate::error::Result;

/// The smallest bucket count a table is ever created with.
pub const MIN_CAPACITY: usize = 1 << 4;

/// The largest bucket count a table may grow to.
pub const MAX_CAPACITY: usize = 1 << 30;

/// The default ratio of live entries to buckets at which a table doubles.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Sizing and growth policy for a single table.
///
/// Every set owns its own copy, so two sets built with different policies
/// never influence each other. Growth always doubles the bucket count; only
/// the starting point, the trigger ratio and the ceiling are configurable.
///
/// # Examples
///
/// ```rust
/// use chain_hash::TableConfig;
///
/// let config = TableConfig {
///     initial_capacity: 64,
///     load_factor: 0.5,
///     ..TableConfig::default()
/// };
/// assert!(config.validate().is_ok());
///
/// let bad = TableConfig {
///     load_factor: 1.5,
///     ..TableConfig::default()
/// };
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Requested starting bucket count. Rounded up to a power of two and never
    /// below [`MIN_CAPACITY`].
    pub initial_capacity: usize,
    /// Ratio of entries to buckets that triggers growth. Must be finite and in
    /// `(0.0, 1.0]`.
    pub load_factor: f32,
    /// Bucket count the table will refuse to grow past. Rounded up to a power
    /// of two and clamped to `MIN_CAPACITY..=MAX_CAPACITY`.
    pub max_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TableConfig {
    /// The default policy: 16 buckets, load factor 0.75, growth up to
    /// [`MAX_CAPACITY`].
    pub const fn new() -> Self {
        Self {
            initial_capacity: MIN_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            max_capacity: MAX_CAPACITY,
        }
    }

    /// The default policy with a different starting bucket count.
    pub const fn with_initial_capacity(capacity: usize) -> Self {
        Self {
            initial_capacity: capacity,
            ..Self::new()
        }
    }

    /// Checks that the policy describes a constructible table.
    pub fn validate(&self) -> Result<()> {
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(Error::InvalidLoadFactor);
        }
        self.bucket_count().map(|_| ())
    }

    /// The normalized growth ceiling.
    pub(crate) fn bucket_limit(&self) -> usize {
        // MAX_CAPACITY is a power of two, so this cannot overflow.
        self.max_capacity
            .clamp(MIN_CAPACITY, MAX_CAPACITY)
            .next_power_of_two()
    }

    /// The normalized starting bucket count.
    pub(crate) fn bucket_count(&self) -> Result<usize> {
        let max = self.bucket_limit();
        match self.initial_capacity.max(MIN_CAPACITY).checked_next_power_of_two() {
            Some(count) if count <= max => Ok(count),
            _ => Err(Error::InvalidCapacity {
                requested: self.initial_capacity,
                max,
            }),
        }
    }

    /// Smallest entry count `n` with `n >= load_factor * capacity`.
    pub(crate) fn grow_threshold(&self, capacity: usize) -> usize {
        let exact = self.load_factor as f64 * capacity as f64;
        let truncated = exact as usize;
        if (truncated as f64) < exact {
            truncated + 1
        } else {
            truncated
        }
    }
}
