use serde::{Deserialize, Serialize};
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::error::ConfigError;
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, ReplacementPolicy};

/// Width of the addresses understood by the cache. Wider inputs are truncated to this many bits
pub const ADDRESS_BITS: u32 = 32;

const ADDRESS_MASK: u64 = (1 << ADDRESS_BITS) - 1;

/// Operation code for a load (read)
pub const LOAD_CODE: u8 = b'l';

/// Operation code for a store (write)
pub const STORE_CODE: u8 = b's';

/// A recognised memory operation
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation {
    Load,
    Store,
}

impl Operation {
    /// Classifies an operation code, returning None for anything which isn't a load or a store
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            LOAD_CODE => Some(Operation::Load),
            STORE_CODE => Some(Operation::Store),
            _ => None,
        }
    }
}

/// The effect of a single access on the cache
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit,
    /// The block was loaded, replacing `evicted` if the set was full
    Miss { evicted: Option<u64> },
}

impl AccessOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, AccessOutcome::Hit)
    }
}

/// One storage slot of the cache
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: u64,
}

/// An address split into its tag, set index, and byte offset
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecomposedAddress {
    pub tag: u64,
    pub index: u64,
    pub offset: u64,
}

/// The validated shape of a cache, derived once from its configuration
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheGeometry {
    pub capacity: u32,
    pub block_size: u32,
    pub associativity: u32,
    pub total_blocks: u32,
    pub num_sets: u32,
    pub offset_bits: u32,
    pub index_bits: u32,
    pub tag_bits: u32,
}

impl CacheGeometry {
    /// Validates a configuration and derives the address layout
    ///
    /// Checks are applied in order, and the first failing rule is reported
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let CacheConfig { capacity, block_size, associativity, .. } = *config;
        if capacity == 0 || block_size == 0 || associativity == 0 {
            return Err(ConfigError::ZeroParameter { capacity, block_size, associativity });
        }
        for (parameter, value) in [("capacity", capacity), ("block size", block_size), ("associativity", associativity)] {
            if !value.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo { parameter, value });
            }
        }
        if capacity % block_size != 0 {
            return Err(ConfigError::CapacityNotMultiple { capacity, block_size });
        }
        let total_blocks = capacity / block_size;
        if associativity > total_blocks {
            return Err(ConfigError::AssociativityExceedsBlocks { associativity, total_blocks });
        }
        let num_sets = total_blocks / associativity;
        if !num_sets.is_power_of_two() {
            return Err(ConfigError::InvalidSetCount { num_sets });
        }
        let offset_bits = block_size.trailing_zeros();
        let index_bits = num_sets.trailing_zeros();
        Ok(Self {
            capacity,
            block_size,
            associativity,
            total_blocks,
            num_sets,
            offset_bits,
            index_bits,
            tag_bits: ADDRESS_BITS - index_bits - offset_bits,
        })
    }

    /// Splits an address into tag, index, and offset after truncating it to [`ADDRESS_BITS`]
    pub fn decompose(&self, address: u64) -> DecomposedAddress {
        let address = address & ADDRESS_MASK;
        DecomposedAddress {
            tag: address >> (self.index_bits + self.offset_bits),
            index: (address >> self.offset_bits) & (self.num_sets as u64 - 1),
            offset: address & (self.block_size as u64 - 1),
        }
    }

    /// Reassembles an address from its parts. The inverse of [`CacheGeometry::decompose`]
    pub fn compose(&self, parts: &DecomposedAddress) -> u64 {
        (parts.tag << (self.index_bits + self.offset_bits)) | (parts.index << self.offset_bits) | parts.offset
    }
}

/// Running totals maintained by the cache. Only ever incremented
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub reads: u64,
    pub writes: u64,
}

/// A read-only snapshot of the counters with the derived rates, in percent
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub reads: u64,
    pub writes: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
}

impl From<CacheCounters> for CacheStatistics {
    fn from(counters: CacheCounters) -> Self {
        let accesses = counters.hits + counters.misses;
        let (hit_rate, miss_rate) = if accesses > 0 {
            (
                counters.hits as f64 / accesses as f64 * 100.0,
                counters.misses as f64 / accesses as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };
        Self {
            hits: counters.hits,
            misses: counters.misses,
            reads: counters.reads,
            writes: counters.writes,
            hit_rate,
            miss_rate,
        }
    }
}

impl CacheStatistics {
    /// Total number of accesses which reached the cache
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch through [`GenericCache`], but it keeps
/// the two policies behind one interface with no overhead
pub trait CacheTrait {
    /// Performs one access, returning None if the operation code is not a load or a store
    ///
    /// Ignored operations leave every counter untouched. On both hits and misses the
    /// implementation updates the line table and the replacement order
    ///
    /// # Arguments
    ///
    /// * `code`: The operation code, see [`LOAD_CODE`] and [`STORE_CODE`]
    /// * `address`: The address of the access, truncated to [`ADDRESS_BITS`]
    ///
    /// returns: Option<AccessOutcome>
    fn access(&mut self, code: u8, address: u64) -> Option<AccessOutcome>;

    /// The configuration the cache was built from
    fn config(&self) -> &CacheConfig;

    /// The derived address layout
    fn geometry(&self) -> &CacheGeometry;

    fn counters(&self) -> &CacheCounters;

    fn statistics(&self) -> CacheStatistics {
        CacheStatistics::from(*self.counters())
    }

    /// The lines of one set, in slot order
    fn lines(&self, set: usize) -> &[CacheLine];

    /// The replacement order of one set, see the policy for its orientation
    fn replacement_order(&self, set: usize) -> Vec<u64>;

    /// Gets the number of lines which have never been filled. Useful for analysing cache
    /// performance or debugging
    fn get_uninitialised_line_count(&self) -> usize;
}

/// A set-associative cache, parameterised by a replacement policy
///
/// Lines are stored in one flat table, set `s` occupying slots `s * ways..(s + 1) * ways`. The
/// policy keeps the per-set replacement order, the table only records validity and tags
#[derive(Debug, Clone)]
pub struct Cache<R: ReplacementPolicy> {
    config: CacheConfig,
    geometry: CacheGeometry,
    lines: Vec<CacheLine>,
    replacement_policy: R,
    counters: CacheCounters,
}

impl<R: ReplacementPolicy> Cache<R> {
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let geometry = CacheGeometry::new(config)?;
        let num_sets = geometry.num_sets as usize;
        let ways = geometry.associativity as usize;
        Ok(Self {
            config: *config,
            geometry,
            lines: vec![CacheLine::default(); num_sets * ways],
            replacement_policy: R::new(num_sets, ways),
            counters: CacheCounters::default(),
        })
    }

    fn set_range(&self, set: usize) -> std::ops::Range<usize> {
        let ways = self.geometry.associativity as usize;
        set * ways..(set + 1) * ways
    }

    fn access_block(&mut self, address: u64) -> AccessOutcome {
        let DecomposedAddress { tag, index, .. } = self.geometry.decompose(address);
        let set = index as usize;
        let range = self.set_range(set);
        // Only search the relevant set
        let lines = &mut self.lines[range];
        if lines.iter().any(|line| line.valid && line.tag == tag) {
            self.counters.hits += 1;
            self.replacement_policy.update_on_hit(set, tag);
            return AccessOutcome::Hit;
        }
        self.counters.misses += 1;
        // Lowest free slot first
        if let Some(line) = lines.iter_mut().find(|line| !line.valid) {
            *line = CacheLine { valid: true, tag };
            self.replacement_policy.insert(set, tag);
            return AccessOutcome::Miss { evicted: None };
        }
        // Set is full, the policy decides the victim
        let evicted = self.replacement_policy.evict(set);
        debug_assert!(evicted.is_some(), "full set {set} has an empty replacement order");
        self.replacement_policy.insert(set, tag);
        if let Some(victim) = evicted {
            let holds_victim = |line: &CacheLine| line.valid && line.tag == victim;
            let slot = lines.iter().position(holds_victim);
            assert!(
                slot.is_some() && slot == lines.iter().rposition(holds_victim),
                "victim tag {victim:#x} must be held by exactly one line of set {set}"
            );
            if let Some(slot) = slot {
                lines[slot].tag = tag;
            }
        }
        AccessOutcome::Miss { evicted }
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn access(&mut self, code: u8, address: u64) -> Option<AccessOutcome> {
        match Operation::from_code(code)? {
            Operation::Load => self.counters.reads += 1,
            Operation::Store => self.counters.writes += 1,
        }
        Some(self.access_block(address))
    }

    fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    fn lines(&self, set: usize) -> &[CacheLine] {
        &self.lines[self.set_range(set)]
    }

    fn replacement_order(&self, set: usize) -> Vec<u64> {
        self.replacement_policy.order(set).iter().copied().collect()
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.lines.iter().filter(|line| !line.valid).count()
    }
}

/// Enum for both cache types provided by the library
///
/// Trait objects would reduce boilerplate, but every trace line would go through a dynamic call.
/// Branching explicitly lets the compiler see the concrete types and inline the policies
#[derive(Debug, Clone)]
pub enum GenericCache {
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    FirstInFirstOut(Cache<FirstInFirstOut>),
}

impl GenericCache {
    /// Builds a cache using the policy named in the configuration
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        Ok(match config.replacement_policy {
            ReplacementPolicyConfig::LeastRecentlyUsed => Cache::<LeastRecentlyUsed>::new(config)?.into(),
            ReplacementPolicyConfig::FirstInFirstOut => Cache::<FirstInFirstOut>::new(config)?.into(),
        })
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<FirstInFirstOut>> for GenericCache {
    fn from(value: Cache<FirstInFirstOut>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl CacheTrait for GenericCache {
    fn access(&mut self, code: u8, address: u64) -> Option<AccessOutcome> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.access(code, address),
            GenericCache::FirstInFirstOut(c) => c.access(code, address),
        }
    }

    fn config(&self) -> &CacheConfig {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.config(),
            GenericCache::FirstInFirstOut(c) => c.config(),
        }
    }

    fn geometry(&self) -> &CacheGeometry {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.geometry(),
            GenericCache::FirstInFirstOut(c) => c.geometry(),
        }
    }

    fn counters(&self) -> &CacheCounters {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.counters(),
            GenericCache::FirstInFirstOut(c) => c.counters(),
        }
    }

    fn lines(&self, set: usize) -> &[CacheLine] {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.lines(set),
            GenericCache::FirstInFirstOut(c) => c.lines(set),
        }
    }

    fn replacement_order(&self, set: usize) -> Vec<u64> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.replacement_order(set),
            GenericCache::FirstInFirstOut(c) => c.replacement_order(set),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.get_uninitialised_line_count(),
            GenericCache::FirstInFirstOut(c) => c.get_uninitialised_line_count(),
        }
    }
}
