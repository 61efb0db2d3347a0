use thiserror::Error;

/// Reasons a cache configuration is rejected at construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cache parameters must be non-zero (capacity {capacity}, block size {block_size}, associativity {associativity})")]
    ZeroParameter {
        capacity: u32,
        block_size: u32,
        associativity: u32,
    },
    #[error("{parameter} ({value}) must be a power of two")]
    NotPowerOfTwo {
        parameter: &'static str,
        value: u32,
    },
    #[error("capacity ({capacity}) must be a multiple of the block size ({block_size})")]
    CapacityNotMultiple {
        capacity: u32,
        block_size: u32,
    },
    #[error("associativity ({associativity}) cannot be greater than the total number of blocks ({total_blocks})")]
    AssociativityExceedsBlocks {
        associativity: u32,
        total_blocks: u32,
    },
    #[error("the number of sets ({num_sets}) must be a non-zero power of two")]
    InvalidSetCount {
        num_sets: u32,
    },
}

/// A trace line which could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed trace line {line_number}: '{line}'")]
pub struct TraceError {
    pub line_number: u64,
    pub line: String,
}

/// Errors raised while driving simulations, wrapping everything below the cache model
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid cache configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
