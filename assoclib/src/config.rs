use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// A list of simulations to run, usually parsed from JSON
///
/// Each case pairs a cache configuration with the trace it should replay. Cases are independent,
/// an invalid configuration only affects its own case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkPlan {
    pub runs: Vec<BenchmarkCase>,
}

/// A single entry of a benchmark plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkCase {
    #[serde(flatten)]
    pub cache: CacheConfig,
    /// Path to the trace, relative paths are resolved against the plan's base directory
    pub trace: PathBuf,
}

/// A configuration for a single cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Total capacity in bytes
    #[serde(alias = "cache_size")]
    pub capacity: u32,
    /// Size of one block (line) in bytes
    pub block_size: u32,
    /// Number of ways per set, 1 for direct mapped
    pub associativity: u32,
    #[serde(alias = "policy")]
    pub replacement_policy: ReplacementPolicyConfig,
}

impl CacheConfig {
    pub fn new(capacity: u32, block_size: u32, associativity: u32, replacement_policy: ReplacementPolicyConfig) -> Self {
        Self {
            capacity,
            block_size,
            associativity,
            replacement_policy,
        }
    }
}

/// The replacement policy - lru or fifo
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[serde(rename = "lru", alias = "LRU", alias = "Lru")]
    LeastRecentlyUsed,
    #[serde(rename = "fifo", alias = "FIFO", alias = "Fifo")]
    FirstInFirstOut,
}

impl ReplacementPolicyConfig {
    /// The lower case name used in reports and output file names
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplacementPolicyConfig::LeastRecentlyUsed => "lru",
            ReplacementPolicyConfig::FirstInFirstOut => "fifo",
        }
    }
}

impl Display for ReplacementPolicyConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplacementPolicyConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(ReplacementPolicyConfig::LeastRecentlyUsed),
            "fifo" => Ok(ReplacementPolicyConfig::FirstInFirstOut),
            other => Err(format!("Unrecognised replacement policy '{other}', expected 'lru' or 'fifo'")),
        }
    }
}
