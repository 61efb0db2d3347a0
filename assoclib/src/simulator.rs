use std::io::BufRead;
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use crate::cache::{CacheStatistics, CacheTrait, GenericCache};
use crate::config::CacheConfig;
use crate::error::{ConfigError, SimulationError};
use crate::trace::parse_line;

/// The simulator replays traces against one cache, and collects results.
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly
#[derive(Debug, Clone)]
pub struct Simulator {
    cache: GenericCache,
    result: SimulationResult,
    simulation_time: Duration,
}

/// The result of a simulation. Can be serialised for machine readable output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Every line seen, blank and malformed lines included
    pub lines_read: u64,
    /// Records handed to the cache, including ones with unrecognised operation codes
    pub records: u64,
    /// Records whose operation code was neither a load nor a store
    pub ignored: u64,
    /// Lines skipped because they could not be parsed
    pub malformed: u64,
    pub statistics: CacheStatistics,
}

impl Simulator {

    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A cache configuration, usually from the command line or a benchmark plan
    ///
    /// returns: Result<Simulator, ConfigError>, failing if the configuration is not a valid cache
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let cache = GenericCache::new(config)?;
        let geometry = cache.geometry();
        info!(
            "{} cache: {} bytes, {} byte blocks, {}-way, {} sets (tag {} bits, index {} bits, offset {} bits)",
            config.replacement_policy,
            geometry.capacity,
            geometry.block_size,
            geometry.associativity,
            geometry.num_sets,
            geometry.tag_bits,
            geometry.index_bits,
            geometry.offset_bits,
        );
        Ok(Self {
            cache,
            result: SimulationResult::default(),
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Simulates the cache using a trace reader
    ///
    /// Lines are read and replayed strictly in order. Malformed lines, including ones that are not
    /// valid UTF-8, are logged and skipped rather than aborting the run. Only I/O errors are
    /// returned, and the statistics snapshot still reflects every access made before the error
    ///
    /// # Arguments
    ///
    /// * `reader`: The trace, one record per line
    ///
    /// returns: Result<&SimulationResult, SimulationError>
    pub fn simulate<B: BufRead>(&mut self, reader: B) -> Result<&SimulationResult, SimulationError> {
        let start = Instant::now();
        let replayed = self.replay(reader);
        let end = Instant::now();
        self.simulation_time += end - start;
        self.result.statistics = self.cache.statistics();
        debug!("Replayed {} lines in {:?}", self.result.lines_read, end - start);
        replayed?;
        Ok(&self.result)
    }

    fn replay<B: BufRead>(&mut self, mut reader: B) -> Result<(), SimulationError> {
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                return Ok(());
            }
            self.result.lines_read += 1;
            let line_number = self.result.lines_read;
            let line = match std::str::from_utf8(&buffer) {
                Ok(line) => line.trim_end_matches(['\n', '\r']),
                Err(_) => {
                    warn!(
                        "Skipping line {line_number}, not valid UTF-8: '{}'",
                        String::from_utf8_lossy(&buffer).trim_end()
                    );
                    self.result.malformed += 1;
                    continue;
                }
            };
            match parse_line(line, line_number) {
                Ok(Some(record)) => {
                    self.result.records += 1;
                    if self.cache.access(record.code, record.address).is_none() {
                        self.result.ignored += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping {e}");
                    self.result.malformed += 1;
                }
            }
        }
    }

    /// The result accumulated over every call to simulate so far
    pub fn get_result(&self) -> &SimulationResult {
        &self.result
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// The simulated cache, for inspecting its configuration, geometry, or contents
    pub fn cache(&self) -> &GenericCache {
        &self.cache
    }
}
