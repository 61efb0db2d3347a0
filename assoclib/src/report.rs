use std::io::Write;
use std::path::{Path, PathBuf};
use serde::{Serialize, Serializer};
use crate::cache::{CacheStatistics, CacheTrait};
use crate::config::ReplacementPolicyConfig;
use crate::simulator::Simulator;

const HEADER: [&str; 7] = ["Policy", "Associativity", "CacheSize", "BlockSize", "Hits", "Misses", "HitRate"];
const TRACE_COLUMN: &str = "TraceFile";

/// One row of a results table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRow {
    pub policy: ReplacementPolicyConfig,
    pub associativity: u32,
    pub cache_size: u32,
    pub block_size: u32,
    pub hits: u64,
    pub misses: u64,
    #[serde(serialize_with = "two_decimals")]
    pub hit_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_file: Option<String>,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:.2}"))
}

impl ResultRow {
    /// Builds a row from a finished simulation, optionally tagged with the trace it replayed
    pub fn new(simulator: &Simulator, trace_file: Option<String>) -> Self {
        let cache = simulator.cache();
        let config = cache.config();
        let statistics = cache.statistics();
        Self {
            policy: config.replacement_policy,
            associativity: config.associativity,
            cache_size: config.capacity,
            block_size: config.block_size,
            hits: statistics.hits,
            misses: statistics.misses,
            hit_rate: statistics.hit_rate,
            trace_file,
        }
    }

    /// The row as written to a table with or without the TraceFile column
    fn for_table(&self, include_trace: bool) -> Self {
        let trace_file = include_trace.then(|| self.trace_file.clone().unwrap_or_default());
        Self { trace_file, ..self.clone() }
    }
}

/// Writes a table of results, header first
///
/// # Arguments
///
/// * `writer`: Destination of the CSV text
/// * `rows`: The results, in output order
/// * `include_trace`: Whether to add the TraceFile column. Rows without a trace leave it empty
///
/// returns: Result<(), csv::Error>
pub fn write_csv<W: Write>(writer: W, rows: &[ResultRow], include_trace: bool) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    if include_trace {
        csv_writer.write_record(HEADER.iter().chain(std::iter::once(&TRACE_COLUMN)))?;
    } else {
        csv_writer.write_record(HEADER)?;
    }
    for row in rows {
        csv_writer.serialize(row.for_table(include_trace))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// The default export path for a single run, `<trace>-<policy>.csv` next to the trace
pub fn default_csv_path(trace: &Path, simulator: &Simulator) -> PathBuf {
    let mut name = trace.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!("-{}.csv", simulator.cache().config().replacement_policy));
    trace.with_file_name(name)
}

/// Renders the console report for a finished simulation
pub fn summary(simulator: &Simulator) -> String {
    let cache = simulator.cache();
    let config = cache.config();
    let geometry = cache.geometry();
    let statistics: CacheStatistics = cache.statistics();
    format!(
        "Cache Size: {} bytes\n\
         Block Size: {} bytes\n\
         Associativity: {} way\n\
         Replacement Policy: {}\n\
         Number of Sets: {}\n\
         Tag Bits: {}\n\
         Index Bits: {}\n\
         Offset Bits: {}\n\
         ------------------------------------\n\
         Total Cache Accesses: {}\n\
         Total Hits: {}\n\
         Total Misses: {}\n\
         Total Reads: {}\n\
         Total Writes: {}\n\
         Hit Rate: {:.2}%\n\
         Miss Rate: {:.2}%\n",
        config.capacity,
        config.block_size,
        config.associativity,
        config.replacement_policy,
        geometry.num_sets,
        geometry.tag_bits,
        geometry.index_bits,
        geometry.offset_bits,
        statistics.accesses(),
        statistics.hits,
        statistics.misses,
        statistics.reads,
        statistics.writes,
        statistics.hit_rate,
        statistics.miss_rate,
    )
}
