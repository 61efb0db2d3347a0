use std::error::Error;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;
use crate::cache::CacheTrait;
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::report::{default_csv_path, summary, write_csv, ResultRow};
use crate::simulator::Simulator;
use crate::util::{render_trace, strided_trace};

const TRACE: &str = "\
l 0x00000000 4
l 0x00000200 4

s 0x00000000 4
this line is broken
x 0x00000400 4
l 0x00000400 4
l 0x00000000 8
";

fn simulator(associativity: u32, policy: ReplacementPolicyConfig) -> Simulator {
    Simulator::new(&CacheConfig::new(1024, 64, associativity, policy)).unwrap()
}

#[test]
fn replays_a_trace_and_skips_bad_lines() -> Result<(), Box<dyn Error>> {
    let mut simulator = simulator(2, ReplacementPolicyConfig::FirstInFirstOut);
    let result = simulator.simulate(Cursor::new(TRACE))?.clone();
    assert_eq!(result.lines_read, 8);
    assert_eq!(result.records, 6);
    assert_eq!(result.ignored, 1);
    assert_eq!(result.malformed, 1);
    // A, B, A (hit), C evicts A, A misses
    assert_eq!(result.statistics.hits, 1);
    assert_eq!(result.statistics.misses, 4);
    assert_eq!(result.statistics.reads, 4);
    assert_eq!(result.statistics.writes, 1);
    Ok(())
}

#[test]
fn lines_that_are_not_utf8_are_skipped() -> Result<(), Box<dyn Error>> {
    let mut simulator = simulator(1, ReplacementPolicyConfig::LeastRecentlyUsed);
    let trace: &[u8] = b"l 0x0 4\nl 0x\xff\xfe 4\nl 0x400 4\r\nl 0x0 4\n";
    let result = simulator.simulate(Cursor::new(trace))?.clone();
    assert_eq!(result.lines_read, 4);
    assert_eq!(result.records, 3);
    assert_eq!(result.malformed, 1);
    // 0x0 and 0x400 share the only line of set 0
    assert_eq!(result.statistics.misses, 3);
    assert_eq!(result.statistics, simulator.cache().statistics());
    Ok(())
}

/// Fails every read, standing in for a trace whose storage goes away mid-run
struct FailingRead;

impl Read for FailingRead {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "device went away"))
    }
}

#[test]
fn read_errors_keep_the_statistics_current() {
    let mut simulator = simulator(2, ReplacementPolicyConfig::FirstInFirstOut);
    let reader = BufReader::new(Cursor::new(&b"l 0x0 4\nl 0x200 4\n"[..]).chain(FailingRead));
    assert!(simulator.simulate(reader).is_err());
    let result = simulator.get_result();
    assert_eq!(result.lines_read, 2);
    assert_eq!(result.statistics.misses, 2);
    assert_eq!(result.statistics, simulator.cache().statistics());
}

#[test]
fn repeated_simulation_accumulates() -> Result<(), Box<dyn Error>> {
    let mut simulator = simulator(4, ReplacementPolicyConfig::LeastRecentlyUsed);
    let trace = render_trace([(b'l', 0x40), (b'l', 0x80)]);
    simulator.simulate(Cursor::new(&trace))?;
    let result = simulator.simulate(Cursor::new(&trace))?;
    assert_eq!(result.lines_read, 4);
    assert_eq!(result.statistics.misses, 2);
    assert_eq!(result.statistics.hits, 2);
    assert_eq!(simulator.get_result().statistics.hit_rate, 50.0);
    Ok(())
}

#[test]
fn small_working_sets_only_miss_on_the_first_pass() -> Result<(), Box<dyn Error>> {
    for policy in [ReplacementPolicyConfig::LeastRecentlyUsed, ReplacementPolicyConfig::FirstInFirstOut] {
        let mut simulator = Simulator::new(&CacheConfig::new(4096, 64, 4, policy))?;
        let result = simulator.simulate(Cursor::new(strided_trace(2048, 64, 5)))?;
        assert_eq!(result.statistics.misses, 32);
        assert_eq!(result.statistics.hits, 32 * 4);
        assert_eq!(simulator.cache().get_uninitialised_line_count(), 64 - 32);
    }
    Ok(())
}

#[test]
fn sequential_sweeps_larger_than_the_cache_always_miss() -> Result<(), Box<dyn Error>> {
    let mut simulator = simulator(4, ReplacementPolicyConfig::LeastRecentlyUsed);
    let result = simulator.simulate(Cursor::new(strided_trace(2048, 64, 3)))?;
    assert_eq!(result.statistics.hits, 0);
    assert_eq!(result.statistics.misses, 96);
    Ok(())
}

#[test]
fn result_serialises_to_json() -> Result<(), Box<dyn Error>> {
    let mut simulator = simulator(1, ReplacementPolicyConfig::LeastRecentlyUsed);
    simulator.simulate(Cursor::new(TRACE))?;
    let json = serde_json::to_string(simulator.get_result())?;
    let parsed: crate::simulator::SimulationResult = serde_json::from_str(&json)?;
    assert_eq!(&parsed, simulator.get_result());
    Ok(())
}

#[test]
fn csv_rows_and_header() -> Result<(), Box<dyn Error>> {
    let mut simulator = simulator(2, ReplacementPolicyConfig::FirstInFirstOut);
    simulator.simulate(Cursor::new(TRACE))?;
    let mut out = Vec::new();
    write_csv(&mut out, &[ResultRow::new(&simulator, None)], false)?;
    assert_eq!(
        String::from_utf8(out)?,
        "Policy,Associativity,CacheSize,BlockSize,Hits,Misses,HitRate\nfifo,2,1024,64,1,4,20.00\n"
    );

    let mut out = Vec::new();
    write_csv(&mut out, &[ResultRow::new(&simulator, Some("gcc.trace".to_string()))], true)?;
    assert_eq!(
        String::from_utf8(out)?,
        "Policy,Associativity,CacheSize,BlockSize,Hits,Misses,HitRate,TraceFile\nfifo,2,1024,64,1,4,20.00,gcc.trace\n"
    );
    Ok(())
}

#[test]
fn trace_column_follows_the_table_not_the_row() -> Result<(), Box<dyn Error>> {
    let mut simulator = simulator(1, ReplacementPolicyConfig::LeastRecentlyUsed);
    simulator.simulate(Cursor::new(TRACE))?;
    let rows = [ResultRow::new(&simulator, Some("gcc.trace".to_string())), ResultRow::new(&simulator, None)];

    let mut out = Vec::new();
    write_csv(&mut out, &rows, false)?;
    let text = String::from_utf8(out)?;
    assert!(text.lines().skip(1).all(|line| line.split(',').count() == 7));

    let mut out = Vec::new();
    write_csv(&mut out, &rows, true)?;
    let text = String::from_utf8(out)?;
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[1].ends_with(",gcc.trace"));
    assert!(lines[2].ends_with(','));
    Ok(())
}

#[test]
fn serialised_field_names_match_the_header() -> Result<(), Box<dyn Error>> {
    let simulator = simulator(1, ReplacementPolicyConfig::LeastRecentlyUsed);
    let mut out = Vec::new();
    {
        let mut csv_writer = csv::Writer::from_writer(&mut out);
        csv_writer.serialize(ResultRow::new(&simulator, Some("gcc.trace".to_string())))?;
        csv_writer.flush()?;
    }
    let text = String::from_utf8(out)?;
    assert_eq!(
        text,
        "Policy,Associativity,CacheSize,BlockSize,Hits,Misses,HitRate,TraceFile\nlru,1,1024,64,0,0,0.00,gcc.trace\n"
    );
    Ok(())
}

#[test]
fn empty_results_still_have_a_header() -> Result<(), Box<dyn Error>> {
    let mut out = Vec::new();
    write_csv(&mut out, &[], true)?;
    assert_eq!(String::from_utf8(out)?, "Policy,Associativity,CacheSize,BlockSize,Hits,Misses,HitRate,TraceFile\n");
    Ok(())
}

#[test]
fn default_export_name_follows_the_trace() {
    let simulator = simulator(1, ReplacementPolicyConfig::LeastRecentlyUsed);
    assert_eq!(
        default_csv_path(Path::new("traces/read07.trace"), &simulator),
        Path::new("traces/read07.trace-lru.csv")
    );
}

#[test]
fn summary_reports_geometry_and_rates() -> Result<(), Box<dyn Error>> {
    let mut simulator = simulator(2, ReplacementPolicyConfig::LeastRecentlyUsed);
    simulator.simulate(Cursor::new(TRACE))?;
    let text = summary(&simulator);
    assert!(text.contains("Number of Sets: 8\n"));
    assert!(text.contains("Tag Bits: 23\n"));
    assert!(text.contains("Replacement Policy: lru\n"));
    assert!(text.contains("Total Cache Accesses: 5\n"));
    assert!(text.contains("Hit Rate: 40.00%\n"));
    assert!(text.contains("Miss Rate: 60.00%\n"));
    Ok(())
}
