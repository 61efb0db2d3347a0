use lazy_static::lazy_static;
use regex::Regex;
use crate::error::TraceError;

lazy_static! {
    // <op> <hex address, optional 0x> [<decimal size> [anything]]
    static ref TRACE_LINE: Regex = Regex::new(
        r"^\s*(?P<op>\S)\s+(?:0[xX])?(?P<address>[0-9a-fA-F]{1,16})(?:\s+(?P<size>[0-9]+)(?:\s.*)?)?\s*$"
    ).unwrap();
}

/// One access read from a trace
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// The raw operation code, interpreted by the cache
    pub code: u8,
    pub address: u64,
    /// The access size, if present. Carried for completeness, the cache ignores it
    pub size: Option<u32>,
}

/// Parses a single trace line
///
/// Blank lines parse to None. The operation code is not checked here, unknown codes are a valid
/// record which the cache then ignores
///
/// # Arguments
///
/// * `line`: The line, without its terminator
/// * `line_number`: 1-based line number, used in the error
///
/// returns: Result<Option<TraceRecord>, TraceError>
///
/// # Examples
///
/// ```
/// use assoclib::trace::parse_line;
/// let record = parse_line("l 0x1fffff50 4", 1).unwrap().unwrap();
/// assert_eq!(record.code, b'l');
/// assert_eq!(record.address, 0x1fffff50);
/// assert_eq!(record.size, Some(4));
/// ```
pub fn parse_line(line: &str, line_number: u64) -> Result<Option<TraceRecord>, TraceError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let malformed = || TraceError {
        line_number,
        line: line.to_string(),
    };
    let captures = TRACE_LINE.captures(line).ok_or_else(malformed)?;
    let op = &captures["op"];
    // Operation codes are a single byte, anything wider is malformed
    let code = match op.as_bytes() {
        [code] => *code,
        _ => return Err(malformed()),
    };
    let address = u64::from_str_radix(&captures["address"], 16).map_err(|_| malformed())?;
    let size = match captures.name("size") {
        Some(size) => Some(size.as_str().parse::<u32>().map_err(|_| malformed())?),
        None => None,
    };
    Ok(Some(TraceRecord { code, address, size }))
}
