use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use anyhow::{anyhow, Context, Result};
use assoclib::config::{CacheConfig, ReplacementPolicyConfig};

fn ask<T: FromStr, R: BufRead>(input: &mut R, question: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    print!("{question}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line).context("Couldn't read from stdin")? == 0 {
        return Err(anyhow!("stdin closed before '{question}' was answered"));
    }
    line.trim().parse::<T>().map_err(|e| anyhow!("Invalid answer '{}': {e}", line.trim()))
}

/// Asks for the cache parameters and trace file on stdin
pub fn prompt() -> Result<(CacheConfig, PathBuf)> {
    let stdin = io::stdin();
    prompt_from(&mut stdin.lock())
}

fn prompt_from<R: BufRead>(input: &mut R) -> Result<(CacheConfig, PathBuf)> {
    println!("This is a complete cache simulator.");
    let capacity = ask(input, "Enter the cache size in bytes (a positive power of 2)")?;
    let block_size = ask(input, "Enter the block size in bytes (a positive power of 2)")?;
    let associativity = ask(input, "Enter the associativity (1 for direct-mapped, N for N-way)")?;
    let policy: ReplacementPolicyConfig = ask(input, "Enter the replacement policy ('lru' or 'fifo')")?;
    let trace: PathBuf = ask(input, "Enter filename")?;
    Ok((CacheConfig::new(capacity, block_size, associativity, policy), trace))
}
