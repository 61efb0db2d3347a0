use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

/// Opens a trace for sequential line-by-line reading
pub fn open_trace(path: &Path) -> io::Result<impl BufRead> {
    get_reader(File::open(path)?)
}

pub fn get_reader(file: File) -> io::Result<impl BufRead> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file on unix systems, traces are only ever read front to back
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // Mapping an empty file fails on some platforms, and there is nothing to read anyway
        if file.metadata()?.len() == 0 {
            return Ok(Cursor::new(MappedTrace::Empty));
        }
        // Safety: the mapping is read-only, and the trace is not expected to change during a run
        let m = unsafe { Mmap::map(&file)? };
        m.advise(Advice::Sequential)?;
        Ok(Cursor::new(MappedTrace::Mapped(m)))
    }
}

#[cfg(unix)]
enum MappedTrace {
    Empty,
    Mapped(memmap2::Mmap),
}

#[cfg(unix)]
impl AsRef<[u8]> for MappedTrace {
    fn as_ref(&self) -> &[u8] {
        match self {
            MappedTrace::Empty => &[],
            MappedTrace::Mapped(m) => m,
        }
    }
}
