//! Memory-access trace parsing.
//!
//! This module reads the trace format driving the simulator. It provides:
//! 1. **Record Type:** One `(processor, operation, address)` triple per line.
//! 2. **Line Parsing:** Whitespace-separated `<proc> <op> <hex_addr>` with
//!    a decimal processor id and a hex address (`0x` prefix optional).
//! 3. **Reader:** An iterator over any buffered source that stops at end of
//!    file or at the first malformed line, so a partial record can never
//!    reach the engine.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::{Address, MemOp, TraceError};

/// One trace record: a processor's memory request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    /// Requesting processor id.
    pub proc: usize,
    /// Read or write.
    pub op: MemOp,
    /// Requested byte address.
    pub addr: Address,
}

/// Parses one trace line into a record.
///
/// The operation token is classified by its first character: `r` is a read,
/// anything else is a write. Returns `None` for a line that does not parse.
pub fn parse_record(line: &str) -> Option<TraceRecord> {
    let mut fields = line.split_whitespace();
    let proc = fields.next()?.parse().ok()?;
    let op = if fields.next()?.starts_with('r') {
        MemOp::Read
    } else {
        MemOp::Write
    };
    let raw = fields.next()?;
    let raw = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    let addr = u64::from_str_radix(raw, 16).ok()?;
    Some(TraceRecord {
        proc,
        op,
        addr: Address::new(addr),
    })
}

/// Iterator over the records of a trace source.
///
/// Blank lines are skipped; the first malformed line terminates the stream,
/// matching the whitespace-scanning semantics of the classic trace readers.
/// I/O failures surface as `Err` items.
#[derive(Debug)]
pub struct TraceReader<R: BufRead> {
    source: R,
    done: bool,
}

impl<R: BufRead> TraceReader<R> {
    /// Wraps a buffered source.
    pub fn new(source: R) -> Self {
        Self {
            source,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let mut line = String::new();
            match self.source.read_line(&mut line) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_record(&line) {
                        Some(record) => return Some(Ok(record)),
                        None => self.done = true,
                    }
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(TraceError::Read(err)));
                }
            }
        }
        None
    }
}

/// Opens a trace file for reading.
pub fn open_trace<P: AsRef<Path>>(path: P) -> Result<TraceReader<BufReader<File>>, TraceError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|err| TraceError::Open(path.display().to_string(), err))?;
    Ok(TraceReader::new(BufReader::new(file)))
}
