//! Simulator: owns the coherence engine and drives it from a trace.

use std::io::{self, BufRead, Write};

use crate::coherence::Engine;
use crate::common::TraceError;
use crate::config::SimConfig;
use crate::trace::TraceReader;

/// Top-level simulator: the engine plus the run/report loop.
pub struct Simulator {
    engine: Engine,
}

impl Simulator {
    /// Creates a simulator for a validated configuration.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            engine: Engine::new(config),
        }
    }

    /// Feeds every record of the trace into the engine, in order.
    ///
    /// Returns the number of records processed. Stops early only on a trace
    /// read error; a record naming an out-of-range processor aborts the run
    /// inside the engine (invariant violation).
    pub fn run<R: BufRead>(&mut self, trace: TraceReader<R>) -> Result<u64, TraceError> {
        let mut processed = 0;
        for record in trace {
            let record = record?;
            self.engine.process_request(record.proc, record.op, record.addr);
            processed += 1;
        }
        Ok(processed)
    }

    /// Writes the per-cache result blocks for every processor.
    pub fn report<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for proc in 0..self.engine.num_processors() {
            self.engine.cache(proc).stats().write_report(w, proc)?;
        }
        Ok(())
    }

    /// The engine, for inspection.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}
