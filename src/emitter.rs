//! Buffered activity-graph edge sink
//!
//! Accepted edges are staged in a fixed-capacity buffer and written to a
//! text output file one line per edge:
//!
//! ```text
//! <pre_n_id> <a1.ts> <a2.ts> <post_n_id> <b1.ts> <b2.ts>
//! ```
//!
//! Dropping the writer flushes whatever is still pending, so edges survive
//! early returns and panics; call [`EdgeWriter::finish`] to observe write
//! errors instead of swallowing them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{GnatError, Result};
use crate::spike::SpikePair;

/// Pending edges held before a flush
pub const EDGE_BUF_CAP: usize = 8192;

/// One edge of the activity graph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GnatEdge {
    pub pre: SpikePair,
    pub post: SpikePair,
    /// Causal distance ratio. Carried for a future output format; the
    /// current line format does not include it.
    pub cd_ratio: f32,
}

/// Fixed-capacity buffered writer for activity graph edges
pub struct EdgeWriter {
    out: BufWriter<File>,
    buf: Vec<GnatEdge>,
    written: u64,
}

impl EdgeWriter {
    /// Truncate-open `path` with an empty buffer
    pub fn create<P: AsRef<Path>>(path: P) -> Result<EdgeWriter> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| GnatError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            out: BufWriter::new(file),
            buf: Vec::with_capacity(EDGE_BUF_CAP),
            written: 0,
        })
    }

    /// Stage one edge, flushing first if the buffer is full
    pub fn push(&mut self, edge: GnatEdge) -> Result<()> {
        if self.buf.len() >= EDGE_BUF_CAP {
            self.flush()?;
        }
        self.buf.push(edge);
        Ok(())
    }

    /// Write all buffered edges in insertion order and reset the buffer
    pub fn flush(&mut self) -> Result<()> {
        for edge in &self.buf {
            writeln!(
                self.out,
                "{} {} {} {} {} {}",
                edge.pre.sp1.n_id,
                edge.pre.sp1.ts,
                edge.pre.sp2.ts,
                edge.post.sp1.n_id,
                edge.post.sp1.ts,
                edge.post.sp2.ts,
            )?;
        }
        self.written += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }

    /// Flush everything and return the total number of edges written
    pub fn finish(mut self) -> Result<u64> {
        self.flush()?;
        self.out.flush()?;
        Ok(self.written)
    }
}

impl Drop for EdgeWriter {
    fn drop(&mut self) {
        // Last-resort flush; errors here have nowhere to go. finish()
        // already left the buffer empty on the normal path.
        let _ = self.flush();
        let _ = self.out.flush();
    }
}
