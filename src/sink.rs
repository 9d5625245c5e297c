//! Output sink for collated prime text

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Buffer size for file sinks
pub const FILE_SINK_CAPACITY: usize = 256 * 1024; // 256KB

/// Destination for whole, already formatted buffers
pub trait OutputSink {
    /// Append one buffer of newline-terminated numbers
    fn write_buffer(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flush everything written so far
    fn finish(&mut self) -> io::Result<()>;
}

impl<W: Write> OutputSink for W {
    fn write_buffer(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Open (create or truncate) a buffered file sink
pub fn file_sink(path: &Path) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(BufWriter::with_capacity(FILE_SINK_CAPACITY, file))
}
