//! Ordering and emission of per-segment buffers
//!
//! Workers finish segments in whatever order the scheduler allows, so buffers are
//! sorted by the first number each one holds before they are written out.

use crate::error::Result;
use crate::sink::OutputSink;

/// First number of a buffer, `None` for an empty buffer
pub fn first_value(buffer: &[u8]) -> Option<u64> {
    let digits = buffer.iter().take_while(|b| b.is_ascii_digit());
    let mut value: Option<u64> = None;
    for &b in digits {
        let digit = u64::from(b - b'0');
        value = Some(value.unwrap_or(0) * 10 + digit);
    }
    value
}

/// Sort buffers into ascending numeric order. Empty buffers sort first.
pub fn sort_buffers(buffers: &mut [Vec<u8>]) {
    buffers.sort_by_cached_key(|buffer| first_value(buffer));
}

/// Sort the buffers, then write the optional leading "2" and every buffer to the sink
pub fn collate<S>(mut buffers: Vec<Vec<u8>>, emit_two: bool, sink: &mut S) -> Result<()>
where
    S: OutputSink + ?Sized,
{
    sort_buffers(&mut buffers);

    if emit_two {
        sink.write_buffer(b"2\n")?;
    }
    for buffer in buffers.iter().filter(|b| !b.is_empty()) {
        sink.write_buffer(buffer)?;
    }
    sink.finish()?;
    Ok(())
}
