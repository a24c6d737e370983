use colblk_result::{Error, Result};

use crate::constants::RID_SUB_RANGE_SHIFT;
use crate::ops::OutputType;

/// Accumulates the payload of one block scan.
///
/// Owned by a single scan call; nothing else writes to it concurrently.
#[derive(Debug)]
pub(crate) struct OutputWriter {
    buf: Vec<u8>,
    capacity: usize,
    check: bool,
    emit_rid: bool,
    emit_value: bool,
    entry: usize,
    values: u16,
    rid_flags: u16,
}

impl OutputWriter {
    pub(crate) fn new(output: OutputType, width: usize, capacity: usize, check: bool) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.min(64 * 1024)),
            capacity,
            check,
            emit_rid: output.emits_rid(),
            emit_value: output.emits_value(),
            entry: output.entry_size(width),
            values: 0,
            rid_flags: 0,
        }
    }

    #[inline]
    pub(crate) fn write(&mut self, rid: u16, raw: &[u8]) -> Result<()> {
        if self.check && self.buf.len() + self.entry > self.capacity {
            return Err(Error::OutputBufferTooSmall {
                needed: self.buf.len() + self.entry,
                capacity: self.capacity,
            });
        }
        if self.emit_rid {
            self.buf.extend_from_slice(&rid.to_le_bytes());
            self.rid_flags |= 1 << (rid >> RID_SUB_RANGE_SHIFT).min(15);
        }
        if self.emit_value {
            self.buf.extend_from_slice(raw);
        }
        self.values += 1;
        Ok(())
    }

    pub(crate) fn finish(self) -> (Vec<u8>, u16, u16) {
        (self.buf, self.values, self.rid_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rid_flags_track_sub_ranges() {
        let mut w = OutputWriter::new(OutputType::RID, 4, 1024, true);
        for rid in [0u16, 511, 512, 8191] {
            w.write(rid, &[0; 4]).unwrap();
        }
        let (buf, n, flags) = w.finish();
        assert_eq!(n, 4);
        assert_eq!(buf.len(), 8);
        assert_eq!(flags, 0b1000_0000_0000_0011);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut w = OutputWriter::new(OutputType::BOTH, 8, 15, true);
        w.write(1, &[0; 8]).unwrap();
        let err = w.write(2, &[0; 8]).unwrap_err();
        assert!(matches!(
            err,
            Error::OutputBufferTooSmall {
                needed: 20,
                capacity: 15
            }
        ));
    }
}
