//! Manual little-endian codecs for the request/response wire layouts.
//!
//! Every multi-byte field is encoded explicitly; nothing relies on struct layout.

use colblk_result::{Error, Result};

/// Forward-only cursor over an encoded message.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Borrow the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::decode(format!(
                "need {n} bytes at offset {}, only {} remain",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    #[inline]
    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    #[inline]
    pub fn get_i8(&mut self) -> Result<i8> {
        Ok(self.get_u8()? as i8)
    }

    #[inline]
    pub fn get_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    #[inline]
    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    #[inline]
    pub fn get_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    #[inline]
    pub fn get_i128(&mut self) -> Result<i128> {
        Ok(i128::from_le_bytes(self.take_array()?))
    }
}

#[inline(always)]
pub fn put_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[inline(always)]
pub fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

#[inline(always)]
pub fn put_i128(out: &mut Vec<u8>, v: i128) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Read a `bytes.len()`-wide little-endian integer and widen it to 64 bits.
///
/// Signed values are sign-extended, unsigned values zero-extended. Widths above
/// 8 bytes are truncated to their low 64 bits.
#[inline]
pub fn widen_le(bytes: &[u8], signed: bool) -> i64 {
    let n = bytes.len().min(8);
    let mut raw = [0u8; 8];
    raw[..n].copy_from_slice(&bytes[..n]);
    let v = u64::from_le_bytes(raw);
    if !signed || n == 8 || n == 0 {
        return v as i64;
    }
    let shift = 64 - 8 * n as u32;
    ((v << shift) as i64) >> shift
}

/// Write the low `width` bytes of `v` in little-endian order.
#[inline]
pub fn narrow_le(v: i128, width: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&v.to_le_bytes()[..width.min(16)]);
}
