//! Block-filter request and response wire formats.
//!
//! All fields are little-endian and encoded field by field.
//!
//! Request:
//!
//! ```text
//! +-------+------+-------+-----------+--------+-----+-------+--------+-------+-----------+
//! | width | type | scale | precision | output | bop | nops  | sorted | nrids | collation |
//! |  u8   |  u8  |  i8   |    u8     |   u8   | u8  |  u16  |   u8   |  u16  |    u8     |
//! +-------+------+-------+-----------+--------+-----+-------+--------+-------+-----------+
//! Predicate[nops] { op: u8, flag: u8, value: [u8; width] }
//! RowIndex[nrids]: u16
//! ```
//!
//! Response:
//!
//! ```text
//! +-------+-----------+--------------+------+------+----------+---------+
//! | nvals | rid_flags | valid_minmax | min  | max  | cache_io | phys_io |
//! |  u16  |    u16    |      u8      | i128 | i128 |   u32    |   u32   |
//! +-------+-----------+--------------+------+------+----------+---------+
//! Payload[nvals] { rid: u16 if output & RID, value: [u8; width] if output & VALUE }
//! ```

use colblk_result::{Error, Result};
use colblk_types::LogicalType;
use colblk_types::codecs::{ByteReader, narrow_le, put_i128, put_u16, put_u32};

use crate::descriptor::ColumnDescriptor;
use crate::ops::{BoolOp, CompareOp, OutputType};
use crate::text::Collation;

pub const REQUEST_HEADER_SIZE: usize = 12;
pub const RESULT_HEADER_SIZE: usize = 45;

/// One predicate as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPredicate {
    pub op: CompareOp,
    pub flag: u8,
    pub value: Vec<u8>,
}

impl FilterPredicate {
    /// Predicate against an integer literal stored in `width` bytes.
    pub fn int(op: CompareOp, value: i128, width: usize) -> Self {
        let mut bytes = Vec::with_capacity(width);
        narrow_le(value, width, &mut bytes);
        Self {
            op,
            flag: 0,
            value: bytes,
        }
    }

    /// Predicate against raw stored bytes (text, float bits, sentinels).
    pub fn raw(op: CompareOp, value: &[u8]) -> Self {
        Self {
            op,
            flag: 0,
            value: value.to_vec(),
        }
    }

    pub fn with_flag(mut self, flag: u8) -> Self {
        self.flag = flag;
        self
    }
}

pub fn encode_predicates(preds: &[FilterPredicate]) -> Vec<u8> {
    let mut out = Vec::with_capacity(preds.iter().map(|p| 2 + p.value.len()).sum());
    for p in preds {
        out.push(p.op.into());
        out.push(p.flag);
        out.extend_from_slice(&p.value);
    }
    out
}

/// A decoded block-filter request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFilterRequest {
    pub descriptor: ColumnDescriptor,
    pub bop: BoolOp,
    pub predicate_count: u16,
    /// Encoded predicate records, `predicate_count * (2 + width)` bytes.
    pub filter: Vec<u8>,
    pub is_sorted: bool,
    pub rids: Vec<u16>,
}

impl BlockFilterRequest {
    pub fn new(descriptor: ColumnDescriptor, bop: BoolOp, preds: &[FilterPredicate]) -> Self {
        Self {
            descriptor,
            bop,
            predicate_count: preds.len() as u16,
            filter: encode_predicates(preds),
            is_sorted: true,
            rids: Vec::new(),
        }
    }

    pub fn with_rids(mut self, rids: Vec<u16>, is_sorted: bool) -> Self {
        self.rids = rids;
        self.is_sorted = is_sorted;
        self.descriptor.is_scan = false;
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let d = &self.descriptor;
        let width = u8::try_from(d.width)
            .map_err(|_| Error::InvalidArgumentError(format!("column width {}", d.width)))?;
        let nrids = u16::try_from(self.rids.len()).map_err(|_| {
            Error::InvalidArgumentError(format!("{} row indexes exceed u16", self.rids.len()))
        })?;
        let mut out =
            Vec::with_capacity(REQUEST_HEADER_SIZE + self.filter.len() + 2 * self.rids.len());
        out.push(width);
        out.push(d.logical_type.into());
        out.push(d.scale as u8);
        out.push(d.precision);
        out.push(d.output.bits());
        out.push(self.bop.into());
        put_u16(&mut out, self.predicate_count);
        out.push(self.is_sorted as u8);
        put_u16(&mut out, nrids);
        out.push(d.collation.into());
        out.extend_from_slice(&self.filter);
        for &rid in &self.rids {
            put_u16(&mut out, rid);
        }
        Ok(out)
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(buf);
        let width = r.get_u8()? as usize;
        let type_code = r.get_u8()?;
        let logical_type = LogicalType::try_from(type_code)
            .map_err(|_| Error::decode(format!("unknown logical type {type_code}")))?;
        let scale = r.get_i8()?;
        let precision = r.get_u8()?;
        let output = OutputType::from_bits(r.get_u8()?)?;
        let bop = BoolOp::from_wire(r.get_u8()?)?;
        let predicate_count = r.get_u16()?;
        let is_sorted = r.get_u8()? != 0;
        let nrids = r.get_u16()? as usize;
        let collation_code = r.get_u8()?;
        let collation = Collation::try_from(collation_code)
            .map_err(|_| Error::decode(format!("unknown collation {collation_code}")))?;
        let filter = r
            .take(predicate_count as usize * (2 + width))?
            .to_vec();
        let mut rids = Vec::with_capacity(nrids);
        for _ in 0..nrids {
            rids.push(r.get_u16()?);
        }
        let descriptor = ColumnDescriptor {
            width,
            logical_type,
            scale,
            precision,
            output,
            is_scan: nrids == 0,
            collation,
        };
        Ok(Self {
            descriptor,
            bop,
            predicate_count,
            filter,
            is_sorted,
            rids,
        })
    }
}

/// Fixed part of a block-filter response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultHeader {
    pub values_written: u16,
    /// Bit `rid >> 9` is set for every emitted row index.
    pub rid_flags: u16,
    pub valid_min_max: bool,
    pub min: i128,
    pub max: i128,
    pub cache_io: u32,
    pub physical_io: u32,
}

impl ResultHeader {
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        put_u16(out, self.values_written);
        put_u16(out, self.rid_flags);
        out.push(self.valid_min_max as u8);
        put_i128(out, self.min);
        put_i128(out, self.max);
        put_u32(out, self.cache_io);
        put_u32(out, self.physical_io);
    }

    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            values_written: r.get_u16()?,
            rid_flags: r.get_u16()?,
            valid_min_max: r.get_u8()? != 0,
            min: r.get_i128()?,
            max: r.get_i128()?,
            cache_io: r.get_u32()?,
            physical_io: r.get_u32()?,
        })
    }
}

/// Output of one block scan: header plus encoded matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockScanResult {
    pub header: ResultHeader,
    pub payload: Vec<u8>,
}

impl BlockScanResult {
    #[inline]
    pub fn rows_matched(&self) -> usize {
        self.header.values_written as usize
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RESULT_HEADER_SIZE + self.payload.len());
        self.header.encode_into(&mut out);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Decode a response whose entries have the given layout.
    pub fn decode(buf: &[u8], output: OutputType, width: usize) -> Result<Self> {
        let mut r = ByteReader::new(buf);
        let header = ResultHeader::decode(&mut r)?;
        let len = header.values_written as usize * output.entry_size(width);
        let payload = r.take(len)?.to_vec();
        Ok(Self { header, payload })
    }

    /// Iterate `(rid, value bytes)` entries; absent parts are `None`.
    pub fn entries(
        &self,
        output: OutputType,
        width: usize,
    ) -> impl Iterator<Item = (Option<u16>, Option<&[u8]>)> + '_ {
        let size = output.entry_size(width);
        self.payload.chunks_exact(size.max(1)).map(move |entry| {
            let (rid, value) = if output.emits_rid() {
                let rid = u16::from_le_bytes([entry[0], entry[1]]);
                (Some(rid), &entry[2..])
            } else {
                (None, entry)
            };
            (rid, output.emits_value().then_some(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout_is_explicit() {
        let desc = ColumnDescriptor::new(4, LogicalType::Int).with_output(OutputType::BOTH);
        let req = BlockFilterRequest::new(
            desc,
            BoolOp::And,
            &[
                FilterPredicate::int(CompareOp::Gt, 10, 4),
                FilterPredicate::int(CompareOp::Lt, -20, 4),
            ],
        )
        .with_rids(vec![3, 1], false);
        let bytes = req.encode().unwrap();
        assert_eq!(bytes.len(), REQUEST_HEADER_SIZE + 2 * 6 + 2 * 2);
        assert_eq!(&bytes[..REQUEST_HEADER_SIZE], &[4, 6, 0, 0, 3, 1, 2, 0, 0, 2, 0, 0]);
        assert_eq!(&bytes[REQUEST_HEADER_SIZE..REQUEST_HEADER_SIZE + 6], &[4, 0, 10, 0, 0, 0]);
        assert_eq!(BlockFilterRequest::decode(&bytes).unwrap(), req);
    }

    #[test]
    fn truncated_request_is_decode_error() {
        let req = BlockFilterRequest::new(
            ColumnDescriptor::new(8, LogicalType::BigInt),
            BoolOp::None,
            &[FilterPredicate::int(CompareOp::Eq, 1, 8)],
        );
        let bytes = req.encode().unwrap();
        assert!(matches!(
            BlockFilterRequest::decode(&bytes[..bytes.len() - 1]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn response_entries() {
        let mut result = BlockScanResult::default();
        result.header.values_written = 2;
        for (rid, v) in [(5u16, 7i16), (9, -1)] {
            result.payload.extend_from_slice(&rid.to_le_bytes());
            result.payload.extend_from_slice(&v.to_le_bytes());
        }
        let bytes = result.encode();
        assert_eq!(bytes.len(), RESULT_HEADER_SIZE + 8);
        let back = BlockScanResult::decode(&bytes, OutputType::BOTH, 2).unwrap();
        let entries: Vec<_> = back.entries(OutputType::BOTH, 2).collect();
        assert_eq!(entries[1], (Some(9), Some(&[0xFF, 0xFF][..])));
    }
}
