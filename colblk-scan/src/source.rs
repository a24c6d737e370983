//! Block loading seam.
//!
//! The command layer never reads storage itself; it asks a [`BlockSource`] to
//! copy physical blocks into its buffer and reports whether each read was
//! served from cache.

use std::io;
use std::sync::{Mutex, PoisonError, RwLock};

use colblk_column::constants::BLOCK_SIZE;
use colblk_result::{Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};

/// Result of one physical block read.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadOutcome {
    pub cache_hit: bool,
}

pub trait BlockSource: Send + Sync {
    /// Copy physical block `lbid` into `buf` (exactly [`BLOCK_SIZE`] bytes).
    fn load(&self, lbid: u64, buf: &mut [u8]) -> Result<LoadOutcome>;

    /// Last physical block allocated to the column, when known. Scans fill the
    /// blocks after it with the EMPTY pattern instead of reading them.
    fn last_lbid(&self) -> Option<u64> {
        None
    }
}

/// In-memory block source used for tests and benchmarks.
///
/// The first read of a block counts as a physical read, later reads as cache
/// hits, until [`MemBlockSource::drop_cache`].
#[derive(Debug, Default)]
pub struct MemBlockSource {
    blocks: RwLock<FxHashMap<u64, Vec<u8>>>,
    warm: Mutex<FxHashSet<u64>>,
}

impl MemBlockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one physical block.
    pub fn insert(&self, lbid: u64, block: Vec<u8>) -> Result<()> {
        if block.len() != BLOCK_SIZE {
            return Err(Error::InvalidArgumentError(format!(
                "block {lbid} is {} bytes, expected {BLOCK_SIZE}",
                block.len()
            )));
        }
        self.blocks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(lbid, block);
        Ok(())
    }

    /// Store a column's bytes as consecutive physical blocks starting at
    /// `first_lbid`. Returns the number of blocks written.
    pub fn insert_column(&self, first_lbid: u64, data: &[u8]) -> Result<usize> {
        if data.len() % BLOCK_SIZE != 0 {
            return Err(Error::InvalidArgumentError(format!(
                "column of {} bytes is not a whole number of blocks",
                data.len()
            )));
        }
        let mut n = 0;
        for (i, chunk) in data.chunks_exact(BLOCK_SIZE).enumerate() {
            self.insert(first_lbid + i as u64, chunk.to_vec())?;
            n += 1;
        }
        Ok(n)
    }

    pub fn len(&self) -> usize {
        self.blocks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget which blocks were read; the next read of each is physical again.
    pub fn drop_cache(&self) {
        self.warm
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl BlockSource for MemBlockSource {
    fn load(&self, lbid: u64, buf: &mut [u8]) -> Result<LoadOutcome> {
        let blocks = self.blocks.read().unwrap_or_else(PoisonError::into_inner);
        let block = blocks.get(&lbid).ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("block {lbid} not found"),
            ))
        })?;
        if buf.len() != block.len() {
            return Err(Error::InvalidArgumentError(format!(
                "load buffer of {} bytes for a {}-byte block",
                buf.len(),
                block.len()
            )));
        }
        buf.copy_from_slice(block);
        let first_read = self
            .warm
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(lbid);
        Ok(LoadOutcome {
            cache_hit: !first_read,
        })
    }

    fn last_lbid(&self) -> Option<u64> {
        self.blocks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .max()
            .copied()
    }
}
