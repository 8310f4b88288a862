//! Reference-counted sample storage with scoped acquire/release.
//!
//! A [`MemBlock`] owns raw sample bytes. A [`MemChunk`] names a byte range of
//! a block. Reading or writing the bytes goes through [`MemChunk::acquire`] or
//! [`MemChunk::acquire_mut`], which hand out guards that release the block
//! when dropped. The number of outstanding guards is observable through
//! [`MemBlock::n_acquired`].

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::format::SampleFormat;

/// Shared storage for sample data.
pub struct MemBlock {
    data: RwLock<Box<[u8]>>,
    is_silence: AtomicBool,
    n_acquired: AtomicUsize,
}

impl MemBlock {
    /// Wrap existing bytes.
    pub fn new(data: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            data: RwLock::new(data.into_boxed_slice()),
            is_silence: AtomicBool::new(false),
            n_acquired: AtomicUsize::new(0),
        })
    }

    /// Allocate `length` bytes of silence for `format` and mark the block silent.
    pub fn new_silence(format: SampleFormat, length: usize) -> Arc<Self> {
        let block = Self::new(vec![format.silence_byte(); length]);
        block.set_is_silence(true);
        block
    }

    /// Total bytes held.
    pub fn len(&self) -> usize {
        self.data.read_recursive().len()
    }

    /// Whether the block holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the block is known to contain only silence.
    pub fn is_silence(&self) -> bool {
        self.is_silence.load(Ordering::Relaxed)
    }

    /// Mark or unmark the block as known-silent.
    pub fn set_is_silence(&self, silence: bool) {
        self.is_silence.store(silence, Ordering::Relaxed);
    }

    /// Number of guards currently holding this block.
    pub fn n_acquired(&self) -> usize {
        self.n_acquired.load(Ordering::Acquire)
    }

    fn retain(&self) {
        self.n_acquired.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) {
        let previous = self.n_acquired.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "memblock released more often than acquired");
    }
}

impl std::fmt::Debug for MemBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemBlock")
            .field("len", &self.len())
            .field("is_silence", &self.is_silence())
            .field("n_acquired", &self.n_acquired())
            .finish()
    }
}

/// A byte range inside a [`MemBlock`].
#[derive(Clone, Debug)]
pub struct MemChunk {
    /// Backing storage.
    pub memblock: Arc<MemBlock>,
    /// Offset of the first byte.
    pub index: usize,
    /// Bytes in the range.
    pub length: usize,
}

impl MemChunk {
    /// Chunk spanning the whole block.
    pub fn new(memblock: Arc<MemBlock>) -> Self {
        let length = memblock.len();
        Self {
            memblock,
            index: 0,
            length,
        }
    }

    /// Chunk over `index..index + length` of `memblock`.
    ///
    /// Panics if the range does not fit the block.
    pub fn with_range(memblock: Arc<MemBlock>, index: usize, length: usize) -> Self {
        assert!(
            index.checked_add(length).is_some_and(|end| end <= memblock.len()),
            "chunk {index}+{length} exceeds memblock of {} bytes",
            memblock.len()
        );
        Self {
            memblock,
            index,
            length,
        }
    }

    /// Copy `data` into a fresh block and return a chunk over all of it.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::new(MemBlock::new(data))
    }

    /// Acquire a read view of the chunk bytes.
    pub fn acquire(&self) -> ChunkRead<'_> {
        let range = self.index..self.index + self.length;
        let guard = RwLockReadGuard::map(self.memblock.data.read_recursive(), |d| &d[range]);
        self.memblock.retain();
        ChunkRead {
            guard,
            block: &self.memblock,
        }
    }

    /// Acquire a write view of the chunk bytes.
    ///
    /// Every other view of the same block must already be released. A
    /// [`ChunkRead`] still held by the calling thread would deadlock here.
    pub fn acquire_mut(&self) -> ChunkWrite<'_> {
        debug_assert_eq!(
            self.memblock.n_acquired(),
            0,
            "write view requested while the block is acquired"
        );
        let range = self.index..self.index + self.length;
        let guard = RwLockWriteGuard::map(self.memblock.data.write(), |d| &mut d[range]);
        self.memblock.retain();
        ChunkWrite {
            guard,
            block: &self.memblock,
        }
    }
}

/// Read access to a chunk. Releases the block when dropped.
pub struct ChunkRead<'a> {
    guard: MappedRwLockReadGuard<'a, [u8]>,
    block: &'a MemBlock,
}

impl Deref for ChunkRead<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard
    }
}

impl Drop for ChunkRead<'_> {
    fn drop(&mut self) {
        self.block.release();
    }
}

/// Write access to a chunk. Releases the block when dropped.
pub struct ChunkWrite<'a> {
    guard: MappedRwLockWriteGuard<'a, [u8]>,
    block: &'a MemBlock,
}

impl Deref for ChunkWrite<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard
    }
}

impl DerefMut for ChunkWrite<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.guard
    }
}

impl Drop for ChunkWrite<'_> {
    fn drop(&mut self) {
        self.block.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_track_acquisition() {
        let chunk = MemChunk::from_vec(vec![1, 2, 3, 4]);
        {
            let a = chunk.acquire();
            let b = chunk.acquire();
            assert_eq!(&a[..], &[1, 2, 3, 4]);
            assert_eq!(&b[..], &[1, 2, 3, 4]);
            assert_eq!(chunk.memblock.n_acquired(), 2);
        }
        assert_eq!(chunk.memblock.n_acquired(), 0);
    }

    #[test]
    fn ranged_chunk_sees_its_window() {
        let block = MemBlock::new(vec![0, 1, 2, 3, 4, 5]);
        let chunk = MemChunk::with_range(block.clone(), 2, 3);
        {
            let mut w = chunk.acquire_mut();
            w[0] = 9;
        }
        assert_eq!(&chunk.acquire()[..], &[9, 3, 4]);
        assert_eq!(block.n_acquired(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "write view requested while the block is acquired")]
    fn write_view_refused_while_read_view_is_held() {
        let block = MemBlock::new(vec![0; 4]);
        let reader = MemChunk::new(block.clone());
        let writer = MemChunk::with_range(block, 0, 2);
        let _view = reader.acquire();
        let _ = writer.acquire_mut();
    }

    #[test]
    fn silence_block_is_flagged() {
        let block = MemBlock::new_silence(SampleFormat::U8, 8);
        assert!(block.is_silence());
        assert_eq!(&MemChunk::new(block).acquire()[..], &[0x80; 8]);
    }

    #[test]
    #[should_panic(expected = "exceeds memblock")]
    fn out_of_range_chunk_panics() {
        let _ = MemChunk::with_range(MemBlock::new(vec![0; 4]), 2, 4);
    }
}
