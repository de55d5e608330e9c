use std::marker::PhantomData;

use thiserror::Error;

/// Default number of rows or columns handed to a worker per dispatch.
///
/// Small contiguous chunks balance scheduling overhead against load balance;
/// tune per machine through [`ExecutionStrategy::parallel_with_chunk_size`].
pub const DEFAULT_CHUNK_SIZE: usize = 4;

/// Errors that can occur when configuring parallel execution.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParallelError {
    /// The requested chunk size is invalid.
    #[error("chunk size must be > 0, got {0}")]
    InvalidChunkSize(usize),
}

/// Controls how the blur passes are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of
    /// parallelization outweighs the benefits.
    Serial,

    /// Use the global Rayon thread pool, handing out work (rows or columns)
    /// in contiguous chunks of at least `chunk_size` per worker dispatch.
    Parallel {
        /// Minimum number of rows or columns per worker dispatch.
        chunk_size: usize,
    },
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self::Parallel {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ExecutionStrategy {
    /// Create a parallel strategy with the given chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`ParallelError::InvalidChunkSize`] if `chunk_size` is zero.
    pub fn parallel_with_chunk_size(chunk_size: usize) -> Result<Self, ParallelError> {
        if chunk_size == 0 {
            return Err(ParallelError::InvalidChunkSize(chunk_size));
        }
        Ok(Self::Parallel { chunk_size })
    }

    /// Chunk size to use when splitting work, clamped to at least one.
    pub(crate) fn effective_chunk_size(&self) -> usize {
        match self {
            Self::Serial => 1,
            Self::Parallel { chunk_size } => (*chunk_size).max(1),
        }
    }
}

/// A shareable raw view over a mutable slice for strided disjoint writes.
///
/// Rayon can hand workers disjoint contiguous chunks, but the column pass of
/// the summed-area table writes a strided set of cells per worker, which the
/// borrow checker cannot express. Workers go through this pointer instead.
///
/// Callers must guarantee that no two workers touch the same index.
pub(crate) struct SyncSlicePtr<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for SyncSlicePtr<'_, T> {}
unsafe impl<T: Send> Sync for SyncSlicePtr<'_, T> {}

impl<'a, T: Copy> SyncSlicePtr<'a, T> {
    pub(crate) fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    /// # Safety
    ///
    /// `index` must be in bounds and not concurrently written by another worker.
    #[inline]
    pub(crate) unsafe fn get(&self, index: usize) -> T {
        debug_assert!(index < self.len);
        *self.ptr.add(index)
    }

    /// # Safety
    ///
    /// `index` must be in bounds and not concurrently read or written by
    /// another worker.
    #[inline]
    pub(crate) unsafe fn set(&self, index: usize, value: T) {
        debug_assert!(index < self.len);
        *self.ptr.add(index) = value;
    }
}
