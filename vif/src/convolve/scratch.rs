//! Cache-line aligned scratch rows.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::VifError;

/// Alignment of every scratch row, in bytes.
pub const SCRATCH_ALIGN: usize = 64;

/// Zero-initialized `f32` row aligned to [`SCRATCH_ALIGN`] bytes.
///
/// The allocation is released when the row is dropped, so a row created at
/// the top of a function is freed on every return path.
pub struct AlignedRow {
    ptr: NonNull<f32>,
    len: usize,
    layout: Layout,
}

// SAFETY: AlignedRow uniquely owns its allocation, like a Vec<f32>.
unsafe impl Send for AlignedRow {}
// SAFETY: shared access only hands out &[f32].
unsafe impl Sync for AlignedRow {}

impl AlignedRow {
    /// Allocates a row of `len` samples.
    ///
    /// # Errors
    /// `VifError::ScratchAllocation` if the allocator returns null or the size
    /// overflows.
    pub fn new(len: usize) -> Result<Self, VifError> {
        let bytes = len
            .max(1)
            .checked_mul(std::mem::size_of::<f32>())
            .and_then(|b| b.checked_next_multiple_of(SCRATCH_ALIGN))
            .ok_or(VifError::ScratchAllocation(usize::MAX))?;
        let layout = Layout::from_size_align(bytes, SCRATCH_ALIGN)
            .map_err(|_| VifError::ScratchAllocation(bytes))?;

        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc_zeroed(layout) }.cast::<f32>();
        let ptr = NonNull::new(raw).ok_or(VifError::ScratchAllocation(bytes))?;

        Ok(Self { ptr, len, layout })
    }
}

impl Deref for AlignedRow {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        // SAFETY: `ptr` points to at least `len` zero-initialized f32 owned by self.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedRow {
    fn deref_mut(&mut self) -> &mut [f32] {
        // SAFETY: as in `deref`, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedRow {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with exactly this layout.
        unsafe { dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) }
    }
}
