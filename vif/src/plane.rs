//! Single-channel `f32` image planes with an explicit row stride.
//!
//! [`PlaneRef`] and [`PlaneMut`] describe caller-owned memory, [`Plane`] owns
//! its buffer. All of them are row-major; the stride (in samples) may exceed
//! the width to leave room for alignment padding.

use std::mem::size_of;

use crate::VifError;

/// Row alignment of owned planes, in samples (64 bytes).
const ROW_ALIGN: usize = 64 / size_of::<f32>();

/// Samples needed for `height` rows; zero-width rows still start every
/// `stride` samples.
fn required_len(width: usize, height: usize, stride: usize) -> usize {
    if height == 0 {
        0
    } else {
        (height - 1) * stride + width
    }
}

fn check_layout(len: usize, width: usize, height: usize, stride: usize) -> Result<(), VifError> {
    if stride < width {
        return Err(VifError::InvalidStride { stride, width });
    }
    let required = required_len(width, height, stride);
    if len < required {
        return Err(VifError::BufferTooSmall {
            required,
            actual: len,
        });
    }
    Ok(())
}

fn samples_from_byte_stride(stride_bytes: usize) -> Result<usize, VifError> {
    if stride_bytes % size_of::<f32>() != 0 {
        return Err(VifError::MisalignedStride(stride_bytes));
    }
    Ok(stride_bytes / size_of::<f32>())
}

/// Borrowed, read-only view of a plane.
#[derive(Clone, Copy, Debug)]
pub struct PlaneRef<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PlaneRef<'a> {
    /// Wraps `data` as a `width` x `height` plane whose rows start every
    /// `stride` samples.
    ///
    /// # Errors
    /// - If `stride < width`
    /// - If `data` is too short to hold `height` rows
    pub fn new(
        data: &'a [f32],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, VifError> {
        check_layout(data.len(), width, height, stride)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Like [`new`][Self::new], with the stride given in bytes.
    ///
    /// # Errors
    /// Additionally fails if `stride_bytes` is not a multiple of 4.
    pub fn from_byte_stride(
        data: &'a [f32],
        width: usize,
        height: usize,
        stride_bytes: usize,
    ) -> Result<Self, VifError> {
        Self::new(data, width, height, samples_from_byte_stride(stride_bytes)?)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row stride in samples.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Row stride in bytes.
    #[must_use]
    pub fn stride_bytes(&self) -> usize {
        self.stride * size_of::<f32>()
    }

    /// The `width` samples of row `row`.
    #[inline(always)]
    #[must_use]
    pub fn row(&self, row: usize) -> &'a [f32] {
        let start = row * self.stride;
        &self.data[start..start + self.width]
    }

    #[inline(always)]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        debug_assert!(col < self.width);
        self.data[row * self.stride + col]
    }

    #[must_use]
    pub fn same_size(&self, other: &PlaneRef<'_>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Borrowed, writable view of a plane.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [f32],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PlaneMut<'a> {
    /// See [`PlaneRef::new`].
    ///
    /// # Errors
    /// - If `stride < width`
    /// - If `data` is too short to hold `height` rows
    pub fn new(
        data: &'a mut [f32],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, VifError> {
        check_layout(data.len(), width, height, stride)?;
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// See [`PlaneRef::from_byte_stride`].
    ///
    /// # Errors
    /// Same as [`new`][Self::new], or if `stride_bytes` is not a multiple of 4.
    pub fn from_byte_stride(
        data: &'a mut [f32],
        width: usize,
        height: usize,
        stride_bytes: usize,
    ) -> Result<Self, VifError> {
        let stride = samples_from_byte_stride(stride_bytes)?;
        Self::new(data, width, height, stride)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline(always)]
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let start = row * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Reborrows this view as read-only.
    #[must_use]
    pub fn view(&self) -> PlaneRef<'_> {
        PlaneRef {
            data: &*self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }
}

/// Owned plane whose rows are padded to a multiple of 64 bytes.
///
/// The buffer is sized for the dimensions given to [`new`][Self::new]. Smaller
/// pyramid levels can reuse it through [`shrink_to`][Self::shrink_to].
#[derive(Clone, Debug)]
pub struct Plane {
    data: Vec<f32>,
    width: usize,
    height: usize,
    stride: usize,
}

impl Plane {
    /// Creates a zero-filled plane.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let stride = width.div_ceil(ROW_ALIGN) * ROW_ALIGN;
        Self {
            data: vec![0.0f32; stride * height],
            width,
            height,
            stride,
        }
    }

    /// Creates a plane by evaluating `f(row, col)` for every sample.
    #[must_use]
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut plane = Self::new(width, height);
        for row in 0..height {
            for (col, v) in plane.row_mut(row).iter_mut().enumerate() {
                *v = f(row, col);
            }
        }
        plane
    }

    /// Takes ownership of tightly packed samples (`stride == width`).
    ///
    /// # Errors
    /// If `data.len() != width * height`.
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize) -> Result<Self, VifError> {
        if data.len() != width * height {
            return Err(VifError::BufferTooSmall {
                required: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride: width,
        })
    }

    /// Converts 8-bit picture samples, re-centering them around zero.
    ///
    /// # Errors
    /// If `samples.len() != width * height`.
    pub fn from_u8(samples: &[u8], width: usize, height: usize) -> Result<Self, VifError> {
        Self::from_samples(samples, width, height, |s| f32::from(s) - 128.0)
    }

    /// Converts high bit depth picture samples to the 8-bit range and
    /// re-centers them around zero.
    ///
    /// # Errors
    /// - If `bit_depth` is not in `8..=16`
    /// - If `samples.len() != width * height`
    pub fn from_u16(
        samples: &[u16],
        width: usize,
        height: usize,
        bit_depth: u8,
    ) -> Result<Self, VifError> {
        if !(8..=16).contains(&bit_depth) {
            return Err(VifError::UnsupportedBitDepth(bit_depth));
        }
        let scaler = (1u32 << (bit_depth - 8)) as f32;
        Self::from_samples(samples, width, height, |s| f32::from(s) / scaler - 128.0)
    }

    fn from_samples<T: Copy>(
        samples: &[T],
        width: usize,
        height: usize,
        convert: impl Fn(T) -> f32,
    ) -> Result<Self, VifError> {
        if samples.len() != width * height {
            return Err(VifError::BufferTooSmall {
                required: width * height,
                actual: samples.len(),
            });
        }
        let mut plane = Self::new(width, height);
        if width == 0 {
            return Ok(plane);
        }
        for (row, src) in samples.chunks_exact(width).enumerate() {
            for (dst, &s) in plane.row_mut(row).iter_mut().zip(src) {
                *dst = convert(s);
            }
        }
        Ok(plane)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Reduces the logical size without touching the allocation.
    ///
    /// The stride is kept, so the new size must not exceed the current one.
    ///
    /// # Panics
    /// If `width` or `height` is larger than the current value.
    pub fn shrink_to(&mut self, width: usize, height: usize) {
        assert!(
            width <= self.width && height <= self.height,
            "cannot grow a plane from {}x{} to {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        self.width = width;
        self.height = height;
    }

    #[inline(always)]
    #[must_use]
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.stride;
        &self.data[start..start + self.width]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let start = row * self.stride;
        &mut self.data[start..start + self.width]
    }

    #[inline(always)]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.row(row)[col]
    }

    #[must_use]
    pub fn view(&self) -> PlaneRef<'_> {
        PlaneRef {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    pub fn view_mut(&mut self) -> PlaneMut<'_> {
        PlaneMut {
            data: &mut self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }
}
