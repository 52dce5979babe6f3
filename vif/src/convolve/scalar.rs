//! Reference two-pass convolution.
//!
//! Every output row is produced by a vertical pass into a scratch row followed
//! by a horizontal pass out of it. Accumulation stays in `f32`.

use super::scratch::AlignedRow;
use super::{check_kernel, check_pair, check_target, reflect_index};
use crate::plane::{PlaneMut, PlaneRef};
use crate::VifError;

/// Per-tap quantity of the vertical pass.
pub(crate) trait TapSource {
    fn tap(&self, row: usize, col: usize) -> f32;
}

pub(crate) struct Plain<'a>(pub PlaneRef<'a>);

pub(crate) struct Squared<'a>(pub PlaneRef<'a>);

pub(crate) struct Product<'a>(pub PlaneRef<'a>, pub PlaneRef<'a>);

impl TapSource for Plain<'_> {
    #[inline(always)]
    fn tap(&self, row: usize, col: usize) -> f32 {
        self.0.get(row, col)
    }
}

impl TapSource for Squared<'_> {
    #[inline(always)]
    fn tap(&self, row: usize, col: usize) -> f32 {
        let v = self.0.get(row, col);
        v * v
    }
}

impl TapSource for Product<'_> {
    #[inline(always)]
    fn tap(&self, row: usize, col: usize) -> f32 {
        self.0.get(row, col) * self.1.get(row, col)
    }
}

/// Runs both passes over a `width` x `height` source using `tmp` as the
/// intermediate row.
pub(crate) fn convolve_rows<S: TapSource>(
    kernel: &[f32],
    source: &S,
    width: usize,
    height: usize,
    dst: &mut PlaneMut<'_>,
    tmp: &mut [f32],
) {
    let half = (kernel.len() / 2) as isize;
    let tmp = &mut tmp[..width];

    for i in 0..height {
        // Vertical pass.
        for (j, t) in tmp.iter_mut().enumerate() {
            let mut accum = 0.0f32;
            for (fi, &coeff) in kernel.iter().enumerate() {
                let ii = reflect_index(i as isize - half + fi as isize, height);
                accum += coeff * source.tap(ii, j);
            }
            *t = accum;
        }

        // Horizontal pass.
        let out = dst.row_mut(i);
        for (j, o) in out.iter_mut().enumerate() {
            let mut accum = 0.0f32;
            for (fj, &coeff) in kernel.iter().enumerate() {
                let jj = reflect_index(j as isize - half + fj as isize, width);
                accum += coeff * tmp[jj];
            }
            *o = accum;
        }
    }
}

fn run<S: TapSource>(
    kernel: &[f32],
    source: &S,
    width: usize,
    height: usize,
    dst: &mut PlaneMut<'_>,
) -> Result<(), VifError> {
    if width == 0 || height == 0 {
        return Ok(());
    }
    let mut tmp = AlignedRow::new(width)?;
    convolve_rows(kernel, source, width, height, dst, &mut tmp);
    Ok(())
}

/// Low-pass filters `src` into `dst` (local means).
///
/// This is the scalar reference; [`Convolver::filter`][super::Convolver::filter]
/// dispatches to a vectorized backend when one applies.
///
/// # Errors
/// - If `kernel` has even length
/// - If `dst` does not have the size of `src`
/// - If the scratch row cannot be allocated
pub fn filter(kernel: &[f32], src: PlaneRef<'_>, dst: &mut PlaneMut<'_>) -> Result<(), VifError> {
    check_kernel(kernel)?;
    check_target(&src, dst)?;
    run(kernel, &Plain(src), src.width(), src.height(), dst)
}

/// Filters the squared samples of `src` into `dst` (local `E[x^2]`).
///
/// # Errors
/// Same as [`filter`].
pub fn filter_sq(
    kernel: &[f32],
    src: PlaneRef<'_>,
    dst: &mut PlaneMut<'_>,
) -> Result<(), VifError> {
    check_kernel(kernel)?;
    check_target(&src, dst)?;
    run(kernel, &Squared(src), src.width(), src.height(), dst)
}

/// Filters the sample-wise product of `src1` and `src2` into `dst`
/// (local `E[xy]`).
///
/// # Errors
/// Same as [`filter`], or if the two sources differ in size.
pub fn filter_xy(
    kernel: &[f32],
    src1: PlaneRef<'_>,
    src2: PlaneRef<'_>,
    dst: &mut PlaneMut<'_>,
) -> Result<(), VifError> {
    check_kernel(kernel)?;
    check_pair(&src1, &src2)?;
    check_target(&src1, dst)?;
    run(
        kernel,
        &Product(src1, src2),
        src1.width(),
        src1.height(),
        dst,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{kernel, KernelScale, NUM_LEVELS};
    use crate::plane::Plane;

    #[test]
    fn constant_plane_is_preserved() {
        for scale in KernelScale::ALL {
            for level in 0..NUM_LEVELS {
                let k = kernel(scale, level);
                let src = Plane::from_fn(23, 19, |_, _| 42.5);
                let mut dst = Plane::new(23, 19);
                filter(k.coeffs, src.view(), &mut dst.view_mut()).unwrap();
                for row in 0..19 {
                    for &v in dst.row(row) {
                        assert!((v - 42.5).abs() < 1e-3, "{:?}/{}: {}", scale, level, v);
                    }
                }
            }
        }
    }

    #[test]
    fn identity_kernel_copies() {
        let src = Plane::from_fn(7, 5, |r, c| (r * 10 + c) as f32);
        let mut dst = Plane::new(7, 5);
        filter(&[1.0], src.view(), &mut dst.view_mut()).unwrap();
        for r in 0..5 {
            assert_eq!(dst.row(r), src.row(r));
        }
    }

    #[test]
    fn reflective_border_3_tap() {
        // One row, so the vertical pass only sees reflections of row 0.
        let src = Plane::from_vec(vec![1.0, 2.0, 4.0, 8.0], 4, 1).unwrap();
        let mut dst = Plane::new(4, 1);
        filter(&[0.25, 0.5, 0.25], src.view(), &mut dst.view_mut()).unwrap();
        // Left edge reflects index -1 to 1, right edge reflects 4 to 3.
        let expected = [
            0.25 * 2.0 + 0.5 * 1.0 + 0.25 * 2.0,
            0.25 * 1.0 + 0.5 * 2.0 + 0.25 * 4.0,
            0.25 * 2.0 + 0.5 * 4.0 + 0.25 * 8.0,
            0.25 * 4.0 + 0.5 * 8.0 + 0.25 * 8.0,
        ];
        assert_eq!(dst.row(0), &expected);
    }

    #[test]
    fn squared_and_product_variants() {
        let a = Plane::from_fn(9, 6, |r, c| (r as f32) - (c as f32) * 0.5);
        let b = Plane::from_fn(9, 6, |r, c| (r * c) as f32 * 0.25 + 1.0);
        let k = kernel(KernelScale::Unit, 2);

        let a_sq = Plane::from_fn(9, 6, |r, c| a.get(r, c) * a.get(r, c));
        let ab = Plane::from_fn(9, 6, |r, c| a.get(r, c) * b.get(r, c));

        let mut via_sq = Plane::new(9, 6);
        let mut via_plain = Plane::new(9, 6);
        filter_sq(k.coeffs, a.view(), &mut via_sq.view_mut()).unwrap();
        filter(k.coeffs, a_sq.view(), &mut via_plain.view_mut()).unwrap();
        for r in 0..6 {
            assert_eq!(via_sq.row(r), via_plain.row(r));
        }

        let mut via_xy = Plane::new(9, 6);
        filter_xy(k.coeffs, a.view(), b.view(), &mut via_xy.view_mut()).unwrap();
        filter(k.coeffs, ab.view(), &mut via_plain.view_mut()).unwrap();
        for r in 0..6 {
            assert_eq!(via_xy.row(r), via_plain.row(r));
        }
    }

    #[test]
    fn strided_destination_keeps_padding() {
        let src = Plane::from_fn(3, 3, |r, c| (r + c) as f32);
        let mut buf = vec![-7.0f32; 3 * 5];
        let mut dst = PlaneMut::new(&mut buf, 3, 3, 5).unwrap();
        filter(&[0.25, 0.5, 0.25], src.view(), &mut dst).unwrap();
        for row in 0..3 {
            assert_eq!(buf[row * 5 + 3], -7.0);
            assert_eq!(buf[row * 5 + 4], -7.0);
        }
    }

    #[test]
    fn invalid_arguments() {
        let src = Plane::new(4, 4);
        let mut dst = Plane::new(4, 3);
        assert_eq!(
            filter(&[0.5, 0.5], src.view(), &mut Plane::new(4, 4).view_mut()),
            Err(VifError::InvalidKernel(2))
        );
        assert_eq!(
            filter(&[1.0], src.view(), &mut dst.view_mut()),
            Err(VifError::NonMatchingPlaneDimensions)
        );
        assert_eq!(
            filter_xy(
                &[1.0],
                src.view(),
                Plane::new(3, 4).view(),
                &mut Plane::new(4, 4).view_mut()
            ),
            Err(VifError::NonMatchingPlaneDimensions)
        );
    }
}
