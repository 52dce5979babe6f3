//! 2x point subsampling between pyramid levels.

use crate::plane::{Plane, PlaneMut, PlaneRef};
use crate::VifError;

/// Keeps every second sample of every second row: `dst[i, j] = src[2i, 2j]`.
///
/// No filtering happens here; callers low-pass `src` first.
///
/// # Errors
/// If `dst` is not `floor(w / 2)` x `floor(h / 2)`.
pub fn decimate2(src: PlaneRef<'_>, dst: &mut PlaneMut<'_>) -> Result<(), VifError> {
    if dst.width() != src.width() / 2 || dst.height() != src.height() / 2 {
        return Err(VifError::NonMatchingPlaneDimensions);
    }

    for i in 0..dst.height() {
        let src_row = src.row(2 * i);
        for (d, s) in dst.row_mut(i).iter_mut().zip(src_row.iter().step_by(2)) {
            *d = *s;
        }
    }
    Ok(())
}

/// Allocating form of [`decimate2`].
#[must_use]
pub fn decimate_by_2(src: PlaneRef<'_>) -> Plane {
    Plane::from_fn(src.width() / 2, src.height() / 2, |row, col| {
        src.get(2 * row, 2 * col)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Plane {
        Plane::from_fn(4, 4, |i, j| (4 * i + j) as f32)
    }

    #[test]
    fn four_by_four() {
        let src = ramp();
        let mut dst = Plane::new(2, 2);
        decimate2(src.view(), &mut dst.view_mut()).unwrap();
        assert_eq!(dst.row(0), &[0.0, 2.0]);
        assert_eq!(dst.row(1), &[8.0, 10.0]);
        assert_eq!(decimate_by_2(src.view()).row(1), &[8.0, 10.0]);
    }

    #[test]
    fn odd_extents_round_down() {
        let src = Plane::from_fn(5, 3, |i, j| (10 * i + j) as f32);
        let dst = decimate_by_2(src.view());
        assert_eq!((dst.width(), dst.height()), (2, 1));
        assert_eq!(dst.row(0), &[0.0, 2.0]);
    }

    #[test]
    fn strided_source() {
        let mut buf = vec![-1.0f32; 6 * 4];
        for i in 0..4 {
            for j in 0..4 {
                buf[i * 6 + j] = (4 * i + j) as f32;
            }
        }
        let src = PlaneRef::new(&buf, 4, 4, 6).unwrap();
        let dst = decimate_by_2(src);
        assert_eq!(dst.row(0), &[0.0, 2.0]);
        assert_eq!(dst.row(1), &[8.0, 10.0]);
    }

    #[test]
    fn wrong_destination_size() {
        let src = ramp();
        let mut dst = Plane::new(3, 2);
        assert_eq!(
            decimate2(src.view(), &mut dst.view_mut()),
            Err(VifError::NonMatchingPlaneDimensions)
        );
    }
}
