//! Vectorized convolution for the catalog's common kernel widths.
//!
//! Uses f32x8 from `wide`, eight columns per step in both passes. Columns that
//! do not fill a vector and horizontal border columns go through the same
//! reflective scalar loop as the reference.

use multiversion::multiversion;
use wide::f32x8;

use super::scalar::{convolve_rows, Plain, Product, Squared};
use super::{reflect_index, ConvolveBackend, ConvolveOp};
use crate::cpu::CpuFeature;
use crate::kernels::ACCELERATED_WIDTHS;
use crate::plane::{PlaneMut, PlaneRef};

const LANES: usize = 8;

#[inline(always)]
fn load8(s: &[f32], i: usize) -> f32x8 {
    f32x8::new([
        s[i],
        s[i + 1],
        s[i + 2],
        s[i + 3],
        s[i + 4],
        s[i + 5],
        s[i + 6],
        s[i + 7],
    ])
}

#[inline(always)]
fn store8(dst: &mut [f32], i: usize, v: f32x8) {
    dst[i..i + LANES].copy_from_slice(&v.to_array());
}

#[inline(always)]
#[multiversion(targets("x86_64+avx2+fma", "aarch64+neon"))]
fn vertical_plain<const N: usize>(coeffs: &[f32; N], rows: &[&[f32]; N], out: &mut [f32]) {
    let width = out.len();
    let mut j = 0;
    while j + LANES <= width {
        let mut accum = f32x8::splat(0.0);
        for k in 0..N {
            accum += f32x8::splat(coeffs[k]) * load8(rows[k], j);
        }
        store8(out, j, accum);
        j += LANES;
    }
    for (col, o) in out.iter_mut().enumerate().skip(j) {
        let mut accum = 0.0f32;
        for k in 0..N {
            accum += coeffs[k] * rows[k][col];
        }
        *o = accum;
    }
}

#[inline(always)]
#[multiversion(targets("x86_64+avx2+fma", "aarch64+neon"))]
fn vertical_sq<const N: usize>(coeffs: &[f32; N], rows: &[&[f32]; N], out: &mut [f32]) {
    let width = out.len();
    let mut j = 0;
    while j + LANES <= width {
        let mut accum = f32x8::splat(0.0);
        for k in 0..N {
            let v = load8(rows[k], j);
            accum += f32x8::splat(coeffs[k]) * (v * v);
        }
        store8(out, j, accum);
        j += LANES;
    }
    for (col, o) in out.iter_mut().enumerate().skip(j) {
        let mut accum = 0.0f32;
        for k in 0..N {
            let v = rows[k][col];
            accum += coeffs[k] * (v * v);
        }
        *o = accum;
    }
}

#[inline(always)]
#[multiversion(targets("x86_64+avx2+fma", "aarch64+neon"))]
fn vertical_xy<const N: usize>(
    coeffs: &[f32; N],
    rows1: &[&[f32]; N],
    rows2: &[&[f32]; N],
    out: &mut [f32],
) {
    let width = out.len();
    let mut j = 0;
    while j + LANES <= width {
        let mut accum = f32x8::splat(0.0);
        for k in 0..N {
            let v = load8(rows1[k], j) * load8(rows2[k], j);
            accum += f32x8::splat(coeffs[k]) * v;
        }
        store8(out, j, accum);
        j += LANES;
    }
    for (col, o) in out.iter_mut().enumerate().skip(j) {
        let mut accum = 0.0f32;
        for k in 0..N {
            accum += coeffs[k] * (rows1[k][col] * rows2[k][col]);
        }
        *o = accum;
    }
}

#[inline(always)]
fn horizontal_border<const N: usize>(
    coeffs: &[f32; N],
    tmp: &[f32],
    out: &mut [f32],
    j: usize,
) {
    let half = (N / 2) as isize;
    let mut accum = 0.0f32;
    for (k, &coeff) in coeffs.iter().enumerate() {
        accum += coeff * tmp[reflect_index(j as isize - half + k as isize, tmp.len())];
    }
    out[j] = accum;
}

#[inline(always)]
#[multiversion(targets("x86_64+avx2+fma", "aarch64+neon"))]
fn horizontal<const N: usize>(coeffs: &[f32; N], tmp: &[f32], out: &mut [f32]) {
    let width = out.len();
    let half = N / 2;

    // Columns whose taps all lie inside the row.
    let interior_end = width.saturating_sub(half);
    let mut j = half.min(width);

    for col in 0..j {
        horizontal_border(coeffs, tmp, out, col);
    }
    while j + LANES <= interior_end {
        let base = j - half;
        let mut accum = f32x8::splat(0.0);
        for k in 0..N {
            accum += f32x8::splat(coeffs[k]) * load8(tmp, base + k);
        }
        store8(out, j, accum);
        j += LANES;
    }
    for col in j..width {
        horizontal_border(coeffs, tmp, out, col);
    }
}

/// Row indices of the `N` vertical taps around output row `i`.
#[inline(always)]
fn tap_rows<const N: usize>(i: usize, height: usize) -> [usize; N] {
    let half = (N / 2) as isize;
    std::array::from_fn(|k| reflect_index(i as isize - half + k as isize, height))
}

fn coeff_array<const N: usize>(kernel: &[f32]) -> [f32; N] {
    std::array::from_fn(|k| kernel[k])
}

fn run_plain<const N: usize>(
    kernel: &[f32],
    src: PlaneRef<'_>,
    dst: &mut PlaneMut<'_>,
    tmp: &mut [f32],
) {
    let coeffs = coeff_array::<N>(kernel);
    let tmp = &mut tmp[..src.width()];
    for i in 0..src.height() {
        let idx = tap_rows::<N>(i, src.height());
        let rows: [&[f32]; N] = std::array::from_fn(|k| src.row(idx[k]));
        vertical_plain(&coeffs, &rows, tmp);
        horizontal(&coeffs, tmp, dst.row_mut(i));
    }
}

fn run_sq<const N: usize>(
    kernel: &[f32],
    src: PlaneRef<'_>,
    dst: &mut PlaneMut<'_>,
    tmp: &mut [f32],
) {
    let coeffs = coeff_array::<N>(kernel);
    let tmp = &mut tmp[..src.width()];
    for i in 0..src.height() {
        let idx = tap_rows::<N>(i, src.height());
        let rows: [&[f32]; N] = std::array::from_fn(|k| src.row(idx[k]));
        vertical_sq(&coeffs, &rows, tmp);
        horizontal(&coeffs, tmp, dst.row_mut(i));
    }
}

fn run_xy<const N: usize>(
    kernel: &[f32],
    src1: PlaneRef<'_>,
    src2: PlaneRef<'_>,
    dst: &mut PlaneMut<'_>,
    tmp: &mut [f32],
) {
    let coeffs = coeff_array::<N>(kernel);
    let tmp = &mut tmp[..src1.width()];
    for i in 0..src1.height() {
        let idx = tap_rows::<N>(i, src1.height());
        let rows1: [&[f32]; N] = std::array::from_fn(|k| src1.row(idx[k]));
        let rows2: [&[f32]; N] = std::array::from_fn(|k| src2.row(idx[k]));
        vertical_xy(&coeffs, &rows1, &rows2, tmp);
        horizontal(&coeffs, tmp, dst.row_mut(i));
    }
}

/// `wide`-based backend for kernel widths 17, 9, 5 and 3.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimdBackend;

impl ConvolveBackend for SimdBackend {
    fn name(&self) -> &'static str {
        "simd"
    }

    fn required_feature(&self) -> CpuFeature {
        if cfg!(target_arch = "aarch64") {
            CpuFeature::Neon
        } else {
            CpuFeature::Avx2Fma
        }
    }

    fn supports(&self, _op: ConvolveOp, width: usize) -> bool {
        ACCELERATED_WIDTHS.contains(&width)
    }

    fn filter(
        &self,
        kernel: &[f32],
        src: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [f32],
    ) {
        match kernel.len() {
            17 => run_plain::<17>(kernel, src, dst, scratch),
            9 => run_plain::<9>(kernel, src, dst, scratch),
            5 => run_plain::<5>(kernel, src, dst, scratch),
            3 => run_plain::<3>(kernel, src, dst, scratch),
            _ => convolve_rows(kernel, &Plain(src), src.width(), src.height(), dst, scratch),
        }
    }

    fn filter_sq(
        &self,
        kernel: &[f32],
        src: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [f32],
    ) {
        match kernel.len() {
            17 => run_sq::<17>(kernel, src, dst, scratch),
            9 => run_sq::<9>(kernel, src, dst, scratch),
            5 => run_sq::<5>(kernel, src, dst, scratch),
            3 => run_sq::<3>(kernel, src, dst, scratch),
            _ => convolve_rows(kernel, &Squared(src), src.width(), src.height(), dst, scratch),
        }
    }

    fn filter_xy(
        &self,
        kernel: &[f32],
        src1: PlaneRef<'_>,
        src2: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [f32],
    ) {
        match kernel.len() {
            17 => run_xy::<17>(kernel, src1, src2, dst, scratch),
            9 => run_xy::<9>(kernel, src1, src2, dst, scratch),
            5 => run_xy::<5>(kernel, src1, src2, dst, scratch),
            3 => run_xy::<3>(kernel, src1, src2, dst, scratch),
            _ => convolve_rows(
                kernel,
                &Product(src1, src2),
                src1.width(),
                src1.height(),
                dst,
                scratch,
            ),
        }
    }
}
