//! Base-2 logarithm strategies for the VIF statistic.

/// Polynomial for `log2(1 + m)`, `m` in `[0, 1)`, highest degree first.
const LOG2_POLY: [f32; 9] = [
    -0.012_671_635,
    0.064_841_18,
    -0.157_048_84,
    0.257_167_73,
    -0.353_800_56,
    0.480_131_4,
    -0.721_314_3,
    1.442_694_8,
    0.0,
];

const EXP_MASK: u32 = 0x7F80_0000;
const MANT_MASK: u32 = 0x007F_FFFF;
/// Bit pattern of `1.0f32`.
const ONE_BITS: u32 = 0x3F80_0000;

#[inline(always)]
fn horner(poly: &[f32], x: f32) -> f32 {
    poly.iter().fold(0.0f32, |acc, &c| acc * x + c)
}

/// Fast `log2` approximation from the IEEE-754 bit pattern of `x`.
///
/// The exponent field gives the integral part. The mantissa, rebuilt as a
/// float in `[1, 2)`, is mapped through a degree 8 polynomial. Absolute error
/// stays well below `0.01` for normal inputs.
///
/// Returns `-inf` for zero and NaN for negative inputs.
#[inline]
#[must_use]
pub fn log2_approx(x: f32) -> f32 {
    if x == 0.0 {
        return f32::NEG_INFINITY;
    }
    if x < 0.0 {
        return f32::NAN;
    }

    let bits = x.to_bits();
    let exponent = ((bits & EXP_MASK) >> 23) as i32;
    let remain = f32::from_bits((bits & MANT_MASK) | ONE_BITS);

    let log_base = (exponent - 127) as f32;
    log_base + horner(&LOG2_POLY, remain - 1.0)
}

/// Which logarithm the statistic engine uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Log2Impl {
    /// `f32::log2`.
    #[default]
    Exact,
    /// [`log2_approx`]: faster, accurate to about 1e-4 on the VIF range.
    Approx,
}

impl Log2Impl {
    #[inline(always)]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Log2Impl::Exact => x.log2(),
            Log2Impl::Approx => log2_approx(x),
        }
    }
}
