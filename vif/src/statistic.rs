//! Per-level VIF numerator and denominator from filtered moment planes.

use crate::log2::Log2Impl;
use crate::plane::PlaneRef;
use crate::VifError;

/// Guard against division by zero variance.
const EPS: f32 = 1.0e-10;
/// Variance of the visual noise model.
const SIGMA_NSQ: f32 = 2.0;
/// `4 / 255^2`, weight of the distorted variance in flat regions.
const SIGMA_MAX_INV: f32 = (4.0f64 / (255.0 * 255.0)) as f32;

/// Accumulated VIF numerator and denominator of one pyramid level.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VifScale {
    pub num: f32,
    pub den: f32,
}

impl VifScale {
    /// `num / den`.
    #[must_use]
    pub fn score(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

/// Contribution of a single pixel.
#[inline(always)]
fn pixel_terms(
    mu1: f32,
    mu2: f32,
    xx: f32,
    yy: f32,
    xy: f32,
    gain_limit: f32,
    log2: &impl Fn(f32) -> f32,
) -> (f32, f32) {
    let mut sigma1_sq = xx - mu1 * mu1;
    let sigma2_sq = (yy - mu2 * mu2).max(0.0);
    let sigma12 = xy - mu1 * mu2;
    sigma1_sq = sigma1_sq.max(0.0);

    let mut g = sigma12 / (sigma1_sq + EPS);
    let mut sv_sq = sigma2_sq - g * sigma12;

    if sigma1_sq < EPS {
        g = 0.0;
        sv_sq = sigma2_sq;
        sigma1_sq = 0.0;
    }
    if sigma2_sq < EPS {
        g = 0.0;
        sv_sq = 0.0;
    }
    if g < 0.0 {
        sv_sq = sigma2_sq;
        g = 0.0;
    }
    sv_sq = sv_sq.max(EPS);
    g = g.min(gain_limit);

    let mut num = log2(1.0 + (g * g * sigma1_sq) / (sv_sq + SIGMA_NSQ));
    let mut den = log2(1.0 + sigma1_sq / SIGMA_NSQ);

    if sigma12 < 0.0 {
        num = 0.0;
    }
    // Near-flat reference: the information ratio is meaningless, score by how
    // much variance the distorted plane added. Takes precedence over the rest.
    if sigma1_sq < SIGMA_NSQ {
        num = 1.0 - sigma2_sq * SIGMA_MAX_INV;
        den = 1.0;
    }

    (num, den)
}

fn check_moments(planes: [&PlaneRef<'_>; 5]) -> Result<(), VifError> {
    let first = planes[0];
    if planes[1..].iter().any(|p| !first.same_size(p)) {
        return Err(VifError::NonMatchingPlaneDimensions);
    }
    Ok(())
}

/// Reduces the moment planes of one level to its [`VifScale`].
///
/// `mu1`/`mu2` are the local means of reference and distorted plane,
/// `xx_filt`/`yy_filt` their filtered squares and `xy_filt` the filtered
/// product. Gains above `gain_limit` are clipped.
///
/// Degenerate regions never fail: negative variances are clamped to zero,
/// negative covariance contributes no information and near-flat reference
/// regions use a fixed fallback term.
///
/// # Errors
/// If the five planes do not share one size.
pub fn vif_statistic(
    mu1: PlaneRef<'_>,
    mu2: PlaneRef<'_>,
    xx_filt: PlaneRef<'_>,
    yy_filt: PlaneRef<'_>,
    xy_filt: PlaneRef<'_>,
    gain_limit: f64,
    log2: Log2Impl,
) -> Result<VifScale, VifError> {
    vif_statistic_with(
        mu1,
        mu2,
        xx_filt,
        yy_filt,
        xy_filt,
        gain_limit,
        |x| log2.apply(x),
    )
}

/// [`vif_statistic`] with a caller-provided base-2 logarithm.
///
/// # Errors
/// Same as [`vif_statistic`].
pub fn vif_statistic_with<F: Fn(f32) -> f32>(
    mu1: PlaneRef<'_>,
    mu2: PlaneRef<'_>,
    xx_filt: PlaneRef<'_>,
    yy_filt: PlaneRef<'_>,
    xy_filt: PlaneRef<'_>,
    gain_limit: f64,
    log2: F,
) -> Result<VifScale, VifError> {
    check_moments([&mu1, &mu2, &xx_filt, &yy_filt, &xy_filt])?;
    let gain_limit = gain_limit as f32;

    let mut total = VifScale::default();
    for i in 0..mu1.height() {
        let mut row_num = 0.0f32;
        let mut row_den = 0.0f32;

        let rows = mu1
            .row(i)
            .iter()
            .zip(mu2.row(i))
            .zip(xx_filt.row(i))
            .zip(yy_filt.row(i))
            .zip(xy_filt.row(i));
        for ((((&m1, &m2), &xx), &yy), &xy) in rows {
            let (num, den) = pixel_terms(m1, m2, xx, yy, xy, gain_limit, &log2);
            row_num += num;
            row_den += den;
        }

        total.num += row_num;
        total.den += row_den;
    }
    Ok(total)
}

/// Sums a plane row by row, then the row sums.
#[must_use]
pub fn plane_sum(plane: PlaneRef<'_>) -> f32 {
    (0..plane.height())
        .map(|i| plane.row(i).iter().sum::<f32>())
        .fold(0.0f32, |acc, row| acc + row)
}
