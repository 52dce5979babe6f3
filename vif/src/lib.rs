//! Visual Information Fidelity (VIF) feature core.
//!
//! This crate computes the per-scale VIF accumulators used as one signal of a
//! video-quality model: for a reference and a distorted plane it builds a four
//! level pyramid, filters local first and second moments with separable
//! low-pass kernels and turns them into an information numerator and
//! denominator per level.
//!
//! # Example
//!
//! ```
//! use vif::{compute_vif, Plane, VifConfig};
//!
//! let reference = Plane::from_fn(64, 64, |row, col| ((row * 7 + col * 3) % 32) as f32);
//! let distorted = Plane::from_fn(64, 64, |row, col| ((row * 7 + col * 3) % 32) as f32 * 0.8);
//!
//! let scores = compute_vif(reference.view(), distorted.view(), &VifConfig::default()).unwrap();
//! println!("VIF: {}", scores.score());
//! ```

pub mod config;
pub mod convolve;
pub mod cpu;
pub mod decimate;
pub mod kernels;
pub mod log2;
pub mod plane;
pub mod statistic;

use log::debug;
use thiserror::Error;

pub use config::{ConvolveImpl, VifConfig};
pub use convolve::{filter, filter_sq, filter_xy, ConvolveBackend, ConvolveOp, Convolver};
pub use decimate::{decimate2, decimate_by_2};
pub use kernels::{kernel, FilterKernel, KernelScale};
pub use log2::{log2_approx, Log2Impl};
pub use plane::{Plane, PlaneMut, PlaneRef};
pub use statistic::{plane_sum, vif_statistic, vif_statistic_with, VifScale};

/// Number of pyramid levels VIF is evaluated on.
pub const NUM_SCALES: usize = kernels::NUM_LEVELS;

/// Smallest width and height accepted by [`compute_vif`], so that the last
/// pyramid level is still non-empty.
pub const MIN_DIMENSION: usize = 1 << (NUM_SCALES - 1);

/// Errors that can occur when computing VIF.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum VifError {
    #[error("Row stride {stride} is smaller than the plane width {width}")]
    InvalidStride { stride: usize, width: usize },
    #[error("Byte stride {0} is not a multiple of the sample size")]
    MisalignedStride(usize),
    #[error("Plane buffer holds {actual} samples but {required} are required")]
    BufferTooSmall { required: usize, actual: usize },
    #[error("Planes must have equal width and height")]
    NonMatchingPlaneDimensions,
    #[error("Images must be at least 8x8 pixels")]
    InvalidImageSize,
    #[error("Filter kernel width {0} is not odd")]
    InvalidKernel(usize),
    #[error("Failed to allocate a {0} byte scratch row")]
    ScratchAllocation(usize),
    #[error("Gain limit {0} is outside the supported range [1, 100]")]
    InvalidGainLimit(f64),
    #[error("Unsupported sample bit depth {0}")]
    UnsupportedBitDepth(u8),
}

/// Per-level VIF accumulators for one reference/distorted pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VifScores {
    pub scales: [VifScale; NUM_SCALES],
}

impl VifScores {
    /// Ratio `num / den` of a single pyramid level.
    ///
    /// # Panics
    /// If `level >= NUM_SCALES`.
    #[must_use]
    pub fn scale_score(&self, level: usize) -> f64 {
        self.scales[level].score()
    }

    /// Sum of all level numerators.
    #[must_use]
    pub fn num(&self) -> f64 {
        self.scales.iter().map(|s| f64::from(s.num)).sum()
    }

    /// Sum of all level denominators.
    #[must_use]
    pub fn den(&self) -> f64 {
        self.scales.iter().map(|s| f64::from(s.den)).sum()
    }

    /// Combined VIF over all levels: total numerator over total denominator.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.num() / self.den()
    }
}

/// Computes the VIF accumulators of every pyramid level.
///
/// Level 0 runs on the input planes. Every following level first low-passes
/// the previous level with that level's kernel and then decimates it by 2.
///
/// # Errors
/// - If the configuration is invalid
/// - If the planes differ in size or are smaller than 8x8 pixels
pub fn compute_vif(
    reference: PlaneRef<'_>,
    distorted: PlaneRef<'_>,
    config: &VifConfig,
) -> Result<VifScores, VifError> {
    config.validate()?;

    if reference.width() != distorted.width() || reference.height() != distorted.height() {
        return Err(VifError::NonMatchingPlaneDimensions);
    }
    if reference.width() < MIN_DIMENSION || reference.height() < MIN_DIMENSION {
        return Err(VifError::InvalidImageSize);
    }

    let mut width = reference.width();
    let mut height = reference.height();

    let mut convolver = Convolver::for_impl(config.convolve, width);
    let mut mu1 = Plane::new(width, height);
    let mut mu2 = Plane::new(width, height);
    let mut xx_filt = Plane::new(width, height);
    let mut yy_filt = Plane::new(width, height);
    let mut xy_filt = Plane::new(width, height);

    let mut ref_level: Option<Plane> = None;
    let mut dis_level: Option<Plane> = None;
    let mut scores = VifScores::default();

    for (level, slot) in scores.scales.iter_mut().enumerate() {
        let filter = kernel(config.kernel_scale, level);

        if level > 0 {
            let ref_src = ref_level.as_ref().map_or(reference, Plane::view);
            let dis_src = dis_level.as_ref().map_or(distorted, Plane::view);

            convolver.filter(filter.coeffs, ref_src, &mut mu1.view_mut())?;
            convolver.filter(filter.coeffs, dis_src, &mut mu2.view_mut())?;
            let next_ref = decimate_by_2(mu1.view());
            let next_dis = decimate_by_2(mu2.view());

            width = next_ref.width();
            height = next_ref.height();
            ref_level = Some(next_ref);
            dis_level = Some(next_dis);

            for plane in [&mut mu1, &mut mu2, &mut xx_filt, &mut yy_filt, &mut xy_filt] {
                plane.shrink_to(width, height);
            }
        }

        let ref_src = ref_level.as_ref().map_or(reference, Plane::view);
        let dis_src = dis_level.as_ref().map_or(distorted, Plane::view);

        convolver.filter(filter.coeffs, ref_src, &mut mu1.view_mut())?;
        convolver.filter(filter.coeffs, dis_src, &mut mu2.view_mut())?;
        convolver.filter_sq(filter.coeffs, ref_src, &mut xx_filt.view_mut())?;
        convolver.filter_sq(filter.coeffs, dis_src, &mut yy_filt.view_mut())?;
        convolver.filter_xy(filter.coeffs, ref_src, dis_src, &mut xy_filt.view_mut())?;

        *slot = vif_statistic(
            mu1.view(),
            mu2.view(),
            xx_filt.view(),
            yy_filt.view(),
            xy_filt.view(),
            config.gain_limit,
            config.log2,
        )?;

        debug!(
            "vif level {}: {}x{}, kernel width {}, num {}, den {}",
            level, width, height, filter.width, slot.num, slot.den
        );
    }

    Ok(scores)
}
