//! Run-time options of [`compute_vif`][crate::compute_vif].

use crate::kernels::KernelScale;
use crate::log2::Log2Impl;
use crate::VifError;

/// Gain limit applied when none is configured.
pub const DEFAULT_GAIN_LIMIT: f64 = 100.0;
/// Smallest accepted gain limit; 1.0 disables enhancement gain entirely.
pub const MIN_GAIN_LIMIT: f64 = 1.0;
pub const MAX_GAIN_LIMIT: f64 = 100.0;

/// Which convolution path to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConvolveImpl {
    /// Scalar reference loops only.
    Scalar,
    /// Vectorized backend where the host supports it, scalar elsewhere.
    /// Without the `simd` feature this behaves like `Scalar`.
    Simd,
}

impl Default for ConvolveImpl {
    fn default() -> Self {
        if cfg!(feature = "simd") {
            ConvolveImpl::Simd
        } else {
            ConvolveImpl::Scalar
        }
    }
}

/// Options of a VIF computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VifConfig {
    /// Spread of the low-pass kernels.
    pub kernel_scale: KernelScale,
    /// Upper bound of the per-pixel gain, in `[1, 100]`.
    pub gain_limit: f64,
    pub log2: Log2Impl,
    pub convolve: ConvolveImpl,
}

impl Default for VifConfig {
    fn default() -> Self {
        Self {
            kernel_scale: KernelScale::default(),
            gain_limit: DEFAULT_GAIN_LIMIT,
            log2: Log2Impl::default(),
            convolve: ConvolveImpl::default(),
        }
    }
}

impl VifConfig {
    /// Defaults, scalar convolution.
    #[must_use]
    pub fn scalar() -> Self {
        Self {
            convolve: ConvolveImpl::Scalar,
            ..Self::default()
        }
    }

    /// Defaults, vectorized convolution where available.
    #[must_use]
    pub fn simd() -> Self {
        Self {
            convolve: ConvolveImpl::Simd,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_kernel_scale(mut self, kernel_scale: KernelScale) -> Self {
        self.kernel_scale = kernel_scale;
        self
    }

    #[must_use]
    pub fn with_gain_limit(mut self, gain_limit: f64) -> Self {
        self.gain_limit = gain_limit;
        self
    }

    #[must_use]
    pub fn with_log2(mut self, log2: Log2Impl) -> Self {
        self.log2 = log2;
        self
    }

    #[must_use]
    pub fn with_convolve(mut self, convolve: ConvolveImpl) -> Self {
        self.convolve = convolve;
        self
    }

    /// # Errors
    /// If the gain limit is NaN or outside `[1, 100]`.
    pub fn validate(&self) -> Result<(), VifError> {
        if !(MIN_GAIN_LIMIT..=MAX_GAIN_LIMIT).contains(&self.gain_limit) {
            return Err(VifError::InvalidGainLimit(self.gain_limit));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = VifConfig::default();
        assert_eq!(config.kernel_scale, KernelScale::Unit);
        assert_eq!(config.gain_limit, 100.0);
        assert_eq!(config.log2, Log2Impl::Exact);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[cfg(feature = "simd")]
    fn simd_is_default_with_feature() {
        assert_eq!(VifConfig::default().convolve, ConvolveImpl::Simd);
    }

    #[test]
    fn named_constructors() {
        assert_eq!(VifConfig::scalar().convolve, ConvolveImpl::Scalar);
        assert_eq!(VifConfig::simd().convolve, ConvolveImpl::Simd);
        let config = VifConfig::scalar()
            .with_kernel_scale(KernelScale::Half)
            .with_gain_limit(1.0)
            .with_log2(Log2Impl::Approx)
            .with_convolve(ConvolveImpl::Simd);
        assert_eq!(config.kernel_scale, KernelScale::Half);
        assert_eq!(config.gain_limit, 1.0);
        assert_eq!(config.log2, Log2Impl::Approx);
        assert_eq!(config.convolve, ConvolveImpl::Simd);
    }

    #[test]
    fn gain_limit_range() {
        for ok in [1.0, 1.5, 100.0] {
            assert!(VifConfig::default().with_gain_limit(ok).validate().is_ok());
        }
        for bad in [0.0, 0.99, 100.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                VifConfig::default().with_gain_limit(bad).validate(),
                Err(VifError::InvalidGainLimit(_))
            ));
        }
    }
}
