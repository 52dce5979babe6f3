//! Separable convolution with reflective borders.
//!
//! Three variants share one two-pass skeleton and differ in what the vertical
//! pass accumulates per tap:
//! - [`filter`]: the sample (local mean)
//! - [`filter_sq`]: the squared sample (local `E[x^2]`)
//! - [`filter_xy`]: the product of two planes (local `E[xy]`)
//!
//! The free functions are the scalar reference. A [`Convolver`] first looks up
//! a [`ConvolveBackend`] for the operation and kernel width in its
//! [`BackendRegistry`], and only uses it when the required CPU feature is
//! present. Anything else takes the scalar path.

mod scalar;
mod scratch;
#[cfg(feature = "simd")]
mod simd;

use std::sync::Arc;

use log::trace;

pub use scalar::{filter, filter_sq, filter_xy};
pub use scratch::{AlignedRow, SCRATCH_ALIGN};
#[cfg(feature = "simd")]
pub use simd::SimdBackend;

use crate::config::ConvolveImpl;
use crate::cpu::{CpuCapabilities, CpuFeature, HostCpu};
use crate::plane::{PlaneMut, PlaneRef};
use crate::VifError;

/// Maps an out-of-range index back into `0..n` by mirroring at the edges.
///
/// `k < 0` maps to `-k` and `k >= n` to `2n - k - 1`. The rule is repeated
/// until the index lands inside, which only matters for kernels wider than
/// the plane.
#[inline(always)]
#[must_use]
pub fn reflect_index(mut k: isize, n: usize) -> usize {
    debug_assert!(n > 0);
    let n = n as isize;
    while k < 0 || k >= n {
        if k < 0 {
            k = -k;
        } else {
            k = 2 * n - k - 1;
        }
    }
    k as usize
}

pub(crate) fn check_kernel(kernel: &[f32]) -> Result<(), VifError> {
    if kernel.len() % 2 == 0 {
        return Err(VifError::InvalidKernel(kernel.len()));
    }
    Ok(())
}

pub(crate) fn check_pair(a: &PlaneRef<'_>, b: &PlaneRef<'_>) -> Result<(), VifError> {
    if !a.same_size(b) {
        return Err(VifError::NonMatchingPlaneDimensions);
    }
    Ok(())
}

pub(crate) fn check_target(src: &PlaneRef<'_>, dst: &PlaneMut<'_>) -> Result<(), VifError> {
    if src.width() != dst.width() || src.height() != dst.height() {
        return Err(VifError::NonMatchingPlaneDimensions);
    }
    Ok(())
}

/// The three convolution variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConvolveOp {
    Filter,
    FilterSq,
    FilterXy,
}

/// An accelerated implementation of the convolution variants.
///
/// Implementations must produce the same two-pass, reflective-border result as
/// the scalar reference, up to floating-point reassociation. Arguments are
/// validated by the [`Convolver`]: the kernel is odd, all planes have the same
/// size and `scratch` holds at least one row.
pub trait ConvolveBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// CPU feature that must be present for this backend to run.
    fn required_feature(&self) -> CpuFeature;

    /// Whether `op` with a kernel of `width` taps is implemented.
    fn supports(&self, op: ConvolveOp, width: usize) -> bool;

    fn filter(
        &self,
        kernel: &[f32],
        src: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [f32],
    );

    fn filter_sq(
        &self,
        kernel: &[f32],
        src: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [f32],
    );

    fn filter_xy(
        &self,
        kernel: &[f32],
        src1: PlaneRef<'_>,
        src2: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
        scratch: &mut [f32],
    );
}

/// Ordered set of accelerated backends. The first match wins.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn ConvolveBackend>>,
}

impl BackendRegistry {
    /// A registry without backends: everything runs on the scalar path.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The backends compiled into this build.
    #[must_use]
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();
        #[cfg(feature = "simd")]
        registry.register(Arc::new(SimdBackend));
        registry
    }

    pub fn register(&mut self, backend: Arc<dyn ConvolveBackend>) -> &mut Self {
        self.backends.push(backend);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// First backend that implements `op` for `width` and whose feature is
    /// reported by `caps`.
    #[must_use]
    pub fn lookup(
        &self,
        op: ConvolveOp,
        width: usize,
        caps: &dyn CpuCapabilities,
    ) -> Option<&dyn ConvolveBackend> {
        self.backends
            .iter()
            .map(|b| &**b)
            .find(|b| b.supports(op, width) && caps.has(b.required_feature()))
    }
}

/// Dispatching front end of the convolution engine.
///
/// Owns the scratch row handed to accelerated backends, sized for planes up
/// to `max_width` samples wide, so the accelerated path does not allocate.
/// Wider planes and the scalar fallback allocate their own row per call.
pub struct Convolver {
    caps: Box<dyn CpuCapabilities>,
    registry: BackendRegistry,
    scratch: Vec<f32>,
}

impl Convolver {
    /// Built-in backends, gated on the host CPU.
    #[must_use]
    pub fn new(max_width: usize) -> Self {
        Self::with_backends(max_width, HostCpu, BackendRegistry::builtin())
    }

    /// Scalar reference only.
    #[must_use]
    pub fn scalar(max_width: usize) -> Self {
        Self::with_backends(max_width, HostCpu, BackendRegistry::empty())
    }

    #[must_use]
    pub fn for_impl(imp: ConvolveImpl, max_width: usize) -> Self {
        match imp {
            ConvolveImpl::Scalar => Self::scalar(max_width),
            ConvolveImpl::Simd => Self::new(max_width),
        }
    }

    /// Custom capability query and backend set.
    pub fn with_backends(
        max_width: usize,
        caps: impl CpuCapabilities + 'static,
        registry: BackendRegistry,
    ) -> Self {
        Self {
            caps: Box::new(caps),
            registry,
            scratch: vec![0.0f32; max_width],
        }
    }

    /// Widest plane the accelerated path runs on; wider planes fall back.
    #[must_use]
    pub fn max_width(&self) -> usize {
        self.scratch.len()
    }

    /// Name of the backend that would run `op` with a `width`-tap kernel, or
    /// `None` for the scalar fallback.
    #[must_use]
    pub fn backend_name(&self, op: ConvolveOp, width: usize) -> Option<&'static str> {
        self.registry
            .lookup(op, width, self.caps.as_ref())
            .map(ConvolveBackend::name)
    }

    fn dispatch<'d>(
        &mut self,
        op: ConvolveOp,
        kernel: &[f32],
        dst: &mut PlaneMut<'d>,
        accelerated: impl FnOnce(&dyn ConvolveBackend, &mut PlaneMut<'d>, &mut [f32]),
        fallback: impl FnOnce(&mut PlaneMut<'d>) -> Result<(), VifError>,
    ) -> Result<(), VifError> {
        let backend = self.registry.lookup(op, kernel.len(), self.caps.as_ref());
        match (backend, self.scratch.get_mut(..dst.width())) {
            (Some(backend), Some(scratch)) => {
                trace!("{:?} width {}: {} backend", op, kernel.len(), backend.name());
                accelerated(backend, dst, scratch);
                Ok(())
            }
            (Some(backend), None) => {
                trace!(
                    "{:?} width {}: plane width {} exceeds {} scratch, scalar fallback",
                    op,
                    kernel.len(),
                    dst.width(),
                    backend.name()
                );
                fallback(dst)
            }
            (None, _) => {
                trace!("{:?} width {}: scalar fallback", op, kernel.len());
                fallback(dst)
            }
        }
    }

    /// See [`filter`].
    ///
    /// # Errors
    /// As [`filter`].
    pub fn filter(
        &mut self,
        kernel: &[f32],
        src: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
    ) -> Result<(), VifError> {
        check_kernel(kernel)?;
        check_target(&src, dst)?;
        self.dispatch(
            ConvolveOp::Filter,
            kernel,
            dst,
            |backend, dst, scratch| backend.filter(kernel, src, dst, scratch),
            |dst| filter(kernel, src, dst),
        )
    }

    /// See [`filter_sq`].
    ///
    /// # Errors
    /// Same as [`Convolver::filter`].
    pub fn filter_sq(
        &mut self,
        kernel: &[f32],
        src: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
    ) -> Result<(), VifError> {
        check_kernel(kernel)?;
        check_target(&src, dst)?;
        self.dispatch(
            ConvolveOp::FilterSq,
            kernel,
            dst,
            |backend, dst, scratch| backend.filter_sq(kernel, src, dst, scratch),
            |dst| filter_sq(kernel, src, dst),
        )
    }

    /// See [`filter_xy`].
    ///
    /// # Errors
    /// Same as [`Convolver::filter`], or if the sources differ in size.
    pub fn filter_xy(
        &mut self,
        kernel: &[f32],
        src1: PlaneRef<'_>,
        src2: PlaneRef<'_>,
        dst: &mut PlaneMut<'_>,
    ) -> Result<(), VifError> {
        check_kernel(kernel)?;
        check_pair(&src1, &src2)?;
        check_target(&src1, dst)?;
        self.dispatch(
            ConvolveOp::FilterXy,
            kernel,
            dst,
            |backend, dst, scratch| backend.filter_xy(kernel, src1, src2, dst, scratch),
            |dst| filter_xy(kernel, src1, src2, dst),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::plane::Plane;

    #[test]
    fn reflect_matches_mirror_rule() {
        assert_eq!(reflect_index(-1, 5), 1);
        assert_eq!(reflect_index(-4, 5), 4);
        assert_eq!(reflect_index(0, 5), 0);
        assert_eq!(reflect_index(4, 5), 4);
        assert_eq!(reflect_index(5, 5), 4);
        assert_eq!(reflect_index(6, 5), 3);
        assert_eq!(reflect_index(9, 5), 0);
    }

    #[test]
    fn reflect_handles_kernels_wider_than_plane() {
        for n in 1..6usize {
            for k in -70..70isize {
                assert!(reflect_index(k, n) < n, "k={} n={}", k, n);
            }
        }
        assert_eq!(reflect_index(-3, 1), 0);
        assert_eq!(reflect_index(5, 2), 1);
    }

    /// Records every call and writes a marker value instead of filtering.
    struct Recording {
        calls: AtomicUsize,
    }

    impl Recording {
        fn mark(&self, dst: &mut PlaneMut<'_>, scratch: &mut [f32]) {
            assert!(scratch.len() >= dst.width());
            self.calls.fetch_add(1, Ordering::SeqCst);
            for row in 0..dst.height() {
                dst.row_mut(row).fill(-1.0);
            }
        }
    }

    impl ConvolveBackend for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn required_feature(&self) -> CpuFeature {
            CpuFeature::Avx2Fma
        }

        fn supports(&self, _op: ConvolveOp, width: usize) -> bool {
            width == 5
        }

        fn filter(&self, _: &[f32], _: PlaneRef<'_>, dst: &mut PlaneMut<'_>, s: &mut [f32]) {
            self.mark(dst, s);
        }

        fn filter_sq(&self, _: &[f32], _: PlaneRef<'_>, dst: &mut PlaneMut<'_>, s: &mut [f32]) {
            self.mark(dst, s);
        }

        fn filter_xy(
            &self,
            _: &[f32],
            _: PlaneRef<'_>,
            _: PlaneRef<'_>,
            dst: &mut PlaneMut<'_>,
            s: &mut [f32],
        ) {
            self.mark(dst, s);
        }
    }

    fn recording_convolver(max_width: usize, available: bool) -> (Convolver, Arc<Recording>) {
        let recording = Arc::new(Recording {
            calls: AtomicUsize::new(0),
        });
        let mut registry = BackendRegistry::empty();
        registry.register(Arc::clone(&recording) as Arc<dyn ConvolveBackend>);
        let convolver =
            Convolver::with_backends(max_width, move |_: CpuFeature| available, registry);
        (convolver, recording)
    }

    #[test]
    fn supported_width_uses_backend() {
        let (mut convolver, recording) = recording_convolver(16, true);
        let src = Plane::from_fn(16, 4, |_, _| 3.0);
        let mut dst = Plane::new(16, 4);
        let k5 = [0.1, 0.2, 0.4, 0.2, 0.1];

        convolver.filter(&k5, src.view(), &mut dst.view_mut()).unwrap();
        convolver.filter_sq(&k5, src.view(), &mut dst.view_mut()).unwrap();
        convolver
            .filter_xy(&k5, src.view(), src.view(), &mut dst.view_mut())
            .unwrap();
        assert_eq!(recording.calls.load(Ordering::SeqCst), 3);
        assert_eq!(dst.get(0, 0), -1.0);
        assert_eq!(convolver.backend_name(ConvolveOp::Filter, 5), Some("recording"));
    }

    #[test]
    fn other_widths_fall_back() {
        let (mut convolver, recording) = recording_convolver(16, true);
        let src = Plane::from_fn(16, 4, |_, _| 3.0);
        let mut dst = Plane::new(16, 4);
        convolver
            .filter(&[0.25, 0.5, 0.25], src.view(), &mut dst.view_mut())
            .unwrap();
        assert_eq!(recording.calls.load(Ordering::SeqCst), 0);
        assert!((dst.get(2, 7) - 3.0).abs() < 1e-6);
        assert_eq!(convolver.backend_name(ConvolveOp::Filter, 3), None);
    }

    #[test]
    fn missing_capability_falls_back() {
        let (mut convolver, recording) = recording_convolver(16, false);
        let src = Plane::from_fn(16, 4, |_, _| 3.0);
        let mut dst = Plane::new(16, 4);
        let k5 = [0.1, 0.2, 0.4, 0.2, 0.1];
        convolver.filter(&k5, src.view(), &mut dst.view_mut()).unwrap();
        assert_eq!(recording.calls.load(Ordering::SeqCst), 0);
        assert!((dst.get(0, 0) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn planes_wider_than_scratch_fall_back() {
        let (mut convolver, recording) = recording_convolver(8, true);
        let src = Plane::from_fn(16, 4, |_, _| 3.0);
        let mut dst = Plane::new(16, 4);
        let k5 = [0.1, 0.2, 0.4, 0.2, 0.1];
        convolver.filter(&k5, src.view(), &mut dst.view_mut()).unwrap();
        convolver.filter_sq(&k5, src.view(), &mut dst.view_mut()).unwrap();
        convolver
            .filter_xy(&k5, src.view(), src.view(), &mut dst.view_mut())
            .unwrap();
        assert_eq!(recording.calls.load(Ordering::SeqCst), 0);
        assert!((dst.get(3, 15) - 9.0).abs() < 1e-4);

        // Narrow enough planes still take the backend.
        let narrow = Plane::from_fn(8, 4, |_, _| 3.0);
        let mut out = Plane::new(8, 4);
        convolver.filter(&k5, narrow.view(), &mut out.view_mut()).unwrap();
        assert_eq!(recording.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scalar_convolver_has_no_backends() {
        let convolver = Convolver::scalar(32);
        for width in [3, 5, 9, 17] {
            assert_eq!(convolver.backend_name(ConvolveOp::FilterXy, width), None);
        }
        assert_eq!(convolver.max_width(), 32);
    }
}
