//! Vector capability queries used to pick a convolution backend.

use std::sync::OnceLock;

use log::debug;

/// Instruction set extensions a backend may require.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CpuFeature {
    /// x86_64 AVX2 together with FMA.
    Avx2Fma,
    /// AArch64 NEON.
    Neon,
}

/// Answers whether a [`CpuFeature`] may be used.
///
/// [`HostCpu`] asks the running processor. Closures can stand in for it to
/// force or forbid a backend, e.g. `|_| false` for the scalar path only.
pub trait CpuCapabilities: Send + Sync {
    fn has(&self, feature: CpuFeature) -> bool;
}

impl<F> CpuCapabilities for F
where
    F: Fn(CpuFeature) -> bool + Send + Sync,
{
    fn has(&self, feature: CpuFeature) -> bool {
        self(feature)
    }
}

/// Capabilities of the processor this code runs on.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostCpu;

impl CpuCapabilities for HostCpu {
    fn has(&self, feature: CpuFeature) -> bool {
        has_vector_capability(feature)
    }
}

#[derive(Debug)]
struct Detected {
    avx2_fma: bool,
    neon: bool,
}

impl Detected {
    #[cfg(target_arch = "x86_64")]
    fn probe() -> Self {
        Self {
            avx2_fma: is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma"),
            neon: false,
        }
    }

    #[cfg(target_arch = "aarch64")]
    fn probe() -> Self {
        Self {
            avx2_fma: false,
            neon: std::arch::is_aarch64_feature_detected!("neon"),
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn probe() -> Self {
        Self {
            avx2_fma: false,
            neon: false,
        }
    }
}

/// Runtime check for `feature` on the host. Detection runs once per process.
#[must_use]
pub fn has_vector_capability(feature: CpuFeature) -> bool {
    static DETECTED: OnceLock<Detected> = OnceLock::new();

    let detected = DETECTED.get_or_init(|| {
        let detected = Detected::probe();
        debug!("detected vector capabilities: {:?}", detected);
        detected
    });

    match feature {
        CpuFeature::Avx2Fma => detected.avx2_fma,
        CpuFeature::Neon => detected.neon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_is_stable() {
        for feature in [CpuFeature::Avx2Fma, CpuFeature::Neon] {
            assert_eq!(has_vector_capability(feature), HostCpu.has(feature));
        }
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn no_neon_on_x86() {
        assert!(!has_vector_capability(CpuFeature::Neon));
    }

    #[test]
    fn closures_act_as_capabilities() {
        let only_avx2 = |f: CpuFeature| f == CpuFeature::Avx2Fma;
        assert!(only_avx2.has(CpuFeature::Avx2Fma));
        assert!(!only_avx2.has(CpuFeature::Neon));
    }
}
